//! The backtracking interpreter. One `launch` is a single anchored match
//! attempt: threads are (pc, cursor) pairs tried depth-first, most recent
//! first, so the first alternative of every choice wins when both would
//! match.

use crate::vm::program::{target, Element, Inst, Program};

/// A suspended alternative. `captures_end` remembers how much of the shared
/// mark stack existed when the thread was pushed, so failing back to it
/// discards exactly the marks recorded since. Return addresses live on the
/// same stack, flagged so a failure can unwind them and `Return` can insist
/// on finding one.
#[derive(Debug, Clone)]
struct Thread {
    pc: usize,
    cursor: usize,
    captures_end: usize,
    is_return: bool,
}

/// A capture boundary: the input index it marks and the position of the
/// `CaptureStart`/`CaptureEnd` instruction that recorded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CaptureMark {
    pub index: usize,
    pub inst: usize,
}

/// A successful attempt: where the match ended and every mark recorded on
/// the surviving path, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawMatch {
    pub end: usize,
    pub marks: Vec<CaptureMark>,
}

/// Runs `program` over `input` with the match anchored at `start`.
pub(crate) fn launch<T: Element>(
    program: &Program<T>,
    input: &[T],
    start: usize,
) -> Option<RawMatch> {
    let insts = &program.insts;
    let mut stack: Vec<Thread> =
        vec![Thread { pc: 1, cursor: start, captures_end: 0, is_return: false }];
    let mut marks: Vec<CaptureMark> = Vec::new();

    while let Some(mut th) = stack.pop() {
        marks.truncate(th.captures_end);

        'run: loop {
            match &insts[th.pc] {
                Inst::Elem(e) => {
                    if th.cursor >= input.len() || input[th.cursor] != *e {
                        break 'run;
                    }
                    th.cursor += 1;
                    th.pc += 1;
                }
                Inst::Check(check) => {
                    if th.cursor >= input.len() || !check.test(&input[th.cursor]) {
                        break 'run;
                    }
                    th.cursor += 1;
                    th.pc += 1;
                }
                Inst::CheckIndex(check, offset) => {
                    let at = th.cursor as isize + offset;
                    if at < 0 || at as usize > input.len() || !check.test(input, at as usize) {
                        break 'run;
                    }
                    th.pc += 1;
                }
                Inst::MoveIndex(distance) => {
                    let to = th.cursor as isize + distance;
                    if to < 0 || to as usize > input.len() {
                        break 'run;
                    }
                    th.cursor = to as usize;
                    th.pc += 1;
                }
                Inst::Search(search) => match search.run(input, th.cursor) {
                    Some(found) => {
                        th.cursor = found;
                        th.pc += 1;
                    }
                    None => break 'run,
                },
                Inst::Jump(offset) => th.pc = target(th.pc, *offset),
                Inst::CaptureStart(_, offset) | Inst::CaptureEnd(offset) => {
                    marks.push(CaptureMark { index: target(th.cursor, *offset), inst: th.pc });
                    th.pc += 1;
                }
                Inst::Choice { offset, at_index } => {
                    let mut alt = Thread {
                        pc: target(th.pc, *offset),
                        cursor: th.cursor,
                        captures_end: marks.len(),
                        is_return: false,
                    };
                    if *at_index != 0 {
                        let shifted = th.cursor as isize + at_index;
                        if shifted < 0 || shifted as usize > input.len() {
                            // still pushed, so the commit that balances this
                            // choice finds a thread to drop
                            alt.pc = 0;
                        } else {
                            alt.cursor = shifted as usize;
                        }
                    }
                    stack.push(alt);
                    th.pc += 1;
                }
                Inst::ChoiceEnd => th.pc += 1,
                Inst::Commit => {
                    let dropped = stack.pop();
                    match dropped {
                        Some(t) if !t.is_return => th.pc += 1,
                        _ => panic!("commit without a pending alternative"),
                    }
                }
                Inst::Call(offset) => {
                    stack.push(Thread { pc: th.pc + 1, is_return: true, ..th.clone() });
                    th.pc = target(th.pc, *offset);
                }
                Inst::Return => match stack.pop() {
                    Some(t) if t.is_return => th.pc = t.pc,
                    _ => panic!("return without a return address"),
                },
                Inst::Fail => break 'run,
                Inst::Match => return Some(RawMatch { end: th.cursor, marks }),
                Inst::OpenCall(name) => {
                    unreachable!("open call to `{name}` reached the executor")
                }
                Inst::Skip => unreachable!("skip placeholder reached the executor"),
            }
        }

        // this thread failed; return addresses stacked above the next
        // alternative belonged to its call chain and die with it
        while stack.last().map_or(false, |t| t.is_return) {
            stack.pop();
        }
    }
    None
}
