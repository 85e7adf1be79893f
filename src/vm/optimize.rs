//! Preprocessing passes run between emission and execution. Both rewrite
//! the instruction list in place and keep every relative offset pointing at
//! the same logical instruction.

use std::collections::HashSet;

use crate::search::SearchCache;
use crate::vm::program::{insert_instruction, target, Element, Inst, SearchFn};

/// Moves zero-width instructions past the consuming instructions that follow
/// them, compensating with a cursor offset. Grouping consumers first lets a
/// failing element test fail before any capture marks are recorded, and
/// lets skip resolution see longer literal runs.
///
/// A swap never crosses a jump target: the instruction moving back must stay
/// in front of anything that can be jumped to.
pub(crate) fn move_movables_forward<T: Element>(insts: &mut Vec<Inst<T>>) {
    let targets = jump_targets(insts);
    let mut changed = true;
    while changed {
        changed = false;
        for i in 1..insts.len().saturating_sub(1) {
            if !is_movable(&insts[i]) || !is_consumer(&insts[i + 1]) || targets.contains(&(i + 1)) {
                continue;
            }
            match &mut insts[i] {
                Inst::CheckIndex(_, offset)
                | Inst::CaptureStart(_, offset)
                | Inst::CaptureEnd(offset) => *offset -= 1,
                _ => unreachable!("not reachable"),
            }
            insts.swap(i, i + 1);
            changed = true;
        }
    }
}

fn is_movable<T: Element>(inst: &Inst<T>) -> bool {
    matches!(inst, Inst::CheckIndex(..) | Inst::CaptureStart(..) | Inst::CaptureEnd(..))
}

fn is_consumer<T: Element>(inst: &Inst<T>) -> bool {
    matches!(inst, Inst::Elem(_) | Inst::Check(_))
}

fn jump_targets<T: Element>(insts: &[Inst<T>]) -> HashSet<usize> {
    let mut targets = HashSet::new();
    for (p, inst) in insts.iter().enumerate() {
        match inst {
            Inst::Jump(offset) | Inst::Choice { offset, .. } => {
                targets.insert(target(p, *offset));
            }
            Inst::Call(offset) => {
                targets.insert(target(p, *offset));
                // the matching return resumes right after the call
                targets.insert(p + 1);
            }
            _ => {}
        }
    }
    targets
}

/// Replaces every `Skip` placeholder with a runnable form. With `fast` set,
/// a skip followed by something searchable becomes a `Search` that jumps the
/// cursor straight to the next candidate, plus a choice that resumes the
/// search one element further on backtrack. Everything else becomes the
/// generic form: a self-retrying choice that gives up one element per retry,
/// which preserves the gap's lazy, shortest-first order.
pub(crate) fn replace_skips<T: Element>(insts: &mut Vec<Inst<T>>, fast: bool) {
    let mut i = 1;
    while i < insts.len() {
        if matches!(insts[i], Inst::Skip) {
            resolve_skip(insts, i, fast);
        }
        i += 1;
    }
}

fn resolve_skip<T: Element>(insts: &mut Vec<Inst<T>>, i: usize, fast: bool) {
    if !fast {
        generic_skip(insts, i);
        return;
    }
    match &insts[i + 1] {
        Inst::Elem(_) => {
            let mut j = i + 1;
            while matches!(insts.get(j), Some(Inst::Elem(_))) {
                j += 1;
            }
            let literal: Vec<T> = insts[i + 1..j]
                .iter()
                .map(|inst| match inst {
                    Inst::Elem(e) => e.clone(),
                    _ => unreachable!("not reachable"),
                })
                .collect();
            let cache = SearchCache::new(&literal);
            insts[i] = Inst::Search(SearchFn::new("literal", move |input, from| {
                cache.find(input, from)
            }));
            insert_instruction(insts, i + 1, Inst::Choice { offset: -1, at_index: 1 });
            place_skip_commit(insts, j + 1);
        }
        Inst::Check(check) => {
            let check = check.clone();
            let desc = check.desc().to_string();
            insts[i] = Inst::Search(SearchFn::new(&desc, move |input, from| {
                (from..input.len()).find(|&at| check.test(&input[at]))
            }));
            insert_instruction(insts, i + 1, Inst::Choice { offset: -1, at_index: 1 });
            place_skip_commit(insts, i + 3);
        }
        // anchors also hold at the end of input, hence the inclusive range
        Inst::CheckIndex(check, 0) => {
            let check = check.clone();
            let kind = check.kind().to_string();
            insts[i] = Inst::Search(SearchFn::new(&kind, move |input, from| {
                (from..=input.len()).find(|&at| check.test(input, at))
            }));
            insert_instruction(insts, i + 1, Inst::Choice { offset: -1, at_index: 1 });
            place_skip_commit(insts, i + 3);
        }
        _ => generic_skip(insts, i),
    }
}

fn generic_skip<T: Element>(insts: &mut Vec<Inst<T>>, i: usize) {
    insts[i] = Inst::Choice { offset: 0, at_index: 1 };
    place_skip_commit(insts, i + 1);
}

/// Walks forward from the instruction after a resolved skip to where the
/// surrounding pattern is decided, and inserts the commit that balances the
/// skip's retry choice there. Conditional jumps are followed through their
/// targets; the walk only ever moves forward, so a backward edge means the
/// skip escaped its frame and the program is malformed.
fn place_skip_commit<T: Element>(insts: &mut Vec<Inst<T>>, from: usize) {
    let mut i = from;
    loop {
        match &insts[i] {
            Inst::Choice { offset, .. } if *offset < 0 => {
                panic!("balancing a skip across a backward choice")
            }
            Inst::Choice { offset, .. } => i = target(i, *offset),
            Inst::Jump(offset) if *offset < 0 => {
                panic!("balancing a skip across a backward jump")
            }
            Inst::Jump(offset) => i = target(i, *offset),
            Inst::Commit | Inst::Return | Inst::Fail | Inst::Match => {
                insert_instruction(insts, i, Inst::Commit);
                return;
            }
            _ => i += 1,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::executor::launch;
    use crate::pattern::{text, Pattern};
    use crate::vm::compiler::Compiler;
    use crate::vm::program::{Inst, Program};
    use pretty_assertions::assert_eq;

    fn names(program: &Program<char>) -> Vec<&'static str> {
        program
            .insts
            .iter()
            .map(|inst| match inst {
                Inst::Elem(_) => "elem",
                Inst::Check(_) => "check",
                Inst::CheckIndex(..) => "check-index",
                Inst::MoveIndex(_) => "move-index",
                Inst::Search(_) => "search",
                Inst::Jump(_) => "jump",
                Inst::CaptureStart(..) => "capture-start",
                Inst::CaptureEnd(_) => "capture-end",
                Inst::Choice { .. } => "choice",
                Inst::ChoiceEnd => "choice-end",
                Inst::Commit => "commit",
                Inst::Call(_) => "call",
                Inst::Return => "return",
                Inst::Fail => "fail",
                Inst::Match => "match",
                Inst::OpenCall(_) => "open-call",
                Inst::Skip => "skip",
            })
            .collect()
    }

    #[test]
    fn captures_move_past_the_elements_they_bracket() {
        let pattern = text::literal("ab").capture_as("x");
        let program = Compiler::new().compile(&pattern).unwrap();
        assert_eq!(
            names(&program),
            ["fail", "elem", "elem", "capture-start", "capture-end", "match"],
        );
        // the marks still record the bracketed range
        match (&program.insts[3], &program.insts[4]) {
            (Inst::CaptureStart(Some(n), -2), Inst::CaptureEnd(0)) => assert_eq!(n, "x"),
            other => panic!("unexpected instructions: {other:?}"),
        }
    }

    #[test]
    fn nested_captures_keep_their_marker_order() {
        let pattern = Pattern::series(vec![
            Pattern::single('a'),
            Pattern::single('b').capture_as("inner"),
            Pattern::single('c'),
        ])
        .capture_as("outer");
        let program = Compiler::new().compile(&pattern).unwrap();
        assert_eq!(
            names(&program),
            [
                "fail",
                "elem",
                "elem",
                "elem",
                "capture-start",
                "capture-start",
                "capture-end",
                "capture-end",
                "match",
            ],
        );
    }

    #[test]
    fn movables_do_not_cross_jump_targets() {
        let mut insts: Vec<Inst<char>> = vec![
            Inst::Fail,
            Inst::CaptureStart(None, 0),
            Inst::Elem('a'),
            Inst::Match,
        ];
        super::move_movables_forward(&mut insts);
        assert!(matches!(insts[1], Inst::Elem('a')));
        assert!(matches!(insts[2], Inst::CaptureStart(None, -1)));

        // same layout, but now the element is jumped to from elsewhere and
        // the capture mark must keep out of the loop body
        let mut insts: Vec<Inst<char>> = vec![
            Inst::Fail,
            Inst::CaptureStart(None, 0),
            Inst::Elem('a'),
            Inst::Match,
            Inst::Jump(-2),
        ];
        super::move_movables_forward(&mut insts);
        assert!(matches!(insts[1], Inst::CaptureStart(None, 0)));
        assert!(matches!(insts[2], Inst::Elem('a')));
    }

    #[test]
    fn skip_before_a_literal_becomes_a_search_with_a_retry_choice() {
        let pattern = Pattern::skip().then(text::literal("ab"));
        let program = Compiler::new().compile(&pattern).unwrap();
        assert_eq!(
            names(&program),
            ["fail", "search", "choice", "elem", "elem", "commit", "match"],
        );
        match &program.insts[2] {
            Inst::Choice { offset: -1, at_index: 1 } => {}
            other => panic!("unexpected retry choice: {other:?}"),
        }
    }

    #[test]
    fn skip_before_a_class_becomes_a_predicate_search() {
        let pattern = Pattern::skip().then(text::digit());
        let program = Compiler::new().compile(&pattern).unwrap();
        assert_eq!(
            names(&program),
            ["fail", "search", "choice", "check", "commit", "match"],
        );
    }

    #[test]
    fn skip_before_an_anchor_becomes_a_position_search() {
        let pattern = Pattern::skip().then(text::line_start());
        let program = Compiler::new().compile(&pattern).unwrap();
        assert_eq!(
            names(&program),
            ["fail", "search", "choice", "check-index", "commit", "match"],
        );
    }

    #[test]
    fn other_skips_become_the_generic_lazy_choice() {
        let pattern = Pattern::skip().then(Pattern::single('a').or(Pattern::single('b')));
        let program = Compiler::new().compile(&pattern).unwrap();
        assert_eq!(
            names(&program),
            [
                "fail", "choice", "choice", "elem", "commit", "jump", "elem", "choice-end",
                "commit", "match",
            ],
        );
        match &program.insts[1] {
            Inst::Choice { offset: 0, at_index: 1 } => {}
            other => panic!("unexpected generic skip: {other:?}"),
        }
    }

    /// Runs one pattern under all four pass combinations and checks they
    /// accept the same inputs at the same positions with the same captures.
    fn assert_equivalent(pattern: Pattern<char>, inputs: &[&str]) {
        let reference = Compiler::new().reorder(false).fast_skip(false).compile(&pattern).unwrap();
        let variants = [
            Compiler::new().compile(&pattern).unwrap(),
            Compiler::new().reorder(false).compile(&pattern).unwrap(),
            Compiler::new().fast_skip(false).compile(&pattern).unwrap(),
        ];
        for input in inputs {
            let input = text::chars(input);
            for start in 0..=input.len() {
                let expected = launch(&reference, &input, start)
                    .map(|m| (m.end, m.marks.iter().map(|c| c.index).collect::<Vec<_>>()));
                for variant in &variants {
                    let got = launch(variant, &input, start)
                        .map(|m| (m.end, m.marks.iter().map(|c| c.index).collect::<Vec<_>>()));
                    assert_eq!(got, expected, "diverged on {input:?} at {start}");
                }
            }
        }
    }

    #[test]
    fn passes_do_not_change_behavior() {
        let inputs = ["", "a", "ab", "This is a test text.", "ab\ncd\n", "12x345 6"];
        assert_equivalent(Pattern::skip().then(text::literal("is")), &inputs);
        assert_equivalent(Pattern::skip().then(text::digit().repeat(1..).capture()), &inputs);
        assert_equivalent(Pattern::skip().then(text::line_start()), &inputs);
        assert_equivalent(
            Pattern::skip()
                .then(Pattern::single('a').or(Pattern::single('1')).capture_as("hit")),
            &inputs,
        );
        assert_equivalent(
            text::literal(" ").then(Pattern::skip()).then(text::literal(" ")).capture(),
            &inputs,
        );
    }
}
