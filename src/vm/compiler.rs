use std::collections::HashMap;

use crate::errors::Error;
use crate::pattern::{Grammar, Pattern};
use crate::vm::optimize;
use crate::vm::program::{Element, Inst, Program};

/// Compiles a `Pattern` tree into a linear `Program`.
///
/// Both preprocessing passes are on by default; they only change how fast a
/// program runs, never what it matches, and can be switched off to compare
/// behavior against the plain encoding.
pub struct Compiler {
    reorder: bool,
    fast_skip: bool,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler { reorder: true, fast_skip: true }
    }

    /// Hoisting of zero-width instructions past adjacent consumers.
    pub fn reorder(mut self, on: bool) -> Compiler {
        self.reorder = on;
        self
    }

    /// Literal and predicate searches for `Skip` placeholders. When off,
    /// every skip becomes the generic one-element-at-a-time form.
    pub fn fast_skip(mut self, on: bool) -> Compiler {
        self.fast_skip = on;
        self
    }

    pub fn compile<T: Element>(&self, pattern: &Pattern<T>) -> Result<Program<T>, Error> {
        pattern.validate()?;

        // position 0 is the permanent fail sentinel; execution starts at 1
        let mut emitter = Emitter { insts: vec![Inst::Fail] };
        emitter.c(pattern)?;
        let mut insts = emitter.insts;
        if insts.len() == 1 {
            return Err(Error::EmptyPattern);
        }
        insts.push(Inst::Match);

        if self.reorder {
            optimize::move_movables_forward(&mut insts);
        }
        optimize::replace_skips(&mut insts, self.fast_skip);

        for inst in &insts {
            if let Inst::OpenCall(name) = inst {
                return Err(Error::CallOutsideGrammar(name.clone()));
            }
        }
        log::trace!("compiled {} instructions", insts.len());
        Ok(Program { insts })
    }
}

impl Default for Compiler {
    fn default() -> Compiler {
        Compiler::new()
    }
}

struct Emitter<T: Element> {
    insts: Vec<Inst<T>>,
}

impl<T: Element> Emitter<T> {
    /// Compiles a child pattern into its own buffer, so the parent knows the
    /// child's length before emitting the frame around it.
    fn subprogram(pattern: &Pattern<T>) -> Result<Vec<Inst<T>>, Error> {
        let mut emitter = Emitter { insts: Vec::new() };
        emitter.c(pattern)?;
        Ok(emitter.insts)
    }

    fn c(&mut self, pattern: &Pattern<T>) -> Result<(), Error> {
        match pattern {
            Pattern::Literal(elements) => {
                self.insts.extend(elements.iter().cloned().map(Inst::Elem));
                Ok(())
            }
            Pattern::OneOf(check) => {
                self.insts.push(Inst::Check(check.clone()));
                Ok(())
            }
            Pattern::Anchor(check) => {
                self.insts.push(Inst::CheckIndex(check.clone(), 0));
                Ok(())
            }
            Pattern::Series(children) => children.iter().try_for_each(|child| self.c(child)),
            Pattern::Or(first, second) => self.c_or(first, second),
            Pattern::Repeat { pattern, min, max } => self.c_repeat(pattern, *min, *max),
            Pattern::Capture { name, pattern } => self.c_capture(name, pattern),
            Pattern::Skip => {
                self.insts.push(Inst::Skip);
                Ok(())
            }
            Pattern::Call(name) => {
                self.insts.push(Inst::OpenCall(name.clone()));
                Ok(())
            }
            Pattern::Grammar(grammar) => self.c_grammar(grammar),
        }
    }

    fn c_or(&mut self, first: &Pattern<T>, second: &Pattern<T>) -> Result<(), Error> {
        let first = Self::subprogram(first)?;
        let second = Self::subprogram(second)?;
        self.insts.push(Inst::Choice { offset: first.len() as isize + 3, at_index: 0 });
        self.insts.extend(first);
        self.insts.push(Inst::Commit);
        self.insts.push(Inst::Jump(second.len() as isize + 1));
        self.insts.extend(second);
        self.insts.push(Inst::ChoiceEnd);
        Ok(())
    }

    fn c_repeat(&mut self, pattern: &Pattern<T>, min: usize, max: Option<usize>) -> Result<(), Error> {
        let body = Self::subprogram(pattern)?;
        for _ in 0..min {
            self.insts.extend(body.iter().cloned());
        }
        match max {
            // each optional copy commits on success, so a completed
            // iteration is never given back
            Some(max) => {
                for _ in min..max {
                    self.insts.push(Inst::Choice { offset: body.len() as isize + 2, at_index: 0 });
                    self.insts.extend(body.iter().cloned());
                    self.insts.push(Inst::Commit);
                }
            }
            None => {
                let len = body.len() as isize;
                self.insts.push(Inst::Choice { offset: len + 3, at_index: 0 });
                self.insts.extend(body);
                self.insts.push(Inst::Commit);
                self.insts.push(Inst::Jump(-len - 2));
                self.insts.push(Inst::ChoiceEnd);
            }
        }
        Ok(())
    }

    fn c_capture(&mut self, name: &Option<String>, pattern: &Pattern<T>) -> Result<(), Error> {
        self.insts.push(Inst::CaptureStart(name.clone(), 0));
        self.c(pattern)?;
        self.insts.push(Inst::CaptureEnd(0));
        Ok(())
    }

    /// Layout: `call +2, jump past-all-bodies, body₁ … return, body₂ … return, …`.
    /// Rule references inside the emitted region are fixed up once all rule
    /// start positions are known, which is what allows recursion and forward
    /// references.
    fn c_grammar(&mut self, grammar: &Grammar<T>) -> Result<(), Error> {
        if grammar.rules.is_empty() {
            return Err(Error::EmptyPattern);
        }
        let mut bodies: Vec<(&str, Vec<Inst<T>>)> = Vec::with_capacity(grammar.rules.len());
        for (name, pattern) in &grammar.rules {
            if bodies.iter().any(|(seen, _)| *seen == name.as_str()) {
                return Err(Error::DuplicateRule(name.clone()));
            }
            let mut body = Self::subprogram(pattern)?;
            body.push(Inst::Return);
            bodies.push((name.as_str(), body));
        }

        let region = self.insts.len();
        let total: usize = bodies.iter().map(|(_, body)| body.len()).sum();
        self.insts.push(Inst::Call(2));
        self.insts.push(Inst::Jump(total as isize + 1));

        let mut starts = HashMap::with_capacity(bodies.len());
        for (name, body) in bodies {
            starts.insert(name.to_string(), self.insts.len());
            self.insts.extend(body);
        }

        // nested grammars already resolved their own calls, so anything
        // still open in this region belongs to this grammar
        for p in region..self.insts.len() {
            let name = match &self.insts[p] {
                Inst::OpenCall(name) => name.clone(),
                _ => continue,
            };
            let start = *starts.get(&name).ok_or(Error::UnknownRule(name))?;
            self.insts[p] = Inst::Call(start as isize - p as isize);
        }
        Ok(())
    }
}
