use std::collections::HashSet;
use std::ops::Range;

use crate::errors::Error;
use crate::executor::{launch, RawMatch};
use crate::pattern::Pattern;
use crate::vm::compiler::Compiler;
use crate::vm::program::{Element, Inst, Program};

/// A compiled pattern. Compilation happens once; the parser can then be run
/// over any number of inputs.
#[derive(Debug, Clone)]
pub struct Parser<T: Element> {
    program: Program<T>,
}

impl<T: Element> Parser<T> {
    /// Compiles an anchored parser: a match must begin exactly at the
    /// position handed to it.
    pub fn new(pattern: Pattern<T>) -> Result<Parser<T>, Error> {
        Ok(Parser { program: Compiler::new().compile(&pattern)? })
    }

    /// Compiles a searching parser: a lazy gap in front lets the match begin
    /// anywhere at or after the requested position, and the pattern is
    /// wrapped in a capture so `Match::range` covers what it matched rather
    /// than collapsing to the end position.
    pub fn search(pattern: Pattern<T>) -> Result<Parser<T>, Error> {
        Self::new(Pattern::skip().then(pattern.capture()))
    }

    /// A single attempt with the program entry point at `at`.
    pub fn match_at(&self, input: &[T], at: usize) -> Option<Match> {
        launch(&self.program, input, at).map(|raw| self.reconstruct(raw))
    }

    /// The first match whose attempt starts at or after `from`.
    pub fn match_from(&self, input: &[T], from: usize) -> Option<Match> {
        (from..=input.len()).find_map(|at| self.match_at(input, at))
    }

    /// All matches from `from` on, non-overlapping, left to right. The
    /// iterator is lazy; nothing runs until it is advanced.
    pub fn matches<'a>(&'a self, input: &'a [T], from: usize) -> Matches<'a, T> {
        Matches { parser: self, input, index: from, last: None, stopped: false }
    }

    /// The ranges of `matches`.
    pub fn ranges<'a>(&'a self, input: &'a [T], from: usize) -> impl Iterator<Item = Range<usize>> + 'a {
        self.matches(input, from).map(|m| m.range())
    }

    /// Turns the executor's flat mark list into capture ranges. Marks arrive
    /// in execution order, so starts and ends pair up like parentheses;
    /// anything unbalanced is a compiler defect, not an input error.
    fn reconstruct(&self, raw: RawMatch) -> Match {
        let mut captures = Vec::with_capacity(raw.marks.len() / 2);
        let mut open: Vec<(Option<String>, usize)> = Vec::new();
        for mark in &raw.marks {
            match &self.program.insts[mark.inst] {
                Inst::CaptureStart(name, _) => open.push((name.clone(), mark.index)),
                Inst::CaptureEnd(_) => match open.pop() {
                    Some((name, start)) => captures.push((name, start..mark.index)),
                    None => panic!("capture end without a start"),
                },
                _ => unreachable!("capture mark on a non-capture instruction"),
            }
        }
        if !open.is_empty() {
            panic!("unclosed capture after a successful match");
        }
        Match { end: raw.end, captures }
    }
}

/// One successful match: where it ended and every capture completed on the
/// way, in order of completion (inner captures before the outer ones that
/// contain them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    end: usize,
    captures: Vec<(Option<String>, Range<usize>)>,
}

impl Match {
    /// Input position right after the match.
    pub fn end(&self) -> usize {
        self.end
    }

    /// First capture start to last capture end. A match without captures
    /// has an empty range at its end position.
    pub fn range(&self) -> Range<usize> {
        match (self.captures.first(), self.captures.last()) {
            (Some((_, first)), Some((_, last))) => first.start..last.end,
            _ => self.end..self.end,
        }
    }

    pub fn captures(&self) -> &[(Option<String>, Range<usize>)] {
        &self.captures
    }

    /// The first capture recorded under `name`.
    pub fn first(&self, name: &str) -> Option<Range<usize>> {
        self.captures
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, range)| range.clone())
    }

    /// Every capture recorded under `name`.
    pub fn all(&self, name: &str) -> Vec<Range<usize>> {
        self.captures
            .iter()
            .filter(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, range)| range.clone())
            .collect()
    }

    /// The distinct capture names present in this match.
    pub fn names(&self) -> HashSet<&str> {
        self.captures.iter().filter_map(|(n, _)| n.as_deref()).collect()
    }
}

/// Lazy sequence of non-overlapping matches, leftmost first. A repeated
/// zero-width match is skipped by moving one element forward, so the
/// sequence always makes progress; starts are strictly increasing.
pub struct Matches<'a, T: Element> {
    parser: &'a Parser<T>,
    input: &'a [T],
    index: usize,
    last: Option<Match>,
    stopped: bool,
}

impl<T: Element> Iterator for Matches<'_, T> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        if self.stopped {
            return None;
        }
        let mut m = self.parser.match_from(self.input, self.index)?;
        if self.last.as_ref() == Some(&m) {
            if self.index >= self.input.len() {
                self.stopped = true;
                return None;
            }
            self.index += 1;
            m = self.parser.match_from(self.input, self.index)?;
        }
        self.last = Some(m.clone());
        let range = m.range();
        if range.end == self.index {
            if range.end == self.input.len() {
                // a zero-width match at the very end is the last one possible
                self.stopped = true;
                return Some(m);
            }
            self.index += 1;
        } else {
            self.index = range.end;
        }
        Some(m)
    }
}
