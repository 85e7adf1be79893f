use std::ops::{Bound, RangeBounds};

use crate::errors::Error;
use crate::vm::program::{Check, Element, IndexCheck};

pub mod text;

/// A pattern tree. Leaves match elements or positions; composite nodes own
/// their children. Compiled into a `Program` by `vm::compiler::Compiler`.
#[derive(Debug, Clone)]
pub enum Pattern<T: Element> {
    /// A fixed sequence of elements.
    Literal(Vec<T>),
    /// Any one element accepted by a predicate.
    OneOf(Check<T>),
    /// A zero-width position test, e.g. a line anchor.
    Anchor(IndexCheck<T>),
    /// Concatenation.
    Series(Vec<Pattern<T>>),
    /// Ordered choice: the first alternative is always tried first.
    Or(Box<Pattern<T>>, Box<Pattern<T>>),
    /// Greedy repetition. Each completed iteration is committed, so the
    /// engine never backtracks into fewer iterations.
    Repeat { pattern: Box<Pattern<T>>, min: usize, max: Option<usize> },
    /// Records the matched range, optionally under a name.
    Capture { name: Option<String>, pattern: Box<Pattern<T>> },
    /// Lazy gap: any number of elements, as few as possible.
    Skip,
    /// Reference to a grammar rule, resolved at compile time.
    Call(String),
    /// A set of named, possibly recursive rules; matching starts at the
    /// first rule.
    Grammar(Grammar<T>),
}

impl<T: Element> Pattern<T> {
    pub fn literal(elements: impl Into<Vec<T>>) -> Pattern<T> {
        Pattern::Literal(elements.into())
    }

    pub fn single(element: T) -> Pattern<T> {
        Pattern::Literal(vec![element])
    }

    pub fn one_of(desc: &str, f: impl Fn(&T) -> bool + 'static) -> Pattern<T> {
        Pattern::OneOf(Check::new(desc, f))
    }

    /// Any single element.
    pub fn any() -> Pattern<T> {
        Pattern::one_of("any", |_| true)
    }

    /// A zero-width test of the current position. `kind` identifies the
    /// anchor; two anchors of the same kind in a row are rejected.
    pub fn anchor(kind: &str, f: impl Fn(&[T], usize) -> bool + 'static) -> Pattern<T> {
        Pattern::Anchor(IndexCheck::new(kind, f))
    }

    pub fn skip() -> Pattern<T> {
        Pattern::Skip
    }

    pub fn call(rule: &str) -> Pattern<T> {
        Pattern::Call(rule.to_string())
    }

    pub fn series(children: Vec<Pattern<T>>) -> Pattern<T> {
        Pattern::Series(children)
    }

    pub fn grammar(grammar: Grammar<T>) -> Pattern<T> {
        Pattern::Grammar(grammar)
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Pattern<T>) -> Pattern<T> {
        match self {
            Pattern::Series(mut children) => {
                children.push(next);
                Pattern::Series(children)
            }
            first => Pattern::Series(vec![first, next]),
        }
    }

    /// `self`, or `other` if `self` fails.
    pub fn or(self, other: Pattern<T>) -> Pattern<T> {
        Pattern::Or(Box::new(self), Box::new(other))
    }

    /// Repeats `self`, e.g. `p.repeat(2..=2)`, `p.repeat(1..)`, `p.repeat(..=3)`.
    pub fn repeat(self, bounds: impl RangeBounds<usize>) -> Pattern<T> {
        let min = match bounds.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n + 1,
            Bound::Unbounded => 0,
        };
        let max = match bounds.end_bound() {
            Bound::Included(&n) => Some(n),
            Bound::Excluded(&n) => Some(n.saturating_sub(1)),
            Bound::Unbounded => None,
        };
        Pattern::Repeat { pattern: Box::new(self), min, max }
    }

    pub fn capture(self) -> Pattern<T> {
        Pattern::Capture { name: None, pattern: Box::new(self) }
    }

    pub fn capture_as(self, name: &str) -> Pattern<T> {
        Pattern::Capture { name: Some(name.to_string()), pattern: Box::new(self) }
    }

    /// Rejects series that can never make progress: adjacent zero-width
    /// nodes of the same kind, impossible repetition bounds, and unbounded
    /// repetition of something that consumes nothing.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self {
            Pattern::Series(children) => {
                for pair in children.windows(2) {
                    if let (Some(a), Some(b)) = (pair[0].zero_width_kind(), pair[1].zero_width_kind())
                    {
                        if a == b {
                            return Err(Error::AdjacentZeroWidth(a.to_string()));
                        }
                    }
                }
                children.iter().try_for_each(Pattern::validate)
            }
            Pattern::Or(first, second) => {
                first.validate()?;
                second.validate()
            }
            Pattern::Repeat { pattern, min, max } => {
                if let Some(max) = max {
                    if min > max {
                        return Err(Error::InvalidRepetition { min: *min, max: *max });
                    }
                }
                if max.is_none() && pattern.is_zero_width() {
                    return Err(Error::ZeroWidthRepetition(pattern.describe()));
                }
                pattern.validate()
            }
            Pattern::Capture { pattern, .. } => pattern.validate(),
            Pattern::Grammar(grammar) => {
                grammar.rules.iter().try_for_each(|(_, rule)| rule.validate())
            }
            _ => Ok(()),
        }
    }

    fn zero_width_kind(&self) -> Option<&str> {
        match self {
            Pattern::Skip => Some("skip"),
            Pattern::Anchor(check) => Some(check.kind()),
            _ => None,
        }
    }

    fn is_zero_width(&self) -> bool {
        match self {
            Pattern::Literal(elements) => elements.is_empty(),
            Pattern::OneOf(_) | Pattern::Call(_) | Pattern::Grammar(_) => false,
            Pattern::Anchor(_) | Pattern::Skip => true,
            Pattern::Series(children) => children.iter().all(Pattern::is_zero_width),
            Pattern::Or(first, second) => first.is_zero_width() && second.is_zero_width(),
            Pattern::Repeat { pattern, max, .. } => *max == Some(0) || pattern.is_zero_width(),
            Pattern::Capture { pattern, .. } => pattern.is_zero_width(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Pattern::Literal(_) => "literal".to_string(),
            Pattern::OneOf(check) => check.desc().to_string(),
            Pattern::Anchor(check) => check.kind().to_string(),
            Pattern::Series(_) => "series".to_string(),
            Pattern::Or(..) => "choice".to_string(),
            Pattern::Repeat { .. } => "repetition".to_string(),
            Pattern::Capture { .. } => "capture".to_string(),
            Pattern::Skip => "skip".to_string(),
            Pattern::Call(name) => format!("rule `{name}`"),
            Pattern::Grammar(_) => "grammar".to_string(),
        }
    }
}

/// Named rule bodies for recursive patterns. Rules may reference each other
/// (including forward references and themselves) via `Pattern::call`; every
/// reference is resolved to a concrete call offset at compile time.
#[derive(Debug, Clone, Default)]
pub struct Grammar<T: Element> {
    pub(crate) rules: Vec<(String, Pattern<T>)>,
}

impl<T: Element> Grammar<T> {
    pub fn new() -> Grammar<T> {
        Grammar { rules: Vec::new() }
    }

    pub fn rule(mut self, name: &str, pattern: Pattern<T>) -> Grammar<T> {
        self.rules.push((name.to_string(), pattern));
        self
    }
}

#[cfg(test)]
mod test {
    use super::{text, Pattern};
    use crate::errors::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_two_skips_in_a_row() {
        let pattern = Pattern::<char>::skip().then(Pattern::skip());
        assert_eq!(pattern.validate(), Err(Error::AdjacentZeroWidth("skip".to_string())));
    }

    #[test]
    fn rejects_two_identical_anchors_in_a_row() {
        let pattern = text::line_start().then(text::line_start());
        assert_eq!(
            pattern.validate(),
            Err(Error::AdjacentZeroWidth("line start".to_string()))
        );

        // different kinds are fine: "^$" matches an empty line
        assert_eq!(text::line_start().then(text::line_end()).validate(), Ok(()));
    }

    #[test]
    fn rejects_nested_invalid_series() {
        let inner = Pattern::<char>::skip().then(Pattern::skip());
        let pattern = Pattern::single('a').or(inner);
        assert!(pattern.validate().is_err());
    }

    #[test]
    fn rejects_impossible_repetition_bounds() {
        let pattern = text::digit().repeat(3..=2);
        assert_eq!(pattern.validate(), Err(Error::InvalidRepetition { min: 3, max: 2 }));
    }

    #[test]
    fn rejects_unbounded_repetition_of_zero_width_patterns() {
        let pattern = text::line_start().repeat(0..);
        assert_eq!(
            pattern.validate(),
            Err(Error::ZeroWidthRepetition("line start".to_string()))
        );

        // a bounded count of a zero-width pattern terminates, so it is allowed
        assert_eq!(text::line_start().repeat(..=1).validate(), Ok(()));
    }

    #[test]
    fn repeat_accepts_the_usual_range_forms() {
        match text::digit().repeat(1..) {
            Pattern::Repeat { min: 1, max: None, .. } => {}
            p => panic!("unexpected pattern: {p:?}"),
        }
        match text::digit().repeat(2..=4) {
            Pattern::Repeat { min: 2, max: Some(4), .. } => {}
            p => panic!("unexpected pattern: {p:?}"),
        }
        match text::digit().repeat(..3) {
            Pattern::Repeat { min: 0, max: Some(2), .. } => {}
            p => panic!("unexpected pattern: {p:?}"),
        }
    }
}
