use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// Input element. Anything comparable, hashable and cheap to clone can be
/// matched: `char`, `u8`, tokens.
pub trait Element: Clone + Eq + Hash + fmt::Debug + 'static {}
impl<T: Clone + Eq + Hash + fmt::Debug + 'static> Element for T {}

/// Element predicate, with a description so programs stay printable.
#[derive(Clone)]
pub struct Check<T> {
    desc: Rc<str>,
    f: Rc<dyn Fn(&T) -> bool>,
}

impl<T> Check<T> {
    pub fn new(desc: &str, f: impl Fn(&T) -> bool + 'static) -> Check<T> {
        Check { desc: desc.into(), f: Rc::new(f) }
    }

    pub fn test(&self, element: &T) -> bool {
        (self.f)(element)
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }
}

impl<T> fmt::Debug for Check<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.desc)
    }
}

/// Zero-width test of a position in the input, e.g. a line anchor.
#[derive(Clone)]
pub struct IndexCheck<T> {
    kind: Rc<str>,
    f: Rc<dyn Fn(&[T], usize) -> bool>,
}

impl<T> IndexCheck<T> {
    pub fn new(kind: &str, f: impl Fn(&[T], usize) -> bool + 'static) -> IndexCheck<T> {
        IndexCheck { kind: kind.into(), f: Rc::new(f) }
    }

    pub fn test(&self, input: &[T], at: usize) -> bool {
        (self.f)(input, at)
    }

    /// Used to reject series of anchors that would always test the same position.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl<T> fmt::Debug for IndexCheck<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.kind)
    }
}

/// Forward scan produced by skip resolution: returns the next cursor worth
/// trying, or `None` when no candidate exists in the rest of the input.
#[derive(Clone)]
pub struct SearchFn<T> {
    desc: Rc<str>,
    f: Rc<dyn Fn(&[T], usize) -> Option<usize>>,
}

impl<T> SearchFn<T> {
    pub fn new(desc: &str, f: impl Fn(&[T], usize) -> Option<usize> + 'static) -> SearchFn<T> {
        SearchFn { desc: desc.into(), f: Rc::new(f) }
    }

    pub fn run(&self, input: &[T], from: usize) -> Option<usize> {
        (self.f)(input, from)
    }
}

impl<T> fmt::Debug for SearchFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<search {}>", self.desc)
    }
}

/// One bytecode instruction. All control offsets (`Jump`, `Choice`, `Call`)
/// are relative to the instruction's own position; the cursor offsets on
/// `CheckIndex`, `CaptureStart` and `CaptureEnd` are element counts relative
/// to the current cursor.
///
/// `OpenCall` and `Skip` are compiler-only placeholders; a program handed to
/// the executor must contain neither.
#[derive(Debug, Clone)]
pub enum Inst<T: Element> {
    /// Consume one element equal to the payload.
    Elem(T),
    /// Consume one element accepted by the predicate.
    Check(Check<T>),
    /// Zero-width test of the position at cursor + offset.
    CheckIndex(IndexCheck<T>, isize),
    /// Move the cursor by a signed distance, failing at input bounds.
    MoveIndex(isize),
    /// Jump the cursor to the next candidate position.
    Search(SearchFn<T>),
    Jump(isize),
    /// Record a capture boundary at cursor + offset.
    CaptureStart(Option<String>, isize),
    CaptureEnd(isize),
    /// Push a lower-priority thread at pc + offset, cursor shifted by
    /// `at_index` elements; shifting out of bounds redirects the pushed
    /// thread to the fail sentinel at position 0.
    Choice { offset: isize, at_index: isize },
    /// No-op marking the join point of an alternation.
    ChoiceEnd,
    /// Discard the most recently pushed thread.
    Commit,
    Call(isize),
    Return,
    Fail,
    Match,
    /// Unresolved rule reference, replaced by `Call` during grammar fix-up.
    OpenCall(String),
    /// Unresolved lazy gap, replaced during preprocessing.
    Skip,
}

/// A compiled, immutable instruction sequence. Position 0 is always `Fail`
/// and execution starts at position 1.
#[derive(Debug, Clone)]
pub struct Program<T: Element> {
    pub insts: Vec<Inst<T>>,
}

/// `pos + delta` for relative addressing.
pub(crate) fn target(pos: usize, delta: isize) -> usize {
    (pos as isize + delta) as usize
}

/// Inserts an instruction, re-deriving every relative offset that crosses
/// the insertion point so all jumps still land on the same instructions.
pub(crate) fn insert_instruction<T: Element>(insts: &mut Vec<Inst<T>>, pos: usize, inst: Inst<T>) {
    for p in 0..insts.len() {
        let offset = match &mut insts[p] {
            Inst::Jump(o) | Inst::Call(o) | Inst::Choice { offset: o, .. } => o,
            _ => continue,
        };
        let t = p as isize + *offset;
        let p_new = if p >= pos { p as isize + 1 } else { p as isize };
        let t_new = if t >= pos as isize { t + 1 } else { t };
        *offset = t_new - p_new;
    }
    insts.insert(pos, inst);
}
