use thiserror::Error;

/// Errors reported while building a pattern into a runnable program.
///
/// These are ordinary, recoverable failures caused by a malformed pattern.
/// Defects inside the engine itself (unresolved placeholders reaching the
/// interpreter, unbalanced capture markers) are panics, not `Error`s.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("pattern compiles to nothing and would match nowhere")]
    EmptyPattern,
    #[error("cannot have two `{0}` in a row, they would always match at the same position")]
    AdjacentZeroWidth(String),
    #[error("repetition minimum {min} is greater than maximum {max}")]
    InvalidRepetition { min: usize, max: usize },
    #[error("repeating `{0}` consumes no input and would never finish")]
    ZeroWidthRepetition(String),
    #[error("call to unknown grammar rule `{0}`")]
    UnknownRule(String),
    #[error("grammar rule `{0}` is defined twice")]
    DuplicateRule(String),
    #[error("call to rule `{0}` outside of a grammar")]
    CallOutsideGrammar(String),
}
