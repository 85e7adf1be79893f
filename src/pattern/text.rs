//! Character pattern shorthands.

use super::Pattern;

/// The input form every `Pattern<char>` parser works over.
pub fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

pub fn literal(s: &str) -> Pattern<char> {
    Pattern::Literal(s.chars().collect())
}

pub fn digit() -> Pattern<char> {
    Pattern::one_of("digit", |c: &char| c.is_ascii_digit())
}

pub fn letter() -> Pattern<char> {
    Pattern::one_of("letter", |c: &char| c.is_alphabetic())
}

pub fn alphanumeric() -> Pattern<char> {
    Pattern::one_of("alphanumeric", |c: &char| c.is_alphanumeric())
}

pub fn whitespace() -> Pattern<char> {
    Pattern::one_of("whitespace", |c: &char| c.is_whitespace())
}

pub fn one_of_chars(set: &str) -> Pattern<char> {
    let elements: Vec<char> = set.chars().collect();
    let desc = format!("one of {set:?}");
    Pattern::OneOf(crate::vm::program::Check::new(&desc, move |c| elements.contains(c)))
}

/// Start of the input or the position right after a newline.
pub fn line_start() -> Pattern<char> {
    Pattern::anchor("line start", |input, at| at == 0 || input[at - 1] == '\n')
}

/// End of the input or a position holding a newline.
pub fn line_end() -> Pattern<char> {
    Pattern::anchor("line end", |input, at| at == input.len() || input[at] == '\n')
}

/// Position where exactly one side is an alphanumeric character.
pub fn word_boundary() -> Pattern<char> {
    Pattern::anchor("word boundary", |input, at| {
        let word = |c: &char| c.is_alphanumeric();
        let before = at.checked_sub(1).map_or(false, |i| word(&input[i]));
        let after = input.get(at).map_or(false, word);
        before != after
    })
}
