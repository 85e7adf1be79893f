//! Composable patterns over arbitrary element sequences, compiled to
//! bytecode and run by a backtracking virtual machine.
//!
//! A [`Pattern`] is built from literals, element classes, anchors, ordered
//! choice, repetition, captures, lazy gaps and recursive grammars, compiled
//! once into a [`Parser`], and run over a slice of any [`Element`] type.
//!
//! ```
//! use patterns::pattern::text;
//! use patterns::{Parser, Pattern};
//!
//! let spaced = text::literal(" ").then(Pattern::skip()).then(text::literal(" "));
//! let parser = Parser::search(spaced)?;
//!
//! let input = text::chars("This is a test text.");
//! let found: Vec<String> = parser
//!     .ranges(&input, 0)
//!     .map(|range| input[range].iter().collect())
//!     .collect();
//! assert_eq!(found, [" is ", " test "]);
//! # Ok::<(), patterns::Error>(())
//! ```

pub mod errors;
pub mod pattern;
pub mod search;
pub mod vm;

mod executor;
mod parser;

pub use errors::Error;
pub use parser::{Match, Matches, Parser};
pub use pattern::{Grammar, Pattern};
pub use search::SearchCache;
pub use vm::compiler::Compiler;
pub use vm::program::{Element, Inst, Program};
