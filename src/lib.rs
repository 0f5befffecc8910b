//! # Revparse
//!
//! Grammars are plain Rust functions over a [`Session`]: at each step they request a literal,
//! an anchored pattern, an ordered choice or another [`Rule`], and decide what to do next from
//! the match they get back. The same grammar runs forwards through [`parse`] to consume text,
//! and backwards through [`invert`] to synthesize the text for a target value.
//!
//! ## Module Structure
//!
//! ```text
//! combinators → has, optional, must_end, has_more, is_end, look_ahead, sequence
//!   ↓
//! parse / invert → the two engines
//!   ↓
//! grammar → GrammarNode, Pattern, Rule, Session, Halt
//!   ↓
//! value, errors → Value, GrammarError, ParseFailure
//! ```
//!
//! There is no recursion-depth guard: a self-referential grammar that never consumes input
//! recurses until the stack runs out.

pub mod combinators;
pub mod errors;
pub mod grammar;
pub mod invert;
pub mod parse;
pub mod value;

pub use crate::errors::{GrammarError, ParseFailure};
pub use crate::grammar::{
    GrammarNode, Halt, MatchValue, Outcome, Pattern, PatternMatch, Rule, SemanticFailure, Session,
};
pub use crate::invert::{invert, invert_outcome, InversionOutcome, Needle, PlaceholderSlot};
pub use crate::parse::{parse, FailedOn, ParseError, ParseResult};
pub use crate::value::{SlotId, Value};
