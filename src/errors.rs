//! Revparse Error Handling
//!
//! Two kinds of failure leave this crate:
//!
//! - [`GrammarError`]: a grammar or needle was built wrong. These are returned at construction
//!   time, before any parse or inversion runs, and are never folded into a parse result.
//! - [`ParseFailure`]: a rendered, source-annotated view of an ordinary
//!   [`ParseError`](crate::ParseError) for reporting to humans.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::parse::ParseError;

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

/// Malformed grammar usage, detected when the offending piece is constructed.
#[derive(Debug, Error, Diagnostic)]
pub enum GrammarError {
    #[error("pattern `{pattern}` is not anchored to the start of input")]
    #[diagnostic(
        code(revparse::grammar::unanchored_pattern),
        help("begin the pattern with `^`, or with `$` for an end-of-input probe")
    )]
    UnanchoredPattern { pattern: String },

    #[error("pattern `{pattern}` does not compile")]
    #[diagnostic(code(revparse::grammar::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("needle must have at least one key")]
    #[diagnostic(
        code(revparse::invert::empty_needle),
        help("an inversion target names the fields the grammar's terminal value must carry")
    )]
    EmptyNeedle,

    #[error("needle must be an object, found {found}")]
    #[diagnostic(code(revparse::invert::needle_not_object))]
    NeedleNotObject { found: &'static str },

    #[error("needle field `{key}` must be a primitive value, found {found}")]
    #[diagnostic(code(revparse::invert::non_primitive_needle_value))]
    NonPrimitiveNeedleValue { key: String, found: &'static str },
}

// ============================================================================
// PARSE FAILURE REPORTS
// ============================================================================

/// A parse failure located in its input, ready for `miette` rendering.
#[derive(Debug, Error, Diagnostic)]
#[error("{error}")]
#[diagnostic(code(revparse::parse::failure))]
pub struct ParseFailure {
    #[source_code]
    src: NamedSource<String>,
    #[label("parsing stopped here")]
    span: SourceSpan,
    #[help]
    trace: Option<String>,
    error: ParseError,
}

impl ParseFailure {
    pub(crate) fn new(name: &str, input: &str, offset: usize, error: ParseError) -> Self {
        let trace = (!error.nested.is_empty()).then(|| error.trace());
        Self {
            src: NamedSource::new(name, input.to_string()),
            span: SourceSpan::from(offset..offset),
            trace,
            error,
        }
    }

    /// Byte offset into the input where the failing step was attempted.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }

    pub fn error(&self) -> &ParseError {
        &self.error
    }
}
