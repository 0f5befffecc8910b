//! Parse Engine
//!
//! Drives a [`Rule`] against real input. Every requested node is treated as an ordered choice;
//! literals and patterns must match at offset 0, rules recurse with a fresh frame, and the
//! first candidate that succeeds wins. When nothing matches, the frame records a
//! [`ParseError`] holding the failure of every rule candidate it tried.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::errors::ParseFailure;
use crate::grammar::{GrammarNode, Halt, HaltReason, MatchValue, Rule, SemanticFailure, Session};
use crate::value::Value;

// ============================================================================
// RESULTS
// ============================================================================

/// The step a parse gave up on.
#[derive(Debug, Clone, PartialEq)]
pub enum FailedOn {
    /// No candidate of this node matched.
    Node(GrammarNode),
    /// The grammar rejected what it matched.
    Rejected(SemanticFailure),
}

impl fmt::Display for FailedOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedOn::Node(node) => write!(f, "expected {}", node),
            FailedOn::Rejected(failure) => write!(f, "rejected: {}", failure),
        }
    }
}

/// A structured parse failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Zero-based step of the computation that failed.
    pub iteration: usize,
    pub failed_on: FailedOn,
    /// Failures of the rule candidates tried for this step, in order.
    pub nested: Vec<ParseError>,
}

impl ParseError {
    /// The failure and everything nested under it, one line per failure.
    pub fn trace(&self) -> String {
        let mut out = String::new();
        self.write_trace(&mut out, 0);
        out
    }

    fn write_trace(&self, out: &mut String, depth: usize) {
        if depth > 0 {
            out.push('\n');
        }
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.to_string());
        for nested in &self.nested {
            nested.write_trace(out, depth + 1);
        }
    }

    /// The deepest failure reached by following the last nested failure at each level.
    pub fn innermost(&self) -> &ParseError {
        match self.nested.last() {
            Some(nested) => nested.innermost(),
            None => self,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}: {}", self.iteration, self.failed_on)
    }
}

/// The outcome of [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult<'i> {
    Success { remaining: &'i str, value: Value },
    Failure { remaining: &'i str, error: ParseError },
}

impl<'i> ParseResult<'i> {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    /// Input left unconsumed when the computation finished or stopped.
    pub fn remaining(&self) -> &'i str {
        match self {
            ParseResult::Success { remaining, .. } | ParseResult::Failure { remaining, .. } => {
                remaining
            }
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ParseResult::Success { value, .. } => Some(value),
            ParseResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ParseError> {
        match self {
            ParseResult::Success { .. } => None,
            ParseResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, ParseError> {
        match self {
            ParseResult::Success { value, .. } => Ok(value),
            ParseResult::Failure { error, .. } => Err(error),
        }
    }

    /// Converts a failure into a diagnostic over `input`, which must be the string that was
    /// parsed.
    pub fn into_diagnostic(self, name: &str, input: &str) -> Result<Value, ParseFailure> {
        match self {
            ParseResult::Success { value, .. } => Ok(value),
            ParseResult::Failure { remaining, error } => {
                let offset = input.len().saturating_sub(remaining.len());
                Err(ParseFailure::new(name, input, offset, error))
            }
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses `input` with `rule`.
///
/// Malformed input never panics; it produces [`ParseResult::Failure`].
///
/// # Examples
///
/// ```rust
/// use revparse::{combinators::sequence, parse};
/// let result = parse("abcdef", &sequence(["abc", "wrong"]));
/// assert_eq!(result.remaining(), "def");
/// assert_eq!(result.error().map(|e| e.iteration), Some(1));
/// ```
pub fn parse<'i>(input: &'i str, rule: &Rule) -> ParseResult<'i> {
    Parser::new(input, rule).run(rule)
}

// ============================================================================
// PARSER FRAME
// ============================================================================

/// One call frame: the consumption state of a single rule invocation.
struct Parser<'i> {
    remaining: &'i str,
    iteration: usize,
    failure: Option<ParseError>,
    rule: Arc<str>,
}

impl<'i> Parser<'i> {
    fn new(input: &'i str, rule: &Rule) -> Self {
        Self {
            remaining: input,
            iteration: 0,
            failure: None,
            rule: rule.label(),
        }
    }

    fn run(mut self, rule: &Rule) -> ParseResult<'i> {
        let outcome = rule.run(&mut self);

        if let Some(error) = self.failure.take() {
            return ParseResult::Failure {
                remaining: self.remaining,
                error,
            };
        }

        match outcome {
            Ok(value) => {
                trace!(rule = %self.rule, steps = self.iteration, "rule finished");
                ParseResult::Success {
                    remaining: self.remaining,
                    value,
                }
            }
            Err(Halt(reason)) => {
                let failure = match reason {
                    HaltReason::Rejected(failure) => failure,
                    HaltReason::Mismatch | HaltReason::Resolved => {
                        SemanticFailure::new("computation halted outside its parse session")
                    }
                };
                debug!(rule = %self.rule, iteration = self.iteration, %failure, "rule rejected its match");
                ParseResult::Failure {
                    remaining: self.remaining,
                    error: ParseError {
                        iteration: self.iteration,
                        failed_on: FailedOn::Rejected(failure),
                        nested: Vec::new(),
                    },
                }
            }
        }
    }

    fn advance(&mut self, consumed: usize) {
        self.remaining = &self.remaining[consumed..];
        self.iteration += 1;
    }
}

impl Session for Parser<'_> {
    fn request(&mut self, node: &GrammarNode) -> Result<MatchValue, Halt> {
        if self.failure.is_some() {
            return Err(Halt::mismatch());
        }

        let mut nested = Vec::new();
        for candidate in node.candidates() {
            match candidate {
                GrammarNode::Literal(text) => {
                    if self.remaining.starts_with(text.as_str()) {
                        trace!(rule = %self.rule, iteration = self.iteration, %candidate, "matched");
                        self.advance(text.len());
                        return Ok(MatchValue::Literal(text.clone()));
                    }
                }
                GrammarNode::Pattern(pattern) => {
                    if let Some((found, consumed)) = pattern.match_head(self.remaining) {
                        trace!(rule = %self.rule, iteration = self.iteration, %candidate, "matched");
                        self.advance(consumed);
                        return Ok(MatchValue::Pattern(found));
                    }
                }
                GrammarNode::Rule(rule) => match Parser::new(self.remaining, rule).run(rule) {
                    ParseResult::Success { remaining, value } => {
                        trace!(rule = %self.rule, iteration = self.iteration, %candidate, "matched");
                        self.remaining = remaining;
                        self.iteration += 1;
                        return Ok(MatchValue::Rule(value));
                    }
                    ParseResult::Failure { error, .. } => nested.push(error),
                },
                GrammarNode::Choice(_) => {}
            }
        }

        debug!(rule = %self.rule, iteration = self.iteration, %node, "no candidate matched");
        self.failure = Some(ParseError {
            iteration: self.iteration,
            failed_on: FailedOn::Node(node.clone()),
            nested,
        });
        Err(Halt::mismatch())
    }
}
