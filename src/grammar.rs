//! Grammar Model
//!
//! A grammar is an ordinary Rust function over a [`Session`]. At each step it asks the session
//! for a [`GrammarNode`] (a literal, an anchored pattern, an ordered choice, or another rule) and
//! gets a [`MatchValue`] back. The same function is driven by the parse engine, which answers
//! from real input, and by the invert engine, which answers with synthetic matches.
//!
//! ```rust
//! use revparse::{parse, Pattern, Rule, Session, Value};
//!
//! let album = Rule::new("album", |s: &mut dyn Session| {
//!     s.literal("/albums/")?;
//!     let id = s.pattern(&Pattern::new(r"^\d+").unwrap())?;
//!     Ok(Value::record([("type", Value::from("album")), ("id", id.value())]))
//! });
//! let result = parse("/albums/42", &album);
//! assert_eq!(result.value().and_then(|v| v.get("id")), Some(&Value::from("42")));
//! ```

mod pattern;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use pattern::{Pattern, PatternMatch};

use crate::value::Value;

/// What a grammar body returns: its terminal value, or the reason it stopped.
pub type Outcome = Result<Value, Halt>;

type RuleBody = dyn Fn(&mut dyn Session) -> Outcome + Send + Sync;

// ============================================================================
// GRAMMAR NODES
// ============================================================================

/// The request a grammar step makes of its session.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarNode {
    /// Must match the input at offset 0 exactly. The empty literal always matches.
    Literal(String),
    Pattern(Pattern),
    /// Members are tried strictly in order; the first success wins.
    Choice(Vec<GrammarNode>),
    Rule(Rule),
}

impl GrammarNode {
    pub fn literal(text: impl Into<String>) -> Self {
        GrammarNode::Literal(text.into())
    }

    pub fn choice<I>(members: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<GrammarNode>,
    {
        GrammarNode::Choice(members.into_iter().map(Into::into).collect())
    }

    /// The alternatives this node offers, in order. A bare node is a choice of one and nested
    /// choices are flattened.
    pub fn candidates(&self) -> Vec<&GrammarNode> {
        match self {
            GrammarNode::Choice(members) => members.iter().flat_map(|m| m.candidates()).collect(),
            node => vec![node],
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            GrammarNode::Literal(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for GrammarNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarNode::Literal(text) => write!(f, "{:?}", text),
            GrammarNode::Pattern(pattern) => write!(f, "{}", pattern),
            GrammarNode::Choice(members) => {
                write!(f, "[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, "]")
            }
            GrammarNode::Rule(rule) => write!(f, "<{}>", rule.name()),
        }
    }
}

impl From<&str> for GrammarNode {
    fn from(text: &str) -> Self {
        GrammarNode::literal(text)
    }
}

impl From<String> for GrammarNode {
    fn from(text: String) -> Self {
        GrammarNode::Literal(text)
    }
}

impl From<Pattern> for GrammarNode {
    fn from(pattern: Pattern) -> Self {
        GrammarNode::Pattern(pattern)
    }
}

impl From<&Pattern> for GrammarNode {
    fn from(pattern: &Pattern) -> Self {
        GrammarNode::Pattern(pattern.clone())
    }
}

impl From<Rule> for GrammarNode {
    fn from(rule: Rule) -> Self {
        GrammarNode::Rule(rule)
    }
}

impl From<&Rule> for GrammarNode {
    fn from(rule: &Rule) -> Self {
        GrammarNode::Rule(rule.clone())
    }
}

impl From<Vec<GrammarNode>> for GrammarNode {
    fn from(members: Vec<GrammarNode>) -> Self {
        GrammarNode::Choice(members)
    }
}

// ============================================================================
// RULES
// ============================================================================

/// A named, shareable grammar. Running it from the top is the "fresh computation" a rule
/// reference stands for.
///
/// Two rules are equal only if they are the same definition (clones of one `Rule`).
#[derive(Clone)]
pub struct Rule {
    name: Arc<str>,
    body: Arc<RuleBody>,
}

impl Rule {
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&mut dyn Session) -> Outcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn label(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Runs the grammar body against a session.
    pub fn run(&self, session: &mut dyn Session) -> Outcome {
        (self.body)(session)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

// ============================================================================
// MATCH VALUES
// ============================================================================

/// What a session feeds back for a successful step.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchValue {
    Literal(String),
    Pattern(PatternMatch),
    /// The terminal value of a delegated rule.
    Rule(Value),
}

impl MatchValue {
    /// The step's result as a plain value: the literal text, the full pattern match, or the
    /// rule's terminal value.
    pub fn into_value(self) -> Value {
        match self {
            MatchValue::Literal(text) => Value::String(text),
            MatchValue::Pattern(found) => found.into_value(),
            MatchValue::Rule(value) => value,
        }
    }

    /// True when the empty-literal fallback of a probe is what matched.
    pub fn is_empty_literal(&self) -> bool {
        matches!(self, MatchValue::Literal(text) if text.is_empty())
    }
}

// ============================================================================
// HALTING
// ============================================================================

/// "Syntax matched, meaning didn't": an explicit rejection raised by grammar code.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SemanticFailure {
    message: String,
}

impl SemanticFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HaltReason {
    /// No candidate matched; the engine has recorded why.
    Mismatch,
    Rejected(SemanticFailure),
    /// A nested rule satisfied the inversion target.
    Resolved,
}

/// Why a grammar stopped before producing a terminal value. Propagate it with `?`.
///
/// Grammar code can only create rejections; the other reasons come from the engines.
#[derive(Debug, Clone, PartialEq)]
pub struct Halt(pub(crate) HaltReason);

impl Halt {
    pub fn reject(message: impl Into<String>) -> Self {
        Halt(HaltReason::Rejected(SemanticFailure::new(message)))
    }

    pub(crate) fn mismatch() -> Self {
        Halt(HaltReason::Mismatch)
    }

    pub(crate) fn resolved() -> Self {
        Halt(HaltReason::Resolved)
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self.0, HaltReason::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&SemanticFailure> {
        match &self.0 {
            HaltReason::Rejected(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<SemanticFailure> for Halt {
    fn from(failure: SemanticFailure) -> Self {
        Halt(HaltReason::Rejected(failure))
    }
}

// ============================================================================
// SESSION CAPABILITY
// ============================================================================

/// The one capability a grammar is written against.
///
/// Implemented by the parse engine (real matches) and the invert engine (synthetic matches);
/// grammar code cannot tell which one it is talking to.
pub trait Session {
    /// Requests the next fragment. On `Err`, the grammar should stop and return it.
    fn request(&mut self, node: &GrammarNode) -> Result<MatchValue, Halt>;

    fn literal(&mut self, text: &str) -> Result<String, Halt> {
        self.request(&GrammarNode::literal(text))
            .map(|found| match found {
                MatchValue::Literal(text) => text,
                other => other.into_value().to_string(),
            })
    }

    fn pattern(&mut self, pattern: &Pattern) -> Result<PatternMatch, Halt> {
        match self.request(&GrammarNode::Pattern(pattern.clone()))? {
            MatchValue::Pattern(found) => Ok(found),
            _ => Err(Halt::mismatch()),
        }
    }

    /// Delegates to another grammar and adopts its terminal value.
    fn rule(&mut self, rule: &Rule) -> Result<Value, Halt> {
        self.request(&GrammarNode::Rule(rule.clone()))
            .map(MatchValue::into_value)
    }

    fn one_of(&mut self, candidates: &[GrammarNode]) -> Result<MatchValue, Halt> {
        self.request(&GrammarNode::Choice(candidates.to_vec()))
    }
}
