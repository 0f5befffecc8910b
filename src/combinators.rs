//! # Standard Combinators
//!
//! Small grammars built only from session requests. The engines give them no special
//! treatment.
//!
//! Under `invert`, a rule's non-`Nil` value is unified with the needle like any terminal value.
//! [`must_end`] and [`sequence`] yield `Nil` and invert cleanly, and [`look_ahead`] is a plain
//! node that emits nothing. [`has`], [`has_more`] and [`is_end`] yield `Bool`, and [`optional`]
//! yields whatever matched, so a grammar that delegates to them parses but never inverts.
//!
//! - **Probes**: [`has`], [`optional`]
//! - **End of input**: [`must_end`], [`has_more`], [`is_end`]
//! - **Zero-width**: [`look_ahead`]
//! - **Composition**: [`sequence`]

use once_cell::sync::Lazy;

use crate::grammar::{GrammarNode, Pattern, Rule, Session};
use crate::value::Value;

static END_PROBE: Lazy<Pattern> =
    Lazy::new(|| Pattern::new("$").expect("`$` is a valid anchored pattern"));

static END_OF_INPUT: Lazy<Pattern> =
    Lazy::new(|| Pattern::new("^$").expect("`^$` is a valid anchored pattern"));

static MUST_END: Lazy<Rule> = Lazy::new(|| {
    Rule::new("must_end", |s: &mut dyn Session| {
        s.pattern(&END_OF_INPUT)?;
        Ok(Value::Nil)
    })
});

static HAS_MORE: Lazy<Rule> = Lazy::new(|| {
    Rule::new("has_more", |s: &mut dyn Session| {
        let end = s.pattern(&END_PROBE)?;
        Ok(Value::Bool(end.start() != 0))
    })
});

static IS_END: Lazy<Rule> = Lazy::new(|| {
    Rule::new("is_end", |s: &mut dyn Session| {
        let end = s.pattern(&END_PROBE)?;
        Ok(Value::Bool(end.start() == 0))
    })
});

// ============================================================================
// PROBES
// ============================================================================

/// Tries `item` without requiring it; yields `Bool(true)` if it matched.
///
/// # Examples
///
/// ```rust
/// use revparse::{combinators::has, parse, Value};
/// assert_eq!(parse("-12", &has("-")).value(), Some(&Value::Bool(true)));
/// assert_eq!(parse("12", &has("-")).value(), Some(&Value::Bool(false)));
/// ```
pub fn has(item: impl Into<GrammarNode>) -> Rule {
    let probe = GrammarNode::choice([item.into(), GrammarNode::literal("")]);
    Rule::new("has", move |s: &mut dyn Session| {
        let found = s.request(&probe)?;
        Ok(Value::Bool(!found.is_empty_literal()))
    })
}

/// Tries each of `items` in order without requiring any; yields what matched, or `Nil`.
pub fn optional<I>(items: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<GrammarNode>,
{
    let mut members: Vec<GrammarNode> = items.into_iter().map(Into::into).collect();
    members.push(GrammarNode::literal(""));
    let probe = GrammarNode::Choice(members);
    Rule::new("optional", move |s: &mut dyn Session| {
        let found = s.request(&probe)?;
        if found.is_empty_literal() {
            Ok(Value::Nil)
        } else {
            Ok(found.into_value())
        }
    })
}

// ============================================================================
// END OF INPUT
// ============================================================================

/// Fails unless all input has been consumed. Yields `Nil`, so it never disturbs an inversion.
pub fn must_end() -> Rule {
    MUST_END.clone()
}

/// `Bool(true)` while input remains.
pub fn has_more() -> Rule {
    HAS_MORE.clone()
}

/// `Bool(true)` once input is exhausted.
pub fn is_end() -> Rule {
    IS_END.clone()
}

// ============================================================================
// ZERO-WIDTH AND COMPOSITION
// ============================================================================

/// Matches `pattern` at the head of the input without consuming it.
pub fn look_ahead(pattern: &Pattern) -> GrammarNode {
    GrammarNode::Pattern(pattern.clone().zero_width())
}

/// Requests each node in order and yields `Nil`.
///
/// # Examples
///
/// ```rust
/// use revparse::{combinators::sequence, parse};
/// assert_eq!(parse("abc123abc", &sequence(["abc", "123", "abc"])).remaining(), "");
/// ```
pub fn sequence<I>(nodes: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<GrammarNode>,
{
    let nodes: Vec<GrammarNode> = nodes.into_iter().map(Into::into).collect();
    Rule::new("sequence", move |s: &mut dyn Session| {
        for node in &nodes {
            s.request(node)?;
        }
        Ok(Value::Nil)
    })
}
