//! Invert Engine
//!
//! Drives the same [`Rule`]s as the parse engine, but against a target value (the [`Needle`])
//! instead of text. Literals are emitted as output components. Patterns cannot be resolved
//! without input, so each one leaves an empty component behind and hands the grammar a
//! [`Value::Slot`] handle in place of the matched text. When a computation finishes, its
//! terminal value is unified with the needle: plain fields must be equal, and slot fields take
//! the needle's text if the slot's pattern accepts it. Nested rules are held to the same test,
//! so a sub-rule that only contributes text must return `Nil`.
//!
//! Alternation is tried once, greedily and in declared order. The first branch that resolves
//! the needle ends the whole walk, even if a later branch would give shorter text.

use im::HashMap;
use tracing::{debug, trace};

use crate::errors::GrammarError;
use crate::grammar::{GrammarNode, Halt, MatchValue, Pattern, PatternMatch, Rule, Session};
use crate::value::{SlotId, Value};

// ============================================================================
// NEEDLE
// ============================================================================

/// The target of an inversion: the fields the terminal value must carry.
///
/// A needle always has at least one field and holds only primitive values.
///
/// # Examples
///
/// ```rust
/// use revparse::Needle;
/// use serde_json::json;
/// let needle = Needle::from_json(json!({"type": "album", "id": "123"})).unwrap();
/// assert_eq!(needle.len(), 2);
/// assert!(Needle::from_json(json!({})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Needle {
    fields: HashMap<String, Value>,
}

impl Needle {
    pub fn new<I, K>(entries: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields: HashMap<String, Value> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if fields.is_empty() {
            return Err(GrammarError::EmptyNeedle);
        }
        if let Some((key, value)) = fields.iter().find(|(_, v)| !v.is_primitive()) {
            return Err(GrammarError::NonPrimitiveNeedleValue {
                key: key.clone(),
                found: value.type_name(),
            });
        }
        Ok(Self { fields })
    }

    /// Builds a needle from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self, GrammarError> {
        match Value::from(json) {
            Value::Map(fields) => Self::new(fields),
            other => Err(GrammarError::NeedleNotObject {
                found: other.type_name(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl TryFrom<serde_json::Value> for Needle {
    type Error = GrammarError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Needle::from_json(json)
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// A deferred output position, filled from the needle once a terminal value names it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSlot {
    /// Index of the output component the slot fills.
    pub component: usize,
    /// The needle's value must match this pattern in full.
    pub pattern: Pattern,
}

/// Result of inverting one rule.
#[derive(Debug, Clone, PartialEq)]
pub enum InversionOutcome {
    /// The needle was resolved; joining the components gives the text.
    Complete(Vec<String>),
    /// The rule finished without a terminal value of its own.
    Partial(Vec<String>),
    None,
}

impl InversionOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, InversionOutcome::Complete(_))
    }

    /// The synthesized text of a complete outcome.
    pub fn text(&self) -> Option<String> {
        match self {
            InversionOutcome::Complete(components) => Some(components.concat()),
            _ => None,
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Synthesizes the text that `rule` would parse into a value carrying `needle`'s fields.
///
/// Returns `None` when no branch of the grammar can produce the needle.
///
/// # Examples
///
/// ```rust
/// use revparse::{combinators::must_end, invert, Needle, Rule, Session, Value};
/// use serde_json::json;
///
/// let home = Rule::new("home", |s: &mut dyn Session| {
///     s.literal("/")?;
///     s.rule(&must_end())?;
///     Ok(Value::record([("type", Value::from("home"))]))
/// });
/// let needle = Needle::from_json(json!({"type": "home"})).unwrap();
/// assert_eq!(invert(&needle, &home).as_deref(), Some("/"));
/// ```
pub fn invert(needle: &Needle, rule: &Rule) -> Option<String> {
    invert_outcome(needle, rule).text()
}

/// Like [`invert`], but reports partial outcomes too.
pub fn invert_outcome(needle: &Needle, rule: &Rule) -> InversionOutcome {
    let mut state = Inversion::new(needle);
    match walk(&mut state, rule) {
        Walk::Complete => InversionOutcome::Complete(state.components),
        Walk::Partial => InversionOutcome::Partial(state.components),
        Walk::Failed => InversionOutcome::None,
    }
}

// ============================================================================
// INVERSION STATE
// ============================================================================

/// Per-call output and slot table, shared by every frame of one inversion.
struct Inversion<'n> {
    needle: &'n Needle,
    components: Vec<String>,
    slots: Vec<PlaceholderSlot>,
    resolved: bool,
}

#[derive(Clone, Copy)]
struct Mark {
    components: usize,
    slots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Walk {
    Complete,
    Partial,
    Failed,
}

impl<'n> Inversion<'n> {
    fn new(needle: &'n Needle) -> Self {
        Self {
            needle,
            components: Vec::new(),
            slots: Vec::new(),
            resolved: false,
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            components: self.components.len(),
            slots: self.slots.len(),
        }
    }

    fn rewind(&mut self, mark: Mark) {
        self.components.truncate(mark.components);
        self.slots.truncate(mark.slots);
    }

    fn open_slot(&mut self, pattern: &Pattern) -> SlotId {
        let slot = SlotId(self.slots.len());
        self.slots.push(PlaceholderSlot {
            component: self.components.len(),
            pattern: pattern.clone(),
        });
        self.components.push(String::new());
        slot
    }

    /// Checks a terminal value against the needle, committing slot text on success.
    fn unify(&mut self, value: &Value) -> bool {
        let Some(fields) = value.as_map() else {
            return false;
        };
        if fields.len() != self.needle.len() {
            return false;
        }

        let mut commits = Vec::new();
        for (key, expected) in self.needle.fields.iter() {
            let Some(actual) = fields.get(key) else {
                return false;
            };
            match actual {
                Value::Slot(slot) => {
                    let Some(placeholder) = self.slots.get(slot.index()) else {
                        return false;
                    };
                    let Some(text) = expected.render_text() else {
                        return false;
                    };
                    if !placeholder.pattern.accepts(&text) {
                        trace!(key = %key, %text, pattern = %placeholder.pattern, "needle value rejected by slot");
                        return false;
                    }
                    commits.push((placeholder.component, text));
                }
                actual if actual == expected => {}
                _ => return false,
            }
        }

        for (component, text) in commits {
            self.components[component] = text;
        }
        true
    }
}

/// Inverts one rule invocation against the shared state.
fn walk(state: &mut Inversion<'_>, rule: &Rule) -> Walk {
    let mark = state.mark();
    let (outcome, halted) = {
        let mut frame = Frame {
            state: &mut *state,
            halted: false,
        };
        let outcome = rule.run(&mut frame);
        (outcome, frame.halted)
    };

    if state.resolved {
        return Walk::Complete;
    }

    let walked = match outcome {
        _ if halted => Walk::Failed,
        Err(_) => Walk::Failed,
        Ok(Value::Nil) => Walk::Partial,
        Ok(value) => {
            if state.unify(&value) {
                state.resolved = true;
                Walk::Complete
            } else {
                Walk::Failed
            }
        }
    };

    if walked == Walk::Failed {
        state.rewind(mark);
    }
    debug!(rule = rule.name(), outcome = ?walked, "inverted rule");
    walked
}

// ============================================================================
// INVERSION FRAME
// ============================================================================

/// The session one rule invocation sees while being inverted.
struct Frame<'a, 'n> {
    state: &'a mut Inversion<'n>,
    halted: bool,
}

impl Session for Frame<'_, '_> {
    fn request(&mut self, node: &GrammarNode) -> Result<MatchValue, Halt> {
        if self.state.resolved {
            return Err(Halt::resolved());
        }
        if self.halted {
            return Err(Halt::mismatch());
        }

        for candidate in node.candidates() {
            match candidate {
                // A literal always emits, so nothing after it is reached.
                GrammarNode::Literal(text) => {
                    self.state.components.push(text.clone());
                    return Ok(MatchValue::Literal(text.clone()));
                }
                GrammarNode::Pattern(pattern) if pattern.is_zero_width() => {
                    return Ok(MatchValue::Pattern(PatternMatch::empty()));
                }
                GrammarNode::Pattern(pattern) => {
                    let slot = self.state.open_slot(pattern);
                    return Ok(MatchValue::Pattern(PatternMatch::placeholder(slot)));
                }
                GrammarNode::Rule(rule) => match walk(self.state, rule) {
                    Walk::Complete => return Err(Halt::resolved()),
                    Walk::Partial => return Ok(MatchValue::Rule(Value::Nil)),
                    Walk::Failed => continue,
                },
                GrammarNode::Choice(_) => {}
            }
        }

        self.halted = true;
        Err(Halt::mismatch())
    }
}
