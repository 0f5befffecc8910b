//! Anchored regular-expression patterns and the matches they report.

use std::fmt;

use regex::Regex;
use regex_syntax::ast::{parse::Parser as AstParser, Ast, AssertionKind};
use regex_syntax::hir::Look;
use regex_syntax::Parser as HirParser;

use crate::errors::GrammarError;
use crate::value::{SlotId, Value};

/// A compiled regular expression that is anchored to the start (or end) of the input.
///
/// Anchoring is checked when the pattern is built, so an engine never meets an unanchored
/// pattern at parse time.
///
/// # Examples
///
/// ```rust
/// use revparse::Pattern;
/// assert!(Pattern::new(r"^\d+").is_ok());
/// assert!(Pattern::new(r"\d+").is_err());
/// ```
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
    zero_width: bool,
    /// Every match begins at the end of the input (`$`, `\z`).
    end_only: bool,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, GrammarError> {
        let regex = Regex::new(source).map_err(|e| GrammarError::InvalidPattern {
            pattern: source.to_string(),
            source: Box::new(e),
        })?;
        Self::from_regex(regex)
    }

    /// Wraps an already compiled regex, checking that it is anchored.
    pub fn from_regex(regex: Regex) -> Result<Self, GrammarError> {
        let ast = AstParser::new()
            .parse(regex.as_str())
            .map_err(|e| GrammarError::InvalidPattern {
                pattern: regex.as_str().to_string(),
                source: Box::new(e),
            })?;
        if !is_anchored(&ast) {
            return Err(GrammarError::UnanchoredPattern {
                pattern: regex.as_str().to_string(),
            });
        }
        let hir = HirParser::new()
            .parse(regex.as_str())
            .map_err(|e| GrammarError::InvalidPattern {
                pattern: regex.as_str().to_string(),
                source: Box::new(e),
            })?;
        let prefix = hir.properties().look_set_prefix();
        let end_only = prefix.contains(Look::End) && !prefix.contains(Look::Start);
        Ok(Self {
            regex,
            zero_width: false,
            end_only,
        })
    }

    /// Same pattern, but matching consumes no input.
    pub fn zero_width(mut self) -> Self {
        self.zero_width = true;
        self
    }

    pub fn is_zero_width(&self) -> bool {
        self.zero_width
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches against the head of `input`, returning the match and the number of bytes consumed.
    pub(crate) fn match_head(&self, input: &str) -> Option<(PatternMatch, usize)> {
        let captures = if self.end_only {
            self.regex.captures_at(input, input.len())?
        } else {
            self.regex.captures(input)?
        };
        let whole = captures.get(0)?;
        if whole.start() != 0 && !whole.is_empty() {
            return None;
        }
        let consumed = if self.zero_width || whole.start() != 0 {
            0
        } else {
            whole.end()
        };
        let groups = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let named = self
            .regex
            .capture_names()
            .enumerate()
            .filter_map(|(i, name)| name.map(|name| (name.to_string(), i)))
            .collect();
        let found = PatternMatch {
            text: Value::String(whole.as_str().to_string()),
            groups,
            named,
            start: whole.start(),
        };
        Some((found, consumed))
    }

    /// True when the whole of `text` is one match of this pattern.
    pub(crate) fn accepts(&self, text: &str) -> bool {
        self.regex
            .find_iter(text)
            .any(|m| m.start() == 0 && m.end() == text.len())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str() && self.zero_width == other.zero_width
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.zero_width {
            write!(f, "(?={})", self.as_str())
        } else {
            write!(f, "/{}/", self.as_str())
        }
    }
}

/// First meaningful construct is a start or end assertion.
fn is_anchored(ast: &Ast) -> bool {
    match ast {
        Ast::Assertion(assertion) => matches!(
            assertion.kind,
            AssertionKind::StartLine
                | AssertionKind::StartText
                | AssertionKind::EndLine
                | AssertionKind::EndText
        ),
        Ast::Concat(concat) => concat
            .asts
            .iter()
            .find(|ast| !matches!(ast, Ast::Flags(_)))
            .is_some_and(is_anchored),
        Ast::Alternation(alternation) => alternation.asts.iter().all(is_anchored),
        Ast::Group(group) => is_anchored(&group.ast),
        _ => false,
    }
}

// ============================================================================
// MATCHES
// ============================================================================

/// What a pattern step hands back: full text, capture groups and the match offset.
///
/// During inversion the full text is a [`Value::Slot`] placeholder and there are no groups.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    text: Value,
    groups: Vec<Option<String>>,
    named: Vec<(String, usize)>,
    start: usize,
}

impl PatternMatch {
    pub(crate) fn placeholder(slot: SlotId) -> Self {
        Self {
            text: Value::Slot(slot),
            groups: Vec::new(),
            named: Vec::new(),
            start: 0,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            text: Value::String(String::new()),
            groups: Vec::new(),
            named: Vec::new(),
            start: 0,
        }
    }

    /// The full match as a value; a slot handle while inverting.
    pub fn value(&self) -> Value {
        self.text.clone()
    }

    pub fn into_value(self) -> Value {
        self.text
    }

    /// The full match text, when there is real input behind it.
    pub fn as_str(&self) -> Option<&str> {
        self.text.as_str()
    }

    /// Capture group `index`; group 0 is the full match.
    pub fn group(&self, index: usize) -> Option<&str> {
        match index {
            0 => self.as_str(),
            n => self.groups.get(n - 1)?.as_deref(),
        }
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        let (_, index) = self.named.iter().find(|(n, _)| n == name)?;
        self.group(*index)
    }

    /// Offset in the remaining input where the match begins.
    pub fn start(&self) -> usize {
        self.start
    }
}
