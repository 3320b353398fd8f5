// Grounded on alap_gen_ng/src/symbol/terminal.rs (Token/TokenData: Rc-shared
// data cell, Cell-based associativity/precedence set after construction by
// an operator-scope declaration).

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::regex::Regex;
use crate::symbol::{Associativity, TerminalId};

static NEXT_CONSTRUCTION_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct TerminalData {
    construction_id: u64,
    name: String,
    regex: Regex,
    /// Some(text) when this terminal is a simple literal lexeme (e.g. a
    /// keyword or punctuation token); lets the precedence resolver's
    /// string-literal operator symbols (spec.md §4.8) find it by text.
    literal_text: Option<String>,
    index: Cell<Option<TerminalId>>,
    precedence: Cell<Option<(Associativity, i32)>>,
}

/// A grammar symbol matched by the tokenizer (spec.md §3).
#[derive(Debug, Clone)]
pub struct Terminal(Rc<TerminalData>);

impl Terminal {
    /// A terminal whose lexeme is recognised by an arbitrary regex.
    pub fn new(name: impl Into<String>, regex: Regex) -> Self {
        Self(Rc::new(TerminalData {
            construction_id: NEXT_CONSTRUCTION_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name: name.into(),
            regex,
            literal_text: None,
            index: Cell::new(None),
            precedence: Cell::new(None),
        }))
    }

    /// A terminal whose lexeme is a fixed literal string. `text` is both the
    /// regex source (matched verbatim) and the key operator scopes use to
    /// refer to it via a string literal (spec.md §4.8).
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self(Rc::new(TerminalData {
            construction_id: NEXT_CONSTRUCTION_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name: name.into(),
            regex: Regex::literal(&text),
            literal_text: Some(text),
            index: Cell::new(None),
            precedence: Cell::new(None),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn regex(&self) -> &Regex {
        &self.0.regex
    }

    pub fn literal_text(&self) -> Option<&str> {
        self.0.literal_text.as_deref()
    }

    pub fn index(&self) -> Option<TerminalId> {
        self.0.index.get()
    }

    pub(crate) fn set_index(&self, index: TerminalId) {
        self.0.index.set(Some(index));
    }

    pub fn associativity_and_precedence(&self) -> Option<(Associativity, i32)> {
        self.0.precedence.get()
    }

    pub fn set_associativity_and_precedence(&self, associativity: Associativity, precedence: i32) {
        self.0.precedence.set(Some((associativity, precedence)));
    }

    pub fn has_precedence(&self) -> bool {
        self.0.precedence.get().is_some()
    }
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        self.0.construction_id == other.0.construction_id
    }
}

impl Eq for Terminal {}

impl PartialOrd for Terminal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Terminal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.construction_id.cmp(&other.0.construction_id)
    }
}

impl std::hash::Hash for Terminal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.construction_id.hash(state)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
