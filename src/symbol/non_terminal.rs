// Grounded on alap_gen_ng/src/symbol/non_terminal.rs (NonTerminal variants,
// FirstsData) and spec.md §9's "cyclic grammar graph" note: a nonterminal is
// created empty and frozen exactly once when its productions are attached,
// so that two productions may refer to each other before either is fully
// defined.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::lookahead::LookaheadSet;
use crate::production::Production;
use crate::symbol::NonTerminalId;

static NEXT_CONSTRUCTION_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Default, Clone)]
pub struct FirstsData {
    pub firsts: LookaheadSet,
    pub nullable: bool,
}

#[derive(Debug)]
struct NonTerminalData {
    construction_id: u64,
    name: String,
    kind: NonTerminalKind,
    /// Set-once: `None` until `NonTerminal::define` is called. Allows
    /// mutually-recursive nonterminals to reference each other in handles
    /// before either has been frozen (spec.md §9).
    productions: RefCell<Option<Vec<Production>>>,
    index: Cell<Option<NonTerminalId>>,
    firsts: RefCell<Option<FirstsData>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonTerminalKind {
    UserDefined,
    /// The synthetic `S' -> S` start symbol the Analyzer adds when the root
    /// is a bare terminal, or to augment a nonterminal root (spec.md §4.4).
    Start,
}

/// A grammar symbol expanded by the parser (spec.md §3).
#[derive(Debug, Clone)]
pub struct NonTerminal(Rc<NonTerminalData>);

impl NonTerminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, NonTerminalKind::UserDefined)
    }

    pub(crate) fn new_start(name: impl Into<String>) -> Self {
        Self::with_kind(name, NonTerminalKind::Start)
    }

    fn with_kind(name: impl Into<String>, kind: NonTerminalKind) -> Self {
        Self(Rc::new(NonTerminalData {
            construction_id: NEXT_CONSTRUCTION_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name: name.into(),
            kind,
            productions: RefCell::new(None),
            index: Cell::new(None),
            firsts: RefCell::new(None),
        }))
    }

    /// Attaches this nonterminal's productions. May be called exactly once;
    /// calling it a second time is a caller bug (panics), matching the
    /// teacher's "frozen" nonterminal invariant.
    pub fn define(&self, productions: Vec<Production>) {
        let mut slot = self.0.productions.borrow_mut();
        assert!(
            slot.is_none(),
            "nonterminal \"{}\" defined more than once",
            self.0.name
        );
        *slot = Some(productions);
    }

    pub fn is_defined(&self) -> bool {
        self.0.productions.borrow().is_some()
    }

    pub fn productions(&self) -> Vec<Production> {
        self.0
            .productions
            .borrow()
            .as_ref()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_start(&self) -> bool {
        self.0.kind == NonTerminalKind::Start
    }

    pub fn index(&self) -> Option<NonTerminalId> {
        self.0.index.get()
    }

    pub(crate) fn set_index(&self, index: NonTerminalId) {
        self.0.index.set(Some(index));
    }

    pub fn firsts_data(&self) -> Option<FirstsData> {
        self.0.firsts.borrow().clone()
    }

    pub(crate) fn set_firsts_data(&self, data: FirstsData) -> bool {
        let mut slot = self.0.firsts.borrow_mut();
        let changed = slot.as_ref().map(|d| d.firsts != data.firsts || d.nullable != data.nullable).unwrap_or(true);
        *slot = Some(data);
        changed
    }
}

impl PartialEq for NonTerminal {
    fn eq(&self, other: &Self) -> bool {
        self.0.construction_id == other.0.construction_id
    }
}

impl Eq for NonTerminal {}

impl PartialOrd for NonTerminal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NonTerminal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.construction_id.cmp(&other.0.construction_id)
    }
}

impl std::hash::Hash for NonTerminal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.construction_id.hash(state)
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
