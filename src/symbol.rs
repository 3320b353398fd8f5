//! Grammar symbols (spec.md §3: Terminal, Nonterminal, Grammar symbol).
//!
//! Terminals and nonterminals are built by the caller as `Rc`-shared handles
//! (mirroring the teacher's `alap_gen_ng::symbol::{Token, NonTerminal}`) so
//! that self-referential (cyclic) grammars can be expressed: a `NonTerminal`
//! is created empty and its productions are attached afterwards via
//! `NonTerminal::define`, a single "set-once" slot (spec.md §9).

pub mod non_terminal;
pub mod terminal;

use std::fmt;

pub use non_terminal::NonTerminal;
pub use terminal::Terminal;

/// Dense integer index assigned to a terminal during analysis (spec.md §3:
/// "Identity = index"). Only meaningful after `Analyzer::analyze` has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub u32);

/// Dense integer index assigned to a nonterminal during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonTerminalId(pub u32);

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl fmt::Display for NonTerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A tagged variant over {Terminal, Nonterminal} (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrammarSymbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl GrammarSymbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrammarSymbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, GrammarSymbol::NonTerminal(_))
    }

    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            GrammarSymbol::Terminal(t) => Some(t),
            GrammarSymbol::NonTerminal(_) => None,
        }
    }

    pub fn as_non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            GrammarSymbol::NonTerminal(n) => Some(n),
            GrammarSymbol::Terminal(_) => None,
        }
    }
}

impl From<&Terminal> for GrammarSymbol {
    fn from(t: &Terminal) -> Self {
        GrammarSymbol::Terminal(t.clone())
    }
}

impl From<&NonTerminal> for GrammarSymbol {
    fn from(n: &NonTerminal) -> Self {
        GrammarSymbol::NonTerminal(n.clone())
    }
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(t) => write!(f, "{}", t.name()),
            GrammarSymbol::NonTerminal(n) => write!(f, "{}", n.name()),
        }
    }
}

/// Tie-breaking rule for a shift/reduce conflict at equal precedence, and
/// the declared strength of an operator within its scope (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    NonAssociative,
    Left,
    Right,
    /// Declared for precedence comparison only; using it to break a tie is
    /// itself an error (`CannotChoose(PrecedenceOnlySpecified)`).
    PrecedenceOnly,
}

/// A tagged variant of things a DFA state may accept (spec.md §3's "DFA
/// symbol"): an ordinary terminal, a noise symbol the tokenizer discards
/// silently, or one end of a comment/group lexing delimiter pair (spec.md
/// §6's `comments[]`/Groups). Every variant still carries the underlying
/// terminal's dense index, since that terminal also occupies a slot in the
/// grammar's terminal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DfaSymbol {
    Terminal(TerminalId),
    Noise(TerminalId),
    GroupStart(TerminalId),
    GroupEnd(TerminalId),
}

impl DfaSymbol {
    pub fn terminal_id(self) -> TerminalId {
        match self {
            DfaSymbol::Terminal(id)
            | DfaSymbol::Noise(id)
            | DfaSymbol::GroupStart(id)
            | DfaSymbol::GroupEnd(id) => id,
        }
    }
}

impl fmt::Display for DfaSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DfaSymbol::Terminal(id) => write!(f, "{id}"),
            DfaSymbol::Noise(id) => write!(f, "noise({id})"),
            DfaSymbol::GroupStart(id) => write!(f, "group-start({id})"),
            DfaSymbol::GroupEnd(id) => write!(f, "group-end({id})"),
        }
    }
}
