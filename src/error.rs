//! The error taxonomy emitted at the crate boundary (spec.md §6, §7).

use std::fmt;

use crate::precedence::ConflictReason;
use crate::production::ProductionId;
use crate::symbol::TerminalId;

/// A non-fatal observation the Analyzer makes while walking the grammar
/// graph (SPEC_FULL §D.1). Warnings never abort compilation. Unused symbols
/// carry no dense index — they were never reached, so one was never
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnusedTerminal(String),
    UnusedNonTerminal(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnusedTerminal(name) => write!(f, "terminal \"{name}\" is not used"),
            Warning::UnusedNonTerminal(name) => {
                write!(f, "non terminal \"{name}\" is not used")
            }
        }
    }
}

/// A single shift/reduce or reduce/reduce collision discovered while
/// assembling the action table for one state (spec.md §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LalrConflict {
    pub state: u32,
    pub lookahead: Option<TerminalId>,
    pub competing_productions: Vec<ProductionId>,
    pub competing_shift: bool,
    pub reason: ConflictReason,
}

impl fmt::Display for LalrConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let la = match self.lookahead {
            Some(t) => format!("terminal #{}", t.0),
            None => "EOF".to_string(),
        };
        write!(
            f,
            "state {}: conflict on {} among {:?} (shift={}): {}",
            self.state, la, self.competing_productions, self.competing_shift, self.reason
        )
    }
}

/// The full set of ways grammar compilation can fail (spec.md §6).
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no symbols specified")]
    NoSymbolsSpecified,

    #[error("non terminal(s) with no productions: {0:?}")]
    EmptyNonterminals(Vec<String>),

    #[error("duplicate production(s): {0:?}")]
    DuplicateProductions(Vec<ProductionId>),

    #[error("terminal(s) whose regex matches the empty string: {0:?}")]
    NullableSymbols(Vec<TerminalId>),

    #[error("regex could not be parsed: {0:?}")]
    RegexParseError(Vec<String>),

    #[error("indistinguishable terminal symbols: {0:?}")]
    IndistinguishableSymbols(Vec<TerminalId>),

    #[error("{0}")]
    LalrConflict(LalrConflict),

    #[error("{} unresolved LALR(1) conflict(s)", .0.len())]
    LalrConflictReport(Vec<LalrConflict>),

    #[error("build was cancelled")]
    Cancelled,
}

pub type BuildResult<T> = Result<T, BuildError>;
