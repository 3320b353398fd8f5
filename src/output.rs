//! The compiled grammar's output shape (spec.md §6): everything a caller
//! needs to drive a lexer and an LALR(1) parser, plus enough metadata to
//! print a human-readable dump.
//!
//! Grounded on `alap_gen_ng/src/grammar.rs::Grammar`, generalized from
//! "holds everything needed to emit generated Rust source" to "holds
//! everything needed to return as plain table data" — this crate performs
//! no code generation (SPEC_FULL §A).

use std::fmt;

use crate::action_table::{Action, ActionState};
use crate::dfa::DfaState;
use crate::error::{LalrConflict, Warning};
use crate::groups::{AdvanceMode, CommentGroup, EndingMode};
use crate::precedence::OperatorScope;
use crate::production::ProductionId;
use crate::symbol::{NonTerminalId, TerminalId};

#[derive(Debug, Clone)]
pub struct Properties {
    pub num_terminals: usize,
    pub num_non_terminals: usize,
    pub num_productions: usize,
    pub num_dfa_states: usize,
    pub num_lalr_states: usize,
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub index: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ProductionInfo {
    pub id: ProductionId,
    pub left_hand_side: NonTerminalId,
    pub display: String,
}

/// One declared precedence level, exposed so callers can print or diff a
/// grammar's operator table (spec.md §4.8).
#[derive(Debug, Clone)]
pub struct OperatorScopeInfo {
    pub rank: i32,
    pub associativity: crate::symbol::Associativity,
    pub member_names: Vec<String>,
}

impl OperatorScopeInfo {
    pub fn from_scope(scope: &OperatorScope, terminal_names: &dyn Fn(&crate::precedence::OperatorSymbol) -> String) -> Self {
        Self {
            rank: scope.rank(),
            associativity: scope.associativity(),
            member_names: scope.symbols().iter().map(terminal_names).collect(),
        }
    }
}

/// One declared comment/group lexing span, resolved to dense terminal ids
/// (spec.md §6's real "Groups" concept — distinct from an operator
/// precedence scope).
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub name: String,
    pub container: Option<String>,
    pub start: TerminalId,
    pub end: Option<TerminalId>,
    pub advance_mode: AdvanceMode,
    pub ending_mode: EndingMode,
    pub nesting: Vec<String>,
}

impl GroupInfo {
    pub fn from_declaration(group: &CommentGroup) -> Self {
        Self {
            name: group.name().to_string(),
            container: group.container().map(str::to_string),
            start: group.start().index().expect("analyzer indexes comment group terminals"),
            end: group
                .end()
                .map(|t| t.index().expect("analyzer indexes comment group terminals")),
            advance_mode: group.advance_mode(),
            ending_mode: group.ending_mode(),
            nesting: group.nesting().to_vec(),
        }
    }
}

/// The compiled product of one grammar build (spec.md §6): terminal lexeme
/// DFA, LALR(1) action/goto table, and enough symbol metadata to interpret
/// both.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub properties: Properties,
    pub terminals: Vec<SymbolInfo>,
    pub non_terminals: Vec<SymbolInfo>,
    pub productions: Vec<ProductionInfo>,
    pub operator_scopes: Vec<OperatorScopeInfo>,
    pub groups: Vec<GroupInfo>,
    pub dfa_states: Vec<DfaState>,
    pub dfa_start: u32,
    pub lalr_states: Vec<ActionState>,
    pub warnings: Vec<Warning>,
    pub conflicts: Vec<LalrConflict>,
}

impl CompiledGrammar {
    /// A multi-line, pretty-printed dump of the compiled tables
    /// (SPEC_FULL §D.3) — useful for debugging a grammar interactively, not
    /// a serialization format.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        use fmt::Write as _;
        let _ = writeln!(
            out,
            "{} terminals, {} nonterminals, {} productions, {} DFA states, {} LALR states",
            self.properties.num_terminals,
            self.properties.num_non_terminals,
            self.properties.num_productions,
            self.properties.num_dfa_states,
            self.properties.num_lalr_states,
        );
        for p in &self.productions {
            let _ = writeln!(out, "  {}: {}", p.id, p.display);
        }
        for g in &self.groups {
            let _ = writeln!(
                out,
                "  group {}: start=T{} end={} advance={:?} ending={:?}",
                g.name,
                g.start.0,
                g.end.map(|t| format!("T{}", t.0)).unwrap_or_else(|| "none".to_string()),
                g.advance_mode,
                g.ending_mode,
            );
        }
        for (state_id, state) in self.lalr_states.iter().enumerate() {
            let _ = writeln!(out, "state {state_id}:");
            for (terminal, action) in &state.actions {
                let _ = writeln!(out, "  on {terminal}: {}", describe_action(action));
            }
            for (nt, target) in &state.gotos {
                let _ = writeln!(out, "  goto {} on N{}", target, nt);
            }
        }
        if !self.conflicts.is_empty() {
            let _ = writeln!(out, "{} unresolved conflict(s):", self.conflicts.len());
            for c in &self.conflicts {
                let _ = writeln!(out, "  {c}");
            }
        }
        for w in &self.warnings {
            let _ = writeln!(out, "warning: {w}");
        }
        out
    }
}

fn describe_action(action: &Action) -> String {
    match action {
        Action::Shift(target) => format!("shift -> {target}"),
        Action::Reduce(id) => format!("reduce {id}"),
        Action::Accept => "accept".to_string(),
    }
}
