//! Compiles a context-free grammar (regex terminals, LALR(1) productions,
//! operator precedence) into a DFA lexer table and an LALR(1) parser action
//! table (spec.md §1).
//!
//! Grounded on `alap_gen_ng/src/grammar.rs`'s overall pipeline shape (build
//! item sets, resolve conflicts, assemble tables) generalized from "emit
//! generated Rust source" to "return table data the caller drives a parser
//! loop with" — this crate performs no code generation and ships no parser
//! runtime (spec.md §1's Non-goals).
//!
//! # Building a grammar
//!
//! Callers construct [`symbol::terminal::Terminal`] and
//! [`symbol::non_terminal::NonTerminal`] handles directly (there is no
//! textual grammar format), attach productions via `NonTerminal::define`,
//! optionally declare operator precedence via [`precedence::PrecedenceTable`],
//! and call [`compile`] with the root symbol.

pub mod action_table;
pub mod analyzer;
pub mod canon;
pub mod cancel;
pub mod dfa;
pub mod error;
pub mod first;
pub mod groups;
pub mod lookahead;
pub mod lr0;
pub mod output;
pub mod precedence;
pub mod production;
pub mod regex;
pub mod symbol;

use std::collections::BTreeSet;

use action_table::ConflictPolicy;
use cancel::{CancellationToken, NeverCancel};
use error::BuildResult;
use groups::CommentGroup;
use output::{CompiledGrammar, GroupInfo, OperatorScopeInfo, ProductionInfo, Properties, SymbolInfo};
use precedence::PrecedenceTable;
use symbol::non_terminal::NonTerminal;
use symbol::terminal::Terminal;
use symbol::{DfaSymbol, GrammarSymbol};

/// A grammar ready to compile: its root symbol, every terminal/nonterminal
/// the caller declared (for unused-symbol warnings, SPEC_FULL §D.1), its
/// operator precedence declarations, and the ambient lexer policy spec.md
/// §4.2 and §6 fold into the grammar rather than the build options (they
/// describe what the grammar *is*, not how to build it).
pub struct Metadata {
    pub root: GrammarSymbol,
    pub declared_terminals: Vec<Terminal>,
    pub declared_non_terminals: Vec<NonTerminal>,
    pub precedence: PrecedenceTable,
    /// When `false`, every character-class leaf is folded to also match its
    /// opposite-case form before the DFA is built (spec.md §4.2).
    pub case_sensitive: bool,
    /// Terminals matched by the DFA but silently discarded by the tokenizer
    /// rather than handed to the parser (spec.md §6's `noise-symbols[]`,
    /// e.g. whitespace).
    pub noise_symbols: Vec<Terminal>,
    /// Declared comment/group lexing spans (spec.md §6's `comments[]`).
    pub comments: Vec<CommentGroup>,
}

impl Metadata {
    pub fn new(root: impl Into<GrammarSymbol>) -> Self {
        Self {
            root: root.into(),
            declared_terminals: Vec::new(),
            declared_non_terminals: Vec::new(),
            precedence: PrecedenceTable::new(),
            case_sensitive: true,
            noise_symbols: Vec::new(),
            comments: Vec::new(),
        }
    }
}

/// Build-wide options that do not belong on the grammar itself
/// (SPEC_FULL §B).
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub conflict_policy: ConflictPolicy,
    /// spec.md §4.3: when several differently-specified terminals tie for
    /// the longest match at the same DFA state, a fixed-length one (no
    /// `Star` subtree) wins over a variable-length one rather than being
    /// reported as ambiguous. Off by default, matching the stricter
    /// "report every genuine tie" reading of spec.md §4.3.
    pub prioritize_fixed_length_symbols: bool,
}

/// Compiles `metadata` into lexer and parser tables, never cancelling.
pub fn compile(metadata: Metadata, options: BuildOptions) -> BuildResult<CompiledGrammar> {
    compile_with_cancellation(metadata, options, &NeverCancel)
}

/// Same as [`compile`], but polling `cancel` between each compiler stage
/// (spec.md §5).
pub fn compile_with_cancellation(
    metadata: Metadata,
    options: BuildOptions,
    cancel: &dyn CancellationToken,
) -> BuildResult<CompiledGrammar> {
    let extra_terminals: Vec<Terminal> = metadata
        .noise_symbols
        .iter()
        .cloned()
        .chain(metadata.comments.iter().flat_map(|g| {
            std::iter::once(g.start().clone()).chain(g.end().cloned())
        }))
        .collect();

    log::debug!("analyzing grammar reachable from the root symbol");
    let analyzed = analyzer::analyze(
        analyzer::AnalyzerInput {
            root: metadata.root,
            declared_terminals: &metadata.declared_terminals,
            declared_non_terminals: &metadata.declared_non_terminals,
            extra_terminals: &extra_terminals,
        },
        cancel,
    )?;

    log::debug!("applying {} operator precedence scope(s)", metadata.precedence.scopes().len());
    metadata.precedence.apply(&analyzed.terminals);

    log::debug!("computing FIRST sets over {} nonterminal(s)", analyzed.non_terminals.len());
    let first_table = first::compute_first_sets(&analyzed.non_terminals, analyzed.terminals.len(), cancel)?;

    log::debug!("building the LR(0) kernel/GOTO automaton");
    let lr0_states = lr0::build_lr0_automaton(analyzed.start_production.clone(), cancel)?;
    log::debug!("{} LR(0) state(s)", lr0_states.len());

    log::debug!("propagating LALR(1) lookaheads");
    let kernel_lookaheads =
        lookahead::compute_lookaheads(&lr0_states, &first_table, analyzed.terminals.len(), cancel)?;

    log::debug!("building the terminal lexeme DFA");
    let noise_ids: BTreeSet<symbol::TerminalId> = metadata
        .noise_symbols
        .iter()
        .map(|t| t.index().expect("analyzer indexes noise terminals"))
        .collect();
    let group_start_ids: BTreeSet<symbol::TerminalId> = metadata
        .comments
        .iter()
        .map(|g| g.start().index().expect("analyzer indexes comment group terminals"))
        .collect();
    let group_end_ids: BTreeSet<symbol::TerminalId> = metadata
        .comments
        .iter()
        .filter_map(|g| g.end())
        .map(|t| t.index().expect("analyzer indexes comment group terminals"))
        .collect();

    let dfa_symbols: Vec<(DfaSymbol, &regex::Regex)> = analyzed
        .terminals
        .iter()
        .map(|t| {
            let id = t.index().expect("analyzer assigns indices");
            let symbol = if group_start_ids.contains(&id) {
                DfaSymbol::GroupStart(id)
            } else if group_end_ids.contains(&id) {
                DfaSymbol::GroupEnd(id)
            } else if noise_ids.contains(&id) {
                DfaSymbol::Noise(id)
            } else {
                DfaSymbol::Terminal(id)
            };
            (symbol, t.regex())
        })
        .collect();
    let canonical = canon::canonicalize(&dfa_symbols, metadata.case_sensitive);
    let dfa = dfa::build_dfa(&canonical, options.prioritize_fixed_length_symbols)?;
    log::debug!("{} DFA state(s)", dfa.states.len());

    log::debug!("assembling the LALR(1) action table");
    let start_production_id = analyzed
        .start_production
        .id()
        .expect("analyzer assigns the start production's id");
    let action_table = action_table::build_action_table(
        &lr0_states,
        &kernel_lookaheads,
        &first_table,
        &analyzed.terminals,
        analyzed.terminals.len(),
        start_production_id,
        &metadata.precedence,
        options.conflict_policy,
        cancel,
    )?;

    let productions: Vec<ProductionInfo> = analyzed
        .non_terminals
        .iter()
        .flat_map(|nt| nt.productions())
        .map(|p| ProductionInfo {
            id: p.id().expect("analyzer assigns production ids"),
            left_hand_side: p
                .left_hand_side()
                .index()
                .expect("analyzer assigns nonterminal indices"),
            display: p.to_string(),
        })
        .collect();

    let operator_scopes: Vec<OperatorScopeInfo> = metadata
        .precedence
        .scopes()
        .iter()
        .map(|scope| {
            OperatorScopeInfo::from_scope(scope, &|op| match op {
                precedence::OperatorSymbol::Terminal(id) => analyzed
                    .terminals
                    .get(id.0 as usize)
                    .map(|t| t.name().to_string())
                    .unwrap_or_default(),
                precedence::OperatorSymbol::Literal(text) => text.clone(),
            })
        })
        .collect();

    let groups: Vec<GroupInfo> = metadata.comments.iter().map(GroupInfo::from_declaration).collect();

    Ok(CompiledGrammar {
        properties: Properties {
            num_terminals: analyzed.terminals.len(),
            num_non_terminals: analyzed.non_terminals.len(),
            num_productions: productions.len(),
            num_dfa_states: dfa.states.len(),
            num_lalr_states: lr0_states.len(),
        },
        terminals: analyzed
            .terminals
            .iter()
            .map(|t| SymbolInfo {
                index: t.index().expect("analyzer assigns indices").0,
                name: t.name().to_string(),
            })
            .collect(),
        non_terminals: analyzed
            .non_terminals
            .iter()
            .map(|nt| SymbolInfo {
                index: nt.index().expect("analyzer assigns indices").0,
                name: nt.name().to_string(),
            })
            .collect(),
        productions,
        operator_scopes,
        groups,
        dfa_states: dfa.states,
        dfa_start: dfa.start,
        lalr_states: action_table.states,
        warnings: analyzed.warnings,
        conflicts: action_table.conflicts,
    })
}
