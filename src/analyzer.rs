//! Grammar analysis: BFS reachability from the root symbol, symbol/
//! production numbering, start-symbol augmentation, and the structural
//! checks spec.md §4.1 and §6 require before any table is built.
//!
//! Grounded on `alap_gen_ng/src/grammar.rs`'s `TryFrom<Specification> for
//! Grammar` (undefined-nonterminal detection, unused-token/nonterminal
//! warnings) and `alap_gen_ng/src/symbol.rs`'s dedup-by-identity symbol
//! tables, adapted from "parse a `.agc` file into a `Specification`" to
//! "walk an in-memory, already-constructed grammar graph reachable from one
//! root symbol" (spec.md §3: the caller builds `Terminal`/`NonTerminal`
//! handles directly; there is no textual grammar format in scope).

use std::collections::VecDeque;

use crate::cancel::CancellationToken;
use crate::error::{BuildError, Warning};
use crate::production::{Production, ProductionId};
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::terminal::Terminal;
use crate::symbol::{GrammarSymbol, NonTerminalId, TerminalId};

/// Everything the Analyzer needs: the grammar's root symbol, and
/// (optionally) the full set of terminals/nonterminals the caller declared,
/// so unreachable ones can be flagged rather than silently dropped
/// (SPEC_FULL §D.1).
pub struct AnalyzerInput<'a> {
    pub root: GrammarSymbol,
    pub declared_terminals: &'a [Terminal],
    pub declared_non_terminals: &'a [NonTerminal],
    /// Terminals that exist purely to be recognised by the lexeme DFA —
    /// noise symbols and comment/group delimiters (spec.md §6) — but are
    /// never referenced by any production's right-hand side, so the BFS
    /// below would otherwise never assign them an index. Never checked for
    /// "unused" (they are never meant to be referenced).
    pub extra_terminals: &'a [Terminal],
}

/// The result of analysis: every reachable terminal/nonterminal, densely
/// indexed in BFS discovery order, plus the synthetic augmenting
/// production `S' -> root` (spec.md §4.4).
pub struct AnalyzedGrammar {
    pub terminals: Vec<Terminal>,
    pub non_terminals: Vec<NonTerminal>,
    pub start_non_terminal: NonTerminal,
    pub start_production: Production,
    pub warnings: Vec<Warning>,
}

pub fn analyze(input: AnalyzerInput<'_>, cancel: &dyn CancellationToken) -> Result<AnalyzedGrammar, BuildError> {
    let start_non_terminal = NonTerminal::new_start("$start");
    start_non_terminal.set_index(NonTerminalId(0));
    let start_production = Production::new(&start_non_terminal, vec![input.root.clone()]);
    start_non_terminal.define(vec![start_production.clone()]);

    let mut terminals: Vec<Terminal> = Vec::new();
    let mut non_terminals: Vec<NonTerminal> = vec![start_non_terminal.clone()];
    let mut empty_non_terminals: Vec<String> = Vec::new();
    let mut duplicate_productions: Vec<ProductionId> = Vec::new();
    let mut next_production_id = 0u32;

    start_production.set_id(ProductionId(next_production_id));
    next_production_id += 1;

    let mut queue: VecDeque<NonTerminal> = VecDeque::new();
    queue.push_back(start_non_terminal.clone());

    while let Some(nt) = queue.pop_front() {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let productions = nt.productions();
        if productions.is_empty() && !nt.is_start() {
            empty_non_terminals.push(nt.name().to_string());
            continue;
        }

        for (i, production) in productions.iter().enumerate() {
            if production.id().is_none() {
                production.set_id(ProductionId(next_production_id));
                next_production_id += 1;
            }
            for earlier in &productions[..i] {
                if same_rhs(earlier.right_hand_side(), production.right_hand_side()) {
                    duplicate_productions.push(production.id().expect("just assigned"));
                }
            }
            for symbol in production.right_hand_side() {
                match symbol {
                    GrammarSymbol::Terminal(t) => {
                        if t.index().is_none() {
                            t.set_index(TerminalId(terminals.len() as u32));
                            terminals.push(t.clone());
                        }
                    }
                    GrammarSymbol::NonTerminal(child) => {
                        if child.index().is_none() {
                            child.set_index(NonTerminalId(non_terminals.len() as u32));
                            non_terminals.push(child.clone());
                            queue.push_back(child.clone());
                        }
                    }
                }
            }
        }
    }

    if terminals.is_empty() && non_terminals.len() <= 1 {
        return Err(BuildError::NoSymbolsSpecified);
    }
    if !empty_non_terminals.is_empty() {
        return Err(BuildError::EmptyNonterminals(empty_non_terminals));
    }
    if !duplicate_productions.is_empty() {
        return Err(BuildError::DuplicateProductions(duplicate_productions));
    }

    for t in input.extra_terminals {
        if t.index().is_none() {
            t.set_index(TerminalId(terminals.len() as u32));
            terminals.push(t.clone());
        }
    }

    let nullable: Vec<TerminalId> = terminals
        .iter()
        .filter(|t| t.regex().is_trivially_nullable())
        .map(|t| t.index().expect("indexed above"))
        .collect();
    if !nullable.is_empty() {
        return Err(BuildError::NullableSymbols(nullable));
    }

    let mut indistinguishable: Vec<TerminalId> = Vec::new();
    for (i, a) in terminals.iter().enumerate() {
        if let Some(text) = a.literal_text() {
            for b in &terminals[i + 1..] {
                if b.literal_text() == Some(text) {
                    indistinguishable.push(a.index().expect("indexed above"));
                    indistinguishable.push(b.index().expect("indexed above"));
                }
            }
        }
    }
    if !indistinguishable.is_empty() {
        indistinguishable.sort_unstable();
        indistinguishable.dedup();
        return Err(BuildError::IndistinguishableSymbols(indistinguishable));
    }

    let mut warnings = Vec::new();
    for t in input.declared_terminals {
        if t.index().is_none() {
            warnings.push(Warning::UnusedTerminal(t.name().to_string()));
        }
    }
    for nt in input.declared_non_terminals {
        if nt.index().is_none() {
            warnings.push(Warning::UnusedNonTerminal(nt.name().to_string()));
        }
    }

    Ok(AnalyzedGrammar {
        terminals,
        non_terminals,
        start_non_terminal,
        start_production,
        warnings,
    })
}

fn same_rhs(a: &[GrammarSymbol], b: &[GrammarSymbol]) -> bool {
    a == b
}
