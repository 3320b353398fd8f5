//! FIRST-set computation over the grammar's nonterminals (spec.md §4.5).
//!
//! Grounded on `alap_gen_ng/src/symbol/non_terminal.rs::FirstsData` (a
//! per-nonterminal cached terminal set plus a nullable/"transparent" flag)
//! and `alap_gen_ng/src/grammar.rs`'s worklist-based fixed point over all
//! productions, adapted to compute FIRST for every nonterminal up front
//! (rather than lazily per closure call) since spec.md §4.6 needs a stable
//! FIRST table before lookahead propagation begins.

use crate::cancel::CancellationToken;
use crate::error::BuildError;
use crate::lookahead::LookaheadSet;
use crate::symbol::non_terminal::FirstsData;
use crate::symbol::{GrammarSymbol, NonTerminalId};

/// Computes FIRST(X) for every nonterminal reachable from `nonterminals`,
/// storing the result on each handle via `NonTerminal::set_firsts_data`, and
/// returns the same table indexed by `NonTerminalId` for fast lookup during
/// lookahead propagation.
pub fn compute_first_sets(
    nonterminals: &[crate::symbol::non_terminal::NonTerminal],
    num_terminals: usize,
    cancel: &dyn CancellationToken,
) -> Result<Vec<FirstsData>, BuildError> {
    let mut table: Vec<FirstsData> = nonterminals
        .iter()
        .map(|_| FirstsData {
            firsts: LookaheadSet::with_capacity(num_terminals),
            nullable: false,
        })
        .collect();

    loop {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let mut changed = false;
        for nt in nonterminals {
            let idx = nt.index().expect("analyzer assigns indices before first.rs runs").0 as usize;
            for production in nt.productions() {
                let (seq_first, seq_nullable) =
                    first_of_sequence(production.right_hand_side(), &table, num_terminals);
                if table[idx].firsts.union_with(&seq_first) {
                    changed = true;
                }
                if seq_nullable && !table[idx].nullable {
                    table[idx].nullable = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    for (nt, data) in nonterminals.iter().zip(table.iter()) {
        nt.set_firsts_data(data.clone());
    }

    Ok(table)
}

/// FIRST of a symbol sequence (spec.md §4.5): union of FIRST of each prefix
/// symbol up to and including the first non-nullable one. Returns whether
/// the whole sequence is nullable.
pub fn first_of_sequence(
    symbols: &[GrammarSymbol],
    table: &[FirstsData],
    num_terminals: usize,
) -> (LookaheadSet, bool) {
    let mut result = LookaheadSet::with_capacity(num_terminals);
    for symbol in symbols {
        match symbol {
            GrammarSymbol::Terminal(t) => {
                let id = t.index().expect("analyzer assigns indices before first.rs runs");
                result.insert(id);
                return (result, false);
            }
            GrammarSymbol::NonTerminal(nt) => {
                let idx = nt.index().expect("analyzer assigns indices before first.rs runs");
                let NonTerminalId(idx) = idx;
                let data = &table[idx as usize];
                result.union_with(&data.firsts);
                if !data.nullable {
                    return (result, false);
                }
            }
        }
    }
    (result, true)
}
