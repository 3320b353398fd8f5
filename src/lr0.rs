//! LR(0) kernel and GOTO automaton construction (spec.md §4.4).
//!
//! Grounded on `alap_gen_ng/src/production.rs::GrammarItemSet` for the
//! closure/kernel/goto-kernel operations (`closable_set`, `kernel_key_set`,
//! `generate_goto_kernel`) and `alap_gen_ng/src/grammar.rs::closure`'s
//! worklist shape; the teacher interleaves LR(1) lookahead into this same
//! pass (see `lookahead.rs` module doc), whereas this crate keeps kernel/
//! GOTO construction lookahead-free, matching spec.md §4.4's staged
//! algorithm (LR(0) automaton first, lookahead propagated afterwards).

use std::collections::{BTreeMap, BTreeSet};

use crate::cancel::CancellationToken;
use crate::error::BuildError;
use crate::production::{Lr0Item, Production};
use crate::symbol::GrammarSymbol;

/// A single LR(0) state: its kernel items (the kernel is what identifies
/// the state), the closure of those items, and the shift/goto transitions
/// leaving it.
#[derive(Debug, Clone)]
pub struct Lr0State {
    pub id: u32,
    pub kernel: BTreeSet<Lr0Item>,
    pub items: BTreeSet<Lr0Item>,
    pub transitions: BTreeMap<GrammarSymbol, u32>,
}

impl Lr0State {
    pub fn reducible_items(&self) -> impl Iterator<Item = &Lr0Item> {
        self.items.iter().filter(|item| item.is_reducible())
    }
}

/// Closes a kernel item set: repeatedly adds `B -> .gamma` for every
/// nonterminal `B` immediately after a dot, until no new items appear
/// (spec.md §4.4).
fn closure(kernel: &BTreeSet<Lr0Item>) -> BTreeSet<Lr0Item> {
    let mut items = kernel.clone();
    let mut worklist: Vec<Lr0Item> = kernel.iter().cloned().collect();
    while let Some(item) = worklist.pop() {
        if let Some(GrammarSymbol::NonTerminal(nt)) = item.symbol_after_dot() {
            for production in nt.productions() {
                let new_item = Lr0Item::start(production);
                if items.insert(new_item.clone()) {
                    worklist.push(new_item);
                }
            }
        }
    }
    items
}

/// Builds the full LR(0) automaton starting from the augmenting production
/// `S' -> S`. State 0's kernel is always `{S' -> . S}`.
pub fn build_lr0_automaton(
    start_production: Production,
    cancel: &dyn CancellationToken,
) -> Result<Vec<Lr0State>, BuildError> {
    let start_kernel: BTreeSet<Lr0Item> = [Lr0Item::start(start_production)].into_iter().collect();

    let mut states: Vec<Lr0State> = vec![Lr0State {
        id: 0,
        kernel: start_kernel.clone(),
        items: BTreeSet::new(),
        transitions: BTreeMap::new(),
    }];
    let mut kernel_to_id: BTreeMap<BTreeSet<Lr0Item>, u32> = BTreeMap::new();
    kernel_to_id.insert(start_kernel, 0);

    let mut worklist = vec![0u32];
    while let Some(state_id) = worklist.pop() {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let items = closure(&states[state_id as usize].kernel);

        let mut goto_kernels: BTreeMap<GrammarSymbol, BTreeSet<Lr0Item>> = BTreeMap::new();
        for item in &items {
            if let Some(symbol) = item.symbol_after_dot() {
                goto_kernels.entry(symbol.clone()).or_default().insert(item.advanced());
            }
        }

        let mut transitions = BTreeMap::new();
        for (symbol, kernel) in goto_kernels {
            let target_id = if let Some(&existing) = kernel_to_id.get(&kernel) {
                existing
            } else {
                let new_id = states.len() as u32;
                kernel_to_id.insert(kernel.clone(), new_id);
                states.push(Lr0State {
                    id: new_id,
                    kernel,
                    items: BTreeSet::new(),
                    transitions: BTreeMap::new(),
                });
                worklist.push(new_id);
                new_id
            };
            transitions.insert(symbol, target_id);
        }

        states[state_id as usize].items = items;
        states[state_id as usize].transitions = transitions;
    }

    Ok(states)
}
