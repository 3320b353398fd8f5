//! Lookahead sets and the LALR(1) propagation technique that fills them in
//! (spec.md §4.6).
//!
//! Grounded on `alap_gen_ng/src/symbol/terminal.rs::TokenSet` for the
//! "bitset of terminal ids plus a couple of marker flags" shape, backed here
//! by `fixedbitset` (the same crate family `kbnf` depends on for its
//! automaton bitsets) instead of the teacher's `BTreeSet<Token>`, since
//! lookahead sets are indexed by dense `TerminalId` once the Analyzer has
//! run and a bitset is the natural representation for the Knuth/DeRemer
//! hash-terminal propagation worklist (spec.md §4.6: sets are unioned and
//! compared for fixed-point convergence far more than they are iterated).

use std::collections::BTreeMap;
use std::fmt;

use fixedbitset::FixedBitSet;

use crate::cancel::CancellationToken;
use crate::error::BuildError;
use crate::first::first_of_sequence;
use crate::lr0::Lr0State;
use crate::production::Lr0Item;
use crate::symbol::non_terminal::FirstsData;
use crate::symbol::{GrammarSymbol, TerminalId};

/// A set of terminals that may follow some grammar position, plus the two
/// sentinel markers spec.md §4.5/§4.6 use during FIRST-set and lookahead
/// propagation: `HasEnd` (epsilon — the symbol sequence can vanish) and
/// `HasHash` (the synthetic `#` marker Knuth/DeRemer propagation uses to
/// detect "lookahead flows from the state being closed, not from a fixed
/// terminal").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookaheadSet {
    bits: FixedBitSet,
    has_end: bool,
    has_hash: bool,
}

impl LookaheadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(num_terminals: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(num_terminals),
            has_end: false,
            has_hash: false,
        }
    }

    pub fn singleton(id: TerminalId, num_terminals: usize) -> Self {
        let mut set = Self::with_capacity(num_terminals);
        set.insert(id);
        set
    }

    pub fn grow(&mut self, num_terminals: usize) {
        if self.bits.len() < num_terminals {
            self.bits.grow(num_terminals);
        }
    }

    pub fn insert(&mut self, id: TerminalId) -> bool {
        let already = self.bits.contains(id.0 as usize);
        self.bits.insert(id.0 as usize);
        !already
    }

    pub fn contains(&self, id: TerminalId) -> bool {
        self.bits.contains(id.0 as usize)
    }

    pub fn set_has_end(&mut self, value: bool) -> bool {
        let changed = self.has_end != value;
        self.has_end = value;
        changed
    }

    pub fn has_end(&self) -> bool {
        self.has_end
    }

    pub fn set_has_hash(&mut self, value: bool) -> bool {
        let changed = self.has_hash != value;
        self.has_hash = value;
        changed
    }

    pub fn has_hash(&self) -> bool {
        self.has_hash
    }

    pub fn remove(&mut self, id: TerminalId) {
        self.bits.set(id.0 as usize, false);
    }

    pub fn is_empty(&self) -> bool {
        self.bits.count_ones(..) == 0 && !self.has_end
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.bits.ones().map(|i| TerminalId(i as u32))
    }

    pub fn intersection_is_empty(&self, other: &Self) -> bool {
        self.bits.is_disjoint(&other.bits)
    }

    /// Unions `other` into `self`, returning whether anything changed (used
    /// by the fixed-point loops in `first.rs` and `lookahead.rs` to detect
    /// convergence).
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.bits.count_ones(..);
        self.bits.union_with(&other.bits);
        let mut changed = self.bits.count_ones(..) != before;
        if other.has_end && !self.has_end {
            self.has_end = true;
            changed = true;
        }
        if other.has_hash && !self.has_hash {
            self.has_hash = true;
            changed = true;
        }
        changed
    }

    /// Union of everything in `other` except the hash marker itself, with
    /// `propagate_end` substituted for any `HasHash` flag found (the
    /// spontaneous/propagated lookahead rule of spec.md §4.6: wherever the
    /// closure of an LR(1) item set would have propagated the "lookahead of
    /// the state itself", the `#` marker stands in for it during the
    /// terminal-set computation, then gets replaced by the real incoming
    /// lookahead once it is known).
    pub fn union_substituting_hash(&mut self, other: &Self, substitute: &Self) -> bool {
        let mut changed = self.union_with(&{
            let mut o = other.clone();
            o.has_hash = false;
            o
        });
        if other.has_hash {
            changed |= self.union_with(substitute);
        }
        changed
    }
}

impl fmt::Display for LookaheadSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for id in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        if self.has_end {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "$end")?;
        }
        write!(f, "}}")
    }
}

/// The LR(1)-closure subroutine spec.md §4.6 uses both to discover
/// propagation edges (seeded with the synthetic `#` marker) and, later, to
/// expand a state's known kernel lookaheads into per-item lookaheads for
/// the action table. Given `[A -> alpha . X beta, a]`, adds
/// `[X -> . gamma, b]` for every `b` in FIRST(beta a), for every production
/// `X -> gamma`, until no item's lookahead set grows any further.
pub fn closure_with_lookaheads(
    seeds: Vec<(Lr0Item, LookaheadSet)>,
    first_table: &[FirstsData],
    num_terminals: usize,
) -> BTreeMap<Lr0Item, LookaheadSet> {
    let mut items: BTreeMap<Lr0Item, LookaheadSet> = BTreeMap::new();
    let mut worklist: Vec<Lr0Item> = Vec::new();
    for (item, la) in seeds {
        let entry = items
            .entry(item.clone())
            .or_insert_with(|| LookaheadSet::with_capacity(num_terminals));
        if entry.union_with(&la) {
            worklist.push(item);
        }
    }

    while let Some(item) = worklist.pop() {
        let la = items.get(&item).cloned().unwrap_or_default();
        if let Some(GrammarSymbol::NonTerminal(nt)) = item.symbol_after_dot() {
            let beta = &item.production.right_hand_side()[item.dot + 1..];
            let (mut beta_first, beta_nullable) = first_of_sequence(beta, first_table, num_terminals);
            if beta_nullable {
                beta_first.union_with(&la);
            }
            for production in nt.productions() {
                let new_item = Lr0Item::start(production);
                let entry = items
                    .entry(new_item.clone())
                    .or_insert_with(|| LookaheadSet::with_capacity(num_terminals));
                if entry.union_with(&beta_first) {
                    worklist.push(new_item);
                }
            }
        }
    }

    items
}

/// Propagates lookaheads onto every state's kernel items using the
/// Knuth/DeRemer hash-terminal technique (spec.md §4.6): for each kernel
/// item, close it with the synthetic `#` lookahead; any concrete terminal
/// that closure reaches is a *spontaneous* lookahead for the corresponding
/// item in the successor state, while `#` surviving into an item marks a
/// *propagated* edge from this kernel item to that one. The propagation
/// edges are then iterated to a fixed point.
pub fn compute_lookaheads(
    states: &[Lr0State],
    first_table: &[FirstsData],
    num_terminals: usize,
    cancel: &dyn CancellationToken,
) -> Result<Vec<BTreeMap<Lr0Item, LookaheadSet>>, BuildError> {
    let mut kernel_la: Vec<BTreeMap<Lr0Item, LookaheadSet>> = states
        .iter()
        .map(|s| {
            s.kernel
                .iter()
                .map(|item| (item.clone(), LookaheadSet::with_capacity(num_terminals)))
                .collect()
        })
        .collect();

    if let Some(start_item) = states[0].kernel.iter().next() {
        kernel_la[0].get_mut(start_item).expect("start item is its own kernel").set_has_end(true);
    }

    let mut edges: Vec<(u32, Lr0Item, u32, Lr0Item)> = Vec::new();

    for state in states {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        for kernel_item in &state.kernel {
            let mut hash_seed = LookaheadSet::with_capacity(num_terminals);
            hash_seed.set_has_hash(true);
            let closure =
                closure_with_lookaheads(vec![(kernel_item.clone(), hash_seed)], first_table, num_terminals);
            for (item, la) in closure {
                if let Some(symbol) = item.symbol_after_dot() {
                    let target_state = state.transitions[symbol];
                    let target_item = item.advanced();
                    let mut spontaneous = la.clone();
                    let propagates = spontaneous.has_hash();
                    spontaneous.set_has_hash(false);
                    if !spontaneous.is_empty() {
                        if let Some(slot) = kernel_la[target_state as usize].get_mut(&target_item) {
                            slot.union_with(&spontaneous);
                        }
                    }
                    if propagates {
                        edges.push((state.id, kernel_item.clone(), target_state, target_item));
                    }
                }
            }
        }
    }

    loop {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let mut changed = false;
        for (from_state, from_item, to_state, to_item) in &edges {
            let la = kernel_la[*from_state as usize]
                .get(from_item)
                .cloned()
                .unwrap_or_default();
            if let Some(slot) = kernel_la[*to_state as usize].get_mut(to_item) {
                if slot.union_with(&la) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    Ok(kernel_la)
}

/// Expands a state's kernel lookaheads (as computed by [`compute_lookaheads`])
/// into lookaheads for every item in the state, kernel and closure alike —
/// what the action table builder needs to know which terminals trigger a
/// reduction (spec.md §4.7).
pub fn closure_with_known_lookaheads(
    kernel_la: &BTreeMap<Lr0Item, LookaheadSet>,
    first_table: &[FirstsData],
    num_terminals: usize,
) -> BTreeMap<Lr0Item, LookaheadSet> {
    let seeds = kernel_la.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    closure_with_lookaheads(seeds, first_table, num_terminals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_reports_whether_anything_changed() {
        let mut a = LookaheadSet::with_capacity(4);
        let mut b = LookaheadSet::with_capacity(4);
        b.insert(TerminalId(1));
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert!(a.contains(TerminalId(1)));
    }

    #[test]
    fn has_end_is_tracked_independently_of_terminal_bits() {
        let mut set = LookaheadSet::with_capacity(2);
        assert!(!set.has_end());
        assert!(set.set_has_end(true));
        assert!(!set.set_has_end(true));
        assert!(set.has_end());
        assert!(!set.is_empty());
    }

    #[test]
    fn union_substituting_hash_replaces_the_hash_marker() {
        let mut target = LookaheadSet::with_capacity(4);
        let mut source = LookaheadSet::with_capacity(4);
        source.insert(TerminalId(0));
        source.set_has_hash(true);
        let mut substitute = LookaheadSet::with_capacity(4);
        substitute.insert(TerminalId(2));

        target.union_substituting_hash(&source, &substitute);
        assert!(target.contains(TerminalId(0)));
        assert!(target.contains(TerminalId(2)));
        assert!(!target.has_hash());
    }
}
