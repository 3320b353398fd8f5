//! DFA construction from a [`crate::canon::Canonical`] leaf/followpos table
//! via subset construction (spec.md §4.3).
//!
//! Grounded on `natrow-591-compilers/regex/src/dfa.rs`'s `Dfa<S, A>` (a
//! dense per-state edge map plus an accepting-state table) generalized to
//! carry, per state, an optional accept symbol and an "anything else"
//! fallback edge; `jsinger67-scnr`'s `CompiledDfa`
//! (`other_examples/3b4b826c_...compiled_dfa.rs.rs`) is additional
//! cross-reference for keeping per-state transitions and end-states as
//! separate tables rather than folding accept information into the
//! transition map.

use std::collections::BTreeMap;

use fixedbitset::FixedBitSet;

use crate::canon::{Canonical, LeafKind, PriorityBand};
use crate::error::BuildError;
use crate::regex::CharRange;
use crate::symbol::{DfaSymbol, TerminalId};

/// A state's outgoing edges: concrete character-range transitions plus an
/// optional fallback for every character none of them claims ("anything
/// else"). spec.md §9 fixes the overwrite order as load-bearing: fallback
/// edges are written first and concrete ranges always take precedence over
/// them, never the reverse, so two `AllButChars` leaves can never silently
/// shadow a later concrete one.
#[derive(Debug, Clone, Default)]
pub struct DfaState {
    pub id: u32,
    /// Sorted, non-overlapping concrete transitions.
    pub ranges: Vec<(CharRange, u32)>,
    /// The successor for any character not covered by `ranges`, if any
    /// leaf active in this state was an `AllButChars` wildcard.
    pub fallback: Option<u32>,
    pub accept: Option<DfaSymbol>,
}

pub struct Dfa {
    pub states: Vec<DfaState>,
    pub start: u32,
}

/// Builds the DFA recognising whichever of `canonical`'s symbols matches
/// first at each state, applying spec.md §4.3's accept-resolution policy:
/// no candidates accepts nothing; one candidate (or several naming the same
/// symbol) accepts unambiguously; several candidates naming different
/// symbols are resolved only when `prioritize_fixed_length_symbols` is set
/// and the two lowest-priority candidates have strictly different bands
/// (the fixed-length one wins); otherwise the tie is reported as
/// [`BuildError::IndistinguishableSymbols`].
pub fn build_dfa(canonical: &Canonical, prioritize_fixed_length_symbols: bool) -> Result<Dfa, BuildError> {
    let accept_priority: BTreeMap<usize, (DfaSymbol, PriorityBand)> = canonical
        .leaves
        .iter()
        .filter_map(|leaf| match &leaf.kind {
            LeafKind::End { symbol, band } => Some((leaf.id, (*symbol, *band))),
            _ => None,
        })
        .collect();

    let mut ambiguous: Vec<TerminalId> = Vec::new();

    let mut states: Vec<DfaState> = Vec::new();
    let mut state_of: BTreeMap<Vec<usize>, u32> = BTreeMap::new();

    let start_key = sorted_positions(&canonical.root_firstpos);
    state_of.insert(start_key.clone(), 0);
    states.push(DfaState {
        id: 0,
        ranges: Vec::new(),
        fallback: None,
        accept: resolve_accept(&start_key, &accept_priority, prioritize_fixed_length_symbols, &mut ambiguous),
    });

    let mut worklist = vec![start_key];
    while let Some(key) = worklist.pop() {
        let state_id = state_of[&key];

        // Partition outgoing edges: concrete ranges and "anything else"
        // wildcards are considered separately so the wildcard can be
        // written first and concrete ranges can overwrite it (spec.md §9).
        let mut concrete_edges: Vec<(CharRange, Vec<usize>)> = Vec::new();
        let mut wildcard_positions: Vec<usize> = Vec::new();

        for &leaf_id in &key {
            match &canonical.leaves[leaf_id].kind {
                LeafKind::Chars(set) => {
                    for range in set.ranges() {
                        concrete_edges.push((*range, vec![leaf_id]));
                    }
                }
                LeafKind::AllButChars(_) => {
                    wildcard_positions.push(leaf_id);
                }
                LeafKind::End { .. } => {}
            }
        }

        let boundaries = split_boundaries(&concrete_edges);
        let mut ranges: Vec<(CharRange, u32)> = Vec::new();
        for (lo, hi) in boundaries {
            let mut target_leaves: Vec<usize> = Vec::new();
            for (range, leaves) in &concrete_edges {
                if range.lo <= lo && hi <= range.hi {
                    target_leaves.extend(leaves.iter().copied());
                }
            }
            let target_key = followpos_union(canonical, &target_leaves);
            if target_key.is_empty() {
                continue;
            }
            let target_id = intern_state(
                &accept_priority,
                &target_key,
                &mut states,
                &mut state_of,
                &mut worklist,
                prioritize_fixed_length_symbols,
                &mut ambiguous,
            );
            ranges.push((CharRange::new(lo, hi), target_id));
        }

        let fallback = if wildcard_positions.is_empty() {
            None
        } else {
            let target_key = followpos_union(canonical, &wildcard_positions);
            if target_key.is_empty() {
                None
            } else {
                Some(intern_state(
                    &accept_priority,
                    &target_key,
                    &mut states,
                    &mut state_of,
                    &mut worklist,
                    prioritize_fixed_length_symbols,
                    &mut ambiguous,
                ))
            }
        };

        let state = &mut states[state_id as usize];
        state.ranges = ranges;
        state.fallback = fallback;
    }

    if !ambiguous.is_empty() {
        ambiguous.sort_unstable_by_key(|t| t.0);
        ambiguous.dedup();
        return Err(BuildError::IndistinguishableSymbols(ambiguous));
    }

    Ok(Dfa { states, start: 0 })
}

fn sorted_positions(bits: &FixedBitSet) -> Vec<usize> {
    bits.ones().collect()
}

fn followpos_union(canonical: &Canonical, leaves: &[usize]) -> Vec<usize> {
    let total = canonical.followpos.first().map(|b| b.len()).unwrap_or(0);
    let mut union = FixedBitSet::with_capacity(total);
    for &leaf in leaves {
        union.union_with(&canonical.followpos[leaf]);
    }
    sorted_positions(&union)
}

/// Applies spec.md §4.3's accept-resolution policy to one DFA state's set
/// of candidate End leaves. Ambiguities are recorded into `ambiguous`
/// rather than failing immediately, so the whole DFA is still built and
/// every ambiguous state is reported together.
fn resolve_accept(
    positions: &[usize],
    accept_priority: &BTreeMap<usize, (DfaSymbol, PriorityBand)>,
    prioritize_fixed_length_symbols: bool,
    ambiguous: &mut Vec<TerminalId>,
) -> Option<DfaSymbol> {
    let mut candidates: Vec<(PriorityBand, DfaSymbol)> = positions
        .iter()
        .filter_map(|p| accept_priority.get(p))
        .map(|(symbol, band)| (*band, *symbol))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort();
    candidates.dedup();

    if candidates.iter().all(|(_, symbol)| *symbol == candidates[0].1) {
        return Some(candidates[0].1);
    }
    if candidates.len() >= 2 && prioritize_fixed_length_symbols && candidates[0].0 < candidates[1].0 {
        return Some(candidates[0].1);
    }

    ambiguous.extend(candidates.iter().map(|(_, symbol)| symbol.terminal_id()));
    None
}

#[allow(clippy::too_many_arguments)]
fn intern_state(
    accept_priority: &BTreeMap<usize, (DfaSymbol, PriorityBand)>,
    key: &[usize],
    states: &mut Vec<DfaState>,
    state_of: &mut BTreeMap<Vec<usize>, u32>,
    worklist: &mut Vec<Vec<usize>>,
    prioritize_fixed_length_symbols: bool,
    ambiguous: &mut Vec<TerminalId>,
) -> u32 {
    if let Some(&id) = state_of.get(key) {
        return id;
    }
    let id = states.len() as u32;
    state_of.insert(key.to_vec(), id);
    states.push(DfaState {
        id,
        ranges: Vec::new(),
        fallback: None,
        accept: resolve_accept(key, accept_priority, prioritize_fixed_length_symbols, ambiguous),
    });
    worklist.push(key.to_vec());
    id
}

/// Every distinct boundary point among a set of (possibly overlapping)
/// character ranges, as the minimal list of non-overlapping sub-ranges that
/// together partition their union. Needed because two terminals' character
/// classes can overlap without being identical (e.g. `[a-z]` and `[a-f]`).
fn split_boundaries(edges: &[(CharRange, Vec<usize>)]) -> Vec<(u16, u16)> {
    let mut points: Vec<u16> = Vec::new();
    for (range, _) in edges {
        points.push(range.lo);
        if range.hi < u16::MAX {
            points.push(range.hi + 1);
        }
    }
    points.sort_unstable();
    points.dedup();

    let mut result = Vec::new();
    for window in points.windows(2) {
        let (lo, next) = (window[0], window[1]);
        if next > lo {
            result.push((lo, next - 1));
        }
    }
    if let Some(&last) = points.last() {
        if edges.iter().any(|(r, _)| r.hi == u16::MAX && r.lo <= last) {
            result.push((last, u16::MAX));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::canonicalize;
    use crate::regex::Regex;
    use crate::symbol::TerminalId;

    #[test]
    fn literal_terminal_builds_a_three_state_chain() {
        let regex = Regex::literal("ab");
        let canonical = canonicalize(&[(DfaSymbol::Terminal(TerminalId(0)), &regex)], true);
        let dfa = build_dfa(&canonical, false).expect("unambiguous grammar builds");

        assert!(dfa.states[dfa.start as usize].accept.is_none());
        let (_range, s1) = dfa.states[dfa.start as usize]
            .ranges
            .iter()
            .find(|(r, _)| r.contains(b'a' as u16))
            .copied()
            .expect("edge on 'a'");
        assert!(dfa.states[s1 as usize].accept.is_none());
        let (_range, s2) = dfa.states[s1 as usize]
            .ranges
            .iter()
            .find(|(r, _)| r.contains(b'b' as u16))
            .copied()
            .expect("edge on 'b'");
        assert_eq!(dfa.states[s2 as usize].accept, Some(DfaSymbol::Terminal(TerminalId(0))));
    }

    fn keyword_and_identifier_canonical() -> Canonical {
        let keyword = Regex::literal("if");
        let ident = Regex::one_or_more(Regex::Chars(crate::regex::CharSet::range(b'a' as u16, b'z' as u16)));
        canonicalize(
            &[
                (DfaSymbol::Terminal(TerminalId(1)), &ident),
                (DfaSymbol::Terminal(TerminalId(0)), &keyword),
            ],
            true,
        )
    }

    #[test]
    fn fixed_band_wins_a_tie_over_variable_band_when_prioritized() {
        let canonical = keyword_and_identifier_canonical();
        let dfa = build_dfa(&canonical, true).expect("prioritized build resolves the tie");

        let (_range, s1) = dfa.states[dfa.start as usize]
            .ranges
            .iter()
            .find(|(r, _)| r.contains(b'i' as u16))
            .copied()
            .expect("edge on 'i'");
        let (_range, s2) = dfa.states[s1 as usize]
            .ranges
            .iter()
            .find(|(r, _)| r.contains(b'f' as u16))
            .copied()
            .expect("edge on 'f'");
        // Both the keyword "if" and an identifier accept here; the
        // fixed-length keyword must win regardless of declaration order
        // (it was declared second, with a higher TerminalId).
        assert_eq!(dfa.states[s2 as usize].accept, Some(DfaSymbol::Terminal(TerminalId(0))));
    }

    #[test]
    fn same_band_tie_without_the_priority_flag_is_ambiguous() {
        let canonical = keyword_and_identifier_canonical();
        let err = build_dfa(&canonical, false).expect_err("unprioritized tie must be reported");
        match err {
            BuildError::IndistinguishableSymbols(mut symbols) => {
                symbols.sort_unstable_by_key(|t| t.0);
                assert_eq!(symbols, vec![TerminalId(0), TerminalId(1)]);
            }
            other => panic!("expected IndistinguishableSymbols, got {other:?}"),
        }
    }

    #[test]
    fn concrete_range_overwrites_any_but_fallback() {
        // A single position can be reached by both a wildcard leaf and a
        // concrete leaf at once (e.g. `. | a`): the state must expose a
        // concrete edge for 'a' in addition to the fallback, never let the
        // wildcard alone decide what 'a' does (spec.md §9).
        let any_but_newline = Regex::AllButChars(crate::regex::CharSet::single(b'\n' as u16));
        let dot_or_a = Regex::any_of([any_but_newline, Regex::char(b'a' as u16)]);
        let canonical = canonicalize(&[(DfaSymbol::Terminal(TerminalId(0)), &dot_or_a)], true);
        let dfa = build_dfa(&canonical, false).expect("same-terminal alternatives never conflict");

        let start = &dfa.states[dfa.start as usize];
        assert!(start.fallback.is_some());
        assert!(start.ranges.iter().any(|(r, _)| r.contains(b'a' as u16)));
    }
}
