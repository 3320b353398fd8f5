//! Assembles the shift/reduce action table from the LR(0) automaton and its
//! propagated lookaheads, resolving conflicts via operator precedence
//! (spec.md §4.7).
//!
//! Grounded on `teacher_ref/legacy_src/state.rs::ParserState` for the
//! overall per-state action assembly (`shift_list` + reducible items ->
//! `Action`) and its two-conflict-kind split (shift/reduce vs
//! reduce/reduce), generalized to call out to `precedence.rs`'s pure
//! `resolve_shift_reduce`/`resolve_reduce_reduce` rather than mutating a
//! shared `RefCell`-backed item set in place.

use std::collections::BTreeMap;

use crate::cancel::CancellationToken;
use crate::error::{BuildError, LalrConflict};
use crate::lookahead::{closure_with_known_lookaheads, LookaheadSet};
use crate::lr0::Lr0State;
use crate::precedence::{resolve_reduce_reduce, resolve_shift_reduce, Decision, OperatorScope, PrecedenceTable};
use crate::production::{Lr0Item, Production, ProductionId};
use crate::symbol::non_terminal::FirstsData;
use crate::symbol::terminal::Terminal;
use crate::symbol::{GrammarSymbol, TerminalId};

/// How a state's conflicts are settled when precedence cannot decide
/// (SPEC_FULL §D.2a). The default matches spec.md §4.7's "conflicts are
/// collected and reported" reading; `ResolveAndReport` recovers the
/// teacher's older behaviour of always picking something (favouring shift,
/// then first-declared) while still surfacing the conflict for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    #[default]
    ReportAndFail,
    ResolveAndReport,
}

/// The synthetic key `TerminalId(u32::MAX)` never collides with a real,
/// analyzer-assigned terminal id (those are dense from zero); it stands for
/// "end of input" in the action maps below, the same role `None` plays in
/// [`crate::lookahead::LookaheadSet::has_end`].
const END_OF_INPUT: TerminalId = TerminalId(u32::MAX);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(u32),
    Reduce(ProductionId),
    Accept,
}

#[derive(Debug, Clone, Default)]
pub struct ActionState {
    pub actions: BTreeMap<TerminalId, Action>,
    pub gotos: BTreeMap<u32, u32>,
}

pub struct ActionTable {
    pub states: Vec<ActionState>,
    pub conflicts: Vec<LalrConflict>,
}

/// Per-key bookkeeping kept only while a state's actions are being
/// assembled: the reduce action's originating production, so a later
/// competing reduce can look up its precedence directly.
enum PendingAction {
    Shift(u32),
    Reduce(Production),
    Accept,
}

/// Builds the action table for every LR(0) state, given each state's
/// propagated kernel lookaheads (spec.md §4.6's output) and the grammar's
/// FIRST-set table (needed to re-close kernels into full item lookaheads).
pub fn build_action_table(
    states: &[Lr0State],
    kernel_lookaheads: &[BTreeMap<Lr0Item, LookaheadSet>],
    first_table: &[FirstsData],
    terminals: &[Terminal],
    num_terminals: usize,
    start_production_id: ProductionId,
    precedence_table: &PrecedenceTable,
    policy: ConflictPolicy,
    cancel: &dyn CancellationToken,
) -> Result<ActionTable, BuildError> {
    let mut action_states = Vec::with_capacity(states.len());
    let mut conflicts = Vec::new();

    for state in states {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let item_lookaheads =
            closure_with_known_lookaheads(&kernel_lookaheads[state.id as usize], first_table, num_terminals);

        let mut pending: BTreeMap<TerminalId, PendingAction> = BTreeMap::new();
        let mut gotos = BTreeMap::new();

        for (symbol, &target) in &state.transitions {
            match symbol {
                GrammarSymbol::Terminal(t) => {
                    let id = t.index().expect("analyzer assigns indices before action_table.rs runs");
                    pending.insert(id, PendingAction::Shift(target));
                }
                GrammarSymbol::NonTerminal(nt) => {
                    let id = nt.index().expect("analyzer assigns indices before action_table.rs runs").0;
                    gotos.insert(id, target);
                }
            }
        }

        for item in state.reducible_items() {
            let production_id = item.production.id().expect("analyzer assigns production ids");

            if production_id == start_production_id {
                pending.insert(END_OF_INPUT, PendingAction::Accept);
                continue;
            }

            let lookahead = item_lookaheads.get(item).cloned().unwrap_or_default();
            let mut keys: Vec<Option<TerminalId>> = lookahead.iter().map(Some).collect();
            if lookahead.has_end() {
                keys.push(None);
            }

            for la in keys {
                let key = la.unwrap_or(END_OF_INPUT);
                resolve_one(
                    &mut pending,
                    &mut conflicts,
                    state.id,
                    la,
                    terminals,
                    &item.production,
                    key,
                    precedence_table,
                    policy,
                );
            }
        }

        let actions = pending
            .into_iter()
            .map(|(key, action)| {
                let resolved = match action {
                    PendingAction::Shift(target) => Action::Shift(target),
                    PendingAction::Reduce(production) => {
                        Action::Reduce(production.id().expect("analyzer assigns production ids"))
                    }
                    PendingAction::Accept => Action::Accept,
                };
                (key, resolved)
            })
            .collect();

        action_states.push(ActionState { actions, gotos });
    }

    if policy == ConflictPolicy::ReportAndFail && !conflicts.is_empty() {
        return Err(BuildError::LalrConflictReport(conflicts));
    }

    Ok(ActionTable {
        states: action_states,
        conflicts,
    })
}

/// Inserts (or resolves a conflict for) the reduce of `production` on `key`.
fn resolve_one(
    pending: &mut BTreeMap<TerminalId, PendingAction>,
    conflicts: &mut Vec<LalrConflict>,
    state_id: u32,
    lookahead: Option<TerminalId>,
    terminals: &[Terminal],
    production: &Production,
    key: TerminalId,
    precedence_table: &PrecedenceTable,
    policy: ConflictPolicy,
) {
    match pending.get(&key) {
        None => {
            pending.insert(key, PendingAction::Reduce(production.clone()));
        }
        Some(PendingAction::Shift(target)) => {
            let target = *target;
            let shift_prec = terminals
                .get(key.0 as usize)
                .and_then(Terminal::associativity_and_precedence);
            let reduce_prec = production.associativity_and_precedence();
            let production_id = production.id().expect("analyzer assigns production ids");
            match resolve_shift_reduce(shift_prec, reduce_prec) {
                Decision::ChooseFirst => {
                    // Shift wins outright; nothing to record.
                }
                Decision::ChooseSecond => {
                    pending.insert(key, PendingAction::Reduce(production.clone()));
                }
                Decision::ChooseNeither => unreachable!("shift/reduce resolution never chooses neither"),
                Decision::CannotChoose(reason) => {
                    conflicts.push(LalrConflict {
                        state: state_id,
                        lookahead,
                        competing_productions: vec![production_id],
                        competing_shift: true,
                        reason,
                    });
                    if policy == ConflictPolicy::ResolveAndReport {
                        // Teacher default: favour shift, leave the conflict
                        // reported for the caller to review.
                        pending.insert(key, PendingAction::Shift(target));
                    } else {
                        pending.insert(key, PendingAction::Reduce(production.clone()));
                    }
                }
            }
        }
        Some(PendingAction::Reduce(existing)) => {
            let existing = existing.clone();
            let first_prec = existing.associativity_and_precedence();
            let second_prec = production.associativity_and_precedence();

            // Resolution is only permitted when the scope governing each
            // side's precedence explicitly opted in (spec.md §4.8); a
            // production with no precedence at all has no scope to consult.
            let scope_allows = |prec: Option<(crate::symbol::Associativity, i32)>| {
                prec.and_then(|(_, rank)| precedence_table.scopes().get(rank as usize))
                    .map(OperatorScope::resolves_reduce_reduce)
                    .unwrap_or(false)
            };
            let scope_resolves = scope_allows(first_prec) && scope_allows(second_prec);

            match resolve_reduce_reduce(first_prec, second_prec, scope_resolves) {
                Decision::ChooseFirst => {
                    // Existing reduce wins outright; nothing to record.
                }
                Decision::ChooseSecond => {
                    pending.insert(key, PendingAction::Reduce(production.clone()));
                }
                Decision::ChooseNeither => {
                    pending.remove(&key);
                }
                Decision::CannotChoose(reason) => {
                    conflicts.push(LalrConflict {
                        state: state_id,
                        lookahead,
                        competing_productions: vec![
                            existing.id().expect("analyzer assigns production ids"),
                            production.id().expect("analyzer assigns production ids"),
                        ],
                        competing_shift: false,
                        reason,
                    });
                }
            }
        }
        Some(PendingAction::Accept) => {}
    }
}
