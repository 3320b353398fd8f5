//! Operator precedence declarations and the shift/reduce, reduce/reduce
//! conflict resolver they drive (spec.md §4.8).
//!
//! Grounded on `teacher_ref/legacy_src/state.rs`'s
//! `ParserState::resolve_shift_reduce_conflicts` /
//! `resolve_reduce_reduce_conflicts` for the comparison order (precedence,
//! then associativity, then a default tie-break) and on
//! `alap_gen_ng/src/symbol/terminal.rs` for storing the resolved
//! `(Associativity, precedence)` pair directly on the `Terminal` handle
//! rather than in a side table.

use std::fmt;

use crate::symbol::{Associativity, TerminalId};
use crate::symbol::terminal::Terminal;

/// One operand of an `%left`/`%right`/`%nonassoc` style declaration: either a
/// terminal handle or the literal text of one (spec.md §4.8), resolved
/// against the grammar's terminal set when the scope is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorSymbol {
    Terminal(TerminalId),
    Literal(String),
}

impl fmt::Display for OperatorSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorSymbol::Terminal(id) => write!(f, "{id}"),
            OperatorSymbol::Literal(text) => write!(f, "{text:?}"),
        }
    }
}

/// A single precedence level: a set of operators sharing one associativity
/// and rank. Later-declared scopes outrank earlier ones, the conventional
/// yacc/bison ordering (spec.md §4.8).
#[derive(Debug, Clone)]
pub struct OperatorScope {
    rank: i32,
    associativity: Associativity,
    symbols: Vec<OperatorSymbol>,
    /// Whether this scope's precedence also settles reduce/reduce conflicts
    /// between productions tagged with its operators (SPEC_FULL §D.4); the
    /// teacher has no equivalent flag and always falls through to
    /// first-declared-wins for reduce/reduce.
    resolves_reduce_reduce: bool,
}

impl OperatorScope {
    pub fn new(rank: i32, associativity: Associativity, symbols: Vec<OperatorSymbol>) -> Self {
        Self {
            rank,
            associativity,
            symbols,
            resolves_reduce_reduce: false,
        }
    }

    pub fn resolving_reduce_reduce(&mut self) -> &mut Self {
        self.resolves_reduce_reduce = true;
        self
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn associativity(&self) -> Associativity {
        self.associativity
    }

    pub fn symbols(&self) -> &[OperatorSymbol] {
        &self.symbols
    }

    pub fn resolves_reduce_reduce(&self) -> bool {
        self.resolves_reduce_reduce
    }
}

/// An ordered set of [`OperatorScope`]s, applied to the grammar's terminals
/// once they are all known (spec.md §4.8). Declaration order fixes rank:
/// the first scope declared is weakest.
#[derive(Debug, Clone, Default)]
pub struct PrecedenceTable {
    scopes: Vec<OperatorScope>,
}

impl PrecedenceTable {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Declares a new, strictly-higher-precedence scope than any declared
    /// so far.
    pub fn declare(&mut self, associativity: Associativity, symbols: Vec<OperatorSymbol>) -> &mut OperatorScope {
        let rank = self.scopes.len() as i32;
        self.scopes.push(OperatorScope::new(rank, associativity, symbols));
        self.scopes.last_mut().expect("just pushed")
    }

    pub fn scopes(&self) -> &[OperatorScope] {
        &self.scopes
    }

    /// Stamps every terminal named (directly or via literal text) by a scope
    /// with that scope's `(Associativity, rank)`. Terminals named by no
    /// scope are left without precedence (spec.md §4.8: such a terminal
    /// cannot settle a conflict it appears in).
    pub fn apply(&self, terminals_by_id: &[Terminal]) {
        for scope in &self.scopes {
            for op in &scope.symbols {
                let terminal = match op {
                    OperatorSymbol::Terminal(id) => terminals_by_id.get(id.0 as usize),
                    OperatorSymbol::Literal(text) => terminals_by_id
                        .iter()
                        .find(|t| t.literal_text() == Some(text.as_str())),
                };
                if let Some(terminal) = terminal {
                    terminal.set_associativity_and_precedence(scope.associativity, scope.rank);
                }
            }
        }
    }
}

/// Why a conflict could not be resolved automatically (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Neither competing symbol/production carries a declared precedence.
    NoPrecedenceDeclared,
    /// Equal precedence, but the shared associativity is `NonAssociative`.
    EqualPrecedenceNonAssociative,
    /// Equal precedence, but the shared associativity is `PrecedenceOnly`
    /// (declared for ranking purposes only, not as a tie-break rule).
    PrecedenceOnlySpecified,
    /// The competing productions' governing scope(s) never opted in via
    /// `OperatorScope::resolving_reduce_reduce`.
    CannotResolveReduceReduce,
    /// Both productions carry the exact same precedence rank, so even an
    /// opted-in scope has nothing to break the tie with.
    SamePrecedence,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::NoPrecedenceDeclared => write!(f, "no precedence declared"),
            ConflictReason::EqualPrecedenceNonAssociative => {
                write!(f, "equal precedence, declared non-associative")
            }
            ConflictReason::PrecedenceOnlySpecified => {
                write!(f, "equal precedence, declared for ranking only")
            }
            ConflictReason::CannotResolveReduceReduce => {
                write!(f, "reduce/reduce resolution not enabled for this scope")
            }
            ConflictReason::SamePrecedence => write!(f, "both productions carry the same precedence"),
        }
    }
}

/// The outcome of comparing two competing actions (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    ChooseFirst,
    ChooseSecond,
    ChooseNeither,
    CannotChoose(ConflictReason),
}

/// Resolves a shift/reduce conflict between the shift on `shift_prec` and
/// the reduce of a production with `reduce_prec`, following
/// `teacher_ref/legacy_src/state.rs::resolve_shift_reduce_conflicts`'s
/// comparison order. `ChooseFirst` means shift, `ChooseSecond` means reduce.
pub fn resolve_shift_reduce(
    shift_prec: Option<(Associativity, i32)>,
    reduce_prec: Option<(Associativity, i32)>,
) -> Decision {
    let (Some((_, shift_rank)), Some((reduce_assoc, reduce_rank))) = (shift_prec, reduce_prec) else {
        return Decision::CannotChoose(ConflictReason::NoPrecedenceDeclared);
    };
    match shift_rank.cmp(&reduce_rank) {
        std::cmp::Ordering::Greater => Decision::ChooseFirst,
        std::cmp::Ordering::Less => Decision::ChooseSecond,
        std::cmp::Ordering::Equal => match reduce_assoc {
            Associativity::Left => Decision::ChooseSecond,
            Associativity::Right => Decision::ChooseFirst,
            Associativity::NonAssociative => {
                Decision::CannotChoose(ConflictReason::EqualPrecedenceNonAssociative)
            }
            Associativity::PrecedenceOnly => {
                Decision::CannotChoose(ConflictReason::PrecedenceOnlySpecified)
            }
        },
    }
}

/// Resolves a reduce/reduce conflict between two productions' precedence
/// (spec.md §4.8). Resolution is only attempted when the governing scope(s)
/// explicitly opted in via `scope_resolves_reduce_reduce` (the caller
/// resolves that flag by looking up each production's precedence rank in
/// the declared `PrecedenceTable`); otherwise the conflict is reported as
/// `CannotChoose(CannotResolveReduceReduce)`. Equal precedence is always
/// reported as `CannotChoose(SamePrecedence)`, even when the scope opts in,
/// since there is nothing left to break the tie with.
pub fn resolve_reduce_reduce(
    first_prec: Option<(Associativity, i32)>,
    second_prec: Option<(Associativity, i32)>,
    scope_resolves_reduce_reduce: bool,
) -> Decision {
    if !scope_resolves_reduce_reduce {
        return Decision::CannotChoose(ConflictReason::CannotResolveReduceReduce);
    }
    match (first_prec, second_prec) {
        (Some((_, a)), Some((_, b))) => match a.cmp(&b) {
            std::cmp::Ordering::Equal => Decision::CannotChoose(ConflictReason::SamePrecedence),
            std::cmp::Ordering::Greater => Decision::ChooseFirst,
            std::cmp::Ordering::Less => Decision::ChooseSecond,
        },
        _ => Decision::CannotChoose(ConflictReason::NoPrecedenceDeclared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_precedence_wins_outright() {
        let shift = Some((Associativity::Left, 2));
        let reduce = Some((Associativity::Left, 1));
        assert_eq!(resolve_shift_reduce(shift, reduce), Decision::ChooseFirst);
        assert_eq!(resolve_shift_reduce(reduce, shift), Decision::ChooseSecond);
    }

    #[test]
    fn equal_precedence_defers_to_the_reduce_side_associativity() {
        let a = Some((Associativity::Left, 5));
        let b = Some((Associativity::Left, 5));
        assert_eq!(resolve_shift_reduce(a, b), Decision::ChooseSecond);

        let a = Some((Associativity::Right, 5));
        let b = Some((Associativity::Right, 5));
        assert_eq!(resolve_shift_reduce(a, b), Decision::ChooseFirst);
    }

    #[test]
    fn equal_precedence_nonassociative_cannot_be_settled() {
        let a = Some((Associativity::NonAssociative, 5));
        let b = Some((Associativity::NonAssociative, 5));
        assert_eq!(
            resolve_shift_reduce(a, b),
            Decision::CannotChoose(ConflictReason::EqualPrecedenceNonAssociative)
        );
    }

    #[test]
    fn missing_precedence_cannot_be_settled() {
        assert_eq!(
            resolve_shift_reduce(None, Some((Associativity::Left, 1))),
            Decision::CannotChoose(ConflictReason::NoPrecedenceDeclared)
        );
    }

    #[test]
    fn reduce_reduce_requires_the_scope_to_opt_in() {
        assert_eq!(
            resolve_reduce_reduce(Some((Associativity::Left, 1)), Some((Associativity::Left, 2)), false),
            Decision::CannotChoose(ConflictReason::CannotResolveReduceReduce)
        );
    }

    #[test]
    fn reduce_reduce_picks_the_higher_ranked_production_once_opted_in() {
        assert_eq!(
            resolve_reduce_reduce(Some((Associativity::Left, 1)), Some((Associativity::Left, 2)), true),
            Decision::ChooseSecond
        );
        assert_eq!(
            resolve_reduce_reduce(Some((Associativity::Left, 2)), Some((Associativity::Left, 1)), true),
            Decision::ChooseFirst
        );
    }

    #[test]
    fn reduce_reduce_equal_precedence_cannot_be_settled_even_when_opted_in() {
        assert_eq!(
            resolve_reduce_reduce(Some((Associativity::Left, 1)), Some((Associativity::Left, 1)), true),
            Decision::CannotChoose(ConflictReason::SamePrecedence)
        );
    }

    #[test]
    fn reduce_reduce_missing_precedence_cannot_be_settled() {
        assert_eq!(
            resolve_reduce_reduce(None, None, true),
            Decision::CannotChoose(ConflictReason::NoPrecedenceDeclared)
        );
    }

    #[test]
    fn operator_scope_builder_chains_off_a_mutable_borrow() {
        let mut table = PrecedenceTable::new();
        table.declare(Associativity::Left, Vec::new()).resolving_reduce_reduce();
        assert!(table.scopes()[0].resolves_reduce_reduce());
    }

    #[test]
    fn precedence_table_assigns_increasing_rank_by_declaration_order() {
        let mut table = PrecedenceTable::new();
        table.declare(Associativity::Left, vec![OperatorSymbol::Literal("+".to_string())]);
        table.declare(Associativity::Left, vec![OperatorSymbol::Literal("*".to_string())]);
        assert_eq!(table.scopes()[0].rank(), 0);
        assert_eq!(table.scopes()[1].rank(), 1);
    }
}
