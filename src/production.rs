//! Grammar productions and LR(0) items (spec.md §3, §4.4).
//!
//! Grounded on `alap_gen_ng/src/production.rs`'s `Production`/`ProductionTail`
//! split and its `GrammarItemKey` (production + dot position). This crate
//! drops the teacher's embedded action/predicate text (out of scope: spec.md
//! §1 excludes code generation) and its `rhs_associated_precedence` inference
//! is kept as the *default* precedence source, generalized with an explicit
//! override (SPEC_FULL §D.2).

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::{Associativity, GrammarSymbol};

/// Dense identifier assigned to a production when it is attached to its
/// nonterminal's handle list via [`NonTerminal::define`]. Production 0 is
/// always the synthetic augmenting production `S' -> S` (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(pub u32);

impl fmt::Display for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

static NEXT_CONSTRUCTION_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct ProductionData {
    construction_id: u32,
    left_hand_side: NonTerminal,
    right_hand_side: Vec<GrammarSymbol>,
    /// Explicit `%prec` style override (SPEC_FULL §D.2); when absent the
    /// precedence resolver falls back to the rightmost terminal in the
    /// right-hand side that carries precedence, mirroring the teacher's
    /// `rhs_associated_precedence`.
    explicit_precedence: Option<(Associativity, i32)>,
    /// Assigned by the Analyzer once the production is reachable from the
    /// grammar root (spec.md §4.1); `None` beforehand.
    id: std::cell::Cell<Option<ProductionId>>,
}

/// One alternative `lhs -> rhs` of a grammar rule (spec.md §3).
#[derive(Debug, Clone)]
pub struct Production(Rc<ProductionData>);

impl Production {
    pub fn new(left_hand_side: &NonTerminal, right_hand_side: Vec<GrammarSymbol>) -> Self {
        Self(Rc::new(ProductionData {
            construction_id: NEXT_CONSTRUCTION_ID.fetch_add(1, AtomicOrdering::Relaxed),
            left_hand_side: left_hand_side.clone(),
            right_hand_side,
            explicit_precedence: None,
            id: std::cell::Cell::new(None),
        }))
    }

    /// Same production, but with an explicit precedence/associativity that
    /// overrides the rightmost-terminal default (SPEC_FULL §D.2).
    pub fn with_precedence(
        left_hand_side: &NonTerminal,
        right_hand_side: Vec<GrammarSymbol>,
        associativity: Associativity,
        precedence: i32,
    ) -> Self {
        Self(Rc::new(ProductionData {
            construction_id: NEXT_CONSTRUCTION_ID.fetch_add(1, AtomicOrdering::Relaxed),
            left_hand_side: left_hand_side.clone(),
            right_hand_side,
            explicit_precedence: Some((associativity, precedence)),
            id: std::cell::Cell::new(None),
        }))
    }

    pub fn left_hand_side(&self) -> &NonTerminal {
        &self.0.left_hand_side
    }

    pub fn right_hand_side(&self) -> &[GrammarSymbol] {
        &self.0.right_hand_side
    }

    pub fn len(&self) -> usize {
        self.0.right_hand_side.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.right_hand_side.is_empty()
    }

    pub fn symbol_at(&self, dot: usize) -> Option<&GrammarSymbol> {
        self.0.right_hand_side.get(dot)
    }

    /// The associativity/precedence this production resolves conflicts
    /// with: the explicit override if one was given, else the rightmost
    /// right-hand-side terminal that carries precedence (spec.md §4.8).
    pub fn associativity_and_precedence(&self) -> Option<(Associativity, i32)> {
        if self.0.explicit_precedence.is_some() {
            return self.0.explicit_precedence;
        }
        self.0
            .right_hand_side
            .iter()
            .rev()
            .find_map(|sym| sym.as_terminal().and_then(|t| t.associativity_and_precedence()))
    }

    pub fn id(&self) -> Option<ProductionId> {
        self.0.id.get()
    }

    pub(crate) fn set_id(&self, id: ProductionId) {
        self.0.id.set(Some(id));
    }
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.0.construction_id == other.0.construction_id
    }
}

impl Eq for Production {}

impl PartialOrd for Production {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Production {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.construction_id.cmp(&other.0.construction_id)
    }
}

impl std::hash::Hash for Production {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.construction_id.hash(state)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.0.left_hand_side)?;
        if self.0.right_hand_side.is_empty() {
            write!(f, " ε")?;
        }
        for sym in &self.0.right_hand_side {
            write!(f, " {sym}")?;
        }
        Ok(())
    }
}

/// An LR(0) item: a production with a dot marking how much of its
/// right-hand side has been recognised (spec.md §4.4's `GrammarItemKey`
/// equivalent). Ordered by `(production, dot)` so items sort deterministically
/// inside a kernel set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lr0Item {
    pub production: Production,
    pub dot: usize,
}

impl Lr0Item {
    pub fn start(production: Production) -> Self {
        Self { production, dot: 0 }
    }

    /// The symbol immediately after the dot, or `None` if the dot is at the
    /// end (the item is reducible).
    pub fn symbol_after_dot(&self) -> Option<&GrammarSymbol> {
        self.production.symbol_at(self.dot)
    }

    pub fn is_reducible(&self) -> bool {
        self.dot >= self.production.len()
    }

    /// The item with the dot advanced one position, assuming
    /// `symbol_after_dot` matched.
    pub fn advanced(&self) -> Self {
        debug_assert!(!self.is_reducible());
        Self {
            production: self.production.clone(),
            dot: self.dot + 1,
        }
    }
}

impl fmt::Display for Lr0Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.production.left_hand_side())?;
        let rhs = self.production.right_hand_side();
        for (i, sym) in rhs.iter().enumerate() {
            if i == self.dot {
                write!(f, " .")?;
            }
            write!(f, " {sym}")?;
        }
        if self.dot == rhs.len() {
            write!(f, " .")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::Regex;
    use crate::symbol::terminal::Terminal;

    #[test]
    fn item_advances_until_reducible() {
        let lhs = NonTerminal::new("E");
        let plus = Terminal::literal("Plus", "+");
        let production = Production::new(&lhs, vec![GrammarSymbol::Terminal(plus)]);

        let item = Lr0Item::start(production);
        assert!(!item.is_reducible());
        assert!(item.symbol_after_dot().is_some());

        let advanced = item.advanced();
        assert!(advanced.is_reducible());
        assert!(advanced.symbol_after_dot().is_none());
    }

    #[test]
    fn explicit_precedence_overrides_rightmost_terminal() {
        let lhs = NonTerminal::new("E");
        let plus = Terminal::new("Plus", Regex::literal("+"));
        plus.set_associativity_and_precedence(Associativity::Left, 1);
        let rhs = vec![GrammarSymbol::Terminal(plus)];

        let default = Production::new(&lhs, rhs.clone());
        assert_eq!(default.associativity_and_precedence(), Some((Associativity::Left, 1)));

        let overridden = Production::with_precedence(&lhs, rhs, Associativity::Right, 9);
        assert_eq!(overridden.associativity_and_precedence(), Some((Associativity::Right, 9)));
    }

    #[test]
    fn duplicate_rhs_sequences_compare_equal() {
        let lhs = NonTerminal::new("E");
        let t = Terminal::literal("Id", "x");
        let rhs_a = vec![GrammarSymbol::Terminal(t.clone())];
        let rhs_b = vec![GrammarSymbol::Terminal(t)];
        assert_eq!(rhs_a, rhs_b);
    }
}
