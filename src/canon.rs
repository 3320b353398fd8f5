//! Regex canonicalization via the direct-positions construction (spec.md
//! §4.2, Aho/Sethi/Ullman §3.9.5): leaf numbering, nullable/firstpos/
//! lastpos/followpos, and end-leaf augmentation so several terminals' DFAs
//! can be built in one subset construction with priority-based
//! disambiguation between them.
//!
//! No teacher file does this directly — `pwil3058-rs_lalr1_parsers` farms
//! lexing out to the `regex` crate (see `teacher_ref/legacy_src/matcher.rs`).
//! The attribute computation here is grounded on the general structure of
//! `natrow-591-compilers/regex/src/nfa.rs` (bottom-up recursion building a
//! position/state table from a hand-rolled regex AST), adapted to compute
//! nullable/firstpos/lastpos/followpos directly rather than emitting NFA
//! transitions, per spec.md §4.2's eager single-pass note (SPEC_FULL §D —
//! computed once at construction, no lazy thunks over the tree).

use std::collections::BTreeSet;

use fixedbitset::FixedBitSet;

use crate::regex::{CharSet, Regex};
use crate::symbol::DfaSymbol;

/// Relative strength of two symbols that could both accept at the same DFA
/// state (spec.md §4.3's multi-terminal disambiguation). A leaf's band is
/// decided by whether any `Star` subtree appears in the alternative it
/// augments, not by how the terminal was declared: `(r)*`-shaped lexemes
/// (identifiers, whitespace runs) are inherently variable-length, while
/// anything built from plain concatenation/char-class leaves is
/// fixed-length, matching the conventional lexer-generator rule that a
/// longest-match tie between a keyword and an identifier favours the
/// keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriorityBand {
    Fixed,
    Variable,
}

#[derive(Debug, Clone)]
pub enum LeafKind {
    Chars(CharSet),
    AllButChars(CharSet),
    /// The synthetic augmenting leaf appended to an alternative's regex
    /// (the `#` of Aho/Sethi/Ullman's `(r)#`); a DFA state containing this
    /// leaf accepts the associated symbol. A terminal whose regex root is
    /// `Alt[...]` contributes one `End` leaf per alternative (spec.md
    /// §4.2), each with its own independently-decided band.
    End { symbol: DfaSymbol, band: PriorityBand },
}

#[derive(Debug, Clone)]
pub struct Leaf {
    pub id: usize,
    pub kind: LeafKind,
}

/// The canonical form of a set of terminals' regexes: every leaf they
/// contain, numbered, plus the followpos relation between them (spec.md
/// §4.2). `dfa.rs`'s subset construction starts from `root_firstpos` and
/// consults `followpos` to compute successor states.
pub struct Canonical {
    pub leaves: Vec<Leaf>,
    pub followpos: Vec<FixedBitSet>,
    pub root_firstpos: FixedBitSet,
}

#[derive(Debug, Clone)]
struct NodeAttrs {
    nullable: bool,
    firstpos: BTreeSet<usize>,
    lastpos: BTreeSet<usize>,
}

struct Builder {
    leaves: Vec<Leaf>,
    followpos: Vec<BTreeSet<usize>>,
    case_sensitive: bool,
}

impl Builder {
    fn push_leaf(&mut self, kind: LeafKind) -> usize {
        let id = self.leaves.len();
        self.leaves.push(Leaf { id, kind });
        self.followpos.push(BTreeSet::new());
        id
    }

    fn visit(&mut self, regex: &Regex) -> NodeAttrs {
        match regex {
            Regex::Chars(set) => {
                let set = if self.case_sensitive { set.clone() } else { set.case_folded() };
                let id = self.push_leaf(LeafKind::Chars(set));
                NodeAttrs {
                    nullable: false,
                    firstpos: BTreeSet::from([id]),
                    lastpos: BTreeSet::from([id]),
                }
            }
            Regex::AllButChars(set) => {
                let set = if self.case_sensitive { set.clone() } else { set.case_folded() };
                let id = self.push_leaf(LeafKind::AllButChars(set));
                NodeAttrs {
                    nullable: false,
                    firstpos: BTreeSet::from([id]),
                    lastpos: BTreeSet::from([id]),
                }
            }
            Regex::Concat(parts) => {
                let mut nullable = true;
                let mut firstpos = BTreeSet::new();
                let mut lastpos = BTreeSet::new();
                let mut prev: Option<NodeAttrs> = None;
                let mut all_previous_nullable = true;
                for part in parts {
                    let attrs = self.visit(part);
                    if all_previous_nullable {
                        firstpos.extend(attrs.firstpos.iter().copied());
                    }
                    if let Some(prev_attrs) = &prev {
                        for &p in &prev_attrs.lastpos {
                            self.followpos[p].extend(attrs.firstpos.iter().copied());
                        }
                    }
                    if attrs.nullable {
                        lastpos.extend(attrs.lastpos.iter().copied());
                    } else {
                        lastpos = attrs.lastpos.clone();
                    }
                    all_previous_nullable = all_previous_nullable && attrs.nullable;
                    nullable = nullable && attrs.nullable;
                    prev = Some(attrs);
                }
                if parts.is_empty() {
                    nullable = true;
                }
                NodeAttrs {
                    nullable,
                    firstpos,
                    lastpos,
                }
            }
            Regex::Alt(alts) => {
                let mut nullable = false;
                let mut firstpos = BTreeSet::new();
                let mut lastpos = BTreeSet::new();
                for alt in alts {
                    let attrs = self.visit(alt);
                    nullable = nullable || attrs.nullable;
                    firstpos.extend(attrs.firstpos.iter().copied());
                    lastpos.extend(attrs.lastpos.iter().copied());
                }
                NodeAttrs {
                    nullable,
                    firstpos,
                    lastpos,
                }
            }
            Regex::Star(inner) => {
                let attrs = self.visit(inner);
                for &p in &attrs.lastpos {
                    self.followpos[p].extend(attrs.firstpos.iter().copied());
                }
                NodeAttrs {
                    nullable: true,
                    firstpos: attrs.firstpos,
                    lastpos: attrs.lastpos,
                }
            }
        }
    }
}

/// True if any `Star` node appears anywhere in `regex` (spec.md §4.2's
/// fixed/variable-length partition rule).
fn contains_star(regex: &Regex) -> bool {
    match regex {
        Regex::Star(_) => true,
        Regex::Concat(parts) | Regex::Alt(parts) => parts.iter().any(contains_star),
        Regex::Chars(_) | Regex::AllButChars(_) => false,
    }
}

/// Builds the canonical leaf/followpos table for a set of DFA symbols, each
/// contributing its own augmented `(regex)#` subtree to a shared
/// alternation (spec.md §4.2, §4.3). When a symbol's regex root is
/// `Alt[...]`, each alternative is visited separately and gets its own
/// `End` leaf and band, so a single terminal can accept some spellings as
/// fixed-length and others as variable-length (spec.md §8 scenario 5).
/// `case_sensitive` gates whether character-class leaves are expanded to
/// their case-folded form before being stored.
pub fn canonicalize(symbols: &[(DfaSymbol, &Regex)], case_sensitive: bool) -> Canonical {
    let mut builder = Builder {
        leaves: Vec::new(),
        followpos: Vec::new(),
        case_sensitive,
    };
    let mut root_firstpos = BTreeSet::new();

    for (symbol, regex) in symbols {
        let alternatives: Vec<&Regex> = match regex {
            Regex::Alt(branches) => branches.iter().collect(),
            other => vec![other],
        };
        for alternative in alternatives {
            let attrs = builder.visit(alternative);
            let band = if contains_star(alternative) {
                PriorityBand::Variable
            } else {
                PriorityBand::Fixed
            };
            let end_id = builder.push_leaf(LeafKind::End { symbol: *symbol, band });
            for &p in &attrs.lastpos {
                builder.followpos[p].insert(end_id);
            }
            root_firstpos.extend(attrs.firstpos.iter().copied());
            if attrs.nullable {
                // Terminals whose full regex is nullable are rejected
                // upstream (analyzer.rs's NullableSymbols check) before
                // canon.rs ever runs, so this arm is unreachable in
                // practice; included for completeness of the
                // direct-positions construction.
                root_firstpos.insert(end_id);
            }
        }
    }

    let total = builder.leaves.len();
    let followpos = builder
        .followpos
        .into_iter()
        .map(|set| {
            let mut bits = FixedBitSet::with_capacity(total);
            for p in set {
                bits.insert(p);
            }
            bits
        })
        .collect();
    let mut root_bits = FixedBitSet::with_capacity(total);
    for p in root_firstpos {
        root_bits.insert(p);
    }

    Canonical {
        leaves: builder.leaves,
        followpos,
        root_firstpos: root_bits,
    }
}
