//! Regular expression trees handed to a [`crate::symbol::Terminal`] (spec.md
//! §3, §4.2). Building a `Regex` from a pattern *string* is out of scope
//! (spec.md §1): callers construct the tree directly, optionally with the
//! small convenience constructors below.
//!
//! Grounded on the general AST shape of
//! `natrow-591-compilers/regex/src/{parser.rs,nfa.rs}` (a handful of node
//! kinds, `Vec<Self>` for n-ary concatenation/alternation) adapted to the
//! leaf-numbered direct-positions construction of spec.md §4.2, which wants
//! every matchable character reachable at a distinct leaf.

use std::fmt;

/// An inclusive range of the 16-bit alphabet spec.md §2 assumes (UTF-16 code
/// units / `u16` characters), case-sensitive by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CharRange {
    pub lo: u16,
    pub hi: u16,
}

impl CharRange {
    pub fn single(c: u16) -> Self {
        Self { lo: c, hi: c }
    }

    pub fn new(lo: u16, hi: u16) -> Self {
        assert!(lo <= hi, "empty char range {lo}..={hi}");
        Self { lo, hi }
    }

    pub fn contains(&self, c: u16) -> bool {
        self.lo <= c && c <= self.hi
    }
}

/// A set of characters expressed as a sorted, non-overlapping list of
/// ranges. Kept as ranges rather than a dense bitset since most terminals
/// (keywords, single operators) touch a handful of characters; `canon.rs`
/// promotes ranges to `fixedbitset`-backed position sets once leaves are
/// numbered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharSet {
    ranges: Vec<CharRange>,
}

impl CharSet {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn single(c: u16) -> Self {
        Self {
            ranges: vec![CharRange::single(c)],
        }
    }

    pub fn range(lo: u16, hi: u16) -> Self {
        Self {
            ranges: vec![CharRange::new(lo, hi)],
        }
    }

    pub fn from_str(s: &str) -> Self {
        let mut set = Self::new();
        for c in s.encode_utf16() {
            set.add(CharRange::single(c));
        }
        set
    }

    /// Adds a range, merging it with any overlapping or adjacent ranges so
    /// the set stays sorted and disjoint.
    pub fn add(&mut self, range: CharRange) {
        self.ranges.push(range);
        self.ranges.sort_unstable();
        let mut merged: Vec<CharRange> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if r.lo <= last.hi.saturating_add(1) => {
                    last.hi = last.hi.max(r.hi);
                }
                _ => merged.push(r),
            }
        }
        self.ranges = merged;
    }

    pub fn union(mut self, other: &CharSet) -> Self {
        for r in &other.ranges {
            self.add(*r);
        }
        self
    }

    pub fn contains(&self, c: u16) -> bool {
        self.ranges.iter().any(|r| r.contains(c))
    }

    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Expands every ASCII letter this set contains to also include its
    /// opposite-case form (spec.md §4.2: case-insensitivity is implemented
    /// by unioning the case-folded form into the character set, not by
    /// normalizing matched input). Non-letters pass through unchanged.
    pub fn case_folded(&self) -> Self {
        let mut folded = self.clone();
        const SWAPS: [(u16, u16, i32); 2] = [
            (b'a' as u16, b'z' as u16, -32),
            (b'A' as u16, b'Z' as u16, 32),
        ];
        for range in &self.ranges {
            for &(lo, hi, shift) in &SWAPS {
                let overlap_lo = range.lo.max(lo);
                let overlap_hi = range.hi.min(hi);
                if overlap_lo <= overlap_hi {
                    for c in overlap_lo..=overlap_hi {
                        let alt = (c as i32 + shift) as u16;
                        folded.add(CharRange::single(alt));
                    }
                }
            }
        }
        folded
    }
}

/// A regular expression over [`CharSet`] leaves (spec.md §4.2's "direct
/// positions" input tree). `AllButChars` is the "anything else" wildcard
/// whose DFA edges spec.md §9 requires concrete transitions to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// Matches exactly one character drawn from the set.
    Chars(CharSet),
    /// Matches exactly one character *not* in the set (the "any but"
    /// wildcard, e.g. `.` excluding a terminator).
    AllButChars(CharSet),
    /// `r1 r2 r3 ...` in sequence. Empty vector matches the empty string.
    Concat(Vec<Regex>),
    /// `r1 | r2 | r3 | ...`.
    Alt(Vec<Regex>),
    /// Zero or more repetitions (Kleene star).
    Star(Box<Regex>),
}

impl Regex {
    pub fn empty() -> Self {
        Regex::Concat(Vec::new())
    }

    pub fn char(c: u16) -> Self {
        Regex::Chars(CharSet::single(c))
    }

    /// A regex matching exactly the given string, verbatim.
    pub fn literal(text: &str) -> Self {
        Regex::Concat(text.encode_utf16().map(Regex::char).collect())
    }

    pub fn any_of(alternatives: impl IntoIterator<Item = Regex>) -> Self {
        Regex::Alt(alternatives.into_iter().collect())
    }

    pub fn concat(parts: impl IntoIterator<Item = Regex>) -> Self {
        Regex::Concat(parts.into_iter().collect())
    }

    pub fn one_or_more(r: Regex) -> Self {
        Regex::Concat(vec![r.clone(), Regex::Star(Box::new(r))])
    }

    pub fn optional(r: Regex) -> Self {
        Regex::Alt(vec![r, Regex::empty()])
    }

    pub fn star(r: Regex) -> Self {
        Regex::Star(Box::new(r))
    }

    /// True for regexes that can match the empty string without matching
    /// anything else (spec.md §4.1's `NullableSymbols` check: a terminal
    /// whose *entire* regex is nullable is rejected, since it could match
    /// zero characters and stall the lexer).
    pub fn is_trivially_nullable(&self) -> bool {
        match self {
            Regex::Concat(parts) => parts.iter().all(Regex::is_trivially_nullable),
            Regex::Star(_) => true,
            Regex::Alt(alts) => alts.iter().any(Regex::is_trivially_nullable),
            Regex::Chars(_) | Regex::AllButChars(_) => false,
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Chars(set) => write!(f, "[{}ranges]", set.ranges().len()),
            Regex::AllButChars(set) => write!(f, "[^{}ranges]", set.ranges().len()),
            Regex::Concat(parts) => {
                for p in parts {
                    write!(f, "{p}")?;
                }
                Ok(())
            }
            Regex::Alt(alts) => {
                write!(f, "(")?;
                for (i, a) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            Regex::Star(r) => write!(f, "({r})*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_set_merges_adjacent_and_overlapping_ranges() {
        let mut set = CharSet::new();
        set.add(CharRange::new(b'a' as u16, b'c' as u16));
        set.add(CharRange::new(b'd' as u16, b'f' as u16));
        set.add(CharRange::single(b'b' as u16));
        assert_eq!(set.ranges(), &[CharRange::new(b'a' as u16, b'f' as u16)]);
    }

    #[test]
    fn char_set_keeps_disjoint_ranges_separate() {
        let mut set = CharSet::new();
        set.add(CharRange::new(b'a' as u16, b'c' as u16));
        set.add(CharRange::new(b'x' as u16, b'z' as u16));
        assert_eq!(set.ranges().len(), 2);
        assert!(set.contains(b'b' as u16));
        assert!(!set.contains(b'g' as u16));
    }

    #[test]
    fn case_folded_adds_the_opposite_case_variant() {
        let set = CharSet::single(b'a' as u16);
        let folded = set.case_folded();
        assert!(folded.contains(b'a' as u16));
        assert!(folded.contains(b'A' as u16));
    }

    #[test]
    fn case_folded_leaves_non_letters_untouched() {
        let set = CharSet::single(b'!' as u16);
        let folded = set.case_folded();
        assert_eq!(folded.ranges(), set.ranges());
    }

    #[test]
    fn literal_builds_one_leaf_per_code_unit() {
        let r = Regex::literal("if");
        match r {
            Regex::Concat(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected Concat, got {other:?}"),
        }
    }

    #[test]
    fn nullability() {
        assert!(Regex::empty().is_trivially_nullable());
        assert!(!Regex::char(b'a' as u16).is_trivially_nullable());
        assert!(Regex::star(Regex::char(b'a' as u16)).is_trivially_nullable());
        assert!(Regex::optional(Regex::char(b'a' as u16)).is_trivially_nullable());
        assert!(!Regex::literal("if").is_trivially_nullable());
        assert!(Regex::any_of([Regex::empty(), Regex::char(b'a' as u16)]).is_trivially_nullable());
    }
}
