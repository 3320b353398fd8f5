//! End-to-end compilation scenarios (spec.md §8): each builds a small
//! grammar by hand, the way a caller of this crate would, and checks the
//! compiled tables' externally observable shape rather than internal
//! construction details (those are covered by each module's own unit
//! tests).

use lalrgen::action_table::{Action, ConflictPolicy};
use lalrgen::error::BuildError;
use lalrgen::groups::CommentGroup;
use lalrgen::precedence::OperatorSymbol;
use lalrgen::regex::{CharSet, Regex};
use lalrgen::symbol::non_terminal::NonTerminal;
use lalrgen::symbol::terminal::Terminal;
use lalrgen::symbol::{Associativity, DfaSymbol, GrammarSymbol};
use lalrgen::{compile, BuildOptions, Metadata};

fn ident_regex() -> Regex {
    Regex::one_or_more(Regex::Chars(CharSet::range(b'a' as u16, b'z' as u16)))
}

#[test]
fn arithmetic_grammar_resolves_shift_reduce_via_precedence() {
    let e = NonTerminal::new("E");
    let plus = Terminal::literal("Plus", "+");
    let star = Terminal::literal("Star", "*");
    let id = Terminal::new("Id", ident_regex());

    e.define(vec![
        lalrgen::production::Production::new(
            &e,
            vec![
                GrammarSymbol::NonTerminal(e.clone()),
                GrammarSymbol::Terminal(plus.clone()),
                GrammarSymbol::NonTerminal(e.clone()),
            ],
        ),
        lalrgen::production::Production::new(
            &e,
            vec![
                GrammarSymbol::NonTerminal(e.clone()),
                GrammarSymbol::Terminal(star.clone()),
                GrammarSymbol::NonTerminal(e.clone()),
            ],
        ),
        lalrgen::production::Production::new(&e, vec![GrammarSymbol::Terminal(id.clone())]),
    ]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(e));
    metadata
        .precedence
        .declare(Associativity::Left, vec![OperatorSymbol::Literal("+".to_string())]);
    metadata
        .precedence
        .declare(Associativity::Left, vec![OperatorSymbol::Literal("*".to_string())]);

    let compiled = compile(metadata, BuildOptions::default()).expect("grammar should compile cleanly");
    assert!(compiled.conflicts.is_empty());
    assert!(compiled.properties.num_lalr_states > 0);
    assert!(compiled.properties.num_dfa_states > 0);
}

#[test]
fn empty_handle_production_compiles() {
    let s = NonTerminal::new("S");
    let a = NonTerminal::new("A");
    let b = NonTerminal::new("B");
    let lit_a = Terminal::literal("A", "a");
    let lit_b = Terminal::literal("B", "b");

    s.define(vec![lalrgen::production::Production::new(
        &s,
        vec![GrammarSymbol::NonTerminal(a.clone()), GrammarSymbol::NonTerminal(b.clone())],
    )]);
    a.define(vec![
        lalrgen::production::Production::new(&a, vec![GrammarSymbol::Terminal(lit_a)]),
        lalrgen::production::Production::new(&a, vec![]),
    ]);
    b.define(vec![lalrgen::production::Production::new(&b, vec![GrammarSymbol::Terminal(lit_b)])]);

    let metadata = Metadata::new(GrammarSymbol::NonTerminal(s));
    let compiled = compile(metadata, BuildOptions::default()).expect("epsilon production is allowed");
    assert!(compiled.conflicts.is_empty());
}

#[test]
fn nonassociative_operator_at_equal_precedence_is_reported() {
    let e = NonTerminal::new("E");
    let lt = Terminal::literal("Lt", "<");
    let id = Terminal::new("Id", ident_regex());

    e.define(vec![
        lalrgen::production::Production::new(
            &e,
            vec![
                GrammarSymbol::NonTerminal(e.clone()),
                GrammarSymbol::Terminal(lt.clone()),
                GrammarSymbol::NonTerminal(e.clone()),
            ],
        ),
        lalrgen::production::Production::new(&e, vec![GrammarSymbol::Terminal(id)]),
    ]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(e));
    metadata
        .precedence
        .declare(Associativity::NonAssociative, vec![OperatorSymbol::Literal("<".to_string())]);

    let err = compile(metadata, BuildOptions::default()).expect_err("non-associative tie must be reported");
    match err {
        BuildError::LalrConflictReport(conflicts) => assert!(!conflicts.is_empty()),
        other => panic!("expected LalrConflictReport, got {other:?}"),
    }
}

#[test]
fn nonassociative_conflict_can_be_resolved_by_favouring_shift() {
    let e = NonTerminal::new("E");
    let lt = Terminal::literal("Lt", "<");
    let id = Terminal::new("Id", ident_regex());

    e.define(vec![
        lalrgen::production::Production::new(
            &e,
            vec![
                GrammarSymbol::NonTerminal(e.clone()),
                GrammarSymbol::Terminal(lt.clone()),
                GrammarSymbol::NonTerminal(e.clone()),
            ],
        ),
        lalrgen::production::Production::new(&e, vec![GrammarSymbol::Terminal(id)]),
    ]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(e));
    metadata
        .precedence
        .declare(Associativity::NonAssociative, vec![OperatorSymbol::Literal("<".to_string())]);

    let options = BuildOptions {
        conflict_policy: ConflictPolicy::ResolveAndReport,
    };
    let compiled = compile(metadata, options).expect("ResolveAndReport never fails the build");
    assert!(!compiled.conflicts.is_empty());
}

#[test]
fn reduce_reduce_without_precedence_is_reported() {
    let s = NonTerminal::new("S");
    let a = NonTerminal::new("A");
    let b = NonTerminal::new("B");
    let x = Terminal::literal("X", "x");

    s.define(vec![
        lalrgen::production::Production::new(&s, vec![GrammarSymbol::NonTerminal(a.clone())]),
        lalrgen::production::Production::new(&s, vec![GrammarSymbol::NonTerminal(b.clone())]),
    ]);
    a.define(vec![lalrgen::production::Production::new(&a, vec![GrammarSymbol::Terminal(x.clone())])]);
    b.define(vec![lalrgen::production::Production::new(&b, vec![GrammarSymbol::Terminal(x)])]);

    let metadata = Metadata::new(GrammarSymbol::NonTerminal(s));
    let err = compile(metadata, BuildOptions::default()).expect_err("ambiguous reduce must be reported");
    match err {
        BuildError::LalrConflictReport(conflicts) => {
            assert!(conflicts.iter().any(|c| !c.competing_shift));
        }
        other => panic!("expected LalrConflictReport, got {other:?}"),
    }
}

#[test]
fn keyword_outranks_identifier_of_the_same_spelling() {
    let root = NonTerminal::new("S");
    let kw_if = Terminal::literal("If", "if");
    let ident = Terminal::new("Ident", ident_regex());
    root.define(vec![
        lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(kw_if.clone())]),
        lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(ident.clone())]),
    ]);

    let metadata = Metadata::new(GrammarSymbol::NonTerminal(root));
    let options = BuildOptions {
        prioritize_fixed_length_symbols: true,
        ..Default::default()
    };
    let compiled = compile(metadata, options).expect("grammar compiles");

    // Walk the DFA along "if" and confirm it accepts the keyword, not the
    // identifier, even though both regexes match that spelling.
    let mut state = compiled.dfa_start;
    for ch in "if".encode_utf16() {
        let next = compiled.dfa_states[state as usize]
            .ranges
            .iter()
            .find(|(range, _)| range.contains(ch))
            .map(|(_, target)| *target)
            .expect("a transition on each character of \"if\"");
        state = next;
    }
    let accepted = compiled.dfa_states[state as usize].accept.expect("\"if\" is accepted by something");
    let kw_index = kw_if.index().expect("analyzer assigns indices");
    assert_eq!(accepted, DfaSymbol::Terminal(kw_index));
}

#[test]
fn keyword_and_identifier_tie_without_the_priority_flag_is_ambiguous() {
    let root = NonTerminal::new("S");
    let kw_if = Terminal::literal("If", "if");
    let ident = Terminal::new("Ident", ident_regex());
    root.define(vec![
        lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(kw_if)]),
        lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(ident)]),
    ]);

    let metadata = Metadata::new(GrammarSymbol::NonTerminal(root));
    let err = compile(metadata, BuildOptions::default()).expect_err("unprioritized tie must be reported");
    match err {
        BuildError::IndistinguishableSymbols(symbols) => assert_eq!(symbols.len(), 2),
        other => panic!("expected IndistinguishableSymbols, got {other:?}"),
    }
}

#[test]
fn reduce_reduce_resolved_by_an_opted_in_scope_produces_no_conflict() {
    let s = NonTerminal::new("S");
    let a = NonTerminal::new("A");
    let b = NonTerminal::new("B");
    let x = Terminal::literal("X", "x");

    s.define(vec![
        lalrgen::production::Production::with_precedence(
            &s,
            vec![GrammarSymbol::NonTerminal(a.clone())],
            Associativity::Left,
            0,
        ),
        lalrgen::production::Production::with_precedence(
            &s,
            vec![GrammarSymbol::NonTerminal(b.clone())],
            Associativity::Left,
            1,
        ),
    ]);
    a.define(vec![lalrgen::production::Production::new(&a, vec![GrammarSymbol::Terminal(x.clone())])]);
    b.define(vec![lalrgen::production::Production::new(&b, vec![GrammarSymbol::Terminal(x)])]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(s));
    metadata
        .precedence
        .declare(Associativity::Left, Vec::new())
        .resolving_reduce_reduce();
    metadata
        .precedence
        .declare(Associativity::Left, Vec::new())
        .resolving_reduce_reduce();

    let compiled = compile(metadata, BuildOptions::default()).expect("opted-in scopes resolve the conflict");
    assert!(compiled.conflicts.is_empty());
}

#[test]
fn case_insensitive_terminal_accepts_either_case() {
    let root = NonTerminal::new("S");
    let kw = Terminal::literal("If", "if");
    root.define(vec![lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(kw)])]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(root));
    metadata.case_sensitive = false;
    let compiled = compile(metadata, BuildOptions::default()).expect("grammar compiles");

    let mut state = compiled.dfa_start;
    for ch in "IF".encode_utf16() {
        let next = compiled.dfa_states[state as usize]
            .ranges
            .iter()
            .find(|(range, _)| range.contains(ch))
            .map(|(_, target)| *target)
            .expect("a transition on each uppercase character");
        state = next;
    }
    assert!(compiled.dfa_states[state as usize].accept.is_some());
}

#[test]
fn comment_group_terminals_are_indexed_and_reported_in_groups_output() {
    let root = NonTerminal::new("S");
    let x = Terminal::literal("X", "x");
    root.define(vec![lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(x)])]);

    let start = Terminal::literal("CommentStart", "/*");
    let end = Terminal::literal("CommentEnd", "*/");
    let group = CommentGroup::new("block-comment", start.clone(), end.clone());

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(root));
    metadata.comments.push(group);

    let compiled = compile(metadata, BuildOptions::default()).expect("grammar compiles");
    assert!(start.index().is_some());
    assert!(end.index().is_some());
    assert_eq!(compiled.groups.len(), 1);
    assert_eq!(compiled.groups[0].name, "block-comment");
    assert_eq!(compiled.groups[0].start, start.index().unwrap());
    assert_eq!(compiled.groups[0].end, end.index());
}

#[test]
fn noise_symbol_is_indexed_without_being_referenced_by_any_production() {
    let root = NonTerminal::new("S");
    let x = Terminal::literal("X", "x");
    root.define(vec![lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(x)])]);

    let whitespace = Terminal::new(
        "Whitespace",
        Regex::one_or_more(Regex::Chars(CharSet::single(b' ' as u16))),
    );

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(root));
    metadata.noise_symbols.push(whitespace.clone());

    let compiled = compile(metadata, BuildOptions::default()).expect("grammar compiles");
    assert!(whitespace.index().is_some());
    assert!(compiled.terminals.iter().any(|t| t.name == "Whitespace"));
}

#[test]
fn unused_declared_terminal_produces_a_warning() {
    let root = NonTerminal::new("S");
    let used = Terminal::literal("Used", "a");
    let unused = Terminal::literal("Unused", "z");
    root.define(vec![lalrgen::production::Production::new(&root, vec![GrammarSymbol::Terminal(used.clone())])]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(root));
    metadata.declared_terminals = vec![used, unused];

    let compiled = compile(metadata, BuildOptions::default()).expect("grammar compiles");
    assert!(compiled
        .warnings
        .iter()
        .any(|w| matches!(w, lalrgen::error::Warning::UnusedTerminal(name) if name == "Unused")));
}

#[test]
fn shift_wins_over_reduce_for_a_right_associative_operator() {
    let e = NonTerminal::new("E");
    let caret = Terminal::literal("Caret", "^");
    let id = Terminal::new("Id", ident_regex());

    e.define(vec![
        lalrgen::production::Production::new(
            &e,
            vec![
                GrammarSymbol::NonTerminal(e.clone()),
                GrammarSymbol::Terminal(caret.clone()),
                GrammarSymbol::NonTerminal(e.clone()),
            ],
        ),
        lalrgen::production::Production::new(&e, vec![GrammarSymbol::Terminal(id)]),
    ]);

    let mut metadata = Metadata::new(GrammarSymbol::NonTerminal(e));
    metadata
        .precedence
        .declare(Associativity::Right, vec![OperatorSymbol::Literal("^".to_string())]);

    let compiled = compile(metadata, BuildOptions::default()).expect("right-associative grammar compiles");
    assert!(compiled.conflicts.is_empty());

    let caret_id = caret.index().expect("analyzer assigns indices");
    let has_shift_on_caret = compiled
        .lalr_states
        .iter()
        .any(|state| matches!(state.actions.get(&caret_id), Some(Action::Shift(_))));
    assert!(has_shift_on_caret);
}
