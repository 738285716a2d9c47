//! Crate-level integration tests exercising the whole pipeline end to end, rather than one
//! module in isolation: regex-to-DFA, a multi-rule lexer, and grammar transform + table +
//! driver scenarios drawn straight from the classic worked examples.

use crate::definition::RegularDefinition;
use crate::grammar::driver::{parse_lr, Token};
use crate::grammar::item::{build_canonical_collection, merge_lalr};
use crate::grammar::sets::SymbolSets;
use crate::grammar::table::{build_table, ConstructionMode};
use crate::grammar::{from_string, transform, Terminal};
use crate::lexer::{Lexer, LexerRule, SymbolTable};
use crate::regex::parse::parse;
use lazy_static::lazy_static;
use proptest::prelude::*;
use std::rc::Rc;

lazy_static! {
    /// Regex source shared by the acceptance test below and the equivalence property test,
    /// the way the teacher's benchmarks share a fixture pool instead of each case owning its
    /// own copy of the source text.
    static ref NUMBER_LITERAL_SRC: &'static str = r"[0-9]+(\.[0-9]+)?(E[+-]?[0-9]+)?";
}

#[test]
fn a_or_b_star_abb_accepts_and_rejects() {
    let dfa = parse("(a|b)*abb").unwrap().to_nfa().to_dfa();
    for good in ["abb", "aabb", "babb", "aaababb"] {
        assert!(dfa.accepts(good), "expected {good:?} to be accepted");
    }
    for bad in ["", "ab", "abbb", "abba"] {
        assert!(!dfa.accepts(bad), "expected {bad:?} to be rejected");
    }
}

#[test]
fn number_literal_regex_accepts_and_rejects() {
    let dfa = parse(*NUMBER_LITERAL_SRC).unwrap().to_nfa().to_dfa();
    for good in ["0", "123", "3.14", "1E10", "2.5E-3", "9E+2"] {
        assert!(dfa.accepts(good), "expected {good:?} to be accepted");
    }
    for bad in ["", ".5", "E10", "1.", "1EE2"] {
        assert!(!dfa.accepts(bad), "expected {bad:?} to be rejected");
    }
}

proptest! {
    /// §8's "Automaton equivalence" scenario: a NFA and the DFA subset-constructed from it
    /// must agree on acceptance for every input, not just the handful of examples above.
    #[test]
    fn nfa_and_dfa_agree_on_acceptance_for_number_literal_strings(s in "[0-9Ee.+-]{0,8}") {
        let nfa = parse(*NUMBER_LITERAL_SRC).unwrap().to_nfa();
        let dfa = nfa.to_dfa();
        prop_assert_eq!(nfa.accepts(&s), dfa.accepts(&s));
    }

    #[test]
    fn nfa_and_dfa_agree_on_acceptance_for_a_or_b_star_abb(s in "[ab]{0,8}") {
        let nfa = parse("(a|b)*abb").unwrap().to_nfa();
        let dfa = nfa.to_dfa();
        prop_assert_eq!(nfa.accepts(&s), dfa.accepts(&s));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokKind {
    If,
    Else,
    Id(usize),
    Num(String),
}

fn build_if_else_lexer() -> Lexer<TokKind> {
    let defs = RegularDefinition::new(vec![]).unwrap();
    let rules = vec![
        LexerRule::new(
            "if",
            parse("if").unwrap(),
            Rc::new(|_: &mut SymbolTable, _: &str| Some(TokKind::If)) as crate::lexer::Action<TokKind>,
        ),
        LexerRule::new(
            "else",
            parse("else").unwrap(),
            Rc::new(|_: &mut SymbolTable, _: &str| Some(TokKind::Else)) as crate::lexer::Action<TokKind>,
        ),
        LexerRule::new(
            "ws",
            parse("[ \\t\\n]+").unwrap(),
            Rc::new(|_: &mut SymbolTable, _: &str| None) as crate::lexer::Action<TokKind>,
        ),
        LexerRule::new(
            "num",
            parse("[0-9]+").unwrap(),
            Rc::new(|_: &mut SymbolTable, lex: &str| Some(TokKind::Num(lex.to_string()))) as crate::lexer::Action<TokKind>,
        ),
        LexerRule::new(
            "id",
            parse("[a-z][a-z0-9]*").unwrap(),
            Rc::new(|st: &mut SymbolTable, lex: &str| Some(TokKind::Id(st.intern(lex)))) as crate::lexer::Action<TokKind>,
        ),
    ];
    Lexer::build(rules, &defs).unwrap()
}

#[test]
fn lexer_prefers_keywords_over_identifiers_and_skips_whitespace() {
    let lexer = build_if_else_lexer();
    let tokens = lexer.tokenize("if x else 12").unwrap();
    assert_eq!(
        tokens,
        vec![
            TokKind::If,
            TokKind::Id(0),
            TokKind::Else,
            TokKind::Num("12".into()),
        ]
    );
}

#[test]
fn lexer_still_prefers_longest_identifier_over_a_keyword_prefix() {
    let lexer = build_if_else_lexer();
    let tokens = lexer.tokenize("elsewhere").unwrap();
    assert_eq!(tokens, vec![TokKind::Id(0)]);
}

#[test]
fn left_recursion_removal_preserves_language_membership() {
    // S -> A a | b ; A -> A c | S d | ε
    let grammar = from_string("S -> A 'a' | 'b'\nA -> A 'c' | S 'd' | ε").unwrap();
    let fixed = transform::remove_left_recursion(&grammar).unwrap();
    for (lhs, prods) in &fixed.productions {
        for p in prods {
            if let Some(crate::grammar::GrammarSymbol::Nonterminal(n)) = p.0.first() {
                assert_ne!(n, lhs);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Tok(Terminal);

impl Token for Tok {
    fn terminal(&self) -> Terminal {
        self.0.clone()
    }
}

fn plain(s: &str) -> Tok {
    Tok(Terminal::plain(s))
}

#[test]
fn slr1_table_parses_id_plus_id_times_id_into_a_tree_rooted_at_e() {
    let grammar = from_string("E -> E '+' T | T\nT -> T '*' F | F\nF -> '(' E ')' | 'id'").unwrap();
    let sets = SymbolSets::compute(&grammar);
    let collection = build_canonical_collection(&grammar, &sets);
    let table = build_table(&sets, &collection, ConstructionMode::Slr).unwrap();

    let tokens = vec![plain("id"), plain("+"), plain("id"), plain("*"), plain("id")];
    let tree = parse_lr(&table, &tokens).unwrap();
    match tree {
        crate::grammar::driver::ParseTree::Node(crate::grammar::GrammarSymbol::Nonterminal(n), children) => {
            assert_eq!(n, crate::grammar::Nonterminal::new("E"));
            assert!(!children.is_empty());
        }
        other => panic!("expected a nonterminal-rooted tree, got {other:?}"),
    }
}

#[test]
fn canonical_lr1_and_lalr1_agree_on_acceptance_for_cc_grammar() {
    let grammar = from_string("S -> C C\nC -> 'c' C | 'd'").unwrap();
    let sets = SymbolSets::compute(&grammar);
    let canonical = build_canonical_collection(&grammar, &sets);
    let lalr = merge_lalr(&canonical);

    let canonical_table = build_table(&sets, &canonical, ConstructionMode::Lr1).unwrap();
    let lalr_table = build_table(&sets, &lalr, ConstructionMode::Lr1).unwrap();

    for input in [
        vec![plain("d"), plain("d")],
        vec![plain("c"), plain("d"), plain("d")],
        vec![plain("c"), plain("c"), plain("d"), plain("d")],
    ] {
        assert!(parse_lr(&canonical_table, &input).is_ok());
        assert!(parse_lr(&lalr_table, &input).is_ok());
    }

    assert!(parse_lr(&canonical_table, &[plain("d")]).is_err());
    assert!(parse_lr(&lalr_table, &[plain("d")]).is_err());
}
