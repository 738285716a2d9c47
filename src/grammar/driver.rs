//! Parse drivers: a recursive table-driven LL(1) descent and a shift-reduce LR driver,
//! both producing the same [ParseTree] shape so a caller can swap parsing strategy without
//! touching whatever walks the tree afterward.

use super::table::{Action, LlTable, ParseTable};
use super::{Grammar, GrammarSymbol, Nonterminal, Terminal};
use thiserror::Error;

/// Anything a driver can read a lookahead terminal off of. Lexer output types implement
/// this once and both drivers accept them.
pub trait Token {
    fn terminal(&self) -> Terminal;
}

/// A parse tree: terminal leaves hold the matched token, interior nodes hold the
/// nonterminal (or, for an ε production, the bare `ε` terminal symbol) and its children.
#[derive(Clone, Debug)]
pub enum ParseTree<Tok> {
    Leaf(Tok),
    Node(GrammarSymbol, Vec<ParseTree<Tok>>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token {found} at position {position}, expected {expected:?}")]
    UnexpectedToken {
        position: usize,
        found: Terminal,
        expected: Vec<Terminal>,
    },
    #[error("unexpected end of input, expected {expected:?}")]
    UnexpectedEof { expected: Vec<Terminal> },
    #[error("no LL(1) table entry for nonterminal {nonterminal} on lookahead {lookahead}")]
    NoLlEntry {
        nonterminal: Nonterminal,
        lookahead: Terminal,
    },
    #[error("no LR action for state {state} on lookahead {lookahead}")]
    NoLrAction { state: usize, lookahead: Terminal },
}

/// Parses `tokens` top-down against `grammar`'s start symbol using a precomputed
/// [LlTable], expecting the whole token stream to be consumed.
pub fn parse_ll1<Tok: Token + Clone>(
    grammar: &Grammar,
    table: &LlTable,
    tokens: &[Tok],
) -> Result<ParseTree<Tok>, ParseError> {
    let mut pos = 0usize;
    let start = GrammarSymbol::Nonterminal(grammar.start_symbol.clone());
    let tree = parse_symbol(grammar, table, tokens, &mut pos, &start)?;

    if pos != tokens.len() {
        return Err(ParseError::UnexpectedToken {
            position: pos,
            found: tokens[pos].terminal(),
            expected: vec![Terminal::EndOfInput],
        });
    }
    Ok(tree)
}

fn parse_symbol<Tok: Token + Clone>(
    grammar: &Grammar,
    table: &LlTable,
    tokens: &[Tok],
    pos: &mut usize,
    symbol: &GrammarSymbol,
) -> Result<ParseTree<Tok>, ParseError> {
    match symbol {
        GrammarSymbol::Terminal(Terminal::Epsilon) => Ok(ParseTree::Node(symbol.clone(), Vec::new())),
        GrammarSymbol::Terminal(t) => {
            let lookahead = tokens.get(*pos).map(Token::terminal);
            if lookahead.as_ref() == Some(t) {
                let tok = tokens[*pos].clone();
                *pos += 1;
                Ok(ParseTree::Leaf(tok))
            } else {
                Err(match lookahead {
                    Some(found) => ParseError::UnexpectedToken {
                        position: *pos,
                        found,
                        expected: vec![t.clone()],
                    },
                    None => ParseError::UnexpectedEof {
                        expected: vec![t.clone()],
                    },
                })
            }
        }
        GrammarSymbol::Nonterminal(nt) => {
            let lookahead = tokens.get(*pos).map(Token::terminal).unwrap_or(Terminal::EndOfInput);
            let idx = table.production_index(nt, &lookahead).ok_or_else(|| ParseError::NoLlEntry {
                nonterminal: nt.clone(),
                lookahead: lookahead.clone(),
            })?;
            let production = &grammar.productions_of(nt)[idx];
            let mut children = Vec::with_capacity(production.0.len());
            for s in &production.0 {
                children.push(parse_symbol(grammar, table, tokens, pos, s)?);
            }
            Ok(ParseTree::Node(symbol.clone(), children))
        }
    }
}

/// Drives a shift-reduce parse with a precomputed [ParseTable], producing the same
/// [ParseTree] shape as [parse_ll1].
pub fn parse_lr<Tok: Token + Clone>(table: &ParseTable, tokens: &[Tok]) -> Result<ParseTree<Tok>, ParseError> {
    let mut state_stack = vec![table.start_state];
    let mut tree_stack: Vec<ParseTree<Tok>> = Vec::new();
    let mut pos = 0usize;

    loop {
        let state = *state_stack.last().expect("state stack is never empty");
        let lookahead = tokens.get(pos).map(Token::terminal).unwrap_or(Terminal::EndOfInput);

        match table.action(state, &lookahead) {
            Some(Action::Shift(next)) => {
                tree_stack.push(ParseTree::Leaf(tokens[pos].clone()));
                state_stack.push(*next);
                pos += 1;
            }
            Some(Action::Reduce(lhs, rhs)) => {
                let is_epsilon = matches!(rhs.as_ref(), [GrammarSymbol::Terminal(Terminal::Epsilon)]);
                let n = if is_epsilon { 0 } else { rhs.len() };
                let children = tree_stack.split_off(tree_stack.len() - n);
                state_stack.truncate(state_stack.len() - n);

                let under = *state_stack.last().expect("state stack is never empty");
                let goto_state = table
                    .goto(under, lhs)
                    .expect("GOTO must be defined for any state reached after a valid reduce");

                tree_stack.push(ParseTree::Node(GrammarSymbol::Nonterminal(lhs.clone()), children));
                state_stack.push(goto_state);
            }
            Some(Action::Accept) => {
                return Ok(tree_stack.pop().expect("accept leaves exactly one tree on the stack"));
            }
            None => {
                return Err(ParseError::NoLrAction { state, lookahead });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::from_string;
    use crate::grammar::item::build_canonical_collection;
    use crate::grammar::sets::SymbolSets;
    use crate::grammar::table::{build_ll1_table, build_table, ConstructionMode};

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
    fn ll1_driver_parses_id_plus_id_times_id() {
        let grammar = from_string(
            "E -> T Ep\nEp -> '+' T Ep | ε\nT -> F Tp\nTp -> '*' F Tp | ε\nF -> '(' E ')' | 'id'",
        )
        .unwrap();
        let sets = SymbolSets::compute(&grammar);
        let table = build_ll1_table(&grammar, &sets).unwrap();

        let tokens = vec![plain("id"), plain("+"), plain("id"), plain("*"), plain("id")];
        let tree = parse_ll1(&grammar, &table, &tokens).unwrap();
        assert!(matches!(tree, ParseTree::Node(GrammarSymbol::Nonterminal(_), _)));
    }

    #[test]
    fn lr_driver_parses_cdc_for_cc_grammar() {
        let grammar = from_string("S -> C C\nC -> 'c' C | 'd'").unwrap();
        let sets = SymbolSets::compute(&grammar);
        let collection = build_canonical_collection(&grammar, &sets);
        let table = build_table(&sets, &collection, ConstructionMode::Lr1).unwrap();

        let tokens = vec![plain("c"), plain("d"), plain("d")];
        let tree = parse_lr(&table, &tokens).unwrap();
        assert!(matches!(tree, ParseTree::Node(GrammarSymbol::Nonterminal(_), _)));
    }

    #[test]
    fn ll1_driver_rejects_unexpected_token() {
        let grammar = from_string(
            "E -> T Ep\nEp -> '+' T Ep | ε\nT -> F Tp\nTp -> '*' F Tp | ε\nF -> '(' E ')' | 'id'",
        )
        .unwrap();
        let sets = SymbolSets::compute(&grammar);
        let table = build_ll1_table(&grammar, &sets).unwrap();

        let tokens = vec![plain("+")];
        assert!(parse_ll1(&grammar, &table, &tokens).is_err());
    }
}
