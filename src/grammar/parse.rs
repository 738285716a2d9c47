//! Textual grammar format (§6): lines of `Name -> alt1 | alt2 | ...`, where an alternative is
//! a whitespace-separated sequence of `'terminal'` (quoted), `{action}` (braced) or bare
//! `Nonterminal` tokens; an empty alternative (nothing between two `|`, or after `->` with
//! nothing following) denotes ε. A rule's alternatives may continue on following lines that
//! begin with `|`. The first nonterminal defined becomes the grammar's start symbol.

use super::{Grammar, GrammarError, GrammarSymbol, Nonterminal, Production, Terminal};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarSyntaxError {
    #[error("line {0}: expected '->' after the nonterminal name")]
    MissingArrow(usize),
    #[error("line {0}: empty left-hand side")]
    EmptyLhs(usize),
    #[error("line {0}: unterminated quoted terminal")]
    UnterminatedTerminal(usize),
    #[error("line {0}: unterminated action terminal")]
    UnterminatedAction(usize),
    #[error("no rules given")]
    Empty,
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

pub fn from_string(input: &str) -> Result<Grammar, GrammarSyntaxError> {
    let mut productions: BTreeMap<Nonterminal, Vec<Production>> = BTreeMap::new();
    let mut order: Vec<Nonterminal> = Vec::new();
    let mut current: Option<Nonterminal> = None;

    for (i, raw_line) in input.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('|') {
            let lhs = current
                .clone()
                .ok_or(GrammarSyntaxError::MissingArrow(line_no))?;
            let alts = parse_alternatives(rest, line_no)?;
            productions.get_mut(&lhs).unwrap().extend(alts);
            continue;
        }

        let (lhs_text, rhs_text) = trimmed
            .split_once("->")
            .ok_or(GrammarSyntaxError::MissingArrow(line_no))?;
        let lhs_text = lhs_text.trim();
        if lhs_text.is_empty() {
            return Err(GrammarSyntaxError::EmptyLhs(line_no));
        }
        let lhs = Nonterminal::new(lhs_text);
        if !productions.contains_key(&lhs) {
            order.push(lhs.clone());
            productions.insert(lhs.clone(), Vec::new());
        }
        let alts = parse_alternatives(rhs_text, line_no)?;
        productions.get_mut(&lhs).unwrap().extend(alts);
        current = Some(lhs);
    }

    let start_symbol = order.first().cloned().ok_or(GrammarSyntaxError::Empty)?;
    let nonterminals: BTreeSet<Nonterminal> = order.into_iter().collect();

    let mut terminals = BTreeSet::new();
    for rhss in productions.values() {
        for rhs in rhss {
            for sym in &rhs.0 {
                if let GrammarSymbol::Terminal(t) = sym {
                    if !matches!(t, Terminal::Epsilon) {
                        terminals.insert(t.clone());
                    }
                }
            }
        }
    }

    Grammar::new(nonterminals, terminals, productions, start_symbol).map_err(Into::into)
}

fn parse_alternatives(text: &str, line_no: usize) -> Result<Vec<Production>, GrammarSyntaxError> {
    text.split('|')
        .map(|alt| parse_alternative(alt.trim(), line_no))
        .collect()
}

fn parse_alternative(text: &str, line_no: usize) -> Result<Production, GrammarSyntaxError> {
    if text.is_empty() {
        return Ok(Production::epsilon());
    }

    let mut symbols = Vec::new();
    let mut rest = text;
    while !rest.trim_start().is_empty() {
        rest = rest.trim_start();
        if let Some(tail) = rest.strip_prefix('\'') {
            let end = tail
                .find('\'')
                .ok_or(GrammarSyntaxError::UnterminatedTerminal(line_no))?;
            symbols.push(GrammarSymbol::Terminal(Terminal::plain(&tail[..end])));
            rest = &tail[end + 1..];
        } else if let Some(tail) = rest.strip_prefix('{') {
            let end = tail
                .find('}')
                .ok_or(GrammarSyntaxError::UnterminatedAction(line_no))?;
            symbols.push(GrammarSymbol::Terminal(Terminal::Action(tail[..end].into())));
            rest = &tail[end + 1..];
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let token = &rest[..end];
            symbols.push(if token == "ε" {
                GrammarSymbol::Terminal(Terminal::Epsilon)
            } else {
                GrammarSymbol::Nonterminal(Nonterminal::new(token))
            });
            rest = &rest[end..];
        }
    }

    if symbols.is_empty() {
        Ok(Production::epsilon())
    } else {
        Ok(Production(symbols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dragon_book_left_recursive_grammar() {
        let grammar = from_string(
            "S -> 'a' A | 'b'\nA -> 'c' A | S 'd' | ε",
        )
        .unwrap();
        assert_eq!(grammar.start_symbol, Nonterminal::new("S"));
        assert_eq!(grammar.productions_of(&Nonterminal::new("S")).len(), 2);
        assert_eq!(grammar.productions_of(&Nonterminal::new("A")).len(), 3);
        assert!(grammar
            .productions_of(&Nonterminal::new("A"))
            .iter()
            .any(Production::is_epsilon));
    }

    #[test]
    fn continuation_lines_extend_the_current_rule() {
        let grammar = from_string("E -> T\n| E '+' T").unwrap();
        assert_eq!(grammar.productions_of(&Nonterminal::new("E")).len(), 2);
    }

    #[test]
    fn action_terminal_round_trips() {
        let grammar = from_string("S -> 'a' {reduce_a}").unwrap();
        let prod = &grammar.productions_of(&Nonterminal::new("S"))[0];
        assert!(matches!(
            prod.0[1],
            GrammarSymbol::Terminal(Terminal::Action(_))
        ));
    }

    #[test]
    fn undeclared_nonterminal_is_rejected() {
        let err = from_string("S -> A").unwrap_err();
        assert!(matches!(err, GrammarSyntaxError::Grammar(_)));
    }
}
