//! ACTION/GOTO table construction (§4.8): SLR(1) (reduce lookaheads from FOLLOW),
//! canonical LR(1) and LALR(1) (reduce lookaheads carried by the item itself). A
//! shift/reduce or reduce/reduce conflict is always a construction error — precedence-based
//! disambiguation is not implemented (§9's second open question; see DESIGN.md).

use super::item::CanonicalCollection;
use super::sets::SymbolSets;
use super::{Grammar, GrammarSymbol, Nonterminal, Terminal};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(Nonterminal, Rc<[GrammarSymbol]>),
    Accept,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("shift/reduce conflict in state {state} on {terminal}")]
    ShiftReduce { state: usize, terminal: Terminal },
    #[error("reduce/reduce conflict in state {state} on {terminal}")]
    ReduceReduce { state: usize, terminal: Terminal },
}

/// Which set of lookaheads a complete item reduces on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstructionMode {
    /// SLR(1): every complete `A -> α.` reduces on all of FOLLOW(A).
    Slr,
    /// Canonical LR(1) or LALR(1): reduces only on the item's own lookahead (the canonical
    /// collection and the core-merged LALR collection both carry correct per-item
    /// lookaheads already).
    Lr1,
}

pub struct ParseTable {
    action: HashMap<(usize, Terminal), Action>,
    goto: HashMap<(usize, Nonterminal), usize>,
    pub start_state: usize,
}

impl ParseTable {
    pub fn action(&self, state: usize, terminal: &Terminal) -> Option<&Action> {
        self.action.get(&(state, terminal.clone()))
    }

    pub fn goto(&self, state: usize, nonterminal: &Nonterminal) -> Option<usize> {
        self.goto.get(&(state, nonterminal.clone())).copied()
    }
}

pub fn build_table(
    sets: &SymbolSets,
    collection: &CanonicalCollection,
    mode: ConstructionMode,
) -> Result<ParseTable, TableError> {
    let mut action: HashMap<(usize, Terminal), Action> = HashMap::new();
    let mut goto: HashMap<(usize, Nonterminal), usize> = HashMap::new();

    for (i, items) in collection.states.iter().enumerate() {
        for item in items {
            if !item.is_complete() {
                continue;
            }
            if item.lhs == collection.augmented_start {
                insert_action(&mut action, i, Terminal::EndOfInput, Action::Accept)?;
                continue;
            }
            let lookaheads: Vec<Terminal> = match mode {
                ConstructionMode::Slr => sets.follow(&item.lhs).into_iter().collect(),
                ConstructionMode::Lr1 => vec![item.lookahead.clone()],
            };
            for terminal in lookaheads {
                insert_action(
                    &mut action,
                    i,
                    terminal,
                    Action::Reduce(item.lhs.clone(), item.rhs.clone()),
                )?;
            }
        }
    }

    for ((from, symbol), &to) in &collection.transitions {
        match symbol {
            GrammarSymbol::Terminal(t) if !t.is_action() => {
                insert_action(&mut action, *from, t.clone(), Action::Shift(to))?;
            }
            GrammarSymbol::Terminal(_) => {
                // An action terminal can never be produced by a lexer, so it never shifts.
            }
            GrammarSymbol::Nonterminal(n) => {
                goto.insert((*from, n.clone()), to);
            }
        }
    }

    Ok(ParseTable {
        action,
        goto,
        start_state: collection.start_state,
    })
}

fn insert_action(
    action: &mut HashMap<(usize, Terminal), Action>,
    state: usize,
    terminal: Terminal,
    new: Action,
) -> Result<(), TableError> {
    match action.get(&(state, terminal.clone())) {
        None => {
            action.insert((state, terminal), new);
            Ok(())
        }
        Some(existing) if *existing == new => Ok(()),
        Some(Action::Shift(_)) => Err(TableError::ShiftReduce { state, terminal }),
        _ => Err(TableError::ReduceReduce { state, terminal }),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("LL(1) conflict for nonterminal {nonterminal} on lookahead {lookahead}")]
pub struct LlConflict {
    pub nonterminal: Nonterminal,
    pub lookahead: Terminal,
}

/// An LL(1) parsing table: for each `(nonterminal, lookahead)` pair, which of that
/// nonterminal's productions (by index into [Grammar::productions_of]) to expand.
pub struct LlTable {
    entries: HashMap<(Nonterminal, Terminal), usize>,
}

impl LlTable {
    pub fn production_index(&self, nt: &Nonterminal, lookahead: &Terminal) -> Option<usize> {
        self.entries.get(&(nt.clone(), lookahead.clone())).copied()
    }
}

/// Builds the LL(1) table per Dragon Book Algorithm 4.31: for `A -> α`, add it under every
/// terminal in FIRST(α); if α is nullable, also add it under every terminal in FOLLOW(A).
/// Two productions ever claiming the same `(A, lookahead)` cell is an `LlConflict`.
pub fn build_ll1_table(grammar: &Grammar, sets: &SymbolSets) -> Result<LlTable, LlConflict> {
    let mut entries = HashMap::new();

    for (lhs, productions) in &grammar.productions {
        for (idx, production) in productions.iter().enumerate() {
            let first = sets.first_of_sequence(&production.0);
            for terminal in first.iter().filter(|t| !matches!(t, Terminal::Epsilon)) {
                insert_ll(&mut entries, lhs.clone(), terminal.clone(), idx)?;
            }
            if first.contains(&Terminal::Epsilon) {
                for terminal in sets.follow(lhs) {
                    insert_ll(&mut entries, lhs.clone(), terminal, idx)?;
                }
            }
        }
    }

    Ok(LlTable { entries })
}

fn insert_ll(
    entries: &mut HashMap<(Nonterminal, Terminal), usize>,
    nt: Nonterminal,
    terminal: Terminal,
    idx: usize,
) -> Result<(), LlConflict> {
    match entries.get(&(nt.clone(), terminal.clone())) {
        None => {
            entries.insert((nt, terminal), idx);
            Ok(())
        }
        Some(&existing) if existing == idx => Ok(()),
        Some(_) => Err(LlConflict {
            nonterminal: nt,
            lookahead: terminal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::from_string;
    use crate::grammar::item::{build_canonical_collection, merge_lalr};

    #[test]
    fn slr_table_for_dragon_book_expression_grammar_has_no_conflicts() {
        let grammar = from_string("E -> E '+' T | T\nT -> T '*' F | F\nF -> '(' E ')' | 'id'").unwrap();
        let sets = SymbolSets::compute(&grammar);
        let collection = build_canonical_collection(&grammar, &sets);
        let table = build_table(&sets, &collection, ConstructionMode::Slr).unwrap();

        let shift_on_id = table.action(collection.start_state, &Terminal::plain("id"));
        assert!(matches!(shift_on_id, Some(Action::Shift(_))));
    }

    #[test]
    fn lalr_table_for_cc_grammar_has_no_conflicts() {
        let grammar = from_string("S -> C C\nC -> 'c' C | 'd'").unwrap();
        let sets = SymbolSets::compute(&grammar);
        let canonical = build_canonical_collection(&grammar, &sets);
        let lalr = merge_lalr(&canonical);
        build_table(&sets, &lalr, ConstructionMode::Lr1).unwrap();
    }

    #[test]
    fn ll1_table_for_dragon_book_expression_grammar_has_no_conflicts() {
        let grammar = from_string(
            "E -> T Ep\nEp -> '+' T Ep | ε\nT -> F Tp\nTp -> '*' F Tp | ε\nF -> '(' E ')' | 'id'",
        )
        .unwrap();
        let sets = SymbolSets::compute(&grammar);
        let table = build_ll1_table(&grammar, &sets).unwrap();
        let idx = table
            .production_index(&Nonterminal::new("F"), &Terminal::plain("id"))
            .unwrap();
        assert_eq!(grammar.productions_of(&Nonterminal::new("F"))[idx].to_string(), "'id'");
    }

    #[test]
    fn dangling_else_grammar_is_a_construction_error() {
        let grammar = from_string(
            "S -> 'if' E 'then' S 'else' S | 'if' E 'then' S | 'other'\nE -> 'e'",
        )
        .unwrap();
        let sets = SymbolSets::compute(&grammar);
        let collection = build_canonical_collection(&grammar, &sets);
        let err = build_table(&sets, &collection, ConstructionMode::Lr1).unwrap_err();
        assert!(matches!(err, TableError::ShiftReduce { .. }));
    }
}
