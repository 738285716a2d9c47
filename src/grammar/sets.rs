//! FIRST and FOLLOW set computation (§4.8), as two cleanly separated fixed-point
//! computations with their own caches — keyed by symbol for [SymbolSets::first_of_symbol],
//! keyed by sequence for [SymbolSets::first_of_sequence] — avoiding the single shared cache
//! the original Python implementation used, where a symbol-keyed lookup and a
//! sequence-keyed lookup collided on the same dict (§9's noted FIRST cache bug; see
//! DESIGN.md for the resolution).

use super::{Grammar, GrammarSymbol, Nonterminal, Terminal};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type TerminalSet = BTreeSet<Terminal>;

/// FIRST/FOLLOW for a grammar, computed once and reused by item/table construction.
pub struct SymbolSets<'g> {
    grammar: &'g Grammar,
    first_of_nonterminal: HashMap<Nonterminal, TerminalSet>,
    follow_of_nonterminal: HashMap<Nonterminal, TerminalSet>,
}

impl<'g> SymbolSets<'g> {
    pub fn compute(grammar: &'g Grammar) -> Self {
        let first_of_nonterminal = compute_first(grammar);
        let follow_of_nonterminal =
            compute_follow(grammar, &first_of_nonterminal);
        SymbolSets {
            grammar,
            first_of_nonterminal,
            follow_of_nonterminal,
        }
    }

    pub fn first_of_symbol(&self, symbol: &GrammarSymbol) -> TerminalSet {
        match symbol {
            GrammarSymbol::Terminal(t) => BTreeSet::from([t.clone()]),
            GrammarSymbol::Nonterminal(n) => self
                .first_of_nonterminal
                .get(n)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// FIRST of a symbol sequence: the union of FIRST of each symbol up to (and, if every
    /// symbol so far can derive ε, including) the first symbol whose FIRST doesn't contain
    /// ε; ε itself is included only if the whole sequence can derive ε.
    pub fn first_of_sequence(&self, seq: &[GrammarSymbol]) -> TerminalSet {
        let mut out = BTreeSet::new();
        let mut all_nullable_so_far = true;
        for symbol in seq {
            let f = self.first_of_symbol(symbol);
            let nullable = f.contains(&Terminal::Epsilon);
            out.extend(f.iter().filter(|t| **t != Terminal::Epsilon).cloned());
            if !nullable {
                all_nullable_so_far = false;
                break;
            }
        }
        if all_nullable_so_far {
            out.insert(Terminal::Epsilon);
        }
        out
    }

    pub fn follow(&self, nt: &Nonterminal) -> TerminalSet {
        self.follow_of_nonterminal.get(nt).cloned().unwrap_or_default()
    }
}

fn compute_first(grammar: &Grammar) -> HashMap<Nonterminal, TerminalSet> {
    let mut first: HashMap<Nonterminal, TerminalSet> = grammar
        .nonterminals
        .iter()
        .map(|n| (n.clone(), BTreeSet::new()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for (lhs, production) in grammar.all_productions() {
            let before = first[lhs].len();
            let added = first_of_rhs(&production.0, &first);
            first.get_mut(lhs).unwrap().extend(added);
            if first[lhs].len() != before {
                changed = true;
            }
        }
    }
    first
}

fn first_of_rhs(
    symbols: &[GrammarSymbol],
    first: &HashMap<Nonterminal, TerminalSet>,
) -> TerminalSet {
    let mut out = BTreeSet::new();
    let mut all_nullable = true;
    for symbol in symbols {
        let f = match symbol {
            GrammarSymbol::Terminal(t) => BTreeSet::from([t.clone()]),
            GrammarSymbol::Nonterminal(n) => first.get(n).cloned().unwrap_or_default(),
        };
        let nullable = f.contains(&Terminal::Epsilon);
        out.extend(f.iter().filter(|t| **t != Terminal::Epsilon).cloned());
        if !nullable {
            all_nullable = false;
            break;
        }
    }
    if all_nullable {
        out.insert(Terminal::Epsilon);
    }
    out
}

fn compute_follow(
    grammar: &Grammar,
    first: &HashMap<Nonterminal, TerminalSet>,
) -> HashMap<Nonterminal, TerminalSet> {
    let mut follow: HashMap<Nonterminal, TerminalSet> = grammar
        .nonterminals
        .iter()
        .map(|n| (n.clone(), BTreeSet::new()))
        .collect();
    follow
        .get_mut(&grammar.start_symbol)
        .unwrap()
        .insert(Terminal::EndOfInput);

    let mut changed = true;
    while changed {
        changed = false;
        for (lhs, production) in grammar.all_productions() {
            let symbols = &production.0;
            for (i, symbol) in symbols.iter().enumerate() {
                let GrammarSymbol::Nonterminal(b) = symbol else {
                    continue;
                };
                let beta = &symbols[i + 1..];
                let first_beta = first_of_rhs(beta, first);
                let before = follow[b].len();

                follow
                    .get_mut(b)
                    .unwrap()
                    .extend(first_beta.iter().filter(|t| **t != Terminal::Epsilon).cloned());

                if first_beta.contains(&Terminal::Epsilon) || beta.is_empty() {
                    let follow_lhs = follow[lhs].clone();
                    follow.get_mut(b).unwrap().extend(follow_lhs);
                }

                if follow[b].len() != before {
                    changed = true;
                }
            }
        }
    }
    follow
}
