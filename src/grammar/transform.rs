//! Grammar-to-grammar transforms (§4.8): left-recursion removal (Dragon Book Algorithm
//! 4.19), left-factoring (Algorithm 4.21), and `simplify` (dropping degenerate productions
//! and unreachable symbols, carried over from the original's `Grammar.simplify`, see
//! SPEC_FULL §C).

use super::{Grammar, GrammarError, GrammarSymbol, Nonterminal, Production, Terminal};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

fn fresh_name(base: &Nonterminal, existing: &mut BTreeSet<Nonterminal>, counter: &mut u32) -> Nonterminal {
    loop {
        let n = *counter;
        *counter += 1;
        let candidate = Nonterminal::new(format!("{}_{n}", base.0));
        if existing.insert(candidate.clone()) {
            return candidate;
        }
    }
}

/// Removes left recursion (direct and indirect) per Algorithm 4.19: nonterminals are
/// ordered (here, the grammar's own `BTreeSet` order), and for `i` from first to last,
/// productions of `A_i` starting with an earlier `A_j` are substituted by `A_j`'s own
/// alternatives before immediate left recursion on `A_i` itself is split off into a fresh
/// `A_i'`.
pub fn remove_left_recursion(grammar: &Grammar) -> Result<Grammar, GrammarError> {
    let order: Vec<Nonterminal> = grammar.nonterminals.iter().cloned().collect();
    let mut productions = grammar.productions.clone();
    let mut nonterminals = grammar.nonterminals.clone();
    let mut counter = 0u32;

    for i in 0..order.len() {
        let ai = &order[i];

        let mut substituted = Vec::new();
        for prod in productions[ai].clone() {
            let leading_earlier = match prod.0.first() {
                Some(GrammarSymbol::Nonterminal(aj)) => {
                    order.iter().position(|n| n == aj).filter(|&j| j < i)
                }
                _ => None,
            };
            match leading_earlier {
                Some(j) => {
                    let aj = &order[j];
                    let gamma = &prod.0[1..];
                    for aj_prod in productions[aj].clone() {
                        if aj_prod.is_epsilon() {
                            substituted.push(if gamma.is_empty() {
                                Production::epsilon()
                            } else {
                                Production(gamma.to_vec())
                            });
                        } else {
                            let mut symbols = aj_prod.0.clone();
                            symbols.extend_from_slice(gamma);
                            substituted.push(Production(symbols));
                        }
                    }
                }
                None => substituted.push(prod),
            }
        }
        productions.insert(ai.clone(), substituted);

        let prods = productions[ai].clone();
        let (recursive, nonrecursive): (Vec<_>, Vec<_>) = prods.into_iter().partition(|p| {
            matches!(p.0.first(), Some(GrammarSymbol::Nonterminal(n)) if n == ai)
        });

        if recursive.is_empty() {
            continue;
        }

        let a_prime = fresh_name(ai, &mut nonterminals, &mut counter);

        let ai_prods: Vec<Production> = nonrecursive
            .iter()
            .map(|beta_prod| {
                let mut symbols = if beta_prod.is_epsilon() {
                    Vec::new()
                } else {
                    beta_prod.0.clone()
                };
                symbols.push(GrammarSymbol::Nonterminal(a_prime.clone()));
                Production(symbols)
            })
            .collect();
        productions.insert(ai.clone(), ai_prods);

        let mut aprime_prods: Vec<Production> = recursive
            .iter()
            .map(|rec_prod| {
                let mut symbols = rec_prod.0[1..].to_vec();
                symbols.push(GrammarSymbol::Nonterminal(a_prime.clone()));
                Production(symbols)
            })
            .collect();
        aprime_prods.push(Production::epsilon());
        productions.insert(a_prime.clone(), aprime_prods);
    }

    let rewritten = Grammar::new(
        nonterminals,
        grammar.terminals.clone(),
        productions,
        grammar.start_symbol.clone(),
    )?;
    simplify(&rewritten)
}

fn common_prefix_len(group: &[Production]) -> usize {
    let mut len = group[0].0.len();
    for p in &group[1..] {
        let max = len.min(p.0.len());
        let mut l = 0;
        while l < max && group[0].0[l] == p.0[l] {
            l += 1;
        }
        len = l;
    }
    len
}

/// Left-factors every nonterminal per Algorithm 4.21: productions sharing a leading symbol
/// are grouped, the longest prefix common to the whole group is split off into a fresh
/// nonterminal, and the process repeats on that fresh nonterminal until no group has two or
/// more alternatives left to factor.
pub fn left_factor(grammar: &Grammar) -> Result<Grammar, GrammarError> {
    let mut productions = grammar.productions.clone();
    let mut nonterminals = grammar.nonterminals.clone();
    let mut counter = 0u32;
    let mut worklist: Vec<Nonterminal> = grammar.nonterminals.iter().cloned().collect();

    while let Some(a) = worklist.pop() {
        let prods = match productions.get(&a) {
            Some(p) if p.len() >= 2 => p.clone(),
            _ => continue,
        };

        let mut groups: BTreeMap<Option<GrammarSymbol>, Vec<Production>> = BTreeMap::new();
        for p in prods {
            groups.entry(p.0.first().cloned()).or_default().push(p);
        }

        let mut new_prods = Vec::new();
        let mut refactored = false;
        for group in groups.into_values() {
            if group.len() < 2 {
                new_prods.extend(group);
                continue;
            }
            let prefix_len = common_prefix_len(&group);
            if prefix_len == 0 {
                new_prods.extend(group);
                continue;
            }
            refactored = true;
            let a_prime = fresh_name(&a, &mut nonterminals, &mut counter);
            let prefix = group[0].0[..prefix_len].to_vec();

            let tail_prods: Vec<Production> = group
                .iter()
                .map(|p| {
                    let suffix = &p.0[prefix_len..];
                    if suffix.is_empty() {
                        Production::epsilon()
                    } else {
                        Production(suffix.to_vec())
                    }
                })
                .collect();
            productions.insert(a_prime.clone(), tail_prods);
            worklist.push(a_prime.clone());

            let mut factored = prefix;
            factored.push(GrammarSymbol::Nonterminal(a_prime));
            new_prods.push(Production(factored));
        }

        productions.insert(a.clone(), new_prods);
        if refactored {
            worklist.push(a);
        }
    }

    let rewritten = Grammar::new(
        nonterminals,
        grammar.terminals.clone(),
        productions,
        grammar.start_symbol.clone(),
    )?;
    simplify(&rewritten)
}

/// Drops degenerate productions (an empty-token terminal contributes nothing; `A -> A`
/// alone is a useless self-loop) and prunes nonterminals/terminals unreachable from the
/// start symbol, supplemented from the original's `Grammar.simplify` (SPEC_FULL §C).
pub fn simplify(grammar: &Grammar) -> Result<Grammar, GrammarError> {
    let mut productions: BTreeMap<Nonterminal, Vec<Production>> = BTreeMap::new();

    for (lhs, rhss) in &grammar.productions {
        let mut kept = Vec::new();
        for p in rhss {
            if let [GrammarSymbol::Nonterminal(n)] = p.0.as_slice() {
                if n == lhs {
                    continue;
                }
            }
            let filtered: Vec<GrammarSymbol> = p
                .0
                .iter()
                .filter(|s| !matches!(s, GrammarSymbol::Terminal(Terminal::Plain(t)) if t.is_empty()))
                .cloned()
                .collect();
            kept.push(if filtered.is_empty() {
                Production::epsilon()
            } else {
                Production(filtered)
            });
        }
        if !kept.is_empty() {
            productions.insert(lhs.clone(), kept);
        }
    }

    let mut reachable = BTreeSet::new();
    let mut stack = vec![grammar.start_symbol.clone()];
    reachable.insert(grammar.start_symbol.clone());
    while let Some(nt) = stack.pop() {
        for p in productions.get(&nt).into_iter().flatten() {
            for sym in &p.0 {
                if let GrammarSymbol::Nonterminal(n) = sym {
                    if reachable.insert(n.clone()) {
                        stack.push(n.clone());
                    }
                }
            }
        }
    }

    productions.retain(|nt, _| reachable.contains(nt));

    let mut terminals = BTreeSet::new();
    for rhss in productions.values() {
        for p in rhss {
            for sym in &p.0 {
                if let GrammarSymbol::Terminal(t) = sym {
                    if !matches!(t, Terminal::Epsilon) {
                        terminals.insert(t.clone());
                    }
                }
            }
        }
    }

    Grammar::new(reachable, terminals, productions, grammar.start_symbol.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::from_string;

    #[test]
    fn dragon_book_4_20_left_recursion_example() {
        // S -> A a | b ; A -> A c | S d | ε
        let grammar = from_string("S -> A 'a' | 'b'\nA -> A 'c' | S 'd' | ε").unwrap();
        let fixed = remove_left_recursion(&grammar).unwrap();

        // No production of any rewritten nonterminal immediately left-recurses on itself.
        for (lhs, prods) in &fixed.productions {
            for p in prods {
                if let Some(GrammarSymbol::Nonterminal(n)) = p.0.first() {
                    assert_ne!(n, lhs, "immediate left recursion remained on {lhs}");
                }
            }
        }
    }

    #[test]
    fn left_factor_splits_shared_prefix() {
        let grammar = from_string("S -> 'if' E 'then' S 'else' S | 'if' E 'then' S | 'a'\nE -> 'e'").unwrap();
        let factored = left_factor(&grammar).unwrap();
        let s_prods = factored.productions_of(&Nonterminal::new("S"));
        // 'if' now appears in exactly one alternative's first symbol.
        let if_count = s_prods
            .iter()
            .filter(|p| matches!(&p.0[0], GrammarSymbol::Terminal(Terminal::Plain(t)) if &**t == "if"))
            .count();
        assert_eq!(if_count, 1);
    }

    #[test]
    fn simplify_drops_self_loop_and_unreachable() {
        let grammar = from_string("S -> 'a'\nDead -> 'z'\nLoop -> Loop").unwrap();
        let simplified = simplify(&grammar).unwrap();
        assert!(!simplified.nonterminals.contains(&Nonterminal::new("Dead")));
        assert!(!simplified.nonterminals.contains(&Nonterminal::new("Loop")));
    }
}
