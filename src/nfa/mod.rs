//! # Nondeterministic finite automata
//!
//! A [Nfa] is an arena of [NfaState]s with ε-moves, built by [crate::regex::Regex::to_nfa]
//! (Thompson's construction, §4.3) or composed directly by [crate::lexer] when joining
//! several pattern NFAs under one root. The only further operation it needs to support is
//! [Nfa::to_dfa], subset construction (§4.4).

pub mod eval;

use crate::automaton::{bfs_reachable, relabeling};
use crate::dfa::{Dfa, DfaState};
use crate::element::{Alphabet, Element};
use eval::NfaEvaluator;
use std::collections::{BTreeSet, HashMap};

/// One state of a [Nfa]: its id (its index into [Nfa::states]), whether it accepts, and its
/// outgoing transitions keyed by [Element] (ε-edges are filed under [Element::Empty]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NfaState {
    pub id: usize,
    pub accepting: bool,
    pub transitions: HashMap<Element, Vec<usize>>,
}

impl NfaState {
    pub fn new(id: usize, accepting: bool) -> Self {
        NfaState {
            id,
            accepting,
            transitions: HashMap::new(),
        }
    }

    pub fn epsilon_targets(&self) -> &[usize] {
        self.transitions
            .get(&Element::Empty)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nfa {
    pub alphabet: Alphabet,
    pub states: Vec<NfaState>,
    pub start: usize,
}

impl Nfa {
    /// The ε-closure of a set of states: `set` plus every state reachable from it by
    /// following only ε-edges, to a fixed point.
    pub fn epsilon_closure(&self, set: &BTreeSet<usize>) -> BTreeSet<usize> {
        let mut closure = set.clone();
        let mut frontier: Vec<usize> = set.iter().copied().collect();
        while let Some(state) = frontier.pop() {
            for &target in self.states[state].epsilon_targets() {
                if closure.insert(target) {
                    frontier.push(target);
                }
            }
        }
        closure
    }

    /// The set of states directly reachable from `set` on `elem` (no closure included).
    pub fn mov(&self, set: &BTreeSet<usize>, elem: &Element) -> BTreeSet<usize> {
        set.iter()
            .filter_map(|&s| self.states[s].transitions.get(elem))
            .flatten()
            .copied()
            .collect()
    }

    pub fn ending_states<'a>(&'a self, set: &'a BTreeSet<usize>) -> impl Iterator<Item = usize> + 'a {
        set.iter().copied().filter(|&s| self.states[s].accepting)
    }

    pub fn is_accepting_set(&self, set: &BTreeSet<usize>) -> bool {
        self.ending_states(set).next().is_some()
    }

    pub fn evaluator(&self) -> NfaEvaluator<'_> {
        NfaEvaluator::new(self)
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut eval = self.evaluator();
        for c in input.chars() {
            if eval.step(&Element::Literal(c)).is_none() {
                return false;
            }
        }
        eval.is_accepting()
    }

    /// Drops states unreachable from the start state and renumbers the remainder in BFS
    /// order (§4.5).
    pub fn relabel(&self) -> Nfa {
        let order = bfs_reachable(self.start, |s| {
            self.states[s]
                .transitions
                .values()
                .flatten()
                .copied()
                .collect()
        });
        let map = relabeling(&order);

        let states = order
            .iter()
            .map(|&old| {
                let old_state = &self.states[old];
                let transitions = old_state
                    .transitions
                    .iter()
                    .map(|(elem, targets)| {
                        (
                            elem.clone(),
                            targets.iter().filter_map(|t| map.get(t).copied()).collect(),
                        )
                    })
                    .collect();
                NfaState {
                    id: map[&old],
                    accepting: old_state.accepting,
                    transitions,
                }
            })
            .collect();

        Nfa {
            alphabet: self.alphabet.clone(),
            states,
            start: 0,
        }
    }

    /// Subset construction (§4.4): builds a DFA whose states are ε-closed sets of this NFA's
    /// states, exploring reachable sets breadth-first from the closure of the start state.
    pub fn to_dfa(&self) -> Dfa {
        const LOG_EVERY: usize = 32;

        let start_set = self.epsilon_closure(&BTreeSet::from([self.start]));

        let mut set_to_idx: HashMap<BTreeSet<usize>, usize> = HashMap::new();
        let mut states: Vec<DfaState> = Vec::new();
        let mut queue = vec![start_set.clone()];
        set_to_idx.insert(start_set.clone(), 0);
        states.push(DfaState::new(0, self.is_accepting_set(&start_set)));

        let mut pending_transitions: Vec<(usize, Element, BTreeSet<usize>)> = Vec::new();

        while let Some(set) = queue.pop() {
            let from_idx = set_to_idx[&set];
            for elem in self.alphabet.iter() {
                if matches!(elem, Element::Empty) {
                    continue;
                }
                let moved = self.mov(&set, elem);
                if moved.is_empty() {
                    continue;
                }
                let closed = self.epsilon_closure(&moved);
                if !set_to_idx.contains_key(&closed) {
                    let idx = states.len();
                    set_to_idx.insert(closed.clone(), idx);
                    states.push(DfaState::new(idx, self.is_accepting_set(&closed)));
                    queue.push(closed.clone());
                    log::trace!("subset construction: discovered dfa state {idx} from nfa set {closed:?}");
                    if idx % LOG_EVERY == 0 {
                        log::debug!("subset construction: {idx} dfa states discovered so far");
                    }
                }
                pending_transitions.push((from_idx, elem.clone(), closed));
            }
        }

        for (from_idx, elem, closed) in pending_transitions {
            let to_idx = set_to_idx[&closed];
            states[from_idx].transitions.insert(elem, to_idx);
        }

        log::debug!("subset construction: finished with {} dfa states", states.len());

        Dfa {
            alphabet: self.alphabet.without_references(),
            states,
            start: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parse;

    #[test]
    fn relabel_drops_unreachable_states() {
        let mut nfa = parse("a").unwrap().to_nfa();
        let dangling = nfa.states.len();
        nfa.states.push(NfaState::new(dangling, true));
        let relabeled = nfa.relabel();
        assert!(relabeled.states.len() < nfa.states.len());
        assert!(relabeled.accepts("a"));
    }

    #[test]
    fn subset_construction_preserves_language() {
        let nfa = parse("(a|b)*abb").unwrap().to_nfa();
        let dfa = nfa.to_dfa();
        assert!(dfa.accepts("abb"));
        assert!(dfa.accepts("aaaaaabb"));
        assert!(!dfa.accepts("abbb"));
        assert!(!dfa.accepts(""));
    }
}
