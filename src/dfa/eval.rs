//! Step-by-step DFA simulation: exactly one current state instead of a set, since a DFA has
//! at most one transition per element (§4.6).

use crate::dfa::Dfa;
use crate::element::Element;

#[derive(Clone, Debug)]
pub struct DfaEvaluator<'a> {
    dfa: &'a Dfa,
    current: Option<usize>,
}

impl<'a> DfaEvaluator<'a> {
    pub fn new(dfa: &'a Dfa) -> Self {
        DfaEvaluator {
            dfa,
            current: Some(dfa.start),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.current.is_some_and(|s| self.dfa.states[s].accepting)
    }

    pub fn is_dead(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_state(&self) -> Option<usize> {
        self.current
    }

    pub fn step(&mut self, elem: &Element) -> Option<()> {
        let state = self.current?;
        let next = self.dfa.states[state].transitions.get(elem).copied();
        self.current = next;
        next.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parse;

    #[test]
    fn evaluator_dies_once_and_stays_dead() {
        let dfa = parse("ab").unwrap().to_nfa().to_dfa();
        let mut eval = dfa.evaluator();
        assert!(eval.step(&Element::Literal('z')).is_none());
        assert!(eval.is_dead());
        assert!(eval.step(&Element::Literal('a')).is_none());
    }
}
