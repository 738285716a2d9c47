//! # Lexer engine
//!
//! A [Lexer] joins several pattern NFAs (one per [LexerRule]) under a single fresh root via
//! ε-edges, the way a generated scanner composes its rules (§4.7). Tokenizing scans forward
//! from the current position, and at each position keeps consuming input until the
//! composite automaton dies, recording at every step which rule(s) are accepting there. It
//! then walks that history from the right: the longest accepted prefix wins, and among rules
//! tied at that length the one declared earliest (lowest priority number) wins.

use crate::definition::RegularDefinition;
use crate::element::Element;
use crate::nfa::Nfa;
use crate::regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// A table interned identifiers and literals are recorded into by rule actions, the way the
/// Dragon Book's `SymbolTable` backs an `id` rule's action.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, usize>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `lexeme`, returning its stable index (inserting it if this is the first time
    /// it's been seen).
    pub fn intern(&mut self, lexeme: &str) -> usize {
        if let Some(&idx) = self.entries.get(lexeme) {
            return idx;
        }
        let idx = self.order.len();
        self.entries.insert(lexeme.to_string(), idx);
        self.order.push(lexeme.to_string());
        idx
    }

    pub fn lookup(&self, idx: usize) -> Option<&str> {
        self.order.get(idx).map(String::as_str)
    }
}

pub type Action<T> = Rc<dyn Fn(&mut SymbolTable, &str) -> Option<T>>;

/// One lexical rule: a pattern and the action run on its matched lexeme. A rule's priority
/// for longest-match tie-breaking is its position in the rule list passed to [Lexer::build]
/// (earlier wins ties); a rule never mentioned at all carries no tie-break weight since it
/// never enters the composite automaton in the first place.
#[derive(Clone)]
pub struct LexerRule<T> {
    pub name: Rc<str>,
    pub pattern: Regex,
    pub action: Action<T>,
}

impl<T> LexerRule<T> {
    pub fn new(name: impl Into<Rc<str>>, pattern: Regex, action: Action<T>) -> Self {
        LexerRule {
            name: name.into(),
            pattern,
            action,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexerBuildError {
    #[error("no lexer rules were given")]
    NoRules,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no lexer rule matches the input at character offset {offset}")]
pub struct LexerCannotProduceToken {
    pub offset: usize,
}

/// The composite automaton built from every rule's pattern, plus the side-table mapping a
/// composite accepting state back to the rule it terminates (a "production state" in the
/// Dragon Book's terms).
pub struct Lexer<T> {
    composite: Nfa,
    production_of: HashMap<usize, usize>,
    rules: Vec<LexerRule<T>>,
}

impl<T> Lexer<T> {
    /// Builds the composite NFA from `rules`, resolving any `{name}` references against
    /// `definitions` (pass an empty [RegularDefinition] if no rule uses references).
    pub fn build(
        rules: Vec<LexerRule<T>>,
        definitions: &RegularDefinition,
    ) -> Result<Self, LexerBuildError> {
        if rules.is_empty() {
            return Err(LexerBuildError::NoRules);
        }

        let mut states = vec![crate::nfa::NfaState::new(0, false)];
        let mut production_of = HashMap::new();

        for (rule_idx, rule) in rules.iter().enumerate() {
            let resolve = |name: &str| definitions.get(name).map(|r| &r.tree);
            let sub = crate::regex::build_nfa(&rule.pattern.tree, &resolve);
            let offset = states.len();

            for sub_state in &sub.states {
                let mut transitions = HashMap::new();
                for (elem, targets) in &sub_state.transitions {
                    transitions.insert(
                        elem.clone(),
                        targets.iter().map(|t| t + offset).collect(),
                    );
                }
                let id = sub_state.id + offset;
                if sub_state.accepting {
                    production_of.insert(id, rule_idx);
                }
                states.push(crate::nfa::NfaState {
                    id,
                    accepting: sub_state.accepting,
                    transitions,
                });
            }

            states[0]
                .transitions
                .entry(Element::Empty)
                .or_default()
                .push(sub.start + offset);
        }

        let mut alphabet = crate::element::Alphabet::new();
        for state in &states {
            for elem in state.transitions.keys() {
                if !matches!(elem, Element::Empty) {
                    alphabet.insert(elem.clone());
                }
            }
        }

        let composite = Nfa {
            alphabet,
            states,
            start: 0,
        };

        Ok(Lexer {
            composite,
            production_of,
            rules,
        })
    }

    /// Tokenizes the entire input, per the longest-match / lowest-priority-wins loop of
    /// §4.7. Whitespace or other rules whose action returns `None` simply contribute no
    /// token; any position where no rule can extend the match at all is a
    /// [LexerCannotProduceToken] error.
    pub fn tokenize(&self, input: &str) -> Result<Vec<T>, LexerCannotProduceToken> {
        let mut symtab = SymbolTable::new();
        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let mut tokens = Vec::new();
        let mut pos = 0usize;

        while pos < chars.len() {
            let (rule_idx, match_len) = self.longest_match(&chars, pos).ok_or(LexerCannotProduceToken { offset: pos })?;

            let start_byte = chars[pos].0;
            let end_byte = chars
                .get(pos + match_len)
                .map(|&(b, _)| b)
                .unwrap_or(input.len());
            let lexeme = &input[start_byte..end_byte];

            if let Some(token) = (self.rules[rule_idx].action)(&mut symtab, lexeme) {
                tokens.push(token);
            }
            pos += match_len;
        }

        Ok(tokens)
    }

    /// Runs the composite automaton from `start`, recording at each step which rule(s) are
    /// live and accepting, then scans that history from the right for the longest match,
    /// breaking ties by lowest rule index.
    fn longest_match(&self, chars: &[(usize, char)], start: usize) -> Option<(usize, usize)> {
        let mut eval = self.composite.evaluator();
        let mut history: Vec<Option<usize>> = vec![self.best_rule_at(&eval)];

        let mut offset = 0;
        while start + offset < chars.len() {
            let (_, c) = chars[start + offset];
            if eval.step(&Element::Literal(c)).is_none() {
                break;
            }
            offset += 1;
            history.push(self.best_rule_at(&eval));
        }

        history
            .into_iter()
            .enumerate()
            .rev()
            .find_map(|(len, rule)| rule.map(|r| (r, len)))
            .filter(|&(_, len)| len > 0)
    }

    fn best_rule_at(&self, eval: &crate::nfa::eval::NfaEvaluator<'_>) -> Option<usize> {
        eval.accepting_states()
            .filter_map(|s| self.production_of.get(&s).copied())
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parse;

    #[derive(Debug, PartialEq, Eq, Clone)]
    enum Tok {
        If,
        Id(usize),
        Num(String),
        Ws,
    }

    fn build_if_id_num_lexer() -> Lexer<Tok> {
        let defs = RegularDefinition::new(vec![]).unwrap();
        let rules = vec![
            LexerRule::new(
                "if",
                parse("if").unwrap(),
                Rc::new(|_: &mut SymbolTable, _: &str| Some(Tok::If)) as Action<Tok>,
            ),
            LexerRule::new(
                "ws",
                parse("[ \\t\\n]+").unwrap(),
                Rc::new(|_: &mut SymbolTable, _: &str| None) as Action<Tok>,
            ),
            LexerRule::new(
                "num",
                parse("[0-9]+").unwrap(),
                Rc::new(|_: &mut SymbolTable, lex: &str| Some(Tok::Num(lex.to_string()))) as Action<Tok>,
            ),
            LexerRule::new(
                "id",
                parse("[a-z][a-z0-9]*").unwrap(),
                Rc::new(|st: &mut SymbolTable, lex: &str| Some(Tok::Id(st.intern(lex)))) as Action<Tok>,
            ),
        ];
        Lexer::build(rules, &defs).unwrap()
    }

    #[test]
    fn keyword_wins_over_identifier_on_exact_match() {
        let lexer = build_if_id_num_lexer();
        let tokens = lexer.tokenize("if").unwrap();
        assert_eq!(tokens, vec![Tok::If]);
    }

    #[test]
    fn longest_match_prefers_identifier_extending_past_keyword() {
        let lexer = build_if_id_num_lexer();
        let tokens = lexer.tokenize("iffy").unwrap();
        assert_eq!(tokens, vec![Tok::Id(0)]);
    }

    #[test]
    fn whitespace_is_skipped_and_tokens_are_separated() {
        let lexer = build_if_id_num_lexer();
        let tokens = lexer.tokenize("if  x12 34").unwrap();
        assert_eq!(tokens, vec![Tok::If, Tok::Id(0), Tok::Num("34".into())]);
    }

    #[test]
    fn unmatchable_input_is_an_error() {
        let lexer = build_if_id_num_lexer();
        let err = lexer.tokenize("x $").unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
