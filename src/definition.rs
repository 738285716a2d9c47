//! # Regular definitions
//!
//! A [RegularDefinition] is an ordered, named list of regexes (§4.2) where a later regex may
//! reference an earlier one by name, written `{name}` in its surface syntax. References only
//! ever point backwards: `digit -> [0-9]` then `number -> {digit}+` is valid, the reverse
//! order is a [RegularDefinitionError::ForwardReference].
//!
//! After cross-referencing, each regex's recorded [Alphabet] is repaired to be its own
//! literal alphabet unioned with every name defined before it, whether or not that regex
//! actually uses each one — this is the invariant the lexer's alphabet bookkeeping (§4.7)
//! relies on when it unions regular-definition alphabets together.

use crate::element::{Alphabet, Element};
use crate::nfa::Nfa;
use crate::regex::{Regex, RegexTree};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegularDefinitionError {
    #[error("regular definition '{0}' is defined more than once")]
    DuplicateName(Rc<str>),
    #[error("regular definition '{referencing}' references unknown name '{reference}'")]
    UnknownReference { referencing: Rc<str>, reference: Rc<str> },
    #[error("regular definition '{referencing}' references '{reference}', which is defined at or after it")]
    ForwardReference { referencing: Rc<str>, reference: Rc<str> },
}

struct Entry {
    name: Rc<str>,
    regex: Regex,
}

pub struct RegularDefinition {
    entries: Vec<Entry>,
    index_of: HashMap<Rc<str>, usize>,
}

impl RegularDefinition {
    /// Builds a regular definition from an ordered `(name, regex)` list, validating that
    /// every `{name}` reference used points strictly backwards, then repairing each regex's
    /// alphabet per the module doc.
    pub fn new(entries: Vec<(Rc<str>, Regex)>) -> Result<Self, RegularDefinitionError> {
        let mut index_of = HashMap::new();
        for (i, (name, _)) in entries.iter().enumerate() {
            if index_of.insert(name.clone(), i).is_some() {
                return Err(RegularDefinitionError::DuplicateName(name.clone()));
            }
        }

        for (name, regex) in &entries {
            Self::check_references(name, &regex.tree, &index_of, index_of[name])?;
        }

        let mut entries: Vec<Entry> = entries
            .into_iter()
            .map(|(name, regex)| Entry { name, regex })
            .collect();

        for i in 0..entries.len() {
            entries[i].regex.alphabet = Self::repaired_alphabet(&entries, i);
        }

        Ok(RegularDefinition { entries, index_of })
    }

    fn check_references(
        referencing: &Rc<str>,
        tree: &RegexTree,
        index_of: &HashMap<Rc<str>, usize>,
        own_index: usize,
    ) -> Result<(), RegularDefinitionError> {
        match tree {
            RegexTree::Identity(Element::Reference(name)) => match index_of.get(name) {
                None => Err(RegularDefinitionError::UnknownReference {
                    referencing: referencing.clone(),
                    reference: name.clone(),
                }),
                Some(&idx) if idx >= own_index => Err(RegularDefinitionError::ForwardReference {
                    referencing: referencing.clone(),
                    reference: name.clone(),
                }),
                Some(_) => Ok(()),
            },
            RegexTree::Identity(_) | RegexTree::CharClass(_) => Ok(()),
            RegexTree::Concat(items) | RegexTree::Union(items) => items
                .iter()
                .try_for_each(|t| Self::check_references(referencing, t, index_of, own_index)),
            RegexTree::Group(inner) | RegexTree::Quantifier(inner, _) => {
                Self::check_references(referencing, inner, index_of, own_index)
            }
        }
    }

    /// The alphabet of entry `i`, repaired to its own literal elements unioned with every
    /// name defined strictly before it (§4.2's cross-referencing contract).
    fn repaired_alphabet(entries: &[Entry], i: usize) -> Alphabet {
        let mut alphabet = entries[i].regex.alphabet.without_references();
        for earlier in &entries[..i] {
            alphabet.insert(Element::Reference(earlier.name.clone()));
        }
        alphabet
    }

    pub fn names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.entries.iter().map(|e| &e.name)
    }

    pub fn get(&self, name: &str) -> Option<&Regex> {
        self.index_of.get(name).map(|&i| &self.entries[i].regex)
    }

    fn tree_at(&self, idx: usize) -> &RegexTree {
        &self.entries[idx].regex.tree
    }

    /// Builds the NFA for the named entry, resolving any `{name}` references by recursing
    /// into the referenced entry's parse tree (§4.3's reference-resolution rule).
    pub fn build_nfa(&self, name: &str) -> Option<Nfa> {
        let idx = *self.index_of.get(name)?;
        let resolve = move |n: &str| self.index_of.get(n).map(|&i| self.tree_at(i));
        Some(crate::regex::build_nfa(self.tree_at(idx), &resolve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parse;

    fn def(pairs: &[(&str, &str)]) -> Result<RegularDefinition, RegularDefinitionError> {
        let entries = pairs
            .iter()
            .map(|(n, r)| (Rc::from(*n), parse(r).unwrap()))
            .collect();
        RegularDefinition::new(entries)
    }

    #[test]
    fn reference_resolves_and_builds_a_working_nfa() {
        let rd = def(&[("digit", "[0-9]"), ("number", "{digit}+")]).unwrap();
        let nfa = rd.build_nfa("number").unwrap();
        assert!(nfa.accepts("123"));
        assert!(!nfa.accepts(""));
        assert!(!nfa.accepts("12a"));
    }

    #[test]
    fn forward_reference_is_rejected() {
        let err = def(&[("number", "{digit}+"), ("digit", "[0-9]")]).unwrap_err();
        assert!(matches!(err, RegularDefinitionError::ForwardReference { .. }));
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let err = def(&[("number", "{digit}+")]).unwrap_err();
        assert!(matches!(err, RegularDefinitionError::UnknownReference { .. }));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = def(&[("digit", "[0-9]"), ("digit", "[0-9]")]).unwrap_err();
        assert!(matches!(err, RegularDefinitionError::DuplicateName(_)));
    }

    #[test]
    fn alphabet_is_repaired_to_include_earlier_names() {
        let rd = def(&[("digit", "[0-9]"), ("letter", "[a-z]"), ("ident", "{letter}{digit}*")])
            .unwrap();
        let ident_alphabet = &rd.get("ident").unwrap().alphabet;
        assert!(ident_alphabet.contains(&Element::Reference(Rc::from("digit"))));
        assert!(ident_alphabet.contains(&Element::Reference(Rc::from("letter"))));
    }
}
