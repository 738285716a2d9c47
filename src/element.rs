//! Hashable language atoms shared by the regex parse tree and the automata built from it.
//!
//! An [Element] is the unit an [Alphabet] is made of and the key an automaton transition is
//! filed under. [Element::Empty] only ever appears as a transition key (an ε-edge on a NFA);
//! it is never a member of an [Alphabet].

use std::collections::HashSet;
use std::rc::Rc;

/// A single atom of the language described by a regular expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// A single literal character.
    Literal(char),
    /// ε - matches the empty string. Only used as a NFA transition key, never as an
    /// alphabet member.
    Empty,
    /// An atom no input can match. Produced by an empty character class (`[^\x00-\x{10FFFF}]`
    /// when every code point is excluded), kept so automaton construction stays well-formed
    /// instead of special-casing "no language here".
    Unmatchable,
    /// A reference to another named regex inside the same [RegularDefinition](crate::definition::RegularDefinition),
    /// written `{name}` in the surface syntax. Resolved away (by recursing into the
    /// referenced parse tree) before or during NFA construction; never appears in a
    /// finished automaton's alphabet.
    Reference(Rc<str>),
}

impl Element {
    pub fn is_reference(&self) -> bool {
        matches!(self, Element::Reference(_))
    }
}

/// An unordered set of [Element]s, closed under union.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alphabet(HashSet<Element>);

impl Alphabet {
    pub fn new() -> Self {
        Self(HashSet::new())
    }

    pub fn from_iter(iter: impl IntoIterator<Item = Element>) -> Self {
        Self(iter.into_iter().collect())
    }

    pub fn insert(&mut self, elem: Element) -> bool {
        self.0.insert(elem)
    }

    pub fn contains(&self, elem: &Element) -> bool {
        self.0.contains(elem)
    }

    pub fn union(&self, other: &Alphabet) -> Alphabet {
        Alphabet(self.0.union(&other.0).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.0.iter()
    }

    /// Drops elements whose value is a dangling regex reference, per §4.7 step 5 of the
    /// lexer construction recipe (references are resolved away, never part of a finished
    /// alphabet).
    pub fn without_references(&self) -> Alphabet {
        Alphabet(self.0.iter().filter(|e| !e.is_reference()).cloned().collect())
    }
}

impl FromIterator<Element> for Alphabet {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Alphabet(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_deduplicated() {
        let a = Alphabet::from_iter([Element::Literal('a'), Element::Literal('b')]);
        let b = Alphabet::from_iter([Element::Literal('b'), Element::Literal('c')]);
        let u = a.union(&b);
        assert_eq!(u.len(), 3);
    }

    #[test]
    fn references_are_stripped() {
        let a = Alphabet::from_iter([
            Element::Literal('a'),
            Element::Reference(Rc::from("digit")),
        ]);
        assert_eq!(a.without_references().len(), 1);
    }
}
