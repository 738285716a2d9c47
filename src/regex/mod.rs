//! # Regular expressions
//!
//! A [Regex] is a parse tree over the extended regex dialect of §4.1: concatenation,
//! `|` alternation, `(...)` grouping, `[...]` character classes, `\w \d \s \W \D \S \t \n`
//! shorthands, `.` (any printable but newline) and the quantifiers `* + ? {n} {n,} {n,m}`.
//!
//! The only operation a standalone [Regex] supports is [Regex::to_nfa], which runs
//! Thompson's construction (§4.3) to build an ε-NFA. From there, [crate::nfa::Nfa::to_dfa]
//! builds a DFA by subset construction (§4.4).
//!
//! ```
//! use compiler_core::regex::parse;
//!
//! let digits = parse("\\d+").unwrap();
//! let nfa = digits.to_nfa();
//! assert!(nfa.accepts("123"));
//! assert!(!nfa.accepts(""));
//! ```

pub mod parse;

use crate::element::{Alphabet, Element};
use crate::nfa::{Nfa, NfaState};

pub use parse::{parse, RegexSyntaxError};

/// A quantifier's repetition bound, `{low, high}` with `high = None` meaning unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quant {
    pub low: u32,
    pub high: Option<u32>,
}

impl Quant {
    pub const STAR: Quant = Quant { low: 0, high: None };
    pub const PLUS: Quant = Quant { low: 1, high: None };
    pub const OPTIONAL: Quant = Quant {
        low: 0,
        high: Some(1),
    };
}

/// The regex parse tree, typed by operation per §4.1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegexTree {
    /// A single atomic element: a literal character, an escaped special character, or a
    /// `{name}` reference into the enclosing regular definition.
    Identity(Element),
    Concat(Vec<RegexTree>),
    Union(Vec<RegexTree>),
    Group(Box<RegexTree>),
    Quantifier(Box<RegexTree>, Quant),
    /// A `[...]` character class, already expanded to the union of literal elements it
    /// denotes (§4.1 step 2). Kept as a distinct node (rather than folded into [RegexTree::Union])
    /// so the parse tree still records that this was written as a class.
    CharClass(Vec<Element>),
}

/// A regular expression: its parse tree plus the alphabet of elements it mentions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Regex {
    pub tree: RegexTree,
    pub alphabet: Alphabet,
}

impl Regex {
    pub fn new(tree: RegexTree) -> Self {
        let alphabet = Self::collect_alphabet(&tree);
        Regex { tree, alphabet }
    }

    fn collect_alphabet(tree: &RegexTree) -> Alphabet {
        let mut elements = Vec::new();
        Self::walk_elements(tree, &mut elements);
        Alphabet::from_iter(elements)
    }

    fn walk_elements(tree: &RegexTree, out: &mut Vec<Element>) {
        match tree {
            RegexTree::Identity(e) => out.push(e.clone()),
            RegexTree::Concat(items) | RegexTree::Union(items) => {
                items.iter().for_each(|t| Self::walk_elements(t, out))
            }
            RegexTree::Group(inner) | RegexTree::Quantifier(inner, _) => {
                Self::walk_elements(inner, out)
            }
            RegexTree::CharClass(elems) => out.extend(elems.iter().cloned()),
        }
    }

    /// Runs Thompson's construction (§4.3) to build an ε-NFA for this regex. Any `{name}`
    /// reference left unresolved (i.e. this regex wasn't parsed as part of a
    /// [crate::definition::RegularDefinition]) is treated as [Element::Unmatchable].
    pub fn to_nfa(&self) -> Nfa {
        build_nfa(&self.tree, &|_| None)
    }
}

/// Resolves `{name}` references while building a NFA: given a name, returns the referenced
/// regex's parse tree (used by [crate::definition::RegularDefinition] to implement the
/// "earlier names are atoms of later regexes" rule of §4.2).
pub(crate) type Resolver<'a> = dyn Fn(&str) -> Option<&'a RegexTree> + 'a;

struct Builder {
    states: Vec<NfaState>,
}

struct Fragment {
    start: usize,
    accept: usize,
}

impl Builder {
    fn new_state(&mut self) -> usize {
        let idx = self.states.len();
        self.states.push(NfaState::new(idx, false));
        idx
    }

    fn add_edge(&mut self, from: usize, on: Element, to: usize) {
        self.states[from].transitions.entry(on).or_default().push(to);
    }
}

pub(crate) fn build_nfa(tree: &RegexTree, resolve: &Resolver) -> Nfa {
    let mut builder = Builder { states: Vec::new() };
    let frag = build_fragment(&mut builder, tree, resolve);
    builder.states[frag.accept].accepting = true;

    let mut alphabet = Alphabet::new();
    for state in &builder.states {
        for elem in state.transitions.keys() {
            if !matches!(elem, Element::Empty) {
                alphabet.insert(elem.clone());
            }
        }
    }

    Nfa {
        alphabet,
        states: builder.states,
        start: frag.start,
    }
}

fn epsilon_fragment(b: &mut Builder) -> Fragment {
    let start = b.new_state();
    let accept = b.new_state();
    b.add_edge(start, Element::Empty, accept);
    Fragment { start, accept }
}

fn build_fragment(b: &mut Builder, tree: &RegexTree, resolve: &Resolver) -> Fragment {
    match tree {
        RegexTree::Identity(Element::Reference(name)) => match resolve(name) {
            Some(referenced) => build_fragment(b, referenced, resolve),
            None => build_fragment(b, &RegexTree::Identity(Element::Unmatchable), resolve),
        },
        RegexTree::Identity(Element::Empty) => epsilon_fragment(b),
        RegexTree::Identity(Element::Unmatchable) => {
            // A start state with no outgoing edges: unreachable unless wrapped in a Union
            // offering another path, per §4.3.
            let start = b.new_state();
            let accept = b.new_state();
            Fragment { start, accept }
        }
        RegexTree::Identity(elem) => {
            let start = b.new_state();
            let accept = b.new_state();
            b.add_edge(start, elem.clone(), accept);
            Fragment { start, accept }
        }
        RegexTree::CharClass(elems) => {
            if elems.is_empty() {
                return build_fragment(b, &RegexTree::Identity(Element::Unmatchable), resolve);
            }
            let start = b.new_state();
            let accept = b.new_state();
            for elem in elems {
                let mid_start = b.new_state();
                let mid_accept = b.new_state();
                b.add_edge(mid_start, elem.clone(), mid_accept);
                b.add_edge(start, Element::Empty, mid_start);
                b.add_edge(mid_accept, Element::Empty, accept);
            }
            Fragment { start, accept }
        }
        RegexTree::Group(inner) => build_fragment(b, inner, resolve),
        RegexTree::Concat(items) => {
            if items.is_empty() {
                return epsilon_fragment(b);
            }
            let mut iter = items.iter();
            let mut acc = build_fragment(b, iter.next().unwrap(), resolve);
            for item in iter {
                let next = build_fragment(b, item, resolve);
                b.add_edge(acc.accept, Element::Empty, next.start);
                acc = Fragment {
                    start: acc.start,
                    accept: next.accept,
                };
            }
            acc
        }
        RegexTree::Union(items) => {
            let start = b.new_state();
            let accept = b.new_state();
            for item in items {
                let frag = build_fragment(b, item, resolve);
                b.add_edge(start, Element::Empty, frag.start);
                b.add_edge(frag.accept, Element::Empty, accept);
            }
            Fragment { start, accept }
        }
        RegexTree::Quantifier(inner, quant) => build_quantified(b, inner, *quant, resolve),
    }
}

fn concat_fragments(b: &mut Builder, mut frags: Vec<Fragment>) -> Fragment {
    if frags.is_empty() {
        return epsilon_fragment(b);
    }
    let mut acc = frags.remove(0);
    for next in frags {
        b.add_edge(acc.accept, Element::Empty, next.start);
        acc = Fragment {
            start: acc.start,
            accept: next.accept,
        };
    }
    acc
}

/// Builds `inner?` (zero-or-one), the `{0,1}` case of §4.3.
fn build_optional(b: &mut Builder, inner: &RegexTree, resolve: &Resolver) -> Fragment {
    let frag = build_fragment(b, inner, resolve);
    let start = b.new_state();
    let accept = b.new_state();
    b.add_edge(start, Element::Empty, frag.start);
    b.add_edge(start, Element::Empty, accept);
    b.add_edge(frag.accept, Element::Empty, accept);
    Fragment { start, accept }
}

/// Builds `inner*` (zero-or-more), the `{0,∞}` case of §4.3.
fn build_star(b: &mut Builder, inner: &RegexTree, resolve: &Resolver) -> Fragment {
    let frag = build_fragment(b, inner, resolve);
    let start = b.new_state();
    let accept = b.new_state();
    b.add_edge(start, Element::Empty, frag.start);
    b.add_edge(start, Element::Empty, accept);
    b.add_edge(frag.accept, Element::Empty, frag.start);
    b.add_edge(frag.accept, Element::Empty, accept);
    Fragment { start, accept }
}

/// Builds an optional chain of up to `count` repeats of `inner`, i.e. `(inner(inner(...)?)?)?`,
/// the recursive `{0,m}` construction of §4.3.
fn build_optional_chain(b: &mut Builder, inner: &RegexTree, count: u32, resolve: &Resolver) -> Fragment {
    if count == 0 {
        return epsilon_fragment(b);
    }
    let head = build_fragment(b, inner, resolve);
    let tail = build_optional_chain(b, inner, count - 1, resolve);
    let chained = concat_fragments(b, vec![head, tail]);

    let start = b.new_state();
    let accept = b.new_state();
    b.add_edge(start, Element::Empty, chained.start);
    b.add_edge(start, Element::Empty, accept);
    b.add_edge(chained.accept, Element::Empty, accept);
    Fragment { start, accept }
}

fn build_quantified(b: &mut Builder, inner: &RegexTree, quant: Quant, resolve: &Resolver) -> Fragment {
    match quant {
        Quant { low: 0, high: None } => build_star(b, inner, resolve),
        Quant {
            low: 0,
            high: Some(1),
        } => build_optional(b, inner, resolve),
        Quant {
            low: 1,
            high: Some(1),
        } => build_fragment(b, inner, resolve),
        Quant { low, high: None } => {
            let mut all: Vec<_> = (0..low).map(|_| build_fragment(b, inner, resolve)).collect();
            all.push(build_star(b, inner, resolve));
            concat_fragments(b, all)
        }
        Quant { low, high: Some(h) } if h <= low => {
            let mandatory: Vec<_> = (0..low).map(|_| build_fragment(b, inner, resolve)).collect();
            concat_fragments(b, mandatory)
        }
        Quant { low, high: Some(h) } => {
            let mut all: Vec<_> = (0..low).map(|_| build_fragment(b, inner, resolve)).collect();
            all.push(build_optional_chain(b, inner, h - low, resolve));
            concat_fragments(b, all)
        }
    }
}

impl RegexTree {
    /// Renders the tree back to the surface syntax. Not guaranteed to reproduce the exact
    /// original text (character classes are expanded to their members) but always an
    /// equivalent expression.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        Self::write(self, &mut out);
        out
    }

    fn write(tree: &RegexTree, out: &mut String) {
        match tree {
            RegexTree::Identity(Element::Literal(c)) => {
                if "(){}[]|*+?.\\".contains(*c) {
                    out.push('\\');
                }
                out.push(*c);
            }
            RegexTree::Identity(Element::Empty) => out.push('ε'),
            RegexTree::Identity(Element::Unmatchable) => out.push('∅'),
            RegexTree::Identity(Element::Reference(name)) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            RegexTree::Concat(items) => items.iter().for_each(|t| Self::write(t, out)),
            RegexTree::Union(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    Self::write(item, out);
                }
                out.push(')');
            }
            RegexTree::Group(inner) => {
                out.push('(');
                Self::write(inner, out);
                out.push(')');
            }
            RegexTree::Quantifier(inner, q) => {
                Self::write(inner, out);
                match q {
                    Quant { low: 0, high: None } => out.push('*'),
                    Quant { low: 1, high: None } => out.push('+'),
                    Quant {
                        low: 0,
                        high: Some(1),
                    } => out.push('?'),
                    Quant { low, high: None } => out.push_str(&format!("{{{low},}}")),
                    Quant { low, high: Some(h) } if low == h => out.push_str(&format!("{{{low}}}")),
                    Quant { low, high: Some(h) } => out.push_str(&format!("{{{low},{h}}}")),
                }
            }
            RegexTree::CharClass(elems) => {
                out.push('[');
                for elem in elems {
                    if let Element::Literal(c) = elem {
                        out.push(*c);
                    }
                }
                out.push(']');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_concat_accepts_only_itself() {
        let regex = parse("ab").unwrap();
        let nfa = regex.to_nfa();
        assert!(nfa.accepts("ab"));
        assert!(!nfa.accepts("a"));
        assert!(!nfa.accepts("abb"));
    }

    #[test]
    fn star_accepts_empty_and_repeats() {
        let regex = parse("a*").unwrap();
        let nfa = regex.to_nfa();
        assert!(nfa.accepts(""));
        assert!(nfa.accepts("aaaaa"));
    }

    #[test]
    fn bounded_quantifier_respects_upper_bound() {
        let regex = parse("a{2,3}").unwrap();
        let nfa = regex.to_nfa();
        assert!(!nfa.accepts("a"));
        assert!(nfa.accepts("aa"));
        assert!(nfa.accepts("aaa"));
        assert!(!nfa.accepts("aaaa"));
    }

    #[test]
    fn dragon_book_example_a_or_b_star_abb() {
        let regex = parse("(a|b)*abb").unwrap();
        let nfa = regex.to_nfa();
        assert!(nfa.accepts("abb"));
        assert!(nfa.accepts("aaaaaabb"));
        assert!(!nfa.accepts("bb"));
        assert!(!nfa.accepts("ababa"));
    }
}
