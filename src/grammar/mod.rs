//! # Grammars
//!
//! The context-free grammar model of §4.8: [Terminal]s and [Nonterminal]s, [Production]s
//! (ordered right-hand sides), and the [Grammar] that owns them plus its distinguished
//! `start_symbol`. Every instance gets its own ε and `$` (end-of-input) terminals via
//! [Terminal::Epsilon]/[Terminal::EndOfInput] rather than process-wide singletons, since two
//! grammars are otherwise independent.
//!
//! `{name}` action terminals (§9's first open question) are carried through as ordinary
//! terminals that can never be produced by a lexer and so can never SHIFT; no further
//! run-time semantics are guessed for them.

pub mod driver;
pub mod item;
pub mod sets;
pub mod table;
pub mod transform;

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Plain(Rc<str>),
    /// A `{name}` action terminal: never matched by input, so it can never SHIFT.
    Action(Rc<str>),
    Epsilon,
    EndOfInput,
}

impl Terminal {
    pub fn plain(name: impl Into<Rc<str>>) -> Self {
        Terminal::Plain(name.into())
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Terminal::Action(_))
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Plain(s) => write!(f, "'{s}'"),
            Terminal::Action(s) => write!(f, "{{{s}}}"),
            Terminal::Epsilon => write!(f, "ε"),
            Terminal::EndOfInput => write!(f, "$"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonterminal(pub Rc<str>);

impl Nonterminal {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Nonterminal(name.into())
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GrammarSymbol {
    Terminal(Terminal),
    Nonterminal(Nonterminal),
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(t) => write!(f, "{t}"),
            GrammarSymbol::Nonterminal(n) => write!(f, "{n}"),
        }
    }
}

/// An ordered right-hand side. `[Terminal::Epsilon]` as the sole symbol denotes the empty
/// production explicitly, rather than an empty `Vec` (§4.8's "empty production is explicit
/// ε" convention, carried over from the original).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Production(pub Vec<GrammarSymbol>);

impl Production {
    pub fn epsilon() -> Self {
        Production(vec![GrammarSymbol::Terminal(Terminal::Epsilon)])
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [GrammarSymbol::Terminal(Terminal::Epsilon)]
        )
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sym) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{sym}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("nonterminal '{0}' has no productions")]
    NoProductions(Nonterminal),
    #[error("production for '{0}' references undeclared nonterminal '{1}'")]
    UndeclaredNonterminal(Nonterminal, Nonterminal),
    #[error("grammar text is malformed: {0}")]
    Malformed(String),
}

/// A context-free grammar: its terminal/nonterminal vocabularies, its productions (one list
/// per left-hand-side nonterminal) and its start symbol.
#[derive(Clone, Debug)]
pub struct Grammar {
    pub terminals: BTreeSet<Terminal>,
    pub nonterminals: BTreeSet<Nonterminal>,
    pub productions: BTreeMap<Nonterminal, Vec<Production>>,
    pub start_symbol: Nonterminal,
    suffix_counter: Cell<u32>,
}

impl Grammar {
    pub fn new(
        nonterminals: BTreeSet<Nonterminal>,
        terminals: BTreeSet<Terminal>,
        productions: BTreeMap<Nonterminal, Vec<Production>>,
        start_symbol: Nonterminal,
    ) -> Result<Self, GrammarError> {
        for nt in &nonterminals {
            if productions.get(nt).map_or(true, Vec::is_empty) {
                return Err(GrammarError::NoProductions(nt.clone()));
            }
        }
        for (lhs, rhss) in &productions {
            for rhs in rhss {
                for sym in &rhs.0 {
                    if let GrammarSymbol::Nonterminal(n) = sym {
                        if !nonterminals.contains(n) {
                            return Err(GrammarError::UndeclaredNonterminal(lhs.clone(), n.clone()));
                        }
                    }
                }
            }
        }
        Ok(Grammar {
            terminals,
            nonterminals,
            productions,
            start_symbol,
            suffix_counter: Cell::new(0),
        })
    }

    pub fn productions_of(&self, nt: &Nonterminal) -> &[Production] {
        self.productions.get(nt).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every `(lhs, production)` pair, in a stable deterministic order (by nonterminal, then
    /// declaration order), the order LR item construction and table building iterate in.
    pub fn all_productions(&self) -> impl Iterator<Item = (&Nonterminal, &Production)> {
        self.productions
            .iter()
            .flat_map(|(lhs, rhss)| rhss.iter().map(move |rhs| (lhs, rhs)))
    }

    /// Derives a fresh nonterminal name from `base` by appending a monotonically increasing
    /// suffix, guaranteed not to collide with any name already in the grammar (Dragon Book
    /// Algorithm 4.19's `A'`, `A''`, ... naming, generalized to a numeric suffix so it never
    /// runs out).
    pub fn derive_from(&self, base: &Nonterminal) -> Nonterminal {
        loop {
            let n = self.suffix_counter.get();
            self.suffix_counter.set(n + 1);
            let candidate = Nonterminal::new(format!("{}_{n}", base.0));
            if !self.nonterminals.contains(&candidate) {
                return candidate;
            }
        }
    }
}

pub mod parse;
pub use parse::{from_string, GrammarSyntaxError};
