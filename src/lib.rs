//! # compiler-core
//!
//! A compiler front-end core: regular expressions compiled through Thompson's
//! construction and subset construction into DFAs, a longest-match lexer engine built on
//! top of that automaton machinery, and context-free grammar tooling — FIRST/FOLLOW,
//! left-recursion removal, left-factoring, LR(0)/LR(1) item sets, and SLR(1)/LALR(1)/
//! canonical-LR(1) table construction with LL(1) and shift-reduce drivers.
//!
//! ## Pipeline
//!
//! ```rust
//! use compiler_core::definition::RegularDefinition;
//! use compiler_core::regex::parse::parse;
//!
//! let digit = parse("[0-9]+").unwrap();
//! let nfa = digit.to_nfa();
//! let dfa = nfa.to_dfa();
//! assert!(dfa.accepts("42"));
//! assert!(!dfa.accepts("4a"));
//!
//! let defs = RegularDefinition::new(vec![]).unwrap();
//! let _ = defs; // definitions are only needed once a rule references {a_name}
//! ```
//!
//! See [lexer] for tokenizing with several rules at once, and [grammar] for parsing a
//! stream of tokens against a context-free grammar.

pub mod automaton;
pub mod definition;
pub mod dfa;
pub mod element;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod nfa;
pub mod regex;

#[cfg(test)]
mod tests;
