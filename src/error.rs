//! A single top-level error type wrapping every subsystem's own error, so a caller driving
//! the whole pipeline (parse a regex, build a lexer, parse a grammar, build tables, drive a
//! parse) can propagate with one `?` chain instead of matching on each stage individually.

use thiserror::Error;

use crate::definition::RegularDefinitionError;
use crate::grammar::driver::ParseError;
use crate::grammar::table::{LlConflict, TableError};
use crate::grammar::{GrammarError, GrammarSyntaxError};
use crate::lexer::{LexerBuildError, LexerCannotProduceToken};
use crate::regex::parse::RegexSyntaxError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    RegexSyntax(#[from] RegexSyntaxError),
    #[error(transparent)]
    RegularDefinition(#[from] RegularDefinitionError),
    #[error(transparent)]
    LexerBuild(#[from] LexerBuildError),
    #[error(transparent)]
    LexerRun(#[from] LexerCannotProduceToken),
    #[error(transparent)]
    GrammarSyntax(#[from] GrammarSyntaxError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    LlTable(#[from] LlConflict),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
