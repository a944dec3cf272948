//! A preprocessing library for the C programming language.
//!
//! This library was written trying to follow the ISO/IEC 9899:2018 standard, also known as C17.
//! Because of this, the documentation contains references to specific senctions of this document
//! whose most recent free draft can be found
//! [here](https://web.archive.org/web/20181230041359if_/http://www.open-std.org/jtc1/sc22/wg14/www/abq/c17_updated_proposed_fdis.pdf).
//!
//! Source bytes go through translation phases 1 and 2 ([`phases`]), are cut into preprocessing
//! tokens by a set of incremental detectors ([`tokenize`]) and are then preprocessed line by line
//! ([`Preprocessor`]). Directives and the constant expressions of `#if` are parsed by a generic
//! Earley parser ([`earley`]) using the grammars of [`grammar`] and evaluated by [`eval`].

mod buffer;
mod config;
mod diagnostics;
pub mod earley;
mod error;
pub mod eval;
pub mod grammar;
mod lexer;
pub mod phases;
mod preprocessor;
mod span;

pub use buffer::{TokenBuffer, TokenSlice};
pub use config::{Config, MacroDefinition};
pub use diagnostics::{Diagnostics, Warning};
pub use earley::parse;
pub use error::{Error, ErrorKind, Location, Result};
pub use eval::{eval_constant_expression, Value};
pub use lexer::{tokenize, Token, TokenKind};
pub use preprocessor::{
    HideSet, Line, Macro, MacroKind, MacroTable, Output, PpToken, Preprocessor,
};
pub use span::Span;

/// Preprocess `source` with the default [`Config`].
pub fn preprocess(source: &[u8]) -> Result<Output> {
    Preprocessor::new(Config::default())?.preprocess_bytes("<input>", source)
}
