use std::{collections::BTreeSet, fmt, rc::Rc};

use crate::{
    earley::Scan,
    lexer::{self, Token, TokenKind},
    phases::{self, Normalized},
};

/// A preprocessing token detached from the buffer it was lexed from, so it can be moved around
/// by macro expansion.
#[derive(Clone, Debug)]
pub struct PpToken {
    pub kind: TokenKind,
    pub text: Vec<u8>,
    pub after_whitespace: bool,
    /// 1-based line of the token in its source file.
    pub line: usize,
    /// 1-based column of the token in its source file.
    pub column: usize,
    /// The macros that must not be expanded again inside this token.
    pub hideset: HideSet,
}

impl PpToken {
    pub fn new(kind: TokenKind, text: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            text: text.into(),
            after_whitespace: false,
            line: 0,
            column: 0,
            hideset: HideSet::default(),
        }
    }

    /// Detach `token` from the normalized buffer it was lexed from. `line_starts` are the line
    /// starts of the original source, used to compute the line and column of the token.
    pub(crate) fn from_token(token: &Token, source: &Normalized, line_starts: &[usize]) -> Self {
        let (line, column) =
            phases::line_column(line_starts, source.original_offset(token.span.lo));
        Self {
            kind: token.kind,
            text: token.text(&source.bytes).to_vec(),
            after_whitespace: token.after_whitespace,
            line,
            column,
            hideset: HideSet::default(),
        }
    }

    /// The spelling of this token with digraphs replaced by the punctuator they stand for.
    pub fn canonical(&self) -> &[u8] {
        if !self.kind.is_punct() {
            return &self.text;
        }
        match self.text.as_slice() {
            b"<:" => b"[",
            b":>" => b"]",
            b"<%" => b"{",
            b"%>" => b"}",
            b"%:" => b"#",
            b"%:%:" => b"##",
            text => text,
        }
    }

    pub fn is_ident(&self) -> bool {
        self.kind.is_ident()
    }

    pub fn is_punct(&self, spelling: &[u8]) -> bool {
        self.kind.is_punct() && self.canonical() == spelling
    }

    /// The spelling of this token as a `String`, for diagnostics.
    pub fn spelling(&self) -> String {
        String::from_utf8_lossy(&self.text).into_owned()
    }

    /// The number of columns this token covers.
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.column..self.column + self.text.len()
    }
}

/// Lex `source` as a single piece of text. New-lines are treated as white-space.
pub(crate) fn lex(source: &[u8]) -> Vec<PpToken> {
    let normalized = Normalized::identity(source);
    let line_starts = phases::line_starts(source);
    lexer::tokenize(source)
        .iter()
        .map(|token| PpToken::from_token(token, &normalized, &line_starts))
        .collect()
}

impl Scan for PpToken {
    fn is_literal(&self, literal: &[u8]) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Punct) && self.canonical() == literal
    }
}

impl fmt::Display for PpToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.text))
    }
}

/// The set of macro names a token is protected from, as in Prosser's expansion algorithm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HideSet(Rc<BTreeSet<Vec<u8>>>);

impl HideSet {
    pub fn contains(&self, name: &[u8]) -> bool {
        self.0.contains(name)
    }

    /// This set with `name` added.
    pub fn with(&self, name: &[u8]) -> HideSet {
        if self.contains(name) {
            return self.clone();
        }
        let mut names = (*self.0).clone();
        names.insert(name.to_vec());
        HideSet(Rc::new(names))
    }

    pub fn union(&self, other: &HideSet) -> HideSet {
        if other.0.is_subset(&self.0) {
            return self.clone();
        }
        HideSet(Rc::new(self.0.union(&other.0).cloned().collect()))
    }

    pub fn intersection(&self, other: &HideSet) -> HideSet {
        HideSet(Rc::new(self.0.intersection(&other.0).cloned().collect()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
