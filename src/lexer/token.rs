use derive_more::IsVariant;

use crate::span::Span;

/// A preprocessing token, as defined in the section 6.4 of C17.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Whether white-space (or a comment) separates this token from the previous one.
    pub after_whitespace: bool,
}

impl Token {
    /// The bytes of this token inside the buffer it was tokenized from.
    pub fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        &source[self.span.lo..self.span.hi]
    }
}

/// The differen kinds of preprocessing tokens. The description for each kind can be found at the
/// section 6.4 of C17 using the identifier shown in the documentation of each variant of this
/// `enum`.
///
/// Comments are not preprocessing tokens, but the tokenizer recognizes them like any other token
/// so they cannot be split by a shorter match. They are removed before the tokens are returned,
/// leaving only their effect on [`Token::after_whitespace`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IsVariant)]
pub enum TokenKind {
    /// A `header-name`.
    Header,
    /// An `identifier`.
    Ident,
    /// A `pp-number`.
    Number,
    /// A `character-constant`.
    Char,
    /// A `string-literal`.
    Str,
    /// A `punctuator`.
    Punct,
    /// Any non-white-space character that cannot be one of the above.
    Any,
    /// A comment.
    Comment,
}
