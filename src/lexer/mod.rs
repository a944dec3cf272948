//! All functions related to lexing.
//!
//! Tokens are recognized by running one incremental [`detect`]or per kind of token in parallel
//! over the input, one byte at a time. The longest prefix accepted by any detector becomes the
//! next token (maximal munch), and ties are broken by the order of the detectors in a
//! [`Bundle`].
pub(crate) mod detect;
mod token;

#[cfg(test)]
mod tests;

use tracing::trace;

pub use token::{Token, TokenKind};

use crate::{buffer::TokenBuffer, span::Span};

use self::detect::{Comment, Detect, Header, Ident, Literal, Number, Punct, Single, Status};

/// Check if `byte` is white-space for the purpose of separating preprocessing tokens.
pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

/// Tokenize a buffer that already went through translation phases 1 and 2.
///
/// This never fails: bytes that cannot start any token are skipped.
pub fn tokenize(source: &[u8]) -> TokenBuffer {
    let mut lexer = Lexer {
        rest: source,
        offset: 0,
    };

    let mut buffer = TokenBuffer::default();
    buffer.start_line();
    let mut after_whitespace = false;

    while let Some(&byte) = lexer.rest.first() {
        if is_whitespace(byte) {
            after_whitespace = true;
            if byte == b'\n' {
                buffer.start_line();
            }
            lexer = lexer.advance(1);
            continue;
        }

        let include = buffer.current_line().is_include_prefix(source);
        match lexer.next_token(include, after_whitespace) {
            Ok((rest, token)) => {
                // A `/*` that is not a comment can only be a comment that never ends.
                if token.text(source) == b"/" && rest.rest.first() == Some(&b'*') {
                    trace!("unterminated comment at offset {}", lexer.offset);
                    buffer.set_unterminated_comment(lexer.offset);
                }
                after_whitespace = false;
                buffer.push(token);
                lexer = rest;
            }
            Err(Reject) => {
                // Every non-white-space byte is a valid single character token, so this only
                // happens if that detector is taken out of the bundle.
                trace!("skipping byte {:#04x} at offset {}", byte, lexer.offset);
                lexer = lexer.advance(1);
            }
        }
    }

    buffer.strip_comments()
}

type Result<'a, T> = std::result::Result<(Lexer<'a>, T), Reject>;
#[cfg_attr(test, derive(Debug))]
struct Reject;

#[derive(Clone, Copy)]
struct Lexer<'a> {
    /// The remaining region to be tokenized.
    rest: &'a [u8],
    /// The start of `rest`, relative to the start of the region being tokenized.
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Produce the longest token at the start of the remaining region.
    fn next_token(self, include: bool, after_whitespace: bool) -> Result<'a, Token> {
        let mut bundle = Bundle::new(include);
        let mut longest = None;

        for (i, byte) in self.bytes().enumerate() {
            match bundle.advance(byte) {
                Progress::Match(kind) => longest = Some((i + 1, kind)),
                Progress::Incomplete => {}
                Progress::Impossible => break,
            }
        }

        let Some((len, kind)) = longest else {
            return Err(Reject);
        };

        let token = Token {
            kind,
            span: self.get_span(len),
            after_whitespace,
        };
        Ok((self.advance(len), token))
    }

    /// Move this lexer to the desired index.
    ///
    /// Panic if the index is out of bounds.
    fn advance(self, index: usize) -> Self {
        let (head, rest) = self.rest.split_at(index);
        Self {
            offset: self.offset + head.len(),
            rest,
        }
    }

    /// Return a new span that starts at the current offset and has `len` length.
    fn get_span(&self, len: usize) -> Span {
        Span {
            lo: self.offset,
            hi: self.offset + len,
        }
    }

    /// Return an iterator over the remaining bytes.
    fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.rest.iter().copied()
    }
}

/// One detector of a [`Bundle`].
#[derive(Clone, Debug)]
enum Detector {
    Header(Header),
    Comment(Comment),
    Ident(Ident),
    Number(Number),
    Char(Literal),
    Str(Literal),
    Punct(Punct),
    Any(Single),
}

impl Detector {
    fn kind(&self) -> TokenKind {
        match self {
            Detector::Header(_) => TokenKind::Header,
            Detector::Comment(_) => TokenKind::Comment,
            Detector::Ident(_) => TokenKind::Ident,
            Detector::Number(_) => TokenKind::Number,
            Detector::Char(_) => TokenKind::Char,
            Detector::Str(_) => TokenKind::Str,
            Detector::Punct(_) => TokenKind::Punct,
            Detector::Any(_) => TokenKind::Any,
        }
    }

    fn detect(&mut self) -> &mut dyn Detect {
        match self {
            Detector::Header(detector) => detector,
            Detector::Comment(detector) => detector,
            Detector::Ident(detector) => detector,
            Detector::Number(detector) => detector,
            Detector::Char(detector) | Detector::Str(detector) => detector,
            Detector::Punct(detector) => detector,
            Detector::Any(detector) => detector,
        }
    }
}

/// The aggregated status of a [`Bundle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Progress {
    /// At least one detector matches, the first one in priority order has this kind.
    Match(TokenKind),
    Incomplete,
    Impossible,
}

/// Every detector that may recognize the token starting at some position, in priority order.
struct Bundle {
    detectors: [Detector; 7],
}

impl Bundle {
    /// Build a bundle for a new token. Right after `# include`, a quoted sequence is a
    /// `header-name` and never a `string-literal`; everywhere else `header-name`s are not
    /// recognized at all.
    fn new(include: bool) -> Self {
        let quoted = if include {
            Detector::Header(Header::new())
        } else {
            Detector::Str(Literal::string())
        };

        Self {
            detectors: [
                quoted,
                Detector::Comment(Comment::new()),
                Detector::Ident(Ident::new()),
                Detector::Number(Number::new()),
                Detector::Char(Literal::character()),
                Detector::Punct(Punct::new()),
                Detector::Any(Single::new()),
            ],
        }
    }

    fn advance(&mut self, byte: u8) -> Progress {
        let mut progress = Progress::Impossible;
        for detector in &mut self.detectors {
            match detector.detect().advance(byte) {
                Status::Match => {
                    if !matches!(progress, Progress::Match(_)) {
                        progress = Progress::Match(detector.kind());
                    }
                }
                Status::Incomplete => {
                    if progress == Progress::Impossible {
                        progress = Progress::Incomplete;
                    }
                }
                Status::Impossible => {}
            }
        }
        progress
    }
}
