use std::ops::Deref;

use crate::lexer::Token;

/// A buffer of [`Token`]s, split into logical lines.
#[derive(Clone, Debug, Default)]
pub struct TokenBuffer {
    rest: Vec<Token>,
    /// The index of the first token of every line.
    lines: Vec<usize>,
    /// The offset of a block comment that was still open at the end of the input.
    unterminated_comment: Option<usize>,
}

impl TokenBuffer {
    /// Push a [`Token`] into the buffer.
    pub(crate) fn push(&mut self, token: Token) {
        self.rest.push(token)
    }

    /// Begin a new line. Tokens pushed from now on belong to it.
    pub(crate) fn start_line(&mut self) {
        self.lines.push(self.rest.len())
    }

    pub(crate) fn set_unterminated_comment(&mut self, offset: usize) {
        self.unterminated_comment.get_or_insert(offset);
    }

    /// The offset of a block comment missing its closing `*/`, if any.
    pub fn unterminated_comment(&self) -> Option<usize> {
        self.unterminated_comment
    }

    /// The tokens of the line being tokenized.
    pub(crate) fn current_line(&self) -> &TokenSlice {
        let start = self.lines.last().copied().unwrap_or_default();
        TokenSlice::new(&self.rest[start..])
    }

    /// Iterate over the logical lines of this buffer. Lines without tokens are included.
    pub fn lines(&self) -> impl Iterator<Item = &TokenSlice> + '_ {
        self.lines.iter().enumerate().map(|(i, &start)| {
            let end = self.lines.get(i + 1).copied().unwrap_or(self.rest.len());
            TokenSlice::new(&self.rest[start..end])
        })
    }

    /// Remove every comment, marking the token that follows a comment as preceded by white-space.
    pub(crate) fn strip_comments(self) -> TokenBuffer {
        let mut output = TokenBuffer {
            unterminated_comment: self.unterminated_comment,
            ..TokenBuffer::default()
        };

        let mut lines = self.lines.iter().peekable();
        let mut after_comment = false;
        for (i, mut token) in self.rest.into_iter().enumerate() {
            while lines.next_if(|&&start| start == i).is_some() {
                output.start_line();
            }
            if token.kind.is_comment() {
                after_comment = true;
                continue;
            }
            token.after_whitespace |= after_comment;
            after_comment = false;
            output.push(token);
        }
        for _ in lines {
            output.start_line();
        }

        output
    }
}

impl Deref for TokenBuffer {
    type Target = TokenSlice;

    fn deref(&self) -> &Self::Target {
        TokenSlice::new(&self.rest)
    }
}

/// A slice of [`Token`]s.
#[repr(transparent)]
pub struct TokenSlice {
    rest: [Token],
}

impl TokenSlice {
    fn new(tokens: &[Token]) -> &TokenSlice {
        let ptr = tokens as *const [Token] as *const TokenSlice;
        // SAFETY: This pointer is valid because `TokenSlice` and `[Token]` have the same layout.
        unsafe { &*ptr }
    }

    /// Check if these tokens, ignoring comments, are exactly `# include`. The next token of such
    /// a line is lexed as a `header-name` instead of a `string-literal`.
    pub(crate) fn is_include_prefix(&self, source: &[u8]) -> bool {
        let mut tokens = self.rest.iter().filter(|token| !token.kind.is_comment());
        matches!(
            (tokens.next(), tokens.next(), tokens.next()),
            (Some(hash), Some(name), None)
                if hash.kind.is_punct()
                    && matches!(hash.text(source), b"#" | b"%:")
                    && name.kind.is_ident()
                    && name.text(source) == b"include"
        )
    }
}

impl Deref for TokenSlice {
    type Target = [Token];

    fn deref(&self) -> &Self::Target {
        &self.rest
    }
}
