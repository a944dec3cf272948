mod source_map;
pub(crate) use source_map::{FileId, SourceMap};

/// A region of a buffer handed to the tokenizer, in offsets of that buffer.
/// [`Token::text`](crate::lexer::Token::text) extracts the string representation of this region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}
