use super::{Detect, Escape, Status};

/// Detects a `character-constant` (section 6.4.4.4 of C17) or a `string-literal` (section 6.4.5
/// of C17), depending on the quote it is built with.
///
/// Both share the same structure: an optional encoding prefix, an opening quote, a sequence of
/// characters and escape sequences, and a closing quote. Escape sequences are recognized by an
/// owned [`Escape`] detector whose status is folded into the status of the literal.
#[derive(Clone, Debug)]
pub(crate) struct Literal {
    status: Status,
    quote: u8,
    state: State,
    escape: Option<Escape>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Nothing consumed yet.
    Start,
    /// A `u` was consumed, it could be the start of `u8`.
    U,
    /// A complete prefix was consumed, the quote must follow.
    Prefixed,
    /// Inside the quotes, `empty` is true if nothing was consumed after the opening quote.
    Body { empty: bool },
    Closed,
}

impl Literal {
    /// A detector for character constants.
    pub(crate) fn character() -> Self {
        Self::new(b'\'')
    }

    /// A detector for string literals.
    pub(crate) fn string() -> Self {
        Self::new(b'"')
    }

    fn new(quote: u8) -> Self {
        Self {
            status: Status::Incomplete,
            quote,
            state: State::Start,
            escape: None,
        }
    }

    fn body(&mut self, byte: u8, empty: bool) -> Status {
        match byte {
            // A character constant cannot be empty.
            byte if byte == self.quote && (!empty || self.quote == b'"') => {
                self.state = State::Closed;
                Status::Match
            }
            b'\\' => {
                let mut escape = Escape::new();
                escape.advance(byte);
                self.escape = Some(escape);
                self.state = State::Body { empty: false };
                Status::Incomplete
            }
            byte if byte == self.quote || byte == b'\n' => Status::Impossible,
            _ => {
                self.state = State::Body { empty: false };
                Status::Incomplete
            }
        }
    }
}

impl Detect for Literal {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        if let Some(escape) = &mut self.escape {
            let before = escape.status();
            match escape.advance(byte) {
                Status::Impossible if before == Status::Match => {
                    // The escape sequence ended at the previous byte, this one belongs to the
                    // literal itself.
                    self.escape = None;
                }
                Status::Impossible => {
                    self.status = Status::Impossible;
                    return self.status;
                }
                _ => return self.status,
            }
        }

        self.status = match (self.state, byte) {
            (State::Start, b'u') => {
                self.state = State::U;
                Status::Incomplete
            }
            (State::Start, b'L' | b'U') | (State::U, b'8') => {
                self.state = State::Prefixed;
                Status::Incomplete
            }
            (State::Start | State::U | State::Prefixed, byte) if byte == self.quote => {
                self.state = State::Body { empty: true };
                Status::Incomplete
            }
            (State::Body { empty }, byte) => self.body(byte, empty),
            _ => Status::Impossible,
        };

        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
