use super::{Detect, Status};

/// Detects a `header-name` as defined in section 6.4.7 of C17.
#[derive(Clone, Debug)]
pub(crate) struct Header {
    status: Status,
    state: State,
    /// Number of bytes consumed between the delimiters, which must not be zero.
    chars: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    /// Inside `<...>`, `slash` is true if the last byte was `/`.
    Angle { slash: bool },
    /// Inside `"..."`, `slash` is true if the last byte was `/`.
    Quote { slash: bool },
    Closed,
}

impl Header {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            state: State::Start,
            chars: 0,
        }
    }
}

impl Detect for Header {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        self.status = match (self.state, byte) {
            (State::Start, b'<') => {
                self.state = State::Angle { slash: false };
                Status::Incomplete
            }
            (State::Start, b'"') => {
                self.state = State::Quote { slash: false };
                Status::Incomplete
            }
            (State::Angle { .. }, b'>') | (State::Quote { .. }, b'"') if self.chars > 0 => {
                self.state = State::Closed;
                Status::Match
            }
            // new-line characters are not valid `h-char`s nor `q-char`s, and the sequence between
            // the delimiters cannot be empty.
            (State::Angle { .. }, b'\n' | b'>') | (State::Quote { .. }, b'\n' | b'"') => {
                Status::Impossible
            }
            // if we find `'`, `\`, `"` (only for `h-char`s), `//`, or `/*`, the behavior is
            // undefined. We will reject.
            (State::Angle { .. }, b'\'' | b'\\' | b'"') | (State::Quote { .. }, b'\'' | b'\\') => {
                Status::Impossible
            }
            (State::Angle { slash: true } | State::Quote { slash: true }, b'/' | b'*') => {
                Status::Impossible
            }
            (State::Angle { .. }, byte) => {
                self.chars += 1;
                self.state = State::Angle {
                    slash: byte == b'/',
                };
                Status::Incomplete
            }
            (State::Quote { .. }, byte) => {
                self.chars += 1;
                self.state = State::Quote {
                    slash: byte == b'/',
                };
                Status::Incomplete
            }
            _ => Status::Impossible,
        };

        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
