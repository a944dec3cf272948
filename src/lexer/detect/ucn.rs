use super::{Detect, Status};

/// Detects a `universal-character-name` as defined in section 6.4.3 of C17, decoding its code
/// point along the way.
///
/// Only the number of hexadecimal digits is checked here. Whether the code point may be written
/// with a universal character name depends on where it appears, so that check is left to the
/// enclosing detector (see [`is_acceptable_code_point`](super::is_acceptable_code_point)).
#[derive(Clone, Debug)]
pub(crate) struct Ucn {
    state: State,
    value: u32,
    status: Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Backslash,
    Letter,
    Digits { left: u8 },
    Done,
}

impl Ucn {
    /// A detector expecting the whole name, starting at its `\`.
    pub(crate) fn new() -> Self {
        Self {
            state: State::Backslash,
            value: 0,
            status: Status::Incomplete,
        }
    }

    /// A detector for a name whose `\` has already been consumed by the enclosing detector.
    pub(crate) fn after_backslash() -> Self {
        Self {
            state: State::Letter,
            ..Self::new()
        }
    }

    /// The decoded code point, once every digit has been seen.
    pub(crate) fn code_point(&self) -> Option<u32> {
        (self.state == State::Done).then_some(self.value)
    }
}

impl Detect for Ucn {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        self.status = match (self.state, byte) {
            (State::Backslash, b'\\') => {
                self.state = State::Letter;
                Status::Incomplete
            }
            (State::Letter, b'u') => {
                self.state = State::Digits { left: 4 };
                Status::Incomplete
            }
            (State::Letter, b'U') => {
                self.state = State::Digits { left: 8 };
                Status::Incomplete
            }
            (State::Digits { left }, byte) if byte.is_ascii_hexdigit() => {
                // `to_digit` cannot fail on an ASCII hexadecimal digit.
                let digit = char::from(byte).to_digit(16).unwrap_or_default();
                self.value = (self.value << 4) | digit;
                if left == 1 {
                    self.state = State::Done;
                    Status::Match
                } else {
                    self.state = State::Digits { left: left - 1 };
                    Status::Incomplete
                }
            }
            _ => Status::Impossible,
        };

        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
