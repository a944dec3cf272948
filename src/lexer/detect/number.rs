use super::{advance_ucn, is_ident_nondigit, Detect, Status, Ucn};

/// Detects a `pp-number` as defined in section 6.4.8 of C17.
#[derive(Clone, Debug)]
pub(crate) struct Number {
    status: Status,
    state: State,
    ucn: Option<Ucn>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    /// A leading `.` was consumed, a digit must follow.
    Dot,
    Body,
    /// The last byte was `e`, `E`, `p` or `P`, so a sign may follow.
    Exponent,
}

impl Number {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            state: State::Start,
            ucn: None,
        }
    }
}

impl Detect for Number {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        if let Some(status) = advance_ucn(&mut self.ucn, byte) {
            self.status = status;
            return status;
        }

        self.status = match (self.state, byte) {
            (State::Start, b'.') => {
                self.state = State::Dot;
                Status::Incomplete
            }
            (State::Start | State::Dot, byte) if byte.is_ascii_digit() => {
                self.state = State::Body;
                Status::Match
            }
            (State::Start | State::Dot, _) => Status::Impossible,
            (State::Exponent, b'+' | b'-') => {
                self.state = State::Body;
                Status::Match
            }
            // Exponents go first because they are also `identifier-nondigit`s.
            (_, b'e' | b'E' | b'p' | b'P') => {
                self.state = State::Exponent;
                Status::Match
            }
            (_, byte) if byte == b'.' || byte.is_ascii_digit() || is_ident_nondigit(byte) => {
                self.state = State::Body;
                Status::Match
            }
            (_, b'\\') => {
                self.state = State::Body;
                self.ucn = Some(Ucn::after_backslash());
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
