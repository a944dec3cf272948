use super::{advance_ucn, Detect, Status, Ucn};

/// Detects an `escape-sequence` as defined in section 6.4.4.4 of C17.
///
/// Octal and hexadecimal escape sequences are maximal: they keep matching while digits follow, so
/// the enclosing literal detector only learns the sequence is over when it sees `Impossible`
/// right after a `Match`.
#[derive(Clone, Debug)]
pub(crate) struct Escape {
    status: Status,
    state: State,
    ucn: Option<Ucn>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Backslash,
    Kind,
    Octal { digits: u8 },
    HexFirst,
    Hex,
    Ucn,
    Done,
}

/// Check if `byte` can follow a `\` in a `simple-escape-sequence`.
pub(crate) fn is_simple_escape(byte: u8) -> bool {
    matches!(
        byte,
        b'\'' | b'"' | b'?' | b'\\' | b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v'
    )
}

impl Escape {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            state: State::Backslash,
            ucn: None,
        }
    }
}

impl Detect for Escape {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        if let Some(status) = advance_ucn(&mut self.ucn, byte) {
            if status == Status::Match {
                self.state = State::Done;
            }
            self.status = status;
            return status;
        }

        self.status = match (self.state, byte) {
            (State::Backslash, b'\\') => {
                self.state = State::Kind;
                Status::Incomplete
            }
            (State::Kind, byte) if is_simple_escape(byte) => {
                self.state = State::Done;
                Status::Match
            }
            (State::Kind, b'0'..=b'7') => {
                self.state = State::Octal { digits: 1 };
                Status::Match
            }
            (State::Kind, b'x') => {
                self.state = State::HexFirst;
                Status::Incomplete
            }
            (State::Kind, b'u' | b'U') => {
                let mut ucn = Ucn::after_backslash();
                ucn.advance(byte);
                self.ucn = Some(ucn);
                self.state = State::Ucn;
                Status::Incomplete
            }
            (State::Octal { digits }, b'0'..=b'7') if digits < 3 => {
                self.state = State::Octal { digits: digits + 1 };
                Status::Match
            }
            (State::HexFirst | State::Hex, byte) if byte.is_ascii_hexdigit() => {
                self.state = State::Hex;
                Status::Match
            }
            _ => Status::Impossible,
        };

        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
