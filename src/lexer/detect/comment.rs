use super::{Detect, Status};

/// Detects a comment, as described in section 6.4.9 of C17.
///
/// The second byte selects the kind of comment: `//` comments match up to, but not including,
/// the next new-line, while `/*` comments only match once the closing `*/` is consumed.
#[derive(Clone, Debug)]
pub(crate) struct Comment {
    status: Status,
    state: State,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    Slash,
    Line,
    Block,
    /// Inside a block comment, right after a `*`.
    BlockStar,
    Closed,
}

impl Comment {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            state: State::Start,
        }
    }
}

impl Detect for Comment {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        self.status = match (self.state, byte) {
            (State::Start, b'/') => {
                self.state = State::Slash;
                Status::Incomplete
            }
            (State::Slash, b'/') => {
                self.state = State::Line;
                Status::Match
            }
            (State::Slash, b'*') => {
                self.state = State::Block;
                Status::Incomplete
            }
            (State::Line, b'\n') => Status::Impossible,
            (State::Line, _) => Status::Match,
            (State::Block | State::BlockStar, b'*') => {
                self.state = State::BlockStar;
                Status::Incomplete
            }
            (State::BlockStar, b'/') => {
                self.state = State::Closed;
                Status::Match
            }
            (State::Block | State::BlockStar, _) => {
                self.state = State::Block;
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
