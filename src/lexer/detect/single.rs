use super::{Detect, Status};

/// Detects "each non-white-space character that cannot be one of the above", the last kind of
/// `preprocessing-token` in section 6.4 of C17. It always matches exactly one byte.
#[derive(Clone, Debug)]
pub(crate) struct Single {
    status: Status,
    seen: bool,
}

impl Single {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            seen: false,
        }
    }
}

impl Detect for Single {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        self.status = if self.seen || crate::lexer::is_whitespace(byte) {
            Status::Impossible
        } else {
            Status::Match
        };
        self.seen = true;

        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
