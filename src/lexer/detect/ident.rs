use super::{advance_ucn, is_ident_nondigit, Detect, Status, Ucn};

/// Detects an `identifier` as defined in section 6.4.2 of C17.
#[derive(Clone, Debug)]
pub(crate) struct Ident {
    status: Status,
    /// Whether at least one `identifier-nondigit` has been consumed.
    started: bool,
    ucn: Option<Ucn>,
}

impl Ident {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            started: false,
            ucn: None,
        }
    }
}

impl Detect for Ident {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        self.status = if let Some(status) = advance_ucn(&mut self.ucn, byte) {
            status
        } else if is_ident_nondigit(byte) || (self.started && byte.is_ascii_digit()) {
            Status::Match
        } else if byte == b'\\' {
            self.ucn = Some(Ucn::after_backslash());
            Status::Incomplete
        } else {
            Status::Impossible
        };

        if self.status == Status::Match {
            self.started = true;
        }
        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
