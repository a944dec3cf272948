use std::{cell::RefCell, fmt};

use tracing::warn;

use crate::error::Location;

/// A non-fatal diagnostic. Preprocessing continues after it is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub location: Location,
    pub message: String,
}

impl Warning {
    pub fn new(message: impl ToString, location: Location) -> Self {
        Self {
            location,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: warning: {}", self.location, self.message)
    }
}

/// Collects the warnings of a preprocessing run.
///
/// This is the context object threaded through the preprocessor instead of global state. Warnings
/// can be pushed through a shared reference, so evaluators holding `&Diagnostics` can report them.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: RefCell<Vec<Warning>>,
}

impl Diagnostics {
    pub fn push(&self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.borrow_mut().push(warning);
    }

    /// Remove and return every warning collected so far.
    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.warnings.borrow_mut())
    }
}
