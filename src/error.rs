//! Error types for the preprocessor.
//!
//! Every error in this module is fatal: it aborts the preprocessing run. Recoverable conditions
//! are reported as warnings through [`Diagnostics`](crate::Diagnostics) instead.

use std::{fmt, io, ops::Range};

use thiserror::Error;

/// The place in a source file a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based columns covered by the offending text.
    pub columns: Range<usize>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, columns: Range<usize>) -> Self {
        Self {
            file: file.into(),
            line,
            columns,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.columns.start)
    }
}

/// Preprocessor error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{location}: error: {kind}")]
    At { location: Location, kind: ErrorKind },
}

impl Error {
    /// The kind of a located error, if this is one.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Error::Io(_) => None,
            Error::At { kind, .. } => Some(kind),
        }
    }
}

/// Result type alias for the preprocessor.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go fatally wrong while preprocessing, without its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("invalid character constant {0}")]
    InvalidCharacterConstant(String),

    #[error("escape sequence out of range")]
    EscapeOutOfRange,

    #[error("character constant too long for its type")]
    CharacterConstantTooLong,

    #[error("{0} is not allowed in a preprocessor constant expression")]
    Disallowed(&'static str),

    #[error("invalid integer constant \"{0}\"")]
    InvalidInteger(String),

    #[error("integer constant \"{0}\" is too large")]
    IntegerTooLarge(String),

    #[error("division by zero in preprocessor expression")]
    DivisionByZero,

    #[error("could not parse constant expression")]
    UnparseableExpression,

    #[error("#if with no expression")]
    MissingExpression,

    #[error("parse tree is missing a {0}")]
    MissingTerminal(&'static str),

    #[error("invalid preprocessing directive")]
    InvalidDirective,

    #[error("#{0} without #if")]
    Unbalanced(&'static str),

    #[error("#{0} after #else")]
    AfterElse(&'static str),

    #[error("unterminated conditional directive")]
    UnterminatedConditional,

    #[error("#error {0}")]
    ErrorDirective(String),

    #[error("invalid #include, expected \"FILENAME\" or <FILENAME>")]
    InvalidInclude,

    #[error("'{0}' file not found")]
    IncludeNotFound(String),

    #[error("#include nested too deeply")]
    IncludeTooDeep,

    #[error("invalid #line directive")]
    InvalidLine,

    #[error("macro \"{name}\" passed {given} arguments, but takes {expected}")]
    ArgumentCount {
        name: String,
        given: usize,
        expected: usize,
    },

    #[error("unterminated invocation of macro \"{0}\"")]
    UnterminatedInvocation(String),

    #[error("pasting \"{0}\" and \"{1}\" does not give a valid preprocessing token")]
    InvalidPaste(String, String),

    #[error("'##' cannot appear at either end of a macro expansion")]
    PasteAtEdge,

    #[error("'#' is not followed by a macro parameter")]
    InvalidStringize,

    #[error("__VA_ARGS__ can only appear in the expansion of a variadic macro")]
    InvalidVaArgs,

    #[error("duplicate macro parameter \"{0}\"")]
    DuplicateParameter(String),

    #[error("\"{0}\" redefined with a different body")]
    Redefinition(String),

    #[error("\"{0}\" cannot be defined or undefined")]
    ReservedName(String),

    #[error("operator \"defined\" requires an identifier")]
    DefinedWithoutIdentifier,
}

impl ErrorKind {
    /// Attach a location to this error.
    pub fn at(self, location: Location) -> Error {
        Error::At {
            location,
            kind: self,
        }
    }
}
