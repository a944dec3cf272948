//! Incremental recognizers for every kind of preprocessing token.
//!
//! A detector is fed the bytes of a candidate token one at a time and answers, after each byte,
//! whether the bytes seen so far form a complete token of its kind ([`Status::Match`]), could
//! still become one ([`Status::Incomplete`]) or never will ([`Status::Impossible`]). Detectors
//! never look ahead: everything they need to know about the past lives in their own state.
//!
//! `Impossible` is final. Once a detector reports it, every following byte gets the same answer
//! until a fresh detector is built for the next token. `Match` is not final: feeding one more byte
//! either extends the token or turns the detector `Impossible`, which is how the tokenizer finds
//! the longest match.
mod comment;
mod escape;
mod header;
mod ident;
mod literal;
mod number;
mod punct;
mod single;
mod ucn;


pub(crate) use comment::Comment;
pub(crate) use escape::{is_simple_escape, Escape};
pub(crate) use header::Header;
pub(crate) use ident::Ident;
pub(crate) use literal::Literal;
pub(crate) use number::Number;
pub(crate) use punct::Punct;
pub(crate) use single::Single;
pub(crate) use ucn::Ucn;

/// The answer of a detector after consuming a byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Status {
    Impossible,
    Incomplete,
    Match,
}

/// An incremental recognizer for one lexical category.
pub(crate) trait Detect {
    /// Consume one byte and return the updated status.
    fn advance(&mut self, byte: u8) -> Status;

    /// The status after the last consumed byte.
    fn status(&self) -> Status;
}

/// Check if `byte` is an `identifier-nondigit` that is not a universal character name, as defined
/// in section 6.4.2 of C17.
pub(crate) fn is_ident_nondigit(byte: u8) -> bool {
    byte == b'_' || byte.is_ascii_alphabetic()
}

/// Check if `code_point` may be spelled by a universal character name, following section 6.4.3
/// of C17.
pub(crate) fn is_acceptable_code_point(code_point: u32) -> bool {
    matches!(code_point, 0x24 | 0x40 | 0x60) || (0xA0..=0x10FFFF).contains(&code_point)
}

/// Feed a byte into an optional universal character name being recognized inside a larger token.
///
/// Returns `None` if there is no pending universal character name, otherwise the status of the
/// enclosing token, clearing `pending` once the name is complete.
pub(crate) fn advance_ucn(pending: &mut Option<Ucn>, byte: u8) -> Option<Status> {
    let ucn = pending.as_mut()?;
    let status = match ucn.advance(byte) {
        Status::Incomplete => Status::Incomplete,
        Status::Impossible => Status::Impossible,
        Status::Match => {
            let accepted = ucn.code_point().is_some_and(is_acceptable_code_point);
            *pending = None;
            if accepted {
                Status::Match
            } else {
                Status::Impossible
            }
        }
    };
    Some(status)
}
