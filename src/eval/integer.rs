use crate::error::ErrorKind;

use super::Value;

/// Parse a `pp-number` as an `integer-constant`, section 6.4.4.1 of C17.
///
/// Every signed type becomes `intmax_t` and every unsigned type `uintmax_t`. A constant without
/// an unsigned suffix that does not fit in `intmax_t` is unsigned.
pub fn parse_integer(text: &[u8]) -> Result<Value, ErrorKind> {
    let invalid = || ErrorKind::InvalidInteger(String::from_utf8_lossy(text).into_owned());

    let (radix, body) = match text {
        [b'0', b'x' | b'X', rest @ ..] => (16, rest),
        [b'0', rest @ ..] => (8, rest),
        _ => (10, text),
    };

    if is_floating(radix, text) {
        return Err(ErrorKind::Disallowed("floating constant"));
    }

    let digits = body
        .iter()
        .position(|byte| !byte.is_ascii_hexdigit() || (radix != 16 && byte.is_ascii_alphabetic()))
        .unwrap_or(body.len());
    let (digits, suffix) = body.split_at(digits);
    if radix == 16 && digits.is_empty() {
        return Err(invalid());
    }
    let unsigned = parse_suffix(suffix).ok_or_else(invalid)?;

    let mut value: u64 = 0;
    for &digit in digits {
        let digit = (digit as char).to_digit(radix).ok_or_else(invalid)?;
        value = value
            .checked_mul(u64::from(radix))
            .and_then(|value| value.checked_add(u64::from(digit)))
            .ok_or_else(|| ErrorKind::IntegerTooLarge(String::from_utf8_lossy(text).into_owned()))?;
    }

    match i64::try_from(value) {
        Ok(value) if !unsigned => Ok(Value::Signed(value)),
        _ => Ok(Value::Unsigned(value)),
    }
}

fn is_floating(radix: u32, text: &[u8]) -> bool {
    let exponent: &[u8] = if radix == 16 { b"pP" } else { b"eE" };
    text.iter()
        .any(|byte| *byte == b'.' || exponent.contains(byte))
}

/// Return whether an `integer-suffix` makes a constant unsigned, or `None` if it is not a suffix.
fn parse_suffix(suffix: &[u8]) -> Option<bool> {
    let (unsigned, rest) = match suffix {
        [b'u' | b'U', rest @ ..] => (true, rest),
        _ => (false, suffix),
    };
    let (long, rest) = match rest {
        [b'l', b'l', rest @ ..] | [b'L', b'L', rest @ ..] => (true, rest),
        [b'l' | b'L', rest @ ..] => (true, rest),
        _ => (false, rest),
    };
    match rest {
        [] => Some(unsigned),
        [b'u' | b'U'] if long && !unsigned => Some(true),
        _ => None,
    }
}
