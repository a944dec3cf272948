use crate::{
    diagnostics::{Diagnostics, Warning},
    earley::{parse, ParseTree},
    error::{ErrorKind, Location},
    grammar::character::{grammar, Encoding, Rule, Tag},
    lexer::detect::is_acceptable_code_point,
};

use super::Value;

type Tree<'i> = ParseTree<'i, u8, Tag>;

/// One `c-char` of a character constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Unit {
    /// A source byte.
    Byte(u8),
    /// The value of an octal, hexadecimal or simple escape sequence.
    Numeric(u32),
    /// The code point named by a universal character name.
    CodePoint(u32),
}

/// Evaluate a `character-constant`, section 6.4.4.4 of C17.
pub fn evaluate_character(
    text: &[u8],
    diagnostics: &Diagnostics,
    location: &Location,
) -> Result<Value, ErrorKind> {
    let invalid = || ErrorKind::InvalidCharacterConstant(String::from_utf8_lossy(text).into_owned());

    let tree = parse(grammar(), Rule::CharacterConstant, text).ok_or_else(invalid)?;
    let Tag::Constant(encoding) = tree.tag else {
        return Err(invalid());
    };
    let sequence = tree
        .trees()
        .next()
        .ok_or(ErrorKind::MissingTerminal("c-char-sequence"))?;

    let units = sequence_units(sequence)?
        .into_iter()
        .map(escape_unit)
        .collect::<Result<Vec<_>, _>>()?;

    match encoding {
        Encoding::Plain => plain(&units, diagnostics, location),
        encoding => prefixed(encoding, &units),
    }
}

/// Decode a single escape sequence, without checking that the code point of a universal
/// character name is acceptable. Returns `None` if `text` is not an escape sequence or its value
/// does not fit in 32 bits.
pub fn decode_escape(text: &[u8]) -> Option<u32> {
    let tree = parse(grammar(), Rule::EscapeSequence, text)?;
    match unit(skip(&tree).ok()?).ok()? {
        Unit::Byte(byte) => Some(u32::from(byte)),
        Unit::Numeric(value) | Unit::CodePoint(value) => Some(value),
    }
}

/// Descend through the nodes that stand for their only child.
fn skip<'t, 'i>(mut tree: &'t Tree<'i>) -> Result<&'t Tree<'i>, ErrorKind> {
    while tree.tag == Tag::Next {
        tree = tree.tree(0).ok_or(ErrorKind::MissingTerminal("c-char"))?;
    }
    Ok(tree)
}

/// The characters of a `c-char-sequence` in order. Sequences are chains linked through their
/// first child.
fn sequence_units(sequence: &Tree<'_>) -> Result<Vec<Unit>, ErrorKind> {
    let missing = || ErrorKind::MissingTerminal("c-char");

    let mut units = Vec::new();
    let mut node = skip(sequence)?;
    loop {
        match node.tag {
            Tag::Then => {
                units.push(unit(skip(node.tree(1).ok_or_else(missing)?)?)?);
                node = node.tree(0).ok_or_else(missing)?;
            }
            Tag::First => {
                units.push(unit(skip(node.tree(0).ok_or_else(missing)?)?)?);
                break;
            }
            _ => return Err(missing()),
        }
    }
    units.reverse();
    Ok(units)
}

fn unit(node: &Tree<'_>) -> Result<Unit, ErrorKind> {
    let leaves = node.leaves();
    let digits = |skip: usize, radix: u32| {
        leaves[skip.min(leaves.len())..]
            .iter()
            .try_fold(0u32, |value, &&digit| {
                let digit = (digit as char).to_digit(radix)?;
                value.checked_mul(radix)?.checked_add(digit)
            })
            .ok_or(ErrorKind::EscapeOutOfRange)
    };

    Ok(match node.tag {
        Tag::Plain => Unit::Byte(**leaves.first().ok_or(ErrorKind::MissingTerminal("c-char"))?),
        Tag::Simple => {
            let byte = leaves.get(1).ok_or(ErrorKind::MissingTerminal("escape-sequence"))?;
            Unit::Numeric(simple_escape(**byte))
        }
        Tag::Octal => Unit::Numeric(digits(1, 8)?),
        Tag::Hex => Unit::Numeric(digits(2, 16)?),
        Tag::Ucn => Unit::CodePoint(digits(2, 16)?),
        _ => return Err(ErrorKind::MissingTerminal("c-char")),
    })
}

/// Reject universal character names that cannot appear in a character constant.
fn escape_unit(unit: Unit) -> Result<Unit, ErrorKind> {
    match unit {
        Unit::CodePoint(code_point)
            if !is_acceptable_code_point(code_point) || char::from_u32(code_point).is_none() =>
        {
            Err(ErrorKind::EscapeOutOfRange)
        }
        unit => Ok(unit),
    }
}

fn simple_escape(byte: u8) -> u32 {
    u32::from(match byte {
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0c,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0b,
        // `\'`, `\"`, `\?` and `\\` stand for the character itself.
        byte => byte,
    })
}

/// An integer character constant has type `int`. A single character is converted from `char`,
/// which is signed. Several characters are combined, the first one in the most significant byte.
fn plain(units: &[Unit], diagnostics: &Diagnostics, location: &Location) -> Result<Value, ErrorKind> {
    let mut bytes = Vec::with_capacity(units.len());
    for unit in units {
        match *unit {
            Unit::Byte(byte) => bytes.push(u32::from(byte)),
            Unit::Numeric(value) => {
                if value > 0xff {
                    diagnostics.push(Warning::new(
                        "escape sequence out of range, it doesn't fit in one byte",
                        location.clone(),
                    ));
                }
                bytes.push(value & 0xff);
            }
            Unit::CodePoint(code_point) => {
                let character = char::from_u32(code_point).ok_or(ErrorKind::EscapeOutOfRange)?;
                let mut buffer = [0; 4];
                bytes.extend(character.encode_utf8(&mut buffer).bytes().map(u32::from));
            }
        }
    }

    match bytes.len() {
        0 => Err(ErrorKind::MissingTerminal("c-char")),
        1 => Ok(Value::Signed(i64::from(bytes[0] as u8 as i8))),
        len if len > std::mem::size_of::<i32>() => Err(ErrorKind::CharacterConstantTooLong),
        _ => {
            diagnostics.push(Warning::new("multi-character character constant", location.clone()));
            let value = bytes.iter().fold(0u32, |value, &byte| (value << 8) | byte);
            Ok(Value::Signed(i64::from(value as i32)))
        }
    }
}

/// A prefixed character constant holds exactly one code unit of its encoding.
fn prefixed(encoding: Encoding, units: &[Unit]) -> Result<Value, ErrorKind> {
    let max = match encoding {
        Encoding::Utf8 => u32::from(u8::MAX),
        Encoding::Utf16 => u32::from(u16::MAX),
        Encoding::Plain | Encoding::Wide | Encoding::Utf32 => u32::MAX,
    };

    let mut code_units = Vec::with_capacity(units.len());
    let mut pending = Vec::new();
    for unit in units.iter().map(Some).chain([None]) {
        if let Some(Unit::Byte(byte)) = unit {
            pending.push(*byte);
            continue;
        }
        // Source bytes are UTF-8, decode the run of them that just ended.
        for character in String::from_utf8_lossy(&pending).chars() {
            encode(encoding, character, &mut code_units);
        }
        pending.clear();

        match unit {
            Some(Unit::Numeric(value)) if *value > max => return Err(ErrorKind::EscapeOutOfRange),
            Some(Unit::Numeric(value)) => code_units.push(*value),
            Some(Unit::CodePoint(code_point)) => {
                let character = char::from_u32(*code_point).ok_or(ErrorKind::EscapeOutOfRange)?;
                encode(encoding, character, &mut code_units);
            }
            Some(Unit::Byte(_)) | None => {}
        }
    }

    let &[code_unit] = code_units.as_slice() else {
        return Err(ErrorKind::CharacterConstantTooLong);
    };
    Ok(match encoding {
        Encoding::Wide => Value::Signed(i64::from(code_unit as i32)),
        _ => Value::Unsigned(u64::from(code_unit)),
    })
}

fn encode(encoding: Encoding, character: char, code_units: &mut Vec<u32>) {
    match encoding {
        Encoding::Utf8 => {
            let mut buffer = [0; 4];
            code_units.extend(character.encode_utf8(&mut buffer).bytes().map(u32::from));
        }
        Encoding::Utf16 => {
            let mut buffer = [0; 2];
            code_units.extend(character.encode_utf16(&mut buffer).iter().map(|&unit| u32::from(unit)));
        }
        Encoding::Plain | Encoding::Wide | Encoding::Utf32 => code_units.push(u32::from(character)),
    }
}
