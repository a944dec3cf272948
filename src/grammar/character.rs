//! The grammar of character constants, section 6.4.4.4 of C17, over bytes.
//!
//! Octal and hexadecimal escape sequences are maximal: `'\123'` is one octal escape and
//! `'\x41g'` is a hexadecimal escape followed by `g`. The grammar encodes this by tracking how a
//! sequence of characters ends. A sequence ending in an octal escape of fewer than three digits
//! cannot be followed by an octal digit and one ending in a hexadecimal escape cannot be followed
//! by a hexadecimal digit. Every character constant has a single parse.
use std::sync::OnceLock;

use crate::{
    earley::{alt, lit, nt, pred, Grammar, RuleId},
    lexer::detect::is_simple_escape,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    CharacterConstant,
    CCharSequence,
    /// A sequence whose last character does not restrict the next one.
    Free,
    /// A sequence ending in an octal escape sequence of one or two digits.
    AfterOctal,
    /// A sequence ending in a hexadecimal escape sequence.
    AfterHex,
    AnyChar,
    NotOctal,
    NotHex,
    Plain,
    PlainHex,
    PlainOctal,
    Escape,
    ShortOctal,
    Hex,
    HexDigits,
    EscapeSequence,
}

impl From<Rule> for RuleId {
    fn from(rule: Rule) -> Self {
        RuleId(rule as usize)
    }
}

/// The prefix of a character constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    /// `L`
    Wide,
    /// `u8`
    Utf8,
    /// `u`
    Utf16,
    /// `U`
    Utf32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    Constant(Encoding),
    /// A single child that stands for this node.
    Next,
    /// The first character of a sequence.
    First,
    /// A sequence followed by one more character.
    Then,
    Plain,
    Simple,
    Octal,
    Hex,
    Ucn,
}

fn is_octal(byte: &u8) -> bool {
    matches!(byte, b'0'..=b'7')
}

fn is_hex(byte: &u8) -> bool {
    byte.is_ascii_hexdigit()
}

fn is_hex_not_octal(byte: &u8) -> bool {
    is_hex(byte) && !is_octal(byte)
}

fn is_plain_not_hex(byte: &u8) -> bool {
    !matches!(byte, b'\'' | b'\\' | b'\n') && !is_hex(byte)
}

fn is_simple(byte: &u8) -> bool {
    is_simple_escape(*byte)
}

/// The grammar shared by every parse of a character constant.
pub fn grammar() -> &'static Grammar<u8, Tag> {
    static GRAMMAR: OnceLock<Grammar<u8, Tag>> = OnceLock::new();
    GRAMMAR.get_or_init(build)
}

fn build() -> Grammar<u8, Tag> {
    use Rule::*;

    let quoted = |tag, prefix: &[&'static str]| {
        let mut symbols: Vec<_> = prefix.iter().map(|&prefix| lit(prefix)).collect();
        symbols.extend([lit("'"), nt(CCharSequence), lit("'")]);
        alt(Tag::Constant(tag), symbols)
    };
    let hex4 = || (0..4).map(|_| pred(is_hex));

    let mut builder = Grammar::builder();
    builder
        .rule(
            CharacterConstant,
            "character-constant",
            vec![
                quoted(Encoding::Plain, &[]),
                quoted(Encoding::Wide, &["L"]),
                quoted(Encoding::Utf8, &["u", "8"]),
                quoted(Encoding::Utf16, &["u"]),
                quoted(Encoding::Utf32, &["U"]),
            ],
        )
        .rule(
            CCharSequence,
            "c-char-sequence",
            vec![
                alt(Tag::Next, vec![nt(Free)]),
                alt(Tag::Next, vec![nt(AfterOctal)]),
                alt(Tag::Next, vec![nt(AfterHex)]),
            ],
        )
        .rule(
            Free,
            "c-char-sequence",
            vec![
                alt(Tag::First, vec![nt(AnyChar)]),
                alt(Tag::Then, vec![nt(Free), nt(AnyChar)]),
                alt(Tag::Then, vec![nt(AfterOctal), nt(NotOctal)]),
                alt(Tag::Then, vec![nt(AfterHex), nt(NotHex)]),
            ],
        )
        .rule(
            AfterOctal,
            "c-char-sequence",
            vec![
                alt(Tag::First, vec![nt(ShortOctal)]),
                alt(Tag::Then, vec![nt(Free), nt(ShortOctal)]),
                alt(Tag::Then, vec![nt(AfterOctal), nt(ShortOctal)]),
                alt(Tag::Then, vec![nt(AfterHex), nt(ShortOctal)]),
            ],
        )
        .rule(
            AfterHex,
            "c-char-sequence",
            vec![
                alt(Tag::First, vec![nt(Hex)]),
                alt(Tag::Then, vec![nt(Free), nt(Hex)]),
                alt(Tag::Then, vec![nt(AfterOctal), nt(Hex)]),
                alt(Tag::Then, vec![nt(AfterHex), nt(Hex)]),
            ],
        )
        .rule(
            AnyChar,
            "c-char",
            vec![
                alt(Tag::Next, vec![nt(Plain)]),
                alt(Tag::Next, vec![nt(PlainHex)]),
                alt(Tag::Next, vec![nt(PlainOctal)]),
                alt(Tag::Next, vec![nt(Escape)]),
            ],
        )
        .rule(
            NotOctal,
            "c-char",
            vec![
                alt(Tag::Next, vec![nt(Plain)]),
                alt(Tag::Next, vec![nt(PlainHex)]),
                alt(Tag::Next, vec![nt(Escape)]),
            ],
        )
        .rule(
            NotHex,
            "c-char",
            vec![
                alt(Tag::Next, vec![nt(Plain)]),
                alt(Tag::Next, vec![nt(Escape)]),
            ],
        )
        .rule(Plain, "c-char", vec![alt(Tag::Plain, vec![pred(is_plain_not_hex)])])
        .rule(PlainHex, "c-char", vec![alt(Tag::Plain, vec![pred(is_hex_not_octal)])])
        .rule(PlainOctal, "c-char", vec![alt(Tag::Plain, vec![pred(is_octal)])])
        .rule(
            Escape,
            "escape-sequence",
            vec![
                alt(Tag::Simple, vec![lit("\\"), pred(is_simple)]),
                alt(
                    Tag::Octal,
                    vec![lit("\\"), pred(is_octal), pred(is_octal), pred(is_octal)],
                ),
                alt(
                    Tag::Ucn,
                    [lit("\\"), lit("u")].into_iter().chain(hex4()).collect(),
                ),
                alt(
                    Tag::Ucn,
                    [lit("\\"), lit("U")]
                        .into_iter()
                        .chain(hex4())
                        .chain(hex4())
                        .collect(),
                ),
            ],
        )
        .rule(
            ShortOctal,
            "octal-escape-sequence",
            vec![
                alt(Tag::Octal, vec![lit("\\"), pred(is_octal)]),
                alt(Tag::Octal, vec![lit("\\"), pred(is_octal), pred(is_octal)]),
            ],
        )
        .rule(
            Hex,
            "hexadecimal-escape-sequence",
            vec![alt(Tag::Hex, vec![lit("\\"), lit("x"), nt(HexDigits)])],
        )
        .list(
            HexDigits,
            "hexadecimal-digit-sequence",
            vec![
                alt(Tag::Next, vec![nt(HexDigits), pred(is_hex)]),
                alt(Tag::Next, vec![pred(is_hex)]),
            ],
        )
        .rule(
            EscapeSequence,
            "escape-sequence",
            vec![
                alt(Tag::Next, vec![nt(Escape)]),
                alt(Tag::Next, vec![nt(ShortOctal)]),
                alt(Tag::Next, vec![nt(Hex)]),
            ],
        );
    builder.build()
}
