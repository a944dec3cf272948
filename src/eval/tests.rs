use pretty_assertions::assert_eq;

use super::*;
use crate::{
    earley::parse,
    grammar::c::{grammar, Rule},
    preprocessor::lex,
};

#[track_caller]
fn eval_with(source: &str, diagnostics: &Diagnostics) -> Result<Value> {
    let tokens = lex(source.as_bytes());
    let tree = parse(grammar(), Rule::ConstantExpression, &tokens).expect("expression parses");
    eval_constant_expression(&tree, diagnostics, &Location::new("test.c", 1, 1..2))
}

#[track_caller]
fn eval(source: &str) -> Value {
    eval_with(source, &Diagnostics::default()).unwrap()
}

#[track_caller]
fn eval_err(source: &str) -> ErrorKind {
    eval_with(source, &Diagnostics::default())
        .unwrap_err()
        .kind()
        .cloned()
        .unwrap()
}

#[test]
fn usual_arithmetic_conversions() {
    assert_eq!(eval("1 + 1u"), Value::Unsigned(2));
    assert_eq!(eval("-1 > 0u"), Value::Signed(1));
    assert_eq!(eval("-1 > 0"), Value::Signed(0));
    assert_eq!(eval("-1 / 2u"), Value::Unsigned(u64::MAX / 2));
    assert_eq!(eval("0u - 1"), Value::Unsigned(u64::MAX));
}

#[test]
fn arithmetic() {
    assert_eq!(eval("1 + 1 == 2"), Value::Signed(1));
    assert_eq!(eval("2 + 3 * 4"), Value::Signed(14));
    assert_eq!(eval("(2 + 3) * 4"), Value::Signed(20));
    assert_eq!(eval("10 - 4 - 3"), Value::Signed(3));
    assert_eq!(eval("-7 / 2"), Value::Signed(-3));
    assert_eq!(eval("-7 % 2"), Value::Signed(-1));
    assert_eq!(eval("~0"), Value::Signed(-1));
    assert_eq!(eval("!5"), Value::Signed(0));
    assert_eq!(eval("+3"), Value::Signed(3));
    assert_eq!(eval("6 & 3 | 8 ^ 1"), Value::Signed(11));
    assert_eq!(eval("0x7fffffffffffffff + 1"), Value::Signed(i64::MIN));
}

#[test]
fn shifts_keep_the_left_type() {
    assert_eq!(eval("1 << 4"), Value::Signed(16));
    assert_eq!(eval("1 << 4u"), Value::Signed(16));
    assert_eq!(eval("1u << 4"), Value::Unsigned(16));
    assert_eq!(eval("-16 >> 2"), Value::Signed(-4));
    assert_eq!(eval("1 << 64"), Value::Signed(0));
    assert_eq!(eval("16 << -2"), Value::Signed(4));
}

#[test]
fn logical_operators() {
    assert_eq!(eval("1 && 2"), Value::Signed(1));
    assert_eq!(eval("1 && 0"), Value::Signed(0));
    assert_eq!(eval("0 || 3u"), Value::Signed(1));
    assert_eq!(eval("0 && 1 / 0"), Value::Signed(0));
    assert_eq!(eval("1 || 1 / 0"), Value::Signed(1));
    assert_eq!(eval("1 <= 1 && 2 >= 3"), Value::Signed(0));
    assert_eq!(eval("1 != 2"), Value::Signed(1));
}

#[test]
fn conditional() {
    assert_eq!(eval("1 ? 2 : 3"), Value::Signed(2));
    assert_eq!(eval("0 ? 2 : 3"), Value::Signed(3));
    assert_eq!(eval("1 ? -1 : 0u"), Value::Unsigned(u64::MAX));
    assert_eq!(eval("1 ? 2 : 1 / 0"), Value::Signed(2));
}

#[test]
fn long_expressions() {
    let sum = format!("0{}", " + 1".repeat(10_000));
    assert_eq!(eval(&sum), Value::Signed(10_000));
    let nots = format!("{}0", "!".repeat(10_001));
    assert_eq!(eval(&nots), Value::Signed(1));
    let chain = format!("1{}", " && 1".repeat(10_000));
    assert_eq!(eval(&format!("0 && ({chain} / 0)")), Value::Signed(0));
}

#[test]
fn long_character_constants() {
    let constant = format!("'{}'", "a".repeat(20_000));
    assert_eq!(eval_err(&constant), ErrorKind::CharacterConstantTooLong);
}

#[test]
fn division_by_zero() {
    assert_eq!(eval_err("1 / 0"), ErrorKind::DivisionByZero);
    assert_eq!(eval_err("1 % (2 - 2)"), ErrorKind::DivisionByZero);
}

#[test]
fn disallowed_constructs_are_fatal() {
    let cases = [
        ("1, 2", "comma operator"),
        ("x = 1", "assignment"),
        ("x", "identifier"),
        ("\"s\"", "string literal"),
        ("1.0", "floating constant"),
        ("sizeof (int)", "sizeof"),
        ("(long) 1", "cast"),
        ("f(1)", "function call"),
        ("*x", "indirection operator"),
        ("&x", "address-of operator"),
        ("x++", "increment operator"),
        ("a[0]", "array subscript"),
    ];
    for (source, construct) in cases {
        assert_eq!(eval_err(source), ErrorKind::Disallowed(construct), "{source}");
    }
}

#[test]
fn error_location() {
    let error = eval_with("1 + 2 / 0", &Diagnostics::default()).unwrap_err();
    let Error::At { location, .. } = error else {
        panic!("expected a located error");
    };
    assert_eq!(location.columns, 5..10);
}

#[test]
fn integer_constants() {
    assert_eq!(parse_integer(b"0"), Ok(Value::Signed(0)));
    assert_eq!(parse_integer(b"010"), Ok(Value::Signed(8)));
    assert_eq!(parse_integer(b"0x1F"), Ok(Value::Signed(31)));
    assert_eq!(parse_integer(b"0x1e5"), Ok(Value::Signed(0x1e5)));
    assert_eq!(parse_integer(b"42ULL"), Ok(Value::Unsigned(42)));
    assert_eq!(parse_integer(b"42lu"), Ok(Value::Unsigned(42)));
    assert_eq!(parse_integer(b"42L"), Ok(Value::Signed(42)));
    assert_eq!(
        parse_integer(b"18446744073709551615"),
        Ok(Value::Unsigned(u64::MAX))
    );
    assert_eq!(
        parse_integer(b"18446744073709551616"),
        Err(ErrorKind::IntegerTooLarge("18446744073709551616".into()))
    );
    assert_eq!(parse_integer(b"08"), Err(ErrorKind::InvalidInteger("08".into())));
    assert_eq!(parse_integer(b"0x"), Err(ErrorKind::InvalidInteger("0x".into())));
    assert_eq!(parse_integer(b"1lL"), Err(ErrorKind::InvalidInteger("1lL".into())));
    assert_eq!(parse_integer(b"1e3"), Err(ErrorKind::Disallowed("floating constant")));
}

fn character(text: &str) -> (std::result::Result<Value, ErrorKind>, usize) {
    let diagnostics = Diagnostics::default();
    let location = Location::new("test.c", 1, 1..2);
    let value = evaluate_character(text.as_bytes(), &diagnostics, &location);
    (value, diagnostics.take().len())
}

#[test]
fn character_constants() {
    assert_eq!(character("'a'"), (Ok(Value::Signed(97)), 0));
    assert_eq!(character("'\\n'"), (Ok(Value::Signed(10)), 0));
    assert_eq!(character("'\\''"), (Ok(Value::Signed(39)), 0));
    assert_eq!(character("'\\0'"), (Ok(Value::Signed(0)), 0));
    assert_eq!(character("'\\377'"), (Ok(Value::Signed(-1)), 0));
    assert_eq!(character("'\\x41'"), (Ok(Value::Signed(65)), 0));
    assert_eq!(character("L'\\xffffffff'"), (Ok(Value::Signed(-1)), 0));
    assert_eq!(character("u'\\xffff'"), (Ok(Value::Unsigned(0xffff)), 0));
    assert_eq!(character("U'\\U0001F600'"), (Ok(Value::Unsigned(0x1F600)), 0));
    assert_eq!(character("u8'a'"), (Ok(Value::Unsigned(97)), 0));
}

#[test]
fn multi_character_constants() {
    assert_eq!(character("'ab'"), (Ok(Value::Signed(0x6162)), 1));
    assert_eq!(character("'abcd'"), (Ok(Value::Signed(0x61626364)), 1));
    assert_eq!(character("'\\xff\\xff\\xff\\xff'"), (Ok(Value::Signed(-1)), 1));
    assert_eq!(character("'abcde'"), (Err(ErrorKind::CharacterConstantTooLong), 0));
    assert_eq!(character("u'ab'"), (Err(ErrorKind::CharacterConstantTooLong), 0));
}

#[test]
fn escape_out_of_one_byte_warns() {
    assert_eq!(character("'\\x141'"), (Ok(Value::Signed(0x41)), 1));
    assert_eq!(character("'\\777'"), (Ok(Value::Signed(-1)), 1));
}

#[test]
fn invalid_escapes() {
    assert_eq!(character("'\\x100000000'"), (Err(ErrorKind::EscapeOutOfRange), 0));
    assert_eq!(character("u'\\x10000'"), (Err(ErrorKind::EscapeOutOfRange), 0));
    assert_eq!(character("'\\u0041'"), (Err(ErrorKind::EscapeOutOfRange), 0));
    assert_eq!(character("'\\uD800'"), (Err(ErrorKind::EscapeOutOfRange), 0));
    assert_eq!(
        character("'\\q'"),
        (Err(ErrorKind::InvalidCharacterConstant("'\\q'".into())), 0)
    );
}

#[test]
fn utf8_source_characters() {
    assert_eq!(character("U'é'"), (Ok(Value::Unsigned(0xe9)), 0));
    assert_eq!(character("'é'"), (Ok(Value::Signed(0xc3a9)), 1));
}

#[test]
fn universal_character_names_decode() {
    assert_eq!(decode_escape(b"\\u0041"), Some(0x41));
    assert_eq!(decode_escape(b"\\U0001F600"), Some(0x1F600));
    assert_eq!(decode_escape(b"\\u00"), None);
    assert_eq!(decode_escape(b"\\t"), Some(9));
    assert_eq!(decode_escape(b"\\101"), Some(65));
    assert_eq!(decode_escape(b"\\x7f"), Some(127));
}
