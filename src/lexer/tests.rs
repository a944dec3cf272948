use pretty_assertions::assert_eq;

use crate::lexer::{tokenize, TokenKind};

/// Tokenize `bytes` and return the kind and text of every token.
fn kinds(bytes: &[u8]) -> Vec<(TokenKind, String)> {
    tokenize(bytes)
        .iter()
        .map(|token| {
            (
                token.kind,
                String::from_utf8_lossy(token.text(bytes)).into_owned(),
            )
        })
        .collect()
}

#[track_caller]
fn tokenize_one(bytes: &[u8], kind: TokenKind) {
    let buffer = tokenize(bytes);
    println!("Parsed tokens were: {:?}", &buffer[..]);
    assert_eq!(buffer.len(), 1, "expected a single token");
    assert_eq!(buffer[0].kind, kind);
    assert_eq!(buffer[0].span.lo, 0);
    assert_eq!(buffer[0].span.hi, bytes.len());
}

#[test]
fn ident_alphabetic() {
    tokenize_one(b"hello", TokenKind::Ident);
}

#[test]
fn ident_alphanumeric() {
    tokenize_one(b"e1m1", TokenKind::Ident);
}

#[test]
fn ident_surrounded_by_underscore() {
    tokenize_one(b"_foo_", TokenKind::Ident);
}

#[test]
fn ident_with_ucn() {
    tokenize_one(b"caf\\u00e9", TokenKind::Ident);
}

#[test]
fn ident_longest_match() {
    tokenize_one(b"abc123", TokenKind::Ident);
}

#[test]
#[should_panic]
fn ident_starts_with_digit() {
    tokenize_one(b"12345seven", TokenKind::Ident);
}

#[test]
fn ident_with_incomplete_ucn_stops_before_it() {
    assert_eq!(
        kinds(b"ab\\u00)"),
        vec![
            (TokenKind::Ident, "ab".to_owned()),
            (TokenKind::Any, "\\".to_owned()),
            (TokenKind::Ident, "u00".to_owned()),
            (TokenKind::Punct, ")".to_owned()),
        ]
    );
}

#[test]
fn ident_rejects_ucn_for_basic_character() {
    assert_eq!(
        kinds(b"a\\u0041"),
        vec![
            (TokenKind::Ident, "a".to_owned()),
            (TokenKind::Any, "\\".to_owned()),
            (TokenKind::Ident, "u0041".to_owned()),
        ]
    );
}

#[test]
fn number_digits() {
    tokenize_one(b"42", TokenKind::Number);
}

#[test]
fn number_begins_with_dot() {
    tokenize_one(b".42", TokenKind::Number);
}

#[test]
fn number_surrounded_by_dots() {
    tokenize_one(b".42.", TokenKind::Number);
}

#[test]
fn number_with_exponent() {
    tokenize_one(b"42e+", TokenKind::Number);
}

#[test]
fn number_with_ident() {
    tokenize_one(b"42HELLO_10", TokenKind::Number);
}

#[test]
fn number_hexadecimal_float() {
    tokenize_one(b"0x1.8p-3", TokenKind::Number);
}

#[test]
fn number_with_sign_no_exponent() {
    assert_eq!(
        kinds(b"1+2"),
        vec![
            (TokenKind::Number, "1".to_owned()),
            (TokenKind::Punct, "+".to_owned()),
            (TokenKind::Number, "2".to_owned()),
        ]
    );
}

#[test]
fn char_simple() {
    tokenize_one(b"'a'", TokenKind::Char);
}

#[test]
fn char_escapes() {
    tokenize_one(b"'\\n'", TokenKind::Char);
    tokenize_one(b"'\\x4142'", TokenKind::Char);
    tokenize_one(b"'\\0'", TokenKind::Char);
    tokenize_one(b"'\\''", TokenKind::Char);
    tokenize_one(b"L'\\u00e9'", TokenKind::Char);
}

#[test]
fn char_multi() {
    tokenize_one(b"'abcd'", TokenKind::Char);
}

#[test]
fn char_prefixes() {
    tokenize_one(b"L'a'", TokenKind::Char);
    tokenize_one(b"u'a'", TokenKind::Char);
    tokenize_one(b"U'a'", TokenKind::Char);
    tokenize_one(b"u8'a'", TokenKind::Char);
}

#[test]
fn char_empty_is_not_a_token() {
    assert_eq!(
        kinds(b"''"),
        vec![
            (TokenKind::Any, "'".to_owned()),
            (TokenKind::Any, "'".to_owned()),
        ]
    );
}

#[test]
fn char_invalid_escape() {
    assert_eq!(kinds(b"'\\q'")[0], (TokenKind::Any, "'".to_owned()));
}

#[test]
fn string_simple() {
    tokenize_one(b"\"hello, world\\n\"", TokenKind::Str);
}

#[test]
fn string_empty() {
    tokenize_one(b"\"\"", TokenKind::Str);
}

#[test]
fn string_with_prefix() {
    tokenize_one(b"u8\"text\"", TokenKind::Str);
}

#[test]
fn string_with_comment_inside() {
    tokenize_one(b"\"/* not a comment */\"", TokenKind::Str);
}

#[test]
fn string_unterminated_stops_at_newline() {
    assert_eq!(
        kinds(b"\"abc\nx"),
        vec![
            (TokenKind::Any, "\"".to_owned()),
            (TokenKind::Ident, "abc".to_owned()),
            (TokenKind::Ident, "x".to_owned()),
        ]
    );
}

#[test]
fn punct_longest() {
    assert_eq!(
        kinds(b"a<<=b...c->d"),
        vec![
            (TokenKind::Ident, "a".to_owned()),
            (TokenKind::Punct, "<<=".to_owned()),
            (TokenKind::Ident, "b".to_owned()),
            (TokenKind::Punct, "...".to_owned()),
            (TokenKind::Ident, "c".to_owned()),
            (TokenKind::Punct, "->".to_owned()),
            (TokenKind::Ident, "d".to_owned()),
        ]
    );
}

#[test]
fn punct_two_dots_are_two_tokens() {
    assert_eq!(
        kinds(b".."),
        vec![
            (TokenKind::Punct, ".".to_owned()),
            (TokenKind::Punct, ".".to_owned()),
        ]
    );
}

#[test]
fn punct_digraphs() {
    tokenize_one(b"%:%:", TokenKind::Punct);
    tokenize_one(b"<:", TokenKind::Punct);
}

#[test]
fn any_character() {
    tokenize_one(b"@", TokenKind::Any);
    tokenize_one(b"`", TokenKind::Any);
}

#[test]
fn comments_count_as_whitespace() {
    let source = b"a/* comment */b // trailing\nc";
    let buffer = tokenize(source);
    let tokens: Vec<_> = buffer
        .iter()
        .map(|token| (token.text(source), token.after_whitespace))
        .collect();
    assert_eq!(
        tokens,
        vec![(&b"a"[..], false), (&b"b"[..], true), (&b"c"[..], true)]
    );
}

#[test]
fn block_comments_join_lines() {
    let source = b"#define A /* one\ntwo */ 1\nB\n";
    let buffer = tokenize(source);
    let lines: Vec<Vec<String>> = buffer
        .lines()
        .map(|line| {
            line.iter()
                .map(|token| String::from_utf8_lossy(token.text(source)).into_owned())
                .collect()
        })
        .collect();
    assert_eq!(lines, vec![vec!["#", "define", "A", "1"], vec!["B"], vec![]]);
}

#[test]
fn unterminated_comment_is_reported() {
    let buffer = tokenize(b"a /* never closed");
    assert_eq!(buffer.unterminated_comment(), Some(2));
    assert_eq!(tokenize(b"a /* closed */").unterminated_comment(), None);
}

#[test]
fn header_after_include() {
    assert_eq!(
        kinds(b"#include <stdio.h>"),
        vec![
            (TokenKind::Punct, "#".to_owned()),
            (TokenKind::Ident, "include".to_owned()),
            (TokenKind::Header, "<stdio.h>".to_owned()),
        ]
    );
}

#[test]
fn quoted_header_after_include() {
    assert_eq!(
        kinds(b"# include \"a.h\""),
        vec![
            (TokenKind::Punct, "#".to_owned()),
            (TokenKind::Ident, "include".to_owned()),
            (TokenKind::Header, "\"a.h\"".to_owned()),
        ]
    );
}

#[test]
fn quoted_outside_include_is_a_string() {
    assert_eq!(
        kinds(b"#define X \"x\"\n\"x\""),
        vec![
            (TokenKind::Punct, "#".to_owned()),
            (TokenKind::Ident, "define".to_owned()),
            (TokenKind::Ident, "X".to_owned()),
            (TokenKind::Str, "\"x\"".to_owned()),
            (TokenKind::Str, "\"x\"".to_owned()),
        ]
    );
}

#[test]
fn angle_outside_include_is_punctuation() {
    assert_eq!(
        kinds(b"a <b> c")
            .into_iter()
            .map(|(kind, _)| kind)
            .collect::<Vec<_>>(),
        vec![
            TokenKind::Ident,
            TokenKind::Punct,
            TokenKind::Ident,
            TokenKind::Punct,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn include_on_previous_line_does_not_count() {
    assert_eq!(
        kinds(b"#include\n<a.h>")[2],
        (TokenKind::Punct, "<".to_owned())
    );
}

#[test]
fn whitespace_flags() {
    let source = b"#define f(x) (x)\n";
    let flags: Vec<bool> = tokenize(source)
        .iter()
        .map(|token| token.after_whitespace)
        .collect();
    assert_eq!(flags, vec![false, false, true, false, false, false, true, false, false]);
}
