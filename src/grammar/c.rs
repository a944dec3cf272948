//! The grammar of preprocessing directives (section 6.10 of C17) and of constant expressions
//! (section 6.5 of C17), over preprocessing tokens.
//!
//! The expression grammar contains every form of section 6.5 that can be spelled without
//! declarations, even the ones a preprocessor constant expression cannot contain, so the evaluator
//! can name the construct it rejects.
use std::sync::OnceLock;

use crate::{
    earley::{alt, lit, nt, pred, Alternative, Grammar, RuleId, Symbol},
    preprocessor::PpToken,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Directive,
    PpTokens,
    IdentifierList,
    ReplacementList,
    ConstantExpression,
    Expression,
    AssignmentExpression,
    ConditionalExpression,
    LogicalOrExpression,
    LogicalAndExpression,
    InclusiveOrExpression,
    ExclusiveOrExpression,
    AndExpression,
    EqualityExpression,
    RelationalExpression,
    ShiftExpression,
    AdditiveExpression,
    MultiplicativeExpression,
    CastExpression,
    UnaryExpression,
    PostfixExpression,
    ArgumentExpressionList,
    PrimaryExpression,
    TypeName,
    SpecifierQualifierList,
    Pointer,
}

impl From<Rule> for RuleId {
    fn from(rule: Rule) -> Self {
        RuleId(rule as usize)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Multiply,
    Divide,
    Remainder,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRight,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalOr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    AddressOf,
    Dereference,
    Plus,
    Minus,
    Complement,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    If,
    Elif,
    Ifdef,
    Ifndef,
    Else,
    Endif,
    Include,
    DefineObject,
    DefineFunction,
    DefineVariadic,
    Undef,
    Line,
    Error,
    Pragma,
    Null,
    NonDirective,

    /// A single child that stands for this node.
    Next,
    Comma,
    Assign,
    Conditional,
    Binary(BinaryOperator),
    Unary(UnaryOperator),
    Cast,
    Sizeof,
    Alignof,
    PreIncrement,
    PreDecrement,
    Subscript,
    Call,
    Member,
    Arrow,
    PostIncrement,
    PostDecrement,
    Identifier,
    Number,
    Character,
    StringLiteral,
    Parenthesized,
    TypeName,
}

/// The names of every directive, section 6.10 of C17.
pub const DIRECTIVES: &[&[u8]] = &[
    b"if", b"ifdef", b"ifndef", b"elif", b"else", b"endif", b"include", b"define", b"undef",
    b"line", b"error", b"pragma",
];

const TYPE_SPECIFIERS: &[&[u8]] = &[
    b"void", b"char", b"short", b"int", b"long", b"float", b"double", b"signed", b"unsigned",
    b"_Bool", b"_Complex", b"const", b"restrict", b"volatile", b"_Atomic",
];

fn any(_: &PpToken) -> bool {
    true
}

fn is_identifier(token: &PpToken) -> bool {
    token.is_ident()
}

fn is_type_specifier(token: &PpToken) -> bool {
    token.is_ident() && TYPE_SPECIFIERS.contains(&token.text.as_slice())
}

/// An identifier this grammar treats as a keyword: a type specifier, `sizeof` or `_Alignof`.
pub fn is_keyword(token: &PpToken) -> bool {
    is_type_specifier(token)
        || (token.is_ident() && matches!(token.text.as_slice(), b"sizeof" | b"_Alignof"))
}

/// An identifier that can be an operand, as opposed to a keyword this grammar knows about.
fn is_operand(token: &PpToken) -> bool {
    token.is_ident() && !is_keyword(token)
}

fn is_number(token: &PpToken) -> bool {
    token.kind.is_number()
}

fn is_character(token: &PpToken) -> bool {
    token.kind.is_char()
}

fn is_string(token: &PpToken) -> bool {
    token.kind.is_str()
}

/// The `lparen` of section 6.10 of C17: a `(` not preceded by white-space.
fn is_lparen(token: &PpToken) -> bool {
    token.is_punct(b"(") && !token.after_whitespace
}

fn is_not_lparen(token: &PpToken) -> bool {
    !is_lparen(token)
}

/// A `*` kept as an element of a `pointer`.
fn is_star(token: &PpToken) -> bool {
    token.is_punct(b"*")
}

fn is_non_directive(token: &PpToken) -> bool {
    !(token.is_ident() && DIRECTIVES.contains(&token.text.as_slice()))
}

/// The grammar shared by every parse of a directive or constant expression.
pub fn grammar() -> &'static Grammar<PpToken, Tag> {
    static GRAMMAR: OnceLock<Grammar<PpToken, Tag>> = OnceLock::new();
    GRAMMAR.get_or_init(build)
}

/// `# name` followed by `rest`.
fn directive(tag: Tag, name: &'static str, rest: Vec<Symbol<PpToken>>) -> Alternative<PpToken, Tag> {
    let mut symbols = vec![lit("#"), lit(name)];
    symbols.extend(rest);
    alt(tag, symbols)
}

/// Both `# name rest` and `# name rest pp-tokens`.
fn directive_with_tail(
    tag: Tag,
    name: &'static str,
    rest: fn() -> Vec<Symbol<PpToken>>,
) -> [Alternative<PpToken, Tag>; 2] {
    let mut tail = rest();
    tail.push(nt(Rule::PpTokens));
    [directive(tag, name, rest()), directive(tag, name, tail)]
}

/// A left-associative binary operator level: `rule -> operand | rule op operand`.
fn binary_level(
    rule: Rule,
    operand: Rule,
    operators: &[(&'static str, BinaryOperator)],
) -> Vec<Alternative<PpToken, Tag>> {
    std::iter::once(alt(Tag::Next, vec![nt(operand)]))
        .chain(operators.iter().map(|&(spelling, operator)| {
            alt(
                Tag::Binary(operator),
                vec![nt(rule), lit(spelling), nt(operand)],
            )
        }))
        .collect()
}

fn build() -> Grammar<PpToken, Tag> {
    use BinaryOperator::*;
    use Rule::*;

    let mut directives = Vec::new();
    directives.extend(directive_with_tail(Tag::If, "if", Vec::new));
    directives.extend(directive_with_tail(Tag::Elif, "elif", Vec::new));
    directives.extend(directive_with_tail(Tag::Ifdef, "ifdef", || vec![pred(is_identifier)]));
    directives.extend(directive_with_tail(Tag::Ifndef, "ifndef", || vec![pred(is_identifier)]));
    directives.extend(directive_with_tail(Tag::Else, "else", Vec::new));
    directives.extend(directive_with_tail(Tag::Endif, "endif", Vec::new));
    directives.push(directive(Tag::Include, "include", vec![nt(PpTokens)]));
    directives.push(directive(Tag::DefineObject, "define", vec![pred(is_identifier)]));
    directives.push(directive(
        Tag::DefineObject,
        "define",
        vec![pred(is_identifier), nt(ReplacementList)],
    ));
    directives.extend(directive_with_tail(Tag::DefineFunction, "define", || {
        vec![pred(is_identifier), pred(is_lparen), lit(")")]
    }));
    directives.extend(directive_with_tail(Tag::DefineFunction, "define", || {
        vec![pred(is_identifier), pred(is_lparen), nt(IdentifierList), lit(")")]
    }));
    directives.extend(directive_with_tail(Tag::DefineVariadic, "define", || {
        vec![pred(is_identifier), pred(is_lparen), lit("..."), lit(")")]
    }));
    directives.extend(directive_with_tail(Tag::DefineVariadic, "define", || {
        vec![
            pred(is_identifier),
            pred(is_lparen),
            nt(IdentifierList),
            lit(","),
            lit("..."),
            lit(")"),
        ]
    }));
    directives.extend(directive_with_tail(Tag::Undef, "undef", || vec![pred(is_identifier)]));
    directives.push(directive(Tag::Line, "line", vec![nt(PpTokens)]));
    directives.extend(directive_with_tail(Tag::Error, "error", Vec::new));
    directives.extend(directive_with_tail(Tag::Pragma, "pragma", Vec::new));
    directives.push(alt(Tag::Null, vec![lit("#")]));
    directives.push(alt(Tag::NonDirective, vec![lit("#"), pred(is_non_directive)]));
    directives.push(alt(
        Tag::NonDirective,
        vec![lit("#"), pred(is_non_directive), nt(PpTokens)],
    ));

    let assignments = ["=", "*=", "/=", "%=", "+=", "-=", "<<=", ">>=", "&=", "^=", "|="];
    let unary = [
        ("&", UnaryOperator::AddressOf),
        ("*", UnaryOperator::Dereference),
        ("+", UnaryOperator::Plus),
        ("-", UnaryOperator::Minus),
        ("~", UnaryOperator::Complement),
        ("!", UnaryOperator::Not),
    ];

    let mut builder = Grammar::builder();
    builder
        .rule(Directive, "directive", directives)
        .list(
            PpTokens,
            "pp-tokens",
            vec![
                alt(Tag::Next, vec![nt(PpTokens), pred(any)]),
                alt(Tag::Next, vec![pred(any)]),
            ],
        )
        .list(
            IdentifierList,
            "identifier-list",
            vec![
                alt(Tag::Next, vec![nt(IdentifierList), lit(","), pred(is_identifier)]),
                alt(Tag::Next, vec![pred(is_identifier)]),
            ],
        )
        .rule(
            ReplacementList,
            "replacement-list",
            vec![
                alt(Tag::Next, vec![pred(is_not_lparen)]),
                alt(Tag::Next, vec![pred(is_not_lparen), nt(PpTokens)]),
            ],
        )
        .rule(
            ConstantExpression,
            "constant-expression",
            vec![alt(Tag::Next, vec![nt(Expression)])],
        )
        .rule(
            Expression,
            "expression",
            vec![
                alt(Tag::Next, vec![nt(AssignmentExpression)]),
                alt(
                    Tag::Comma,
                    vec![nt(Expression), lit(","), nt(AssignmentExpression)],
                ),
            ],
        )
        .rule(
            AssignmentExpression,
            "assignment-expression",
            std::iter::once(alt(Tag::Next, vec![nt(ConditionalExpression)]))
                .chain(assignments.iter().map(|&operator| {
                    alt(
                        Tag::Assign,
                        vec![nt(UnaryExpression), lit(operator), nt(AssignmentExpression)],
                    )
                }))
                .collect(),
        )
        .rule(
            ConditionalExpression,
            "conditional-expression",
            vec![
                alt(Tag::Next, vec![nt(LogicalOrExpression)]),
                alt(
                    Tag::Conditional,
                    vec![
                        nt(LogicalOrExpression),
                        lit("?"),
                        nt(Expression),
                        lit(":"),
                        nt(ConditionalExpression),
                    ],
                ),
            ],
        )
        .rule(
            LogicalOrExpression,
            "logical-OR-expression",
            binary_level(LogicalOrExpression, LogicalAndExpression, &[("||", LogicalOr)]),
        )
        .rule(
            LogicalAndExpression,
            "logical-AND-expression",
            binary_level(LogicalAndExpression, InclusiveOrExpression, &[("&&", LogicalAnd)]),
        )
        .rule(
            InclusiveOrExpression,
            "inclusive-OR-expression",
            binary_level(InclusiveOrExpression, ExclusiveOrExpression, &[("|", BitOr)]),
        )
        .rule(
            ExclusiveOrExpression,
            "exclusive-OR-expression",
            binary_level(ExclusiveOrExpression, AndExpression, &[("^", BitXor)]),
        )
        .rule(
            AndExpression,
            "AND-expression",
            binary_level(AndExpression, EqualityExpression, &[("&", BitAnd)]),
        )
        .rule(
            EqualityExpression,
            "equality-expression",
            binary_level(
                EqualityExpression,
                RelationalExpression,
                &[("==", Equal), ("!=", NotEqual)],
            ),
        )
        .rule(
            RelationalExpression,
            "relational-expression",
            binary_level(
                RelationalExpression,
                ShiftExpression,
                &[
                    ("<", Less),
                    (">", Greater),
                    ("<=", LessEqual),
                    (">=", GreaterEqual),
                ],
            ),
        )
        .rule(
            ShiftExpression,
            "shift-expression",
            binary_level(
                ShiftExpression,
                AdditiveExpression,
                &[("<<", ShiftLeft), (">>", ShiftRight)],
            ),
        )
        .rule(
            AdditiveExpression,
            "additive-expression",
            binary_level(
                AdditiveExpression,
                MultiplicativeExpression,
                &[("+", Add), ("-", Subtract)],
            ),
        )
        .rule(
            MultiplicativeExpression,
            "multiplicative-expression",
            binary_level(
                MultiplicativeExpression,
                CastExpression,
                &[("*", Multiply), ("/", Divide), ("%", Remainder)],
            ),
        )
        .rule(
            CastExpression,
            "cast-expression",
            vec![
                alt(Tag::Next, vec![nt(UnaryExpression)]),
                alt(
                    Tag::Cast,
                    vec![lit("("), nt(TypeName), lit(")"), nt(CastExpression)],
                ),
            ],
        )
        .rule(
            UnaryExpression,
            "unary-expression",
            [
                alt(Tag::Next, vec![nt(PostfixExpression)]),
                alt(Tag::PreIncrement, vec![lit("++"), nt(UnaryExpression)]),
                alt(Tag::PreDecrement, vec![lit("--"), nt(UnaryExpression)]),
                alt(Tag::Sizeof, vec![lit("sizeof"), nt(UnaryExpression)]),
                alt(
                    Tag::Sizeof,
                    vec![lit("sizeof"), lit("("), nt(TypeName), lit(")")],
                ),
                alt(
                    Tag::Alignof,
                    vec![lit("_Alignof"), lit("("), nt(TypeName), lit(")")],
                ),
            ]
            .into_iter()
            .chain(unary.iter().map(|&(spelling, operator)| {
                alt(Tag::Unary(operator), vec![lit(spelling), nt(CastExpression)])
            }))
            .collect(),
        )
        .rule(
            PostfixExpression,
            "postfix-expression",
            vec![
                alt(Tag::Next, vec![nt(PrimaryExpression)]),
                alt(
                    Tag::Subscript,
                    vec![nt(PostfixExpression), lit("["), nt(Expression), lit("]")],
                ),
                alt(Tag::Call, vec![nt(PostfixExpression), lit("("), lit(")")]),
                alt(
                    Tag::Call,
                    vec![
                        nt(PostfixExpression),
                        lit("("),
                        nt(ArgumentExpressionList),
                        lit(")"),
                    ],
                ),
                alt(
                    Tag::Member,
                    vec![nt(PostfixExpression), lit("."), pred(is_identifier)],
                ),
                alt(
                    Tag::Arrow,
                    vec![nt(PostfixExpression), lit("->"), pred(is_identifier)],
                ),
                alt(Tag::PostIncrement, vec![nt(PostfixExpression), lit("++")]),
                alt(Tag::PostDecrement, vec![nt(PostfixExpression), lit("--")]),
            ],
        )
        .list(
            ArgumentExpressionList,
            "argument-expression-list",
            vec![
                alt(
                    Tag::Next,
                    vec![nt(ArgumentExpressionList), lit(","), nt(AssignmentExpression)],
                ),
                alt(Tag::Next, vec![nt(AssignmentExpression)]),
            ],
        )
        .rule(
            PrimaryExpression,
            "primary-expression",
            vec![
                alt(Tag::Identifier, vec![pred(is_operand)]),
                alt(Tag::Number, vec![pred(is_number)]),
                alt(Tag::Character, vec![pred(is_character)]),
                alt(Tag::StringLiteral, vec![pred(is_string)]),
                alt(
                    Tag::Parenthesized,
                    vec![lit("("), nt(Expression), lit(")")],
                ),
            ],
        )
        .rule(
            TypeName,
            "type-name",
            vec![
                alt(Tag::TypeName, vec![nt(SpecifierQualifierList)]),
                alt(Tag::TypeName, vec![nt(SpecifierQualifierList), nt(Pointer)]),
            ],
        )
        .list(
            SpecifierQualifierList,
            "specifier-qualifier-list",
            vec![
                alt(Tag::Next, vec![nt(SpecifierQualifierList), pred(is_type_specifier)]),
                alt(Tag::Next, vec![pred(is_type_specifier)]),
            ],
        )
        .list(
            Pointer,
            "pointer",
            vec![
                alt(Tag::Next, vec![nt(Pointer), pred(is_star)]),
                alt(Tag::Next, vec![pred(is_star)]),
            ],
        );
    builder.build()
}
