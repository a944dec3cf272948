//! Macro expansion, section 6.10.3 of C17.
//!
//! Rescanning follows Prosser's algorithm: every token carries a hide set with the names of the
//! macros it came from, and a macro name is never expanded inside a token that hides it. The
//! result of a function-like invocation is hidden from the names hidden by both the macro name
//! and the closing parenthesis.
use std::collections::VecDeque;

use crate::{
    error::{ErrorKind, Location, Result},
    lexer::TokenKind,
};

use super::{
    lex,
    macros::{Macro, MacroKind, MacroTable},
    HideSet, PpToken,
};

/// A piece of a replacement list being substituted.
#[derive(Clone, Debug)]
enum Piece {
    Token(PpToken),
    /// A `##` operator of the replacement list. A `##` that comes from an argument is a
    /// [`Piece::Token`].
    Paste(PpToken),
    /// The empty result of an argument without tokens that is an operand of `##`.
    Placemarker,
}

impl Piece {
    /// The pieces of a replacement list, before any substitution.
    fn of(token: &PpToken) -> Piece {
        if token.is_punct(b"##") {
            Piece::Paste(token.clone())
        } else {
            Piece::Token(token.clone())
        }
    }
}

/// What happens to a token during expansion.
enum Step {
    /// The token is not a macro invocation.
    Keep(PpToken),
    /// The token was the start of a macro invocation. The replacement is rescanned along with the
    /// rest of the input.
    Replace(Vec<PpToken>),
}

/// Expands macros using the definitions of a [`MacroTable`].
pub(crate) struct Expander<'a> {
    macros: &'a MacroTable,
    /// The presumed name of the current file, for `__FILE__` and diagnostics.
    file: &'a str,
    /// The difference between the presumed line number and the physical one, set by `#line`.
    line_delta: i64,
    /// Leave the operand of `defined` alone, inside `#if` and `#elif`.
    keep_defined: bool,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(macros: &'a MacroTable, file: &'a str, line_delta: i64) -> Self {
        Self {
            macros,
            file,
            line_delta,
            keep_defined: false,
        }
    }

    pub(crate) fn keep_defined(self) -> Self {
        Self {
            keep_defined: true,
            ..self
        }
    }

    fn location(&self, token: &PpToken) -> Location {
        Location::new(self.file, token.line, token.columns())
    }

    /// Expand every macro in `tokens`, rescanning the results.
    pub(crate) fn expand(&self, tokens: Vec<PpToken>) -> Result<Vec<PpToken>> {
        let mut input = VecDeque::from(tokens);
        let mut output = Vec::with_capacity(input.len());

        while let Some(token) = input.pop_front() {
            if self.keep_defined && token.is_ident() && token.text == b"defined" {
                let operand = if input.front().is_some_and(|next| next.is_punct(b"(")) {
                    3
                } else {
                    1
                };
                output.push(token);
                output.extend(input.drain(..operand.min(input.len())));
                continue;
            }
            match self.expand_one(token, &mut input)? {
                Step::Keep(token) => output.push(token),
                Step::Replace(replacement) => {
                    for token in replacement.into_iter().rev() {
                        input.push_front(token);
                    }
                }
            }
        }

        Ok(output)
    }

    /// Expand `token` if it names a macro.
    fn expand_one(&self, token: PpToken, input: &mut VecDeque<PpToken>) -> Result<Step> {
        if !token.is_ident() || token.hideset.contains(&token.text) {
            return Ok(Step::Keep(token));
        }
        let Some(definition) = self.macros.lookup(&token.text) else {
            return Ok(Step::Keep(token));
        };

        match &definition.kind {
            MacroKind::Line => {
                let line = token.line as i64 + self.line_delta;
                Ok(Step::Keep(respell(&token, TokenKind::Number, line.to_string().into_bytes())))
            }
            MacroKind::File => Ok(Step::Keep(respell(
                &token,
                TokenKind::Str,
                quote(self.file.as_bytes()),
            ))),
            MacroKind::Object => {
                let hideset = token.hideset.with(&definition.name);
                let pieces = definition.replacement.iter().map(Piece::of).collect();
                let pieces = self.paste_all(pieces, &token)?;
                Ok(Step::Replace(finish(pieces, &hideset, &token)))
            }
            MacroKind::Function {
                parameters,
                variadic,
            } => {
                if !input.front().is_some_and(|next| next.is_punct(b"(")) {
                    return Ok(Step::Keep(token));
                }
                let (arguments, rparen) =
                    self.read_arguments(&token, input, parameters.len(), *variadic)?;
                let hideset = token
                    .hideset
                    .intersection(&rparen.hideset)
                    .with(&definition.name);
                let pieces = self.substitute(definition, &arguments, &token)?;
                Ok(Step::Replace(finish(pieces, &hideset, &token)))
            }
        }
    }

    /// Read the arguments of an invocation of the macro `name`, whose `(` is the next token of
    /// `input`. Return them with the closing parenthesis.
    fn read_arguments(
        &self,
        name: &PpToken,
        input: &mut VecDeque<PpToken>,
        parameters: usize,
        variadic: bool,
    ) -> Result<(Vec<Vec<PpToken>>, PpToken)> {
        input.pop_front();

        // The variable arguments of a variadic macro are a single argument, commas included.
        let limit = if variadic { parameters + 1 } else { usize::MAX };
        let mut arguments = vec![Vec::new()];
        let mut depth = 0usize;
        let rparen = loop {
            let Some(token) = input.pop_front() else {
                return Err(ErrorKind::UnterminatedInvocation(name.spelling()).at(self.location(name)));
            };
            if token.is_punct(b"(") {
                depth += 1;
            } else if token.is_punct(b")") {
                if depth == 0 {
                    break token;
                }
                depth -= 1;
            } else if token.is_punct(b",") && depth == 0 && arguments.len() < limit {
                arguments.push(Vec::new());
                continue;
            }
            if let Some(argument) = arguments.last_mut() {
                argument.push(token);
            }
        };

        let given = arguments.len();
        let count_error = || {
            ErrorKind::ArgumentCount {
                name: name.spelling(),
                given,
                expected: parameters,
            }
            .at(self.location(name))
        };
        match (parameters, variadic) {
            // `F()` passes no arguments, not one empty argument.
            (0, false) if given == 1 && arguments[0].is_empty() => arguments.clear(),
            (_, false) if given != parameters => return Err(count_error()),
            (_, true) if given == parameters => arguments.push(Vec::new()),
            (_, true) if given < parameters => return Err(count_error()),
            _ => {}
        }

        Ok((arguments, rparen))
    }

    /// Replace the parameters of a function-like macro by its arguments, applying `#` and `##`.
    fn substitute(
        &self,
        definition: &Macro,
        arguments: &[Vec<PpToken>],
        site: &PpToken,
    ) -> Result<Vec<Piece>> {
        let replacement = &definition.replacement;
        let mut pieces = Vec::with_capacity(replacement.len());

        let mut i = 0;
        while i < replacement.len() {
            let token = &replacement[i];
            let previous_is_paste = i > 0 && replacement[i - 1].is_punct(b"##");
            let next_is_paste = replacement.get(i + 1).is_some_and(|next| next.is_punct(b"##"));

            if token.is_punct(b"#") {
                if let Some(index) = replacement.get(i + 1).and_then(|next| definition.parameter(next)) {
                    pieces.push(Piece::Token(stringize(token, &arguments[index])));
                    i += 2;
                    continue;
                }
            }

            let Some(index) = definition.parameter(token) else {
                pieces.push(Piece::of(token));
                i += 1;
                continue;
            };

            // Operands of `##` are not macro-expanded.
            let mut argument = if previous_is_paste || next_is_paste {
                arguments[index].clone()
            } else {
                self.expand(arguments[index].clone())?
            };
            match argument.first_mut() {
                Some(first) => first.after_whitespace = token.after_whitespace,
                None if previous_is_paste || next_is_paste => pieces.push(Piece::Placemarker),
                None => {}
            }
            pieces.extend(argument.into_iter().map(Piece::Token));
            i += 1;
        }

        self.paste_all(pieces, site)
    }

    /// Apply every `##` operator in `pieces`, from left to right.
    fn paste_all(&self, pieces: Vec<Piece>, site: &PpToken) -> Result<Vec<Piece>> {
        let mut output: Vec<Piece> = Vec::with_capacity(pieces.len());
        let mut pieces = pieces.into_iter();
        while let Some(piece) = pieces.next() {
            if !matches!(piece, Piece::Paste(_)) {
                output.push(piece);
                continue;
            }
            let (Some(lhs), Some(rhs)) = (output.pop(), pieces.next()) else {
                return Err(ErrorKind::PasteAtEdge.at(self.location(site)));
            };
            output.push(self.paste(lhs, rhs, site)?);
        }
        Ok(output)
    }

    /// Concatenate two pieces into a single token, section 6.10.3.3 of C17.
    fn paste(&self, lhs: Piece, rhs: Piece, site: &PpToken) -> Result<Piece> {
        let (lhs, rhs) = match (lhs, rhs) {
            (Piece::Placemarker, rhs) => return Ok(rhs),
            (lhs, Piece::Placemarker) => return Ok(lhs),
            (Piece::Token(lhs) | Piece::Paste(lhs), Piece::Token(rhs) | Piece::Paste(rhs)) => {
                (lhs, rhs)
            }
        };

        let mut text = lhs.text.clone();
        text.extend_from_slice(&rhs.text);
        let mut tokens = lex(&text);
        match (tokens.pop(), tokens.is_empty()) {
            (Some(token), true) if token.text == text => Ok(Piece::Token(PpToken {
                kind: token.kind,
                text,
                ..lhs
            })),
            _ => Err(ErrorKind::InvalidPaste(lhs.spelling(), rhs.spelling()).at(self.location(site))),
        }
    }
}

/// A copy of `template` with a new spelling.
fn respell(template: &PpToken, kind: TokenKind, text: Vec<u8>) -> PpToken {
    PpToken {
        kind,
        text,
        ..template.clone()
    }
}

/// Spell `bytes` as a string literal.
fn quote(bytes: &[u8]) -> Vec<u8> {
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'"');
    for &byte in bytes {
        if matches!(byte, b'"' | b'\\') {
            quoted.push(b'\\');
        }
        quoted.push(byte);
    }
    quoted.push(b'"');
    quoted
}

/// Apply the `#` operator to an argument, section 6.10.3.2 of C17.
fn stringize(hash: &PpToken, argument: &[PpToken]) -> PpToken {
    let mut text = vec![b'"'];
    for (i, token) in argument.iter().enumerate() {
        if i > 0 && token.after_whitespace {
            text.push(b' ');
        }
        if matches!(token.kind, TokenKind::Str | TokenKind::Char) {
            for &byte in &token.text {
                if matches!(byte, b'"' | b'\\') {
                    text.push(b'\\');
                }
                text.push(byte);
            }
        } else {
            text.extend_from_slice(&token.text);
        }
    }
    text.push(b'"');
    respell(hash, TokenKind::Str, text)
}

/// Turn the pieces of a replacement into tokens that appear where the macro was invoked.
fn finish(pieces: Vec<Piece>, hideset: &HideSet, site: &PpToken) -> Vec<PpToken> {
    let mut tokens: Vec<PpToken> = pieces
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Token(token) | Piece::Paste(token) => Some(token),
            Piece::Placemarker => None,
        })
        .map(|token| PpToken {
            hideset: token.hideset.union(hideset),
            line: site.line,
            column: site.column,
            ..token
        })
        .collect();
    if let Some(first) = tokens.first_mut() {
        first.after_whitespace = site.after_whitespace;
    }
    tokens
}
