//! The preprocessing driver, section 6.10 of C17.
//!
//! Every source file goes through translation phases 1 and 2, is tokenized and split into logical
//! lines. Lines starting with `#` are directives. Runs of text lines in groups that are not
//! skipped are macro-expanded together, so a macro invocation can span several lines.
mod expand;
mod macros;
mod token;

#[cfg(test)]
mod tests;

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

use tracing::debug;

pub use macros::{Macro, MacroKind, MacroTable};
pub(crate) use token::lex;
pub use token::{HideSet, PpToken};

use crate::{
    config::Config,
    diagnostics::{Diagnostics, Warning},
    earley::{parse, ParseTree, RuleId},
    error::{ErrorKind, Location, Result},
    eval::eval_constant_expression,
    grammar::c::{self, Rule, Tag},
    lexer::{self, TokenKind},
    phases,
    span::{FileId, SourceMap},
};

use self::expand::Expander;

/// The tokens of one line of output.
pub type Line = Vec<PpToken>;

/// The result of preprocessing a translation unit.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub lines: Vec<Line>,
}

impl Output {
    /// Append expanded text. `starts` holds the physical line of the first token of every
    /// logical line the text came from, so tokens are grouped by logical line.
    fn push_tokens(&mut self, tokens: Vec<PpToken>, starts: &[usize]) {
        let mut current = None;
        for token in tokens {
            let line = starts.partition_point(|&start| start <= token.line);
            if current != Some(line) {
                current = Some(line);
                self.lines.push(Vec::new());
            }
            if let Some(line) = self.lines.last_mut() {
                line.push(token);
            }
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", spell(line))?;
        }
        Ok(())
    }
}

/// Spell `tokens` on one line, with a space wherever the source had white-space or where two
/// tokens would otherwise lex as something else.
fn spell(tokens: &[PpToken]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && (token.after_whitespace || needs_space(&tokens[i - 1], token)) {
            text.push(' ');
        }
        text.push_str(&String::from_utf8_lossy(&token.text));
    }
    text
}

fn needs_space(previous: &PpToken, next: &PpToken) -> bool {
    let mut text = previous.text.clone();
    text.extend_from_slice(&next.text);
    !matches!(
        lex(&text).as_slice(),
        [first, second] if first.text == previous.text && second.text == next.text
    )
}

/// Where a `#if` chain is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    /// The current group is included.
    Taking,
    /// An earlier group of the chain was included.
    Taken,
    /// No group of the chain was included yet.
    Waiting,
    /// The whole chain is inside a skipped group.
    Skipped,
}

struct Conditional {
    state: GroupState,
    seen_else: bool,
    /// The location of the `#if`, for unterminated conditionals.
    location: Location,
}

fn is_live(conditionals: &[Conditional]) -> bool {
    conditionals
        .last()
        .map_or(true, |conditional| conditional.state == GroupState::Taking)
}

/// Consecutive text lines waiting to be expanded.
#[derive(Default)]
struct Text {
    tokens: Vec<PpToken>,
    /// The physical line of the first token of every logical line.
    starts: Vec<usize>,
}

/// The state of the file being preprocessed.
struct FileContext {
    /// The presumed name of the file, changed by `#line`.
    name: String,
    /// The directory searched first by `#include "..."`.
    dir: Option<PathBuf>,
    /// The presumed line number minus the physical one.
    line_delta: i64,
    /// How many `#include`s led to this file.
    depth: usize,
    id: FileId,
}

impl FileContext {
    fn location(&self, token: &PpToken) -> Location {
        Location::new(self.name.clone(), token.line, token.columns())
    }
}

/// Preprocesses translation units, keeping the macros defined by one for the next.
pub struct Preprocessor {
    config: Config,
    macros: MacroTable,
    diagnostics: Diagnostics,
    sources: SourceMap,
    /// Files that contain `#pragma once`.
    once: HashSet<FileId>,
}

impl Preprocessor {
    /// Create a preprocessor with the predefined macros and the macros of `config`.
    pub fn new(config: Config) -> Result<Self> {
        let mut command_line = String::new();
        for definition in &config.defines {
            command_line.push_str(&definition.directive());
        }
        for name in &config.undefines {
            command_line.push_str(&format!("#undef {name}\n"));
        }

        let mut preprocessor = Self {
            config,
            macros: MacroTable::with_predefined(),
            diagnostics: Diagnostics::default(),
            sources: SourceMap::default(),
            once: HashSet::new(),
        };
        if !command_line.is_empty() {
            preprocessor.preprocess_bytes("<command line>", command_line.as_bytes())?;
        }
        Ok(preprocessor)
    }

    /// The warnings reported so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Preprocess source text that does not come from a file. `name` is used for `__FILE__` and
    /// diagnostics.
    pub fn preprocess_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<Output> {
        let id = self.sources.store_bytes(name, bytes);
        self.preprocess_stored(id, None)
    }

    pub fn preprocess_file(&mut self, path: impl AsRef<Path>) -> Result<Output> {
        let path = path.as_ref();
        let id = self.sources.read_file(path)?;
        self.preprocess_stored(id, path.parent().map(Path::to_path_buf))
    }

    fn preprocess_stored(&mut self, id: FileId, dir: Option<PathBuf>) -> Result<Output> {
        let mut context = FileContext {
            name: self.sources.get(id).name.clone(),
            dir,
            line_delta: 0,
            depth: 0,
            id,
        };
        let mut output = Output::default();
        self.run(&mut context, &mut output)?;
        Ok(output)
    }

    fn run(&mut self, context: &mut FileContext, output: &mut Output) -> Result<()> {
        let bytes = Rc::clone(&self.sources.get(context.id).bytes);
        let normalized = phases::normalize(&bytes, self.config.trigraphs);
        let line_starts = phases::line_starts(&bytes);
        let buffer = lexer::tokenize(&normalized.bytes);

        if let Some(offset) = buffer.unterminated_comment() {
            let (line, column) =
                phases::line_column(&line_starts, normalized.original_offset(offset));
            self.diagnostics.push(Warning::new(
                "unterminated comment",
                Location::new(context.name.clone(), line, column..column + 2),
            ));
        }

        let lines: Vec<Line> = buffer
            .lines()
            .map(|line| {
                line.iter()
                    .map(|token| PpToken::from_token(token, &normalized, &line_starts))
                    .collect()
            })
            .collect();

        let mut conditionals = Vec::new();
        let mut text = Text::default();
        for line in lines {
            let Some(first) = line.first() else {
                continue;
            };
            if first.is_punct(b"#") {
                self.flush(context, &mut text, output)?;
                self.directive(context, &line, &mut conditionals, output)?;
            } else if is_live(&conditionals) {
                text.starts.push(first.line);
                text.tokens.extend(line);
            }
        }
        self.flush(context, &mut text, output)?;

        match conditionals.pop() {
            Some(open) => Err(ErrorKind::UnterminatedConditional.at(open.location)),
            None => Ok(()),
        }
    }

    /// Expand the pending text lines into `output`.
    fn flush(&self, context: &FileContext, text: &mut Text, output: &mut Output) -> Result<()> {
        let Text { tokens, starts } = std::mem::take(text);
        if tokens.is_empty() {
            return Ok(());
        }
        let tokens = self.expander(context).expand(tokens)?;
        output.push_tokens(tokens, &starts);
        Ok(())
    }

    fn expander<'a>(&'a self, context: &'a FileContext) -> Expander<'a> {
        Expander::new(&self.macros, &context.name, context.line_delta)
    }

    fn warn_extra_tokens(&self, context: &FileContext, line: &[PpToken], used: usize) {
        if let (Some(name), Some(extra)) = (line.get(1), line.get(used)) {
            self.diagnostics.push(Warning::new(
                format!("extra tokens at end of #{} directive", name.spelling()),
                context.location(extra),
            ));
        }
    }

    fn directive(
        &mut self,
        context: &mut FileContext,
        line: &[PpToken],
        conditionals: &mut Vec<Conditional>,
        output: &mut Output,
    ) -> Result<()> {
        let location = context.location(&line[0]);
        let name = line.get(1).filter(|token| token.is_ident());
        let live = is_live(conditionals);

        // Skipped groups are only scanned for the names of conditional directives.
        match name.map(|name| name.text.as_slice()) {
            Some(b"if" | b"ifdef" | b"ifndef") if !live => {
                conditionals.push(Conditional {
                    state: GroupState::Skipped,
                    seen_else: false,
                    location,
                });
                return Ok(());
            }
            Some(b"elif") => return self.elif(context, line, conditionals, location),
            Some(b"else") => return self.r#else(context, line, conditionals, location),
            Some(b"endif") => {
                let Some(conditional) = conditionals.pop() else {
                    return Err(ErrorKind::Unbalanced("endif").at(location));
                };
                if conditional.state != GroupState::Skipped {
                    self.warn_extra_tokens(context, line, 2);
                }
                return Ok(());
            }
            _ if !live => return Ok(()),
            _ => {}
        }

        debug!(
            "{}:{}: directive #{}",
            context.name,
            location.line,
            name.map(PpToken::spelling).unwrap_or_default()
        );
        let tree = parse(c::grammar(), Rule::Directive, line)
            .ok_or_else(|| ErrorKind::InvalidDirective.at(location.clone()))?;
        let rest = |index: usize| -> Vec<PpToken> {
            tree.tree(index)
                .map(|tokens| tokens.leaves().into_iter().cloned().collect())
                .unwrap_or_default()
        };

        match tree.tag {
            Tag::If => {
                let taken = self.condition(context, rest(2), &location)?;
                conditionals.push(Conditional::new(taken, location));
            }
            Tag::Ifdef | Tag::Ifndef => {
                let name = leaf(&tree, 2, "identifier", &location)?;
                let defined = self.macros.is_defined(&name.text);
                self.warn_extra_tokens(context, line, 3);
                conditionals.push(Conditional::new(defined == (tree.tag == Tag::Ifdef), location));
            }
            Tag::Include => self.include(context, rest(2), location, output)?,
            Tag::DefineObject | Tag::DefineFunction | Tag::DefineVariadic => {
                let definition = self.definition(context, &tree, &location)?;
                self.macros
                    .define(definition)
                    .map_err(|kind| kind.at(location))?;
            }
            Tag::Undef => {
                let name = leaf(&tree, 2, "identifier", &location)?;
                self.warn_extra_tokens(context, line, 3);
                self.macros.undef(&name.text).map_err(|kind| kind.at(location))?;
            }
            Tag::Line => {
                let last_line = line.last().map_or(location.line, |token| token.line);
                self.line(context, rest(2), last_line, location)?;
            }
            Tag::Error => return Err(ErrorKind::ErrorDirective(spell(&rest(2))).at(location)),
            Tag::Pragma => {
                let tokens = rest(2);
                if matches!(tokens.as_slice(), [once] if once.is_ident() && once.text == b"once") {
                    debug!("{} is included once", context.name);
                    self.once.insert(context.id);
                } else {
                    debug!("ignoring #pragma {}", spell(&tokens));
                }
            }
            Tag::Null => {}
            _ => return Err(ErrorKind::InvalidDirective.at(location)),
        }

        Ok(())
    }

    fn elif(
        &self,
        context: &FileContext,
        line: &[PpToken],
        conditionals: &mut [Conditional],
        location: Location,
    ) -> Result<()> {
        let Some(conditional) = conditionals.last_mut() else {
            return Err(ErrorKind::Unbalanced("elif").at(location));
        };
        if conditional.seen_else {
            return Err(ErrorKind::AfterElse("elif").at(location));
        }
        match conditional.state {
            GroupState::Taking => conditional.state = GroupState::Taken,
            GroupState::Waiting => {
                if self.condition(context, line[2..].to_vec(), &location)? {
                    conditional.state = GroupState::Taking;
                }
            }
            GroupState::Taken | GroupState::Skipped => {}
        }
        Ok(())
    }

    fn r#else(
        &self,
        context: &FileContext,
        line: &[PpToken],
        conditionals: &mut [Conditional],
        location: Location,
    ) -> Result<()> {
        let Some(conditional) = conditionals.last_mut() else {
            return Err(ErrorKind::Unbalanced("else").at(location));
        };
        if conditional.seen_else {
            return Err(ErrorKind::AfterElse("else").at(location));
        }
        conditional.seen_else = true;
        conditional.state = match conditional.state {
            GroupState::Waiting => GroupState::Taking,
            GroupState::Taking => GroupState::Taken,
            state => state,
        };
        if conditional.state != GroupState::Skipped {
            self.warn_extra_tokens(context, line, 2);
        }
        Ok(())
    }

    /// Evaluate the controlling expression of `#if` or `#elif`, section 6.10.1 of C17.
    fn condition(
        &self,
        context: &FileContext,
        tokens: Vec<PpToken>,
        location: &Location,
    ) -> Result<bool> {
        let tokens = self.replace_defined(context, tokens)?;
        let tokens = self.expander(context).keep_defined().expand(tokens)?;
        let tokens: Vec<PpToken> = self
            .replace_defined(context, tokens)?
            .into_iter()
            .map(|token| {
                if token.is_ident() && !c::is_keyword(&token) {
                    PpToken {
                        kind: TokenKind::Number,
                        text: b"0".to_vec(),
                        ..token
                    }
                } else {
                    token
                }
            })
            .collect();
        if tokens.is_empty() {
            return Err(ErrorKind::MissingExpression.at(location.clone()));
        }

        let tree = parse(c::grammar(), Rule::ConstantExpression, &tokens).ok_or_else(|| {
            let columns = match (tokens.first(), tokens.last()) {
                (Some(first), Some(last)) if first.line == last.line => {
                    first.column..last.columns().end
                }
                _ => location.columns.clone(),
            };
            ErrorKind::UnparseableExpression.at(Location::new(
                context.name.clone(),
                location.line,
                columns,
            ))
        })?;
        let value = eval_constant_expression(&tree, &self.diagnostics, location)?;
        Ok(value.is_true())
    }

    /// Replace `defined X` and `defined ( X )` by `1` or `0`.
    fn replace_defined(&self, context: &FileContext, tokens: Vec<PpToken>) -> Result<Vec<PpToken>> {
        let mut output = Vec::with_capacity(tokens.len());
        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            if !(token.is_ident() && token.text == b"defined") {
                output.push(token);
                continue;
            }
            let error = ErrorKind::DefinedWithoutIdentifier.at(context.location(&token));
            let name = match tokens.next() {
                Some(name) if name.is_ident() => name,
                Some(open) if open.is_punct(b"(") => match (tokens.next(), tokens.next()) {
                    (Some(name), Some(close)) if name.is_ident() && close.is_punct(b")") => name,
                    _ => return Err(error),
                },
                _ => return Err(error),
            };
            let value = if self.macros.is_defined(&name.text) {
                b"1"
            } else {
                b"0"
            };
            output.push(PpToken {
                kind: TokenKind::Number,
                text: value.to_vec(),
                ..token
            });
        }
        Ok(output)
    }

    /// Build the macro defined by a `#define` directive.
    fn definition(
        &self,
        context: &FileContext,
        tree: &ParseTree<'_, PpToken, Tag>,
        location: &Location,
    ) -> Result<Macro> {
        let name = leaf(tree, 2, "identifier", location)?;
        let list = |rule: Rule| -> Vec<PpToken> {
            tree.trees()
                .find(|child| child.rule == RuleId::from(rule))
                .map(|child| child.leaves().into_iter().cloned().collect())
                .unwrap_or_default()
        };

        let (kind, replacement) = match tree.tag {
            Tag::DefineObject => {
                let replacement = list(Rule::ReplacementList);
                if let Some(first) = replacement.first().filter(|first| !first.after_whitespace) {
                    self.diagnostics.push(Warning::new(
                        "missing white-space after the macro name",
                        context.location(first),
                    ));
                }
                (MacroKind::Object, replacement)
            }
            tag => {
                let parameters = list(Rule::IdentifierList)
                    .into_iter()
                    .map(|parameter| parameter.text)
                    .collect();
                let kind = MacroKind::Function {
                    parameters,
                    variadic: tag == Tag::DefineVariadic,
                };
                (kind, list(Rule::PpTokens))
            }
        };

        Ok(Macro {
            name: name.text.clone(),
            kind,
            replacement,
        })
    }

    /// Process `#include`, section 6.10.2 of C17.
    fn include(
        &mut self,
        context: &FileContext,
        tokens: Vec<PpToken>,
        location: Location,
        output: &mut Output,
    ) -> Result<()> {
        let tokens = match tokens.as_slice() {
            [header] if header.kind.is_header() => tokens,
            _ => self.expander(context).expand(tokens)?,
        };
        let (name, angled) =
            header_name(&tokens).ok_or_else(|| ErrorKind::InvalidInclude.at(location.clone()))?;
        if context.depth >= self.config.max_include_depth {
            return Err(ErrorKind::IncludeTooDeep.at(location));
        }
        let Some(path) = self.resolve(context, &name, angled) else {
            return Err(ErrorKind::IncludeNotFound(name).at(location));
        };

        let id = self.sources.read_file(&path)?;
        if self.once.contains(&id) {
            debug!("skipping {}, already included", path.display());
            return Ok(());
        }
        debug!("including {}", path.display());

        let file = self.sources.get(id);
        let mut included = FileContext {
            name: file.name.clone(),
            dir: file.path.as_deref().and_then(Path::parent).map(Path::to_path_buf),
            line_delta: 0,
            depth: context.depth + 1,
            id,
        };
        self.run(&mut included, output)
    }

    /// Find the file named by an `#include`. Quoted names are searched in the directory of the
    /// current file first.
    fn resolve(&self, context: &FileContext, name: &str, angled: bool) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        let current = context.dir.as_ref().filter(|_| !angled);
        current
            .into_iter()
            .chain(&self.config.include_dirs)
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
    }

    /// Process `#line`, section 6.10.4 of C17. `last_line` is the physical line the directive
    /// ends on.
    fn line(
        &self,
        context: &mut FileContext,
        tokens: Vec<PpToken>,
        last_line: usize,
        location: Location,
    ) -> Result<()> {
        let tokens = self.expander(context).expand(tokens)?;
        let (number, name) = match tokens.as_slice() {
            [number] => (number, None),
            [number, name] if name.kind.is_str() && name.text.starts_with(b"\"") => {
                (number, Some(name))
            }
            _ => return Err(ErrorKind::InvalidLine.at(location)),
        };
        let number = Some(number)
            .filter(|number| number.text.iter().all(u8::is_ascii_digit))
            .and_then(|number| std::str::from_utf8(&number.text).ok())
            .and_then(|number| number.parse::<i64>().ok())
            .ok_or_else(|| ErrorKind::InvalidLine.at(location.clone()))?;

        context.line_delta = number - (last_line as i64 + 1);
        if let Some(name) = name {
            context.name = unquote(&name.text);
        }
        Ok(())
    }
}

impl Conditional {
    fn new(taken: bool, location: Location) -> Self {
        Self {
            state: if taken {
                GroupState::Taking
            } else {
                GroupState::Waiting
            },
            seen_else: false,
            location,
        }
    }
}

fn leaf<'i>(
    tree: &ParseTree<'i, PpToken, Tag>,
    index: usize,
    terminal: &'static str,
    location: &Location,
) -> Result<&'i PpToken> {
    tree.leaf(index)
        .ok_or_else(|| ErrorKind::MissingTerminal(terminal).at(location.clone()))
}

/// The name of the file an `#include` refers to, and whether it uses the `<...>` form.
fn header_name(tokens: &[PpToken]) -> Option<(String, bool)> {
    match tokens {
        [header] if matches!(header.kind, TokenKind::Header | TokenKind::Str) => {
            let angled = header.text.starts_with(b"<");
            if !angled && !header.text.starts_with(b"\"") {
                return None;
            }
            let inner = &header.text[1..header.text.len() - 1];
            Some((String::from_utf8_lossy(inner).into_owned(), angled))
        }
        [open, inner @ .., close] if open.is_punct(b"<") && close.is_punct(b">") => {
            let mut name = String::new();
            for (i, token) in inner.iter().enumerate() {
                if i > 0 && token.after_whitespace {
                    name.push(' ');
                }
                name.push_str(&token.spelling());
            }
            Some((name, true))
        }
        _ => None,
    }
}

/// The contents of a string literal, with escaped quotes and backslashes restored.
fn unquote(literal: &[u8]) -> String {
    let inner = literal
        .strip_prefix(b"\"")
        .and_then(|inner| inner.strip_suffix(b"\""))
        .unwrap_or(literal);
    let mut bytes = Vec::with_capacity(inner.len());
    let mut escaped = false;
    for &byte in inner {
        if byte == b'\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        bytes.push(byte);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
