use std::collections::HashMap;

use tracing::debug;

use crate::error::ErrorKind;

use super::PpToken;

pub(crate) const VA_ARGS: &[u8] = b"__VA_ARGS__";

/// Names that `#define` and `#undef` cannot touch, section 6.10.8 of C17.
const RESERVED: &[&[u8]] = &[
    b"defined",
    b"__LINE__",
    b"__FILE__",
    b"__STDC__",
    b"__STDC_VERSION__",
    b"__STDC_HOSTED__",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MacroKind {
    Object,
    Function {
        parameters: Vec<Vec<u8>>,
        /// Whether the last parameter is `...`, named `__VA_ARGS__` in the replacement list.
        variadic: bool,
    },
    /// `__LINE__`
    Line,
    /// `__FILE__`
    File,
}

#[derive(Clone, Debug)]
pub struct Macro {
    pub name: Vec<u8>,
    pub kind: MacroKind,
    pub replacement: Vec<PpToken>,
}

impl Macro {
    /// The index of the argument `token` stands for in the replacement list, if any.
    pub(crate) fn parameter(&self, token: &PpToken) -> Option<usize> {
        let MacroKind::Function {
            parameters,
            variadic,
        } = &self.kind
        else {
            return None;
        };
        if !token.is_ident() {
            return None;
        }
        if *variadic && token.text == VA_ARGS {
            return Some(parameters.len());
        }
        parameters.iter().position(|parameter| *parameter == token.text)
    }

    /// Check the constraints of section 6.10.3 of C17 on a new definition.
    fn validate(&self) -> Result<(), ErrorKind> {
        let (parameters, variadic) = match &self.kind {
            MacroKind::Function {
                parameters,
                variadic,
            } => (parameters.as_slice(), *variadic),
            _ => (&[][..], false),
        };

        for (i, parameter) in parameters.iter().enumerate() {
            if parameter == VA_ARGS {
                return Err(ErrorKind::InvalidVaArgs);
            }
            if parameters[..i].contains(parameter) {
                return Err(ErrorKind::DuplicateParameter(
                    String::from_utf8_lossy(parameter).into_owned(),
                ));
            }
        }

        let replacement = &self.replacement;
        if replacement.first().is_some_and(|token| token.is_punct(b"##"))
            || replacement.last().is_some_and(|token| token.is_punct(b"##"))
        {
            return Err(ErrorKind::PasteAtEdge);
        }
        if !variadic && replacement.iter().any(|token| token.is_ident() && token.text == VA_ARGS) {
            return Err(ErrorKind::InvalidVaArgs);
        }
        if matches!(self.kind, MacroKind::Function { .. }) {
            for (i, token) in replacement.iter().enumerate() {
                let operand = replacement.get(i + 1).and_then(|next| self.parameter(next));
                if token.is_punct(b"#") && operand.is_none() {
                    return Err(ErrorKind::InvalidStringize);
                }
            }
        }

        Ok(())
    }

    /// Two definitions are the same if they have the same parameters and their replacement lists
    /// are spelled the same, with white-space in the same places.
    fn same_definition(&self, other: &Macro) -> bool {
        self.kind == other.kind
            && self.replacement.len() == other.replacement.len()
            && self
                .replacement
                .iter()
                .zip(&other.replacement)
                .enumerate()
                .all(|(i, (a, b))| {
                    a.text == b.text && (i == 0 || a.after_whitespace == b.after_whitespace)
                })
    }
}

/// Every macro currently defined.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<Vec<u8>, Macro>,
}

impl MacroTable {
    /// A table with the macros every translation unit starts with, section 6.10.8.1 of C17.
    pub(crate) fn with_predefined() -> Self {
        let mut table = Self::default();
        for (name, kind) in [(&b"__LINE__"[..], MacroKind::Line), (&b"__FILE__"[..], MacroKind::File)] {
            table.insert(Macro {
                name: name.to_vec(),
                kind,
                replacement: Vec::new(),
            });
        }
        for (name, value) in [
            ("__STDC__", "1"),
            ("__STDC_VERSION__", "201710L"),
            ("__STDC_HOSTED__", "1"),
        ] {
            table.insert(Macro {
                name: name.as_bytes().to_vec(),
                kind: MacroKind::Object,
                replacement: super::lex(value.as_bytes()),
            });
        }
        table
    }

    fn insert(&mut self, definition: Macro) {
        self.macros.insert(definition.name.clone(), definition);
    }

    /// Define a macro. Redefining a macro is only allowed if both definitions are the same.
    pub fn define(&mut self, definition: Macro) -> Result<(), ErrorKind> {
        let name = || String::from_utf8_lossy(&definition.name).into_owned();
        if RESERVED.contains(&definition.name.as_slice()) {
            return Err(ErrorKind::ReservedName(name()));
        }
        definition.validate()?;
        if let Some(previous) = self.macros.get(&definition.name) {
            if !previous.same_definition(&definition) {
                return Err(ErrorKind::Redefinition(name()));
            }
        }
        debug!("defining {}", name());
        self.insert(definition);
        Ok(())
    }

    /// Remove a macro. Removing a macro that is not defined does nothing.
    pub fn undef(&mut self, name: &[u8]) -> Result<(), ErrorKind> {
        if RESERVED.contains(&name) {
            return Err(ErrorKind::ReservedName(String::from_utf8_lossy(name).into_owned()));
        }
        self.macros.remove(name);
        Ok(())
    }

    pub fn lookup(&self, name: &[u8]) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &[u8]) -> bool {
        self.macros.contains_key(name)
    }
}
