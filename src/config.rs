//! Preprocessor configuration.
use std::{convert::Infallible, path::PathBuf, str::FromStr};

/// A macro defined before preprocessing starts, like the `-D` option of a compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    pub value: Option<String>,
}

impl MacroDefinition {
    /// A macro defined as `1`.
    pub fn defined(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
        }
    }

    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    /// The text of the `#define` directive for this macro. `NAME(x)=x` defines a function-like
    /// macro.
    pub(crate) fn directive(&self) -> String {
        format!("#define {} {}\n", self.name, self.value.as_deref().unwrap_or("1"))
    }
}

impl FromStr for MacroDefinition {
    type Err = Infallible;

    /// Parse `NAME` or `NAME=VALUE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once('=') {
            Some((name, value)) => Self::with_value(name, value),
            None => Self::defined(s),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directories searched by `#include`, in order.
    pub include_dirs: Vec<PathBuf>,
    /// Macros defined after the predefined ones.
    pub defines: Vec<MacroDefinition>,
    /// Macros undefined after `defines` are applied.
    pub undefines: Vec<String>,
    /// How many `#include`s can be nested.
    pub max_include_depth: usize,
    /// Whether trigraph sequences are replaced.
    pub trigraphs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            defines: Vec::new(),
            undefines: Vec::new(),
            max_include_depth: 200,
            trigraphs: true,
        }
    }
}

impl Config {
    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn define(mut self, definition: MacroDefinition) -> Self {
        self.defines.push(definition);
        self
    }

    pub fn undefine(mut self, name: impl Into<String>) -> Self {
        self.undefines.push(name.into());
        self
    }

    pub fn trigraphs(mut self, trigraphs: bool) -> Self {
        self.trigraphs = trigraphs;
        self
    }

    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}
