//! Context-free grammars consumed by the Earley parser, see [`parse`](super::parse).

use std::fmt;

/// The index of a [`ProductionRule`] inside its [`Grammar`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleId(pub usize);

/// Input symbols that literal terminals can be compared against.
pub trait Scan {
    /// Check if this symbol is spelled exactly as `literal`.
    fn is_literal(&self, literal: &[u8]) -> bool;
}

impl Scan for u8 {
    fn is_literal(&self, literal: &[u8]) -> bool {
        literal == std::slice::from_ref(self)
    }
}

/// A symbol that consumes exactly one input symbol.
pub enum Terminal<S> {
    Literal(&'static [u8]),
    Predicate(fn(&S) -> bool),
}

impl<S: Scan> Terminal<S> {
    pub fn accepts(&self, symbol: &S) -> bool {
        match self {
            Terminal::Literal(literal) => symbol.is_literal(literal),
            Terminal::Predicate(predicate) => predicate(symbol),
        }
    }
}

impl<S> fmt::Debug for Terminal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Literal(literal) => write!(f, "{:?}", String::from_utf8_lossy(literal)),
            Terminal::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

#[derive(Debug)]
pub enum Symbol<S> {
    NonTerminal(RuleId),
    Terminal(Terminal<S>),
}

/// One right-hand side of a [`ProductionRule`]. The tag tells consumers of a parse tree which
/// construction was matched.
#[derive(Debug)]
pub struct Alternative<S, T> {
    pub symbols: Vec<Symbol<S>>,
    pub tag: T,
}

#[derive(Debug)]
pub struct ProductionRule<S, T> {
    pub name: &'static str,
    pub alternatives: Vec<Alternative<S, T>>,
    /// Whether this is a left-recursive list rule (`A -> A x | x`), whose derivations are
    /// flattened into a single node.
    pub list: bool,
}

/// An immutable set of production rules indexed by [`RuleId`].
#[derive(Debug)]
pub struct Grammar<S, T> {
    rules: Vec<ProductionRule<S, T>>,
}

impl<S, T> Grammar<S, T> {
    pub fn builder() -> GrammarBuilder<S, T> {
        GrammarBuilder { rules: Vec::new() }
    }

    pub fn rule(&self, id: RuleId) -> &ProductionRule<S, T> {
        &self.rules[id.0]
    }

    /// The symbol after the first `dot` symbols of an alternative, if any.
    pub(crate) fn symbol(&self, id: RuleId, alternative: usize, dot: usize) -> Option<&Symbol<S>> {
        self.rules[id.0].alternatives[alternative].symbols.get(dot)
    }
}

/// Builds a [`Grammar`] out of rules given in any order.
pub struct GrammarBuilder<S, T> {
    rules: Vec<Option<ProductionRule<S, T>>>,
}

impl<S, T> GrammarBuilder<S, T> {
    /// Define the rule with the given id.
    pub fn rule(
        &mut self,
        id: impl Into<RuleId>,
        name: &'static str,
        alternatives: Vec<Alternative<S, T>>,
    ) -> &mut Self {
        self.insert(id.into(), name, alternatives, false)
    }

    /// Define the left-recursive list rule with the given id.
    pub fn list(
        &mut self,
        id: impl Into<RuleId>,
        name: &'static str,
        alternatives: Vec<Alternative<S, T>>,
    ) -> &mut Self {
        self.insert(id.into(), name, alternatives, true)
    }

    fn insert(
        &mut self,
        id: RuleId,
        name: &'static str,
        alternatives: Vec<Alternative<S, T>>,
        list: bool,
    ) -> &mut Self {
        assert!(
            alternatives.iter().all(|alternative| !alternative.symbols.is_empty()),
            "rule `{name}` has an empty alternative"
        );
        if self.rules.len() <= id.0 {
            self.rules.resize_with(id.0 + 1, || None);
        }
        self.rules[id.0] = Some(ProductionRule {
            name,
            alternatives,
            list,
        });
        self
    }

    /// Finish the grammar.
    ///
    /// Panics if a rule id was skipped or a non-terminal refers to an undefined rule. Grammars are
    /// static tables, so this is a bug in the table and not in the input being parsed.
    pub fn build(self) -> Grammar<S, T> {
        let rules: Vec<_> = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(id, rule)| rule.unwrap_or_else(|| panic!("rule {id} is not defined")))
            .collect();

        for rule in &rules {
            for alternative in &rule.alternatives {
                for symbol in &alternative.symbols {
                    if let Symbol::NonTerminal(id) = symbol {
                        assert!(id.0 < rules.len(), "rule `{}` refers to rule {}", rule.name, id.0);
                    }
                }
            }
        }

        Grammar { rules }
    }
}

/// A non-terminal symbol.
pub fn nt<S>(id: impl Into<RuleId>) -> Symbol<S> {
    Symbol::NonTerminal(id.into())
}

/// A terminal matching the input symbol spelled `literal`.
pub fn lit<S>(literal: &'static str) -> Symbol<S> {
    Symbol::Terminal(Terminal::Literal(literal.as_bytes()))
}

/// A terminal matching any input symbol accepted by `predicate`.
pub fn pred<S>(predicate: fn(&S) -> bool) -> Symbol<S> {
    Symbol::Terminal(Terminal::Predicate(predicate))
}

pub fn alt<S, T>(tag: T, symbols: Vec<Symbol<S>>) -> Alternative<S, T> {
    Alternative { symbols, tag }
}
