//! A generic Earley parser.
//!
//! The parser keeps one `Chart` per input position. A chart holds every hypothesis, or
//! `Item`, that is still alive after consuming the input up to that position. Items refer to
//! the chart they started at and to the items that completed their symbols by index, so the
//! charts are arenas that live as long as the parse.
//!
//! Parsing never fails halfway: the only failure is that the last chart does not contain a
//! completed item for the root rule that started at the first chart.
mod grammar;
mod tree;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use tracing::trace;

pub use grammar::{
    alt, lit, nt, pred, Alternative, Grammar, GrammarBuilder, ProductionRule, RuleId, Scan, Symbol,
    Terminal,
};
pub use tree::{ParseNode, ParseTree};

/// Parse `input` starting from the `root` rule of `grammar`.
///
/// When the input can be derived in more than one way, the first derivation found is returned.
pub fn parse<'i, S: Scan, T: Copy>(
    grammar: &Grammar<S, T>,
    root: impl Into<RuleId>,
    input: &'i [S],
) -> Option<ParseTree<'i, S, T>> {
    let mut parser = Parser::new(grammar, root.into(), input);
    parser.run()?;
    let root = parser.recover()?;
    Some(parser.build(root))
}

/// The position of an [`Item`] inside the charts of a parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ItemRef {
    chart: usize,
    item: usize,
}

/// Something that completed one symbol of an [`Item`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Child {
    /// A terminal, matched by the input symbol at this index.
    Leaf(usize),
    /// A non-terminal, matched by this completed item.
    Node(ItemRef),
}

/// A step of [`Parser::build`].
enum Task<'i, S, T> {
    /// Turn a child into a node.
    Visit(Child),
    /// Give `tree` the last `count` nodes built as children.
    Assemble(ParseTree<'i, S, T>, usize),
}

#[derive(Clone, Debug)]
struct Item {
    rule: RuleId,
    alternative: usize,
    /// The number of symbols of the alternative that have been matched.
    dot: usize,
    /// The chart this item was predicted in.
    origin: usize,
    /// One child per matched symbol.
    children: Vec<Child>,
}

impl Item {
    fn key(&self) -> ItemKey {
        (self.rule, self.alternative, self.dot, self.origin)
    }

    fn advance(&self, child: Child) -> Item {
        let mut children = Vec::with_capacity(self.children.len() + 1);
        children.extend_from_slice(&self.children);
        children.push(child);
        Item {
            rule: self.rule,
            alternative: self.alternative,
            dot: self.dot + 1,
            origin: self.origin,
            children,
        }
    }
}

type ItemKey = (RuleId, usize, usize, usize);

/// Append-only set of items.
#[derive(Debug, Default)]
struct Chart {
    items: Vec<Item>,
    seen: HashSet<ItemKey>,
}

impl Chart {
    /// Add `item` unless an item with the same rule, alternative, dot and origin is already
    /// present. Return whether it was added.
    fn insert(&mut self, item: Item) -> bool {
        if self.seen.insert(item.key()) {
            self.items.push(item);
            true
        } else {
            false
        }
    }
}

struct Parser<'g, 'i, S, T> {
    grammar: &'g Grammar<S, T>,
    root: RuleId,
    input: &'i [S],
    charts: Vec<Chart>,
}

impl<'g, 'i, S: Scan, T: Copy> Parser<'g, 'i, S, T> {
    fn new(grammar: &'g Grammar<S, T>, root: RuleId, input: &'i [S]) -> Self {
        let mut initial = Chart::default();
        for alternative in 0..grammar.rule(root).alternatives.len() {
            initial.insert(Item {
                rule: root,
                alternative,
                dot: 0,
                origin: 0,
                children: Vec::new(),
            });
        }

        Self {
            grammar,
            root,
            input,
            charts: vec![initial],
        }
    }

    fn item(&self, at: ItemRef) -> &Item {
        &self.charts[at.chart].items[at.item]
    }

    fn next_symbol(&self, item: &Item) -> Option<&'g Symbol<S>> {
        self.grammar.symbol(item.rule, item.alternative, item.dot)
    }

    /// Build every chart. Return `None` as soon as a chart ends up empty.
    fn run(&mut self) -> Option<()> {
        self.close(0);
        for position in 0..self.input.len() {
            let next = self.scan(position);
            if next.items.is_empty() {
                trace!(
                    "{}: no item accepts input symbol {}",
                    self.grammar.rule(self.root).name,
                    position
                );
                return None;
            }
            self.charts.push(next);
            self.close(position + 1);
        }
        Some(())
    }

    /// Run the predictor and the completer over chart `k` until no new items appear. Return the
    /// number of items added.
    fn close(&mut self, k: usize) -> usize {
        let mut added = 0;
        let mut index = 0;

        while index < self.charts[k].items.len() {
            let current = ItemRef { chart: k, item: index };
            let item = self.item(current);
            let rule = item.rule;
            let origin = item.origin;

            match self.next_symbol(item) {
                Some(Symbol::NonTerminal(predicted)) => {
                    let predicted = *predicted;
                    for alternative in 0..self.grammar.rule(predicted).alternatives.len() {
                        let new = Item {
                            rule: predicted,
                            alternative,
                            dot: 0,
                            origin: k,
                            children: Vec::new(),
                        };
                        added += usize::from(self.charts[k].insert(new));
                    }
                }
                Some(Symbol::Terminal(_)) => {}
                None => {
                    // Every alternative consumes input, so `origin` is an earlier chart that
                    // already reached its fixpoint.
                    let waiting: Vec<Item> = self.charts[origin]
                        .items
                        .iter()
                        .filter(|parent| {
                            matches!(
                                self.next_symbol(parent),
                                Some(Symbol::NonTerminal(id)) if *id == rule
                            )
                        })
                        .map(|parent| parent.advance(Child::Node(current)))
                        .collect();
                    for new in waiting {
                        added += usize::from(self.charts[k].insert(new));
                    }
                }
            }

            index += 1;
        }

        added
    }

    /// Match the input symbol at `k` against the terminals expected by chart `k`, producing the
    /// seed of chart `k + 1`.
    fn scan(&self, k: usize) -> Chart {
        let symbol = &self.input[k];
        let mut next = Chart::default();
        for item in &self.charts[k].items {
            if let Some(Symbol::Terminal(terminal)) = self.next_symbol(item) {
                if terminal.accepts(symbol) {
                    next.insert(item.advance(Child::Leaf(k)));
                }
            }
        }
        next
    }

    /// Find the completed root item spanning the whole input.
    fn recover(&self) -> Option<ItemRef> {
        let chart = self.charts.len() - 1;
        let item = self.charts[chart].items.iter().position(|item| {
            item.rule == self.root && item.origin == 0 && self.next_symbol(item).is_none()
        })?;
        Some(ItemRef { chart, item })
    }

    /// Turn a completed item into a tree.
    ///
    /// Trees can be as deep as the input is long, so the nodes are built with an explicit stack
    /// of tasks instead of recursing.
    fn build(&self, at: ItemRef) -> ParseTree<'i, S, T> {
        let (mut root, children) = self.shape(at);
        let mut tasks: Vec<Task<'i, S, T>> = children.into_iter().rev().map(Task::Visit).collect();
        let mut nodes = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(Child::Leaf(index)) => nodes.push(ParseNode::Leaf(&self.input[index])),
                Task::Visit(Child::Node(at)) => {
                    let (tree, children) = self.shape(at);
                    tasks.push(Task::Assemble(tree, children.len()));
                    tasks.extend(children.into_iter().rev().map(Task::Visit));
                }
                Task::Assemble(mut tree, count) => {
                    tree.children = nodes.split_off(nodes.len().saturating_sub(count));
                    nodes.push(ParseNode::Tree(tree));
                }
            }
        }

        root.children = nodes;
        root
    }

    /// The tree for a completed item, still without children, and the children it will get.
    fn shape(&self, at: ItemRef) -> (ParseTree<'i, S, T>, Vec<Child>) {
        let item = self.item(at);
        let rule = self.grammar.rule(item.rule);
        if rule.list {
            return self.flatten(at);
        }

        let tree = ParseTree {
            rule: item.rule,
            tag: rule.alternatives[item.alternative].tag,
            range: item.origin..at.chart,
            children: Vec::new(),
        };
        (tree, item.children.clone())
    }

    /// The shape of a completed item of a list rule: a single node whose children are the
    /// elements of the list in input order. Literal terminals, which separate the elements, are
    /// dropped.
    ///
    /// A list of `n` elements is a chain of `n` items linked through their first child, so this
    /// walks the chain in a loop instead of recursing.
    fn flatten(&self, at: ItemRef) -> (ParseTree<'i, S, T>, Vec<Child>) {
        let top = self.item(at);
        let rule = self.grammar.rule(top.rule);

        let mut chain = Vec::new();
        let mut current = at;
        loop {
            let item = self.item(current);
            let recursive = matches!(
                rule.alternatives[item.alternative].symbols.first(),
                Some(Symbol::NonTerminal(id)) if *id == item.rule
            );
            match item.children.first() {
                Some(&Child::Node(inner)) if recursive => {
                    chain.push(current);
                    current = inner;
                }
                _ => break,
            }
        }

        let base = self.item(current);
        let mut children = self.elements(base, 0);
        for &link in chain.iter().rev() {
            children.extend(self.elements(self.item(link), 1));
        }

        let tree = ParseTree {
            rule: top.rule,
            tag: rule.alternatives[base.alternative].tag,
            range: top.origin..at.chart,
            children: Vec::new(),
        };
        (tree, children)
    }

    /// The children of `item` from `skip` on, without literal terminals.
    fn elements(&self, item: &Item, skip: usize) -> Vec<Child> {
        let symbols = &self.grammar.rule(item.rule).alternatives[item.alternative].symbols;
        symbols
            .iter()
            .zip(&item.children)
            .skip(skip)
            .filter(|(symbol, _)| !matches!(symbol, Symbol::Terminal(Terminal::Literal(_))))
            .map(|(_, &child)| child)
            .collect()
    }
}
