use std::sync::OnceLock;

use super::{Detect, Status};

/// Every `punctuator` as listed in section 6.4.6 of C17.
pub(crate) const PUNCTUATORS: &[&str] = &[
    "[", "]", "(", ")", "{", "}", ".", "->", "++", "--", "&", "*", "+", "-", "~", "!", "/", "%",
    "<<", ">>", "<", ">", "<=", ">=", "==", "!=", "^", "|", "&&", "||", "?", ":", ";", "...", "=",
    "*=", "/=", "%=", "+=", "-=", "<<=", ">>=", "&=", "^=", "|=", ",", "#", "##", "<:", ":>", "<%",
    "%>", "%:", "%:%:",
];

/// A prefix tree over [`PUNCTUATORS`].
struct Trie {
    nodes: Vec<Node>,
}

#[derive(Default)]
struct Node {
    children: Vec<(u8, usize)>,
    /// Whether the path to this node spells a complete punctuator.
    terminal: bool,
}

impl Trie {
    const ROOT: usize = 0;

    fn build(words: &[&str]) -> Self {
        let mut trie = Trie {
            nodes: vec![Node::default()],
        };

        for word in words {
            let mut node = Self::ROOT;
            for &byte in word.as_bytes() {
                node = match trie.child(node, byte) {
                    Some(child) => child,
                    None => {
                        let child = trie.nodes.len();
                        trie.nodes.push(Node::default());
                        trie.nodes[node].children.push((byte, child));
                        child
                    }
                };
            }
            trie.nodes[node].terminal = true;
        }

        trie
    }

    fn child(&self, node: usize, byte: u8) -> Option<usize> {
        self.nodes[node]
            .children
            .iter()
            .find(|(edge, _)| *edge == byte)
            .map(|(_, child)| *child)
    }
}

fn trie() -> &'static Trie {
    static TRIE: OnceLock<Trie> = OnceLock::new();
    TRIE.get_or_init(|| Trie::build(PUNCTUATORS))
}

/// Detects a `punctuator` by walking the punctuator [`Trie`] one byte at a time.
#[derive(Clone, Debug)]
pub(crate) struct Punct {
    status: Status,
    node: usize,
}

impl Punct {
    pub(crate) fn new() -> Self {
        Self {
            status: Status::Incomplete,
            node: Trie::ROOT,
        }
    }
}

impl Detect for Punct {
    fn advance(&mut self, byte: u8) -> Status {
        if self.status == Status::Impossible {
            return Status::Impossible;
        }

        let trie = trie();
        self.status = match trie.child(self.node, byte) {
            Some(child) => {
                self.node = child;
                if trie.nodes[child].terminal {
                    Status::Match
                } else {
                    Status::Incomplete
                }
            }
            None => Status::Impossible,
        };

        self.status
    }

    fn status(&self) -> Status {
        self.status
    }
}
