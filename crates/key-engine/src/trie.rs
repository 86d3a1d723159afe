//! Key trie: prefix tree from key sequences to command descriptors.
//!
//! Flat node vector with small inline edge lists for cache locality. Every
//! path from the root to a terminal is the unique sequence identifying that
//! command within one mapping mode; registration rejects any sequence that
//! would put two terminals in a strict-prefix relationship, so a terminal
//! node is always a leaf and ambiguity is resolved purely by waiting for
//! more input.

use key_events::{KeyEvent, keys_to_string};
use smallvec::SmallVec;
use thiserror::Error;

use crate::command::CommandDescriptor;

/// Root node index; a fresh builder cursor always starts here.
pub(crate) const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct Edge {
    key: KeyEvent,
    next: usize,
}

#[derive(Debug, Clone)]
struct Node {
    terminal: Option<usize>,
    edges: SmallVec<[Edge; 4]>,
}

impl Node {
    fn new() -> Self {
        Self {
            terminal: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TrieError {
    #[error("`{sequence}` is already registered")]
    Duplicate { sequence: String },
    #[error("`{sequence}` would shadow commands it is a prefix of")]
    PrefixOfExisting { sequence: String },
    #[error("`{sequence}` extends the existing command `{prefix}`")]
    ExtendsExisting { sequence: String, prefix: String },
    #[error("empty key sequence")]
    Empty,
}

#[derive(Debug, Default)]
pub struct KeyTrie {
    nodes: Vec<Node>,
    commands: Vec<CommandDescriptor>,
}

impl KeyTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            commands: Vec::new(),
        }
    }

    /// Register `sequence` as the unique spelling of `command`.
    pub fn register(
        &mut self,
        sequence: &[KeyEvent],
        command: CommandDescriptor,
    ) -> Result<(), TrieError> {
        if sequence.is_empty() {
            return Err(TrieError::Empty);
        }
        if self.nodes.is_empty() {
            self.nodes.push(Node::new());
        }
        let mut cur = ROOT;
        for (i, key) in sequence.iter().enumerate() {
            if self.nodes[cur].terminal.is_some() {
                // Walking through an existing terminal: prefix conflict.
                return Err(TrieError::ExtendsExisting {
                    sequence: keys_to_string(sequence),
                    prefix: keys_to_string(&sequence[..i]),
                });
            }
            cur = match self.nodes[cur].edges.iter().find(|e| e.key == *key) {
                Some(edge) => edge.next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::new());
                    self.nodes[cur].edges.push(Edge { key: *key, next });
                    next
                }
            };
        }
        if self.nodes[cur].terminal.is_some() {
            return Err(TrieError::Duplicate {
                sequence: keys_to_string(sequence),
            });
        }
        if !self.nodes[cur].edges.is_empty() {
            return Err(TrieError::PrefixOfExisting {
                sequence: keys_to_string(sequence),
            });
        }
        self.commands.push(command);
        self.nodes[cur].terminal = Some(self.commands.len() - 1);
        Ok(())
    }

    /// Advance the cursor by one key, if an edge exists.
    pub(crate) fn step(&self, from: usize, key: &KeyEvent) -> Option<usize> {
        self.nodes
            .get(from)?
            .edges
            .iter()
            .find(|e| e.key == *key)
            .map(|e| e.next)
    }

    pub(crate) fn terminal(&self, node: usize) -> Option<&CommandDescriptor> {
        self.nodes
            .get(node)
            .and_then(|n| n.terminal)
            .map(|i| &self.commands[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandDescriptor;
    use key_events::parse_keys;
    use pretty_assertions::assert_eq;

    fn motion(id: &'static str) -> CommandDescriptor {
        CommandDescriptor::motion(id)
    }

    #[test]
    fn register_and_walk() {
        let mut trie = KeyTrie::new();
        trie.register(&parse_keys("gg"), motion("motion.file-start"))
            .unwrap();
        trie.register(&parse_keys("G"), motion("motion.file-end"))
            .unwrap();

        let g = trie.step(ROOT, &key_events::KeyEvent::char('g')).unwrap();
        assert!(trie.terminal(g).is_none());
        let gg = trie.step(g, &key_events::KeyEvent::char('g')).unwrap();
        assert_eq!(trie.terminal(gg).unwrap().id, "motion.file-start");
    }

    #[test]
    fn rejects_duplicate() {
        let mut trie = KeyTrie::new();
        trie.register(&parse_keys("w"), motion("motion.word")).unwrap();
        let err = trie.register(&parse_keys("w"), motion("motion.other"));
        assert_eq!(
            err,
            Err(TrieError::Duplicate {
                sequence: "w".into()
            })
        );
    }

    #[test]
    fn rejects_prefix_shadowing_both_directions() {
        let mut trie = KeyTrie::new();
        trie.register(&parse_keys("gg"), motion("motion.file-start"))
            .unwrap();
        // Shorter sequence that is a prefix of an existing one.
        assert!(matches!(
            trie.register(&parse_keys("g"), motion("motion.g")),
            Err(TrieError::PrefixOfExisting { .. })
        ));
        // Longer sequence extending an existing terminal.
        assert!(matches!(
            trie.register(&parse_keys("ggx"), motion("motion.ggx")),
            Err(TrieError::ExtendsExisting { .. })
        ));
    }

    #[test]
    fn rejects_empty_sequence() {
        let mut trie = KeyTrie::new();
        assert_eq!(trie.register(&[], motion("noop")), Err(TrieError::Empty));
    }

    #[test]
    fn no_edge_means_none() {
        let mut trie = KeyTrie::new();
        trie.register(&parse_keys("w"), motion("motion.word")).unwrap();
        assert!(trie.step(ROOT, &key_events::KeyEvent::char('z')).is_none());
    }
}
