//! A compressed-prefix trie mapping keywords to replacement text. It backs
//! the keyword side files: plain text with one `key: value` pair per line.
//!
//! Nodes live in one `Vec` and refer to each other by index. Each node holds
//! a non-empty run of characters (`prefix`); `has_prefix` leads to the nodes
//! that continue it and `no_prefix` leads to the next sibling, which shares no
//! leading character with it. Inserting a key that diverges part-way through a
//! prefix splits that node in two.

use std::fmt;

struct TrieNode<'a> {
    prefix: &'a str,
    value: Option<&'a str>,
    has_prefix: Option<usize>,
    no_prefix: Option<usize>,
}

#[derive(Clone, Copy)]
enum Slot {
    Root,
    HasPrefix(usize),
    NoPrefix(usize),
}

/// Maps keys to values. Keys and values borrow the text they were inserted
/// from, typically a side file held for the whole run.
#[derive(Default)]
pub struct KeywordTrie<'a> {
    nodes: Vec<TrieNode<'a>>,
    root: Option<usize>,
    len: usize,
}

impl<'a> KeywordTrie<'a> {
    pub fn new() -> KeywordTrie<'a> {
        KeywordTrie::default()
    }

    /// Parses a side file. Blank lines are skipped; every other line is a key,
    /// a `:`, and a value that runs to the end of the line. Whitespace before
    /// the key and before the value is dropped.
    pub fn parse(source: &'a str) -> Result<KeywordTrie<'a>> {
        let mut trie = KeywordTrie::new();
        for (number, line) in source.lines().enumerate() {
            let line = line.trim_start();
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) => trie.insert(key, value.trim_start()),
                None => return Err(Error::MissingSeparator { line: number + 1 }),
            }
        }
        Ok(trie)
    }

    /// Number of keys that carry a value.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Associates `value` with `key`, replacing any previous value.
    pub fn insert(&mut self, key: &'a str, value: &'a str) {
        let mut slot = Slot::Root;
        let mut key = key;
        loop {
            let index = match self.slot(slot) {
                Some(index) => index,
                None => {
                    let leaf = self.push(TrieNode {
                        prefix: key,
                        value: Some(value),
                        has_prefix: None,
                        no_prefix: None,
                    });
                    self.set_slot(slot, leaf);
                    self.len += 1;
                    return;
                }
            };

            let prefix = self.nodes[index].prefix;
            let common = common_prefix_len(prefix, key);
            if common == 0 && !prefix.is_empty() {
                slot = Slot::NoPrefix(index);
                continue;
            }

            let index = if common < prefix.len() {
                self.split(slot, index, common)
            } else {
                index
            };

            let rest = &key[common..];
            if rest.is_empty() {
                let node = &mut self.nodes[index];
                if node.value.replace(value).is_none() {
                    self.len += 1;
                }
                return;
            }
            key = rest;
            slot = Slot::HasPrefix(index);
        }
    }

    /// Returns the value stored for exactly `key`.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        let mut next = self.root;
        let mut key = key;
        while let Some(index) = next {
            let node = &self.nodes[index];
            let common = common_prefix_len(node.prefix, key);
            if common < node.prefix.len() {
                next = node.no_prefix;
                continue;
            }
            key = &key[common..];
            if key.is_empty() {
                return node.value;
            }
            next = node.has_prefix;
        }
        None
    }

    /// Splits the node at `index` after `at` bytes of its prefix. The leading
    /// half becomes a new node in `slot` and inherits the old node's siblings.
    fn split(&mut self, slot: Slot, index: usize, at: usize) -> usize {
        let prefix = self.nodes[index].prefix;
        let siblings = self.nodes[index].no_prefix.take();
        self.nodes[index].prefix = &prefix[at..];
        let head = self.push(TrieNode {
            prefix: &prefix[..at],
            value: None,
            has_prefix: Some(index),
            no_prefix: siblings,
        });
        self.set_slot(slot, head);
        head
    }

    fn push(&mut self, node: TrieNode<'a>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn slot(&self, slot: Slot) -> Option<usize> {
        match slot {
            Slot::Root => self.root,
            Slot::HasPrefix(index) => self.nodes[index].has_prefix,
            Slot::NoPrefix(index) => self.nodes[index].no_prefix,
        }
    }

    fn set_slot(&mut self, slot: Slot, value: usize) {
        match slot {
            Slot::Root => self.root = Some(value),
            Slot::HasPrefix(index) => self.nodes[index].has_prefix = Some(value),
            Slot::NoPrefix(index) => self.nodes[index].no_prefix = Some(value),
        }
    }
}

/// Length in bytes of the longest common prefix of `a` and `b`, always on a
/// character boundary of both.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8())
}

type Result<T> = std::result::Result<T, Error>;

/// Errors reading a keyword side file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A non-blank line had no `:` between key and value.
    MissingSeparator { line: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingSeparator { line } => {
                write!(f, "line {}: expected `key: value`", line)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shared_prefixes() {
        let mut trie = KeywordTrie::new();
        trie.insert("team", "1");
        trie.insert("tea", "2");
        trie.insert("ten", "3");
        trie.insert("to", "4");
        trie.insert("a", "5");

        assert_eq!(Some("1"), trie.get("team"));
        assert_eq!(Some("2"), trie.get("tea"));
        assert_eq!(Some("3"), trie.get("ten"));
        assert_eq!(Some("4"), trie.get("to"));
        assert_eq!(Some("5"), trie.get("a"));
        assert_eq!(5, trie.len());

        // Internal split points and overshoots have no value.
        assert_eq!(None, trie.get("te"));
        assert_eq!(None, trie.get("t"));
        assert_eq!(None, trie.get("teams"));
        assert_eq!(None, trie.get("tex"));
        assert_eq!(None, trie.get(""));
    }

    #[test]
    fn test_split_keeps_siblings_reachable() {
        let mut trie = KeywordTrie::new();
        trie.insert("apple", "fruit");
        trie.insert("banana", "yellow");
        trie.insert("apricot", "orange");

        assert_eq!(Some("fruit"), trie.get("apple"));
        assert_eq!(Some("yellow"), trie.get("banana"));
        assert_eq!(Some("orange"), trie.get("apricot"));
        assert_eq!(None, trie.get("ap"));
    }

    #[test]
    fn test_split_point_can_take_a_value_later() {
        let mut trie = KeywordTrie::new();
        trie.insert("foobar", "1");
        trie.insert("foobaz", "2");
        assert_eq!(2, trie.len());
        trie.insert("fooba", "3");
        assert_eq!(3, trie.len());
        assert_eq!(Some("3"), trie.get("fooba"));
        assert_eq!(Some("1"), trie.get("foobar"));
    }

    #[test]
    fn test_insert_replaces() {
        let mut trie = KeywordTrie::new();
        trie.insert("key", "old");
        trie.insert("key", "new");
        assert_eq!(Some("new"), trie.get("key"));
        assert_eq!(1, trie.len());
    }

    #[test]
    fn test_multibyte_keys() {
        let mut trie = KeywordTrie::new();
        trie.insert("über", "1");
        trie.insert("üble", "2");
        trie.insert("ü", "3");
        assert_eq!(Some("1"), trie.get("über"));
        assert_eq!(Some("2"), trie.get("üble"));
        assert_eq!(Some("3"), trie.get("ü"));
        assert_eq!(None, trie.get("u"));
    }

    #[test]
    fn test_parse_side_file() {
        let trie = KeywordTrie::parse("rust: A language\n\n  arena:bump allocator\n").unwrap();
        assert_eq!(Some("A language"), trie.get("rust"));
        assert_eq!(Some("bump allocator"), trie.get("arena"));
        assert_eq!(2, trie.len());
    }

    #[test]
    fn test_parse_missing_separator() {
        match KeywordTrie::parse("a: b\nno separator here\n") {
            Err(err) => {
                assert_eq!(Error::MissingSeparator { line: 2 }, err);
                assert_eq!("line 2: expected `key: value`", err.to_string());
            }
            Ok(_) => panic!("wanted an error"),
        }
    }
}
