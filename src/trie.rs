use crate::prompt::Prompt;
use crate::ranking::{Match, MatchKind};
use indexmap::IndexMap;
use std::sync::Arc;

// Children keep insertion order so traversal order follows corpus order.
#[derive(Debug, Default, Clone)]
struct Node {
    children: IndexMap<char, Node>,
    prompt: Option<Arc<Prompt>>,
}

/// A terminal reached by a full traversal: the prompt and its lowercased path.
#[derive(Debug, Clone)]
pub struct IndexedEntry<'a> {
    pub prompt: &'a Arc<Prompt>,
    pub word: String,
}

/// Character trie over lowercased prompt texts.
#[derive(Debug, Default, Clone)]
pub struct TrieIndex {
    root: Node,
    terminals: usize,
}

impl TrieIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(corpus: &[Arc<Prompt>]) -> Self {
        let mut index = Self::new();
        index.rebuild(corpus);
        index
    }

    pub fn rebuild(&mut self, corpus: &[Arc<Prompt>]) {
        self.root = Node::default();
        self.terminals = 0;
        for prompt in corpus {
            self.insert(Arc::clone(prompt));
        }
    }

    /// Re-inserting an equal (case-insensitive) text replaces the stored prompt.
    pub fn insert(&mut self, prompt: Arc<Prompt>) {
        let text = prompt.text.to_lowercase();
        if text.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for ch in text.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.prompt.is_none() {
            self.terminals += 1;
        }
        node.prompt = Some(prompt);
    }

    pub fn len(&self) -> usize {
        self.terminals
    }

    pub fn is_empty(&self) -> bool {
        self.terminals == 0
    }

    /// Every prompt whose lowercased text starts with `prefix`, in pre-order.
    /// All matches share `score = prefix length` in characters.
    pub fn prefix_search(&self, prefix: &str) -> Vec<Match> {
        let prefix = prefix.to_lowercase();
        let mut node = &self.root;
        for ch in prefix.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return Vec::new(),
            }
        }

        let score = prefix.chars().count();
        let mut found = Vec::new();
        collect_prompts(node, &mut found);
        found
            .into_iter()
            .map(|prompt| Match {
                prompt: Arc::clone(prompt),
                kind: MatchKind::Prefix(score),
            })
            .collect()
    }

    pub fn enumerate_all(&self) -> Vec<IndexedEntry<'_>> {
        let mut out = Vec::with_capacity(self.terminals);
        let mut buf = String::new();
        collect_entries(&self.root, &mut buf, &mut out);
        out
    }
}

fn collect_prompts<'a>(node: &'a Node, out: &mut Vec<&'a Arc<Prompt>>) {
    if let Some(prompt) = &node.prompt {
        out.push(prompt);
    }
    for child in node.children.values() {
        collect_prompts(child, out);
    }
}

fn collect_entries<'a>(node: &'a Node, buf: &mut String, out: &mut Vec<IndexedEntry<'a>>) {
    if let Some(prompt) = &node.prompt {
        out.push(IndexedEntry {
            prompt,
            word: buf.clone(),
        });
    }
    for (ch, child) in node.children.iter() {
        buf.push(*ch);
        collect_entries(child, buf, out);
        buf.pop();
    }
}
