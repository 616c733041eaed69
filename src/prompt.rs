use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
}

impl Scope {
    pub fn id_prefix(self) -> char {
        match self {
            Scope::Global => 'g',
            Scope::Local => 'l',
        }
    }
}

/// A saved prompt. Search results are deduplicated by `text`, not `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub scope: Scope,
}

impl Prompt {
    pub fn new(id: impl Into<String>, text: impl Into<String>, scope: Scope) -> Self {
        Prompt {
            id: id.into(),
            text: text.into(),
            scope,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub global: Vec<Prompt>,
    #[serde(default)]
    pub local: Vec<Prompt>,
}

impl Corpus {
    /// Stock prompt set written on first install.
    pub fn default_prompts() -> Self {
        Corpus {
            global: vec![
                Prompt::new("g1", "Could you explain this in simple terms?", Scope::Global),
                Prompt::new("g2", "What are the pros and cons of this approach?", Scope::Global),
                Prompt::new("g3", "Can you provide an example?", Scope::Global),
            ],
            local: vec![
                Prompt::new("l1", "What does this code do?", Scope::Local),
                Prompt::new("l2", "How can I improve this?", Scope::Local),
            ],
        }
    }

    /// Global prompts followed by local ones, shared so the trie can point at them.
    pub fn combined(&self) -> Vec<Arc<Prompt>> {
        self.global
            .iter()
            .chain(self.local.iter())
            .cloned()
            .map(Arc::new)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn scope_mut(&mut self, scope: Scope) -> &mut Vec<Prompt> {
        match scope {
            Scope::Global => &mut self.global,
            Scope::Local => &mut self.local,
        }
    }
}
