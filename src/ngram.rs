use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORDER: usize = 3;
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.1;
pub const DEFAULT_MAX_PREDICTIONS: usize = 3;

// Seed phrases used when nothing has been persisted yet.
pub const DEFAULT_TRAINING_TEXT: &[&str] = &[
    "could you explain this in simple terms",
    "what are the pros and cons of this approach",
    "can you provide an example",
    "what does this code do",
    "how can i improve this",
    "can you explain how this code works",
    "can you provide an example of this approach",
    "what are the alternatives to this approach",
];

/// Lowercases, turns anything outside `[a-z0-9']` into a space and splits.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_owned).collect()
}

/// Observed continuations of one context. `total` always equals the sum of `words`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationTable {
    pub total: u64,
    pub words: IndexMap<String, u64>,
}

impl ContinuationTable {
    fn record(&mut self, word: &str) {
        *self.words.entry(word.to_owned()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.words.values().sum::<u64>() == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    Ngram,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub text: String,
    pub probability: f64,
    #[serde(rename = "type")]
    pub kind: PredictionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedModel {
    pub ngrams: IndexMap<String, ContinuationTable>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl PersistedModel {
    pub fn validate(&self) -> Result<()> {
        for (context, table) in &self.ngrams {
            if !table.is_consistent() {
                return Err(Error::MalformedPersistedData(format!(
                    "context {:?} has total {} but word counts sum to {}",
                    context,
                    table.total,
                    table.words.values().sum::<u64>()
                )));
            }
        }
        Ok(())
    }
}

/// Word n-gram model with Laplace smoothing and shorter-context backoff.
///
/// `n` counts the predicted word, so contexts hold `n - 1` tokens.
#[derive(Debug, Clone)]
pub struct NGramModel {
    n: usize,
    smoothing_alpha: f64,
    contexts: IndexMap<String, ContinuationTable>,
}

impl Default for NGramModel {
    fn default() -> Self {
        NGramModel::new(DEFAULT_ORDER, DEFAULT_SMOOTHING_ALPHA)
    }
}

impl NGramModel {
    pub fn new(n: usize, smoothing_alpha: f64) -> Self {
        NGramModel {
            n: n.max(1),
            smoothing_alpha,
            contexts: IndexMap::new(),
        }
    }

    pub fn order(&self) -> usize {
        self.n
    }

    pub fn smoothing_alpha(&self) -> f64 {
        self.smoothing_alpha
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn table(&self, context: &str) -> Option<&ContinuationTable> {
        self.contexts.get(context)
    }

    pub fn train(&mut self, text: &str) {
        let tokens = tokenize(text);
        if tokens.len() < self.n {
            return;
        }
        for window in tokens.windows(self.n) {
            let (context, target) = window.split_at(self.n - 1);
            self.contexts
                .entry(context.join(" "))
                .or_default()
                .record(&target[0]);
        }
    }

    pub fn predict(&self, sequence: &str, max_predictions: usize) -> Vec<Prediction> {
        let tokens = tokenize(sequence);
        let keep = self.n - 1;
        let context = tokens[tokens.len().saturating_sub(keep)..].join(" ");

        let Some(table) = self.contexts.get(&context) else {
            return self.backoff(&context);
        };

        let alpha = self.smoothing_alpha;
        let vocab_size = table.words.len() as f64;
        let denominator = table.total as f64 + alpha * (vocab_size + 1.0);

        let mut scored: Vec<(&String, f64)> = table
            .words
            .iter()
            .map(|(word, &count)| (word, (count as f64 + alpha) / denominator))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(max_predictions);

        scored
            .into_iter()
            .map(|(word, probability)| Prediction {
                text: format!("{} {}", sequence, word).trim().to_string(),
                probability,
                kind: PredictionKind::Ngram,
            })
            .collect()
    }

    // Drops the oldest token and retries; backoff yields at most one suggestion.
    fn backoff(&self, context: &str) -> Vec<Prediction> {
        if self.n > 1 {
            if let Some((_, shorter)) = context.split_once(' ') {
                debug!("backing off from {:?} to {:?}", context, shorter);
                return self.predict(shorter, 1);
            }
        }
        Vec::new()
    }

    pub fn snapshot(&self) -> PersistedModel {
        PersistedModel {
            ngrams: self.contexts.clone(),
            last_updated: Utc::now(),
        }
    }

    pub fn load_persisted(&mut self, persisted: PersistedModel) -> Result<()> {
        persisted.validate()?;
        self.contexts = persisted.ngrams;
        Ok(())
    }
}
