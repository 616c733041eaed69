use crate::ranking::{Match, MatchKind};
use crate::trie::TrieIndex;
use rayon::prelude::*;
use std::sync::Arc;

pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Classic edit distance: insert, delete and substitute each cost 1.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for (i, &ac) in a.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = if ac == b[j - 1] { 0 } else { 1 };
            let ins = curr[j - 1] + 1;
            let del = prev[j] + 1;
            let sub = prev[j - 1] + cost;
            curr[j] = ins.min(del).min(sub);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// `1 - distance / max(len)`, with two empty strings fully similar.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        FuzzyMatcher::new(DEFAULT_THRESHOLD)
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        FuzzyMatcher { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores `query` against every indexed phrase and keeps those strictly
    /// above the threshold, in trie traversal order.
    pub fn search(&self, index: &TrieIndex, query: &str) -> Vec<Match> {
        let query = query.to_lowercase();

        index
            .enumerate_all()
            .par_iter()
            .filter_map(|entry| {
                let score = similarity(&query, &entry.word);
                if score > self.threshold {
                    Some(Match {
                        prompt: Arc::clone(entry.prompt),
                        kind: MatchKind::Fuzzy(score),
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}
