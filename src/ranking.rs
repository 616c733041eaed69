use crate::fuzzy::FuzzyMatcher;
use crate::prompt::Prompt;
use crate::trie::TrieIndex;
use indexmap::IndexSet;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// How a prompt matched a query, carrying the score used for ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Length in characters of the candidate prefix that matched.
    Prefix(usize),
    /// Similarity in `[0, 1]`.
    Fuzzy(f64),
}

impl MatchKind {
    /// Prefix matches first, then higher score first.
    pub fn rank(&self, other: &MatchKind) -> Ordering {
        match (self, other) {
            (MatchKind::Prefix(a), MatchKind::Prefix(b)) => b.cmp(a),
            (MatchKind::Fuzzy(a), MatchKind::Fuzzy(b)) => b.total_cmp(a),
            (MatchKind::Prefix(_), MatchKind::Fuzzy(_)) => Ordering::Less,
            (MatchKind::Fuzzy(_), MatchKind::Prefix(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    pub prompt: Arc<Prompt>,
    pub kind: MatchKind,
}

/// Every suffix of the query, then every suffix of each phrase starting at a
/// word boundary. Order is first-seen, duplicates dropped.
pub fn candidate_prefixes(query: &str) -> IndexSet<String> {
    let mut candidates = IndexSet::new();
    push_suffixes(query, &mut candidates);

    let words: Vec<&str> = query.split_whitespace().collect();
    for start in 0..words.len() {
        push_suffixes(&words[start..].join(" "), &mut candidates);
    }
    candidates
}

fn push_suffixes(text: &str, out: &mut IndexSet<String>) {
    for (i, _) in text.char_indices() {
        out.insert(text[i..].to_string());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine {
    fuzzy: FuzzyMatcher,
}

impl RankingEngine {
    pub fn new(fuzzy: FuzzyMatcher) -> Self {
        RankingEngine { fuzzy }
    }

    pub fn search(&self, index: &TrieIndex, query: &str) -> Vec<Arc<Prompt>> {
        self.ranked(index, query)
            .into_iter()
            .map(|m| m.prompt)
            .collect()
    }

    /// Merged, deduplicated and ordered matches with their scores.
    pub fn ranked(&self, index: &TrieIndex, query: &str) -> Vec<Match> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let query = query.to_lowercase();

        let candidates = candidate_prefixes(&query);
        let mut prefix_matches = Vec::new();
        let mut anchored = false;
        for (i, prefix) in candidates.iter().enumerate() {
            let hits = index.prefix_search(prefix);
            // the first candidate is the whole query
            if i == 0 {
                anchored = !hits.is_empty();
            }
            prefix_matches.extend(hits);
        }

        // Fuzzy matching only backs up a query no prompt starts with.
        let fuzzy_matches = if anchored {
            Vec::new()
        } else {
            self.fuzzy.search(index, &query)
        };
        debug!(
            "query {:?}: {} candidate prefixes, {} prefix hits, {} fuzzy hits",
            query,
            candidates.len(),
            prefix_matches.len(),
            fuzzy_matches.len()
        );

        let mut seen = HashSet::new();
        let mut merged: Vec<Match> = prefix_matches
            .into_iter()
            .chain(fuzzy_matches)
            .filter(|m| seen.insert(m.prompt.text.clone()))
            .collect();

        merged.sort_by(|a, b| a.kind.rank(&b.kind));
        merged
    }
}
