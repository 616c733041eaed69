//! Prompt completion: ranked prefix/fuzzy search over a prompt collection and
//! next-word prediction from a smoothed word n-gram model.

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod ngram;
pub mod prompt;
pub mod ranking;
pub mod store;
pub mod trie;

pub use config::EngineConfig;
pub use debounce::Debouncer;
pub use engine::{IndexHandle, PromptEngine, QuerySession};
pub use error::{Error, Result};
pub use fuzzy::{FuzzyMatcher, levenshtein_distance, similarity};
pub use ngram::{NGramModel, PersistedModel, Prediction, PredictionKind, tokenize};
pub use prompt::{Corpus, Prompt, Scope};
pub use ranking::{Match, MatchKind, RankingEngine};
pub use store::{
    ChangeListener, CorpusSource, JsonFileCorpus, JsonFileStore, MemoryCorpus, MemoryStore,
    PersistenceSink,
};
pub use trie::{IndexedEntry, TrieIndex};
