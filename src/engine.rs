use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::error::Error;
use crate::fuzzy::FuzzyMatcher;
use crate::ngram::{DEFAULT_TRAINING_TEXT, NGramModel, PersistedModel, Prediction};
use crate::prompt::{Corpus, Prompt};
use crate::ranking::RankingEngine;
use crate::store::{CorpusSource, PersistenceSink};
use crate::trie::TrieIndex;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Shared slot holding the current trie. Rebuilds construct a new trie and
/// swap it in, so readers see either the old or the new index in full.
#[derive(Debug, Clone, Default)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<TrieIndex>>>,
}

impl IndexHandle {
    pub fn snapshot(&self) -> Arc<TrieIndex> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn rebuild(&self, corpus: &Corpus) {
        let fresh = Arc::new(TrieIndex::build(&corpus.combined()));
        info!("rebuilt prompt index: {} entries", fresh.len());
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
    }
}

pub struct PromptEngine {
    config: EngineConfig,
    ranking: RankingEngine,
    index: IndexHandle,
    model: RwLock<NGramModel>,
    initialized: AtomicBool,
}

impl Default for PromptEngine {
    fn default() -> Self {
        PromptEngine::new(EngineConfig::default())
    }
}

impl PromptEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ranking = RankingEngine::new(FuzzyMatcher::new(config.fuzzy_threshold));
        let model = NGramModel::new(config.ngram_order, config.smoothing_alpha);
        PromptEngine {
            config,
            ranking,
            index: IndexHandle::default(),
            model: RwLock::new(model),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index_handle(&self) -> IndexHandle {
        self.index.clone()
    }

    pub fn rebuild(&self, corpus: &Corpus) {
        self.index.rebuild(corpus);
    }

    /// Indexes the source's current prompts and rebuilds on every change.
    /// An unreachable source is indexed as empty.
    pub fn attach(&self, source: &mut dyn CorpusSource) {
        let corpus = source.get().unwrap_or_else(|e| {
            warn!("corpus unavailable, indexing nothing: {}", e);
            Corpus::default()
        });
        self.index.rebuild(&corpus);

        let handle = self.index.clone();
        source.on_change(Box::new(move |corpus: &Corpus| handle.rebuild(corpus)));
    }

    pub fn search(&self, query: &str) -> Vec<Arc<Prompt>> {
        let index = self.index.snapshot();
        self.ranking.search(&index, query)
    }

    /// Loads saved tables, or seeds the default phrases when none exist.
    /// Malformed data or an unreachable store leaves an empty model.
    pub fn initialize(&self, sink: &dyn PersistenceSink) {
        if self.is_initialized() {
            return;
        }
        let empty = || NGramModel::new(self.config.ngram_order, self.config.smoothing_alpha);
        let loaded = sink.load().and_then(|persisted| match persisted {
            Some(persisted) => {
                let mut fresh = empty();
                fresh.load_persisted(persisted)?;
                Ok(Some(fresh))
            }
            None => Ok(None),
        });

        let mut model = self.model.write().unwrap_or_else(PoisonError::into_inner);
        match loaded {
            Ok(Some(fresh)) => {
                *model = fresh;
                info!("loaded n-gram model with {} contexts", model.len());
            }
            Ok(None) => {
                for text in DEFAULT_TRAINING_TEXT {
                    model.train(text);
                }
                info!("seeded n-gram model with {} contexts", model.len());
            }
            Err(Error::MalformedPersistedData(e)) => {
                *model = empty();
                warn!("discarding malformed n-gram model: {}", e);
            }
            Err(e) => {
                *model = empty();
                warn!("n-gram store unavailable, starting empty: {}", e);
            }
        }
        self.initialized.store(true, Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn train(&self, text: &str) {
        self.model
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .train(text);
    }

    pub fn predict(&self, sequence: &str) -> Vec<Prediction> {
        self.predict_n(sequence, self.config.max_predictions)
    }

    /// Empty until [`PromptEngine::initialize`] has run.
    pub fn predict_n(&self, sequence: &str, max_predictions: usize) -> Vec<Prediction> {
        if !self.is_initialized() {
            return Vec::new();
        }
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .predict(sequence, max_predictions)
    }

    pub fn model_snapshot(&self) -> PersistedModel {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Best effort: a failed save is logged and the in-memory model stays authoritative.
    pub fn persist(&self, sink: &dyn PersistenceSink) -> bool {
        match sink.save(&self.model_snapshot()) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save n-gram model: {}", e);
                false
            }
        }
    }

    pub fn session(&self) -> QuerySession<'_> {
        QuerySession {
            engine: self,
            debouncer: Debouncer::new(self.config.debounce()),
            results: Vec::new(),
        }
    }
}

pub struct QuerySession<'a> {
    engine: &'a PromptEngine,
    debouncer: Debouncer,
    results: Vec<Arc<Prompt>>,
}

impl QuerySession<'_> {
    pub fn input(&mut self, content: impl Into<String>, now: Instant) {
        self.debouncer.input(content, now);
    }

    /// Runs a search when the debounce window has closed on new content.
    pub fn tick(&mut self, now: Instant) -> Option<&[Arc<Prompt>]> {
        let query = self.debouncer.poll(now)?;
        self.results = self.engine.search(&query);
        Some(self.results.as_slice())
    }

    pub fn results(&self) -> &[Arc<Prompt>] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Scope;
    use crate::store::{JsonFileStore, MemoryCorpus, MemoryStore};
    use std::time::Duration;

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus {
            global: texts
                .iter()
                .enumerate()
                .map(|(i, t)| Prompt::new(format!("g{}", i + 1), *t, Scope::Global))
                .collect(),
            local: Vec::new(),
        }
    }

    fn texts(prompts: &[Arc<Prompt>]) -> Vec<String> {
        prompts.iter().map(|p| p.text.clone()).collect()
    }

    #[test]
    fn test_search_scenario_through_engine() {
        let engine = PromptEngine::default();
        engine.rebuild(&corpus(&["Explain this", "Explain that", "Example here"]));
        assert_eq!(texts(&engine.search("exa")), vec!["Example here"]);
        assert_eq!(
            texts(&engine.search("Explain")),
            vec!["Explain this", "Explain that"]
        );
    }

    #[test]
    fn test_empty_corpus_returns_nothing() {
        let engine = PromptEngine::default();
        engine.rebuild(&corpus(&["Explain this"]));
        engine.rebuild(&Corpus::default());
        for query in ["e", "explain", "anything"] {
            assert!(engine.search(query).is_empty());
        }
    }

    #[test]
    fn test_attach_rebuilds_on_change() {
        let engine = PromptEngine::default();
        let mut source = MemoryCorpus::new(Corpus::default_prompts());
        engine.attach(&mut source);
        assert_eq!(texts(&engine.search("what does")), vec!["What does this code do?"]);

        source.add_prompt(Scope::Local, "Write unit tests for this");
        assert_eq!(texts(&engine.search("write unit")), vec!["Write unit tests for this"]);

        source.delete_prompt("l1");
        assert!(engine
            .search("what does")
            .iter()
            .all(|p| p.text != "What does this code do?"));
    }

    #[test]
    fn test_predict_requires_initialize() {
        let engine = PromptEngine::default();
        engine.train("quick brown fox");
        assert!(engine.predict("quick brown").is_empty());

        engine.initialize(&MemoryStore::with_raw(
            r#"{"ngrams": {}, "lastUpdated": "2024-05-01T10:00:00Z"}"#,
        ));
        assert!(engine.predict("quick brown").is_empty());
        engine.train("quick brown fox");
        let predictions = engine.predict("quick brown");
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].text, "quick brown fox");
    }

    #[test]
    fn test_initialize_seeds_defaults_when_nothing_saved() {
        let engine = PromptEngine::default();
        engine.initialize(&MemoryStore::new());
        let predictions = engine.predict("what does");
        assert_eq!(predictions[0].text, "what does this");
    }

    #[test]
    fn test_malformed_persisted_data_falls_back_to_empty() {
        let engine = PromptEngine::default();
        engine.initialize(&MemoryStore::with_raw("{\"ngrams\": 42"));
        assert!(engine.is_initialized());
        assert!(engine.model_snapshot().ngrams.is_empty());
        assert!(engine.predict("what does").is_empty());
    }

    #[test]
    fn test_malformed_data_discards_earlier_training() {
        let engine = PromptEngine::default();
        engine.train("quick brown fox");
        engine.initialize(&MemoryStore::with_raw("{\"ngrams\": 42"));
        assert!(engine.model_snapshot().ngrams.is_empty());
        assert!(engine.predict("quick brown").is_empty());

        let engine = PromptEngine::default();
        engine.train("quick brown fox");
        engine.initialize(&MemoryStore::with_raw(
            r#"{"ngrams": {"a b": {"total": 3, "words": {"c": 1}}}, "lastUpdated": "2024-05-01T10:00:00Z"}"#,
        ));
        assert_eq!(engine.model_snapshot().ngrams.len(), 0);
        assert!(engine.predict("quick brown").is_empty());
    }

    #[test]
    fn test_unavailable_store_degrades() {
        let engine = PromptEngine::default();
        let store = MemoryStore::unavailable();
        engine.initialize(&store);
        engine.train("save me please");
        assert!(!engine.persist(&store));
        assert_eq!(engine.predict("save me")[0].text, "save me please");
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("ngrams.json"));

        let engine = PromptEngine::default();
        engine.initialize(&store);
        engine.train("refactor this function please");
        assert!(engine.persist(&store));

        let reloaded = PromptEngine::default();
        reloaded.initialize(&store);
        assert_eq!(
            reloaded.predict("refactor this")[0].text,
            "refactor this function"
        );
        assert_eq!(reloaded.model_snapshot().ngrams, engine.model_snapshot().ngrams);
    }

    #[test]
    fn test_session_debounces_queries() {
        let engine = PromptEngine::default();
        engine.rebuild(&corpus(&["Explain this", "Example here"]));
        let mut session = engine.session();
        let start = Instant::now();

        session.input("e", start);
        session.input("ex", start + Duration::from_millis(50));
        session.input("exa", start + Duration::from_millis(100));
        assert!(session.tick(start + Duration::from_millis(200)).is_none());

        let results = session.tick(start + Duration::from_millis(260)).unwrap();
        assert_eq!(texts(results), vec!["Example here"]);
        assert!(session.tick(start + Duration::from_millis(900)).is_none());
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_readers_never_see_partial_rebuild() {
        let old = corpus(&["alpha one", "alpha two", "alpha three"]);
        let new = corpus(&["alpha four", "alpha five"]);
        let old_texts = vec!["alpha one", "alpha two", "alpha three"];
        let new_texts = vec!["alpha four", "alpha five"];

        let engine = PromptEngine::default();
        engine.rebuild(&old);
        let handle = engine.index_handle();

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..200 {
                    handle.rebuild(if i % 2 == 0 { &new } else { &old });
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let index = handle.snapshot();
                        let got: Vec<String> = index
                            .prefix_search("alpha")
                            .into_iter()
                            .map(|m| m.prompt.text.clone())
                            .collect();
                        assert!(got == old_texts || got == new_texts, "torn read: {:?}", got);
                    }
                });
            }
        });
    }
}
