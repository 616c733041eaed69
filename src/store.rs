use crate::error::{Error, Result};
use crate::ngram::PersistedModel;
use crate::prompt::{Corpus, Prompt, Scope};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub type ChangeListener = Box<dyn Fn(&Corpus) + Send + Sync>;

/// Where prompts come from. The engine only pulls and listens.
pub trait CorpusSource {
    fn get(&self) -> Result<Corpus>;
    fn on_change(&mut self, listener: ChangeListener);
}

/// Where the trained n-gram tables are kept between sessions.
pub trait PersistenceSink {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<PersistedModel>>;
    fn save(&self, model: &PersistedModel) -> Result<()>;
}

fn parse_model(raw: &str) -> Result<PersistedModel> {
    let model: PersistedModel = serde_json::from_str(raw)
        .map_err(|e| Error::MalformedPersistedData(e.to_string()))?;
    model.validate()?;
    Ok(model)
}

/// In-process prompt collection with the add/edit/delete operations of the
/// prompt box.
#[derive(Default)]
pub struct MemoryCorpus {
    corpus: Corpus,
    listeners: Vec<ChangeListener>,
}

impl MemoryCorpus {
    pub fn new(corpus: Corpus) -> Self {
        MemoryCorpus {
            corpus,
            listeners: Vec::new(),
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Adds a trimmed prompt and returns its id; blank text is ignored.
    pub fn add_prompt(&mut self, scope: Scope, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let prefix = scope.id_prefix();
        let next = self
            .corpus
            .global
            .iter()
            .chain(self.corpus.local.iter())
            .filter_map(|p| p.id.strip_prefix(prefix)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("{}{}", prefix, next);
        self.corpus
            .scope_mut(scope)
            .push(Prompt::new(id.clone(), text, scope));
        self.notify();
        Some(id)
    }

    pub fn edit_prompt(&mut self, id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let found = self
            .corpus
            .global
            .iter_mut()
            .chain(self.corpus.local.iter_mut())
            .find(|p| p.id == id);
        match found {
            Some(prompt) => {
                prompt.text = text.to_string();
                self.notify();
                true
            }
            None => false,
        }
    }

    pub fn delete_prompt(&mut self, id: &str) -> bool {
        let before = self.corpus.len();
        self.corpus.global.retain(|p| p.id != id);
        self.corpus.local.retain(|p| p.id != id);
        if self.corpus.len() == before {
            return false;
        }
        self.notify();
        true
    }

    pub fn replace(&mut self, corpus: Corpus) {
        self.corpus = corpus;
        self.notify();
    }

    fn notify(&self) {
        debug!(
            "corpus changed: {} prompts, {} listeners",
            self.corpus.len(),
            self.listeners.len()
        );
        for listener in &self.listeners {
            listener(&self.corpus);
        }
    }
}

impl CorpusSource for MemoryCorpus {
    fn get(&self) -> Result<Corpus> {
        Ok(self.corpus.clone())
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}

/// Prompt collection stored as `{ "global": [...], "local": [...] }`.
pub struct JsonFileCorpus {
    path: PathBuf,
    listeners: Vec<ChangeListener>,
}

impl JsonFileCorpus {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileCorpus {
            path: path.as_ref().to_path_buf(),
            listeners: Vec::new(),
        }
    }

    pub fn refresh(&self) -> Result<()> {
        let corpus = self.get()?;
        for listener in &self.listeners {
            listener(&corpus);
        }
        Ok(())
    }
}

impl CorpusSource for JsonFileCorpus {
    fn get(&self) -> Result<Corpus> {
        if !self.path.exists() {
            info!("no corpus at {}, using an empty one", self.path.display());
            return Ok(Corpus::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::StorageUnavailable(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| Error::MalformedPersistedData(e.to_string()))
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedModel>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::StorageUnavailable(format!("{}: {}", self.path.display(), e)))?;
        parse_model(&content).map(Some)
    }

    fn save(&self, model: &PersistedModel) -> Result<()> {
        let json = serde_json::to_string(model)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Keeps the serialized model in memory; can be made to fail for every call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        MemoryStore {
            raw: Mutex::new(Some(raw.into())),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        MemoryStore {
            raw: Mutex::new(None),
            unavailable: true,
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::StorageUnavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl PersistenceSink for MemoryStore {
    fn load(&self) -> Result<Option<PersistedModel>> {
        self.check()?;
        match self.raw() {
            Some(raw) => parse_model(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, model: &PersistedModel) -> Result<()> {
        self.check()?;
        let json = serde_json::to_string(model)?;
        let mut slot = self
            .raw
            .lock()
            .map_err(|_| Error::StorageUnavailable("memory store poisoned".to_string()))?;
        *slot = Some(json);
        Ok(())
    }
}
