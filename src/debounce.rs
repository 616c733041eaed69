use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(150);

/// Collapses bursts of input into one dispatch once the input has been quiet
/// for `window`. The latest content wins; content equal to the previous
/// dispatch is swallowed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<(String, Instant)>,
    last_dispatched: Option<String>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new(DEFAULT_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: None,
            last_dispatched: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn input(&mut self, content: impl Into<String>, now: Instant) {
        self.pending = Some((content.into(), now));
    }

    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let (_, at) = self.pending.as_ref()?;
        if now.duration_since(*at) < self.window {
            return None;
        }
        let (content, _) = self.pending.take()?;
        if self.last_dispatched.as_deref() == Some(content.as_str()) {
            return None;
        }
        self.last_dispatched = Some(content.clone());
        Some(content)
    }
}
