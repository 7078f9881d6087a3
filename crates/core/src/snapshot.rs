//! Immutable source snapshots

use std::sync::Arc;
use std::time::Instant;

/// Source text captured at the moment a run was requested
///
/// Cloning is cheap: the text is shared, never copied.
#[derive(Debug, Clone)]
pub struct Snapshot {
    text: Arc<str>,
    taken_at: Instant,
}

impl Snapshot {
    /// Capture the given text
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            taken_at: Instant::now(),
        }
    }

    /// The captured source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Size of the captured text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// When the snapshot was taken
    pub fn taken_at(&self) -> Instant {
        self.taken_at
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Snapshot {}

impl From<&str> for Snapshot {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Snapshot {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
