//! Collaborators around a capture cycle.

use crate::model::tree::TreeId;

/// One candidate piece of visible conversation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
}

impl Snippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for Snippet {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Snippet {
    fn from(value: String) -> Self {
        Self { text: value }
    }
}

/// Produces the snippets currently visible on the observed surface.
///
/// Called once per capture cycle; not a stream.
pub trait ContentSource {
    fn extract(&mut self) -> Vec<Snippet>;
}

/// Source returning a fixed list on every call.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snippets: Vec<Snippet>,
}

impl StaticSource {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Snippet>,
    {
        Self {
            snippets: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl ContentSource for StaticSource {
    fn extract(&mut self) -> Vec<Snippet> {
        self.snippets.clone()
    }
}

/// Receives one notification per capture that created nodes.
pub trait CaptureListener {
    fn nodes_captured(&mut self, tree_id: TreeId, count: usize);
}

/// Listener that ignores notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl CaptureListener for NoopListener {
    fn nodes_captured(&mut self, _tree_id: TreeId, _count: usize) {}
}
