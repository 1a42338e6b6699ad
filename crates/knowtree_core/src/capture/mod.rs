//! Deduplicating capture of conversation text into a tree.
//!
//! # Responsibility
//! - Normalize snippet text into comparable keys (`normalize`).
//! - Define the collaborators that supply snippets and receive counts (`source`).
//! - Merge fresh snippets into a tree's root level (`reconciler`).
//!
//! # Invariants
//! - Reconciling the same snippets twice creates nodes only the first time.
//! - Reconciliation never creates two nodes with the same content key.

pub mod normalize;
pub mod reconciler;
pub mod source;

pub use normalize::{content_key, display_title, prefix_key};
pub use reconciler::{CaptureConfig, CaptureReconciler, CaptureReport};
pub use source::{CaptureListener, ContentSource, NoopListener, Snippet, StaticSource};
