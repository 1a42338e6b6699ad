//! Keeping a tree in step with one external conversation.
//!
//! # Responsibility
//! - Drop sync requests that arrive while one is already running (`guard`).
//! - Bind a conversation to its tree and capture new turns (`conversation`).
//!
//! # Invariants
//! - At most one sync runs per `ConversationSync` at a time.
//! - A skipped request performs no reads or writes.

pub mod conversation;
pub mod guard;

pub use conversation::{ConversationRef, ConversationSync, SyncOutcome, SyncReport};
pub use guard::{SyncGuard, SyncPermit};
