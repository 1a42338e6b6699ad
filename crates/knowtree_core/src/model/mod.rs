//! Domain model for knowledge trees.
//!
//! # Responsibility
//! - Define the tree and node records shared by store, reorder and capture.
//! - Provide request shapes (`NewTree`, `NewNode`, `NodePatch`) with defaults.
//!
//! # Invariants
//! - Every tree and node is identified by a stable uuid v4.
//! - Wire shapes are camelCase so export files stay readable by other tools.

pub mod node;
pub mod tree;
