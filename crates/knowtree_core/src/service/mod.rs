//! Use-case services over the node store.
//!
//! # Responsibility
//! - Orchestrate store calls into user-level tree actions (`tree_service`).
//! - Snapshot trees to portable JSON and back (`transfer`).

pub mod transfer;
pub mod tree_service;
