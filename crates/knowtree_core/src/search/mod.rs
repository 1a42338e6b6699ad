//! Title search within one tree.
//!
//! # Responsibility
//! - Find nodes by case-insensitive title substring.
//! - Report each hit's ancestor chain so a renderer can expand to it.

pub mod node_search;
