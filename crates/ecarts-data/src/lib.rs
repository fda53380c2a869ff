//! Report parsing, gap analysis and snapshot storage.
//!
//! Turns raw statistics report text into per-category ID sequences, derives
//! gap statistics and trends from them, and files the results by day and hour.

pub mod analyzer;
pub mod parser;
pub mod store;

pub use ecarts_core as core;
