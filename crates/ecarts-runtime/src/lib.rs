//! Runtime layer for Écarts.
//!
//! Drives the parse → analyse → store → format pipeline for each incoming
//! report and polls an inbox directory for new reports.

pub mod processor;
pub mod watcher;

pub use ecarts_core as core;
pub use ecarts_data as data;
