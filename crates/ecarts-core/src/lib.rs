//! Shared building blocks for the gap-analysis workspace.
//!
//! Holds the data model, category configuration, day/hour key conventions,
//! message formatting, CLI settings and the common error type.

pub mod categories;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
