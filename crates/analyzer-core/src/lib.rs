//! Domain layer for Bank Analyzer.
//!
//! Holds the account / transaction model, the error taxonomy, CLI settings,
//! OFX value parsing, balance calculations and display formatting shared by
//! the data and UI crates.

pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{AnalyzerError, Result};
