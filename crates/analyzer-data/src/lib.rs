//! Data ingestion layer for Bank Analyzer.
//!
//! Responsible for discovering and parsing OFX exports, merging them into
//! per-account timelines, resolving display aliases, building the chart
//! artifacts and running the top-level analysis pipeline.

pub mod aggregator;
pub mod aliases;
pub mod analysis;
pub mod ofx;
pub mod reader;
pub mod report;

pub use analyzer_core as core;
