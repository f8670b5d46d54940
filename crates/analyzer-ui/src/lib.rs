//! Terminal UI layer for Bank Analyzer.
//!
//! Provides themes, the header component, balance and stacked chart views,
//! the account table, off-screen text export and the interactive viewer
//! event loop built on top of [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod export;
pub mod table_view;
pub mod themes;

pub use analyzer_core as core;
