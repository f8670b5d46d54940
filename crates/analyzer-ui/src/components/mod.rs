//! Reusable widgets shared by the analyzer views.

pub mod header;
