//! csvdash: load a table, classify its columns, filter it and summarize it.
//!
//! The analytical core lives in [`data`]; [`export`] and [`config`] are shared
//! by the dashboard and the command line.

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod format;
