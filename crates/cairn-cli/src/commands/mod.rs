//! CLI command implementations

pub mod completions;
pub mod config;
pub mod query;
pub mod resolve;
pub mod rules;
pub mod traverse;
