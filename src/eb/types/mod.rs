//! Foundational data structures, error types, and parser configuration.

pub mod config;
pub mod error;
pub mod models;
