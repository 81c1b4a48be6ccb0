//! # rebucket-common
//!
//! Shared types, configuration, and error handling used across all Rebucket crates.
//! This is the foundation layer — no resolution logic, just primitives and contracts.

pub mod config;
pub mod error;
pub mod models;
