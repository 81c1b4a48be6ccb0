//! Route modules.

pub mod files;
pub mod health;
