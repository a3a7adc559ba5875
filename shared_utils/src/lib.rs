//! Helpers shared by the workspace crates: credential loading and
//! environment variable access.

pub mod config;
pub mod env;
