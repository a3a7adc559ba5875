#[cfg(feature = "cli")]
pub mod cli;
pub mod io;
pub mod models;
pub mod providers;
