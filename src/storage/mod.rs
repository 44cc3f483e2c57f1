//! Storage Layer
//!
//! Handles local data: SQLite database and JSON config.

pub mod config;
pub mod database;

pub use config::*;
pub use database::*;
