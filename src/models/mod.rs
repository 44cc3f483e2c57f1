//! Data Models
//!
//! Application-level configuration types. Survey domain types live in
//! `esg-survey-core`.

pub mod settings;

pub use settings::*;
