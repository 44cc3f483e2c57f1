//! ESG Survey - Rust Backend Library
//!
//! Guided survey over ESG news headlines. Each reaction is judged for
//! sufficiency by a language model, followed up on when thin, and the full
//! transcript is distilled into a scored investor profile that is charted and
//! stored.
//!
//! - `services` - survey flow, persistence sinks, terminal surfaces
//! - `storage` - config file and SQLite pool
//! - `models` - application configuration
//! - `utils` - errors and paths
//! - `cli` - command-line arguments for the `esg-survey` binary

pub mod cli;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, SurveyConfig};
pub use services::survey::{build_runner, SessionOutcome, SessionReport, SurveyRunner};
pub use utils::error::{AppError, AppResult};
