//! Persistence Sinks
//!
//! Destinations for the completed survey row: local SQLite and Google Sheets.

pub mod fanout;
pub mod sheets;
pub mod sqlite;

use std::sync::Arc;

use tracing::warn;

use esg_survey_core::{PersistenceSink, ProxyConfig};

use crate::models::settings::PersistenceConfig;
use crate::storage::database::Database;
use crate::utils::error::AppResult;

pub use fanout::{FanOutSink, NullSink};
pub use sheets::SheetsRowSink;
pub use sqlite::SqliteRowSink;

/// Build the configured sink for one session.
///
/// Sheets is skipped with a warning when no token is available.
pub fn build_persistence(
    config: &PersistenceConfig,
    session_id: &str,
    sheets_token: Option<String>,
    proxy: Option<&ProxyConfig>,
) -> AppResult<Arc<dyn PersistenceSink>> {
    let mut sinks: Vec<Arc<dyn PersistenceSink>> = Vec::new();

    if config.sqlite {
        let db = match &config.sqlite_path {
            Some(path) => Database::open(path)?,
            None => Database::new()?,
        };
        sinks.push(Arc::new(SqliteRowSink::new(db, session_id)));
    }

    if let Some(sheets) = &config.sheets {
        match sheets_token {
            Some(token) => sinks.push(Arc::new(SheetsRowSink::new(sheets, token, proxy)?)),
            None => warn!(
                spreadsheet_id = %sheets.spreadsheet_id,
                "Sheets configured but GOOGLE_SHEETS_TOKEN is not set, skipping"
            ),
        }
    }

    Ok(match sinks.len() {
        0 => Arc::new(NullSink),
        1 => sinks.remove(0),
        _ => Arc::new(FanOutSink::new(sinks)),
    })
}
