//! SQLite Row Sink
//!
//! Stores each completed survey row as a JSON array in `survey_responses`.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use esg_survey_core::{CoreError, CoreResult, PersistenceSink, RowValue};

use crate::storage::database::Database;

pub struct SqliteRowSink {
    db: Database,
    session_id: String,
}

impl SqliteRowSink {
    pub fn new(db: Database, session_id: impl Into<String>) -> Self {
        Self {
            db,
            session_id: session_id.into(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PersistenceSink for SqliteRowSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append_row(&self, values: &[RowValue]) -> CoreResult<()> {
        let row_json = serde_json::to_string(values)?;
        let db = self.db.clone();
        let session_id = self.session_id.clone();
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();

        tokio::task::spawn_blocking(move || {
            db.insert_survey_response(&id, &session_id, &row_json, &created_at)
        })
        .await
        .map_err(|e| CoreError::internal(format!("SQLite task failed: {}", e)))?
        .map_err(|e| CoreError::persistence(e.to_string()))
    }
}
