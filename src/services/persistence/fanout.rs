//! Sink Composition
//!
//! `FanOutSink` writes each row to several sinks; `NullSink` only logs it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use esg_survey_core::{CoreError, CoreResult, PersistenceSink, RowValue};

/// Writes every row to each inner sink, in order.
///
/// All sinks are attempted even if one fails; failures are reported together.
pub struct FanOutSink {
    sinks: Vec<Arc<dyn PersistenceSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Arc<dyn PersistenceSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl PersistenceSink for FanOutSink {
    fn name(&self) -> &str {
        "fan-out"
    }

    async fn append_row(&self, values: &[RowValue]) -> CoreResult<()> {
        let mut failures = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.append_row(values).await {
                failures.push(format!("{}: {}", sink.name(), e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CoreError::persistence(failures.join("; ")))
        }
    }
}

/// Used when no sink is configured
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl PersistenceSink for NullSink {
    fn name(&self) -> &str {
        "none"
    }

    async fn append_row(&self, values: &[RowValue]) -> CoreResult<()> {
        let row = serde_json::to_string(values)?;
        info!(row = %row, "no persistence sink configured, row not stored");
        Ok(())
    }
}
