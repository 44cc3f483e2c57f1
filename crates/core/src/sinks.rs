//! Collaborator Traits
//!
//! The survey core talks to the outside world only through these traits:
//! where topics come from, where messages and charts go, where the final row
//! is stored, and where user input is read from.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::models::{RowValue, Speaker, Topic};

/// Ordered, fixed sequence of topics to present
pub trait ContentSource: Send + Sync {
    /// All topics in presentation order. Indices are `0..len`.
    fn topics(&self) -> Vec<Topic>;
}

/// Display surface for chat messages and the final chart
pub trait PresentationSink: Send {
    /// Render one chat message
    fn render_message(&mut self, speaker: Speaker, text: &str);

    /// Render a bar chart of named scores, in the given order
    fn render_bar_chart(&mut self, labeled_scores: &[(String, u8)]);
}

/// Append-only store for completed survey rows
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Short identifier used in logs and warnings
    fn name(&self) -> &str;

    /// Append one row: reactions in topic order, then scores in dimension order
    async fn append_row(&self, values: &[RowValue]) -> CoreResult<()>;
}

/// Source of user turns
#[async_trait]
pub trait InputSource: Send {
    /// Read the next user input.
    ///
    /// `Ok(None)` means no new turn this cycle. `Err(CoreError::InputClosed)`
    /// means the user surface is gone and no further turns will arrive.
    async fn read_next_input(&mut self) -> CoreResult<Option<String>>;
}

/// Content source backed by an in-memory list of headlines
#[derive(Debug, Clone, Default)]
pub struct StaticTopics {
    headlines: Vec<String>,
}

impl StaticTopics {
    pub fn new<I, S>(headlines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headlines: headlines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.headlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headlines.is_empty()
    }
}

impl ContentSource for StaticTopics {
    fn topics(&self) -> Vec<Topic> {
        self.headlines
            .iter()
            .enumerate()
            .map(|(i, h)| Topic::new(i, h.clone()))
            .collect()
    }
}
