//! Terminal presenter and line input.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::warn;

use esg_survey_core::{CoreError, CoreResult, InputSource, PresentationSink, Speaker, MAX_SCORE};

use crate::services::survey::prompts::{CHART_TITLE, CHART_VALUE_LABEL};

/// Width of a full-scale (100) bar in characters
pub const BAR_WIDTH: usize = 40;

/// One horizontal bar for a score, scaled to [`BAR_WIDTH`]
pub fn render_bar(score: u8) -> String {
    let score = score.min(MAX_SCORE) as usize;
    let filled = (score * BAR_WIDTH + MAX_SCORE as usize / 2) / MAX_SCORE as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Writes chat messages and the profile chart to any `Write`.
pub struct TerminalPresenter<W: Write + Send> {
    out: W,
    echo_user: bool,
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, echo_user: bool) -> Self {
        Self { out, echo_user }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) {
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(self.out, "{}", line))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> PresentationSink for TerminalPresenter<W> {
    fn render_message(&mut self, speaker: Speaker, text: &str) {
        let line = match speaker {
            Speaker::Bot => format!("🤖 {}", text),
            Speaker::User if self.echo_user => format!("🧑 {}", text),
            Speaker::User => return,
        };
        self.write_lines(&[line, String::new()]);
    }

    fn render_bar_chart(&mut self, labeled_scores: &[(String, u8)]) {
        let label_width = labeled_scores
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines = vec![CHART_TITLE.to_string()];
        for (label, score) in labeled_scores {
            lines.push(format!(
                "  {:<width$}  {} {:>3}",
                label,
                render_bar(*score),
                score,
                width = label_width
            ));
        }
        lines.push(format!("  {}", CHART_VALUE_LABEL));
        lines.push(String::new());
        self.write_lines(&lines);
    }
}

/// Reads one user turn per line.
///
/// A blank line is "no turn"; end of input closes the session.
pub struct LineInput<R> {
    reader: R,
    prompt: Option<String>,
}

impl LineInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin())).with_prompt("> ")
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }

    /// Print a prompt on stdout before each read
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InputSource for LineInput<R> {
    async fn read_next_input(&mut self) -> CoreResult<Option<String>> {
        if let Some(prompt) = &self.prompt {
            let mut out = std::io::stdout();
            let _ = write!(out, "{}", prompt);
            let _ = out.flush();
        }

        let mut buf = Vec::new();
        let read = self.reader.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Err(CoreError::InputClosed);
        }

        let line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(e) => {
                warn!(bytes = read, error = %e, "discarding input line that is not valid UTF-8");
                return Ok(None);
            }
        };
        let line = line.trim();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line.to_string()))
        }
    }
}
