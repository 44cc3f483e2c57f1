//! Terminal Surfaces
//!
//! Line-oriented presentation and input for running a survey in a terminal.

pub mod terminal;

pub use terminal::{render_bar, LineInput, TerminalPresenter, BAR_WIDTH};
