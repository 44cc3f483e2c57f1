//! Services
//!
//! Business logic for the survey. `survey` holds the session flow, the
//! other two modules are the outer surfaces it is wired to.

pub mod persistence;
pub mod render;
pub mod survey;

pub use persistence::build_persistence;
pub use render::{LineInput, TerminalPresenter};
pub use survey::{build_runner, SessionOutcome, SessionReport, SurveyRunner};
