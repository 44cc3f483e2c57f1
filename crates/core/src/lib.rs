//! ESG Survey Core
//!
//! Foundational types, collaborator traits and error types for the ESG headline
//! survey workspace. This crate has zero dependencies on application-level code
//! (LLM providers, database, terminal rendering, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `models` - Survey domain types (`Topic`, `Turn`, `TopicOutcome`, `Profile`, `RowValue`)
//! - `sinks` - Collaborator traits (`ContentSource`, `PresentationSink`, `PersistenceSink`, `InputSource`)
//! - `proxy` - Proxy configuration data types shared with the LLM crate
//!
//! ## Design Principles
//!
//! 1. **No dependencies beyond serde, async-trait and thiserror**
//! 2. **Trait-based collaborators** - every outer surface can be swapped or mocked
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod models;
pub mod proxy;
pub mod sinks;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Domain Types ───────────────────────────────────────────────────────
pub use models::{ChatMessage, Profile, RowValue, Speaker, Topic, TopicOutcome, Turn, MAX_SCORE};

// ── Collaborator Traits ────────────────────────────────────────────────
pub use sinks::{ContentSource, InputSource, PersistenceSink, PresentationSink, StaticTopics};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
