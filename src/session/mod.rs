//! Consultation session orchestration
//!
//! This module provides the `SessionStore` that manages:
//! - The canonical, chronologically ordered message log
//! - The active search projection (never merged into the log)
//! - The single in-flight-operation flag gating sends and summaries
//! - The AI-generated summary result
//! - Broadcast notifications for the presentation layer

mod config;
mod events;
mod store;

pub use config::{SessionConfig, DEFAULT_CONVERSATION, SUPPORTED_LANGUAGES};
pub use events::SessionEvent;
pub use store::SessionStore;
