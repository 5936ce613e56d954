//! Translation backend client
//!
//! A stateless request/response wrapper around the consultation backend:
//! send text, upload audio, fetch history, search, summarize, health.
//! Every call is one HTTP exchange with no retry; callers own retry policy
//! and all local state.

mod client;
mod types;

pub use client::{HttpTranslationApi, TranslationApi};
pub use types::{AudioPayload, HealthStatus, Message, Role, Summary, Translation};
