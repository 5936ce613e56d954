use serde::{Deserialize, Serialize};

use crate::api::Role;
use crate::error::{Error, Result};

/// Language codes the backend's translator accepts.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "zh-Hans", "ar", "hi", "pt", "fil",
];

/// Conversation used when no explicit scope is configured.
pub const DEFAULT_CONVERSATION: &str = "default";

/// Configuration for one consultation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// This client's participant role, fixed once chosen.
    pub role: Role,

    /// Language this participant speaks.
    pub source_language: String,

    /// Language the counterpart speaks. May equal `source_language`
    /// (no-op translation).
    pub target_language: String,

    /// Conversation scope. `None` selects the backend's implicit default
    /// conversation for history and search; summaries always address
    /// [`DEFAULT_CONVERSATION`] in that case.
    pub conversation_id: Option<String>,

    /// Maximum number of history messages fetched at session start.
    pub history_limit: usize,
}

impl SessionConfig {
    /// Build a validated session configuration.
    pub fn new(role: Role, source_language: &str, target_language: &str) -> Result<Self> {
        for code in [source_language, target_language] {
            if !SUPPORTED_LANGUAGES.contains(&code) {
                return Err(Error::Config(format!(
                    "unsupported language '{code}' (supported: {})",
                    SUPPORTED_LANGUAGES.join(", ")
                )));
            }
        }

        Ok(Self {
            role,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            conversation_id: None,
            history_limit: 100,
        })
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Conversation ID used for summary generation, which requires an
    /// explicit scope.
    pub fn summary_conversation(&self) -> &str {
        self.conversation_id
            .as_deref()
            .unwrap_or(DEFAULT_CONVERSATION)
    }
}
