use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Participant role in a consultation. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(crate::Error::Config(format!(
                "unknown role '{other}' (expected 'doctor' or 'patient')"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentinel prefixes the backend puts on `translated_text` when translation
/// could not be performed. Detected client-side so the presentation layer can
/// render a "translation unavailable" notice instead of the raw sentinel.
const UNAVAILABLE_MARKERS: [&str; 3] = [
    "[Translation disabled",
    "[Translation error]",
    "[Translation unavailable]",
];

/// A single consultation turn as stored by the backend.
///
/// Immutable once created; `id` and `timestamp` are backend-assigned.
/// `highlight` is present only on search results, never on canonical history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,

    pub role: Role,

    /// The text as authored, or the transcription for voice messages
    /// (may be empty when transcription failed on an otherwise successful call).
    pub original_text: String,

    /// Absent until translation completes; may carry a sentinel marker,
    /// see [`Message::translation`].
    #[serde(default)]
    pub translated_text: Option<String>,

    /// Playable audio resource, present only for voice-originated messages.
    #[serde(default)]
    pub audio_url: Option<String>,

    /// Backend-assigned creation instant (ISO-8601 string on the wire).
    pub timestamp: String,

    /// Matched-text snippet, set by the backend on search hits only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

/// Outcome of translating a message, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation<'a> {
    /// A real translation distinct from the original text.
    Ready(&'a str),
    /// Source and target text are identical: nothing to translate.
    NotNeeded,
    /// The backend marked the translation as failed/disabled; the carried
    /// sentinel text must not be rendered verbatim.
    Unavailable,
    /// No translated text present (yet).
    Missing,
}

impl Message {
    /// Classify this message's translation state.
    pub fn translation(&self) -> Translation<'_> {
        match self.translated_text.as_deref() {
            None => Translation::Missing,
            Some(text) => {
                if UNAVAILABLE_MARKERS.iter().any(|m| text.starts_with(m)) {
                    Translation::Unavailable
                } else if text == self.original_text {
                    Translation::NotNeeded
                } else {
                    Translation::Ready(text)
                }
            }
        }
    }

    /// Parse the backend timestamp for ordering. Accepts both RFC 3339 and
    /// the backend's timezone-less ISO format.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// AI-generated conversation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// The summary text (wire field `summary`).
    #[serde(rename = "summary")]
    pub text: String,

    /// Number of messages the summary covers.
    pub message_count: usize,

    /// When the backend generated it (ISO-8601 string).
    pub generated_at: String,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Opaque captured-audio payload handed from the capture pipeline to the API.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }
}

// Response envelopes. Non-2xx statuses never reach these; a 2xx body with
// `success: false` is treated as a protocol failure by the client.

#[derive(Debug, Deserialize)]
pub(crate) struct SendResponse {
    pub success: bool,
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub success: bool,
    pub results: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    pub success: bool,
    pub summary: Summary,
}
