use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use super::types::{
    AudioPayload, HealthStatus, HistoryResponse, Message, Role, SearchResponse, SendResponse,
    Summary, SummaryResponse,
};
use crate::error::{Error, Result};

/// Filename the backend expects for uploaded recordings.
const UPLOAD_FILENAME: &str = "recording.webm";

/// Stateless wrapper around the translation backend.
///
/// Every operation is a single request/response exchange with no retry and no
/// effect on local session state; the orchestrator folds results into the
/// session. Implemented as a trait so the session store can be exercised
/// against scripted backends in tests.
#[async_trait::async_trait]
pub trait TranslationApi: Send + Sync {
    /// Send a text message; the backend assigns id, timestamp and translation.
    async fn send_message(
        &self,
        text: &str,
        role: Role,
        language: &str,
        target_language: &str,
    ) -> Result<Message>;

    /// Upload a captured audio payload; `original_text` on the returned
    /// message is the backend's transcription (possibly empty).
    async fn upload_audio(
        &self,
        payload: AudioPayload,
        role: Role,
        language: &str,
        target_language: &str,
    ) -> Result<Message>;

    /// Fetch up to `limit` messages of conversation history, oldest first.
    async fn history(&self, conversation_id: Option<&str>, limit: usize) -> Result<Vec<Message>>;

    /// Server-side full-text search. Callers must not pass empty queries.
    async fn search(&self, query: &str, conversation_id: Option<&str>) -> Result<Vec<Message>>;

    /// Generate an AI summary of the server-held conversation.
    async fn summarize(&self, conversation_id: &str) -> Result<Summary>;

    /// Liveness probe.
    async fn health(&self) -> Result<HealthStatus>;
}

/// HTTP implementation of [`TranslationApi`].
///
/// `ureq` is a blocking client, so every exchange runs on the tokio blocking
/// pool; the agent is an `Arc` internally and clones cheaply into each task.
pub struct HttpTranslationApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTranslationApi {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Translation API client for {}", base_url);

        let agent = ureq::AgentBuilder::new().timeout(request_timeout).build();

        Self { agent, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run a blocking exchange on the blocking pool.
    async fn execute<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(ureq::Agent) -> Result<T> + Send + 'static,
    {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || op(agent))
            .await
            .map_err(|e| Error::Network(format!("request task failed: {e}")))?
    }
}

fn map_transport(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, _) => Error::Server(code),
        other => Error::Network(other.to_string()),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T> {
    response
        .into_json::<T>()
        .map_err(|e| Error::Protocol(e.to_string()))
}

fn reported_failure() -> Error {
    Error::Protocol("backend reported success=false".to_string())
}

/// Build a `multipart/form-data` body by hand (ureq has no multipart helper).
/// Field order matches the original client: file first, then metadata.
fn multipart_body(
    payload: &AudioPayload,
    role: Role,
    language: &str,
    target_language: &str,
) -> (String, Vec<u8>) {
    let boundary = format!("----ConsultBridge{}", Uuid::new_v4().simple());
    let mut body = Vec::with_capacity(payload.bytes.len() + 512);

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{UPLOAD_FILENAME}\"\r\nContent-Type: {}\r\n\r\n",
            payload.content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&payload.bytes);
    body.extend_from_slice(b"\r\n");

    for (name, value) in [
        ("role", role.as_str()),
        ("language", language),
        ("target_language", target_language),
    ] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={boundary}"),
        body,
    )
}

#[async_trait::async_trait]
impl TranslationApi for HttpTranslationApi {
    async fn send_message(
        &self,
        text: &str,
        role: Role,
        language: &str,
        target_language: &str,
    ) -> Result<Message> {
        let url = self.url("/api/messages/send");
        let body = serde_json::json!({
            "text": text,
            "role": role,
            "language": language,
            "target_language": target_language,
        });

        debug!("POST {} (role={})", url, role);

        self.execute(move |agent| {
            let response = agent.post(&url).send_json(body).map_err(map_transport)?;
            let envelope: SendResponse = parse_body(response)?;
            if !envelope.success {
                return Err(reported_failure());
            }
            Ok(envelope.message)
        })
        .await
    }

    async fn upload_audio(
        &self,
        payload: AudioPayload,
        role: Role,
        language: &str,
        target_language: &str,
    ) -> Result<Message> {
        let url = self.url("/api/messages/audio");
        let (content_type, body) = multipart_body(&payload, role, language, target_language);

        debug!(
            "POST {} ({} bytes, role={})",
            url,
            payload.bytes.len(),
            role
        );

        self.execute(move |agent| {
            let response = agent
                .post(&url)
                .set("Content-Type", &content_type)
                .send_bytes(&body)
                .map_err(map_transport)?;
            let envelope: SendResponse = parse_body(response)?;
            if !envelope.success {
                return Err(reported_failure());
            }
            Ok(envelope.message)
        })
        .await
    }

    async fn history(&self, conversation_id: Option<&str>, limit: usize) -> Result<Vec<Message>> {
        let url = self.url("/api/messages/history");
        let conversation_id = conversation_id.map(str::to_string);

        debug!("GET {} (limit={})", url, limit);

        self.execute(move |agent| {
            let mut request = agent.get(&url).query("limit", &limit.to_string());
            if let Some(id) = &conversation_id {
                request = request.query("conversation_id", id);
            }
            let response = request.call().map_err(map_transport)?;
            let envelope: HistoryResponse = parse_body(response)?;
            if !envelope.success {
                return Err(reported_failure());
            }
            Ok(envelope.messages)
        })
        .await
    }

    async fn search(&self, query: &str, conversation_id: Option<&str>) -> Result<Vec<Message>> {
        let url = self.url("/api/messages/search");
        let body = serde_json::json!({
            "query": query,
            "conversation_id": conversation_id,
        });

        debug!("POST {} (query={:?})", url, query);

        self.execute(move |agent| {
            let response = agent.post(&url).send_json(body).map_err(map_transport)?;
            let envelope: SearchResponse = parse_body(response)?;
            if !envelope.success {
                return Err(reported_failure());
            }
            Ok(envelope.results)
        })
        .await
    }

    async fn summarize(&self, conversation_id: &str) -> Result<Summary> {
        let url = self.url("/api/summary/generate");
        let body = serde_json::json!({ "conversation_id": conversation_id });

        debug!("POST {} (conversation={})", url, conversation_id);

        self.execute(move |agent| {
            let response = agent.post(&url).send_json(body).map_err(map_transport)?;
            let envelope: SummaryResponse = parse_body(response)?;
            if !envelope.success {
                return Err(reported_failure());
            }
            Ok(envelope.summary)
        })
        .await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.url("/api/health");

        self.execute(move |agent| {
            let response = agent.get(&url).call().map_err(map_transport)?;
            parse_body(response)
        })
        .await
    }
}
