use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::events::SessionEvent;
use crate::api::{AudioPayload, Message, Summary, TranslationApi};
use crate::error::{Error, Result};
use crate::search::{self, MessageView};

/// Capacity of the event channel; renderers that fall this far behind
/// resynchronize from a fresh snapshot.
const EVENT_CAPACITY: usize = 64;

/// Single authority for session state.
///
/// Owns the canonical message log, the active search projection, the pending
/// flag and the summary result; mediates between the capture pipeline, the
/// API client and the presentation layer. Sends are serialized behind
/// `pending`: a second send cannot start while one is outstanding, so the log
/// order is exactly the order of successful responses. All API failures are
/// converted into a cleared pending flag plus a broadcast notice; none can
/// leave `pending` stuck true.
pub struct SessionStore {
    api: Arc<dyn TranslationApi>,
    config: SessionConfig,
    messages: Mutex<Vec<Message>>,
    search_hits: Mutex<Option<Vec<Message>>>,
    summary: Mutex<Option<Summary>>,
    pending: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn TranslationApi>, config: SessionConfig) -> Self {
        info!(
            "Session opened: role={}, {} -> {}",
            config.role, config.source_language, config.target_language
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            config,
            messages: Mutex::new(Vec::new()),
            search_hits: Mutex::new(None),
            summary: Mutex::new(None),
            pending: AtomicBool::new(false),
            events,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// True while a send/search/summary exchange is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Snapshot of canonical history, chronological.
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    /// The list to render: active search projection, else canonical history.
    pub async fn view(&self) -> MessageView {
        let messages = self.messages.lock().await;
        let hits = self.search_hits.lock().await;
        search::project(&messages, hits.as_deref())
    }

    /// Latest summary, if one was generated.
    pub async fn summary(&self) -> Option<Summary> {
        self.summary.lock().await.clone()
    }

    /// Replace canonical history with the backend's, once at session start.
    /// Failure leaves the log empty: degraded but usable, not fatal.
    pub async fn load_history(&self) -> Result<()> {
        if !self.acquire_pending() {
            debug!("load_history skipped: operation in flight");
            return Ok(());
        }

        let result = self
            .api
            .history(self.config.conversation_id.as_deref(), self.config.history_limit)
            .await;

        match result {
            Ok(mut fetched) => {
                // Backend-timestamp order, not response order.
                fetched.sort_by_key(Message::timestamp_utc);
                let count = fetched.len();
                *self.messages.lock().await = fetched;
                info!("History loaded: {} messages", count);
                self.emit(SessionEvent::HistoryLoaded { count });
                self.release_pending();
                Ok(())
            }
            Err(e) => {
                self.release_pending();
                warn!("History load failed, starting with empty log: {}", e);
                self.emit(SessionEvent::Notice(format!(
                    "Could not load conversation history: {e}"
                )));
                Ok(())
            }
        }
    }

    /// Send a text message. No-op when pending or the trimmed text is empty;
    /// on failure the text is not re-queued.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            debug!("send_text skipped: empty text");
            return Ok(());
        }
        if !self.acquire_pending() {
            debug!("send_text skipped: operation in flight");
            return Ok(());
        }

        let result = self
            .api
            .send_message(
                text,
                self.config.role,
                &self.config.source_language,
                &self.config.target_language,
            )
            .await;

        match result {
            Ok(message) => {
                // Append before clearing pending, so a send admitted the
                // instant the flag drops can never interleave with ours.
                self.append(message).await;
                self.release_pending();
                Ok(())
            }
            Err(e) => {
                self.release_pending();
                Err(self.notify_failure("Failed to send message", e))
            }
        }
    }

    /// Send a captured audio payload. Same contract as [`Self::send_text`].
    pub async fn send_audio(&self, payload: AudioPayload) -> Result<()> {
        if payload.bytes.is_empty() {
            debug!("send_audio skipped: empty payload");
            return Ok(());
        }
        if !self.acquire_pending() {
            debug!("send_audio skipped: operation in flight");
            return Ok(());
        }

        let result = self
            .api
            .upload_audio(
                payload,
                self.config.role,
                &self.config.source_language,
                &self.config.target_language,
            )
            .await;

        match result {
            Ok(message) => {
                self.append(message).await;
                self.release_pending();
                Ok(())
            }
            Err(e) => {
                self.release_pending();
                Err(self.notify_failure("Failed to send audio message", e))
            }
        }
    }

    /// Search the conversation. An empty/whitespace query clears the
    /// projection locally with no network round-trip; a non-empty query
    /// replaces the projection with the server's hits in relevance order.
    /// Canonical history is never touched.
    pub async fn search(&self, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            let mut hits = self.search_hits.lock().await;
            if hits.take().is_some() {
                info!("Search cleared");
                self.emit(SessionEvent::SearchCleared);
            }
            return Ok(());
        }

        if !self.acquire_pending() {
            debug!("search skipped: operation in flight");
            return Ok(());
        }

        let result = self
            .api
            .search(query, self.config.conversation_id.as_deref())
            .await;

        match result {
            Ok(results) => {
                let count = results.len();
                *self.search_hits.lock().await = Some(results);
                info!("Search {:?}: {} hits", query, count);
                self.emit(SessionEvent::SearchUpdated { hits: count });
                self.release_pending();
                Ok(())
            }
            Err(e) => {
                self.release_pending();
                Err(self.notify_failure("Search failed", e))
            }
        }
    }

    /// Generate a conversation summary. No-op when the log is empty or an
    /// operation is in flight, so two summary requests can never race.
    pub async fn request_summary(&self) -> Result<()> {
        if self.messages.lock().await.is_empty() {
            debug!("request_summary skipped: no messages");
            return Ok(());
        }
        if !self.acquire_pending() {
            debug!("request_summary skipped: operation in flight");
            return Ok(());
        }

        let result = self.api.summarize(self.config.summary_conversation()).await;

        match result {
            Ok(summary) => {
                info!("Summary generated ({} messages)", summary.message_count);
                *self.summary.lock().await = Some(summary.clone());
                self.emit(SessionEvent::SummaryReady(summary));
                self.release_pending();
                Ok(())
            }
            Err(e) => {
                self.release_pending();
                Err(self.notify_failure("Failed to generate summary", e))
            }
        }
    }

    async fn append(&self, message: Message) {
        self.messages.lock().await.push(message.clone());
        self.emit(SessionEvent::MessageAppended(message));
    }

    fn acquire_pending(&self) -> bool {
        let acquired = self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if acquired {
            self.emit(SessionEvent::PendingChanged(true));
        }
        acquired
    }

    fn release_pending(&self) {
        self.pending.store(false, Ordering::SeqCst);
        self.emit(SessionEvent::PendingChanged(false));
    }

    fn notify_failure(&self, context: &str, err: Error) -> Error {
        warn!("{}: {}", context, err);
        self.emit(SessionEvent::Notice(format!("{context}: {err}")));
        err
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.send(event);
    }
}
