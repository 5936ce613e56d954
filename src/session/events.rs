use crate::api::{Message, Summary};

/// State-change notifications for the presentation layer.
///
/// Replaces the original framework's implicit re-render-on-state-change: the
/// store broadcasts an event for every observable mutation and the
/// presentation layer re-reads whatever state it renders.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Canonical history was replaced at session start.
    HistoryLoaded { count: usize },

    /// A sent message was acknowledged and appended to canonical history.
    MessageAppended(Message),

    /// The search projection was replaced with server hits.
    SearchUpdated { hits: usize },

    /// The search projection was cleared; canonical history is live again.
    SearchCleared,

    /// A conversation summary is available.
    SummaryReady(Summary),

    /// The in-flight-operation flag changed.
    PendingChanged(bool),

    /// One-shot user-visible failure notice; the operation was not retried
    /// and input stays enabled.
    Notice(String),
}
