//! Search projection logic
//!
//! The backend performs the matching; the client's only job is to treat the
//! returned hits as a parallel display list in the server's relevance order,
//! never re-sorting them and never writing them back into canonical history.
//! Clearing the query is purely client-local.

use crate::api::Message;

/// The list the presentation layer should render.
#[derive(Debug, Clone)]
pub enum MessageView {
    /// Canonical history in backend-timestamp order.
    Chronological(Vec<Message>),
    /// Search hits in the server's relevance order.
    Relevance(Vec<Message>),
}

impl MessageView {
    pub fn messages(&self) -> &[Message] {
        match self {
            MessageView::Chronological(m) | MessageView::Relevance(m) => m,
        }
    }

    /// True when rendering a search projection (highlights apply).
    pub fn is_search(&self) -> bool {
        matches!(self, MessageView::Relevance(_))
    }
}

/// Project the display list: the active search overlay when present,
/// otherwise the canonical log. The two are never merged.
pub fn project(canonical: &[Message], hits: Option<&[Message]>) -> MessageView {
    match hits {
        Some(hits) => MessageView::Relevance(hits.to_vec()),
        None => MessageView::Chronological(canonical.to_vec()),
    }
}
