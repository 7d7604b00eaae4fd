//! Optimistic local-echo reconciliation.
//!
//! On send, the composer appends a provisional message immediately and
//! registers it here. When the broker delivers the server-confirmed copy
//! back to the sender's own inbox, the router matches it against a
//! pending echo by `(content, context)` within a short window and
//! replaces the provisional entry instead of duplicating it.

use std::time::Duration;

use parlor_core::ChatContext;

/// One provisional message awaiting its confirmed copy.
#[derive(Debug, Clone)]
struct PendingEcho<I> {
    /// Provisional message id in the session's list.
    id: String,
    /// Trimmed content as sent.
    content: String,
    /// Context the message was sent in.
    context: ChatContext,
    /// When the echo was created.
    sent_at: I,
}

/// Pending local echoes.
#[derive(Debug, Clone, Default)]
pub struct EchoRegistry<I> {
    pending: Vec<PendingEcho<I>>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> EchoRegistry<I> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Register a freshly-appended local echo.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        context: ChatContext,
        sent_at: I,
    ) {
        self.pending.push(PendingEcho {
            id: id.into(),
            content: content.into(),
            context,
            sent_at,
        });
    }

    /// Consume the oldest pending echo matching `(content, context)`
    /// within `window`, returning its provisional id.
    pub fn take_match(
        &mut self,
        content: &str,
        context: ChatContext,
        now: I,
        window: Duration,
    ) -> Option<String> {
        let index = self.pending.iter().position(|echo| {
            echo.context == context && echo.content == content && now - echo.sent_at <= window
        })?;
        Some(self.pending.remove(index).id)
    }

    /// Drop echoes older than `window`; their confirmed copy either never
    /// came back or was missed, and the provisional entry stays as-is.
    pub fn prune(&mut self, now: I, window: Duration) {
        self.pending.retain(|echo| now - echo.sent_at <= window);
    }

    /// Drop all pending echoes (context switch or teardown).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of echoes awaiting confirmation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
