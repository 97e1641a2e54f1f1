//! Server-push handling.
//!
//! Untagged responses that arrive outside any in-flight command window —
//! during IDLE or between commands — are delivered to the
//! [`ServerEventHandler`] supplied at connect time. Every hook has a no-op
//! default, so implementors override only what they care about.

use crate::parser::{FetchAttr, UntaggedResponse};
use crate::types::{Flags, UidSet};

/// Receiver for unsolicited server responses.
pub trait ServerEventHandler: Send {
    /// Message count changed (EXISTS).
    fn on_exists(&mut self, count: u32) {
        let _ = count;
    }

    /// A message was removed (EXPUNGE). The sequence number refers to the
    /// message's position before removal.
    fn on_expunge(&mut self, seq: u32) {
        let _ = seq;
    }

    /// Recent count changed (RECENT).
    fn on_recent(&mut self, count: u32) {
        let _ = count;
    }

    /// Message metadata changed (unsolicited FETCH), typically flag
    /// changes made from another connection.
    fn on_fetch(&mut self, seq: u32, attrs: &[FetchAttr]) {
        let _ = (seq, attrs);
    }

    /// The mailbox's flag list changed (FLAGS).
    fn on_flags(&mut self, flags: &Flags) {
        let _ = flags;
    }

    /// UIDs vanished (QRESYNC).
    fn on_vanished(&mut self, earlier: bool, uids: &UidSet) {
        let _ = (earlier, uids);
    }

    /// An ALERT response code arrived; the text must reach the user.
    fn on_alert(&mut self, text: &str) {
        let _ = text;
    }

    /// The server announced shutdown (BYE).
    fn on_bye(&mut self, text: &str) {
        let _ = text;
    }

    /// Catch-all for any unsolicited response, called after the specific
    /// hook (if one applies).
    fn on_untagged(&mut self, response: &UntaggedResponse) {
        let _ = response;
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl ServerEventHandler for NoopHandler {}

/// Logs every event at debug level via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ServerEventHandler for LoggingHandler {
    fn on_exists(&mut self, count: u32) {
        tracing::debug!(count, "EXISTS");
    }

    fn on_expunge(&mut self, seq: u32) {
        tracing::debug!(seq, "EXPUNGE");
    }

    fn on_recent(&mut self, count: u32) {
        tracing::debug!(count, "RECENT");
    }

    fn on_fetch(&mut self, seq: u32, attrs: &[FetchAttr]) {
        tracing::debug!(seq, ?attrs, "FETCH");
    }

    fn on_flags(&mut self, flags: &Flags) {
        tracing::debug!(?flags, "FLAGS");
    }

    fn on_vanished(&mut self, earlier: bool, uids: &UidSet) {
        tracing::debug!(earlier, %uids, "VANISHED");
    }

    fn on_alert(&mut self, text: &str) {
        tracing::warn!(text, "ALERT");
    }

    fn on_bye(&mut self, text: &str) {
        tracing::debug!(text, "BYE");
    }
}
