//! Streaming FETCH results.
//!
//! A [`FetchStream`] yields `(seq, attributes)` pairs one at a time, in
//! server order, without buffering the whole response. The sequence is
//! finite (it ends at the tagged completion) and non-restartable.
//!
//! Dropping the stream early does not interrupt the server: the session
//! remembers the in-flight tag and drains the remaining responses into a
//! discard sink before the next command is written.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::parser::{FetchAttr, Frame, UntaggedResponse};
use crate::types::{Status, Tag};
use crate::{Error, Result};

use super::session::Session;

/// Lazy sequence of FETCH results for one command.
pub struct FetchStream<'a, S> {
    session: &'a mut Session<S>,
    tag: Tag,
    done: bool,
}

impl<'a, S> FetchStream<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(super) fn new(session: &'a mut Session<S>, tag: Tag) -> Self {
        Self {
            session,
            tag,
            done: false,
        }
    }

    /// Yields the next `(seq, attributes)` pair, or `None` once the
    /// tagged completion has arrived.
    ///
    /// Untagged responses other than FETCH that arrive inside the window
    /// (EXPUNGE, EXISTS, VANISHED) update session state and are passed to
    /// the push handler.
    pub async fn next(&mut self) -> Option<Result<(u32, Vec<FetchAttr>)>> {
        if self.done {
            return None;
        }

        loop {
            let frame = match self.session.next_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    self.done = true;
                    self.session.clear_pending_fetch();
                    return Some(Err(e));
                }
            };

            match frame {
                Frame::Untagged(UntaggedResponse::Fetch { seq, attrs }) => {
                    return Some(Ok((seq, attrs)));
                }
                Frame::Untagged(resp) => {
                    self.session.absorb_untagged(&resp);
                    self.session.notify(&resp);
                }
                Frame::Continuation { .. } => {
                    self.done = true;
                    self.session.mark_broken();
                    self.session.clear_pending_fetch();
                    return Some(Err(Error::UnexpectedContinuation));
                }
                Frame::Tagged {
                    tag,
                    status,
                    code,
                    text,
                } => {
                    self.done = true;
                    self.session.clear_pending_fetch();
                    if tag.as_str() != self.tag.as_str() {
                        self.session.mark_broken();
                        return Some(Err(Error::Protocol(format!(
                            "completion for unexpected tag {tag}"
                        ))));
                    }
                    return match status {
                        Status::Ok => None,
                        Status::No => Some(Err(Error::No { code, text })),
                        Status::Bad => {
                            self.session.mark_broken();
                            Some(Err(Error::Bad { code, text }))
                        }
                    };
                }
            }
        }
    }

    /// Collects every remaining item. Convenience for small fetches.
    pub async fn collect(mut self) -> Result<Vec<(u32, Vec<FetchAttr>)>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// True once the tagged completion has been consumed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.done
    }
}
