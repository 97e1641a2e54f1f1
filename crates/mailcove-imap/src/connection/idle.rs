//! IDLE support (RFC 2177).
//!
//! [`Session::idle`](super::session::Session::idle) sends `IDLE`, waits
//! for the server's continuation, and hands back an [`IdleHandle`]. The
//! handle streams untagged responses until the caller sends `DONE` (or a
//! timeout elapses); a `BYE` during IDLE breaks the connection.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use crate::command::{Command, LiteralMode};
use crate::parser::{Frame, UntaggedResponse};
use crate::types::{Status, Tag};
use crate::{Error, Result};

use super::session::Session;

/// An event observed while idling.
#[derive(Debug, Clone, PartialEq)]
pub enum IdleEvent {
    /// An untagged response arrived (already applied to session state and
    /// delivered to the push handler).
    Response(UntaggedResponse),
    /// No event arrived within the wait duration.
    Timeout,
}

/// Handle over an active IDLE.
///
/// Call [`IdleHandle::wait`] to receive events and [`IdleHandle::done`]
/// to leave IDLE and resume issuing commands.
pub struct IdleHandle<'a, S> {
    session: &'a mut Session<S>,
    tag: Tag,
}

impl<'a, S> IdleHandle<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(super) fn new(session: &'a mut Session<S>, tag: Tag) -> Self {
        Self { session, tag }
    }

    /// Waits up to `duration` for the next server event.
    ///
    /// Servers drop idle connections after a while; RFC 2177 suggests
    /// re-issuing IDLE at least every 29 minutes.
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        match timeout(duration, self.session.next_frame()).await {
            Err(_) => Ok(IdleEvent::Timeout),
            Ok(frame) => match frame? {
                Frame::Untagged(resp) => {
                    self.session.absorb_untagged(&resp);
                    self.session.notify(&resp);
                    if let UntaggedResponse::Bye { code, text } = resp {
                        self.session.mark_broken();
                        return Err(Error::Bye { code, text });
                    }
                    Ok(IdleEvent::Response(resp))
                }
                Frame::Continuation { .. } => {
                    self.session.mark_broken();
                    Err(Error::UnexpectedContinuation)
                }
                Frame::Tagged { status, code, text, .. } => {
                    // The server ended IDLE on its own; treat anything but
                    // OK as a failure of the IDLE command itself.
                    match status {
                        Status::Ok => Ok(IdleEvent::Timeout),
                        Status::No => Err(Error::No { code, text }),
                        Status::Bad => {
                            self.session.mark_broken();
                            Err(Error::Bad { code, text })
                        }
                    }
                }
            },
        }
    }

    /// Sends `DONE` and consumes responses up to the tagged completion.
    pub async fn done(self) -> Result<()> {
        let encoded = Command::Done.encode("", LiteralMode::Synchronizing);
        self.session.write_raw(&encoded.chunks[0]).await?;

        loop {
            match self.session.next_frame().await? {
                Frame::Untagged(resp) => {
                    self.session.absorb_untagged(&resp);
                    self.session.notify(&resp);
                }
                Frame::Continuation { .. } => {
                    self.session.mark_broken();
                    return Err(Error::UnexpectedContinuation);
                }
                Frame::Tagged {
                    tag,
                    status,
                    code,
                    text,
                } => {
                    if tag.as_str() != self.tag.as_str() {
                        self.session.mark_broken();
                        return Err(Error::Protocol(format!(
                            "completion for unexpected tag {tag}"
                        )));
                    }
                    return match status {
                        Status::Ok => Ok(()),
                        Status::No => Err(Error::No { code, text }),
                        Status::Bad => {
                            self.session.mark_broken();
                            Err(Error::Bad { code, text })
                        }
                    };
                }
            }
        }
    }
}
