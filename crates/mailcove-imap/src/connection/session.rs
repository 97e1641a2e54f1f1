//! The connection engine: tagged command multiplexing over one duplex
//! stream, untagged routing, and session state tracking.
//!
//! One tagged command is in flight at a time. Untagged responses received
//! between a command's dispatch and its completion belong to that command;
//! everything else goes to the [`ServerEventHandler`] supplied at connect
//! time. Fatal errors (I/O, parse, `BAD`, unexpected continuation) move the
//! session to the terminal `Broken` state.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::command::{
    Command, Encoded, FetchItems, LiteralMode, SearchCriteria, SelectParams, StatusAttribute,
    StoreMode, TagSequence,
};
use crate::handler::ServerEventHandler;
use crate::parser::{Frame, ResponseParser, UntaggedResponse};
use crate::sasl::Mechanism;
use crate::types::{
    Capability, Flag, Flags, ListEntry, Mailbox, MailboxAccess, Namespaces, ResponseCode,
    SearchResult, SelectedMailbox, Status, StatusItem, Tag, UidSet,
};
use crate::{Error, Result};

use super::fetch_stream::FetchStream;
use super::framed::FramedStream;
use super::idle::IdleHandle;
use super::stream::ImapStream;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the server greeting.
    Greeting,
    /// Greeting received; no credentials presented yet.
    NotAuthenticated,
    /// Logged in; no mailbox selected.
    Authenticated,
    /// A mailbox is selected.
    Selected,
    /// The server announced shutdown; awaiting the final tagged reply.
    Logout,
    /// Cleanly closed.
    Closed,
    /// A fatal error occurred; the connection is unusable.
    Broken,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Greeting => "Greeting",
            Self::NotAuthenticated => "NotAuthenticated",
            Self::Authenticated => "Authenticated",
            Self::Selected => "Selected",
            Self::Logout => "Logout",
            Self::Closed => "Closed",
            Self::Broken => "Broken",
        };
        write!(f, "{name}")
    }
}

/// What a completed command produced.
#[derive(Debug)]
pub struct CommandOutcome {
    /// Untagged responses received within the command window, in order.
    pub untagged: Vec<UntaggedResponse>,
    /// Response code on the tagged OK, if any.
    pub code: Option<ResponseCode>,
    /// Human-readable completion text.
    pub text: String,
}

/// Result of APPEND, with UIDPLUS data when the server provides it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendResult {
    /// `(uidvalidity, uid)` from the APPENDUID response code.
    pub appenduid: Option<(u32, u32)>,
}

/// Result of COPY/UID COPY, with UIDPLUS data when provided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyResult {
    /// `(uidvalidity, source set, destination set)` from COPYUID.
    pub copyuid: Option<(u32, UidSet, UidSet)>,
}

/// Result of EXPUNGE/UID EXPUNGE.
///
/// A server with QRESYNC enabled reports removals as `* VANISHED` UID
/// sets instead of `* n EXPUNGE` lines; both forms are surfaced here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpungeResult {
    /// Sequence numbers from classic EXPUNGE responses, in server order.
    pub seqs: Vec<u32>,
    /// UIDs from VANISHED responses (QRESYNC).
    pub vanished: Option<UidSet>,
}

/// Result of STORE/UID STORE.
#[derive(Debug, Clone, Default)]
pub struct StoreResult {
    /// FETCH echoes for the updated messages, in server order.
    pub updates: Vec<(u32, Vec<crate::parser::FetchAttr>)>,
    /// Messages that failed an UNCHANGEDSINCE condition (MODIFIED code).
    pub modified: Option<UidSet>,
}

/// An IMAP session over one duplex stream.
///
/// Created by [`Session::connect`], which reads the greeting. The session
/// owns the stream; dropping the session closes it.
pub struct Session<S> {
    framed: FramedStream<S>,
    tags: TagSequence,
    state: SessionState,
    capabilities: Vec<Capability>,
    enabled: Vec<Capability>,
    selected: Option<SelectedMailbox>,
    handler: Box<dyn ServerEventHandler>,
    pending_fetch: Option<Tag>,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tags", &self.tags)
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .field("enabled", &self.enabled)
            .field("selected", &self.selected)
            .field("pending_fetch", &self.pending_fetch)
            .finish_non_exhaustive()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting and builds a session.
    ///
    /// An `OK` greeting leaves the session `NotAuthenticated`; `PREAUTH`
    /// skips straight to `Authenticated`; `BYE` fails the connect.
    pub async fn connect(stream: S, handler: Box<dyn ServerEventHandler>) -> Result<Self> {
        let mut session = Self {
            framed: FramedStream::new(stream),
            tags: TagSequence::default(),
            state: SessionState::Greeting,
            capabilities: Vec::new(),
            enabled: Vec::new(),
            selected: None,
            handler,
            pending_fetch: None,
        };

        match session.next_frame().await? {
            Frame::Untagged(UntaggedResponse::State {
                status: Status::Ok,
                code,
                ..
            }) => {
                if let Some(code) = code {
                    session.absorb_code(&code);
                }
                session.state = SessionState::NotAuthenticated;
            }
            Frame::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
                if let Some(code) = code {
                    session.absorb_code(&code);
                }
                session.state = SessionState::Authenticated;
            }
            Frame::Untagged(UntaggedResponse::Bye { code, text }) => {
                session.state = SessionState::Broken;
                return Err(Error::Bye { code, text });
            }
            _ => {
                session.state = SessionState::Broken;
                return Err(Error::Protocol("unexpected greeting".to_string()));
            }
        }

        Ok(session)
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Latest advertised capability set.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Capabilities accepted by ENABLE.
    #[must_use]
    pub fn enabled(&self) -> &[Capability] {
        &self.enabled
    }

    /// True if the server advertised the capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// True if the server advertises `IMAP4rev1` (RFC 3501).
    #[must_use]
    pub fn supports_imap4rev1(&self) -> bool {
        self.has_capability(&Capability::Imap4Rev1)
    }

    /// True if the server supports IDLE (RFC 2177).
    #[must_use]
    pub fn supports_idle(&self) -> bool {
        self.has_capability(&Capability::Idle)
    }

    /// True if the server supports NAMESPACE (RFC 2342).
    #[must_use]
    pub fn supports_namespace(&self) -> bool {
        self.has_capability(&Capability::Namespace)
    }

    /// True if the server supports ID (RFC 2971).
    #[must_use]
    pub fn supports_id(&self) -> bool {
        self.has_capability(&Capability::Id)
    }

    /// True if the server supports CONDSTORE (RFC 7162).
    #[must_use]
    pub fn supports_condstore(&self) -> bool {
        self.has_capability(&Capability::CondStore)
    }

    /// True if the server supports QRESYNC (RFC 7162).
    #[must_use]
    pub fn supports_qresync(&self) -> bool {
        self.has_capability(&Capability::QResync)
    }

    /// True if the server supports UIDPLUS (RFC 4315).
    #[must_use]
    pub fn supports_uidplus(&self) -> bool {
        self.has_capability(&Capability::UidPlus)
    }

    /// True if the server supports ESEARCH (RFC 4731).
    #[must_use]
    pub fn supports_esearch(&self) -> bool {
        self.has_capability(&Capability::Esearch)
    }

    /// True if the server supports `COMPRESS=DEFLATE` (RFC 4978).
    #[must_use]
    pub fn supports_compress_deflate(&self) -> bool {
        self.has_capability(&Capability::CompressDeflate)
    }

    /// True if LOGIN is disabled (e.g. before STARTTLS).
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has_capability(&Capability::LoginDisabled)
    }

    /// True if the server supports the given SASL mechanism.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| matches!(c, Capability::Auth(m) if m.eq_ignore_ascii_case(mechanism)))
    }

    /// True if the server supports `AUTH=PLAIN`.
    #[must_use]
    pub fn supports_auth_plain(&self) -> bool {
        self.supports_auth("PLAIN")
    }

    /// Snapshot of the selected mailbox, if one is selected.
    #[must_use]
    pub fn selected(&self) -> Option<&SelectedMailbox> {
        self.selected.as_ref()
    }

    /// True once COMPRESS=DEFLATE is active.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.framed.is_compressed()
    }

    // ----- wire plumbing -------------------------------------------------

    pub(super) async fn next_frame(&mut self) -> Result<Frame> {
        let bytes = match self.framed.read_frame().await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.state = SessionState::Broken;
                return Err(e);
            }
        };
        match ResponseParser::parse(&bytes) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.state = SessionState::Broken;
                Err(e)
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if let Err(e) = self.framed.write_all(data).await {
            self.state = SessionState::Broken;
            return Err(e);
        }
        Ok(())
    }

    pub(super) async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.write(data).await
    }

    fn literal_mode(&self) -> LiteralMode {
        if self.has_capability(&Capability::LiteralPlus) {
            LiteralMode::NonSynchronizing
        } else if self.has_capability(&Capability::LiteralMinus) {
            LiteralMode::NonSyncBounded
        } else {
            LiteralMode::Synchronizing
        }
    }

    pub(super) fn mark_broken(&mut self) {
        self.state = SessionState::Broken;
    }

    pub(super) fn clear_pending_fetch(&mut self) {
        self.pending_fetch = None;
    }

    /// Finishes reading a FETCH whose stream was dropped early, discarding
    /// the remaining items, so the connection stays usable.
    async fn drain_pending(&mut self) -> Result<()> {
        let Some(tag) = self.pending_fetch.clone() else {
            return Ok(());
        };

        tracing::debug!(tag = %tag, "draining abandoned fetch responses");
        loop {
            match self.next_frame().await? {
                // The drained window still belongs to the abandoned
                // command: update state, deliver nothing.
                Frame::Untagged(resp) => self.absorb_untagged(&resp),
                Frame::Continuation { .. } => {
                    self.state = SessionState::Broken;
                    return Err(Error::UnexpectedContinuation);
                }
                Frame::Tagged {
                    tag: t,
                    status,
                    code,
                    text,
                } => {
                    if t.as_str() != tag.as_str() {
                        self.state = SessionState::Broken;
                        return Err(Error::Protocol(format!(
                            "completion for unexpected tag {t}"
                        )));
                    }
                    self.pending_fetch = None;
                    return match status {
                        // A NO here failed the abandoned command, not the
                        // one about to run.
                        Status::Ok | Status::No => Ok(()),
                        Status::Bad => {
                            self.state = SessionState::Broken;
                            Err(Error::Bad { code, text })
                        }
                    };
                }
            }
        }
    }

    fn ensure_live(&self) -> Result<()> {
        match self.state {
            SessionState::Broken | SessionState::Closed | SessionState::Logout => {
                Err(Error::State {
                    expected: "a live connection",
                    actual: self.state,
                })
            }
            _ => Ok(()),
        }
    }

    fn require_not_authenticated(&self) -> Result<()> {
        match self.state {
            SessionState::NotAuthenticated => Ok(()),
            actual => Err(Error::State {
                expected: "NotAuthenticated",
                actual,
            }),
        }
    }

    fn require_authenticated(&self) -> Result<()> {
        match self.state {
            SessionState::Authenticated | SessionState::Selected => Ok(()),
            actual => Err(Error::State {
                expected: "Authenticated",
                actual,
            }),
        }
    }

    fn require_selected(&self) -> Result<()> {
        match self.state {
            SessionState::Selected => Ok(()),
            actual => Err(Error::State {
                expected: "Selected",
                actual,
            }),
        }
    }

    /// Sends a command and reads to its tagged completion.
    ///
    /// Chunks after the first each wait for a continuation request; a
    /// continuation with no chunk left to send is fatal.
    async fn run_command(&mut self, command: &Command) -> Result<CommandOutcome> {
        self.ensure_live()?;
        self.drain_pending().await?;

        let tag = self.tags.next();
        let encoded = command.encode(tag.as_str(), self.literal_mode());
        self.exchange(&tag, &encoded).await
    }

    async fn exchange(&mut self, tag: &Tag, encoded: &Encoded) -> Result<CommandOutcome> {
        self.write(&encoded.chunks[0]).await?;
        let mut remaining = encoded.chunks[1..].iter();
        let mut untagged = Vec::new();

        loop {
            match self.next_frame().await? {
                Frame::Continuation { .. } => match remaining.next() {
                    Some(chunk) => self.write(chunk).await?,
                    None => {
                        self.state = SessionState::Broken;
                        return Err(Error::UnexpectedContinuation);
                    }
                },
                Frame::Untagged(resp) => {
                    self.absorb_untagged(&resp);
                    untagged.push(resp);
                }
                Frame::Tagged {
                    tag: t,
                    status,
                    code,
                    text,
                } => {
                    if t.as_str() != tag.as_str() {
                        self.state = SessionState::Broken;
                        return Err(Error::Protocol(format!(
                            "completion for unexpected tag {t}"
                        )));
                    }
                    if let Some(code) = &code {
                        self.absorb_code(code);
                        if matches!(code, ResponseCode::Alert) {
                            self.handler.on_alert(&text);
                        }
                    }
                    return match status {
                        Status::Ok => Ok(CommandOutcome {
                            untagged,
                            code,
                            text,
                        }),
                        Status::No => Err(Error::No { code, text }),
                        Status::Bad => {
                            self.state = SessionState::Broken;
                            Err(Error::Bad { code, text })
                        }
                    };
                }
            }
        }
    }

    // ----- untagged bookkeeping ------------------------------------------

    pub(super) fn absorb_untagged(&mut self, resp: &UntaggedResponse) {
        match resp {
            UntaggedResponse::Capability(caps) => {
                self.capabilities = caps.clone();
            }
            UntaggedResponse::Enabled(caps) => {
                for cap in caps {
                    if !self.enabled.contains(cap) {
                        self.enabled.push(cap.clone());
                    }
                }
            }
            UntaggedResponse::Exists(n) => {
                if let Some(selected) = &mut self.selected {
                    selected.exists = *n;
                }
            }
            UntaggedResponse::Recent(n) => {
                if let Some(selected) = &mut self.selected {
                    selected.recent = *n;
                }
            }
            UntaggedResponse::Expunge(_) => {
                if let Some(selected) = &mut self.selected {
                    selected.exists = selected.exists.saturating_sub(1);
                }
            }
            UntaggedResponse::Vanished { earlier, uids } => {
                // VANISHED (EARLIER) reports messages that were already
                // absent from this session's view; only current removals
                // shrink the count.
                if !*earlier
                    && let Some(selected) = &mut self.selected
                {
                    let removed = u32::try_from(uids.iter().count()).unwrap_or(u32::MAX);
                    selected.exists = selected.exists.saturating_sub(removed);
                }
            }
            UntaggedResponse::Flags(flags) => {
                if let Some(selected) = &mut self.selected {
                    selected.flags = flags.clone();
                }
            }
            UntaggedResponse::State { code, text, .. } => {
                if let Some(code) = code {
                    self.absorb_code(code);
                    if matches!(code, ResponseCode::Alert) {
                        self.handler.on_alert(text);
                    }
                }
            }
            UntaggedResponse::Bye { text, .. } => {
                self.handler.on_bye(text);
                if self.state != SessionState::Broken {
                    self.state = SessionState::Logout;
                }
            }
            _ => {}
        }
    }

    fn absorb_code(&mut self, code: &ResponseCode) {
        match code {
            ResponseCode::Capability(caps) => {
                self.capabilities = caps.clone();
            }
            ResponseCode::UidNext(n) => {
                if let Some(selected) = &mut self.selected {
                    selected.uidnext = Some(*n);
                }
            }
            ResponseCode::UidValidity(n) => {
                if let Some(selected) = &mut self.selected {
                    selected.uidvalidity = Some(*n);
                }
            }
            ResponseCode::HighestModSeq(n) => {
                if let Some(selected) = &mut self.selected {
                    selected.highestmodseq = Some(*n);
                }
            }
            ResponseCode::NoModSeq => {
                if let Some(selected) = &mut self.selected {
                    selected.highestmodseq = None;
                }
            }
            ResponseCode::Unseen(n) => {
                if let Some(selected) = &mut self.selected {
                    selected.unseen = Some(*n);
                }
            }
            ResponseCode::PermanentFlags(flags) => {
                if let Some(selected) = &mut self.selected {
                    selected.permanent_flags = Flags::from_vec(flags.clone());
                }
            }
            ResponseCode::ReadOnly => {
                if let Some(selected) = &mut self.selected {
                    selected.access = MailboxAccess::ReadOnly;
                }
            }
            ResponseCode::ReadWrite => {
                if let Some(selected) = &mut self.selected {
                    selected.access = MailboxAccess::ReadWrite;
                }
            }
            _ => {}
        }
    }

    /// Delivers a server-push response to the handler.
    pub(super) fn notify(&mut self, resp: &UntaggedResponse) {
        match resp {
            UntaggedResponse::Exists(n) => self.handler.on_exists(*n),
            UntaggedResponse::Expunge(seq) => self.handler.on_expunge(*seq),
            UntaggedResponse::Recent(n) => self.handler.on_recent(*n),
            UntaggedResponse::Fetch { seq, attrs } => self.handler.on_fetch(*seq, attrs),
            UntaggedResponse::Flags(flags) => self.handler.on_flags(flags),
            UntaggedResponse::Vanished { earlier, uids } => {
                self.handler.on_vanished(*earlier, uids);
            }
            _ => {}
        }
        self.handler.on_untagged(resp);
    }

    // ----- any-state operations ------------------------------------------

    /// CAPABILITY: refreshes and returns the capability set.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        self.run_command(&Command::Capability).await?;
        Ok(self.capabilities.clone())
    }

    /// NOOP: a keep-alive that also polls for unsolicited responses.
    pub async fn noop(&mut self) -> Result<()> {
        let outcome = self.run_command(&Command::Noop).await?;
        for resp in &outcome.untagged {
            self.notify(resp);
        }
        Ok(())
    }

    /// LOGOUT: cleanly shuts the session down.
    pub async fn logout(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => return Ok(()),
            SessionState::Broken => {
                return Err(Error::State {
                    expected: "a live connection",
                    actual: self.state,
                });
            }
            _ => {}
        }
        // Logout is legal even after a BYE put us in the Logout state.
        self.drain_pending().await?;
        let tag = self.tags.next();
        let encoded = Command::Logout.encode(tag.as_str(), self.literal_mode());
        self.exchange(&tag, &encoded).await?;
        self.state = SessionState::Closed;
        self.selected = None;
        Ok(())
    }

    // ----- authentication -------------------------------------------------

    /// LOGIN with plaintext credentials.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.require_not_authenticated()?;
        if self.login_disabled() {
            return Err(Error::Protocol("server has disabled LOGIN".to_string()));
        }
        self.run_command(&Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// AUTHENTICATE with one of the supported SASL mechanisms, driving the
    /// continuation exchange to completion.
    pub async fn authenticate(&mut self, mechanism: &Mechanism) -> Result<()> {
        self.require_not_authenticated()?;
        self.drain_pending().await?;

        let sasl_ir = self.has_capability(&Capability::SaslIr);
        let initial = if sasl_ir {
            mechanism.initial_response()
        } else {
            None
        };
        let mut step = usize::from(initial.is_some());

        let tag = self.tags.next();
        let encoded = Command::Authenticate {
            mechanism: mechanism.name().to_string(),
            initial_response: initial,
        }
        .encode(tag.as_str(), self.literal_mode());
        self.write(&encoded.chunks[0]).await?;

        loop {
            match self.next_frame().await? {
                Frame::Continuation { .. } => {
                    let reply = mechanism.continuation_response(step).unwrap_or_default();
                    step += 1;
                    self.write(format!("{reply}\r\n").as_bytes()).await?;
                }
                Frame::Untagged(resp) => {
                    self.absorb_untagged(&resp);
                }
                Frame::Tagged {
                    tag: t,
                    status,
                    code,
                    text,
                } => {
                    if t.as_str() != tag.as_str() {
                        self.state = SessionState::Broken;
                        return Err(Error::Protocol(format!(
                            "completion for unexpected tag {t}"
                        )));
                    }
                    if let Some(code) = &code {
                        self.absorb_code(code);
                    }
                    return match status {
                        Status::Ok => {
                            self.state = SessionState::Authenticated;
                            Ok(())
                        }
                        Status::No => Err(Error::No { code, text }),
                        Status::Bad => {
                            self.state = SessionState::Broken;
                            Err(Error::Bad { code, text })
                        }
                    };
                }
            }
        }
    }

    // ----- authenticated-state operations ---------------------------------

    /// SELECT: opens a mailbox read-write.
    pub async fn select(
        &mut self,
        mailbox: &str,
        params: SelectParams,
    ) -> Result<SelectedMailbox> {
        self.open_mailbox(mailbox, params, false).await
    }

    /// EXAMINE: opens a mailbox read-only.
    pub async fn examine(
        &mut self,
        mailbox: &str,
        params: SelectParams,
    ) -> Result<SelectedMailbox> {
        self.open_mailbox(mailbox, params, true).await
    }

    async fn open_mailbox(
        &mut self,
        mailbox: &str,
        params: SelectParams,
        read_only: bool,
    ) -> Result<SelectedMailbox> {
        self.require_authenticated()?;

        let name = Mailbox::new(mailbox);
        // Fresh record; the untagged data of this very command fills it in.
        self.selected = Some(SelectedMailbox {
            name: Some(name.clone()),
            access: if read_only {
                MailboxAccess::ReadOnly
            } else {
                MailboxAccess::ReadWrite
            },
            ..SelectedMailbox::default()
        });

        let command = if read_only {
            Command::Examine {
                mailbox: name,
                params,
            }
        } else {
            Command::Select {
                mailbox: name,
                params,
            }
        };

        match self.run_command(&command).await {
            Ok(_) => {
                self.state = SessionState::Selected;
                Ok(self.selected.clone().unwrap_or_default())
            }
            Err(e) => {
                // A failed SELECT leaves no mailbox selected.
                self.selected = None;
                if self.state == SessionState::Selected {
                    self.state = SessionState::Authenticated;
                }
                Err(e)
            }
        }
    }

    /// LIST mailboxes matching a pattern.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        self.require_authenticated()?;
        let outcome = self
            .run_command(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(collect_list_entries(outcome))
    }

    /// LSUB: lists subscribed mailboxes.
    pub async fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        self.require_authenticated()?;
        let outcome = self
            .run_command(&Command::Lsub {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(outcome
            .untagged
            .into_iter()
            .filter_map(|resp| match resp {
                UntaggedResponse::Lsub(entry) | UntaggedResponse::List(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// XLIST: GMail's folder listing; replies decode as LIST entries.
    pub async fn xlist(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        self.require_authenticated()?;
        let outcome = self
            .run_command(&Command::XList {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(collect_list_entries(outcome))
    }

    /// STATUS of a mailbox without selecting it.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusAttribute],
    ) -> Result<Vec<StatusItem>> {
        self.require_authenticated()?;
        let outcome = self
            .run_command(&Command::Status {
                mailbox: Mailbox::new(mailbox),
                items: items.to_vec(),
            })
            .await?;
        Ok(outcome
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Status { items, .. } => Some(items),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// CREATE a mailbox.
    pub async fn create(&mut self, mailbox: &str) -> Result<()> {
        self.require_authenticated()?;
        self.run_command(&Command::Create {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// DELETE a mailbox.
    pub async fn delete(&mut self, mailbox: &str) -> Result<()> {
        self.require_authenticated()?;
        self.run_command(&Command::Delete {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// RENAME a mailbox.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        self.require_authenticated()?;
        self.run_command(&Command::Rename {
            from: Mailbox::new(from),
            to: Mailbox::new(to),
        })
        .await?;
        Ok(())
    }

    /// SUBSCRIBE to a mailbox.
    pub async fn subscribe(&mut self, mailbox: &str) -> Result<()> {
        self.require_authenticated()?;
        self.run_command(&Command::Subscribe {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// UNSUBSCRIBE from a mailbox.
    pub async fn unsubscribe(&mut self, mailbox: &str) -> Result<()> {
        self.require_authenticated()?;
        self.run_command(&Command::Unsubscribe {
            mailbox: Mailbox::new(mailbox),
        })
        .await?;
        Ok(())
    }

    /// APPEND a message; the message travels as a literal, pausing for the
    /// server's continuation unless LITERAL+ is in effect.
    pub async fn append(
        &mut self,
        mailbox: &str,
        flags: Option<Vec<Flag>>,
        internal_date: Option<String>,
        message: Vec<u8>,
    ) -> Result<AppendResult> {
        self.require_authenticated()?;
        let outcome = self
            .run_command(&Command::Append {
                mailbox: Mailbox::new(mailbox),
                flags,
                internal_date,
                message,
            })
            .await?;
        let appenduid = match outcome.code {
            Some(ResponseCode::AppendUid(validity, uid)) => Some((validity, uid)),
            _ => None,
        };
        Ok(AppendResult { appenduid })
    }

    /// ENABLE extensions; returns what the server actually enabled.
    pub async fn enable(&mut self, capabilities: &[&str]) -> Result<Vec<Capability>> {
        self.require_authenticated()?;
        let outcome = self
            .run_command(&Command::Enable {
                capabilities: capabilities.iter().map(ToString::to_string).collect(),
            })
            .await?;
        Ok(outcome
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Enabled(caps) => Some(caps),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// ID: exchanges client/server identification.
    pub async fn id(
        &mut self,
        parameters: Option<Vec<(String, String)>>,
    ) -> Result<Option<Vec<(String, Option<String>)>>> {
        let outcome = self.run_command(&Command::Id { parameters }).await?;
        for resp in outcome.untagged {
            if let UntaggedResponse::Id(params) = resp {
                return Ok(params);
            }
        }
        Ok(None)
    }

    /// NAMESPACE: queries the server's namespaces.
    pub async fn namespace(&mut self) -> Result<Namespaces> {
        self.require_authenticated()?;
        let outcome = self.run_command(&Command::Namespace).await?;
        Ok(outcome
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Namespace(ns) => Some(ns),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// COMPRESS DEFLATE: negotiates compression and rewires the framing
    /// layer; everything after the tagged OK travels deflated.
    pub async fn compress(&mut self) -> Result<()> {
        if self.is_compressed() {
            return Err(Error::Protocol("compression already active".to_string()));
        }
        self.run_command(&Command::Compress).await?;
        self.framed.enable_deflate()?;
        tracing::debug!("deflate compression active");
        Ok(())
    }

    // ----- selected-state operations --------------------------------------

    /// CHECK: requests a checkpoint of the selected mailbox.
    pub async fn check(&mut self) -> Result<()> {
        self.require_selected()?;
        self.run_command(&Command::Check).await?;
        Ok(())
    }

    /// CLOSE: expunges (when read-write) and deselects the mailbox.
    pub async fn close(&mut self) -> Result<()> {
        self.require_selected()?;
        self.run_command(&Command::Close).await?;
        self.state = SessionState::Authenticated;
        self.selected = None;
        Ok(())
    }

    /// UNSELECT: deselects without expunging.
    pub async fn unselect(&mut self) -> Result<()> {
        self.require_selected()?;
        self.run_command(&Command::Unselect).await?;
        self.state = SessionState::Authenticated;
        self.selected = None;
        Ok(())
    }

    /// EXPUNGE: removes `\Deleted` messages. Removals arrive as EXPUNGE
    /// sequence numbers or, under QRESYNC, as VANISHED UID sets.
    pub async fn expunge(&mut self) -> Result<ExpungeResult> {
        self.require_selected()?;
        let outcome = self.run_command(&Command::Expunge).await?;
        Ok(collect_expunges(outcome))
    }

    /// UID EXPUNGE (UIDPLUS): expunges only the given UIDs.
    pub async fn uid_expunge(&mut self, uids: UidSet) -> Result<ExpungeResult> {
        self.require_selected()?;
        let outcome = self.run_command(&Command::UidExpunge { uids }).await?;
        Ok(collect_expunges(outcome))
    }

    /// SEARCH: returns matching sequence numbers.
    pub async fn search(&mut self, criteria: SearchCriteria) -> Result<SearchResult> {
        self.do_search(criteria, None, false).await
    }

    /// UID SEARCH: returns matching UIDs.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<SearchResult> {
        self.do_search(criteria, None, true).await
    }

    /// SEARCH with an explicit CHARSET argument.
    pub async fn search_charset(
        &mut self,
        criteria: SearchCriteria,
        charset: &str,
    ) -> Result<SearchResult> {
        self.do_search(criteria, Some(charset.to_string()), false).await
    }

    async fn do_search(
        &mut self,
        criteria: SearchCriteria,
        charset: Option<String>,
        uid: bool,
    ) -> Result<SearchResult> {
        self.require_selected()?;
        let outcome = self
            .run_command(&Command::Search {
                criteria,
                charset,
                uid,
            })
            .await?;

        let mut result = SearchResult::default();
        for resp in outcome.untagged {
            match resp {
                UntaggedResponse::Search { ids, modseq } => {
                    result.ids.extend(ids);
                    if modseq.is_some() {
                        result.modseq = modseq;
                    }
                }
                // Servers that ESEARCH by default still answer plain SEARCH
                // usefully; fold the typed form into the flat result.
                UntaggedResponse::ExtendedSearch(es) => {
                    if let Some(all) = &es.all {
                        result.ids.extend(all.iter());
                    }
                    if es.modseq.is_some() {
                        result.modseq = es.modseq;
                    }
                }
                _ => {}
            }
        }
        Ok(result)
    }

    /// FETCH: streams `(seq, attributes)` pairs in server order.
    ///
    /// The returned stream is lazy, finite, and non-restartable. Dropping
    /// it early leaves the remaining responses to be drained (discarded)
    /// before the next command runs.
    pub async fn fetch(
        &mut self,
        set: UidSet,
        items: FetchItems,
    ) -> Result<FetchStream<'_, S>> {
        self.start_fetch(Command::Fetch {
            set,
            items,
            uid: false,
            changed_since: None,
            vanished: false,
        })
        .await
    }

    /// UID FETCH: like [`Session::fetch`] but addressing UIDs.
    pub async fn uid_fetch(
        &mut self,
        set: UidSet,
        items: FetchItems,
    ) -> Result<FetchStream<'_, S>> {
        self.start_fetch(Command::Fetch {
            set,
            items,
            uid: true,
            changed_since: None,
            vanished: false,
        })
        .await
    }

    /// UID FETCH with `CHANGEDSINCE` (and optionally QRESYNC `VANISHED`).
    pub async fn uid_fetch_changed_since(
        &mut self,
        set: UidSet,
        items: FetchItems,
        modseq: u64,
        vanished: bool,
    ) -> Result<FetchStream<'_, S>> {
        self.start_fetch(Command::Fetch {
            set,
            items,
            uid: true,
            changed_since: Some(modseq),
            vanished,
        })
        .await
    }

    async fn start_fetch(&mut self, command: Command) -> Result<FetchStream<'_, S>> {
        self.require_selected()?;
        self.drain_pending().await?;

        let tag = self.tags.next();
        let encoded = command.encode(tag.as_str(), self.literal_mode());
        self.write(&encoded.chunks[0]).await?;
        self.pending_fetch = Some(tag.clone());

        Ok(FetchStream::new(self, tag))
    }

    /// STORE: changes flags, returning the FETCH echoes.
    pub async fn store(
        &mut self,
        set: UidSet,
        mode: StoreMode,
        flags: Vec<Flag>,
    ) -> Result<StoreResult> {
        self.do_store(set, mode, flags, false, false, None).await
    }

    /// UID STORE.
    pub async fn uid_store(
        &mut self,
        set: UidSet,
        mode: StoreMode,
        flags: Vec<Flag>,
    ) -> Result<StoreResult> {
        self.do_store(set, mode, flags, false, true, None).await
    }

    /// STORE with `.SILENT`: no FETCH echoes.
    pub async fn store_silent(
        &mut self,
        set: UidSet,
        mode: StoreMode,
        flags: Vec<Flag>,
    ) -> Result<StoreResult> {
        self.do_store(set, mode, flags, true, false, None).await
    }

    /// UID STORE with `UNCHANGEDSINCE` (CONDSTORE); failed messages are
    /// reported in [`StoreResult::modified`].
    pub async fn uid_store_unchanged_since(
        &mut self,
        set: UidSet,
        mode: StoreMode,
        flags: Vec<Flag>,
        modseq: u64,
    ) -> Result<StoreResult> {
        self.do_store(set, mode, flags, false, true, Some(modseq)).await
    }

    async fn do_store(
        &mut self,
        set: UidSet,
        mode: StoreMode,
        flags: Vec<Flag>,
        silent: bool,
        uid: bool,
        unchanged_since: Option<u64>,
    ) -> Result<StoreResult> {
        self.require_selected()?;
        let outcome = self
            .run_command(&Command::Store {
                set,
                mode,
                flags,
                silent,
                uid,
                unchanged_since,
            })
            .await?;

        let modified = match &outcome.code {
            Some(ResponseCode::Modified(set)) => Some(set.clone()),
            _ => None,
        };
        let updates = outcome
            .untagged
            .into_iter()
            .filter_map(|resp| match resp {
                UntaggedResponse::Fetch { seq, attrs } => Some((seq, attrs)),
                _ => None,
            })
            .collect();
        Ok(StoreResult { updates, modified })
    }

    /// COPY messages to another mailbox.
    pub async fn copy(&mut self, set: UidSet, mailbox: &str) -> Result<CopyResult> {
        self.do_copy(set, mailbox, false).await
    }

    /// UID COPY messages to another mailbox.
    pub async fn uid_copy(&mut self, set: UidSet, mailbox: &str) -> Result<CopyResult> {
        self.do_copy(set, mailbox, true).await
    }

    async fn do_copy(&mut self, set: UidSet, mailbox: &str, uid: bool) -> Result<CopyResult> {
        self.require_selected()?;
        let outcome = self
            .run_command(&Command::Copy {
                set,
                mailbox: Mailbox::new(mailbox),
                uid,
            })
            .await?;
        let copyuid = match outcome.code {
            Some(ResponseCode::CopyUid(validity, src, dst)) => Some((validity, src, dst)),
            _ => None,
        };
        Ok(CopyResult { copyuid })
    }

    /// IDLE: enters the server-push loop. Events stream through the
    /// returned handle until [`IdleHandle::done`] sends `DONE`.
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, S>> {
        self.require_selected()?;
        self.drain_pending().await?;

        let tag = self.tags.next();
        let encoded = Command::Idle.encode(tag.as_str(), self.literal_mode());
        self.write(&encoded.chunks[0]).await?;

        // The server acknowledges IDLE with a continuation before any
        // events flow; untagged responses may still arrive first.
        loop {
            match self.next_frame().await? {
                Frame::Continuation { .. } => break,
                Frame::Untagged(resp) => {
                    self.absorb_untagged(&resp);
                    self.notify(&resp);
                }
                Frame::Tagged {
                    tag: t,
                    status,
                    code,
                    text,
                } => {
                    if t.as_str() != tag.as_str() {
                        self.state = SessionState::Broken;
                        return Err(Error::Protocol(format!(
                            "completion for unexpected tag {t}"
                        )));
                    }
                    return match status {
                        Status::No => Err(Error::No { code, text }),
                        Status::Bad | Status::Ok => {
                            self.state = SessionState::Broken;
                            Err(Error::Protocol("IDLE refused without continuation".to_string()))
                        }
                    };
                }
            }
        }

        Ok(IdleHandle::new(self, tag))
    }
}

impl Session<ImapStream> {
    /// STARTTLS: negotiates the upgrade, then rebuilds the framing layer
    /// over the TLS stream.
    ///
    /// Valid only before authentication and before COMPRESS. Consumes the
    /// session because the transport changes underneath; session state
    /// carries over, but the pre-TLS capability set is discarded — it was
    /// advertised in cleartext and must be re-queried on the encrypted
    /// link. A failed negotiation tears the session down.
    pub async fn starttls(
        mut self,
        host: &str,
        config: Arc<rustls::ClientConfig>,
    ) -> Result<Self> {
        self.require_not_authenticated()?;
        if self.framed.is_compressed() {
            return Err(Error::Protocol(
                "STARTTLS is not possible after COMPRESS".to_string(),
            ));
        }
        self.run_command(&Command::StartTls).await?;

        let Self {
            framed,
            tags,
            state,
            enabled,
            selected,
            handler,
            pending_fetch,
            ..
        } = self;
        let stream = framed.into_inner()?;
        let stream = stream.upgrade_to_tls(host, config).await?;

        Ok(Self {
            framed: FramedStream::new(stream),
            tags,
            state,
            capabilities: Vec::new(),
            enabled,
            selected,
            handler,
            pending_fetch,
        })
    }
}

fn collect_list_entries(outcome: CommandOutcome) -> Vec<ListEntry> {
    outcome
        .untagged
        .into_iter()
        .filter_map(|resp| match resp {
            UntaggedResponse::List(entry) => Some(entry),
            _ => None,
        })
        .collect()
}

fn collect_expunges(outcome: CommandOutcome) -> ExpungeResult {
    let mut result = ExpungeResult::default();
    for resp in outcome.untagged {
        match resp {
            UntaggedResponse::Expunge(seq) => result.seqs.push(seq),
            UntaggedResponse::Vanished { uids, .. } => {
                let merged = result.vanished.get_or_insert_with(UidSet::new);
                for range in uids.ranges() {
                    merged.push(*range);
                }
            }
            _ => {}
        }
    }
    result
}
