//! Request-side type definitions.

use crate::parser::SectionSpec;
use crate::types::UidSet;

/// STATUS attributes to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    /// Number of messages.
    Messages,
    /// Number of recent messages.
    Recent,
    /// Predicted next UID.
    UidNext,
    /// UIDVALIDITY value.
    UidValidity,
    /// Number of unseen messages.
    Unseen,
    /// Highest mod-sequence (CONDSTORE).
    HighestModSeq,
}

impl StatusAttribute {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
            Self::HighestModSeq => "HIGHESTMODSEQ",
        }
    }
}

/// What a FETCH should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// The `ALL` macro: FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// The `FAST` macro: FLAGS INTERNALDATE RFC822.SIZE.
    Fast,
    /// The `FULL` macro: FAST plus ENVELOPE and BODY.
    Full,
    /// An explicit attribute list.
    Attrs(Vec<FetchRequest>),
}

/// A single requestable FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// Message size.
    Rfc822Size,
    /// Entire message.
    Rfc822,
    /// Message header.
    Rfc822Header,
    /// Message text.
    Rfc822Text,
    /// Envelope structure.
    Envelope,
    /// Body structure without extension data.
    Body,
    /// Body structure with extension data.
    BodyStructure,
    /// Message UID.
    Uid,
    /// Modification sequence (CONDSTORE).
    ModSeq,
    /// GMail message id.
    GmMsgId,
    /// GMail thread id.
    GmThrId,
    /// GMail labels.
    GmLabels,
    /// `BODY[section]<partial>` or `BODY.PEEK[section]<partial>`.
    Section {
        /// The section to fetch.
        section: SectionSpec,
        /// True to leave `\Seen` untouched.
        peek: bool,
        /// Partial fetch as `(origin, length)`.
        partial: Option<(u32, u32)>,
    },
}

/// How STORE changes the flag set. The encoder emits exactly one of
/// `FLAGS`, `+FLAGS`, or `-FLAGS` (with `.SILENT` when requested).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Replace the flags.
    Replace,
    /// Add to the flags.
    Add,
    /// Remove from the flags.
    Remove,
}

impl StoreMode {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "FLAGS",
            Self::Add => "+FLAGS",
            Self::Remove => "-FLAGS",
        }
    }
}

/// Parameters for SELECT/EXAMINE beyond the mailbox name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectParams {
    /// Request CONDSTORE tracking (`(CONDSTORE)`).
    pub condstore: bool,
    /// Request QRESYNC resynchronization with previously saved state.
    pub qresync: Option<QresyncParams>,
}

impl SelectParams {
    /// Plain SELECT/EXAMINE with no parameters.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// SELECT with `(CONDSTORE)`.
    #[must_use]
    pub fn condstore() -> Self {
        Self {
            condstore: true,
            qresync: None,
        }
    }

    /// SELECT with `(QRESYNC (...))` from saved state.
    #[must_use]
    pub fn qresync(params: QresyncParams) -> Self {
        Self {
            condstore: false,
            qresync: Some(params),
        }
    }
}

/// Saved state for a QRESYNC SELECT (RFC 7162).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QresyncParams {
    /// Last known UIDVALIDITY.
    pub uidvalidity: u32,
    /// Last known HIGHESTMODSEQ.
    pub modseq: u64,
    /// Known UIDs, to scope VANISHED reporting.
    pub known_uids: Option<UidSet>,
}
