//! Typed response data.

use crate::types::{
    ExtendedSearch, Flags, ListEntry, Mailbox, Namespaces, ResponseCode, StatusItem, Status,
    UidSet,
};

/// An email address from an envelope.
///
/// Every component is optional; `NIL` on the wire decodes to `None`, an
/// empty quoted string to `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete at-domain-list).
    pub adl: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain part.
    pub host: Option<String>,
}

impl Address {
    /// Returns `local@domain` when both parts are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// A message envelope.
///
/// `NIL` address lists decode to empty vectors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Common fields of a non-multipart body part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyFields {
    /// Body parameters in wire order (e.g. `charset`).
    pub params: Vec<(String, String)>,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding.
    pub encoding: String,
    /// Body size in octets.
    pub octets: u32,
}

/// A parsed MIME body structure.
///
/// Extension data (`body-ext-1part` / `body-ext-mpart`) is parsed so that
/// valid responses never fail, but only multipart parameters are retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// A single part that is neither text nor a nested message.
    Basic {
        /// MIME type, e.g. `application`.
        media_type: String,
        /// MIME subtype, e.g. `pdf`.
        subtype: String,
        /// Common part fields.
        fields: BodyFields,
    },
    /// A `text/*` part.
    Text {
        /// Text subtype, e.g. `plain`.
        subtype: String,
        /// Common part fields.
        fields: BodyFields,
        /// Size in lines.
        lines: u32,
    },
    /// A `message/rfc822` part with its nested envelope and structure.
    Message {
        /// Common part fields.
        fields: BodyFields,
        /// Envelope of the nested message.
        envelope: Box<Envelope>,
        /// Body structure of the nested message.
        body: Box<BodyStructure>,
        /// Size in lines.
        lines: u32,
    },
    /// A multipart container.
    Multipart {
        /// Child parts in order.
        children: Vec<BodyStructure>,
        /// Multipart subtype, e.g. `alternative`.
        subtype: String,
        /// Multipart parameters (from extension data), in wire order.
        params: Vec<(String, String)>,
    },
}

/// The text portion of a BODY section specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionText {
    /// `HEADER`
    Header,
    /// `HEADER.FIELDS (names…)`
    HeaderFields(Vec<String>),
    /// `HEADER.FIELDS.NOT (names…)`
    HeaderFieldsNot(Vec<String>),
    /// `TEXT`
    Text,
    /// `MIME` (only valid after a part path).
    Mime,
}

/// A BODY section specifier: a part path plus an optional text portion.
///
/// `BODY[]` is the empty path with no text portion; `BODY[1.2.TEXT]` is
/// path `[1, 2]` with [`SectionText::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionSpec {
    /// 1-based part path addressing nested parts.
    pub part: Vec<u32>,
    /// Text portion, if any.
    pub text: Option<SectionText>,
}

impl std::fmt::Display for SectionText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => write!(f, "HEADER"),
            Self::HeaderFields(names) => {
                write!(f, "HEADER.FIELDS ({})", names.join(" "))
            }
            Self::HeaderFieldsNot(names) => {
                write!(f, "HEADER.FIELDS.NOT ({})", names.join(" "))
            }
            Self::Text => write!(f, "TEXT"),
            Self::Mime => write!(f, "MIME"),
        }
    }
}

impl SectionSpec {
    /// The empty section, addressing the whole message.
    #[must_use]
    pub fn entire() -> Self {
        Self::default()
    }

    /// A section addressing a nested part by its 1-based path.
    #[must_use]
    pub fn part(path: impl Into<Vec<u32>>) -> Self {
        Self {
            part: path.into(),
            text: None,
        }
    }

    /// Attaches a text portion to this section.
    #[must_use]
    pub fn with_text(mut self, text: SectionText) -> Self {
        self.text = Some(text);
        self
    }
}

impl std::fmt::Display for SectionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, n) in self.part.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{n}")?;
        }
        if let Some(text) = &self.text {
            if !self.part.is_empty() {
                write!(f, ".")?;
            }
            write!(f, "{text}")?;
        }
        Ok(())
    }
}

/// One attribute within a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttr {
    /// Message flags.
    Flags(Flags),
    /// Envelope structure.
    Envelope(Box<Envelope>),
    /// Internal date, verbatim.
    InternalDate(String),
    /// Entire message (`RFC822`); `None` when the server returned `NIL`.
    Rfc822(Option<Vec<u8>>),
    /// Message header (`RFC822.HEADER`).
    Rfc822Header(Option<Vec<u8>>),
    /// Message text (`RFC822.TEXT`).
    Rfc822Text(Option<Vec<u8>>),
    /// Message size in octets.
    Rfc822Size(u32),
    /// Body structure with extension data (`BODYSTRUCTURE`).
    BodyStructure(Box<BodyStructure>),
    /// Body structure without extension data (`BODY` with no section).
    Body(Box<BodyStructure>),
    /// `BODY[section]<origin>` content; `data` is `None` for `NIL`.
    BodySection {
        /// The requested section.
        section: SectionSpec,
        /// Origin octet of a partial fetch, if any.
        origin: Option<u32>,
        /// Section payload.
        data: Option<Vec<u8>>,
    },
    /// Message UID.
    Uid(u32),
    /// Modification sequence (CONDSTORE).
    ModSeq(u64),
    /// GMail message id.
    GmMsgId(u64),
    /// GMail thread id.
    GmThrId(u64),
    /// GMail labels.
    GmLabels(Vec<String>),
}

/// An untagged server response.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// `* OK/NO/BAD [code] text` condition.
    State {
        /// Condition severity.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text, verbatim.
        text: String,
    },
    /// `* BYE [code] text` — the server is closing the connection.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH [code] text` greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY …`
    Capability(Vec<crate::types::Capability>),
    /// `* ENABLED …` (RFC 5161).
    Enabled(Vec<crate::types::Capability>),
    /// `* FLAGS (…)`
    Flags(Flags),
    /// `* LIST (…) delim name`
    List(ListEntry),
    /// `* LSUB (…) delim name`
    Lsub(ListEntry),
    /// `* SEARCH id… [(MODSEQ n)]`
    Search {
        /// Matching ids in server order.
        ids: Vec<u32>,
        /// CONDSTORE trailer, if present.
        modseq: Option<u64>,
    },
    /// `* ESEARCH …` (RFC 4731).
    ExtendedSearch(ExtendedSearch),
    /// `* STATUS name (…)`
    Status {
        /// Mailbox the status refers to.
        mailbox: Mailbox,
        /// Attribute/value pairs in wire order.
        items: Vec<StatusItem>,
    },
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(u32),
    /// `* n FETCH (…)`
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// Fetched attributes in wire order.
        attrs: Vec<FetchAttr>,
    },
    /// `* VANISHED [(EARLIER)] uid-set` (QRESYNC).
    Vanished {
        /// True when the `(EARLIER)` qualifier was present.
        earlier: bool,
        /// UIDs that no longer exist.
        uids: UidSet,
    },
    /// `* NAMESPACE …` (RFC 2342).
    Namespace(Namespaces),
    /// `* ID (…)` (RFC 2971); `None` for `ID NIL`.
    Id(Option<Vec<(String, Option<String>)>>),
}
