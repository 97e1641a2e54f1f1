//! Mailbox names, listing attributes, and selected-mailbox state.

use super::{Flags, UidSet};

/// A mailbox name.
///
/// Names equal to `INBOX` under ASCII case-folding canonicalize to the
/// literal `"INBOX"`; every other name keeps its case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Creates a mailbox name, canonicalizing `INBOX` spellings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("INBOX") {
            Self("INBOX".to_string())
        } else {
            Self(name)
        }
    }

    /// The INBOX mailbox.
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Mailbox {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Mailbox name attribute from LIST/LSUB/XLIST responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxFlag {
    /// Mailbox cannot be selected.
    Noselect,
    /// Mailbox is marked as interesting.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    /// Mailbox cannot have children.
    Noinferiors,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox has no children.
    HasNoChildren,
    /// All messages (special-use, RFC 6154).
    All,
    /// Archive folder.
    Archive,
    /// Drafts folder.
    Drafts,
    /// Flagged/starred messages.
    Flagged,
    /// Junk/spam folder.
    Junk,
    /// Sent folder.
    Sent,
    /// Trash folder.
    Trash,
    /// Unknown attribute (stored without its leading backslash).
    Extension(String),
}

impl MailboxFlag {
    /// Parses a mailbox attribute token, ASCII-case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\NOSELECT" => Self::Noselect,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\NOINFERIORS" => Self::Noinferiors,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" => Self::Flagged,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            _ => Self::Extension(s.trim_start_matches('\\').to_string()),
        }
    }
}

impl std::fmt::Display for MailboxFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Noselect => write!(f, "\\Noselect"),
            Self::Marked => write!(f, "\\Marked"),
            Self::Unmarked => write!(f, "\\Unmarked"),
            Self::Noinferiors => write!(f, "\\Noinferiors"),
            Self::HasChildren => write!(f, "\\HasChildren"),
            Self::HasNoChildren => write!(f, "\\HasNoChildren"),
            Self::All => write!(f, "\\All"),
            Self::Archive => write!(f, "\\Archive"),
            Self::Drafts => write!(f, "\\Drafts"),
            Self::Flagged => write!(f, "\\Flagged"),
            Self::Junk => write!(f, "\\Junk"),
            Self::Sent => write!(f, "\\Sent"),
            Self::Trash => write!(f, "\\Trash"),
            Self::Extension(s) => write!(f, "\\{s}"),
        }
    }
}

/// One LIST/LSUB/XLIST line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Name attributes.
    pub flags: Vec<MailboxFlag>,
    /// Hierarchy delimiter, if the mailbox is part of a hierarchy.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub name: Mailbox,
}

/// Access mode of a selected mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailboxAccess {
    /// Opened with EXAMINE or the server forced read-only.
    ReadOnly,
    /// Opened with SELECT for read-write access.
    #[default]
    ReadWrite,
}

/// Snapshot of the currently selected mailbox.
///
/// Populated from the untagged data and response codes of SELECT/EXAMINE and
/// kept current while the mailbox stays selected (EXISTS, RECENT, EXPUNGE).
#[derive(Debug, Clone, Default)]
pub struct SelectedMailbox {
    /// Mailbox name.
    pub name: Option<Mailbox>,
    /// UIDVALIDITY value; callers persist it for QRESYNC.
    pub uidvalidity: Option<u32>,
    /// Predicted next UID.
    pub uidnext: Option<u32>,
    /// Highest modification sequence (CONDSTORE), if the server supports it.
    pub highestmodseq: Option<u64>,
    /// Number of messages.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number.
    pub unseen: Option<u32>,
    /// Flags defined in the mailbox.
    pub flags: Flags,
    /// Flags the client may change permanently.
    pub permanent_flags: Flags,
    /// Read-only or read-write access.
    pub access: MailboxAccess,
}

/// One attribute/value pair from a STATUS response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusItem {
    /// Number of messages.
    Messages(u32),
    /// Number of recent messages.
    Recent(u32),
    /// Predicted next UID.
    UidNext(u32),
    /// UIDVALIDITY value.
    UidValidity(u32),
    /// Number of unseen messages.
    Unseen(u32),
    /// Highest modification sequence.
    HighestModSeq(u64),
}

/// Namespace entry from a NAMESPACE response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Namespace prefix, e.g. `""` or `"#shared/"`.
    pub prefix: String,
    /// Hierarchy delimiter for this namespace.
    pub delimiter: Option<char>,
}

/// Parsed NAMESPACE response (RFC 2342).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    /// Personal namespaces.
    pub personal: Vec<Namespace>,
    /// Other users' namespaces.
    pub other_users: Vec<Namespace>,
    /// Shared namespaces.
    pub shared: Vec<Namespace>,
}

/// Result of a SEARCH or UID SEARCH command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Matching sequence numbers or UIDs, in server order.
    pub ids: Vec<u32>,
    /// Highest MODSEQ among the matches (CONDSTORE trailer).
    pub modseq: Option<u64>,
}

/// Parsed ESEARCH response (RFC 4731).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedSearch {
    /// Tag of the command this result correlates to.
    pub tag: Option<String>,
    /// True if the results are UIDs.
    pub uid: bool,
    /// Lowest matching id.
    pub min: Option<u32>,
    /// Highest matching id.
    pub max: Option<u32>,
    /// Number of matches.
    pub count: Option<u32>,
    /// All matching ids as a set.
    pub all: Option<UidSet>,
    /// Highest MODSEQ among the matches.
    pub modseq: Option<u64>,
}
