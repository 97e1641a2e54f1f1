//! Core IMAP types.
//!
//! The fundamental data model used throughout the crate: capabilities, flags,
//! mailbox names and attributes, response codes, and message sets.

mod capability;
mod flags;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use mailbox::{
    ExtendedSearch, ListEntry, Mailbox, MailboxAccess, MailboxFlag, Namespace, Namespaces,
    SearchResult, SelectedMailbox, StatusItem,
};
pub use response_code::ResponseCode;
pub use sequence::{STAR, SeqRange, UidSet};

/// A command tag.
///
/// Opaque ASCII identifier the client prefixes to each command so the
/// server's completion can be correlated; never contains `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag from a string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        let tag = Tag::new("A0042");
        assert_eq!(tag.as_str(), "A0042");
        assert_eq!(tag.to_string(), "A0042");
    }

    #[test]
    fn star_sentinel_is_u32_max() {
        assert_eq!(STAR, u32::MAX);
        assert_eq!(STAR, 0xFFFF_FFFF);
    }
}
