//! Composable search criteria.
//!
//! A [`SearchCriteria`] is an expression tree. Conjunction serializes as
//! juxtaposition (`A B`), `or(a, b)` as `OR a b`, and `not(a)` as `NOT a`.
//!
//! # Example
//!
//! ```
//! use mailcove_imap::command::SearchCriteria;
//!
//! let query = SearchCriteria::Unseen
//!     .and(SearchCriteria::From("mailer-daemon".to_string()))
//!     .or(SearchCriteria::Flagged);
//! ```

use crate::types::UidSet;

/// A search key or combination of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with `\Answered`.
    Answered,
    /// `BCC` contains the string.
    Bcc(String),
    /// Internal date before the given date (`dd-Mon-yyyy`).
    Before(String),
    /// Body contains the string.
    Body(String),
    /// `CC` contains the string.
    Cc(String),
    /// Messages with `\Deleted`.
    Deleted,
    /// Messages with `\Draft`.
    Draft,
    /// Messages with `\Flagged`.
    Flagged,
    /// `FROM` contains the string.
    From(String),
    /// The named header contains the value.
    Header(String, String),
    /// Messages with the keyword flag set.
    Keyword(String),
    /// Larger than `n` octets.
    Larger(u32),
    /// Recent messages without `\Seen`.
    New,
    /// Messages not matching the inner criteria.
    Not(Box<SearchCriteria>),
    /// Messages that are not recent.
    Old,
    /// Internal date within the given day.
    On(String),
    /// Messages matching either criteria.
    Or(Box<SearchCriteria>, Box<SearchCriteria>),
    /// Messages with `\Recent`.
    Recent,
    /// Messages with `\Seen`.
    Seen,
    /// `Date:` header before the given date.
    SentBefore(String),
    /// `Date:` header within the given day.
    SentOn(String),
    /// `Date:` header on or after the given date.
    SentSince(String),
    /// Internal date on or after the given date.
    Since(String),
    /// Smaller than `n` octets.
    Smaller(u32),
    /// Subject contains the string.
    Subject(String),
    /// Header or body contains the string.
    Text(String),
    /// `TO` contains the string.
    To(String),
    /// Messages whose UID is in the set.
    Uid(UidSet),
    /// Messages without `\Answered`.
    Unanswered,
    /// Messages without `\Deleted`.
    Undeleted,
    /// Messages without `\Draft`.
    Undraft,
    /// Messages without `\Flagged`.
    Unflagged,
    /// Messages without the keyword flag.
    Unkeyword(String),
    /// Messages without `\Seen`.
    Unseen,
    /// Messages whose sequence number is in the set.
    SeqSet(UidSet),
    /// Messages with a mod-sequence at least `n` (CONDSTORE).
    ModSeq(u64),
    /// GMail raw search syntax (`X-GM-RAW`).
    GmRaw(String),
    /// GMail message id (`X-GM-MSGID`).
    GmMsgId(u64),
    /// GMail thread id (`X-GM-THRID`).
    GmThrId(u64),
    /// GMail labels (`X-GM-LABELS`).
    GmLabels(Vec<String>),
    /// Conjunction; serializes as juxtaposition.
    And(Vec<SearchCriteria>),
}

impl SearchCriteria {
    /// Combines two criteria conjunctively.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut criteria) => {
                criteria.push(other);
                Self::And(criteria)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Combines two criteria disjunctively.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negates this criteria.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_left_chains() {
        let query = SearchCriteria::Seen
            .and(SearchCriteria::Flagged)
            .and(SearchCriteria::Draft);
        match query {
            SearchCriteria::And(criteria) => assert_eq!(criteria.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn or_nests() {
        let query = SearchCriteria::Seen.or(SearchCriteria::Flagged);
        assert!(matches!(query, SearchCriteria::Or(_, _)));
    }

    #[test]
    fn not_wraps() {
        let query = SearchCriteria::Deleted.not();
        assert!(matches!(query, SearchCriteria::Not(_)));
    }
}
