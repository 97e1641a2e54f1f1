//! Response codes carried inside `[...]` in resp-text.

use super::{Capability, Flag, UidSet};

/// A response code from a status response or tagged completion.
///
/// Unknown codes decode to [`ResponseCode::Other`]; the parser never rejects
/// an unrecognized atom in this position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: the text must be shown to the user.
    Alert,
    /// BADCHARSET with the charsets the server does accept.
    BadCharset(Vec<String>),
    /// CAPABILITY listing, equivalent to an untagged CAPABILITY.
    Capability(Vec<Capability>),
    /// PARSE: the server failed to parse a message's headers.
    Parse,
    /// PERMANENTFLAGS: flags that survive the session (may include `\*`).
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY: the mailbox is open read-only.
    ReadOnly,
    /// READ-WRITE: the mailbox is open read-write.
    ReadWrite,
    /// TRYCREATE: the target mailbox does not exist but could be created.
    TryCreate,
    /// UIDNEXT: predicted next UID.
    UidNext(u32),
    /// UIDVALIDITY: full-range 32-bit unsigned validity value.
    UidValidity(u32),
    /// UNSEEN: sequence number of the first unseen message.
    Unseen(u32),
    /// CLOSED: the previously selected mailbox was closed (QRESYNC).
    Closed,
    /// HIGHESTMODSEQ: highest mod-sequence in the mailbox (CONDSTORE).
    HighestModSeq(u64),
    /// NOMODSEQ: the mailbox does not support mod-sequences.
    NoModSeq,
    /// MODIFIED: messages that failed a conditional STORE (CONDSTORE).
    Modified(UidSet),
    /// APPENDUID: uidvalidity and UID assigned to an appended message (UIDPLUS).
    AppendUid(u32, u32),
    /// COPYUID: uidvalidity, source UIDs, and destination UIDs (UIDPLUS).
    CopyUid(u32, UidSet, UidSet),
    /// UIDNOTSTICKY: the mailbox does not support persistent UIDs.
    UidNotSticky,
    /// COMPRESSIONACTIVE: a compression layer is already active.
    CompressionActive,
    /// USEATTR: CREATE with a special-use attribute failed (RFC 6154).
    UseAttr,
    /// Any code this client does not recognize, with its raw argument text.
    Other(String, Option<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeqRange;

    #[test]
    fn uidvalidity_holds_full_unsigned_range() {
        // 3857529045 reinterpreted as i32 would be -437438251; the code must
        // keep the unsigned value.
        let code = ResponseCode::UidValidity(3_857_529_045);
        if let ResponseCode::UidValidity(v) = code {
            assert_eq!(v, 3_857_529_045_u32);
        } else {
            panic!("expected UidValidity");
        }
    }

    #[test]
    fn highestmodseq_holds_64_bits() {
        let code = ResponseCode::HighestModSeq(u64::MAX);
        assert!(matches!(code, ResponseCode::HighestModSeq(v) if v == u64::MAX));
    }

    #[test]
    fn copyuid_carries_both_sets() {
        let code = ResponseCode::CopyUid(
            38_505,
            UidSet::from(SeqRange::new(304, 310)),
            UidSet::from(SeqRange::new(3956, 3962)),
        );
        if let ResponseCode::CopyUid(validity, src, dst) = code {
            assert_eq!(validity, 38_505);
            assert_eq!(src.to_string(), "304:310");
            assert_eq!(dst.to_string(), "3956:3962");
        } else {
            panic!("expected CopyUid");
        }
    }
}
