//! Command wire encoding.
//!
//! Strings go out as quoted strings when they are printable US-ASCII free
//! of `"` and `\`; anything else becomes a literal. Synchronizing literals
//! split the encoded command into chunks at each `{n}` marker — the writer
//! sends a chunk, waits for the server's `+`, then sends the next. Under
//! `LITERAL+` the split disappears and one chunk carries everything.

use crate::types::Flag;

use super::search::SearchCriteria;
use super::types::{FetchItems, FetchRequest};

/// How literals may be transmitted on this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralMode {
    /// `{n}` — wait for a continuation before each literal.
    #[default]
    Synchronizing,
    /// `{n+}` — LITERAL+ advertised, never wait.
    NonSynchronizing,
    /// `{n+}` for literals up to 4096 octets, `{n}` beyond (LITERAL-).
    NonSyncBounded,
}

impl LiteralMode {
    fn is_sync(self, len: usize) -> bool {
        match self {
            Self::Synchronizing => true,
            Self::NonSynchronizing => false,
            Self::NonSyncBounded => len > 4096,
        }
    }
}

/// An encoded command, split into chunks at synchronizing literals.
///
/// The transport writes `chunks[0]`, then for every further chunk first
/// awaits a continuation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Wire chunks in transmission order; never empty.
    pub chunks: Vec<Vec<u8>>,
}

impl Encoded {
    /// The full wire form with continuation pauses ignored.
    #[must_use]
    pub fn assembled(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

/// Accumulates a command's wire form, splitting at synchronizing literals.
pub(crate) struct WireWriter {
    chunks: Vec<Vec<u8>>,
    buf: Vec<u8>,
    mode: LiteralMode,
}

impl WireWriter {
    pub(crate) fn new(mode: LiteralMode) -> Self {
        Self {
            chunks: Vec::new(),
            buf: Vec::new(),
            mode,
        }
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn text(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Writes a string as quoted or literal, per its content.
    pub(crate) fn string(&mut self, s: &str) {
        if s.bytes().all(is_quotable) {
            self.buf.push(b'"');
            self.buf.extend_from_slice(s.as_bytes());
            self.buf.push(b'"');
        } else {
            self.literal(s.as_bytes());
        }
    }

    /// Writes arbitrary octets as a literal.
    pub(crate) fn literal(&mut self, data: &[u8]) {
        if self.mode.is_sync(data.len()) {
            self.text(&format!("{{{}}}\r\n", data.len()));
            self.chunks.push(std::mem::take(&mut self.buf));
        } else {
            self.text(&format!("{{{}+}}\r\n", data.len()));
        }
        self.buf.extend_from_slice(data);
    }

    /// Writes a parenthesized flag list.
    pub(crate) fn flag_list(&mut self, flags: &[Flag]) {
        self.buf.push(b'(');
        for (i, flag) in flags.iter().enumerate() {
            if i > 0 {
                self.buf.push(b' ');
            }
            self.text(&flag.to_string());
        }
        self.buf.push(b')');
    }

    /// Terminates the command line and returns the chunks.
    pub(crate) fn finish(mut self) -> Encoded {
        self.buf.extend_from_slice(b"\r\n");
        self.chunks.push(self.buf);
        Encoded {
            chunks: self.chunks,
        }
    }
}

/// True for printable US-ASCII excluding `"` and `\`.
const fn is_quotable(b: u8) -> bool {
    matches!(b, 0x20..=0x7E) && b != b'"' && b != b'\\'
}

/// Writes a FETCH item specification.
pub(crate) fn write_fetch_items(w: &mut WireWriter, items: &FetchItems) {
    match items {
        FetchItems::All => w.text("ALL"),
        FetchItems::Fast => w.text("FAST"),
        FetchItems::Full => w.text("FULL"),
        FetchItems::Attrs(attrs) => {
            if let [single] = attrs.as_slice() {
                write_fetch_request(w, single);
            } else {
                w.raw(b"(");
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        w.raw(b" ");
                    }
                    write_fetch_request(w, attr);
                }
                w.raw(b")");
            }
        }
    }
}

fn write_fetch_request(w: &mut WireWriter, attr: &FetchRequest) {
    match attr {
        FetchRequest::Flags => w.text("FLAGS"),
        FetchRequest::InternalDate => w.text("INTERNALDATE"),
        FetchRequest::Rfc822Size => w.text("RFC822.SIZE"),
        FetchRequest::Rfc822 => w.text("RFC822"),
        FetchRequest::Rfc822Header => w.text("RFC822.HEADER"),
        FetchRequest::Rfc822Text => w.text("RFC822.TEXT"),
        FetchRequest::Envelope => w.text("ENVELOPE"),
        FetchRequest::Body => w.text("BODY"),
        FetchRequest::BodyStructure => w.text("BODYSTRUCTURE"),
        FetchRequest::Uid => w.text("UID"),
        FetchRequest::ModSeq => w.text("MODSEQ"),
        FetchRequest::GmMsgId => w.text("X-GM-MSGID"),
        FetchRequest::GmThrId => w.text("X-GM-THRID"),
        FetchRequest::GmLabels => w.text("X-GM-LABELS"),
        FetchRequest::Section {
            section,
            peek,
            partial,
        } => {
            w.text(if *peek { "BODY.PEEK[" } else { "BODY[" });
            w.text(&section.to_string());
            w.raw(b"]");
            if let Some((origin, len)) = partial {
                w.text(&format!("<{origin}.{len}>"));
            }
        }
    }
}

/// Writes search criteria, left to right.
pub(crate) fn write_search(w: &mut WireWriter, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => w.text("ALL"),
        SearchCriteria::Answered => w.text("ANSWERED"),
        SearchCriteria::Deleted => w.text("DELETED"),
        SearchCriteria::Draft => w.text("DRAFT"),
        SearchCriteria::Flagged => w.text("FLAGGED"),
        SearchCriteria::New => w.text("NEW"),
        SearchCriteria::Old => w.text("OLD"),
        SearchCriteria::Recent => w.text("RECENT"),
        SearchCriteria::Seen => w.text("SEEN"),
        SearchCriteria::Unanswered => w.text("UNANSWERED"),
        SearchCriteria::Undeleted => w.text("UNDELETED"),
        SearchCriteria::Undraft => w.text("UNDRAFT"),
        SearchCriteria::Unflagged => w.text("UNFLAGGED"),
        SearchCriteria::Unseen => w.text("UNSEEN"),
        SearchCriteria::Bcc(s) => {
            w.text("BCC ");
            w.string(s);
        }
        SearchCriteria::Body(s) => {
            w.text("BODY ");
            w.string(s);
        }
        SearchCriteria::Cc(s) => {
            w.text("CC ");
            w.string(s);
        }
        SearchCriteria::From(s) => {
            w.text("FROM ");
            w.string(s);
        }
        SearchCriteria::Subject(s) => {
            w.text("SUBJECT ");
            w.string(s);
        }
        SearchCriteria::Text(s) => {
            w.text("TEXT ");
            w.string(s);
        }
        SearchCriteria::To(s) => {
            w.text("TO ");
            w.string(s);
        }
        SearchCriteria::Header(name, value) => {
            w.text("HEADER ");
            w.string(name);
            w.raw(b" ");
            w.string(value);
        }
        SearchCriteria::Keyword(k) => {
            w.text("KEYWORD ");
            w.text(k);
        }
        SearchCriteria::Unkeyword(k) => {
            w.text("UNKEYWORD ");
            w.text(k);
        }
        SearchCriteria::Before(d) => {
            w.text("BEFORE ");
            w.text(d);
        }
        SearchCriteria::On(d) => {
            w.text("ON ");
            w.text(d);
        }
        SearchCriteria::Since(d) => {
            w.text("SINCE ");
            w.text(d);
        }
        SearchCriteria::SentBefore(d) => {
            w.text("SENTBEFORE ");
            w.text(d);
        }
        SearchCriteria::SentOn(d) => {
            w.text("SENTON ");
            w.text(d);
        }
        SearchCriteria::SentSince(d) => {
            w.text("SENTSINCE ");
            w.text(d);
        }
        SearchCriteria::Larger(n) => w.text(&format!("LARGER {n}")),
        SearchCriteria::Smaller(n) => w.text(&format!("SMALLER {n}")),
        SearchCriteria::Uid(set) => w.text(&format!("UID {set}")),
        SearchCriteria::SeqSet(set) => w.text(&set.to_string()),
        SearchCriteria::ModSeq(n) => w.text(&format!("MODSEQ {n}")),
        SearchCriteria::GmRaw(s) => {
            w.text("X-GM-RAW ");
            w.string(s);
        }
        SearchCriteria::GmMsgId(n) => w.text(&format!("X-GM-MSGID {n}")),
        SearchCriteria::GmThrId(n) => w.text(&format!("X-GM-THRID {n}")),
        SearchCriteria::GmLabels(labels) => {
            w.text("X-GM-LABELS ");
            if let [single] = labels.as_slice() {
                w.string(single);
            } else {
                w.raw(b"(");
                for (i, label) in labels.iter().enumerate() {
                    if i > 0 {
                        w.raw(b" ");
                    }
                    w.string(label);
                }
                w.raw(b")");
            }
        }
        SearchCriteria::Not(inner) => {
            w.text("NOT ");
            write_search(w, inner);
        }
        SearchCriteria::Or(a, b) => {
            w.text("OR ");
            write_search(w, a);
            w.raw(b" ");
            write_search(w, b);
        }
        SearchCriteria::And(criteria) => {
            if criteria.is_empty() {
                // The neutral element keeps the encoder total.
                w.text("ALL");
                return;
            }
            for (i, c) in criteria.iter().enumerate() {
                if i > 0 {
                    w.raw(b" ");
                }
                write_search(w, c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UidSet;

    fn render_search(criteria: &SearchCriteria) -> String {
        let mut w = WireWriter::new(LiteralMode::Synchronizing);
        write_search(&mut w, criteria);
        let encoded = w.finish();
        assert_eq!(encoded.chunks.len(), 1);
        let mut s = String::from_utf8(encoded.assembled()).unwrap();
        s.truncate(s.len() - 2);
        s
    }

    #[test]
    fn quotable_strings_are_quoted() {
        let mut w = WireWriter::new(LiteralMode::Synchronizing);
        w.string("hello world");
        let encoded = w.finish();
        assert_eq!(encoded.assembled(), b"\"hello world\"\r\n");
    }

    #[test]
    fn strings_with_specials_become_literals() {
        let mut w = WireWriter::new(LiteralMode::Synchronizing);
        w.string("say \"hi\"");
        let encoded = w.finish();
        assert_eq!(encoded.chunks.len(), 2);
        assert_eq!(encoded.chunks[0], b"{8}\r\n");
        assert_eq!(encoded.chunks[1], b"say \"hi\"\r\n");
    }

    #[test]
    fn non_ascii_becomes_literal() {
        let mut w = WireWriter::new(LiteralMode::Synchronizing);
        w.string("héllo");
        let encoded = w.finish();
        assert_eq!(encoded.chunks[0], "{6}\r\n".as_bytes());
    }

    #[test]
    fn literal_plus_stays_in_one_chunk() {
        let mut w = WireWriter::new(LiteralMode::NonSynchronizing);
        w.string("say \"hi\"");
        let encoded = w.finish();
        assert_eq!(encoded.chunks.len(), 1);
        assert_eq!(encoded.assembled(), b"{8+}\r\nsay \"hi\"\r\n");
    }

    #[test]
    fn bounded_nonsync_splits_large_literals() {
        let small = vec![b'x'; 100];
        let mut w = WireWriter::new(LiteralMode::NonSyncBounded);
        w.literal(&small);
        assert_eq!(w.finish().chunks.len(), 1);

        let large = vec![b'x'; 5000];
        let mut w = WireWriter::new(LiteralMode::NonSyncBounded);
        w.literal(&large);
        assert_eq!(w.finish().chunks.len(), 2);
    }

    #[test]
    fn and_serializes_as_juxtaposition() {
        let query = SearchCriteria::Unseen.and(SearchCriteria::Flagged);
        assert_eq!(render_search(&query), "UNSEEN FLAGGED");
    }

    #[test]
    fn or_and_not_prefix_forms() {
        let query = SearchCriteria::Seen.or(SearchCriteria::Deleted.not());
        assert_eq!(render_search(&query), "OR SEEN NOT DELETED");
    }

    #[test]
    fn empty_and_is_all() {
        assert_eq!(render_search(&SearchCriteria::And(vec![])), "ALL");
    }

    #[test]
    fn string_keys_quote_their_argument() {
        let query = SearchCriteria::From("mailer daemon".to_string());
        assert_eq!(render_search(&query), "FROM \"mailer daemon\"");
    }

    #[test]
    fn uid_and_modseq_keys() {
        let query =
            SearchCriteria::Uid(UidSet::range(4000, 4010)).and(SearchCriteria::ModSeq(620_162_338));
        assert_eq!(render_search(&query), "UID 4000:4010 MODSEQ 620162338");
    }

    #[test]
    fn gmail_keys() {
        let query = SearchCriteria::GmRaw("has:attachment in:unread".to_string());
        assert_eq!(render_search(&query), "X-GM-RAW \"has:attachment in:unread\"");

        let labels = SearchCriteria::GmLabels(vec!["work".to_string(), "urgent".to_string()]);
        assert_eq!(render_search(&labels), "X-GM-LABELS (\"work\" \"urgent\")");
    }

    #[test]
    fn date_keys_are_raw() {
        let query = SearchCriteria::Since("1-Feb-1994".to_string());
        assert_eq!(render_search(&query), "SINCE 1-Feb-1994");
    }
}
