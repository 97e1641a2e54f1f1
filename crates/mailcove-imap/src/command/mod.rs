//! IMAP command construction and encoding.

mod search;
mod serialize;
mod tag;
mod types;

pub use search::SearchCriteria;
pub use serialize::{Encoded, LiteralMode};
pub use tag::TagSequence;
pub use types::{
    FetchItems, FetchRequest, QresyncParams, SelectParams, StatusAttribute, StoreMode,
};

use crate::types::{Flag, Mailbox, UidSet};

use serialize::{WireWriter, write_fetch_items, write_search};

/// A typed IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY.
    Capability,
    /// NOOP.
    Noop,
    /// LOGOUT.
    Logout,
    /// STARTTLS.
    StartTls,
    /// LOGIN with plaintext credentials.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE; the SASL exchange itself is driven by the session.
    Authenticate {
        /// SASL mechanism name.
        mechanism: String,
        /// Initial response for servers advertising SASL-IR.
        initial_response: Option<String>,
    },
    /// ENABLE (RFC 5161).
    Enable {
        /// Capability names to enable.
        capabilities: Vec<String>,
    },
    /// ID (RFC 2971); `None` sends `ID NIL`.
    Id {
        /// Field/value pairs identifying this client.
        parameters: Option<Vec<(String, String)>>,
    },
    /// NAMESPACE (RFC 2342).
    Namespace,
    /// COMPRESS DEFLATE (RFC 4978).
    Compress,
    /// SELECT.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
        /// CONDSTORE/QRESYNC parameters.
        params: SelectParams,
    },
    /// EXAMINE (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
        /// CONDSTORE/QRESYNC parameters.
        params: SelectParams,
    },
    /// CREATE.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// RENAME.
    Rename {
        /// Current name.
        from: Mailbox,
        /// New name.
        to: Mailbox,
    },
    /// SUBSCRIBE.
    Subscribe {
        /// Mailbox to subscribe to.
        mailbox: Mailbox,
    },
    /// UNSUBSCRIBE.
    Unsubscribe {
        /// Mailbox to unsubscribe from.
        mailbox: Mailbox,
    },
    /// LIST.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// LSUB.
    Lsub {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// XLIST (GMail folder listing; replies decode as LIST).
    XList {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// STATUS.
    Status {
        /// Mailbox to query.
        mailbox: Mailbox,
        /// Attributes to request.
        items: Vec<StatusAttribute>,
    },
    /// APPEND; the message always travels as a literal.
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Initial flags.
        flags: Option<Vec<Flag>>,
        /// Internal date, e.g. `17-Jul-1996 02:44:25 -0700`.
        internal_date: Option<String>,
        /// Complete RFC 5322 message.
        message: Vec<u8>,
    },
    /// CHECK.
    Check,
    /// CLOSE.
    Close,
    /// UNSELECT.
    Unselect,
    /// EXPUNGE.
    Expunge,
    /// UID EXPUNGE (UIDPLUS).
    UidExpunge {
        /// UIDs to expunge.
        uids: UidSet,
    },
    /// SEARCH or UID SEARCH.
    Search {
        /// The query.
        criteria: SearchCriteria,
        /// Optional CHARSET argument.
        charset: Option<String>,
        /// True for the UID form.
        uid: bool,
    },
    /// FETCH or UID FETCH.
    Fetch {
        /// Messages to fetch.
        set: UidSet,
        /// What to return.
        items: FetchItems,
        /// True for the UID form.
        uid: bool,
        /// `CHANGEDSINCE` modifier (CONDSTORE).
        changed_since: Option<u64>,
        /// `VANISHED` modifier (QRESYNC; requires `changed_since` and UID form).
        vanished: bool,
    },
    /// STORE or UID STORE.
    Store {
        /// Messages to modify.
        set: UidSet,
        /// Which flag form to emit.
        mode: StoreMode,
        /// Flags to apply.
        flags: Vec<Flag>,
        /// Suppress the FETCH echoes with `.SILENT`.
        silent: bool,
        /// True for the UID form.
        uid: bool,
        /// `UNCHANGEDSINCE` modifier (CONDSTORE).
        unchanged_since: Option<u64>,
    },
    /// COPY or UID COPY.
    Copy {
        /// Messages to copy.
        set: UidSet,
        /// Destination mailbox.
        mailbox: Mailbox,
        /// True for the UID form.
        uid: bool,
    },
    /// IDLE.
    Idle,
    /// DONE — ends IDLE; carries no tag.
    Done,
}

impl Command {
    /// Encodes the command under the given tag.
    ///
    /// The result is split into chunks at synchronizing literals; see
    /// [`Encoded`].
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn encode(&self, tag: &str, mode: LiteralMode) -> Encoded {
        let mut w = WireWriter::new(mode);

        if !matches!(self, Self::Done) {
            w.text(tag);
            w.raw(b" ");
        }

        match self {
            Self::Capability => w.text("CAPABILITY"),
            Self::Noop => w.text("NOOP"),
            Self::Logout => w.text("LOGOUT"),
            Self::StartTls => w.text("STARTTLS"),
            Self::Check => w.text("CHECK"),
            Self::Close => w.text("CLOSE"),
            Self::Unselect => w.text("UNSELECT"),
            Self::Expunge => w.text("EXPUNGE"),
            Self::Namespace => w.text("NAMESPACE"),
            Self::Compress => w.text("COMPRESS DEFLATE"),
            Self::Idle => w.text("IDLE"),
            Self::Done => w.text("DONE"),

            Self::Login { username, password } => {
                w.text("LOGIN ");
                w.string(username);
                w.raw(b" ");
                w.string(password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                w.text("AUTHENTICATE ");
                w.text(mechanism);
                if let Some(resp) = initial_response {
                    w.raw(b" ");
                    w.text(resp);
                }
            }

            Self::Enable { capabilities } => {
                w.text("ENABLE");
                for cap in capabilities {
                    w.raw(b" ");
                    w.text(cap);
                }
            }

            Self::Id { parameters } => {
                w.text("ID ");
                match parameters {
                    Some(params) => {
                        w.raw(b"(");
                        for (i, (field, value)) in params.iter().enumerate() {
                            if i > 0 {
                                w.raw(b" ");
                            }
                            w.string(field);
                            w.raw(b" ");
                            w.string(value);
                        }
                        w.raw(b")");
                    }
                    None => w.text("NIL"),
                }
            }

            Self::Select { mailbox, params } => {
                w.text("SELECT ");
                w.string(mailbox.as_str());
                write_select_params(&mut w, params);
            }

            Self::Examine { mailbox, params } => {
                w.text("EXAMINE ");
                w.string(mailbox.as_str());
                write_select_params(&mut w, params);
            }

            Self::Create { mailbox } => {
                w.text("CREATE ");
                w.string(mailbox.as_str());
            }

            Self::Delete { mailbox } => {
                w.text("DELETE ");
                w.string(mailbox.as_str());
            }

            Self::Rename { from, to } => {
                w.text("RENAME ");
                w.string(from.as_str());
                w.raw(b" ");
                w.string(to.as_str());
            }

            Self::Subscribe { mailbox } => {
                w.text("SUBSCRIBE ");
                w.string(mailbox.as_str());
            }

            Self::Unsubscribe { mailbox } => {
                w.text("UNSUBSCRIBE ");
                w.string(mailbox.as_str());
            }

            Self::List { reference, pattern } => {
                w.text("LIST ");
                w.string(reference);
                w.raw(b" ");
                w.string(pattern);
            }

            Self::Lsub { reference, pattern } => {
                w.text("LSUB ");
                w.string(reference);
                w.raw(b" ");
                w.string(pattern);
            }

            Self::XList { reference, pattern } => {
                w.text("XLIST ");
                w.string(reference);
                w.raw(b" ");
                w.string(pattern);
            }

            Self::Status { mailbox, items } => {
                w.text("STATUS ");
                w.string(mailbox.as_str());
                w.raw(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.raw(b" ");
                    }
                    w.text(item.as_str());
                }
                w.raw(b")");
            }

            Self::Append {
                mailbox,
                flags,
                internal_date,
                message,
            } => {
                w.text("APPEND ");
                w.string(mailbox.as_str());
                if let Some(flags) = flags {
                    w.raw(b" ");
                    w.flag_list(flags);
                }
                if let Some(date) = internal_date {
                    w.raw(b" \"");
                    w.text(date);
                    w.raw(b"\"");
                }
                w.raw(b" ");
                w.literal(message);
            }

            Self::UidExpunge { uids } => {
                w.text("UID EXPUNGE ");
                w.text(&uids.to_string());
            }

            Self::Search {
                criteria,
                charset,
                uid,
            } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("SEARCH ");
                if let Some(charset) = charset {
                    w.text("CHARSET ");
                    w.text(charset);
                    w.raw(b" ");
                }
                write_search(&mut w, criteria);
            }

            Self::Fetch {
                set,
                items,
                uid,
                changed_since,
                vanished,
            } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("FETCH ");
                w.text(&set.to_string());
                w.raw(b" ");
                write_fetch_items(&mut w, items);
                if let Some(modseq) = changed_since {
                    w.text(&format!(" (CHANGEDSINCE {modseq}"));
                    if *vanished {
                        w.text(" VANISHED");
                    }
                    w.raw(b")");
                }
            }

            Self::Store {
                set,
                mode,
                flags,
                silent,
                uid,
                unchanged_since,
            } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("STORE ");
                w.text(&set.to_string());
                w.raw(b" ");
                if let Some(modseq) = unchanged_since {
                    w.text(&format!("(UNCHANGEDSINCE {modseq}) "));
                }
                w.text(mode.as_str());
                if *silent {
                    w.text(".SILENT");
                }
                w.raw(b" ");
                w.flag_list(flags);
            }

            Self::Copy { set, mailbox, uid } => {
                if *uid {
                    w.text("UID ");
                }
                w.text("COPY ");
                w.text(&set.to_string());
                w.raw(b" ");
                w.string(mailbox.as_str());
            }
        }

        w.finish()
    }
}

fn write_select_params(w: &mut WireWriter, params: &SelectParams) {
    if let Some(qresync) = &params.qresync {
        w.text(&format!(
            " (QRESYNC ({} {}",
            qresync.uidvalidity, qresync.modseq
        ));
        if let Some(known) = &qresync.known_uids {
            w.text(&format!(" {known}"));
        }
        w.raw(b"))");
    } else if params.condstore {
        w.text(" (CONDSTORE)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SectionSpec, SectionText};
    use crate::types::STAR;

    fn one_chunk(cmd: &Command, tag: &str) -> Vec<u8> {
        let encoded = cmd.encode(tag, LiteralMode::Synchronizing);
        assert_eq!(encoded.chunks.len(), 1, "expected no literal split");
        encoded.assembled()
    }

    #[test]
    fn capability() {
        assert_eq!(one_chunk(&Command::Capability, "A001"), b"A001 CAPABILITY\r\n");
    }

    #[test]
    fn login_quotes_arguments() {
        let cmd = Command::Login {
            username: "fred".to_string(),
            password: "secret word".to_string(),
        };
        assert_eq!(
            one_chunk(&cmd, "A001"),
            b"A001 LOGIN \"fred\" \"secret word\"\r\n"
        );
    }

    #[test]
    fn login_with_backslash_password_uses_literal() {
        let cmd = Command::Login {
            username: "fred".to_string(),
            password: "pa\\ss".to_string(),
        };
        let encoded = cmd.encode("A001", LiteralMode::Synchronizing);
        assert_eq!(encoded.chunks.len(), 2);
        assert_eq!(encoded.chunks[0], b"A001 LOGIN \"fred\" {5}\r\n");
        assert_eq!(encoded.chunks[1], b"pa\\ss\r\n");
    }

    #[test]
    fn select_plain_and_condstore() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
            params: SelectParams::none(),
        };
        assert_eq!(one_chunk(&cmd, "A002"), b"A002 SELECT \"INBOX\"\r\n");

        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
            params: SelectParams::condstore(),
        };
        assert_eq!(
            one_chunk(&cmd, "A002"),
            b"A002 SELECT \"INBOX\" (CONDSTORE)\r\n"
        );
    }

    #[test]
    fn select_qresync() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
            params: SelectParams::qresync(QresyncParams {
                uidvalidity: 67_890_007,
                modseq: 90_060_115_194,
                known_uids: Some(UidSet::range(41, 211)),
            }),
        };
        assert_eq!(
            one_chunk(&cmd, "A003"),
            b"A003 SELECT \"INBOX\" (QRESYNC (67890007 90060115194 41:211))\r\n"
        );
    }

    #[test]
    fn fetch_with_set_and_macro() {
        let cmd = Command::Fetch {
            set: UidSet::range(1, 10),
            items: FetchItems::Fast,
            uid: false,
            changed_since: None,
            vanished: false,
        };
        assert_eq!(one_chunk(&cmd, "A004"), b"A004 FETCH 1:10 FAST\r\n");
    }

    #[test]
    fn uid_fetch_with_attrs_and_changedsince() {
        let cmd = Command::Fetch {
            set: UidSet::range(300, STAR),
            items: FetchItems::Attrs(vec![FetchRequest::Flags, FetchRequest::Uid]),
            uid: true,
            changed_since: Some(12_345),
            vanished: true,
        };
        assert_eq!(
            one_chunk(&cmd, "A005"),
            b"A005 UID FETCH 300:* (FLAGS UID) (CHANGEDSINCE 12345 VANISHED)\r\n"
        );
    }

    #[test]
    fn fetch_single_attr_unparenthesized() {
        let cmd = Command::Fetch {
            set: UidSet::single(7),
            items: FetchItems::Attrs(vec![FetchRequest::Section {
                section: SectionSpec::entire().with_text(SectionText::Header),
                peek: true,
                partial: None,
            }]),
            uid: false,
            changed_since: None,
            vanished: false,
        };
        assert_eq!(one_chunk(&cmd, "A006"), b"A006 FETCH 7 BODY.PEEK[HEADER]\r\n");
    }

    #[test]
    fn fetch_partial_section() {
        let cmd = Command::Fetch {
            set: UidSet::single(7),
            items: FetchItems::Attrs(vec![FetchRequest::Section {
                section: SectionSpec::part(vec![1, 2]),
                peek: false,
                partial: Some((0, 1024)),
            }]),
            uid: false,
            changed_since: None,
            vanished: false,
        };
        assert_eq!(one_chunk(&cmd, "A007"), b"A007 FETCH 7 BODY[1.2]<0.1024>\r\n");
    }

    #[test]
    fn store_emits_exactly_one_form() {
        let cmd = Command::Store {
            set: UidSet::single(1),
            mode: StoreMode::Add,
            flags: vec![Flag::Seen],
            silent: true,
            uid: false,
            unchanged_since: None,
        };
        assert_eq!(
            one_chunk(&cmd, "A008"),
            b"A008 STORE 1 +FLAGS.SILENT (\\Seen)\r\n"
        );

        let cmd = Command::Store {
            set: UidSet::single(1),
            mode: StoreMode::Replace,
            flags: vec![Flag::Deleted, Flag::Seen],
            silent: false,
            uid: true,
            unchanged_since: None,
        };
        assert_eq!(
            one_chunk(&cmd, "A009"),
            b"A009 UID STORE 1 FLAGS (\\Deleted \\Seen)\r\n"
        );
    }

    #[test]
    fn store_unchangedsince_precedes_the_form() {
        let cmd = Command::Store {
            set: UidSet::range(1, 3),
            mode: StoreMode::Remove,
            flags: vec![Flag::Flagged],
            silent: false,
            uid: false,
            unchanged_since: Some(320_162_338),
        };
        assert_eq!(
            one_chunk(&cmd, "A010"),
            b"A010 STORE 1:3 (UNCHANGEDSINCE 320162338) -FLAGS (\\Flagged)\r\n"
        );
    }

    #[test]
    fn append_splits_at_the_message_literal() {
        let cmd = Command::Append {
            mailbox: Mailbox::new("Drafts"),
            flags: Some(vec![Flag::Draft]),
            internal_date: Some("17-Jul-1996 02:44:25 -0700".to_string()),
            message: b"Subject: hi\r\n\r\nhello\r\n".to_vec(),
        };
        let encoded = cmd.encode("A011", LiteralMode::Synchronizing);
        assert_eq!(encoded.chunks.len(), 2);
        assert_eq!(
            encoded.chunks[0],
            b"A011 APPEND \"Drafts\" (\\Draft) \"17-Jul-1996 02:44:25 -0700\" {22}\r\n"
        );
        assert_eq!(encoded.chunks[1], b"Subject: hi\r\n\r\nhello\r\n\r\n");
    }

    #[test]
    fn append_collapses_under_literal_plus() {
        let cmd = Command::Append {
            mailbox: Mailbox::inbox(),
            flags: None,
            internal_date: None,
            message: b"test".to_vec(),
        };
        let encoded = cmd.encode("A012", LiteralMode::NonSynchronizing);
        assert_eq!(encoded.chunks.len(), 1);
        assert_eq!(
            encoded.assembled(),
            b"A012 APPEND \"INBOX\" {4+}\r\ntest\r\n"
        );
    }

    #[test]
    fn uid_forms() {
        let cmd = Command::Copy {
            set: UidSet::range(2, 4),
            mailbox: Mailbox::new("MEETING"),
            uid: true,
        };
        assert_eq!(one_chunk(&cmd, "A013"), b"A013 UID COPY 2:4 \"MEETING\"\r\n");

        let cmd = Command::UidExpunge {
            uids: UidSet::range(3000, 3002),
        };
        assert_eq!(one_chunk(&cmd, "A014"), b"A014 UID EXPUNGE 3000:3002\r\n");
    }

    #[test]
    fn search_with_charset() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Text("résumé".to_string()),
            charset: Some("UTF-8".to_string()),
            uid: true,
        };
        let encoded = cmd.encode("A015", LiteralMode::Synchronizing);
        assert_eq!(encoded.chunks.len(), 2);
        assert_eq!(encoded.chunks[0], b"A015 UID SEARCH CHARSET UTF-8 TEXT {8}\r\n");
        assert_eq!(encoded.chunks[1], "résumé\r\n".as_bytes());
    }

    #[test]
    fn id_command_forms() {
        assert_eq!(
            one_chunk(&Command::Id { parameters: None }, "A016"),
            b"A016 ID NIL\r\n"
        );
        let cmd = Command::Id {
            parameters: Some(vec![("name".to_string(), "mailcove".to_string())]),
        };
        assert_eq!(
            one_chunk(&cmd, "A017"),
            b"A017 ID (\"name\" \"mailcove\")\r\n"
        );
    }

    #[test]
    fn enable_lists_capabilities() {
        let cmd = Command::Enable {
            capabilities: vec!["QRESYNC".to_string(), "UTF8=ACCEPT".to_string()],
        };
        assert_eq!(
            one_chunk(&cmd, "A018"),
            b"A018 ENABLE QRESYNC UTF8=ACCEPT\r\n"
        );
    }

    #[test]
    fn idle_and_done() {
        assert_eq!(one_chunk(&Command::Idle, "A019"), b"A019 IDLE\r\n");
        assert_eq!(one_chunk(&Command::Done, ""), b"DONE\r\n");
    }

    #[test]
    fn compress_deflate() {
        assert_eq!(one_chunk(&Command::Compress, "A020"), b"A020 COMPRESS DEFLATE\r\n");
    }

    #[test]
    fn starttls() {
        assert_eq!(one_chunk(&Command::StartTls, "A021"), b"A021 STARTTLS\r\n");
    }
}
