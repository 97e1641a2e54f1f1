//! Response frame parsing.
//!
//! Decodes one complete server frame per call, dispatching on the first
//! token: `+` for continuation requests, `*` for untagged data, anything
//! else for a tagged completion.

mod body;
mod fetch;
mod helpers;
mod types;

pub use body::parse_body_structure;
pub use types::{
    Address, BodyFields, BodyStructure, Envelope, FetchAttr, SectionSpec, SectionText,
    UntaggedResponse,
};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_capability_list, parse_esearch_tail, parse_flag_list, parse_id_body, parse_list_entry,
    parse_namespace_body, parse_response_code, parse_search_tail, parse_status_body,
    parse_vanished_tail, read_text_until_crlf,
};

/// One parsed server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Tagged command completion.
    Tagged {
        /// The command tag this completion correlates to.
        tag: Tag,
        /// Completion severity.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text, verbatim.
        text: String,
    },
    /// Untagged data or status.
    Untagged(UntaggedResponse),
    /// Continuation request (`+`).
    Continuation {
        /// Text after the `+`, if any.
        text: Option<String>,
    },
}

/// Parser over complete response frames.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the offending line and column when the
    /// frame does not match the response grammar. A failed parse consumes
    /// nothing beyond the frame; callers treat the connection as broken.
    pub fn parse(input: &[u8]) -> Result<Frame> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => Self::parse_continuation(&mut lexer),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(Error::parse_at(
                input,
                0,
                format!("expected *, +, or tag, got {token:?}"),
            )),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Frame> {
        lexer.expect_space()?;

        let status = match lexer.read_atom_str()?.to_ascii_uppercase().as_str() {
            "OK" => Status::Ok,
            "NO" => Status::No,
            "BAD" => Status::Bad,
            other => return Err(lexer.error(format!("invalid completion status: {other}"))),
        };
        lexer.expect_space()?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Frame::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Frame> {
        lexer.expect_space()?;

        let response = match lexer.next_token()? {
            Token::Number(n) => {
                let n = u32::try_from(n)
                    .map_err(|_| lexer.error("message number exceeds 32 bits"))?;
                lexer.expect_space()?;
                let keyword = lexer.read_atom_str()?;
                match keyword.to_ascii_uppercase().as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => UntaggedResponse::Expunge(n),
                    "FETCH" => {
                        lexer.expect_space()?;
                        let attrs = fetch::parse_fetch_attrs(lexer)?;
                        UntaggedResponse::Fetch { seq: n, attrs }
                    }
                    other => {
                        return Err(lexer.error(format!("unknown message data: {other}")));
                    }
                }
            }
            Token::Atom(keyword) => match keyword.to_ascii_uppercase().as_str() {
                "OK" => {
                    lexer.expect_space()?;
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::State {
                        status: Status::Ok,
                        code,
                        text,
                    }
                }
                "NO" => {
                    lexer.expect_space()?;
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::State {
                        status: Status::No,
                        code,
                        text,
                    }
                }
                "BAD" => {
                    lexer.expect_space()?;
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::State {
                        status: Status::Bad,
                        code,
                        text,
                    }
                }
                "BYE" => {
                    lexer.expect_space()?;
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::Bye { code, text }
                }
                "PREAUTH" => {
                    lexer.expect_space()?;
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    UntaggedResponse::PreAuth { code, text }
                }
                "CAPABILITY" => UntaggedResponse::Capability(parse_capability_list(lexer)?),
                "ENABLED" => UntaggedResponse::Enabled(parse_capability_list(lexer)?),
                "FLAGS" => {
                    lexer.expect_space()?;
                    UntaggedResponse::Flags(parse_flag_list(lexer)?)
                }
                "LIST" | "XLIST" => {
                    lexer.expect_space()?;
                    UntaggedResponse::List(parse_list_entry(lexer)?)
                }
                "LSUB" => {
                    lexer.expect_space()?;
                    UntaggedResponse::Lsub(parse_list_entry(lexer)?)
                }
                "SEARCH" => {
                    let (ids, modseq) = parse_search_tail(lexer)?;
                    UntaggedResponse::Search { ids, modseq }
                }
                "ESEARCH" => UntaggedResponse::ExtendedSearch(parse_esearch_tail(lexer)?),
                "STATUS" => {
                    lexer.expect_space()?;
                    let (mailbox, items) = parse_status_body(lexer)?;
                    UntaggedResponse::Status { mailbox, items }
                }
                "VANISHED" => {
                    let (earlier, uids) = parse_vanished_tail(lexer)?;
                    UntaggedResponse::Vanished { earlier, uids }
                }
                "NAMESPACE" => {
                    lexer.expect_space()?;
                    UntaggedResponse::Namespace(parse_namespace_body(lexer)?)
                }
                "ID" => {
                    lexer.expect_space()?;
                    UntaggedResponse::Id(parse_id_body(lexer)?)
                }
                other => {
                    return Err(lexer.error(format!("unknown untagged response: {other}")));
                }
            },
            token => {
                return Err(lexer.error(format!("unexpected token after *: {token:?}")));
            }
        };

        Ok(Frame::Untagged(response))
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Result<Frame> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let text = read_text_until_crlf(lexer);
        Ok(Frame::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        })
    }

    /// Parses resp-text: an optional bracketed code, then verbatim text.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let text = read_text_until_crlf(lexer);

        Ok((code, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Capability, Flag, MailboxFlag, StatusItem};

    #[test]
    fn continuation_with_text() {
        let frame = ResponseParser::parse(b"+ Ready for literal data\r\n").unwrap();
        assert_eq!(
            frame,
            Frame::Continuation {
                text: Some("Ready for literal data".to_string())
            }
        );
    }

    #[test]
    fn bare_continuation() {
        let frame = ResponseParser::parse(b"+\r\n").unwrap();
        assert_eq!(frame, Frame::Continuation { text: None });
    }

    #[test]
    fn fetch_with_flags_and_uid() {
        let frame = ResponseParser::parse(b"* 23 FETCH (FLAGS (\\Seen) UID 4827313)\r\n").unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::Fetch { seq, attrs }) => {
                assert_eq!(seq, 23);
                assert!(matches!(&attrs[0], FetchAttr::Flags(f) if f.contains(&Flag::Seen)));
                assert!(matches!(attrs[1], FetchAttr::Uid(4_827_313)));
            }
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    #[test]
    fn list_with_delimiter() {
        let frame = ResponseParser::parse(b"* LIST (\\Noselect) \"/\" foo\r\n").unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::List(entry)) => {
                assert_eq!(entry.flags, vec![MailboxFlag::Noselect]);
                assert_eq!(entry.delimiter, Some('/'));
                assert_eq!(entry.name.as_str(), "foo");
            }
            other => panic!("expected LIST, got {other:?}"),
        }
    }

    #[test]
    fn list_inbox_canonicalizes() {
        let frame = ResponseParser::parse(b"* LIST (\\Marked) \"/\" iNbOx\r\n").unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::List(entry)) => {
                assert_eq!(entry.name.as_str(), "INBOX");
            }
            other => panic!("expected LIST, got {other:?}"),
        }
    }

    #[test]
    fn uidvalidity_is_unsigned() {
        let frame = ResponseParser::parse(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n").unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::State { status, code, text }) => {
                assert_eq!(status, Status::Ok);
                assert_eq!(code, Some(ResponseCode::UidValidity(3_857_529_045)));
                assert_eq!(text, "UIDs valid");
            }
            other => panic!("expected state response, got {other:?}"),
        }
    }

    #[test]
    fn vanished_earlier_ranges() {
        let frame =
            ResponseParser::parse(b"* VANISHED (EARLIER) 41,43:116,118,120:211\r\n").unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::Vanished { earlier, uids }) => {
                assert!(earlier);
                let pairs: Vec<(u32, u32)> =
                    uids.ranges().iter().map(|r| (r.lo, r.hi)).collect();
                assert_eq!(pairs, vec![(41, 41), (43, 116), (118, 118), (120, 211)]);
            }
            other => panic!("expected VANISHED, got {other:?}"),
        }
    }

    #[test]
    fn status_with_items() {
        let frame =
            ResponseParser::parse(b"* STATUS blurdybloop (MESSAGES 231 UIDNEXT 44292)\r\n")
                .unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::Status { mailbox, items }) => {
                assert_eq!(mailbox.as_str(), "blurdybloop");
                assert_eq!(
                    items,
                    vec![StatusItem::Messages(231), StatusItem::UidNext(44_292)]
                );
            }
            other => panic!("expected STATUS, got {other:?}"),
        }
    }

    #[test]
    fn fetch_literal_consumes_exact_octets() {
        let frame =
            ResponseParser::parse(b"* 1 FETCH (RFC822.HEADER {11}\r\nSubject: hi\r\n)\r\n");
        // The frame contains 11 literal octets ("Subject: hi"), then the
        // parenthesis and CRLF resume on the following line.
        match frame.unwrap() {
            Frame::Untagged(UntaggedResponse::Fetch { seq, attrs }) => {
                assert_eq!(seq, 1);
                match &attrs[0] {
                    FetchAttr::Rfc822Header(Some(data)) => assert_eq!(data, b"Subject: hi"),
                    other => panic!("expected header, got {other:?}"),
                }
            }
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    #[test]
    fn fetch_literal_including_crlf() {
        let frame =
            ResponseParser::parse(b"* 1 FETCH (RFC822.HEADER {13}\r\nSubject: hi\r\n)\r\n")
                .unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::Fetch { attrs, .. }) => match &attrs[0] {
                FetchAttr::Rfc822Header(Some(data)) => assert_eq!(data, b"Subject: hi\r\n"),
                other => panic!("expected header, got {other:?}"),
            },
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    #[test]
    fn empty_search() {
        let frame = ResponseParser::parse(b"* SEARCH\r\n").unwrap();
        assert_eq!(
            frame,
            Frame::Untagged(UntaggedResponse::Search {
                ids: vec![],
                modseq: None
            })
        );
    }

    #[test]
    fn search_with_modseq_trailer() {
        let frame = ResponseParser::parse(b"* SEARCH 2 5 6 (MODSEQ 917162500)\r\n").unwrap();
        assert_eq!(
            frame,
            Frame::Untagged(UntaggedResponse::Search {
                ids: vec![2, 5, 6],
                modseq: Some(917_162_500)
            })
        );
    }

    #[test]
    fn esearch_response() {
        let frame =
            ResponseParser::parse(b"* ESEARCH (TAG \"A282\") UID MIN 2 MAX 47 COUNT 25\r\n")
                .unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::ExtendedSearch(es)) => {
                assert_eq!(es.tag.as_deref(), Some("A282"));
                assert!(es.uid);
                assert_eq!(es.min, Some(2));
                assert_eq!(es.max, Some(47));
                assert_eq!(es.count, Some(25));
            }
            other => panic!("expected ESEARCH, got {other:?}"),
        }
    }

    #[test]
    fn enabled_response() {
        let frame = ResponseParser::parse(b"* ENABLED QRESYNC CONDSTORE\r\n").unwrap();
        assert_eq!(
            frame,
            Frame::Untagged(UntaggedResponse::Enabled(vec![
                Capability::QResync,
                Capability::CondStore
            ]))
        );
    }

    #[test]
    fn tagged_no_with_code() {
        let frame =
            ResponseParser::parse(b"A002 NO [TRYCREATE] No such mailbox\r\n").unwrap();
        match frame {
            Frame::Tagged {
                tag,
                status,
                code,
                text,
            } => {
                assert_eq!(tag.as_str(), "A002");
                assert_eq!(status, Status::No);
                assert_eq!(code, Some(ResponseCode::TryCreate));
                assert_eq!(text, "No such mailbox");
            }
            other => panic!("expected tagged, got {other:?}"),
        }
    }

    #[test]
    fn greeting_with_capability_code() {
        let frame = ResponseParser::parse(
            b"* OK [CAPABILITY IMAP4rev1 SASL-IR LITERAL+ ID ENABLE IDLE AUTH=PLAIN] ready\r\n",
        )
        .unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::State {
                code: Some(ResponseCode::Capability(caps)),
                ..
            }) => {
                assert!(caps.contains(&Capability::Imap4Rev1));
                assert!(caps.contains(&Capability::SaslIr));
                assert!(caps.contains(&Capability::LiteralPlus));
                assert!(caps.contains(&Capability::Auth("PLAIN".to_string())));
            }
            other => panic!("expected greeting, got {other:?}"),
        }
    }

    #[test]
    fn preauth_greeting() {
        let frame = ResponseParser::parse(b"* PREAUTH IMAP4rev1 server logged in as Smith\r\n")
            .unwrap();
        assert!(matches!(
            frame,
            Frame::Untagged(UntaggedResponse::PreAuth { .. })
        ));
    }

    #[test]
    fn bye_response() {
        let frame = ResponseParser::parse(b"* BYE Autologout; idle for too long\r\n").unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::Bye { code, text }) => {
                assert!(code.is_none());
                assert_eq!(text, "Autologout; idle for too long");
            }
            other => panic!("expected BYE, got {other:?}"),
        }
    }

    #[test]
    fn expunge_and_exists() {
        assert_eq!(
            ResponseParser::parse(b"* 44 EXPUNGE\r\n").unwrap(),
            Frame::Untagged(UntaggedResponse::Expunge(44))
        );
        assert_eq!(
            ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap(),
            Frame::Untagged(UntaggedResponse::Exists(23))
        );
        assert_eq!(
            ResponseParser::parse(b"* 3 RECENT\r\n").unwrap(),
            Frame::Untagged(UntaggedResponse::Recent(3))
        );
    }

    #[test]
    fn modseq_values_keep_64_bits() {
        let frame = ResponseParser::parse(
            b"* OK [HIGHESTMODSEQ 18446744073709551615] Highest\r\n",
        )
        .unwrap();
        match frame {
            Frame::Untagged(UntaggedResponse::State { code, .. }) => {
                assert_eq!(code, Some(ResponseCode::HighestModSeq(u64::MAX)));
            }
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let input = b"* 23 FETCH (FLAGS (\\Seen) UID 4827313)\r\n";
        let first = ResponseParser::parse(input).unwrap();
        let second = ResponseParser::parse(input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_frame_reports_position() {
        match ResponseParser::parse(b"* 23 BOGUS\r\n") {
            Err(Error::Parse { line, column, .. }) => {
                assert_eq!(line, 1);
                assert!(column > 1);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
