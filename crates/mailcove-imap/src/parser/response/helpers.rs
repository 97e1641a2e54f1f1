//! Shared response-grammar pieces: response codes, flag and capability
//! lists, message sets, and the LIST/STATUS/SEARCH/NAMESPACE bodies.

use crate::parser::lexer::{Lexer, Token};
use crate::Result;
use crate::types::{
    Capability, ExtendedSearch, Flag, Flags, ListEntry, Mailbox, MailboxFlag, Namespace,
    Namespaces, ResponseCode, STAR, SeqRange, StatusItem, UidSet,
};

/// Parses a bracketed response code. The opening `[` has not been consumed.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(&Token::LBracket)?;

    let atom = lexer.read_atom_str()?;
    let upper = atom.to_ascii_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "CLOSED" => ResponseCode::Closed,
        "NOMODSEQ" => ResponseCode::NoModSeq,
        "UIDNOTSTICKY" => ResponseCode::UidNotSticky,
        "COMPRESSIONACTIVE" => ResponseCode::CompressionActive,
        "USEATTR" => ResponseCode::UseAttr,
        "UIDNEXT" => {
            lexer.expect_space()?;
            ResponseCode::UidNext(lexer.read_number()?)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            ResponseCode::UidValidity(lexer.read_number()?)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            ResponseCode::Unseen(lexer.read_number()?)
        }
        "HIGHESTMODSEQ" => {
            lexer.expect_space()?;
            ResponseCode::HighestModSeq(lexer.read_number64()?)
        }
        "BADCHARSET" => {
            let mut charsets = Vec::new();
            if lexer.peek() == Some(b' ') {
                lexer.advance();
                lexer.expect(&Token::LParen)?;
                loop {
                    match lexer.next_token()? {
                        Token::RParen => break,
                        Token::Space => {}
                        Token::Atom(s) => charsets.push(s.to_string()),
                        Token::QuotedString(s) => charsets.push(s),
                        token => {
                            return Err(
                                lexer.error(format!("unexpected token in BADCHARSET: {token:?}"))
                            );
                        }
                    }
                }
            }
            ResponseCode::BadCharset(charsets)
        }
        "CAPABILITY" => ResponseCode::Capability(parse_capability_list(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = parse_flag_list(lexer)?;
            ResponseCode::PermanentFlags(flags.into_iter().collect())
        }
        "MODIFIED" => {
            lexer.expect_space()?;
            ResponseCode::Modified(parse_uid_set(lexer)?)
        }
        "APPENDUID" => {
            lexer.expect_space()?;
            let uidvalidity = lexer.read_number()?;
            lexer.expect_space()?;
            let uid = lexer.read_number()?;
            ResponseCode::AppendUid(uidvalidity, uid)
        }
        "COPYUID" => {
            lexer.expect_space()?;
            let uidvalidity = lexer.read_number()?;
            lexer.expect_space()?;
            let source = parse_uid_set(lexer)?;
            lexer.expect_space()?;
            let dest = parse_uid_set(lexer)?;
            ResponseCode::CopyUid(uidvalidity, source, dest)
        }
        _ => {
            // Unknown code: capture its raw argument text verbatim.
            let mut tail = Vec::new();
            if lexer.peek() == Some(b' ') {
                lexer.advance();
                while let Some(b) = lexer.peek() {
                    if b == b']' {
                        break;
                    }
                    tail.push(b);
                    lexer.advance();
                }
            }
            let tail = if tail.is_empty() {
                None
            } else {
                Some(String::from_utf8_lossy(&tail).into_owned())
            };
            ResponseCode::Other(atom.to_string(), tail)
        }
    };

    lexer.expect(&Token::RBracket)?;
    Ok(code)
}

/// Parses space-separated capability tokens until `]`, CRLF, or frame end.
pub fn parse_capability_list(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Atom(s) => caps.push(Capability::parse(s)),
            Token::Nil => caps.push(Capability::parse("NIL")),
            token => {
                return Err(lexer.error(format!("unexpected token in capability list: {token:?}")));
            }
        }
    }
    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(&Token::LParen)?;

    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            Token::Nil => flags.insert(Flag::parse("NIL")),
            token => {
                return Err(lexer.error(format!("unexpected token in flag list: {token:?}")));
            }
        }
    }
    Ok(flags)
}

/// Parses a message set: ranges `lo:hi` or bare numbers joined by `,`,
/// with `*` decoding to [`STAR`].
pub fn parse_uid_set(lexer: &mut Lexer<'_>) -> Result<UidSet> {
    let mut set = UidSet::new();
    loop {
        let lo = parse_set_bound(lexer)?;
        let hi = if lexer.peek() == Some(b':') {
            lexer.advance();
            parse_set_bound(lexer)?
        } else {
            lo
        };
        set.push(SeqRange::new(lo, hi));

        if lexer.peek() == Some(b',') {
            lexer.advance();
        } else {
            break;
        }
    }
    Ok(set)
}

fn parse_set_bound(lexer: &mut Lexer<'_>) -> Result<u32> {
    if lexer.peek() == Some(b'*') {
        lexer.advance();
        return Ok(STAR);
    }

    let mut digits = String::new();
    while let Some(b @ b'0'..=b'9') = lexer.peek() {
        digits.push(b as char);
        lexer.advance();
    }
    if digits.is_empty() {
        return Err(lexer.error("expected number or * in message set"));
    }
    digits
        .parse()
        .map_err(|_| lexer.error("message set bound exceeds 32 bits"))
}

/// Parses the body of a LIST or LSUB response after the keyword.
pub fn parse_list_entry(lexer: &mut Lexer<'_>) -> Result<ListEntry> {
    lexer.expect(&Token::LParen)?;
    let mut flags = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => flags.push(MailboxFlag::parse(s)),
            token => {
                return Err(lexer.error(format!("unexpected token in LIST flags: {token:?}")));
            }
        }
    }

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => return Err(lexer.error(format!("expected delimiter, got {token:?}"))),
    };

    lexer.expect_space()?;
    let name = lexer.read_astring()?;

    Ok(ListEntry {
        flags,
        delimiter,
        name: Mailbox::new(name),
    })
}

/// Parses the tail of a SEARCH response: ids until CRLF or an optional
/// `(MODSEQ n)` trailer.
pub fn parse_search_tail(lexer: &mut Lexer<'_>) -> Result<(Vec<u32>, Option<u64>)> {
    let mut ids = Vec::new();
    let mut modseq = None;

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if lexer.peek() == Some(b'(') {
            lexer.expect(&Token::LParen)?;
            let keyword = lexer.read_atom_str()?;
            if !keyword.eq_ignore_ascii_case("MODSEQ") {
                return Err(lexer.error(format!("expected MODSEQ trailer, got {keyword}")));
            }
            lexer.expect_space()?;
            modseq = Some(lexer.read_number64()?);
            lexer.expect(&Token::RParen)?;
            break;
        }
        ids.push(lexer.read_number()?);
    }

    Ok((ids, modseq))
}

/// Parses the tail of an ESEARCH response (RFC 4731):
/// `[(TAG "t")] [UID] *(MIN n / MAX n / COUNT n / ALL set / MODSEQ n)`.
pub fn parse_esearch_tail(lexer: &mut Lexer<'_>) -> Result<ExtendedSearch> {
    let mut result = ExtendedSearch::default();

    while lexer.peek() == Some(b' ') {
        lexer.advance();

        if lexer.peek() == Some(b'(') {
            lexer.expect(&Token::LParen)?;
            let keyword = lexer.read_atom_str()?;
            if !keyword.eq_ignore_ascii_case("TAG") {
                return Err(lexer.error(format!("expected TAG correlator, got {keyword}")));
            }
            lexer.expect_space()?;
            result.tag = Some(lexer.read_astring()?);
            lexer.expect(&Token::RParen)?;
            continue;
        }

        let keyword = lexer.read_atom_str()?;
        match keyword.to_ascii_uppercase().as_str() {
            "UID" => result.uid = true,
            "MIN" => {
                lexer.expect_space()?;
                result.min = Some(lexer.read_number()?);
            }
            "MAX" => {
                lexer.expect_space()?;
                result.max = Some(lexer.read_number()?);
            }
            "COUNT" => {
                lexer.expect_space()?;
                result.count = Some(lexer.read_number()?);
            }
            "ALL" => {
                lexer.expect_space()?;
                result.all = Some(parse_uid_set(lexer)?);
            }
            "MODSEQ" => {
                lexer.expect_space()?;
                result.modseq = Some(lexer.read_number64()?);
            }
            other => {
                return Err(lexer.error(format!("unknown ESEARCH return item: {other}")));
            }
        }
    }

    Ok(result)
}

/// Parses the body of a STATUS response after the keyword.
pub fn parse_status_body(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<StatusItem>)> {
    let name = lexer.read_astring()?;
    lexer.expect_space()?;
    lexer.expect(&Token::LParen)?;

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(attr) => {
                lexer.expect_space()?;
                let item = match attr.to_ascii_uppercase().as_str() {
                    "MESSAGES" => StatusItem::Messages(lexer.read_number()?),
                    "RECENT" => StatusItem::Recent(lexer.read_number()?),
                    "UIDNEXT" => StatusItem::UidNext(lexer.read_number()?),
                    "UIDVALIDITY" => StatusItem::UidValidity(lexer.read_number()?),
                    "UNSEEN" => StatusItem::Unseen(lexer.read_number()?),
                    "HIGHESTMODSEQ" => StatusItem::HighestModSeq(lexer.read_number64()?),
                    _ => {
                        // Unknown attribute: consume its numeric value and move on.
                        let _ = lexer.read_number64()?;
                        continue;
                    }
                };
                items.push(item);
            }
            token => {
                return Err(lexer.error(format!("unexpected token in STATUS: {token:?}")));
            }
        }
    }

    Ok((Mailbox::new(name), items))
}

/// Parses the tail of a VANISHED response: optional `(EARLIER)` then a set.
pub fn parse_vanished_tail(lexer: &mut Lexer<'_>) -> Result<(bool, UidSet)> {
    lexer.expect_space()?;

    let mut earlier = false;
    if lexer.peek() == Some(b'(') {
        lexer.expect(&Token::LParen)?;
        let keyword = lexer.read_atom_str()?;
        if !keyword.eq_ignore_ascii_case("EARLIER") {
            return Err(lexer.error(format!("expected EARLIER, got {keyword}")));
        }
        lexer.expect(&Token::RParen)?;
        lexer.expect_space()?;
        earlier = true;
    }

    let uids = parse_uid_set(lexer)?;
    Ok((earlier, uids))
}

/// Parses the body of a NAMESPACE response: three nil-or-list groups.
pub fn parse_namespace_body(lexer: &mut Lexer<'_>) -> Result<Namespaces> {
    let personal = parse_namespace_group(lexer)?;
    lexer.expect_space()?;
    let other_users = parse_namespace_group(lexer)?;
    lexer.expect_space()?;
    let shared = parse_namespace_group(lexer)?;
    Ok(Namespaces {
        personal,
        other_users,
        shared,
    })
}

fn parse_namespace_group(lexer: &mut Lexer<'_>) -> Result<Vec<Namespace>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut namespaces = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::LParen => {
                        let prefix = lexer.read_astring()?;
                        lexer.expect_space()?;
                        let delimiter = lexer.read_nstring()?.and_then(|s| s.chars().next());
                        // Namespace extension data: skip to this entry's close.
                        skip_to_group_end(lexer)?;
                        namespaces.push(Namespace { prefix, delimiter });
                    }
                    token => {
                        return Err(
                            lexer.error(format!("unexpected token in NAMESPACE: {token:?}"))
                        );
                    }
                }
            }
            Ok(namespaces)
        }
        token => Err(lexer.error(format!("expected namespace group, got {token:?}"))),
    }
}

/// Parses the body of an ID response: `NIL` or a parenthesized list of
/// field/value pairs where values may be `NIL`.
pub fn parse_id_body(lexer: &mut Lexer<'_>) -> Result<Option<Vec<(String, Option<String>)>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::QuotedString(field) => {
                        lexer.expect_space()?;
                        let value = lexer.read_nstring()?;
                        params.push((field, value));
                    }
                    Token::Literal(data) => {
                        let field = String::from_utf8(data)
                            .map_err(|_| lexer.error("ID field is not valid UTF-8"))?;
                        lexer.expect_space()?;
                        let value = lexer.read_nstring()?;
                        params.push((field, value));
                    }
                    token => {
                        return Err(lexer.error(format!("unexpected token in ID: {token:?}")));
                    }
                }
            }
            Ok(Some(params))
        }
        token => Err(lexer.error(format!("expected ID params, got {token:?}"))),
    }
}

/// Consumes tokens until the enclosing group's `)` has been consumed.
///
/// The cursor must be inside a group opened by `(`; nested groups, strings,
/// and literals are skipped whole.
pub fn skip_to_group_end(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0u32;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Token::Eof | Token::Crlf => {
                return Err(lexer.error("frame ended inside a group"));
            }
            _ => {}
        }
    }
}

/// Captures the remaining human-readable text, stopping before CRLF.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());

    lexer.skip(end);
    if lexer.peek() == Some(b'\r') {
        lexer.skip(2);
    }

    String::from_utf8_lossy(&remaining[..end]).into_owned()
}
