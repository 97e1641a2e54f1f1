//! FETCH response parsing: message attributes, envelopes, and sections.

use crate::parser::lexer::{Lexer, Token};
use crate::Result;

use super::body::parse_body_structure;
use super::helpers::{parse_flag_list, skip_to_group_end};
use super::types::{Address, Envelope, FetchAttr, SectionSpec, SectionText};

/// Parses the parenthesized attribute list of a FETCH response.
///
/// Attribute keywords are dispatched via the dotted-atom lexer, so
/// `RFC822.HEADER` and `BODY` arrive as single tokens.
pub fn parse_fetch_attrs(lexer: &mut Lexer<'_>) -> Result<Vec<FetchAttr>> {
    lexer.expect(&Token::LParen)?;

    let mut attrs = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                let upper = name.to_ascii_uppercase();
                match upper.as_str() {
                    "FLAGS" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Flags(parse_flag_list(lexer)?));
                    }
                    "UID" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Uid(lexer.read_number()?));
                    }
                    "RFC822.SIZE" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Rfc822Size(lexer.read_number()?));
                    }
                    "INTERNALDATE" => {
                        lexer.expect_space()?;
                        match lexer.next_token()? {
                            Token::QuotedString(date) => {
                                attrs.push(FetchAttr::InternalDate(date));
                            }
                            token => {
                                return Err(lexer
                                    .error(format!("expected internal date, got {token:?}")));
                            }
                        }
                    }
                    "ENVELOPE" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Envelope(Box::new(parse_envelope(lexer)?)));
                    }
                    "MODSEQ" => {
                        lexer.expect_space()?;
                        lexer.expect(&Token::LParen)?;
                        let n = lexer.read_number64()?;
                        lexer.expect(&Token::RParen)?;
                        attrs.push(FetchAttr::ModSeq(n));
                    }
                    "RFC822" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Rfc822(read_data(lexer)?));
                    }
                    "RFC822.HEADER" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Rfc822Header(read_data(lexer)?));
                    }
                    "RFC822.TEXT" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::Rfc822Text(read_data(lexer)?));
                    }
                    "BODYSTRUCTURE" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::BodyStructure(Box::new(parse_body_structure(
                            lexer,
                        )?)));
                    }
                    "BODY" => {
                        if lexer.peek() == Some(b'[') {
                            let section = parse_section_spec(lexer)?;
                            let origin = parse_origin(lexer)?;
                            lexer.expect_space()?;
                            let data = read_data(lexer)?;
                            attrs.push(FetchAttr::BodySection {
                                section,
                                origin,
                                data,
                            });
                        } else {
                            lexer.expect_space()?;
                            attrs.push(FetchAttr::Body(Box::new(parse_body_structure(lexer)?)));
                        }
                    }
                    "X-GM-MSGID" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::GmMsgId(lexer.read_number64()?));
                    }
                    "X-GM-THRID" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::GmThrId(lexer.read_number64()?));
                    }
                    "X-GM-LABELS" => {
                        lexer.expect_space()?;
                        attrs.push(FetchAttr::GmLabels(parse_gm_labels(lexer)?));
                    }
                    _ => skip_unknown_value(lexer)?,
                }
            }
            token => {
                return Err(lexer.error(format!("unexpected token in FETCH: {token:?}")));
            }
        }
    }

    Ok(attrs)
}

/// Reads opaque payload bytes: a literal, a quoted string, or `NIL`.
fn read_data(lexer: &mut Lexer<'_>) -> Result<Option<Vec<u8>>> {
    match lexer.next_token()? {
        Token::Literal(data) => Ok(Some(data)),
        Token::QuotedString(s) => Ok(Some(s.into_bytes())),
        Token::Nil => Ok(None),
        token => Err(lexer.error(format!("expected message data, got {token:?}"))),
    }
}

/// Parses `[section]` after `BODY`.
fn parse_section_spec(lexer: &mut Lexer<'_>) -> Result<SectionSpec> {
    lexer.expect(&Token::LBracket)?;

    let mut spec = SectionSpec::default();

    // Part path: dotted 1-based numbers.
    while matches!(lexer.peek(), Some(b'0'..=b'9')) {
        let mut digits = String::new();
        while let Some(b @ b'0'..=b'9') = lexer.peek() {
            digits.push(b as char);
            lexer.advance();
        }
        let n = digits
            .parse()
            .map_err(|_| lexer.error("part number exceeds 32 bits"))?;
        spec.part.push(n);

        if lexer.peek() == Some(b'.') {
            lexer.advance();
        } else {
            break;
        }
    }

    if lexer.peek() != Some(b']') {
        let keyword = lexer.read_atom_str()?;
        spec.text = Some(match keyword.to_ascii_uppercase().as_str() {
            "HEADER" => SectionText::Header,
            "HEADER.FIELDS" => {
                lexer.expect_space()?;
                SectionText::HeaderFields(parse_header_list(lexer)?)
            }
            "HEADER.FIELDS.NOT" => {
                lexer.expect_space()?;
                SectionText::HeaderFieldsNot(parse_header_list(lexer)?)
            }
            "TEXT" => SectionText::Text,
            "MIME" => SectionText::Mime,
            other => {
                return Err(lexer.error(format!("unknown section keyword: {other}")));
            }
        });
    }

    lexer.expect(&Token::RBracket)?;
    Ok(spec)
}

fn parse_header_list(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    lexer.expect(&Token::LParen)?;
    let mut names = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => names.push(s.to_string()),
            Token::QuotedString(s) => names.push(s),
            Token::Literal(data) => {
                names.push(
                    String::from_utf8(data)
                        .map_err(|_| lexer.error("header name is not valid UTF-8"))?,
                );
            }
            token => {
                return Err(lexer.error(format!("unexpected token in header list: {token:?}")));
            }
        }
    }
    Ok(names)
}

/// Parses the `<origin>` suffix of a partial fetch response, if present.
fn parse_origin(lexer: &mut Lexer<'_>) -> Result<Option<u32>> {
    if lexer.peek() != Some(b'<') {
        return Ok(None);
    }
    lexer.advance();

    let mut digits = String::new();
    while let Some(b @ b'0'..=b'9') = lexer.peek() {
        digits.push(b as char);
        lexer.advance();
    }
    if lexer.advance() != Some(b'>') {
        return Err(lexer.error("expected > after origin"));
    }
    digits
        .parse()
        .map(Some)
        .map_err(|_| lexer.error("origin exceeds 32 bits"))
}

/// Parses a GMail label list: atoms (including backslash-prefixed ones),
/// strings, or `NIL` for no labels.
fn parse_gm_labels(lexer: &mut Lexer<'_>) -> Result<Vec<String>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut labels = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::Atom(s) => labels.push(s.to_string()),
                    Token::QuotedString(s) => labels.push(s),
                    Token::Literal(data) => {
                        labels.push(
                            String::from_utf8(data)
                                .map_err(|_| lexer.error("label is not valid UTF-8"))?,
                        );
                    }
                    token => {
                        return Err(lexer.error(format!("unexpected token in labels: {token:?}")));
                    }
                }
            }
            Ok(labels)
        }
        token => Err(lexer.error(format!("expected label list, got {token:?}"))),
    }
}

/// Skips the value of an unknown fetch attribute, whole token groups at a
/// time so strings containing parentheses cannot desynchronize the parser.
fn skip_unknown_value(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }
    match lexer.next_token()? {
        Token::LParen => skip_to_group_end(lexer),
        _ => Ok(()),
    }
}

/// Parses an envelope structure.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(&Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;
    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;
    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;
    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;
    let message_id = lexer.read_nstring()?;

    lexer.expect(&Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// Parses an address list; `NIL` decodes to the empty sequence.
fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => addresses.push(parse_address(lexer)?),
                    Some(b' ') => {
                        lexer.advance();
                    }
                    _ => return Err(lexer.error("malformed address list")),
                }
            }
            Ok(addresses)
        }
        token => Err(lexer.error(format!("expected address list, got {token:?}"))),
    }
}

fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(&Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;
    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;
    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;
    let host = lexer.read_nstring()?;

    lexer.expect(&Token::RParen)?;

    Ok(Address {
        name,
        adl,
        mailbox,
        host,
    })
}
