//! BODY / BODYSTRUCTURE parsing.
//!
//! Extension data (`body-ext-1part`, `body-ext-mpart`) must always parse —
//! including recursively nested multiparts that carry it — but only
//! multipart parameters are surfaced.

use crate::parser::lexer::{Lexer, Token};
use crate::Result;

use super::fetch::parse_envelope;
use super::helpers::skip_to_group_end;
use super::types::{BodyFields, BodyStructure};

/// Parses a complete `body` production, starting at its opening `(`.
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(&Token::LParen)?;

    if lexer.peek() == Some(b'(') {
        parse_multipart(lexer)
    } else {
        parse_one_part(lexer)
    }
}

/// `body-type-mpart`: one or more bodies, a subtype, then optional
/// extension data of which only the parameter list is retained.
fn parse_multipart(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    let mut children = Vec::new();
    while lexer.peek() == Some(b'(') {
        children.push(parse_body_structure(lexer)?);
    }

    lexer.expect_space()?;
    let subtype = read_string(lexer)?;

    let mut params = Vec::new();
    if lexer.peek() == Some(b' ') {
        lexer.advance();
        params = parse_body_params(lexer)?;
        // body-fld-dsp, body-fld-lang, body-fld-loc, and future extensions.
        skip_to_group_end(lexer)?;
    } else {
        lexer.expect(&Token::RParen)?;
    }

    Ok(BodyStructure::Multipart {
        children,
        subtype,
        params,
    })
}

/// `body-type-1part`: basic, message/rfc822, or text, with optional
/// extension data that is parsed and discarded.
fn parse_one_part(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    let media_type = read_string(lexer)?;
    lexer.expect_space()?;
    let subtype = read_string(lexer)?;
    lexer.expect_space()?;
    let fields = parse_body_fields(lexer)?;

    if media_type.eq_ignore_ascii_case("TEXT") {
        lexer.expect_space()?;
        let lines = lexer.read_number()?;
        skip_to_group_end(lexer)?;
        return Ok(BodyStructure::Text {
            subtype,
            fields,
            lines,
        });
    }

    if media_type.eq_ignore_ascii_case("MESSAGE") && subtype.eq_ignore_ascii_case("RFC822") {
        lexer.expect_space()?;
        let envelope = parse_envelope(lexer)?;
        lexer.expect_space()?;
        let body = parse_body_structure(lexer)?;
        lexer.expect_space()?;
        let lines = lexer.read_number()?;
        skip_to_group_end(lexer)?;
        return Ok(BodyStructure::Message {
            fields,
            envelope: Box::new(envelope),
            body: Box::new(body),
            lines,
        });
    }

    skip_to_group_end(lexer)?;
    Ok(BodyStructure::Basic {
        media_type,
        subtype,
        fields,
    })
}

/// `body-fields`: params, id, description, encoding, octets.
fn parse_body_fields(lexer: &mut Lexer<'_>) -> Result<BodyFields> {
    let params = parse_body_params(lexer)?;
    lexer.expect_space()?;
    let id = lexer.read_nstring()?;
    lexer.expect_space()?;
    let description = lexer.read_nstring()?;
    lexer.expect_space()?;
    let encoding = read_string(lexer)?;
    lexer.expect_space()?;
    let octets = lexer.read_number()?;

    Ok(BodyFields {
        params,
        id,
        description,
        encoding,
        octets,
    })
}

/// `body-fld-param`: `NIL` or a flat list of key/value string pairs,
/// preserving wire order.
pub(super) fn parse_body_params(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::QuotedString(key) => {
                        lexer.expect_space()?;
                        let value = read_string(lexer)?;
                        params.push((key, value));
                    }
                    Token::Literal(data) => {
                        let key = String::from_utf8(data)
                            .map_err(|_| lexer.error("parameter key is not valid UTF-8"))?;
                        lexer.expect_space()?;
                        let value = read_string(lexer)?;
                        params.push((key, value));
                    }
                    token => {
                        return Err(
                            lexer.error(format!("unexpected token in body params: {token:?}"))
                        );
                    }
                }
            }
            Ok(params)
        }
        token => Err(lexer.error(format!("expected body params, got {token:?}"))),
    }
}

/// Reads a string field: quoted or literal, tolerating `NIL` as empty.
fn read_string(lexer: &mut Lexer<'_>) -> Result<String> {
    match lexer.next_token()? {
        Token::QuotedString(s) => Ok(s),
        Token::Literal(data) => {
            String::from_utf8(data).map_err(|_| lexer.error("string is not valid UTF-8"))
        }
        Token::Nil => Ok(String::new()),
        token => Err(lexer.error(format!("expected string, got {token:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> BodyStructure {
        let mut lexer = Lexer::new(input);
        parse_body_structure(&mut lexer).unwrap()
    }

    #[test]
    fn simple_text_part() {
        let body = parse(b"(\"TEXT\" \"PLAIN\" (\"CHARSET\" \"US-ASCII\") NIL NIL \"7BIT\" 3028 92)");
        match body {
            BodyStructure::Text {
                subtype,
                fields,
                lines,
            } => {
                assert_eq!(subtype, "PLAIN");
                assert_eq!(fields.params, vec![("CHARSET".to_string(), "US-ASCII".to_string())]);
                assert_eq!(fields.encoding, "7BIT");
                assert_eq!(fields.octets, 3028);
                assert_eq!(lines, 92);
            }
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn text_part_with_extension_data() {
        // md5, disposition, language, location.
        let body = parse(
            b"(\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"QUOTED-PRINTABLE\" 1143 36 \
              NIL (\"INLINE\" NIL) NIL NIL)",
        );
        assert!(matches!(body, BodyStructure::Text { lines: 36, .. }));
    }

    #[test]
    fn basic_part() {
        let body = parse(
            b"(\"APPLICATION\" \"PDF\" (\"NAME\" \"report.pdf\") \"<part1>\" \"the report\" \"BASE64\" 102400)",
        );
        match body {
            BodyStructure::Basic {
                media_type,
                subtype,
                fields,
            } => {
                assert_eq!(media_type, "APPLICATION");
                assert_eq!(subtype, "PDF");
                assert_eq!(fields.id.as_deref(), Some("<part1>"));
                assert_eq!(fields.description.as_deref(), Some("the report"));
                assert_eq!(fields.octets, 102_400);
            }
            other => panic!("expected basic part, got {other:?}"),
        }
    }

    #[test]
    fn multipart_without_extensions() {
        let body = parse(
            b"((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 100 5)\
              (\"TEXT\" \"HTML\" NIL NIL NIL \"8BIT\" 500 20) \"ALTERNATIVE\")",
        );
        match body {
            BodyStructure::Multipart {
                children,
                subtype,
                params,
            } => {
                assert_eq!(children.len(), 2);
                assert_eq!(subtype, "ALTERNATIVE");
                assert!(params.is_empty());
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn multipart_params_are_observable() {
        let body = parse(
            b"((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 100 5) \"MIXED\" \
              (\"BOUNDARY\" \"=_boundary42\") NIL NIL)",
        );
        match body {
            BodyStructure::Multipart { params, .. } => {
                assert_eq!(
                    params,
                    vec![("BOUNDARY".to_string(), "=_boundary42".to_string())]
                );
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn nested_multipart_with_extensions_parses() {
        // A multipart/related with extension data nested inside a
        // multipart/mixed that also carries extension data.
        let body = parse(
            b"(((\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"7BIT\" 10 1)\
               (\"TEXT\" \"HTML\" (\"CHARSET\" \"UTF-8\") NIL NIL \"8BIT\" 20 2) \
               \"RELATED\" (\"BOUNDARY\" \"inner\") (\"INLINE\" NIL) NIL NIL)\
              (\"IMAGE\" \"PNG\" (\"NAME\" \"pixel.png\") NIL NIL \"BASE64\" 128) \
              \"MIXED\" (\"BOUNDARY\" \"outer\") NIL (\"EN\" \"DE\") NIL)",
        );
        match body {
            BodyStructure::Multipart {
                children,
                subtype,
                params,
            } => {
                assert_eq!(subtype, "MIXED");
                assert_eq!(params, vec![("BOUNDARY".to_string(), "outer".to_string())]);
                assert_eq!(children.len(), 2);
                match &children[0] {
                    BodyStructure::Multipart {
                        children, subtype, params,
                    } => {
                        assert_eq!(subtype, "RELATED");
                        assert_eq!(params, &vec![("BOUNDARY".to_string(), "inner".to_string())]);
                        assert_eq!(children.len(), 2);
                    }
                    other => panic!("expected nested multipart, got {other:?}"),
                }
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn message_rfc822_part() {
        let body = parse(
            b"(\"MESSAGE\" \"RFC822\" NIL NIL NIL \"7BIT\" 3000 \
              (\"Mon, 7 Feb 1994 21:52:25 -0800\" \"forwarded\" NIL NIL NIL NIL NIL NIL NIL NIL) \
              (\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 2000 60) 80)",
        );
        match body {
            BodyStructure::Message {
                envelope,
                body,
                lines,
                ..
            } => {
                assert_eq!(envelope.subject.as_deref(), Some("forwarded"));
                assert!(matches!(*body, BodyStructure::Text { .. }));
                assert_eq!(lines, 80);
            }
            other => panic!("expected message part, got {other:?}"),
        }
    }
}
