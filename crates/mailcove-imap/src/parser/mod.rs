//! IMAP response parser.
//!
//! Sans-I/O: the framing layer assembles one complete frame (a CRLF line
//! plus any embedded literals, octet-exact) and hands it here; parsing
//! never consumes bytes beyond the frame. The two layers are:
//!
//! - [`lexer`]: byte-level tokenizer with `(line, column)` diagnostics
//! - [`response`]: response grammar producing typed [`Frame`]s
//!
//! # Example
//!
//! ```
//! use mailcove_imap::parser::{Frame, ResponseParser, UntaggedResponse};
//!
//! let frame = ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap();
//! assert_eq!(frame, Frame::Untagged(UntaggedResponse::Exists(23)));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{
    Address, BodyFields, BodyStructure, Envelope, FetchAttr, Frame, ResponseParser, SectionSpec,
    SectionText, UntaggedResponse,
};
