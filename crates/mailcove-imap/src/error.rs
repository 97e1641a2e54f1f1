//! Error types for the IMAP client core.
//!
//! The taxonomy distinguishes recoverable command failures (a tagged `NO`,
//! an API misuse caught before touching the wire) from failures that leave
//! the connection unusable. [`Error::is_fatal`] is the single classifier the
//! session consults when deciding whether to transition to `Broken`.

use thiserror::Error;

use crate::connection::SessionState;
use crate::types::ResponseCode;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on the underlying stream. The connection is unusable.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption failure at connect time.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Malformed server response. The connection is unusable.
    #[error("Protocol parse error at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line within the offending frame.
        line: u32,
        /// 1-based column within that line.
        column: u32,
        /// Description of what went wrong.
        message: String,
    },

    /// The server completed the command with `NO`. The connection remains
    /// usable; the failure is semantic (mailbox missing, permission denied).
    #[error("Server returned NO: {text}")]
    No {
        /// Response code attached to the completion, if any.
        code: Option<ResponseCode>,
        /// Human-readable server text.
        text: String,
    },

    /// The server completed the command with `BAD` (client bug or
    /// unsupported syntax). The connection is treated as broken.
    #[error("Server returned BAD: {text}")]
    Bad {
        /// Response code attached to the completion, if any.
        code: Option<ResponseCode>,
        /// Human-readable server text.
        text: String,
    },

    /// The server initiated shutdown with `BYE`.
    #[error("Server sent BYE: {text}")]
    Bye {
        /// Response code attached to the BYE, if any.
        code: Option<ResponseCode>,
        /// Human-readable server text.
        text: String,
    },

    /// A `+` continuation arrived outside a literal or SASL exchange.
    #[error("Unexpected continuation request")]
    UnexpectedContinuation,

    /// API misuse: the operation is not valid in the current session state.
    /// Nothing was written to the wire.
    #[error("Invalid session state: expected {expected}, connection is {actual}")]
    State {
        /// State the operation requires.
        expected: &'static str,
        /// State the session is actually in.
        actual: SessionState,
    },

    /// Protocol violation that fits no more specific variant.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true if this error leaves the connection unusable.
    ///
    /// Fatal errors move the session to the terminal `Broken` state; the
    /// only escape hatch afterwards is dropping the session.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::No { .. } | Self::State { .. })
    }

    pub(crate) fn parse_at(input: &[u8], pos: usize, message: impl Into<String>) -> Self {
        let pos = pos.min(input.len());
        let mut line = 1u32;
        let mut column = 1u32;
        for &b in &input[..pos] {
            if b == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Result type alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_is_recoverable() {
        let err = Error::No {
            code: None,
            text: "mailbox does not exist".to_string(),
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn state_is_recoverable() {
        let err = Error::State {
            expected: "Selected",
            actual: SessionState::Authenticated,
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn bad_and_bye_are_fatal() {
        let bad = Error::Bad {
            code: None,
            text: "syntax error".to_string(),
        };
        let bye = Error::Bye {
            code: None,
            text: "shutting down".to_string(),
        };
        assert!(bad.is_fatal());
        assert!(bye.is_fatal());
    }

    #[test]
    fn parse_position_counts_lines_and_columns() {
        let input = b"* 1 FETCH (RFC822 {3}\r\nabc MORE\r\n";
        // Position of 'M' in "MORE": after the embedded literal line break.
        let pos = input.iter().position(|&b| b == b'M').unwrap();
        match Error::parse_at(input, pos, "boom") {
            Error::Parse { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 5);
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}
