//! SASL response construction.
//!
//! Only the string building lives here: PLAIN (RFC 4616), the legacy LOGIN
//! mechanism's stepwise responses, and XOAUTH2 (GMail/Outlook). The
//! continuation exchange itself is driven by the session.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Credentials for the supported SASL mechanisms.
#[derive(Clone)]
pub enum Mechanism {
    /// PLAIN: authorization-id is left empty.
    Plain {
        /// Authentication username.
        username: String,
        /// Password.
        password: String,
    },
    /// LOGIN: username and password sent in separate continuation steps.
    Login {
        /// Authentication username.
        username: String,
        /// Password.
        password: String,
    },
    /// XOAUTH2: bearer-token authentication.
    XOAuth2 {
        /// Account email address.
        username: String,
        /// OAuth2 access token.
        access_token: String,
    },
}

impl Mechanism {
    /// The mechanism name as sent on the AUTHENTICATE line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Plain { .. } => "PLAIN",
            Self::Login { .. } => "LOGIN",
            Self::XOAuth2 { .. } => "XOAUTH2",
        }
    }

    /// The initial response, for servers advertising SASL-IR.
    ///
    /// LOGIN has no initial response; its first message answers the
    /// server's username prompt.
    #[must_use]
    pub fn initial_response(&self) -> Option<String> {
        match self {
            Self::Plain { username, password } => Some(plain_response(username, password)),
            Self::Login { .. } => None,
            Self::XOAuth2 {
                username,
                access_token,
            } => Some(xoauth2_response(username, access_token)),
        }
    }

    /// The response to the `step`-th continuation prompt (0-based).
    ///
    /// Returns `None` when the mechanism has nothing left to say; the
    /// session then sends an empty line.
    #[must_use]
    pub fn continuation_response(&self, step: usize) -> Option<String> {
        match (self, step) {
            (Self::Plain { username, password }, 0) => Some(plain_response(username, password)),
            (Self::Login { username, .. }, 0) => Some(STANDARD.encode(username.as_bytes())),
            (Self::Login { password, .. }, 1) => Some(STANDARD.encode(password.as_bytes())),
            (
                Self::XOAuth2 {
                    username,
                    access_token,
                },
                0,
            ) => Some(xoauth2_response(username, access_token)),
            // An extra prompt after XOAUTH2 carries a base64 JSON error;
            // the empty reply elicits the tagged NO.
            _ => None,
        }
    }
}

impl std::fmt::Debug for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials stay out of debug output.
        f.debug_struct("Mechanism").field("name", &self.name()).finish()
    }
}

/// Builds the PLAIN initial response: base64 of `\0user\0password`.
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    STANDARD.encode(format!("\0{username}\0{password}").as_bytes())
}

/// Builds the XOAUTH2 initial response:
/// base64 of `user=<user>\x01auth=Bearer <token>\x01\x01`.
#[must_use]
pub fn xoauth2_response(username: &str, access_token: &str) -> String {
    STANDARD.encode(format!("user={username}\x01auth=Bearer {access_token}\x01\x01").as_bytes())
}
