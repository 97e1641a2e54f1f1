//! Server capabilities and completion status.

/// Status of a tagged completion or state response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
}

impl Status {
    /// Returns true if this is a successful completion.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Server capability.
///
/// Every registered capability this client understands has its own variant;
/// anything else decodes to [`Capability::Other`] so the parser never rejects
/// an unknown token in this position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501).
    Imap4Rev1,
    /// AUTH mechanism, e.g. `AUTH=PLAIN`.
    Auth(String),
    /// STARTTLS support.
    StartTls,
    /// LOGIN command disabled (usually before STARTTLS).
    LoginDisabled,
    /// IDLE (RFC 2177).
    Idle,
    /// NAMESPACE (RFC 2342).
    Namespace,
    /// ID (RFC 2971).
    Id,
    /// ENABLE (RFC 5161).
    Enable,
    /// UIDPLUS (RFC 4315).
    UidPlus,
    /// CONDSTORE (RFC 7162).
    CondStore,
    /// QRESYNC (RFC 7162).
    QResync,
    /// ESEARCH (RFC 4731).
    Esearch,
    /// `LITERAL+` non-synchronizing literals (RFC 7888).
    LiteralPlus,
    /// `LITERAL-` bounded non-synchronizing literals (RFC 7888).
    LiteralMinus,
    /// SASL initial response on the AUTHENTICATE line (RFC 4959).
    SaslIr,
    /// `UTF8=ACCEPT` (RFC 6855).
    Utf8Accept,
    /// `COMPRESS=DEFLATE` (RFC 4978).
    CompressDeflate,
    /// XLIST (pre-RFC 6154 GMail/Apple folder listing).
    XList,
    /// `X-GM-EXT-1` (GMail labels, message and thread ids).
    XGmExt1,
    /// Any capability not otherwise known.
    Other(String),
}

impl Capability {
    /// Parses a capability token, ASCII-case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "IDLE" => Self::Idle,
            "NAMESPACE" => Self::Namespace,
            "ID" => Self::Id,
            "ENABLE" => Self::Enable,
            "UIDPLUS" => Self::UidPlus,
            "CONDSTORE" => Self::CondStore,
            "QRESYNC" => Self::QResync,
            "ESEARCH" => Self::Esearch,
            "LITERAL+" => Self::LiteralPlus,
            "LITERAL-" => Self::LiteralMinus,
            "SASL-IR" => Self::SaslIr,
            "UTF8=ACCEPT" => Self::Utf8Accept,
            "COMPRESS=DEFLATE" => Self::CompressDeflate,
            "XLIST" => Self::XList,
            "X-GM-EXT-1" => Self::XGmExt1,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ => Self::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Idle => write!(f, "IDLE"),
            Self::Namespace => write!(f, "NAMESPACE"),
            Self::Id => write!(f, "ID"),
            Self::Enable => write!(f, "ENABLE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::QResync => write!(f, "QRESYNC"),
            Self::Esearch => write!(f, "ESEARCH"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::LiteralMinus => write!(f, "LITERAL-"),
            Self::SaslIr => write!(f, "SASL-IR"),
            Self::Utf8Accept => write!(f, "UTF8=ACCEPT"),
            Self::CompressDeflate => write!(f, "COMPRESS=DEFLATE"),
            Self::XList => write!(f, "XLIST"),
            Self::XGmExt1 => write!(f, "X-GM-EXT-1"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}
