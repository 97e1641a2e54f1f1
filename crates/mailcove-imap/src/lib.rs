//! # mailcove-imap
//!
//! An IMAP4rev1 (RFC 3501) client protocol core that speaks to real
//! servers — GMail included — over a caller-supplied TLS stream.
//!
//! ## What's inside
//!
//! - **Streaming response parser**: IMAP interleaves CRLF lines with
//!   length-prefixed literals; the framing layer reads line-by-line and
//!   octet-exact, the parser turns complete frames into typed values.
//! - **Session engine**: tagged command multiplexing with a runtime state
//!   machine (`Greeting → NotAuthenticated → Authenticated ⇄ Selected →
//!   Logout → Closed`, with terminal `Broken` on fatal errors),
//!   selected-mailbox tracking, and server-push delivery.
//! - **Typed data model**: envelopes, MIME body structures, flags,
//!   response codes, and UID sets.
//! - **Extensions**: CONDSTORE, QRESYNC, UIDPLUS, ESEARCH, ENABLE, IDLE,
//!   ID, NAMESPACE, COMPRESS=DEFLATE, LITERAL+/-, UTF8=ACCEPT, XLIST, and
//!   the GMail `X-GM-*` attributes.
//!
//! ## Quick start
//!
//! ```ignore
//! use mailcove_imap::{
//!     NoopHandler, Session, SelectParams, FetchItems, FetchRequest, UidSet,
//!     connection::{connect_tls, default_tls_config, TLS_PORT},
//! };
//!
//! #[tokio::main]
//! async fn main() -> mailcove_imap::Result<()> {
//!     let stream = connect_tls("imap.gmail.com", TLS_PORT, default_tls_config()).await?;
//!     let mut session = Session::connect(stream, Box::new(NoopHandler)).await?;
//!
//!     session.login("user@gmail.com", "app-password").await?;
//!     let mailbox = session.select("INBOX", SelectParams::none()).await?;
//!     println!("{} messages", mailbox.exists);
//!
//!     let mut stream = session
//!         .fetch(
//!             UidSet::range(1, 10),
//!             FetchItems::Attrs(vec![FetchRequest::Envelope, FetchRequest::Uid]),
//!         )
//!         .await?;
//!     while let Some(item) = stream.next().await {
//!         let (seq, attrs) = item?;
//!         println!("message {seq}: {} attributes", attrs.len());
//!     }
//!
//!     session.logout().await
//! }
//! ```
//!
//! ## Error model
//!
//! A tagged `NO` is a recoverable command failure; `BAD`, `BYE`, I/O and
//! parse errors, and unexpected continuations are fatal and move the
//! session to `Broken`. See [`Error::is_fatal`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod command;
pub mod connection;
mod error;
pub mod handler;
pub mod parser;
pub mod sasl;
pub mod types;

pub use command::{
    Command, FetchItems, FetchRequest, QresyncParams, SearchCriteria, SelectParams,
    StatusAttribute, StoreMode, TagSequence,
};
pub use connection::{
    AppendResult, CopyResult, ExpungeResult, FetchStream, IdleEvent, IdleHandle, Session,
    SessionState, StoreResult,
};
pub use error::{Error, Result};
pub use handler::{LoggingHandler, NoopHandler, ServerEventHandler};
pub use parser::{
    Address, BodyStructure, Envelope, FetchAttr, Frame, ResponseParser, SectionSpec, SectionText,
    UntaggedResponse,
};
pub use sasl::Mechanism;
pub use types::{
    Capability, Flag, Flags, ListEntry, Mailbox, MailboxAccess, MailboxFlag, ResponseCode,
    SearchResult, SelectedMailbox, Status, StatusItem, Tag, UidSet,
};
