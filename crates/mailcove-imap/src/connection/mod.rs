//! Connection engine.
//!
//! - [`framed`]: frame assembly (lines + exact literal octets) and the
//!   DEFLATE rewiring point
//! - [`stream`]: the TLS/plaintext stream collaborator
//! - [`session`]: the state machine and command façade
//! - [`fetch_stream`]: lazy FETCH result sequences
//! - [`idle`]: IDLE entry, event delivery, and `DONE`

mod fetch_stream;
mod framed;
mod idle;
mod session;
mod stream;

pub use fetch_stream::FetchStream;
pub use framed::FramedStream;
pub use idle::{IdleEvent, IdleHandle};
pub use session::{
    AppendResult, CommandOutcome, CopyResult, ExpungeResult, Session, SessionState, StoreResult,
};
pub use stream::{
    ImapStream, PLAIN_PORT, TLS_PORT, connect_plain, connect_tls, default_tls_config,
};
