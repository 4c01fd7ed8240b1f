//! # ant-colony-net
//!
//! Transport bindings and wire codec for the ant-colony protocol.
//!
//! This crate provides:
//! - The unified [`Session`](traits::Session) trait the coordinator and
//!   workers exchange text messages through
//! - Three bindings: persistent TCP streams (single-socket and legacy
//!   dual-port), connectionless UDP datagrams, and a raw-TCP-to-framed
//!   upgrade handshake ([`stream`], [`datagram`], [`framed`])
//! - The `;`/`,`/space text encoding of problem data and per-round
//!   messages ([`protocol`])
//!
//! Messages carry no length prefix: the transport's message boundary is
//! assumed to equal the application's. That holds for datagrams and frames
//! by construction, and for streams because the round barrier strictly
//! alternates writes between the peers; the residual hazard (a fragmented
//! or coalesced stream read) is documented on the stream binding rather
//! than papered over with a wire-format change.

pub mod datagram;
pub mod framed;
pub mod protocol;
pub mod stream;
pub mod traits;

pub use traits::{connect_worker, open_coordinator, PortPlan, Session, TransportKind};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::protocol::*;
    pub use crate::traits::*;
}

/// Largest message any binding will read in one receive call.
pub const MAX_MESSAGE: usize = 65536;

/// Result type for transport operations
pub type Result<T> = core::result::Result<T, NetError>;

/// Transport error type
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Underlying socket failure
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The peer closed the session
    #[error("session closed by peer")]
    Closed,
    /// A received message was not valid UTF-8
    #[error("message is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The upgrade handshake could not be completed
    #[error("upgrade handshake failed: {0}")]
    Handshake(String),
    /// A frame violated the codec's expectations
    #[error("invalid frame: {0}")]
    Frame(&'static str),
    /// Datagram send attempted before the peer endpoint was learned
    #[error("datagram peer endpoint not yet established")]
    NoPeer,
    /// Malformed payload text
    #[error(transparent)]
    Wire(#[from] protocol::WireError),
}
