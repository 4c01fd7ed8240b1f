//! Session trait and transport selection
//!
//! One [`Session`] is one coordinator↔worker conversation, whatever the
//! binding underneath. The coordinator opens all of its sessions up front
//! with [`open_coordinator`]; a worker opens its single session with
//! [`connect_worker`].

use std::net::IpAddr;
use std::str::FromStr;

use crate::{NetError, Result};

/// One bidirectional text-message conversation with a peer.
#[async_trait::async_trait]
pub trait Session: Send {
    /// Send one whole message.
    async fn send(&mut self, text: &str) -> Result<()>;

    /// Receive the next whole message (blocking until available).
    async fn recv(&mut self) -> Result<String>;

    /// Tear the session down.
    async fn close(&mut self) -> Result<()>;
}

/// Which binding a run uses; a configuration choice, fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Persistent TCP; `dual_port` selects the legacy two-unidirectional-
    /// connections-per-worker mode instead of one bidirectional stream.
    Stream {
        /// Legacy dual-port mode switch
        dual_port: bool,
    },
    /// Connectionless UDP, one socket per worker
    Datagram,
    /// Raw TCP upgraded to framed messages via the RFC 6455 handshake
    FramedUpgrade,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stream" => Ok(Self::Stream { dual_port: false }),
            "dual-stream" => Ok(Self::Stream { dual_port: true }),
            "datagram" => Ok(Self::Datagram),
            "framed" => Ok(Self::FramedUpgrade),
            other => Err(format!(
                "unknown transport {other:?} (expected stream, dual-stream, datagram or framed)"
            )),
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream { dual_port: false } => write!(f, "stream"),
            Self::Stream { dual_port: true } => write!(f, "dual-stream"),
            Self::Datagram => write!(f, "datagram"),
            Self::FramedUpgrade => write!(f, "framed"),
        }
    }
}

/// Port layout for a run.
///
/// `base` is the shared accept port (stream single-socket, framed) or the
/// first per-worker port (datagram, dual-port coordinator→worker side);
/// `out_base` is only used by the dual-port mode for the worker→coordinator
/// direction. Setup-time bind conflicts are retried on `base + 1` and up,
/// so the plan is a starting point, not a guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPlan {
    /// Primary port
    pub base: u16,
    /// Secondary port base (legacy dual-port mode only)
    pub out_base: u16,
}

impl PortPlan {
    /// Plan with a single primary port.
    pub fn single(base: u16) -> Self {
        Self {
            base,
            out_base: base,
        }
    }

    /// Plan with distinct directions for the legacy dual-port mode.
    pub fn dual(base: u16, out_base: u16) -> Self {
        Self { base, out_base }
    }
}

impl Default for PortPlan {
    fn default() -> Self {
        Self {
            base: 8081,
            out_base: 9090,
        }
    }
}

/// Open the coordinator side: bind, accept and (where the binding needs
/// it) upgrade exactly `num_workers` sessions, indexed in arrival order.
pub async fn open_coordinator(
    kind: TransportKind,
    ip: IpAddr,
    ports: PortPlan,
    num_workers: usize,
) -> Result<Vec<Box<dyn Session>>> {
    match kind {
        TransportKind::Stream { dual_port: false } => {
            crate::stream::accept_workers(ip, ports.base, num_workers).await
        }
        TransportKind::Stream { dual_port: true } => {
            crate::stream::accept_dual_port_workers(ip, ports.base, ports.out_base, num_workers)
                .await
        }
        TransportKind::Datagram => {
            crate::datagram::open_worker_sockets(ip, ports.base, num_workers).await
        }
        TransportKind::FramedUpgrade => {
            crate::framed::accept_upgraded_workers(ip, ports.base, num_workers).await
        }
    }
}

/// Open the worker side of session `worker_index` toward the coordinator.
pub async fn connect_worker(
    kind: TransportKind,
    coordinator: IpAddr,
    ports: PortPlan,
    worker_index: usize,
) -> Result<Box<dyn Session>> {
    match kind {
        TransportKind::Stream { dual_port: false } => {
            crate::stream::connect(coordinator, ports.base).await
        }
        TransportKind::Stream { dual_port: true } => {
            crate::stream::connect_dual_port(coordinator, ports.base, ports.out_base, worker_index)
                .await
        }
        TransportKind::Datagram => {
            crate::datagram::connect(coordinator, ports.base, worker_index).await
        }
        TransportKind::FramedUpgrade => {
            crate::framed::connect_upgraded(coordinator, ports.base).await
        }
    }
}

/// Map a worker index onto a per-worker port.
pub(crate) fn indexed_port(base: u16, index: usize) -> Result<u16> {
    u16::try_from(usize::from(base) + index).map_err(|_| {
        NetError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "per-worker port exceeds the u16 range",
        ))
    })
}
