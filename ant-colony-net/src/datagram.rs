//! Connectionless UDP binding
//!
//! One socket per worker on the coordinator side. Datagrams carry no
//! session identity, so each session records its peer endpoint from the
//! first datagram it sees (the worker's `READY`) and validates every later
//! datagram against that mapping; foreign datagrams are skipped with a
//! warning rather than failing the session.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::traits::{indexed_port, Session};
use crate::{NetError, Result, MAX_MESSAGE};

/// One UDP session, pinned to a single peer endpoint once it is known.
pub struct DatagramSession {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
}

impl DatagramSession {
    /// Session that learns its peer from the first datagram.
    pub fn unpinned(socket: UdpSocket) -> Self {
        Self { socket, peer: None }
    }

    /// Session with a known peer (the worker side).
    pub fn pinned(socket: UdpSocket, peer: SocketAddr) -> Self {
        Self {
            socket,
            peer: Some(peer),
        }
    }
}

#[async_trait::async_trait]
impl Session for DatagramSession {
    async fn send(&mut self, text: &str) -> Result<()> {
        let peer = self.peer.ok_or(NetError::NoPeer)?;
        self.socket.send_to(text.as_bytes(), peer).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        let mut buffer = vec![0u8; MAX_MESSAGE];
        loop {
            let (n, source) = self.socket.recv_from(&mut buffer).await?;
            match self.peer {
                None => {
                    self.peer = Some(source);
                    info!(peer = %source, "datagram session endpoint established");
                }
                Some(expected) if expected != source => {
                    warn!(%source, %expected, "skipping datagram from unexpected endpoint");
                    continue;
                }
                Some(_) => {}
            }
            return Ok(String::from_utf8(buffer[..n].to_vec())?);
        }
    }

    async fn close(&mut self) -> Result<()> {
        // UDP sockets have nothing to tear down; dropping releases the port.
        Ok(())
    }
}

/// Coordinator side: one socket per worker at `base_port + index`, with the
/// same bind-retry rule as the stream listener.
pub async fn open_worker_sockets(
    ip: IpAddr,
    base_port: u16,
    num_workers: usize,
) -> Result<Vec<Box<dyn Session>>> {
    let mut sessions: Vec<Box<dyn Session>> = Vec::with_capacity(num_workers);
    for index in 0..num_workers {
        let socket = bind_udp_with_retry(ip, indexed_port(base_port, index)?).await?;
        info!(addr = %socket.local_addr()?, index, "datagram transport listening");
        sessions.push(Box::new(DatagramSession::unpinned(socket)));
    }
    Ok(sessions)
}

/// Worker side: ephemeral local socket pinned to the coordinator's
/// per-worker endpoint.
pub async fn connect(
    coordinator: IpAddr,
    base_port: u16,
    worker_index: usize,
) -> Result<Box<dyn Session>> {
    let local: IpAddr = if coordinator.is_ipv4() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
    };
    let socket = UdpSocket::bind((local, 0)).await?;
    let peer = SocketAddr::new(coordinator, indexed_port(base_port, worker_index)?);
    Ok(Box::new(DatagramSession::pinned(socket, peer)))
}

async fn bind_udp_with_retry(ip: IpAddr, base: u16) -> Result<UdpSocket> {
    let mut port = base;
    loop {
        match UdpSocket::bind((ip, port)).await {
            Ok(socket) => return Ok(socket),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                port = port.wrapping_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    }
}
