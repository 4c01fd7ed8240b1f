//! Persistent TCP stream binding
//!
//! Two modes, both configuration choices:
//! - single-socket: one bidirectional connection per worker, accepted on a
//!   shared port;
//! - legacy dual-port: two unidirectional connections per worker, one for
//!   each direction, on per-worker port pairs.
//!
//! Messages carry no length prefix. A receive is one `read` call, which
//! assumes the peer wrote one whole message since our last read. The round
//! barrier makes writes strictly alternate between the peers, so in this
//! protocol the assumption holds in practice; a fragmented large write or
//! two back-to-back writes would still coalesce or split, and that hazard
//! is part of the wire design, not something this binding rewrites.

use std::io::ErrorKind;
use std::net::IpAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::traits::{indexed_port, Session};
use crate::{NetError, Result, MAX_MESSAGE};

/// Bind a listener, retrying on `base + 1` and up while the port is taken.
///
/// Setup-time concern only; the retry is uncapped by design.
pub(crate) async fn bind_with_retry(ip: IpAddr, base: u16) -> Result<TcpListener> {
    let mut port = base;
    loop {
        match TcpListener::bind((ip, port)).await {
            Ok(listener) => {
                if port != base {
                    debug!(base, port, "port was taken, bound to a later one");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                port = port.wrapping_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn read_one(stream: &mut TcpStream) -> Result<String> {
    let mut buffer = vec![0u8; MAX_MESSAGE];
    let n = stream.read(&mut buffer).await?;
    if n == 0 {
        return Err(NetError::Closed);
    }
    buffer.truncate(n);
    Ok(String::from_utf8(buffer)?)
}

/// One bidirectional stream session.
pub struct StreamSession {
    stream: TcpStream,
}

#[async_trait::async_trait]
impl Session for StreamSession {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.stream.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        read_one(&mut self.stream).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Legacy dual-port session: one stream per direction.
pub struct DualPortSession {
    /// Coordinator→worker direction on the coordinator side is `tx`;
    /// the worker holds the mirrored pair.
    tx: TcpStream,
    rx: TcpStream,
}

#[async_trait::async_trait]
impl Session for DualPortSession {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.tx.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        read_one(&mut self.rx).await
    }

    async fn close(&mut self) -> Result<()> {
        self.tx.shutdown().await?;
        self.rx.shutdown().await?;
        Ok(())
    }
}

/// Accept `num_workers` single-socket sessions on a shared port.
pub async fn accept_workers(
    ip: IpAddr,
    base_port: u16,
    num_workers: usize,
) -> Result<Vec<Box<dyn Session>>> {
    let listener = bind_with_retry(ip, base_port).await?;
    info!(addr = %listener.local_addr()?, "stream transport listening");

    let mut sessions: Vec<Box<dyn Session>> = Vec::with_capacity(num_workers);
    for index in 0..num_workers {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, index, "worker connected");
        sessions.push(Box::new(StreamSession { stream }));
    }
    Ok(sessions)
}

/// Accept `num_workers` dual-port sessions, a listener pair per worker.
pub async fn accept_dual_port_workers(
    ip: IpAddr,
    in_base: u16,
    out_base: u16,
    num_workers: usize,
) -> Result<Vec<Box<dyn Session>>> {
    let mut listener_pairs = Vec::with_capacity(num_workers);
    for index in 0..num_workers {
        let to_worker = bind_with_retry(ip, indexed_port(in_base, index)?).await?;
        let from_worker = bind_with_retry(ip, indexed_port(out_base, index)?).await?;
        listener_pairs.push((to_worker, from_worker));
    }

    let mut sessions: Vec<Box<dyn Session>> = Vec::with_capacity(num_workers);
    for (index, (to_worker, from_worker)) in listener_pairs.into_iter().enumerate() {
        let (tx, _) = to_worker.accept().await?;
        let (rx, peer) = from_worker.accept().await?;
        info!(%peer, index, "worker connected on both ports");
        sessions.push(Box::new(DualPortSession { tx, rx }));
    }
    Ok(sessions)
}

/// Worker side of the single-socket mode.
pub async fn connect(coordinator: IpAddr, port: u16) -> Result<Box<dyn Session>> {
    let stream = TcpStream::connect((coordinator, port)).await?;
    Ok(Box::new(StreamSession { stream }))
}

/// Worker side of the dual-port mode; mirrors the coordinator's pair.
pub async fn connect_dual_port(
    coordinator: IpAddr,
    in_base: u16,
    out_base: u16,
    worker_index: usize,
) -> Result<Box<dyn Session>> {
    // rx carries coordinator→worker data, tx worker→coordinator.
    let rx = TcpStream::connect((coordinator, indexed_port(in_base, worker_index)?)).await?;
    let tx = TcpStream::connect((coordinator, indexed_port(out_base, worker_index)?)).await?;
    Ok(Box::new(DualPortSession { tx, rx }))
}
