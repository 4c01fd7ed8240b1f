//! Raw-TCP-to-framed upgrade binding
//!
//! The worker opens a plain TCP connection and immediately performs the
//! RFC 6455 upgrade handshake; after the `101 Switching Protocols`
//! response both peers speak framed text messages. Frames follow the RFC's
//! base framing: FIN-only text frames, 7/16/64-bit payload lengths,
//! worker-to-coordinator frames masked, coordinator-to-worker frames not.

use std::net::IpAddr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::stream::bind_with_retry;
use crate::traits::Session;
use crate::{NetError, Result, MAX_MESSAGE};

const UPGRADE_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const OPCODE_TEXT: u8 = 0x1;
const OPCODE_CLOSE: u8 = 0x8;

/// Accept token for a given `Sec-WebSocket-Key` header value.
pub fn compute_accept(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(UPGRADE_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// One upgraded session over any byte stream.
///
/// `masked` selects the RFC's client role: the worker masks every frame it
/// sends, the coordinator sends unmasked frames.
pub struct FramedSession<T> {
    transport: T,
    masked: bool,
}

impl<T> FramedSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-upgraded byte stream.
    pub fn new(transport: T, masked: bool) -> Self {
        Self { transport, masked }
    }

    async fn write_frame(&mut self, opcode: u8, payload: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(payload.len() + 14);
        frame.push(0x80 | opcode);

        let mask_bit = if self.masked { 0x80 } else { 0x00 };
        match payload.len() {
            len if len < 126 => frame.push(mask_bit | len as u8),
            len if len <= u16::MAX as usize => {
                frame.push(mask_bit | 126);
                frame.extend_from_slice(&(len as u16).to_be_bytes());
            }
            len => {
                frame.push(mask_bit | 127);
                frame.extend_from_slice(&(len as u64).to_be_bytes());
            }
        }

        if self.masked {
            let key: [u8; 4] = rand::random();
            frame.extend_from_slice(&key);
            frame.extend(
                payload
                    .iter()
                    .enumerate()
                    .map(|(i, byte)| byte ^ key[i % 4]),
            );
        } else {
            frame.extend_from_slice(payload);
        }

        self.transport.write_all(&frame).await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.transport.read_exact(&mut header).await?;

        if header[0] & 0x80 == 0 {
            return Err(NetError::Frame("fragmented frames are not supported"));
        }
        let opcode = header[0] & 0x0f;
        match opcode {
            OPCODE_TEXT => {}
            OPCODE_CLOSE => return Err(NetError::Closed),
            _ => return Err(NetError::Frame("unexpected opcode")),
        }

        let masked = header[1] & 0x80 != 0;
        let length = match header[1] & 0x7f {
            126 => {
                let mut extended = [0u8; 2];
                self.transport.read_exact(&mut extended).await?;
                u16::from_be_bytes(extended) as u64
            }
            127 => {
                let mut extended = [0u8; 8];
                self.transport.read_exact(&mut extended).await?;
                u64::from_be_bytes(extended)
            }
            small => small as u64,
        };
        if length > MAX_MESSAGE as u64 {
            return Err(NetError::Frame("frame exceeds the message size limit"));
        }

        let key = if masked {
            let mut key = [0u8; 4];
            self.transport.read_exact(&mut key).await?;
            Some(key)
        } else {
            None
        };

        let mut payload = vec![0u8; length as usize];
        self.transport.read_exact(&mut payload).await?;
        if let Some(key) = key {
            for (i, byte) in payload.iter_mut().enumerate() {
                *byte ^= key[i % 4];
            }
        }
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl<T> Session for FramedSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, text: &str) -> Result<()> {
        self.write_frame(OPCODE_TEXT, text.as_bytes()).await
    }

    async fn recv(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.read_frame().await?)?)
    }

    async fn close(&mut self) -> Result<()> {
        self.write_frame(OPCODE_CLOSE, &[]).await?;
        self.transport.shutdown().await?;
        Ok(())
    }
}

/// Read an HTTP message head (request or response) up to the blank line.
async fn read_http_head<T>(transport: &mut T) -> Result<String>
where
    T: AsyncRead + Unpin,
{
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_MESSAGE {
            return Err(NetError::Handshake("upgrade request too large".into()));
        }
        transport.read_exact(&mut byte).await?;
        head.push(byte[0]);
    }
    String::from_utf8(head).map_err(Into::into)
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

async fn upgrade_server_side(stream: &mut TcpStream) -> Result<()> {
    let head = read_http_head(stream).await?;

    let upgrade = header_value(&head, "Upgrade")
        .ok_or_else(|| NetError::Handshake("missing Upgrade header".into()))?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(NetError::Handshake(format!(
            "unexpected Upgrade header {upgrade:?}"
        )));
    }
    let key = header_value(&head, "Sec-WebSocket-Key")
        .ok_or_else(|| NetError::Handshake("missing Sec-WebSocket-Key header".into()))?;

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        compute_accept(key)
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

async fn upgrade_client_side(stream: &mut TcpStream, host: &str) -> Result<()> {
    let nonce: [u8; 16] = rand::random();
    let key = BASE64.encode(nonce);
    let request = format!(
        "GET / HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await?;

    let head = read_http_head(stream).await?;
    let status = head.lines().next().unwrap_or("");
    if !status.contains("101") {
        return Err(NetError::Handshake(format!(
            "upgrade refused with {status:?}"
        )));
    }
    let accept = header_value(&head, "Sec-WebSocket-Accept")
        .ok_or_else(|| NetError::Handshake("missing Sec-WebSocket-Accept header".into()))?;
    if accept != compute_accept(&key) {
        return Err(NetError::Handshake("accept token mismatch".into()));
    }
    debug!("upgrade handshake complete");
    Ok(())
}

/// Accept and upgrade `num_workers` sessions on a shared port.
pub async fn accept_upgraded_workers(
    ip: IpAddr,
    base_port: u16,
    num_workers: usize,
) -> Result<Vec<Box<dyn Session>>> {
    let listener = bind_with_retry(ip, base_port).await?;
    info!(addr = %listener.local_addr()?, "framed transport listening");

    let mut sessions: Vec<Box<dyn Session>> = Vec::with_capacity(num_workers);
    for index in 0..num_workers {
        let (mut stream, peer) = listener.accept().await?;
        upgrade_server_side(&mut stream).await?;
        info!(%peer, index, "worker upgraded");
        sessions.push(Box::new(FramedSession::new(stream, false)));
    }
    Ok(sessions)
}

/// Worker side: connect, upgrade and return the masked session.
pub async fn connect_upgraded(coordinator: IpAddr, port: u16) -> Result<Box<dyn Session>> {
    connect_upgraded_to((coordinator, port), &format!("{coordinator}:{port}")).await
}

async fn connect_upgraded_to<A: ToSocketAddrs>(addr: A, host: &str) -> Result<Box<dyn Session>> {
    let mut stream = TcpStream::connect(addr).await?;
    upgrade_client_side(&mut stream, host).await?;
    Ok(Box::new(FramedSession::new(stream, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn accept_token_matches_the_rfc_worked_example() {
        assert_eq!(
            compute_accept("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let head = "GET / HTTP/1.1\r\nsec-websocket-key: abc\r\n\r\n";
        assert_eq!(header_value(head, "Sec-WebSocket-Key"), Some("abc"));
        assert_eq!(header_value(head, "Missing"), None);
    }

    #[tokio::test]
    async fn masked_and_unmasked_frames_round_trip() {
        let (client_io, server_io) = tokio::io::duplex(MAX_MESSAGE);
        let mut client = FramedSession::new(client_io, true);
        let mut server = FramedSession::new(server_io, false);

        client.send("READY").await.unwrap();
        assert_eq!(server.recv().await.unwrap(), "READY");

        server.send("1,0.9,1.1").await.unwrap();
        assert_eq!(client.recv().await.unwrap(), "1,0.9,1.1");
    }

    #[tokio::test]
    async fn extended_length_frames_round_trip() {
        let (client_io, server_io) = tokio::io::duplex(MAX_MESSAGE);
        let mut client = FramedSession::new(client_io, true);
        let mut server = FramedSession::new(server_io, false);

        // Forces the 16-bit length form.
        let long = "7;".repeat(300);
        client.send(&long).await.unwrap();
        assert_eq!(server.recv().await.unwrap(), long);
    }

    #[tokio::test]
    async fn close_frame_ends_the_session() {
        let (client_io, server_io) = tokio::io::duplex(MAX_MESSAGE);
        let mut client = FramedSession::new(client_io, true);
        let mut server = FramedSession::new(server_io, false);

        client.close().await.unwrap();
        assert!(matches!(server.recv().await, Err(NetError::Closed)));
    }

    #[tokio::test]
    async fn full_handshake_over_tcp() {
        let listener = bind_with_retry(LOOPBACK, 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = tokio::spawn(async move {
            let mut session = connect_upgraded(LOOPBACK, port).await.unwrap();
            session.send("READY").await.unwrap();
            session.recv().await.unwrap()
        });

        let (mut stream, _) = listener.accept().await.unwrap();
        upgrade_server_side(&mut stream).await.unwrap();
        let mut server = FramedSession::new(stream, false);
        assert_eq!(server.recv().await.unwrap(), "READY");
        server.send("end").await.unwrap();

        assert_eq!(client.await.unwrap(), "end");
    }
}
