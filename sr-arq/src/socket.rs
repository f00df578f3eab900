//! Async UDP socket abstraction.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` that speaks
//! [`crate::packet::Packet`] instead of raw bytes.  All protocol logic lives
//! elsewhere; this module owns only byte I/O.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;

use crate::packet::{Packet, PacketError, PACKET_LEN};

/// Receive buffer size.  Larger than a packet so oversized datagrams are
/// reported as a length mismatch instead of being silently truncated.
const RECV_BUF: usize = 2 * PACKET_LEN;

/// Errors that can arise from socket operations.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("packet decode error: {0}")]
    Packet(#[from] PacketError),
}

/// An async, packet-oriented UDP socket.
///
/// All methods are `&self` so the socket can be shared across tasks if needed.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }

    /// Encode `packet` and send it as a single UDP datagram to `dest`.
    pub async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError> {
        self.inner.send_to(&packet.encode(), dest).await?;
        Ok(())
    }

    /// Receive the next datagram and decode it into a [`Packet`].
    ///
    /// Returns `(packet, sender_address)`.  Datagrams that fail to decode are
    /// returned as [`SocketError::Packet`]; the caller decides whether to
    /// keep reading.  This method is cancel-safe.
    pub async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError> {
        let mut buf = [0u8; RECV_BUF];
        let (n, addr) = self.inner.recv_from(&mut buf).await?;
        let packet = Packet::decode(&buf[..n])?;
        Ok((packet, addr))
    }

    /// Send raw bytes, bypassing the codec.
    pub async fn send_raw(&self, bytes: &[u8], dest: SocketAddr) -> Result<(), SocketError> {
        self.inner.send_to(bytes, dest).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn loopback() -> Socket {
        Socket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .expect("bind failed")
    }

    #[tokio::test]
    async fn packet_crosses_loopback() {
        let a = loopback().await;
        let b = loopback().await;

        let pkt = Packet::ack(4);
        a.send_to(&pkt, b.local_addr).await.unwrap();
        let (got, from) = b.recv_from().await.unwrap();
        assert_eq!(got, pkt);
        assert_eq!(from, a.local_addr);
    }

    #[tokio::test]
    async fn malformed_datagram_is_reported() {
        let a = loopback().await;
        let b = loopback().await;

        a.send_raw(b"short", b.local_addr).await.unwrap();
        let err = b.recv_from().await.unwrap_err();
        assert!(matches!(
            err,
            SocketError::Packet(PacketError::BufferTooShort(5))
        ));
    }
}
