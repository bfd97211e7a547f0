//! Traits for abstracting over datagram socket implementations.
use crate::error::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// A datagram socket the session driver can run on.
///
/// Sending is synchronous and must not wait: the protocol engine sends from
/// inside its entry points. A send that would block is reported as an
/// `io::ErrorKind::WouldBlock` error. Receiving is asynchronous.
///
/// 会话驱动器可以运行于其上的数据报套接字。
///
/// 发送是同步的且不得等待；接收是异步的。
#[async_trait]
pub trait DatagramSocket: Send + Sync + 'static {
    /// Sends one datagram to the given address without blocking.
    fn try_send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize>;

    /// Receives a single datagram on the socket.
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;

    /// Returns the local address that this socket is bound to.
    fn local_addr(&self) -> Result<SocketAddr>;
}

#[async_trait]
impl DatagramSocket for UdpSocket {
    fn try_send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        UdpSocket::try_send_to(self, buf, target).map_err(Into::into)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await.map_err(Into::into)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        UdpSocket::local_addr(self).map_err(Into::into)
    }
}

/// A trait for datagram sockets that can be bound to a local address.
///
/// 可绑定到本地地址的数据报套接字 trait。
#[async_trait]
pub trait BindableSocket: DatagramSocket + Sized {
    /// Binds a new socket to the given address.
    /// 将新套接字绑定到给定地址。
    async fn bind(addr: SocketAddr) -> Result<Self>;
}

#[async_trait]
impl BindableSocket for UdpSocket {
    async fn bind(addr: SocketAddr) -> Result<Self> {
        UdpSocket::bind(addr).await.map_err(Into::into)
    }
}
