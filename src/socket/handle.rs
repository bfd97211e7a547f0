//! The user-facing API: a reliable byte stream to a single peer.
//!
//! 面向用户的 API：到单个对端的可靠字节流。

use super::{
    event_loop::SessionDriver,
    traits::{BindableSocket, DatagramSocket},
};
use crate::{
    config::Config,
    error::{Error, Result},
};
use bytes::Bytes;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::UdpSocket, sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

/// A handle to a session running on its own tokio task.
///
/// Bytes passed to [`ReliableStream::send`] reach the peer exactly once and
/// in order; [`ReliableStream::recv`] yields what the peer sent and returns
/// `None` once the peer finished its side.
///
/// 在独立 tokio 任务上运行的会话的句柄。
pub struct ReliableStream {
    input_tx: Option<mpsc::Sender<Bytes>>,
    output_rx: mpsc::Receiver<Bytes>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    driver: JoinHandle<Result<()>>,
}

impl ReliableStream {
    /// Binds a UDP socket to `local` and starts a session with `peer`.
    ///
    /// 将 UDP 套接字绑定到 `local` 并与 `peer` 建立会话。
    pub async fn bind(local: SocketAddr, peer: SocketAddr, config: Config) -> Result<Self> {
        let socket = <UdpSocket as BindableSocket>::bind(local).await?;
        Self::connect(socket, peer, config)
    }

    /// Starts a session with `peer` over an already bound socket.
    ///
    /// Both ends are assumed to be set up by the caller; no handshake is sent.
    ///
    /// 在已绑定的套接字上与 `peer` 建立会话。
    pub fn connect<S: DatagramSocket>(socket: S, peer: SocketAddr, config: Config) -> Result<Self> {
        // Checked before the channels are sized from it.
        config.validate()?;
        let local_addr = socket.local_addr()?;
        let (input_tx, input_rx) = mpsc::channel(config.connection.channel_capacity);
        let (output_tx, output_rx) = mpsc::channel(config.connection.channel_capacity);

        let driver = SessionDriver::new(Arc::new(socket), peer, config, input_rx, output_tx)?;
        let driver = tokio::spawn(driver.run());
        info!(local = %local_addr, peer = %peer, "Reliable stream started");

        Ok(Self {
            input_tx: Some(input_tx),
            output_rx,
            local_addr,
            peer_addr: peer,
            driver,
        })
    }

    /// Queues bytes for the peer. Waits while the session's input is full.
    ///
    /// 将字节排队发往对端。会话输入已满时等待。
    pub async fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        let data = data.into();
        if data.is_empty() {
            return Ok(());
        }
        let tx = self.input_tx.as_ref().ok_or(Error::ChannelClosed)?;
        tx.send(data).await.map_err(|_| Error::ChannelClosed)
    }

    /// Ends this side of the stream. The peer sees end-of-stream after the
    /// bytes already sent.
    ///
    /// 结束本端的流。
    pub fn finish(&mut self) {
        if self.input_tx.take().is_some() {
            debug!(peer = %self.peer_addr, "Finishing local stream");
        }
    }

    /// Next chunk from the peer, or `None` at end of stream.
    ///
    /// 对端的下一块数据，流结束时返回 `None`。
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.output_rx.recv().await
    }

    /// Collects everything the peer sends until its stream ends.
    pub async fn read_to_end(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = self.recv().await {
            out.extend_from_slice(&chunk);
        }
        out
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Finishes this side and waits for the session to complete.
    ///
    /// Output not read yet is discarded.
    ///
    /// 结束本端并等待会话完成。
    pub async fn join(mut self) -> Result<()> {
        self.finish();
        drop(self.output_rx);
        self.driver.await.map_err(|_| Error::ChannelClosed)?
    }
}
