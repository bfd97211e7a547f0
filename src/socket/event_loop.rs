//! The run-loop that hosts one session on a tokio task.
//!
//! 在 tokio 任务上承载单个会话的运行循环。
//!
//! All four entry points of the session (datagram arrival, input available,
//! output drained, timer tick) are dispatched from a single `select!`, so
//! each runs to completion before the next one starts.

use super::{conn::ChannelConn, traits::DatagramSocket};
use crate::{
    config::Config,
    core::{
        registry::{Registry, SessionId},
        session::Session,
        timer::RetransmitTimer,
    },
    error::{Error, Result},
};
use bytes::Bytes;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, trace, warn};

/// Size of the receive buffer. Larger than any valid unit, so oversized
/// datagrams are cut off here and then rejected as malformed.
const RECV_BUFFER_SIZE: usize = 2048;

/// Owns one session and feeds it events until both directions are done.
pub(crate) struct SessionDriver<S: DatagramSocket> {
    registry: Registry<ChannelConn<S>>,
    session_id: SessionId,
    timer: RetransmitTimer,
    socket: Arc<S>,
    peer: SocketAddr,
    input_rx: mpsc::Receiver<Bytes>,
    /// `None` once the peer's stream ended or the user stopped reading.
    output_tx: Option<mpsc::Sender<Bytes>>,
    config: Config,
}

impl<S: DatagramSocket> SessionDriver<S> {
    pub(crate) fn new(
        socket: Arc<S>,
        peer: SocketAddr,
        config: Config,
        input_rx: mpsc::Receiver<Bytes>,
        output_tx: mpsc::Sender<Bytes>,
    ) -> Result<Self> {
        let mut registry = Registry::new(config.clone())?;
        let conn = ChannelConn::new(
            socket.clone(),
            peer,
            config.connection.output_buffer_capacity,
        );
        let session_id = registry.create(conn);
        Ok(Self {
            registry,
            session_id,
            timer: RetransmitTimer::new(&config),
            socket,
            peer,
            input_rx,
            output_tx: Some(output_tx),
            config,
        })
    }

    fn session(&mut self) -> Result<&mut Session<ChannelConn<S>>> {
        self.registry.session_mut(self.session_id)
    }

    /// Runs the actor's main event loop.
    ///
    /// Returns when the session completed and the drain period passed, or
    /// with the first fatal error.
    ///
    /// 运行 actor 的主事件循环。
    pub(crate) async fn run(mut self) -> Result<()> {
        let id = self.session_id;
        let mut ticker = time::interval(self.timer.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut recv_buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut input_open = true;
        let mut pending_output: Option<Bytes> = None;
        let mut drain_deadline: Option<Instant> = None;

        info!(session = %id, peer = %self.peer, "Session driver started");

        loop {
            self.settle_output(&mut pending_output)?;

            if drain_deadline.is_none() && self.session()?.is_complete() {
                debug!(session = %id, "Both directions finished, draining");
                drain_deadline = Some(Instant::now() + self.config.connection.drain_timeout);
            }
            let input_room = input_open
                && self.session()?.conn().staged_input()
                    < self.config.connection.input_buffer_capacity;
            let output_tx = self.output_tx.as_ref();
            let has_output = pending_output.is_some() && output_tx.is_some();
            let pending = pending_output.clone();

            tokio::select! {
                // 1. Datagram arrival.
                // 1. 数据报到达。
                received = self.socket.recv_from(&mut recv_buf) => {
                    let (len, from) = match received {
                        Ok(received) => received,
                        Err(Error::Io(e)) if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
                        ) => {
                            trace!(error = %e, "Ignoring transient receive error");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    if from != self.peer {
                        trace!(addr = %from, "Ignoring datagram from unknown address");
                        continue;
                    }
                    self.session()?.on_receive(&recv_buf, len)?;
                }
                // 2. User input, only while there is room to stage it.
                // 2. 用户输入，仅在有暂存空间时接收。
                chunk = self.input_rx.recv(), if input_room => {
                    let session = self.session()?;
                    match chunk {
                        Some(data) => session.conn_mut().stage_input(&data),
                        None => {
                            debug!(session = %id, "Input closed by user");
                            input_open = false;
                            session.conn_mut().end_input();
                        }
                    }
                    session.on_input_ready()?;
                }
                // 3. Hand delivered bytes to the user.
                // 3. 将已交付的字节交给用户。
                sent = async move {
                    match (output_tx, pending) {
                        (Some(tx), Some(data)) => tx.send(data).await.is_ok(),
                        _ => std::future::pending().await,
                    }
                }, if has_output => {
                    if !sent {
                        debug!(session = %id, "Output receiver dropped, discarding output");
                        self.output_tx = None;
                    }
                    pending_output = None;
                    self.session()?.on_output_drained()?;
                }
                // 4. Retransmission timer tick.
                // 4. 重传定时器触发。
                _ = ticker.tick() => {
                    if let Some((failed, e)) = self.timer.fire(&mut self.registry).into_iter().next() {
                        warn!(session = %failed, error = %e, "Session failed during retransmission");
                        return Err(e);
                    }
                }
                // 5. Drain period over.
                // 5. 排空期结束。
                _ = time::sleep_until(drain_deadline.unwrap_or_else(Instant::now)), if drain_deadline.is_some() => {
                    break;
                }
            }
        }

        self.registry.destroy(id)?;
        info!(session = %id, "Session driver finished");
        Ok(())
    }

    /// Moves delivered bytes towards the user and closes the user's output
    /// channel once the peer's stream has ended and everything was handed over.
    fn settle_output(&mut self, pending_output: &mut Option<Bytes>) -> Result<()> {
        let discard = self.output_tx.is_none();
        let ended = {
            let session = self.session()?;
            if pending_output.is_none() {
                *pending_output = session.conn_mut().take_output();
            }
            if discard && pending_output.take().is_some() {
                session.on_output_drained()?;
            }
            session.conn().is_output_ended()
        };
        if ended && pending_output.is_none() && self.output_tx.is_some() {
            debug!(session = %self.session_id, "Peer stream ended, closing output");
            self.output_tx = None;
        }
        Ok(())
    }
}
