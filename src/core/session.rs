//! One logical connection: the codec, both state machines and the host's
//! connection handle, behind the four entry points a run-loop dispatches.
//!
//! 一个逻辑连接：编解码器、两个状态机和宿主的连接句柄，
//! 通过运行循环分派的四个入口点对外提供。

use super::{
    receiver::{Acceptance, Delivery, ReceiveState},
    registry::SessionId,
    sender::{AckOutcome, SendState},
    traits::ConnHandle,
};
use crate::{
    config::Config,
    error::{Error, Result},
    packet::Unit,
};
use bytes::Bytes;
use tracing::{debug, trace};

/// The reliability engine for a single connection.
///
/// Every entry point runs to completion without blocking. An `Err` is fatal
/// for this session (the transport could not take a whole unit) and it is up
/// to the host to drop the session or stop.
///
/// 单个连接的可靠性引擎。
#[derive(Debug)]
pub struct Session<C> {
    id: SessionId,
    conn: C,
    sender: SendState,
    receiver: ReceiveState,
    max_payload: usize,
    reack_duplicates: bool,
}

impl<C: ConnHandle> Session<C> {
    /// Creates a session over `conn`. Nothing is sent until an entry point runs.
    ///
    /// `config` must already have passed [`Config::validate`]; sessions are
    /// created through [`Registry::create`](super::registry::Registry::create).
    ///
    /// 在 `conn` 之上创建一个会话。
    pub(crate) fn new(id: SessionId, conn: C, config: &Config) -> Self {
        Self {
            id,
            conn,
            sender: SendState::new(),
            receiver: ReceiveState::new(),
            max_payload: config.connection.max_payload_size,
            reack_duplicates: config.reliability.reack_duplicates,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn conn(&self) -> &C {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn sender(&self) -> &SendState {
        &self.sender
    }

    pub fn receiver(&self) -> &ReceiveState {
        &self.receiver
    }

    /// Both directions are done: our teardown was acknowledged and the
    /// peer's teardown reached the output sink.
    ///
    /// 两个方向都已完成。
    pub fn is_complete(&self) -> bool {
        self.sender.is_finished() && self.receiver.is_end_delivered()
    }

    /// Gives the connection handle back, abandoning any outstanding unit.
    pub fn into_conn(self) -> C {
        self.conn
    }

    /// Entry point: a datagram arrived whole.
    pub fn on_datagram(&mut self, datagram: &[u8]) -> Result<()> {
        self.on_receive(datagram, datagram.len())
    }

    /// Entry point: `received` bytes arrived in `buf`.
    ///
    /// Invalid units are dropped without a trace beyond the log. For a valid
    /// unit the acknowledgment is applied first, then any data is offered to
    /// the receiver. When the acknowledgment freed the sender, the next unit
    /// is framed; it carries the fresh acknowledgment, so a separate one is
    /// only sent when nothing new went out.
    ///
    /// 入口点：`buf` 中到达了 `received` 个字节。
    pub fn on_receive(&mut self, buf: &[u8], received: usize) -> Result<()> {
        let unit = match Unit::decode_and_validate(buf, received) {
            Ok(unit) => unit,
            Err(e) => {
                trace!(session = %self.id, error = %e, "Dropping invalid unit");
                return Ok(());
            }
        };
        trace!(session = %self.id, ?unit, "Received unit");

        let advanced = self.sender.on_ack_observed(unit.ack_number()) == AckOutcome::Advanced;

        let mut owe_ack = false;
        if let Some((sequence_number, payload)) = match unit {
            Unit::Ack { .. } => None,
            Unit::Teardown {
                sequence_number, ..
            } => Some((sequence_number, Bytes::new())),
            Unit::Data {
                sequence_number,
                payload,
                ..
            } => Some((sequence_number, payload)),
        } {
            owe_ack = match self.receiver.on_unit_received(sequence_number, payload) {
                Acceptance::Accepted => self.deliver()?,
                Acceptance::Duplicate => self.reack_duplicates,
                Acceptance::Dropped => false,
            };
        }

        let sent = advanced && self.pump()?;
        if owe_ack && !sent {
            self.acknowledge()?;
        }
        Ok(())
    }

    /// Entry point: the input source may have bytes or end-of-input.
    ///
    /// 入口点：输入源可能有数据或已结束。
    pub fn on_input_ready(&mut self) -> Result<()> {
        self.pump().map(|_| ())
    }

    /// Entry point: the output sink drained and may accept the buffered payload.
    ///
    /// 入口点：输出端已排空。
    pub fn on_output_drained(&mut self) -> Result<()> {
        if self.deliver()? {
            self.acknowledge()?;
        }
        Ok(())
    }

    /// Entry point: retransmission timer tick. Re-sends the outstanding unit,
    /// if there is one, with a refreshed acknowledgment number.
    ///
    /// 入口点：重传定时器触发。
    pub fn on_timer(&mut self) -> Result<()> {
        if let Some(unit) = self.sender.resend_if_pending() {
            debug!(session = %self.id, seq = unit.sequence_number(), "Retransmitting outstanding unit");
            self.transmit(unit)?;
        }
        Ok(())
    }

    /// Frames and sends the next unit if the sender is idle and input is
    /// available. Returns whether a unit went out.
    fn pump(&mut self) -> Result<bool> {
        match self.sender.pump_input(&mut self.conn, self.max_payload) {
            Some(unit) => {
                self.transmit(unit)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Tries to empty the reassembly slot. Returns whether a delivery
    /// happened, which obliges an acknowledgment.
    fn deliver(&mut self) -> Result<bool> {
        Ok(matches!(
            self.receiver.try_deliver(&mut self.conn)?,
            Delivery::Delivered | Delivery::EndOfStream
        ))
    }

    /// Carries the current acknowledgment number to the peer: piggybacked on
    /// the outstanding unit when there is one, otherwise in a pure
    /// acknowledgment.
    ///
    /// 将当前确认号带给对端。
    fn acknowledge(&mut self) -> Result<()> {
        let unit = self
            .sender
            .pending()
            .cloned()
            .unwrap_or(Unit::Ack { ack_number: 0 });
        self.transmit(unit)
    }

    /// Stamps the acknowledgment number, encodes and sends one unit.
    fn transmit(&mut self, mut unit: Unit) -> Result<()> {
        unit.set_ack_number(self.receiver.next_ack());
        let bytes = unit.encode();
        let written = self.conn.send_unit(&bytes)?;
        if written != bytes.len() {
            return Err(Error::ShortWrite {
                expected: bytes.len(),
                written,
            });
        }
        trace!(
            session = %self.id,
            seq = unit.sequence_number(),
            ack = unit.ack_number(),
            len = bytes.len(),
            "Sent unit"
        );
        Ok(())
    }
}
