//! Manages the receiving of data: in-order acceptance, the single-slot
//! reassembly buffer, and flow-controlled delivery to the output sink.
//!
//! 管理数据的接收：按序接收、单槽重组缓冲区以及向输出端的流控交付。

use super::traits::OutputSink;
use bytes::Bytes;
use std::io;
use tracing::{debug, trace};

/// Represents the content of the reassembly slot.
///
/// 代表重组槽中的内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadOrEnd {
    /// A regular data payload.
    ///
    /// 普通数据载荷。
    Payload(Bytes),
    /// The peer's teardown: an empty payload that ends the stream.
    ///
    /// 对端的拆除信号：结束流的空载荷。
    End,
}

impl PayloadOrEnd {
    fn len(&self) -> usize {
        match self {
            PayloadOrEnd::Payload(bytes) => bytes.len(),
            PayloadOrEnd::End => 0,
        }
    }
}

/// What happened to an incoming data or teardown unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// The unit is the next in order and now occupies the slot.
    Accepted,
    /// The unit was delivered before; it is dropped.
    Duplicate,
    /// The unit skips ahead of the next expected sequence number, or the
    /// slot is still occupied; it is dropped and left to retransmission.
    Dropped,
}

/// What a delivery attempt achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A payload was written to the sink.
    Delivered,
    /// The peer's teardown was delivered; the stream is over.
    EndOfStream,
    /// The sink lacks room for the buffered payload.
    Blocked,
    /// Nothing was buffered.
    Nothing,
}

/// Receive-side state for one session.
#[derive(Debug, Default)]
pub struct ReceiveState {
    /// Highest sequence number handed to the output sink, in order.
    last_delivered: u32,
    /// At most one payload waiting for sink capacity.
    slot: Option<PayloadOrEnd>,
    /// Becomes true once the peer's teardown has been delivered.
    end_delivered: bool,
}

impl ReceiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_delivered(&self) -> u32 {
        self.last_delivered
    }

    /// The acknowledgment number to stamp on the next outgoing unit.
    ///
    /// 下一个发出单元要携带的确认号。
    pub fn next_ack(&self) -> u32 {
        self.last_delivered.wrapping_add(1)
    }

    /// Returns `true` while a payload waits for sink capacity.
    pub fn is_blocked(&self) -> bool {
        self.slot.is_some()
    }

    /// Returns `true` once the peer's stream has ended at the sink.
    pub fn is_end_delivered(&self) -> bool {
        self.end_delivered
    }

    /// Offers an incoming data unit. An empty `payload` is the peer's teardown.
    ///
    /// Only the unit directly after `last_delivered` is taken, and only while
    /// the slot is free. Nothing is buffered out of order and nothing is
    /// negatively acknowledged: a dropped unit comes back through the
    /// peer's retransmission.
    ///
    /// 提交一个传入的数据单元。空的 `payload` 表示对端的拆除信号。
    pub fn on_unit_received(&mut self, sequence_number: u32, payload: Bytes) -> Acceptance {
        // Sequence numbers wrap; anything behind the next expected number
        // within half the space counts as already delivered.
        let behind = (sequence_number.wrapping_sub(self.next_ack()) as i32) < 0;
        if self.end_delivered || behind {
            trace!(seq = sequence_number, "Dropping already delivered unit");
            return Acceptance::Duplicate;
        }
        if self.slot.is_some() || sequence_number != self.next_ack() {
            trace!(
                seq = sequence_number,
                expected = self.next_ack(),
                "Dropping unit that cannot be buffered"
            );
            return Acceptance::Dropped;
        }

        self.slot = Some(if payload.is_empty() {
            PayloadOrEnd::End
        } else {
            PayloadOrEnd::Payload(payload)
        });
        Acceptance::Accepted
    }

    /// Hands the buffered payload to `sink` if it has room for all of it.
    ///
    /// Withholding delivery here is the flow-control point: no delivery means
    /// no fresh acknowledgment, so the peer's outstanding unit stays
    /// outstanding.
    ///
    /// 如果输出端有足够空间，则交付缓冲的载荷。
    pub fn try_deliver<O: OutputSink + ?Sized>(&mut self, sink: &mut O) -> io::Result<Delivery> {
        let Some(pending) = self.slot.as_ref() else {
            return Ok(Delivery::Nothing);
        };
        if sink.buffer_space() < pending.len() {
            trace!(len = pending.len(), "Output sink full, withholding delivery");
            return Ok(Delivery::Blocked);
        }

        let delivery = match pending {
            PayloadOrEnd::Payload(bytes) => {
                sink.write_output(bytes)?;
                Delivery::Delivered
            }
            PayloadOrEnd::End => {
                sink.end_of_output();
                self.end_delivered = true;
                Delivery::EndOfStream
            }
        };
        self.slot = None;
        self.last_delivered = self.last_delivered.wrapping_add(1);
        debug!(seq = self.last_delivered, "Delivered unit to output");
        Ok(delivery)
    }
}
