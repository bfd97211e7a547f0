//! Outbound state for the single-outstanding-unit protocol.
//!
//! [`SendState`] tracks sequence numbers and the one unit that may be in
//! flight. It never touches the transport; [`crate::core::session::Session`]
//! stamps the acknowledgment number on the units handed out here and sends
//! them.
//!
//! 单一在途单元协议的发送端状态。
//!
//! # Contract
//! - At most **one** data or teardown unit is unacknowledged at any time.
//! - A new unit is framed only from [`SendPhase::Idle`].
//! - An acknowledgment frees the outstanding unit only when it names exactly
//!   the next sequence number after it.

use super::traits::{InputSource, ReadOutcome};
use crate::packet::Unit;
use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

/// Where the send side currently stands.
///
/// 发送端当前所处的阶段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendPhase {
    /// Nothing outstanding; the next pump may frame a unit.
    /// 没有在途单元。
    Idle,
    /// One unit is on the wire and is retransmitted until acknowledged.
    /// 一个单元在途，直到被确认前都会重传。
    AwaitingAck(Unit),
    /// Our teardown was acknowledged. Only pure acknowledgments leave from now on.
    /// 我们的拆除单元已被确认。
    Finished,
}

/// Result of feeding an observed acknowledgment number to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The outstanding unit was acknowledged.
    Advanced,
    /// Nothing was outstanding, or the number does not name it.
    Stale,
}

/// Send-side state for one session.
#[derive(Debug)]
pub struct SendState {
    /// Sequence number of the most recently framed unit; 0 before the first.
    last_sent: u32,
    /// Highest acknowledgment number seen from the peer.
    highest_ack: u32,
    phase: SendPhase,
}

impl Default for SendState {
    fn default() -> Self {
        Self::new()
    }
}

impl SendState {
    /// Creates an idle sender whose first unit will carry sequence number 1.
    pub fn new() -> Self {
        Self {
            last_sent: 0,
            highest_ack: 0,
            phase: SendPhase::Idle,
        }
    }

    pub fn phase(&self) -> &SendPhase {
        &self.phase
    }

    pub fn last_sent(&self) -> u32 {
        self.last_sent
    }

    pub fn highest_ack(&self) -> u32 {
        self.highest_ack
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SendPhase::Idle
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SendPhase::Finished
    }

    /// The unit awaiting acknowledgment, if any.
    pub fn pending(&self) -> Option<&Unit> {
        match &self.phase {
            SendPhase::AwaitingAck(unit) => Some(unit),
            _ => None,
        }
    }

    /// Pulls up to `max_payload` bytes from `input` and frames the next unit.
    ///
    /// Returns the unit to transmit, or `None` when the sender is not idle or
    /// the source has nothing right now. The returned unit is also kept as
    /// the outstanding unit.
    ///
    /// 从输入源拉取数据并封装下一个单元。
    pub fn pump_input<I: InputSource + ?Sized>(
        &mut self,
        input: &mut I,
        max_payload: usize,
    ) -> Option<Unit> {
        if !self.is_idle() {
            return None;
        }

        let mut buf = BytesMut::zeroed(max_payload);
        let sequence_number = self.last_sent.wrapping_add(1);
        let unit = match input.read_input(&mut buf) {
            ReadOutcome::Empty | ReadOutcome::Data(0) => return None,
            ReadOutcome::End => {
                debug!(seq = sequence_number, "Input exhausted, framing teardown");
                Unit::Teardown {
                    ack_number: 0,
                    sequence_number,
                }
            }
            ReadOutcome::Data(n) => {
                buf.truncate(n.min(max_payload));
                trace!(seq = sequence_number, len = buf.len(), "Framing data unit");
                Unit::Data {
                    ack_number: 0,
                    sequence_number,
                    payload: Bytes::from(buf),
                }
            }
        };

        self.last_sent = sequence_number;
        self.phase = SendPhase::AwaitingAck(unit.clone());
        Some(unit)
    }

    /// Processes an acknowledgment number carried by any incoming unit.
    ///
    /// Only `ack == outstanding + 1` frees the outstanding unit. Every other
    /// value is treated as stale or duplicate and leaves the phase untouched.
    ///
    /// 处理任何传入单元携带的确认号。
    pub fn on_ack_observed(&mut self, ack: u32) -> AckOutcome {
        self.highest_ack = self.highest_ack.max(ack);

        let Some(outstanding) = self.pending() else {
            return AckOutcome::Stale;
        };
        let acked_teardown = matches!(outstanding, Unit::Teardown { .. });
        match outstanding.sequence_number() {
            Some(seq) if seq == ack.wrapping_sub(1) => {
                debug!(seq, "Outstanding unit acknowledged");
                self.phase = if acked_teardown {
                    SendPhase::Finished
                } else {
                    SendPhase::Idle
                };
                AckOutcome::Advanced
            }
            _ => {
                trace!(ack, "Ignoring stale acknowledgment");
                AckOutcome::Stale
            }
        }
    }

    /// The unit to re-send on a timer tick: the outstanding one, if any.
    ///
    /// 定时器触发时要重发的单元。
    pub fn resend_if_pending(&self) -> Option<Unit> {
        self.pending().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::ScriptedInput;

    #[test]
    fn test_data_unit_takes_next_sequence_number() {
        let mut sender = SendState::new();
        let mut input = ScriptedInput::new([ReadOutcome::Data(5)]).with_bytes(b"hello");

        let unit = sender.pump_input(&mut input, 488).unwrap();
        assert_eq!(unit.sequence_number(), Some(1));
        assert_eq!(unit.payload(), b"hello");
        assert_eq!(sender.pending(), Some(&unit));
        assert_eq!(sender.last_sent(), 1);
    }

    #[test]
    fn test_empty_input_stays_idle() {
        let mut sender = SendState::new();
        let mut input = ScriptedInput::new([ReadOutcome::Empty]);

        assert!(sender.pump_input(&mut input, 488).is_none());
        assert!(sender.is_idle());
        assert_eq!(sender.last_sent(), 0);
    }

    #[test]
    fn test_end_of_input_frames_teardown() {
        let mut sender = SendState::new();
        let mut input = ScriptedInput::new([ReadOutcome::End]);

        let unit = sender.pump_input(&mut input, 488).unwrap();
        assert_eq!(
            unit,
            Unit::Teardown {
                ack_number: 0,
                sequence_number: 1
            }
        );
        assert!(matches!(sender.phase(), SendPhase::AwaitingAck(_)));
    }

    #[test]
    fn test_pump_while_awaiting_ack_is_noop() {
        let mut sender = SendState::new();
        let mut input =
            ScriptedInput::new([ReadOutcome::Data(1), ReadOutcome::Data(1)]).with_bytes(b"ab");

        sender.pump_input(&mut input, 488).unwrap();
        assert!(sender.pump_input(&mut input, 488).is_none());
        assert_eq!(input.reads(), 1, "source must not be polled while a unit is in flight");
    }

    #[test]
    fn test_only_exact_predecessor_ack_frees_the_slot() {
        let mut sender = SendState::new();
        let mut input = ScriptedInput::new([ReadOutcome::Data(1)]).with_bytes(b"a");
        sender.pump_input(&mut input, 488).unwrap();

        for stale in [0, 1, 3, 100] {
            assert_eq!(sender.on_ack_observed(stale), AckOutcome::Stale);
            assert!(sender.pending().is_some());
        }
        assert_eq!(sender.on_ack_observed(2), AckOutcome::Advanced);
        assert!(sender.is_idle());
        assert_eq!(sender.highest_ack(), 100);
    }

    #[test]
    fn test_ack_while_idle_is_stale() {
        let mut sender = SendState::new();
        assert_eq!(sender.on_ack_observed(1), AckOutcome::Stale);
        assert!(sender.is_idle());
    }

    #[test]
    fn test_acknowledged_teardown_finishes() {
        let mut sender = SendState::new();
        let mut input = ScriptedInput::new([ReadOutcome::End, ReadOutcome::End]);
        sender.pump_input(&mut input, 488).unwrap();

        assert_eq!(sender.on_ack_observed(2), AckOutcome::Advanced);
        assert!(sender.is_finished());
        assert!(sender.pump_input(&mut input, 488).is_none());
        assert!(sender.resend_if_pending().is_none());
    }

    #[test]
    fn test_sequence_number_wraps_after_u32_max() {
        let mut sender = SendState {
            last_sent: u32::MAX - 1,
            ..SendState::new()
        };
        let mut input =
            ScriptedInput::new([ReadOutcome::Data(1), ReadOutcome::Data(1)]).with_bytes(b"ab");

        let unit = sender.pump_input(&mut input, 488).unwrap();
        assert_eq!(unit.sequence_number(), Some(u32::MAX));
        assert_eq!(sender.on_ack_observed(0), AckOutcome::Advanced);

        let unit = sender.pump_input(&mut input, 488).unwrap();
        assert_eq!(unit.sequence_number(), Some(0));
        assert_eq!(sender.on_ack_observed(0), AckOutcome::Stale);
        assert_eq!(sender.on_ack_observed(1), AckOutcome::Advanced);
        assert!(sender.is_idle());
    }

    #[test]
    fn test_payload_is_capped_at_max_size() {
        let mut sender = SendState::new();
        let mut input = ScriptedInput::new([ReadOutcome::Data(4)]).with_bytes(b"abcdefgh");

        let unit = sender.pump_input(&mut input, 4).unwrap();
        assert_eq!(unit.payload(), b"abcd");
    }
}
