//! 定义了可以在网络上传输的完整传输单元。
//! Defines the complete transport units that travel over the network.
//!
//! The kind of a unit is not tagged on the wire; it follows from the
//! advertised length. A unit of [`SHORT_HEADER_SIZE`] bytes is a pure
//! acknowledgment, one of exactly [`LONG_HEADER_SIZE`] bytes is a teardown,
//! and anything longer carries payload. Decoding resolves the kind once and
//! hands out a tagged [`Unit`].

use super::{
    MAX_UNIT_SIZE,
    checksum::internet_checksum,
    header::{Header, LONG_HEADER_SIZE, SHORT_HEADER_SIZE},
};
use bytes::{Bytes, BytesMut};
use thiserror::Error;

// Byte offsets of the fields every unit starts with.
const OFF_CHECKSUM: usize = 0;
const OFF_LENGTH: usize = 2;

/// Why a received datagram was rejected. Rejections are dropped silently by
/// the session; the reason only ever reaches the trace log.
///
/// 接收到的数据报被拒绝的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes arrived than the unit advertises.
    /// 到达的字节数少于单元声明的长度。
    #[error("truncated unit: received {received} of {advertised} bytes")]
    Truncated { received: usize, advertised: usize },

    /// The advertised checksum does not match the recomputed one.
    /// 声明的校验和与重新计算的不匹配。
    #[error("checksum mismatch: advertised {advertised:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { advertised: u16, computed: u16 },

    /// The advertised length fits none of the three unit layouts.
    /// 声明的长度不符合任何一种单元布局。
    #[error("malformed unit length {length}")]
    Malformed { length: usize },
}

/// A decoded transport unit, in host byte order.
/// 已解码的传输单元（主机字节序）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// A pure acknowledgment. It carries no sequence number.
    /// 纯确认单元，不携带序列号。
    Ack { ack_number: u32 },
    /// End of the sender's input: a data-kind unit with an empty payload.
    /// 发送方输入结束：载荷为空的数据类单元。
    Teardown { ack_number: u32, sequence_number: u32 },
    /// A unit carrying payload bytes.
    /// 携带载荷的单元。
    Data {
        ack_number: u32,
        sequence_number: u32,
        payload: Bytes,
    },
}

impl Unit {
    /// The cumulative acknowledgment number carried by every unit.
    pub fn ack_number(&self) -> u32 {
        match self {
            Unit::Ack { ack_number }
            | Unit::Teardown { ack_number, .. }
            | Unit::Data { ack_number, .. } => *ack_number,
        }
    }

    /// The sequence number, absent on pure acknowledgments.
    pub fn sequence_number(&self) -> Option<u32> {
        match self {
            Unit::Ack { .. } => None,
            Unit::Teardown {
                sequence_number, ..
            }
            | Unit::Data {
                sequence_number, ..
            } => Some(*sequence_number),
        }
    }

    /// The payload bytes; empty for acknowledgments and teardowns.
    pub fn payload(&self) -> &[u8] {
        match self {
            Unit::Data { payload, .. } => payload,
            _ => &[],
        }
    }

    /// Overwrites the acknowledgment number. Every unit is re-stamped with
    /// the receiver's current value right before it goes on the wire.
    ///
    /// 覆盖确认号。每个单元在发送前都会用接收方的当前值重新标记。
    pub fn set_ack_number(&mut self, ack: u32) {
        match self {
            Unit::Ack { ack_number }
            | Unit::Teardown { ack_number, .. }
            | Unit::Data { ack_number, .. } => *ack_number = ack,
        }
    }

    /// Total number of bytes this unit occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            Unit::Ack { .. } => SHORT_HEADER_SIZE,
            Unit::Teardown { .. } => LONG_HEADER_SIZE,
            Unit::Data { payload, .. } => LONG_HEADER_SIZE + payload.len(),
        }
    }

    /// Serialises the unit and fills in its checksum.
    ///
    /// A `Data` unit with an empty payload is indistinguishable from a
    /// teardown on the wire; the sender never builds one.
    ///
    /// 序列化单元并填入校验和。
    pub fn encode(&self) -> Bytes {
        let length = self.encoded_len();
        debug_assert!(length <= MAX_UNIT_SIZE, "unit exceeds the maximum size");

        let mut buf = BytesMut::with_capacity(length);
        Header {
            checksum: 0,
            length: length as u16,
            ack_number: self.ack_number(),
            sequence_number: self.sequence_number(),
        }
        .encode(&mut buf);
        buf.extend_from_slice(self.payload());

        let checksum = internet_checksum(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&checksum.to_be_bytes());
        buf.freeze()
    }

    /// Validates and decodes a datagram that arrived whole.
    ///
    /// 验证并解码一个完整到达的数据报。
    pub fn decode(datagram: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_and_validate(datagram, datagram.len())
    }

    /// Validates and decodes the first `received` bytes of `buf`.
    ///
    /// The unit is rejected when fewer bytes arrived than its length field
    /// advertises, when that length fits no unit layout, or when the checksum
    /// recomputed over the advertised length disagrees with the one carried.
    /// Bytes past the advertised length are ignored.
    ///
    /// 验证并解码 `buf` 的前 `received` 个字节。
    pub fn decode_and_validate(buf: &[u8], received: usize) -> Result<Self, DecodeError> {
        let datagram = &buf[..received.min(buf.len())];
        if datagram.len() < OFF_LENGTH + 2 {
            return Err(DecodeError::Truncated {
                received: datagram.len(),
                advertised: SHORT_HEADER_SIZE,
            });
        }

        let length = u16::from_be_bytes([datagram[OFF_LENGTH], datagram[OFF_LENGTH + 1]]) as usize;
        if datagram.len() < length {
            return Err(DecodeError::Truncated {
                received: datagram.len(),
                advertised: length,
            });
        }
        let well_formed = length == SHORT_HEADER_SIZE
            || (LONG_HEADER_SIZE..=MAX_UNIT_SIZE).contains(&length);
        if !well_formed {
            return Err(DecodeError::Malformed { length });
        }

        let unit = &datagram[..length];
        let advertised = u16::from_be_bytes([unit[OFF_CHECKSUM], unit[OFF_CHECKSUM + 1]]);
        // The checksum field is the first word, so summing from the next word
        // is the same as summing the whole unit with the field zeroed.
        let computed = internet_checksum(&unit[OFF_LENGTH..]);
        if advertised != computed {
            return Err(DecodeError::ChecksumMismatch {
                advertised,
                computed,
            });
        }

        let mut cursor = unit;
        let header = Header::decode(&mut cursor).ok_or(DecodeError::Malformed { length })?;
        let ack_number = header.ack_number;
        Ok(match header.sequence_number {
            None => Unit::Ack { ack_number },
            Some(sequence_number) if cursor.is_empty() => Unit::Teardown {
                ack_number,
                sequence_number,
            },
            Some(sequence_number) => Unit::Data {
                ack_number,
                sequence_number,
                payload: Bytes::copy_from_slice(cursor),
            },
        })
    }
}
