//! 定义短、长两种单元头。
//! Defines the short (pure acknowledgment) and long (data/teardown) unit headers.

use bytes::{Buf, BufMut};

/// Size of a pure-acknowledgment unit: checksum, length, ack number.
pub const SHORT_HEADER_SIZE: usize = 8;

/// Size of the header of a data or teardown unit: the short header plus a
/// sequence number.
pub const LONG_HEADER_SIZE: usize = 12;

/// The fixed part of every unit, in host byte order.
/// 每个单元的固定部分（主机字节序）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Internet checksum over the whole unit, computed with this field zero.
    /// 整个单元的互联网校验和，计算时此字段为零。
    pub checksum: u16,
    /// Total encoded length of the unit, header included.
    /// 单元的总编码长度，包括头部。
    pub length: u16,
    /// The next sequence number the sender of this unit expects to receive.
    /// 此单元发送方期望接收的下一个序列号。
    pub ack_number: u32,
    /// Present on data and teardown units only.
    /// 仅出现在数据和拆除单元上。
    pub sequence_number: Option<u32>,
}

impl Header {
    /// Number of header bytes this header occupies on the wire.
    pub fn size(&self) -> usize {
        match self.sequence_number {
            Some(_) => LONG_HEADER_SIZE,
            None => SHORT_HEADER_SIZE,
        }
    }

    /// 将头部编码到缓冲区。
    /// Encodes the header into a buffer, big-endian.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.checksum);
        buf.put_u16(self.length);
        buf.put_u32(self.ack_number);
        if let Some(seq) = self.sequence_number {
            buf.put_u32(seq);
        }
    }

    /// 从缓冲区解码头部。
    /// Decodes a header from a buffer. The sequence number is read only when
    /// the advertised length leaves room for a long header.
    pub fn decode<B: Buf>(buf: &mut B) -> Option<Self> {
        if buf.remaining() < SHORT_HEADER_SIZE {
            return None;
        }
        let checksum = buf.get_u16();
        let length = buf.get_u16();
        let ack_number = buf.get_u32();
        let sequence_number = if length as usize >= LONG_HEADER_SIZE {
            if buf.remaining() < LONG_HEADER_SIZE - SHORT_HEADER_SIZE {
                return None;
            }
            Some(buf.get_u32())
        } else {
            None
        };
        Some(Header {
            checksum,
            length,
            ack_number,
            sequence_number,
        })
    }
}
