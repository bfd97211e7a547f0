//! The packet module, containing the wire format of transport units and the
//! checksum that guards them.
//! packet 模块，包含传输单元的线路格式以及保护它们的校验和。

pub mod checksum;
pub mod header;
pub mod unit;

pub use header::{LONG_HEADER_SIZE, SHORT_HEADER_SIZE};
pub use unit::{DecodeError, Unit};

/// The largest payload a single data unit may carry.
/// 单个数据单元可携带的最大载荷。
pub const MAX_PAYLOAD_SIZE: usize = 488;

/// The largest encoded unit: a long header plus a full payload.
/// 最大的编码单元：长头加满载荷。
pub const MAX_UNIT_SIZE: usize = LONG_HEADER_SIZE + MAX_PAYLOAD_SIZE;
