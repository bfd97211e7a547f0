//! 定义了会话和协议的可配置参数。
//! Defines configurable parameters for sessions and the protocol.

use crate::{
    error::{Error, Result},
    packet::MAX_PAYLOAD_SIZE,
};
use std::time::Duration;

/// A structure containing all configurable parameters for a session.
///
/// 包含所有会话可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Reliability-related parameters.
    /// 可靠性相关参数。
    pub reliability: ReliabilityConfig,

    /// Connection and buffer-related parameters.
    /// 连接和缓冲区相关参数。
    pub connection: ConnectionConfig,
}

/// Reliability-related parameters.
///
/// 可靠性相关参数。
#[derive(Debug, Clone)]
pub struct ReliabilityConfig {
    /// The retransmission timeout. Outstanding units are re-sent on every
    /// timer tick, and ticks fire `timer_divisor` times per timeout.
    /// 重传超时。
    pub retransmission_timeout: Duration,
    /// How many timer ticks fit into one retransmission timeout.
    /// 每个重传超时内的定时器触发次数。
    pub timer_divisor: u32,
    /// Answer data units that were already delivered with a fresh
    /// acknowledgment instead of dropping them silently.
    /// 对已交付的重复数据单元重新发送确认。
    pub reack_duplicates: bool,
}

/// Connection and buffer-related parameters.
///
/// 连接和缓冲区相关参数。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// The maximum number of payload bytes in a single data unit.
    /// 单个数据单元的最大载荷字节数。
    pub max_payload_size: usize,
    /// Capacity of the output buffer in bytes. The receiver withholds
    /// delivery, and therefore acknowledgment, while this buffer is full.
    /// 输出缓冲区容量（字节）。
    pub output_buffer_capacity: usize,
    /// Bytes of user input staged ahead of the sender.
    /// 在发送方之前暂存的用户输入字节数。
    pub input_buffer_capacity: usize,
    /// Capacity of the user-facing mpsc channels, in messages.
    /// 面向用户的 mpsc 通道容量（消息数）。
    pub channel_capacity: usize,
    /// How long a completed session keeps answering the peer before its
    /// driver exits, so that a lost final acknowledgment can be repaired.
    ///
    /// 会话完成后继续应答对端的时间。
    pub drain_timeout: Duration,
}

impl Config {
    /// Checks that every parameter is within the range the protocol supports.
    ///
    /// 检查所有参数都在协议支持的范围内。
    pub fn validate(&self) -> Result<()> {
        if self.reliability.timer_divisor == 0 {
            return Err(Error::InvalidConfig("timer_divisor must be at least 1"));
        }
        if self.reliability.retransmission_timeout.is_zero() {
            return Err(Error::InvalidConfig("retransmission_timeout must be non-zero"));
        }
        let payload = self.connection.max_payload_size;
        if payload == 0 || payload > MAX_PAYLOAD_SIZE {
            return Err(Error::InvalidConfig(
                "max_payload_size must be between 1 and 488",
            ));
        }
        if self.connection.output_buffer_capacity < payload {
            return Err(Error::InvalidConfig(
                "output_buffer_capacity must hold at least one payload",
            ));
        }
        if self.connection.channel_capacity == 0 {
            return Err(Error::InvalidConfig("channel_capacity must be non-zero"));
        }
        Ok(())
    }

    /// The period between two retransmission timer ticks.
    ///
    /// 两次重传定时器触发之间的间隔。
    pub fn tick_interval(&self) -> Duration {
        self.reliability.retransmission_timeout / self.reliability.timer_divisor.max(1)
    }
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            retransmission_timeout: Duration::from_millis(500),
            timer_divisor: 5,
            reack_duplicates: true,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
            output_buffer_capacity: 64 * 1024, // 64 KB
            input_buffer_capacity: 16 * 1024,
            channel_capacity: 128,
            drain_timeout: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.reliability.timer_divisor = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.connection.max_payload_size = MAX_PAYLOAD_SIZE + 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.connection.max_payload_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connection.output_buffer_capacity = 10;
        assert!(config.validate().is_err());
    }
}
