//! The fixed-interval retransmission timer.
//!
//! 固定间隔的重传定时器。
//!
//! Recovery is timeout-only: on every tick each session re-sends its
//! outstanding unit, with no backoff, no RTT estimation and no fast
//! retransmit. Ticks fire `timer_divisor` times per retransmission timeout.

use super::{
    registry::{Registry, SessionId},
    traits::ConnHandle,
};
use crate::{config::Config, error::Error};
use std::time::Duration;
use tracing::trace;

/// Drives periodic retransmission over every registered session.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    interval: Duration,
    ticks: u64,
}

impl RetransmitTimer {
    pub fn new(config: &Config) -> Self {
        Self {
            interval: config.tick_interval(),
            ticks: 0,
        }
    }

    /// How often the host should call [`RetransmitTimer::fire`].
    ///
    /// 宿主调用 [`RetransmitTimer::fire`] 的频率。
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One tick: sweeps the registry and returns the sessions that failed fatally.
    ///
    /// 一次触发：遍历注册表并返回发生致命错误的会话。
    pub fn fire<C: ConnHandle>(&mut self, registry: &mut Registry<C>) -> Vec<(SessionId, Error)> {
        self.ticks += 1;
        trace!(tick = self.ticks, sessions = registry.len(), "Retransmission sweep");
        registry.on_timer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::{MemorySink, MockConn, ScriptedInput};
    use crate::core::traits::ReadOutcome;

    #[test]
    fn test_interval_is_timeout_over_divisor() {
        let mut config = Config::default();
        config.reliability.retransmission_timeout = Duration::from_millis(1000);
        config.reliability.timer_divisor = 4;
        assert_eq!(RetransmitTimer::new(&config).interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_every_fire_resends_without_backoff() {
        let config = Config::default();
        let mut registry = Registry::new(config.clone()).unwrap();
        let id = registry.create(MockConn::new(
            ScriptedInput::new([ReadOutcome::Data(1)]).with_bytes(b"x"),
            MemorySink::with_capacity(16),
        ));
        registry.session_mut(id).unwrap().on_input_ready().unwrap();
        registry.session_mut(id).unwrap().conn_mut().take_sent();

        let mut timer = RetransmitTimer::new(&config);
        for _ in 0..5 {
            assert!(timer.fire(&mut registry).is_empty());
        }
        assert_eq!(timer.ticks(), 5);
        assert_eq!(registry.session_mut(id).unwrap().conn_mut().take_sent().len(), 5);
    }
}
