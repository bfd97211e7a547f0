//! A socket wrapper that misbehaves like a bad network.
//!
//! 模拟劣质网络的套接字包装器。
//!
//! [`LossySocket`] drops, corrupts and duplicates outgoing datagrams with
//! configurable probabilities, driven by a seeded RNG so runs are
//! reproducible.

use super::traits::DatagramSocket;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{net::SocketAddr, sync::Mutex};
use tracing::trace;

/// Fault probabilities applied to every outgoing datagram.
///
/// 应用于每个外发数据报的故障概率。
#[derive(Debug, Clone, Copy)]
pub struct LossConfig {
    /// Probability that a datagram silently disappears.
    pub drop: f64,
    /// Probability that one bit of a datagram is flipped.
    pub corrupt: f64,
    /// Probability that a datagram is sent twice.
    pub duplicate: f64,
    pub seed: u64,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            drop: 0.0,
            corrupt: 0.0,
            duplicate: 0.0,
            seed: 0,
        }
    }
}

impl LossConfig {
    fn validate(&self) -> Result<()> {
        let in_range = |p: f64| (0.0..=1.0).contains(&p);
        if !(in_range(self.drop) && in_range(self.corrupt) && in_range(self.duplicate)) {
            return Err(Error::InvalidConfig("loss probabilities must be within 0.0..=1.0"));
        }
        Ok(())
    }
}

/// Wraps a [`DatagramSocket`] and injects faults on the send path.
pub struct LossySocket<S> {
    inner: S,
    rng: Mutex<StdRng>,
    config: LossConfig,
}

impl<S: DatagramSocket> LossySocket<S> {
    pub fn new(inner: S, config: LossConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            config,
        })
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// What happens to one outgoing datagram.
#[derive(Debug, PartialEq, Eq)]
enum Fate {
    Dropped,
    Delivered { flip_bit: Option<usize>, copies: u8 },
}

impl<S> LossySocket<S> {
    fn decide(&self, len: usize) -> Fate {
        // A poisoned lock only means another sender panicked mid-roll; the
        // generator state is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        if rng.random_bool(self.config.drop) {
            return Fate::Dropped;
        }
        let flip_bit = (len > 0 && rng.random_bool(self.config.corrupt))
            .then(|| rng.random_range(0..len * 8));
        let copies = if rng.random_bool(self.config.duplicate) { 2 } else { 1 };
        Fate::Delivered { flip_bit, copies }
    }
}

#[async_trait]
impl<S: DatagramSocket> DatagramSocket for LossySocket<S> {
    fn try_send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        let (flip_bit, copies) = match self.decide(buf.len()) {
            Fate::Dropped => {
                trace!(addr = %target, len = buf.len(), "Dropping datagram");
                return Ok(buf.len());
            }
            Fate::Delivered { flip_bit, copies } => (flip_bit, copies),
        };

        let mut written = 0;
        match flip_bit {
            Some(bit) => {
                trace!(addr = %target, bit, "Corrupting datagram");
                let mut damaged = buf.to_vec();
                damaged[bit / 8] ^= 1 << (bit % 8);
                for _ in 0..copies {
                    written = self.inner.try_send_to(&damaged, target)?;
                }
            }
            None => {
                for _ in 0..copies {
                    written = self.inner.try_send_to(buf, target)?;
                }
            }
        }
        Ok(written)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr()
    }
}
