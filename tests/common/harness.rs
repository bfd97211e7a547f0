//! tests/common/harness.rs
use async_trait::async_trait;
use reliable_datagram::{Result, socket::DatagramSocket};
use std::net::SocketAddr;
use std::sync::Once;
use tokio::sync::{Mutex, mpsc};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "reliable_datagram=debug,stream=info".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

type Datagram = (Vec<u8>, SocketAddr);

/// One end of an in-memory datagram link. Never blocks on send and never
/// loses anything on its own; wrap it in a `LossySocket` for that.
pub struct MemorySocket {
    local: SocketAddr,
    peer_tx: mpsc::UnboundedSender<Datagram>,
    rx: Mutex<mpsc::UnboundedReceiver<Datagram>>,
}

impl MemorySocket {
    /// Two sockets wired to each other.
    pub fn pair() -> (Self, Self) {
        let a_addr: SocketAddr = "10.0.0.1:1000".parse().unwrap();
        let b_addr: SocketAddr = "10.0.0.2:2000".parse().unwrap();
        let (to_a, a_rx) = mpsc::unbounded_channel();
        let (to_b, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                local: a_addr,
                peer_tx: to_b,
                rx: Mutex::new(a_rx),
            },
            Self {
                local: b_addr,
                peer_tx: to_a,
                rx: Mutex::new(b_rx),
            },
        )
    }
}

#[async_trait]
impl DatagramSocket for MemorySocket {
    fn try_send_to(&self, buf: &[u8], _target: SocketAddr) -> Result<usize> {
        // A peer that has gone away just stops receiving, like a real network.
        let _ = self.peer_tx.send((buf.to_vec(), self.local));
        Ok(buf.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some((data, from)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok((len, from))
            }
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local)
    }
}

/// Deterministic test payload.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(13).wrapping_add(seed))
        .collect()
}
