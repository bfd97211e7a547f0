#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The reliability layer of a point-to-point datagram transport.
//! 点对点数据报传输的可靠性层。
//!
//! Each session runs stop-and-wait in both directions over an unreliable
//! datagram service: at most one unacknowledged unit per direction, one-slot
//! reassembly, acknowledgments piggybacked on data when possible, and
//! recovery by a fixed-interval retransmission timer.

pub mod config;
pub mod core;
pub mod error;
pub mod packet;
pub mod socket;

pub use config::Config;
pub use error::{Error, Result};
pub use socket::ReliableStream;
