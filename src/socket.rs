//! The socket-level API: a tokio host that drives one session over a
//! datagram socket, and the user-facing handle.
//!
//! 套接字层 API：在数据报套接字上驱动单个会话的 tokio 宿主，以及面向用户的句柄。

pub mod conn;
mod event_loop;
pub mod handle;
pub mod lossy;
pub mod traits;

pub use conn::ChannelConn;
pub use handle::ReliableStream;
pub use lossy::{LossConfig, LossySocket};
pub use traits::{BindableSocket, DatagramSocket};
