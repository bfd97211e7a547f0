//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use crate::core::registry::SessionId;
use thiserror::Error;

/// The primary error type for the reliable datagram library.
/// 可靠数据报协议库的主要错误类型。
///
/// Every variant returned from a session entry point is fatal to that
/// session: the host decides whether to drop the session or stop entirely.
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O error occurred.
    /// 发生了底层的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport accepted fewer bytes than the framed unit holds.
    /// 传输层写入的字节数少于已封装单元的长度。
    #[error("short write on transport: wrote {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// A configuration value is out of range.
    /// 配置值超出范围。
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// No live session is registered under the given identifier.
    /// 给定标识符下没有已注册的会话。
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// An internal channel between the driver task and the user handle closed.
    /// 驱动任务与用户句柄之间的内部通道已关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::ShortWrite { .. } => ErrorKind::WriteZero.into(),
            Error::InvalidConfig(msg) => std::io::Error::new(ErrorKind::InvalidInput, msg),
            Error::SessionNotFound(_) => ErrorKind::NotFound.into(),
            Error::ChannelClosed => ErrorKind::BrokenPipe.into(),
        }
    }
}
