//! Collaborator interfaces the protocol engine needs from its host.
//!
//! 协议引擎需要宿主提供的协作者接口。
//!
//! All of these are synchronous and must never block: the engine calls them
//! from inside its entry points and expects them to return immediately.

use std::io;

/// What a non-blocking read from the input source produced.
///
/// 从输入源非阻塞读取的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n > 0` bytes were written to the front of the buffer.
    /// 已写入 `n > 0` 个字节。
    Data(usize),
    /// Nothing is available right now; more may come later.
    /// 当前没有可用数据。
    Empty,
    /// The source is exhausted and will never yield more bytes.
    /// 输入源已耗尽。
    End,
}

/// Sends framed units to the peer.
///
/// 向对端发送已封装的单元。
pub trait UnitTransport {
    /// Sends one framed unit and returns the number of bytes written.
    /// Anything short of the full unit is fatal to the session.
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<usize>;
}

/// Produces the bytes the session transmits.
///
/// 产生会话要传输的字节。
pub trait InputSource {
    /// Reads up to `buf.len()` bytes without blocking.
    fn read_input(&mut self, buf: &mut [u8]) -> ReadOutcome;
}

/// Consumes the bytes the session receives, in order.
///
/// 按顺序消费会话接收到的字节。
pub trait OutputSink {
    /// How many bytes `write_output` could accept right now.
    fn buffer_space(&self) -> usize;

    /// Writes exactly these bytes. Only called with at most `buffer_space()` bytes.
    fn write_output(&mut self, data: &[u8]) -> io::Result<()>;

    /// The peer's stream has ended; nothing more will be written.
    fn end_of_output(&mut self) {}
}

/// Everything one session needs from its host: a transport plus both data
/// endpoints. Dropping the handle releases the underlying transport.
///
/// 一个会话从宿主需要的全部能力。
pub trait ConnHandle: UnitTransport + InputSource + OutputSink {}

impl<T: UnitTransport + InputSource + OutputSink> ConnHandle for T {}
