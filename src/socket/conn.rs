//! The connection handle the tokio host gives each session.
//!
//! 宿主为每个会话提供的连接句柄。
//!
//! [`ChannelConn`] sends units straight to a fixed peer through a
//! [`DatagramSocket`] and stages user data on both sides: bytes written by
//! the user wait in the input buffer until the sender frames them, and bytes
//! delivered by the receiver wait in a bounded output buffer until the
//! driver hands them to the user. When the output buffer is full the
//! receiver withholds delivery, which is what throttles the peer.

use super::traits::DatagramSocket;
use crate::{
    core::traits::{InputSource, OutputSink, ReadOutcome, UnitTransport},
    error::Error,
};
use bytes::{Buf, Bytes, BytesMut};
use std::{io, net::SocketAddr, sync::Arc};
use tracing::trace;

/// A [`ConnHandle`](crate::core::traits::ConnHandle) over a datagram socket
/// and two staging buffers.
#[derive(Debug)]
pub struct ChannelConn<S> {
    socket: Arc<S>,
    peer: SocketAddr,
    input: BytesMut,
    input_ended: bool,
    output: BytesMut,
    output_capacity: usize,
    output_ended: bool,
}

impl<S: DatagramSocket> ChannelConn<S> {
    pub fn new(socket: Arc<S>, peer: SocketAddr, output_capacity: usize) -> Self {
        Self {
            socket,
            peer,
            input: BytesMut::new(),
            input_ended: false,
            output: BytesMut::with_capacity(output_capacity),
            output_capacity,
            output_ended: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Appends user bytes behind whatever is already staged.
    pub fn stage_input(&mut self, data: &[u8]) {
        self.input.extend_from_slice(data);
    }

    /// Marks the input as ended; the sender sees `End` once the staged bytes are gone.
    pub fn end_input(&mut self) {
        self.input_ended = true;
    }

    /// Number of user bytes not yet framed.
    pub fn staged_input(&self) -> usize {
        self.input.len()
    }

    /// Takes everything delivered so far, freeing the output buffer.
    pub fn take_output(&mut self) -> Option<Bytes> {
        if self.output.is_empty() {
            None
        } else {
            Some(self.output.split().freeze())
        }
    }

    /// The peer's stream has ended at this end.
    pub fn is_output_ended(&self) -> bool {
        self.output_ended
    }
}

impl<S: DatagramSocket> UnitTransport for ChannelConn<S> {
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<usize> {
        match self.socket.try_send_to(unit, self.peer) {
            Ok(written) => Ok(written),
            // A full socket buffer loses the datagram like the network would;
            // the retransmission timer recovers it.
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {
                trace!(peer = %self.peer, len = unit.len(), "Socket busy, datagram dropped");
                Ok(unit.len())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<S> InputSource for ChannelConn<S> {
    fn read_input(&mut self, buf: &mut [u8]) -> ReadOutcome {
        if self.input.is_empty() {
            return if self.input_ended {
                ReadOutcome::End
            } else {
                ReadOutcome::Empty
            };
        }
        let n = buf.len().min(self.input.len());
        buf[..n].copy_from_slice(&self.input[..n]);
        self.input.advance(n);
        ReadOutcome::Data(n)
    }
}

impl<S> OutputSink for ChannelConn<S> {
    fn buffer_space(&self) -> usize {
        self.output_capacity.saturating_sub(self.output.len())
    }

    fn write_output(&mut self, data: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn end_of_output(&mut self) {
        self.output_ended = true;
    }
}
