//! Common testing infrastructure for core engine tests.

use super::traits::{InputSource, OutputSink, ReadOutcome, UnitTransport};
use crate::packet::Unit;
use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use std::io;

// --- Input ---

/// An input source that replays a fixed script of outcomes. `Data(n)`
/// entries copy the next `n` bytes of the backing stream.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    script: VecDeque<ReadOutcome>,
    bytes: Bytes,
    reads: usize,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = ReadOutcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_bytes(mut self, bytes: &[u8]) -> Self {
        self.bytes = Bytes::copy_from_slice(bytes);
        self
    }

    /// Appends more steps to the script.
    pub fn push(&mut self, outcome: ReadOutcome, bytes: &[u8]) {
        let mut joined = BytesMut::from(&self.bytes[..]);
        joined.extend_from_slice(bytes);
        self.bytes = joined.freeze();
        self.script.push_back(outcome);
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl InputSource for ScriptedInput {
    fn read_input(&mut self, buf: &mut [u8]) -> ReadOutcome {
        self.reads += 1;
        match self.script.pop_front() {
            Some(ReadOutcome::Data(n)) => {
                let n = n.min(buf.len()).min(self.bytes.len());
                buf[..n].copy_from_slice(&self.bytes.split_to(n));
                ReadOutcome::Data(n)
            }
            Some(other) => other,
            None => ReadOutcome::Empty,
        }
    }
}

/// An input source over a byte stream, chunked by the reader's buffer size,
/// that reports `End` once drained.
#[derive(Debug)]
pub struct StreamInput {
    bytes: Bytes,
}

impl StreamInput {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl InputSource for StreamInput {
    fn read_input(&mut self, buf: &mut [u8]) -> ReadOutcome {
        if self.bytes.is_empty() {
            return ReadOutcome::End;
        }
        let n = buf.len().min(self.bytes.len());
        buf[..n].copy_from_slice(&self.bytes.split_to(n));
        ReadOutcome::Data(n)
    }
}

// --- Output ---

/// An output sink with an adjustable capacity that keeps everything written.
#[derive(Debug, Default)]
pub struct MemorySink {
    data: Vec<u8>,
    capacity: usize,
    ended: bool,
    writes: usize,
}

impl MemorySink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl OutputSink for MemorySink {
    fn buffer_space(&self) -> usize {
        self.capacity
    }

    fn write_output(&mut self, data: &[u8]) -> io::Result<()> {
        assert!(data.len() <= self.capacity, "write beyond advertised space");
        self.data.extend_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn end_of_output(&mut self) {
        self.ended = true;
    }
}

// --- Connection handle ---

/// A connection handle that records every unit the session sends instead of
/// putting it on a network.
#[derive(Debug)]
pub struct MockConn<I = ScriptedInput> {
    pub input: I,
    pub sink: MemorySink,
    pub sent: Vec<Bytes>,
    /// When set, `send_unit` reports writing this many bytes.
    pub short_write: Option<usize>,
}

impl<I> MockConn<I> {
    pub fn new(input: I, sink: MemorySink) -> Self {
        Self {
            input,
            sink,
            sent: Vec::new(),
            short_write: None,
        }
    }

    /// Decodes and removes everything sent so far.
    pub fn take_sent(&mut self) -> Vec<Unit> {
        self.sent
            .drain(..)
            .map(|bytes| Unit::decode(&bytes).expect("session sent an invalid unit"))
            .collect()
    }
}

impl<I> UnitTransport for MockConn<I> {
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<usize> {
        if let Some(written) = self.short_write {
            return Ok(written);
        }
        self.sent.push(Bytes::copy_from_slice(unit));
        Ok(unit.len())
    }
}

impl<I: InputSource> InputSource for MockConn<I> {
    fn read_input(&mut self, buf: &mut [u8]) -> ReadOutcome {
        self.input.read_input(buf)
    }
}

impl<I> OutputSink for MockConn<I> {
    fn buffer_space(&self) -> usize {
        self.sink.buffer_space()
    }

    fn write_output(&mut self, data: &[u8]) -> io::Result<()> {
        self.sink.write_output(data)
    }

    fn end_of_output(&mut self) {
        self.sink.end_of_output()
    }
}
