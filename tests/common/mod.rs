#![allow(dead_code)]

use std::cell::Cell;

use status_panel::sensors::{Axis, Button, Sensors};
use status_panel::transport::{ChannelId, Transport, TransportError, WriteError};

/// Transport that records every call instead of touching a network.
#[derive(Debug)]
pub struct MockTransport {
    /// Reported by `writable_capacity` for every open channel.
    pub capacity: usize,
    pub writes: Vec<(ChannelId, Vec<u8>)>,
    pub flushes: usize,
    pub consumed: Vec<(ChannelId, usize)>,
    pub unregistered: Vec<ChannelId>,
    pub closed: Vec<ChannelId>,
    pub aborted: Vec<ChannelId>,
    /// Returned by the next `write`, once.
    pub fail_next_write: Option<WriteError>,
    pub refuse_close: bool,
    pub capacity_queries: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            writes: Vec::new(),
            flushes: 0,
            consumed: Vec::new(),
            unregistered: Vec::new(),
            closed: Vec::new(),
            aborted: Vec::new(),
            fail_next_write: None,
            refuse_close: false,
            capacity_queries: 0,
        }
    }

    pub fn written(&self, channel: ChannelId) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(c, _)| *c == channel)
            .flat_map(|(_, bytes)| bytes.iter().copied())
            .collect()
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.writes.iter().map(|(_, bytes)| bytes.len()).collect()
    }

    pub fn written_str(&self, channel: ChannelId) -> String {
        String::from_utf8(self.written(channel)).unwrap()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, channel: ChannelId, data: &[u8]) -> Result<(), WriteError> {
        if let Some(err) = self.fail_next_write.take() {
            return Err(err);
        }
        self.writes.push((channel, data.to_vec()));
        Ok(())
    }

    fn flush(&mut self, _channel: ChannelId) -> Result<(), TransportError> {
        self.flushes += 1;
        Ok(())
    }

    fn writable_capacity(&self, _channel: ChannelId) -> usize {
        self.capacity
    }

    fn consume(&mut self, channel: ChannelId, len: usize) {
        self.consumed.push((channel, len));
    }

    fn unregister(&mut self, channel: ChannelId) {
        self.unregistered.push(channel);
    }

    fn close(&mut self, channel: ChannelId) -> Result<(), TransportError> {
        if self.refuse_close {
            return Err(TransportError::Closed);
        }
        self.closed.push(channel);
        Ok(())
    }

    fn abort(&mut self, channel: ChannelId) {
        self.aborted.push(channel);
    }
}

/// Sensors whose readings the test sets directly.
#[derive(Debug, Default)]
pub struct FixedSensors {
    pub a: Cell<bool>,
    pub b: Cell<bool>,
    pub x: Cell<u8>,
    pub y: Cell<u8>,
}

impl Sensors for FixedSensors {
    fn read_axis(&self, axis: Axis) -> u8 {
        match axis {
            Axis::X => self.x.get(),
            Axis::Y => self.y.get(),
        }
    }

    fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::A => self.a.get(),
            Button::B => self.b.get(),
        }
    }
}
