use std::fmt;

use crate::transport::{self, ChannelId, Transport};

/// Response bytes held by a [`ConnectionState`].
pub enum Body {
    /// Allocated for this connection and freed with it.
    Owned(Vec<u8>),
    /// Borrowed from static storage.
    Static(&'static [u8]),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Owned(bytes) => bytes.as_slice(),
            Body::Static(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Body::Owned(_) => "Owned",
            Body::Static(_) => "Static",
        };
        f.debug_struct("Body")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

/// Send progress of one multi-chunk response.
///
/// Owned by exactly one connection. Ending the response consumes the value
/// (see [`ConnectionState::release`] and [`ConnectionState::abort`]), so a
/// state can neither be released twice nor used afterwards.
///
/// Invariant: `sent_len <= total_len`.
#[derive(Debug)]
pub struct ConnectionState {
    channel: ChannelId,
    body: Option<Body>,
    sent_len: usize,
    total_len: usize,
}

impl ConnectionState {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            body: None,
            sent_len: 0,
            total_len: 0,
        }
    }

    /// Installs a new response body and resets progress. A previous body,
    /// if any, is dropped.
    pub fn prepare(&mut self, body: Body) {
        self.total_len = body.len();
        self.sent_len = 0;
        self.body = Some(body);
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn sent_len(&self) -> usize {
        self.sent_len
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Whether releasing this state frees a heap buffer.
    pub fn owns_body(&self) -> bool {
        matches!(self.body, Some(Body::Owned(_)))
    }

    pub fn remaining(&self) -> usize {
        self.total_len - self.sent_len
    }

    pub fn is_complete(&self) -> bool {
        self.sent_len >= self.total_len
    }

    /// The next `len` unsent bytes.
    pub(crate) fn pending(&self, len: usize) -> &[u8] {
        match &self.body {
            Some(body) => &body.as_bytes()[self.sent_len..self.sent_len + len],
            None => &[],
        }
    }

    pub(crate) fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.remaining());
        self.sent_len = (self.sent_len + len).min(self.total_len);
    }

    /// Closes the channel and frees the state.
    pub fn release<T: Transport + ?Sized>(self, transport: &mut T) {
        tracing::debug!(
            channel = %self.channel,
            sent = self.sent_len,
            total = self.total_len,
            owned = self.owns_body(),
            "releasing connection state"
        );
        transport::shutdown(transport, self.channel);
    }

    /// Aborts the channel and frees the state.
    pub fn abort<T: Transport + ?Sized>(self, transport: &mut T) {
        tracing::debug!(
            channel = %self.channel,
            sent = self.sent_len,
            total = self.total_len,
            "aborting connection state"
        );
        transport::teardown(transport, self.channel);
    }
}
