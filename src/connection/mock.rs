//! In-memory [`crate::net::Socket`] stand-in used by `#[cfg(test)]` code
//! elsewhere in this module to exercise the packet framer and executor
//! without a real server (spec §10.4), grounded on the scripted-byte-array
//! tests already present in `protocol::handshake`'s test module.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Plays back a fixed sequence of "server" bytes and captures everything
/// written to it. Reading past the end of the script reports a clean EOF
/// (a zero-length read), matching what a closed real socket would do.
pub(crate) struct MockSocket {
    to_read: VecDeque<u8>,
    written: Vec<u8>,
}

impl MockSocket {
    pub(crate) fn new(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            to_read: script.into_iter().collect(),
            written: Vec::new(),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.written
    }
}

impl AsyncRead for MockSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = buf.remaining().min(self.to_read.len());
        for _ in 0..n {
            buf.put_slice(&[self.to_read.pop_front().expect("checked by min() above")]);
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Appends a standard packet header (3-byte LE length + sequence id) in
/// front of `payload`, mirroring the framing `MySqlStream` expects.
pub(crate) fn framed(seq: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    let len = (payload.len() as u32).to_le_bytes();
    out.extend_from_slice(&len[..3]);
    out.push(seq);
    out.extend_from_slice(payload);
    out
}
