// Outgoing byte stream adapter
//
// hyper answers requests it cannot parse (400, 431, ...) on its own, without
// calling the service. Those heads never pass through `CrossOriginIsolation`,
// so the isolation headers are spliced in here, right after the status line.
//
// Responses produced by the service are tracked through `ResponseLedger`:
// each one records its body length, so the adapter knows where the next
// head starts and never touches body bytes.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};

use hyper::body::Body;
use hyper::header::CONTENT_LENGTH;
use hyper::{Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Header lines added to heads hyper generates itself
const ISOLATION_LINES: &[u8] =
    b"Cross-Origin-Opener-Policy: same-origin\r\nCross-Origin-Embedder-Policy: require-corp\r\n";

/// Body lengths of service responses, in the order hyper will write them.
///
/// `None` means the framing is unknown to us (no length), in which case
/// the adapter stops inspecting the connection.
#[derive(Debug, Default)]
pub struct ResponseLedger {
    pending: Mutex<VecDeque<Option<u64>>>,
}

impl ResponseLedger {
    /// Record a response the service is about to hand to hyper.
    pub fn record<B: Body>(&self, response: &Response<B>, is_head: bool) {
        let status = response.status();
        let body_len = if is_head
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            Some(0)
        } else {
            response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .or_else(|| response.body().size_hint().exact())
        };

        self.queue().push_back(body_len);
    }

    fn next(&self) -> Option<Option<u64>> {
        self.queue().pop_front()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Option<u64>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireState {
    /// Next byte written starts a response head
    Boundary,
    /// Status line of a head hyper made itself; `cr` is set after a `\r`
    StatusLine { cr: bool },
    /// Header block; `matched` counts bytes of `\r\n\r\n` seen so far
    Head { matched: u8, body: u64 },
    Body { remaining: u64 },
    /// Framing unknown; bytes pass straight through
    Passthrough,
}

/// Stream wrapper that adds the isolation headers to hyper-generated heads.
#[derive(Debug)]
pub struct IsolatedStream<S> {
    inner: S,
    ledger: Arc<ResponseLedger>,
    state: WireState,
    /// Offset into `ISOLATION_LINES` still owed to the peer
    splice: Option<usize>,
}

impl<S> IsolatedStream<S> {
    pub const fn new(inner: S, ledger: Arc<ResponseLedger>) -> Self {
        Self {
            inner,
            ledger,
            state: WireState::Boundary,
            splice: None,
        }
    }

    /// Length of the prefix of `buf` that stays within the current phase.
    fn phase_len(&self, buf: &[u8]) -> usize {
        match self.state {
            WireState::StatusLine { cr } => {
                let mut prev_cr = cr;
                for (i, &b) in buf.iter().enumerate() {
                    if prev_cr && b == b'\n' {
                        return i + 1;
                    }
                    prev_cr = b == b'\r';
                }
                buf.len()
            }
            WireState::Head { mut matched, .. } => {
                for (i, &b) in buf.iter().enumerate() {
                    matched = next_matched(matched, b);
                    if matched == 4 {
                        return i + 1;
                    }
                }
                buf.len()
            }
            WireState::Body { remaining } => {
                usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()))
            }
            WireState::Boundary | WireState::Passthrough => buf.len(),
        }
    }

    /// Decide who produced the head that is about to be written.
    fn start_head(&mut self) {
        self.state = match self.ledger.next() {
            Some(Some(body)) => WireState::Head { matched: 0, body },
            Some(None) => WireState::Passthrough,
            None => WireState::StatusLine { cr: false },
        };
    }

    /// Advance over bytes the inner stream accepted.
    fn advance(&mut self, written: &[u8]) {
        let Some(&last) = written.last() else {
            return;
        };

        self.state = match self.state {
            WireState::StatusLine { cr } => {
                let ended = (written.len() == 1 && cr && last == b'\n')
                    || written.ends_with(b"\r\n");
                if ended {
                    self.splice = Some(0);
                    // The status line's CRLF counts towards the head terminator
                    WireState::Head { matched: 2, body: 0 }
                } else {
                    WireState::StatusLine { cr: last == b'\r' }
                }
            }
            WireState::Head { mut matched, body } => {
                for &b in written {
                    matched = next_matched(matched, b);
                }
                match (matched, body) {
                    (4, 0) => WireState::Boundary,
                    (4, remaining) => WireState::Body { remaining },
                    _ => WireState::Head { matched, body },
                }
            }
            WireState::Body { remaining } => {
                let left = remaining.saturating_sub(written.len() as u64);
                if left == 0 {
                    WireState::Boundary
                } else {
                    WireState::Body { remaining: left }
                }
            }
            other => other,
        };
    }
}

const fn next_matched(matched: u8, b: u8) -> u8 {
    match (matched, b) {
        (0 | 2, b'\r') => matched + 1,
        (1 | 3, b'\n') => matched + 1,
        (_, b'\r') => 1,
        _ => 0,
    }
}

impl<S: AsyncWrite + Unpin> IsolatedStream<S> {
    /// Write out any spliced header bytes still pending.
    fn poll_splice(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while let Some(offset) = self.splice {
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, &ISOLATION_LINES[offset..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            let offset = offset + n;
            self.splice = (offset < ISOLATION_LINES.len()).then_some(offset);
        }
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IsolatedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IsolatedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_splice(cx))?;

        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        if this.state == WireState::Boundary {
            this.start_head();
        }

        let len = this.phase_len(buf);
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, &buf[..len]))?;
        this.advance(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_splice(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_splice(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
