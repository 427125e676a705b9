//! Single-read request body capture and replay.
//!
//! # Responsibilities
//! - Drain the transport body stream exactly once
//! - Bound the drain by a deadline and a byte limit
//! - Hand out independent replay views over the captured bytes
//!
//! # Design Decisions
//! - Materialize once into an immutable `Bytes`; replays are refcount clones
//! - The live transport stream is never re-wrapped after draining
//! - A stalled or dropped client yields an empty, non-complete body rather
//!   than suspending the request forever

use axum::body::{Body, Bytes};
use futures_util::{stream, StreamExt};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// How the drain of a request body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The terminating chunk arrived.
    Complete,
    /// The transport reported an error mid-body.
    Disconnected,
    /// The capture deadline elapsed first.
    TimedOut,
}

/// Limits applied while draining.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub timeout: Duration,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// A fully materialized request body.
///
/// Cloning is cheap and every clone replays the same bytes.
#[derive(Debug, Clone)]
pub struct BufferedBody {
    bytes: Bytes,
    completion: Completion,
}

impl BufferedBody {
    /// Wrap bytes that were received in full.
    pub fn complete(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            completion: Completion::Complete,
        }
    }

    fn interrupted(completion: Completion) -> Self {
        Self {
            bytes: Bytes::new(),
            completion,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A fresh body yielding exactly the captured bytes.
    ///
    /// For an interrupted capture the body yields a single I/O error so the
    /// reader sees the same disconnect it would have seen on the live stream.
    pub fn replay(&self) -> Body {
        let kind = match self.completion {
            Completion::Complete => return Body::from(self.bytes.clone()),
            Completion::Disconnected => io::ErrorKind::ConnectionAborted,
            Completion::TimedOut => io::ErrorKind::TimedOut,
        };
        let err = io::Error::new(kind, "client disconnected during body capture");
        Body::from_stream(stream::iter([Err::<Bytes, io::Error>(err)]))
    }
}

/// Drain `body` to completion, or until the deadline or size limit hits.
pub async fn capture(body: Body, options: CaptureOptions) -> Result<BufferedBody, CaptureError> {
    match tokio::time::timeout(options.timeout, drain(body, options.max_bytes)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(timeout = ?options.timeout, "Body capture timed out");
            Ok(BufferedBody::interrupted(Completion::TimedOut))
        }
    }
}

async fn drain(body: Body, max_bytes: usize) -> Result<BufferedBody, CaptureError> {
    let mut chunks = body.into_data_stream();
    let mut first: Option<Bytes> = None;
    let mut buf: Vec<u8> = Vec::new();
    let mut len = 0usize;

    while let Some(chunk) = chunks.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(error = %e, received = len, "Client disconnected during body capture");
                return Ok(BufferedBody::interrupted(Completion::Disconnected));
            }
        };
        if chunk.is_empty() {
            continue;
        }

        len += chunk.len();
        if len > max_bytes {
            return Err(CaptureError::TooLarge { limit: max_bytes });
        }

        // Single-chunk bodies are kept without copying.
        match first.take() {
            None if buf.is_empty() => first = Some(chunk),
            None => buf.extend_from_slice(&chunk),
            Some(prev) => {
                buf.reserve(prev.len() + chunk.len());
                buf.extend_from_slice(&prev);
                buf.extend_from_slice(&chunk);
            }
        }
    }

    let bytes = match first {
        Some(only) => only,
        None => Bytes::from(buf),
    };
    Ok(BufferedBody::complete(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn options() -> CaptureOptions {
        CaptureOptions {
            timeout: Duration::from_secs(1),
            max_bytes: 1024,
        }
    }

    fn chunked(parts: &[&'static str]) -> Body {
        let items: Vec<Result<Bytes, Infallible>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        Body::from_stream(stream::iter(items))
    }

    async fn read_all(body: Body) -> Result<Bytes, axum::Error> {
        axum::body::to_bytes(body, usize::MAX).await
    }

    #[tokio::test]
    async fn empty_body() {
        let captured = capture(Body::empty(), options()).await.unwrap();
        assert!(captured.is_complete());
        assert!(captured.is_empty());
        assert!(read_all(captured.replay()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_chunk() {
        let captured = capture(Body::from("{\"a\":1}"), options()).await.unwrap();
        assert_eq!(captured.bytes().as_ref(), b"{\"a\":1}");
    }

    #[tokio::test]
    async fn many_chunks_preserve_order() {
        let body = chunked(&["{\"na", "me\":", " \"ali", "ce\"}"]);
        let captured = capture(body, options()).await.unwrap();
        assert!(captured.is_complete());
        assert_eq!(captured.bytes().as_ref(), b"{\"name\": \"alice\"}");
    }

    #[tokio::test]
    async fn replay_is_repeatable() {
        let captured = capture(chunked(&["ab", "", "cd", "ef"]), options()).await.unwrap();
        for _ in 0..3 {
            assert_eq!(read_all(captured.replay()).await.unwrap().as_ref(), b"abcdef");
        }
        let clone = captured.clone();
        assert_eq!(read_all(clone.replay()).await.unwrap().as_ref(), b"abcdef");
    }

    #[tokio::test]
    async fn stalled_stream_times_out() {
        let stalled = stream::iter([Ok::<Bytes, Infallible>(Bytes::from_static(b"{\"partial"))])
            .chain(stream::pending());
        let opts = CaptureOptions {
            timeout: Duration::from_millis(50),
            max_bytes: 1024,
        };

        let captured = capture(Body::from_stream(stalled), opts).await.unwrap();
        assert_eq!(captured.completion(), Completion::TimedOut);
        assert!(captured.is_empty());
        assert!(read_all(captured.replay()).await.is_err());
    }

    #[tokio::test]
    async fn transport_error_is_disconnect() {
        let broken = stream::iter([
            Ok(Bytes::from_static(b"{\"a\":")),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "reset")),
        ]);
        let captured = capture(Body::from_stream(broken), options()).await.unwrap();
        assert_eq!(captured.completion(), Completion::Disconnected);
        assert!(captured.is_empty());
        assert!(read_all(captured.replay()).await.is_err());
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let opts = CaptureOptions {
            timeout: Duration::from_secs(1),
            max_bytes: 4,
        };
        let err = capture(chunked(&["abc", "de"]), opts).await.unwrap_err();
        assert_eq!(err, CaptureError::TooLarge { limit: 4 });
    }
}
