//! Request and response types exchanged with the network collaborator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{MEDIA_ERR_NETWORK, MEDIA_ERR_SRC_NOT_SUPPORTED};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one issued request. Responses carrying an id the state
/// machines no longer wait for are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Playlist,
    Segment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: RequestId,
    pub url: String,
    pub kind: RequestKind,
    pub with_credentials: bool,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(
        url: impl Into<String>,
        kind: RequestKind,
        with_credentials: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            id: RequestId::next(),
            url: url.into(),
            kind,
            with_credentials,
            timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub id: RequestId,
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: Bytes,
    /// Time from issuing the request to receiving the last body byte.
    pub elapsed: Duration,
}

impl FetchResponse {
    /// Measured throughput in bits per second.
    pub fn throughput(&self) -> f64 {
        let millis = self.elapsed.as_millis().max(1) as f64;
        self.body.len() as f64 * 8.0 * 1000.0 / millis
    }
}

/// A request that produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Request for {url} failed with status {status}: {message}")]
pub struct FetchError {
    /// HTTP status, or 0 when no response was received.
    pub status: u16,
    pub message: String,
    pub url: String,
}

impl FetchError {
    pub fn new(status: u16, message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Server errors map to `MEDIA_ERR_SRC_NOT_SUPPORTED`, anything else to
    /// `MEDIA_ERR_NETWORK`.
    pub fn code(&self) -> u16 {
        if self.status >= 500 {
            MEDIA_ERR_SRC_NOT_SUPPORTED
        } else {
            MEDIA_ERR_NETWORK
        }
    }
}

/// Network transport used by the driver.
///
/// A status of 400 or above, or no response at all, must be reported as a
/// [`FetchError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FetchError::new(0, "timeout", "u").code(), MEDIA_ERR_NETWORK);
        assert_eq!(FetchError::new(404, "missing", "u").code(), MEDIA_ERR_NETWORK);
        assert_eq!(
            FetchError::new(500, "boom", "u").code(),
            MEDIA_ERR_SRC_NOT_SUPPORTED
        );
        assert_eq!(
            FetchError::new(503, "busy", "u").code(),
            MEDIA_ERR_SRC_NOT_SUPPORTED
        );
    }

    #[test]
    fn test_throughput() {
        let response = FetchResponse {
            id: RequestId::next(),
            url: "seg.ts".to_string(),
            status: 200,
            body: Bytes::from(vec![0u8; 125_000]),
            elapsed: Duration::from_millis(500),
        };
        assert_eq!(response.throughput(), 2_000_000.0);

        let instant = FetchResponse {
            elapsed: Duration::ZERO,
            ..response
        };
        assert_eq!(instant.throughput(), 1_000_000_000.0);
    }
}
