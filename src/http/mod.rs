//! HTTP transport: a single configurable client and the `Transport` seam
//! the fetch pipeline depends on.

mod client;
mod error;

use anyhow::Result;
use async_trait::async_trait;

pub use client::{DEFAULT_TIMEOUT, HttpClient, HttpConfig};
pub use error::HttpStatusError;

/// Fetches raw response bodies.
///
/// One call issues exactly one GET. Any status other than 200 is an
/// error carrying an [`HttpStatusError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the whole body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
