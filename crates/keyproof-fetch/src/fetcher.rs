//! Fetcher abstraction for proof content.
//!
//! Implementations may use HTTP or any other transport; they only have to
//! classify failures through [`FetchError`].

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::Result;

/// Retrieves proof content by URL.
///
/// Implementations must be thread-safe (Send + Sync). A fetch may block on
/// I/O; callers bound it with their own deadline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        (**self).fetch(url).await
    }
}

/// A scripted in-memory fetcher for testing.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::RwLock;
    use tracing::debug;

    use crate::error::FetchError;

    /// What a scripted URL answers with.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockResponse {
        Body(Bytes),
        Status(u16),
        NetworkError(String),
    }

    /// In-memory fetcher. Unknown URLs answer 404.
    #[derive(Debug, Default)]
    pub struct MemoryFetcher {
        responses: RwLock<HashMap<Url, MockResponse>>,
        delay: RwLock<Option<Duration>>,
        requests: AtomicUsize,
    }

    impl MemoryFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_response(&self, url: &Url, response: MockResponse) {
            self.responses.write().await.insert(url.clone(), response);
        }

        /// Serve `body` with a success status.
        pub async fn set_body(&self, url: &Url, body: impl Into<Bytes>) {
            self.set_response(url, MockResponse::Body(body.into())).await;
        }

        /// Answer with a non-success HTTP status.
        pub async fn set_status(&self, url: &Url, status: u16) {
            self.set_response(url, MockResponse::Status(status)).await;
        }

        pub async fn set_network_error(&self, url: &Url, message: &str) {
            self.set_response(url, MockResponse::NetworkError(message.to_string()))
                .await;
        }

        pub async fn remove(&self, url: &Url) {
            self.responses.write().await.remove(url);
        }

        /// Hold every fetch for `delay` before answering.
        pub async fn set_delay(&self, delay: Option<Duration>) {
            *self.delay.write().await = delay;
        }

        /// Number of fetches served so far.
        pub fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MemoryFetcher {
        async fn fetch(&self, url: &Url) -> Result<Bytes> {
            self.requests.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.read().await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let response = self.responses.read().await.get(url).cloned();
            debug!(%url, ?response, "memory fetch");
            match response {
                Some(MockResponse::Body(body)) => Ok(body),
                Some(MockResponse::Status(status)) if (200..300).contains(&status) => {
                    Ok(Bytes::new())
                }
                Some(MockResponse::Status(status)) => Err(FetchError::from_status(status)),
                Some(MockResponse::NetworkError(msg)) => Err(FetchError::Network(msg)),
                None => Err(FetchError::NotFound { status: 404 }),
            }
        }
    }
}
