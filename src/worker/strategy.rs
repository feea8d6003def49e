//! Caching strategies.
//!
//! Every strategy ends in a response: when neither the network nor any
//! cache can answer, the result is a synthesized 503. Cache failures are
//! logged and treated as misses.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::network::Network;
use super::request::FetchRequest;
use super::response::FetchResponse;
use crate::cache::CacheStore;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// The precached offline page, standing in for a failed navigation.
    OfflinePage,
    /// Generated by the worker.
    Synthesized,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::OfflinePage => "offline page",
            Self::Synthesized => "synthesized",
        }
    }
}

/// Caches and network a strategy works against. Cheap to clone.
pub(crate) struct StrategyContext<N> {
    pub store: Arc<CacheStore>,
    pub network: Arc<N>,
    /// Current runtime cache name; the only cache strategies write to.
    pub runtime: String,
    /// Current precache name.
    pub precache: String,
    /// Cache key of the offline page.
    pub offline_key: String,
}

impl<N> Clone for StrategyContext<N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            network: Arc::clone(&self.network),
            runtime: self.runtime.clone(),
            precache: self.precache.clone(),
            offline_key: self.offline_key.clone(),
        }
    }
}

impl<N: Network> StrategyContext<N> {
    /// Search the current caches, runtime first.
    pub async fn lookup(&self, key: &str) -> Option<FetchResponse> {
        for name in [&self.runtime, &self.precache] {
            match self.store.lookup(name, key).await {
                Ok(Some(response)) => return Some(response),
                Ok(None) => {}
                Err(e) => warn!("Cache read from {} failed: {:#}", name, e),
            }
        }
        None
    }

    /// Write a response into the runtime cache if it is cacheable.
    async fn remember(&self, key: &str, response: &FetchResponse) {
        if !response.is_cacheable() {
            debug!("Not caching {} (status {})", key, response.status);
            return;
        }

        if let Err(e) = self.store.put(&self.runtime, key, response).await {
            warn!("Cache write to {} failed: {:#}", self.runtime, e);
        }
    }

    /// Network, else cached copy, else the offline page, else 503.
    pub async fn network_first(&self, request: &FetchRequest) -> (FetchResponse, ResponseSource) {
        let key = request.cache_key();

        match self.network.fetch(request).await {
            Ok(response) => {
                self.remember(&key, &response).await;
                (response, ResponseSource::Network)
            }
            Err(e) => {
                debug!("Network failed for {}: {:#}", key, e);

                if let Some(cached) = self.lookup(&key).await {
                    return (cached, ResponseSource::Cache);
                }
                if let Some(offline) = self.lookup(&self.offline_key).await {
                    return (offline, ResponseSource::OfflinePage);
                }
                (
                    FetchResponse::service_unavailable(),
                    ResponseSource::Synthesized,
                )
            }
        }
    }

    /// Cached copy now with a background refresh, or the network on a miss.
    ///
    /// The returned handle completes once the refresh has been written.
    pub async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
    ) -> (FetchResponse, ResponseSource, Option<JoinHandle<()>>) {
        let key = request.cache_key();

        if let Some(cached) = self.lookup(&key).await {
            let context = self.clone();
            let request = request.clone();
            let handle = tokio::spawn(async move {
                context.revalidate(&request).await;
            });
            return (cached, ResponseSource::Cache, Some(handle));
        }

        let (response, source) = self.fetch_and_remember(request).await;
        (response, source, None)
    }

    async fn revalidate(&self, request: &FetchRequest) {
        let key = request.cache_key();

        match self.network.fetch(request).await {
            Ok(response) => {
                debug!("Refreshed {} (status {})", key, response.status);
                self.remember(&key, &response).await;
            }
            Err(e) => debug!("Background refresh of {} failed: {:#}", key, e),
        }
    }

    /// Cached copy, else the network (and remember it).
    pub async fn cache_first(&self, request: &FetchRequest) -> (FetchResponse, ResponseSource) {
        if let Some(cached) = self.lookup(&request.cache_key()).await {
            return (cached, ResponseSource::Cache);
        }

        self.fetch_and_remember(request).await
    }

    async fn fetch_and_remember(&self, request: &FetchRequest) -> (FetchResponse, ResponseSource) {
        let key = request.cache_key();

        match self.network.fetch(request).await {
            Ok(response) => {
                self.remember(&key, &response).await;
                (response, ResponseSource::Network)
            }
            Err(e) => {
                debug!("Network failed for {}: {:#}", key, e);
                (
                    FetchResponse::service_unavailable(),
                    ResponseSource::Synthesized,
                )
            }
        }
    }

    /// Network without touching any cache; 503 if it fails.
    pub async fn network_only(&self, request: &FetchRequest) -> (FetchResponse, ResponseSource) {
        match self.network.fetch(request).await {
            Ok(response) => (response, ResponseSource::Network),
            Err(e) => {
                debug!("Network failed for {}: {:#}", request.url, e);
                (
                    FetchResponse::service_unavailable(),
                    ResponseSource::Synthesized,
                )
            }
        }
    }
}
