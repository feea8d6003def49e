//! Service-worker cache manager.
//!
//! A [`ServiceWorker`] owns one deployment version of the offline cache.
//! It moves through the lifecycle in [`lifecycle`]:
//!
//! 1. **install** fetches the app shell into `<version>-precache`
//! 2. **activate** deletes caches left by other versions and takes control
//! 3. **handle_fetch** answers intercepted requests through the strategy
//!    [`request::classify`] picks
//!
//! The lifecycle is recorded in a [`Registration`] next to the caches, so
//! separate processes pick up where the last one stopped.

pub mod lifecycle;
pub mod network;
pub mod request;
pub mod response;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use reqwest::Url;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{is_stale, CacheGeneration, CacheStore};
use crate::config::WorkerSettings;
use crate::error::{LarderError, Result};

pub use lifecycle::{ClientMessage, Registration, WorkerState, REGISTRATION_FILE};
pub use network::{HttpNetwork, Network, OfflineNetwork};
pub use request::{classify, FetchRequest, RequestMode, Strategy};
pub use response::FetchResponse;
pub use strategy::ResponseSource;

use strategy::StrategyContext;

/// The worker settings, with URLs parsed.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub version: String,
    pub origin: Url,
    pub scope: String,
    pub offline_page: String,
    pub precache: Vec<String>,
    pub skip_waiting: bool,
}

impl WorkerConfig {
    pub fn from_settings(settings: &WorkerSettings) -> Result<Self> {
        let origin =
            Url::parse(&settings.origin).map_err(|e| LarderError::ConfigValidationError {
                message: format!("worker.origin {:?}: {}", settings.origin, e),
            })?;

        Ok(Self {
            version: settings.version.clone(),
            origin,
            scope: settings.scope.clone(),
            offline_page: settings.offline_page.clone(),
            precache: settings.precache.clone(),
            skip_waiting: settings.skip_waiting,
        })
    }

    /// Absolute URL for a site path; full URLs pass through.
    pub fn resolve(&self, path_or_url: &str) -> Result<Url> {
        self.origin
            .join(path_or_url)
            .map_err(|e| LarderError::Worker {
                message: format!("Invalid URL {:?}: {}", path_or_url, e),
            })
    }

    pub fn precache_generation(&self) -> CacheGeneration {
        CacheGeneration::precache(&self.version)
    }

    pub fn runtime_generation(&self) -> CacheGeneration {
        CacheGeneration::runtime(&self.version)
    }
}

/// Result of an install.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Precache paths stored.
    pub cached: Vec<String>,
    /// Precache paths that could not be stored.
    pub failed: Vec<PrecacheFailure>,
    /// Whether the new version waits behind an older active one.
    pub waiting: bool,
}

#[derive(Debug, Clone)]
pub struct PrecacheFailure {
    pub path: String,
    pub reason: String,
}

/// Result of an activation.
#[derive(Debug, Clone, Default)]
pub struct ActivateReport {
    /// Caches deleted because they belonged to other versions.
    pub deleted: Vec<String>,
}

/// How an intercepted request was answered.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: FetchResponse,
    pub source: ResponseSource,
    pub strategy: Strategy,
    /// False when the worker did not control the request.
    pub intercepted: bool,
    /// Background cache refresh started by stale-while-revalidate.
    pub revalidation: Option<JoinHandle<()>>,
}

/// One version of the worker.
pub struct ServiceWorker<N> {
    config: WorkerConfig,
    state: WorkerState,
    registration: Registration,
    context: StrategyContext<N>,
}

impl<N: Network> ServiceWorker<N> {
    /// A freshly parsed worker that has not installed yet.
    pub fn new(config: WorkerConfig, store: CacheStore, network: Arc<N>) -> Result<Self> {
        let offline_key = config.resolve(&config.offline_page)?.to_string();
        let context = StrategyContext {
            store: Arc::new(store),
            network,
            runtime: config.runtime_generation().name(),
            precache: config.precache_generation().name(),
            offline_key,
        };

        Ok(Self {
            registration: Registration::new(&config.scope),
            state: WorkerState::Parsed,
            config,
            context,
        })
    }

    /// A worker resumed from the registration saved in the cache directory.
    ///
    /// The active version comes back activated, a waiting version comes
    /// back installed, anything else starts over from parsed.
    pub async fn restore(config: WorkerConfig, store: CacheStore, network: Arc<N>) -> Result<Self> {
        let mut worker = Self::new(config, store, network)?;

        if let Some(mut registration) = Registration::load(&worker.registration_path()).await? {
            registration.scope = worker.config.scope.clone();

            let version = Some(worker.config.version.as_str());
            if registration.active.as_deref() == version {
                worker.state = WorkerState::Activated;
            } else if registration.waiting.as_deref() == version {
                worker.state = WorkerState::Installed;
            }

            worker.registration = registration;
        }

        debug!(
            "Restored worker {} in state {}",
            worker.config.version, worker.state
        );
        Ok(worker)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn store(&self) -> &CacheStore {
        &self.context.store
    }

    /// Whether this version is installed but held back by another active one.
    pub fn is_waiting(&self) -> bool {
        self.registration.waiting.as_deref() == Some(self.config.version.as_str())
    }

    fn registration_path(&self) -> PathBuf {
        self.context.store.root().join(REGISTRATION_FILE)
    }

    async fn save_registration(&mut self) -> Result<()> {
        let path = self.registration_path();
        self.registration.save(&path).await?;
        Ok(())
    }

    fn transition(&mut self, next: WorkerState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(LarderError::Worker {
                message: format!(
                    "{} cannot move from {} to {}",
                    self.config.version, self.state, next
                ),
            });
        }

        debug!("Worker {}: {} -> {}", self.config.version, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Precache the app shell.
    ///
    /// Every URL is fetched concurrently. A failed URL is reported and
    /// skipped; it never fails the install.
    pub async fn install(&mut self) -> Result<InstallReport> {
        self.transition(WorkerState::Installing)?;

        let cache = self.context.precache.clone();
        if let Err(e) = self.context.store.open(&cache).await {
            self.state = WorkerState::Redundant;
            return Err(LarderError::Worker {
                message: format!("Failed to open {}: {:#}", cache, e),
            });
        }

        info!(
            "Installing {} ({} precache URLs)",
            self.config.version,
            self.config.precache.len()
        );

        let mut report = InstallReport::default();
        let mut tasks = Vec::new();

        for path in &self.config.precache {
            let url = match self.config.resolve(path) {
                Ok(url) => url,
                Err(e) => {
                    report.failed.push(PrecacheFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let store = Arc::clone(&self.context.store);
            let network = Arc::clone(&self.context.network);
            let cache = cache.clone();
            let task = tokio::spawn(async move { precache_one(&store, &*network, &cache, url).await });
            tasks.push((path.clone(), task));
        }

        for (path, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(anyhow::anyhow!("precache task failed: {}", e)),
            };

            match outcome {
                Ok(()) => report.cached.push(path),
                Err(e) => {
                    warn!("Failed to precache {}: {:#}", path, e);
                    report.failed.push(PrecacheFailure {
                        path,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        self.transition(WorkerState::Installed)?;

        let other_active = self
            .registration
            .active
            .as_deref()
            .is_some_and(|active| active != self.config.version);

        if other_active && !self.config.skip_waiting {
            info!("{} installed and waiting", self.config.version);
            self.registration.waiting = Some(self.config.version.clone());
            report.waiting = true;
        } else {
            self.registration.waiting = None;
        }

        self.save_registration().await?;

        info!(
            "Installed {}: {} cached, {} failed",
            self.config.version,
            report.cached.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Delete other versions' caches and take control.
    pub async fn activate(&mut self) -> Result<ActivateReport> {
        if self.is_waiting() {
            return Err(LarderError::Worker {
                message: format!(
                    "{} is waiting for the active worker; send SKIP_WAITING to activate it",
                    self.config.version
                ),
            });
        }

        self.transition(WorkerState::Activating)?;

        let mut report = ActivateReport::default();
        match self.context.store.names().await {
            Ok(names) => {
                for name in names {
                    if !is_stale(&name, &self.config.version) {
                        continue;
                    }

                    match self.context.store.delete(&name).await {
                        Ok(_) => {
                            info!("Deleted old cache {}", name);
                            report.deleted.push(name);
                        }
                        Err(e) => warn!("Failed to delete old cache {}: {:#}", name, e),
                    }
                }
            }
            Err(e) => warn!("Failed to list caches, skipping cleanup: {:#}", e),
        }

        self.transition(WorkerState::Activated)?;
        self.registration.active = Some(self.config.version.clone());
        self.registration.waiting = None;
        self.save_registration().await?;

        info!(
            "Activated {}, controlling {}",
            self.config.version, self.config.scope
        );
        Ok(report)
    }

    /// Handle a message posted by a page.
    ///
    /// `SKIP_WAITING` promotes a waiting worker and activates it; returns
    /// the activation report when that happened. Other messages are ignored.
    pub async fn post_message(&mut self, raw: &str) -> Result<Option<ActivateReport>> {
        match ClientMessage::parse(raw) {
            Some(ClientMessage::SkipWaiting) => {
                if self.state != WorkerState::Installed {
                    debug!("SKIP_WAITING ignored in state {}", self.state);
                    return Ok(None);
                }

                info!("Skipping wait for {}", self.config.version);
                self.registration.waiting = None;
                self.activate().await.map(Some)
            }
            None => {
                debug!("Ignoring message {}", raw);
                Ok(None)
            }
        }
    }

    /// Answer a request the page made.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchOutcome {
        if !self.controls(request) {
            debug!("Not intercepting {} {}", request.method, request.url);
            let (response, source) = self.context.network_only(request).await;
            return FetchOutcome {
                response,
                source,
                strategy: Strategy::NetworkOnly,
                intercepted: false,
                revalidation: None,
            };
        }

        let strategy = classify(request, &self.config.origin);
        debug!("{} {} via {}", request.method, request.url, strategy);

        let mut revalidation = None;
        let (response, source) = match strategy {
            Strategy::PassThrough | Strategy::NetworkOnly => {
                self.context.network_only(request).await
            }
            Strategy::NetworkFirst => self.context.network_first(request).await,
            Strategy::StaleWhileRevalidate => {
                let (response, source, handle) =
                    self.context.stale_while_revalidate(request).await;
                revalidation = handle;
                (response, source)
            }
            Strategy::CacheFirst => self.context.cache_first(request).await,
        };

        FetchOutcome {
            response,
            source,
            strategy,
            intercepted: true,
            revalidation,
        }
    }

    /// Active workers control everything except navigations outside scope.
    fn controls(&self, request: &FetchRequest) -> bool {
        if self.state != WorkerState::Activated {
            return false;
        }

        if request.is_navigation() && request.is_same_origin(&self.config.origin) {
            return request.url.path().starts_with(&self.config.scope);
        }

        true
    }
}

async fn precache_one<N: Network>(
    store: &CacheStore,
    network: &N,
    cache: &str,
    url: Url,
) -> anyhow::Result<()> {
    let request = FetchRequest::get(url);
    let response = network.fetch(&request).await?;

    if !response.is_cacheable() {
        anyhow::bail!("HTTP {} fetching {}", response.status, request.url);
    }

    store.put(cache, &request.cache_key(), &response).await?;
    Ok(())
}
