//! Worker command implementation.
//!
//! Provides `larder worker install`, `activate`, `message`, `fetch` and
//! `status`. Each invocation resumes the lifecycle from the registration
//! saved next to the caches.

use std::sync::Arc;

use clap::{Args, Subcommand};
use reqwest::Method;
use std::time::Duration;

use crate::cache::{CacheGeneration, CacheStore};
use crate::cli::args::{MessageKind, WorkerOverrides};
use crate::error::{LarderError, Result};
use crate::ui::{format_bytes, format_relative_time, UserInterface};
use crate::worker::{
    ActivateReport, FetchRequest, HttpNetwork, Network, OfflineNetwork, ServiceWorker,
    WorkerConfig, WorkerState,
};

use super::common::{cache_store, runtime, ConfigSource};
use super::dispatcher::{Command, CommandResult};

/// Arguments for the worker command.
#[derive(Debug, Clone, Args)]
pub struct WorkerArgs {
    #[command(flatten)]
    pub overrides: WorkerOverrides,

    #[command(subcommand)]
    pub command: WorkerSubcommand,
}

/// Worker subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum WorkerSubcommand {
    /// Precache the app shell, then activate unless another version is active.
    Install,
    /// Delete other versions' caches and take control.
    Activate,
    /// Post a control message as a page would.
    Message {
        #[arg(value_enum)]
        kind: MessageKind,
    },
    /// Route one request through the worker and report how it was answered.
    Fetch {
        /// Site path (`/menu`) or absolute URL.
        target: String,
        /// Treat the request as a page navigation.
        #[arg(long)]
        navigate: bool,
        /// Simulate a dropped connection.
        #[arg(long)]
        offline: bool,
        /// HTTP method.
        #[arg(long, default_value = "GET")]
        method: String,
        /// Print the response body.
        #[arg(long)]
        body: bool,
    },
    /// Show the registration and current cache generation.
    Status,
}

/// The worker command implementation.
pub struct WorkerCommand {
    source: ConfigSource,
    args: WorkerArgs,
}

impl WorkerCommand {
    /// Create a new worker command.
    pub fn new(source: ConfigSource, args: WorkerArgs) -> Self {
        Self { source, args }
    }
}

impl Command for WorkerCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self
            .source
            .resolve(|c| self.args.overrides.apply(&mut c.worker))?;
        let worker_config = WorkerConfig::from_settings(&config.worker)?;
        let store = cache_store(&config.worker);
        let timeout = Duration::from_secs(config.worker.timeout_secs);

        let rt = runtime()?;
        match &self.args.command {
            WorkerSubcommand::Fetch {
                target,
                navigate,
                offline,
                method,
                body,
            } => {
                let url = worker_config.resolve(target)?;
                let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|e| LarderError::Worker {
                        message: format!("Invalid method {:?}: {}", method, e),
                    })?;
                let request = if *navigate {
                    FetchRequest::navigate(url)
                } else {
                    FetchRequest::get(url)
                }
                .with_method(method);

                if *offline {
                    rt.block_on(fetch(
                        worker_config,
                        store,
                        Arc::new(OfflineNetwork),
                        request,
                        *body,
                        ui,
                    ))
                } else {
                    let network = Arc::new(HttpNetwork::with_timeout(timeout)?);
                    rt.block_on(fetch(worker_config, store, network, request, *body, ui))
                }
            }
            command => {
                let network = Arc::new(HttpNetwork::with_timeout(timeout)?);
                rt.block_on(async {
                    let worker = ServiceWorker::restore(worker_config, store, network).await?;
                    match command {
                        WorkerSubcommand::Install => install(worker, ui).await,
                        WorkerSubcommand::Activate => activate(worker, ui).await,
                        WorkerSubcommand::Message { kind } => message(worker, *kind, ui).await,
                        _ => status(worker, ui).await,
                    }
                })
            }
        }
    }
}

async fn install<N: Network>(
    mut worker: ServiceWorker<N>,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let version = worker.config().version.clone();

    match worker.state() {
        WorkerState::Activated => {
            ui.success(&format!("{} is already active", version));
            return Ok(CommandResult::success());
        }
        WorkerState::Installed => {
            ui.warning(&format!(
                "{} is installed and waiting; run `larder worker message skip-waiting`",
                version
            ));
            return Ok(CommandResult::success());
        }
        _ => {}
    }

    ui.message(&format!(
        "Installing {} from {}",
        version,
        worker.config().origin
    ));
    let report = worker.install().await?;

    for failure in &report.failed {
        ui.warning(&format!("{}: {}", failure.path, failure.reason));
    }
    ui.success(&format!(
        "Precached {} of {} URLs into {}",
        report.cached.len(),
        report.cached.len() + report.failed.len(),
        worker.config().precache_generation()
    ));

    if report.waiting {
        ui.warning(&format!(
            "{} is waiting for the active version; run `larder worker message skip-waiting`",
            version
        ));
        return Ok(CommandResult::success());
    }

    let report = worker.activate().await?;
    show_activation(&version, &report, ui);
    Ok(CommandResult::success())
}

async fn activate<N: Network>(
    mut worker: ServiceWorker<N>,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    if worker.state() == WorkerState::Activated {
        ui.success(&format!("{} is already active", worker.config().version));
        return Ok(CommandResult::success());
    }

    let version = worker.config().version.clone();
    let report = worker.activate().await?;
    show_activation(&version, &report, ui);
    Ok(CommandResult::success())
}

async fn message<N: Network>(
    mut worker: ServiceWorker<N>,
    kind: MessageKind,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let version = worker.config().version.clone();

    match worker.post_message(kind.to_json()).await? {
        Some(report) => show_activation(&version, &report, ui),
        None => ui.message(&format!("No waiting worker for {}; nothing to do", version)),
    }

    Ok(CommandResult::success())
}

fn show_activation(version: &str, report: &ActivateReport, ui: &mut dyn UserInterface) {
    for name in &report.deleted {
        ui.message(&format!("Deleted old cache {}", name));
    }
    ui.success(&format!("{} activated", version));
}

async fn status<N: Network>(
    worker: ServiceWorker<N>,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let config = worker.config();
    let registration = worker.registration();
    let store = worker.store();

    ui.show_header("Worker status");
    ui.show_detail("Version", &config.version);
    ui.show_detail("State", worker.state().as_str());
    ui.show_detail("Origin", config.origin.as_str());
    ui.show_detail("Scope", &registration.scope);
    ui.show_detail(
        "Active",
        registration.active.as_deref().unwrap_or("none"),
    );
    ui.show_detail(
        "Waiting",
        registration.waiting.as_deref().unwrap_or("none"),
    );
    if let Some(updated) = registration.updated_at {
        ui.show_detail("Updated", &format_relative_time(updated));
    }
    ui.show_detail("Cache dir", &store.root().display().to_string());

    for generation in [config.precache_generation(), config.runtime_generation()] {
        ui.show_detail(
            generation.kind.marker(),
            &describe_cache(store, &generation).await,
        );
    }

    Ok(CommandResult::success())
}

async fn describe_cache(store: &CacheStore, generation: &CacheGeneration) -> String {
    let name = generation.name();
    if !store.has(&name).await {
        return format!("{} (missing)", name);
    }

    match store.entries(&name).await {
        Ok(entries) => {
            let size: u64 = entries.iter().map(|e| e.metadata.size_bytes).sum();
            format!(
                "{} ({} entries, {})",
                name,
                entries.len(),
                format_bytes(size)
            )
        }
        Err(e) => format!("{} (unreadable: {:#})", name, e),
    }
}

async fn fetch<N: Network>(
    config: WorkerConfig,
    store: CacheStore,
    network: Arc<N>,
    request: FetchRequest,
    show_body: bool,
    ui: &mut dyn UserInterface,
) -> Result<CommandResult> {
    let worker = ServiceWorker::restore(config, store, network).await?;
    let outcome = worker.handle_fetch(&request).await;

    if !outcome.intercepted {
        ui.warning(&format!(
            "Worker {} is {}; request went straight to the network",
            worker.config().version,
            worker.state()
        ));
    }

    let response = &outcome.response;
    ui.show_detail("URL", request.url.as_str());
    ui.show_detail("Strategy", outcome.strategy.name());
    ui.show_detail("Source", outcome.source.as_str());
    ui.show_detail("Status", &response.status.to_string());
    if let Some(content_type) = response.header("content-type") {
        ui.show_detail("Type", content_type);
    }
    ui.show_detail("Size", &format_bytes(response.body.len() as u64));

    if let Some(handle) = outcome.revalidation {
        if handle.await.is_ok() {
            ui.message("Refreshed the cached copy in the background");
        }
    }

    if show_body {
        ui.message(&response.text());
    }

    ui.message(&format!("{} {}", response.status, outcome.source.as_str()));

    Ok(if response.status < 400 {
        CommandResult::success()
    } else {
        CommandResult::failure(1)
    })
}
