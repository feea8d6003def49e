//! Cache command implementation.
//!
//! Provides `larder cache list`, `larder cache clear`, etc.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cache::{CacheGeneration, CacheStore};
use crate::cli::args::WorkerOverrides;
use crate::ui::{format_bytes, format_relative_time, Align, OutputMode, Table, UserInterface};
use crate::worker::REGISTRATION_FILE;

use super::common::{cache_store, runtime, ConfigSource};
use super::dispatcher::{Command, CommandResult};

/// Arguments for the cache command.
#[derive(Debug, Clone, Args)]
pub struct CacheArgs {
    #[command(flatten)]
    pub overrides: WorkerOverrides,

    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// List caches.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete caches.
    Clear {
        /// Only delete caches left by other versions.
        #[arg(long)]
        stale: bool,
        /// Don't prompt for confirmation.
        #[arg(short, long)]
        force: bool,
    },
    /// Show cache statistics.
    Stats,
}

/// How a cache relates to the configured version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Current,
    Stale,
    /// Not named by the version convention; never touched by activation.
    Foreign,
}

/// One row of `cache list`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub name: String,
    pub status: CacheStatus,
    pub entries: usize,
    pub size_bytes: u64,
}

/// The cache command implementation.
pub struct CacheCommand {
    source: ConfigSource,
    args: CacheArgs,
}

impl CacheCommand {
    /// Create a new cache command.
    pub fn new(source: ConfigSource, args: CacheArgs) -> Self {
        Self { source, args }
    }
}

impl Command for CacheCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> crate::error::Result<CommandResult> {
        let config = self
            .source
            .resolve(|c| self.args.overrides.apply(&mut c.worker))?;
        let store = cache_store(&config.worker);
        let version = config.worker.version.as_str();

        let exit_code = runtime()?.block_on(async {
            match &self.args.command {
                CacheSubcommand::List { json } => list_caches(&store, version, *json, ui).await,
                CacheSubcommand::Clear { stale, force } => {
                    clear_caches(&store, version, *stale, *force, ui).await
                }
                CacheSubcommand::Stats => show_stats(&store, version, ui).await,
            }
        })?;

        Ok(if exit_code == 0 {
            CommandResult::success()
        } else {
            CommandResult::failure(exit_code)
        })
    }
}

fn status_of(name: &str, version: &str) -> CacheStatus {
    match CacheGeneration::parse(name) {
        Some(generation) if generation.belongs_to(version) => CacheStatus::Current,
        Some(_) => CacheStatus::Stale,
        None => CacheStatus::Foreign,
    }
}

/// Summarize every cache in the store.
pub async fn summarize(store: &CacheStore, version: &str) -> Result<Vec<CacheSummary>> {
    let mut summaries = Vec::new();

    for name in store.names().await? {
        let entries = store.entries(&name).await?;
        summaries.push(CacheSummary {
            status: status_of(&name, version),
            entries: entries.len(),
            size_bytes: entries.iter().map(|e| e.metadata.size_bytes).sum(),
            name,
        });
    }

    Ok(summaries)
}

async fn list_caches(
    store: &CacheStore,
    version: &str,
    json: bool,
    ui: &mut dyn UserInterface,
) -> Result<i32> {
    let summaries = summarize(store, version).await?;

    if json {
        ui.message(&serde_json::to_string_pretty(&summaries)?);
        return Ok(0);
    }

    if summaries.is_empty() {
        ui.message(&format!("No caches in {}", store.root().display()));
        return Ok(0);
    }

    let mut table = Table::new(&["Cache", "Status", "Entries", "Size"])
        .align(2, Align::Right)
        .align(3, Align::Right);
    for summary in &summaries {
        let status = match summary.status {
            CacheStatus::Current => "current",
            CacheStatus::Stale => "stale",
            CacheStatus::Foreign => "foreign",
        };
        table.add_row(&[
            summary.name.clone(),
            status.to_string(),
            summary.entries.to_string(),
            format_bytes(summary.size_bytes),
        ]);
    }
    ui.message(&table.render());

    if ui.output_mode() == OutputMode::Verbose {
        for summary in &summaries {
            ui.message(&format!("\n{}:", summary.name));
            for entry in store.entries(&summary.name).await? {
                ui.message(&format!(
                    "  {} {} {} ({})",
                    entry.status,
                    entry.url,
                    format_bytes(entry.metadata.size_bytes),
                    format_relative_time(entry.metadata.cached_at)
                ));
            }
        }
    }

    Ok(0)
}

async fn clear_caches(
    store: &CacheStore,
    version: &str,
    stale_only: bool,
    force: bool,
    ui: &mut dyn UserInterface,
) -> Result<i32> {
    let names = store.names().await?;

    if stale_only {
        let mut removed = 0;
        for name in names
            .iter()
            .filter(|n| status_of(n, version) == CacheStatus::Stale)
        {
            store.delete(name).await?;
            ui.message(&format!("Deleted {}", name));
            removed += 1;
        }
        ui.success(&format!("Cleared {} stale caches", removed));
        return Ok(0);
    }

    if names.is_empty() {
        ui.message("No caches to clear");
        return Ok(0);
    }

    if !force
        && ui.is_interactive()
        && !ui.confirm(&format!("Delete {} caches?", names.len()), false)?
    {
        ui.message("Cancelled");
        return Ok(0);
    }

    for name in &names {
        store.delete(name).await?;
    }

    // Without caches the registered worker can't serve anything offline.
    match tokio::fs::remove_file(store.root().join(REGISTRATION_FILE)).await {
        Ok(()) => ui.message("Removed worker registration"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    ui.success(&format!("Cleared {} caches", names.len()));
    Ok(0)
}

async fn show_stats(store: &CacheStore, version: &str, ui: &mut dyn UserInterface) -> Result<i32> {
    let summaries = summarize(store, version).await?;
    let count = |status| summaries.iter().filter(|s| s.status == status).count();

    ui.message("Cache Statistics:\n");
    ui.message(&format!("  Caches: {}", summaries.len()));
    ui.message(&format!("  Current: {}", count(CacheStatus::Current)));
    ui.message(&format!("  Stale: {}", count(CacheStatus::Stale)));
    ui.message(&format!("  Foreign: {}", count(CacheStatus::Foreign)));
    ui.message(&format!(
        "  Entries: {}",
        summaries.iter().map(|s| s.entries).sum::<usize>()
    ));
    ui.message(&format!(
        "  Total size: {}",
        format_bytes(store.total_size().await?)
    ));
    ui.message(&format!("  Location: {}", store.root().display()));

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use crate::worker::FetchResponse;
    use tempfile::TempDir;

    async fn setup_test_store() -> (TempDir, CacheStore) {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());
        store
            .put("v1-precache", "http://h/a", &FetchResponse::new(200, "12345"))
            .await
            .unwrap();
        store
            .put("v2-precache", "http://h/a", &FetchResponse::new(200, "123"))
            .await
            .unwrap();
        store.open("fonts").await.unwrap();
        (temp, store)
    }

    #[test]
    fn status_classification() {
        assert_eq!(status_of("v2-runtime", "v2"), CacheStatus::Current);
        assert_eq!(status_of("v1-runtime", "v2"), CacheStatus::Stale);
        assert_eq!(status_of("fonts", "v2"), CacheStatus::Foreign);
    }

    #[tokio::test]
    async fn summaries_cover_every_cache() {
        let (_temp, store) = setup_test_store().await;

        let summaries = summarize(&store, "v2").await.unwrap();
        let names: Vec<_> = summaries.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, ["fonts", "v1-precache", "v2-precache"]);
        assert_eq!(summaries[1].status, CacheStatus::Stale);
        assert_eq!(summaries[1].size_bytes, 5);
    }

    #[tokio::test]
    async fn list_as_json() {
        let (_temp, store) = setup_test_store().await;
        let mut ui = MockUI::new();

        list_caches(&store, "v2", true, &mut ui).await.unwrap();

        let json: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(json[2]["name"], "v2-precache");
        assert_eq!(json[2]["status"], "current");
    }

    #[tokio::test]
    async fn clear_stale_keeps_current_and_foreign() {
        let (_temp, store) = setup_test_store().await;
        let mut ui = MockUI::new();

        clear_caches(&store, "v2", true, false, &mut ui)
            .await
            .unwrap();

        assert_eq!(store.names().await.unwrap(), ["fonts", "v2-precache"]);
        assert!(ui.successes()[0].contains("1 stale"));
    }

    #[tokio::test]
    async fn clear_all_respects_declined_confirmation() {
        let (_temp, store) = setup_test_store().await;
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        ui.queue_confirmations([false]);

        clear_caches(&store, "v2", false, false, &mut ui)
            .await
            .unwrap();

        assert_eq!(store.names().await.unwrap().len(), 3);
        assert!(ui.has_message("Cancelled"));
    }

    #[tokio::test]
    async fn clear_all_with_force_removes_registration() {
        let (temp, store) = setup_test_store().await;
        std::fs::write(temp.path().join(REGISTRATION_FILE), "{}").unwrap();
        let mut ui = MockUI::new();
        ui.set_interactive(true);

        clear_caches(&store, "v2", false, true, &mut ui)
            .await
            .unwrap();

        assert!(store.names().await.unwrap().is_empty());
        assert!(!temp.path().join(REGISTRATION_FILE).exists());
        assert!(ui.questions().is_empty());
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let (_temp, store) = setup_test_store().await;
        let mut ui = MockUI::new();

        show_stats(&store, "v2", &mut ui).await.unwrap();

        assert!(ui.has_message("Caches: 3"));
        assert!(ui.has_message("Stale: 1"));
        assert!(ui.has_message("Total size: 8 B"));
    }
}
