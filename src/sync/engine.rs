//! The synchronizer: a daily pass over the Fribb cross-index that fans out
//! to a bounded worker pool, fetches each title from AniList under the
//! shared rate limiter, writes the graph, and recursively expands
//! relations and recommendations.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

use crate::clients::anilist::MediaFetcher;
use crate::clients::fribb::{FribbMapping, MappingSource};
use crate::config::SyncSettings;
use crate::db::Store;
use crate::sync::rate_limit::RateLimiter;
use crate::sync::transform;

/// Per-pass counters, shared across workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub processed: usize,
    pub errors: usize,
}

#[derive(Clone)]
pub struct Synchronizer {
    store: Store,
    fetcher: Arc<dyn MediaFetcher>,
    mappings: Arc<dyn MappingSource>,
    settings: SyncSettings,
}

impl Synchronizer {
    pub fn new(
        store: Store,
        fetcher: Arc<dyn MediaFetcher>,
        mappings: Arc<dyn MappingSource>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            mappings,
            settings,
        }
    }

    /// Top-level loop: one pass per interval tick (default daily), or on a
    /// cron schedule when one is configured.
    pub async fn run(&self) -> Result<()> {
        if let Some(expr) = self.settings.cron_expression.clone() {
            self.run_with_cron(&expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_interval(&self) -> Result<()> {
        let hours = self.settings.interval_hours.max(1);
        let period = Duration::from_secs(hours * 3600);
        info!(interval_hours = hours, "sync scheduler running");

        let mut tick = interval(period);
        loop {
            tick.tick().await;
            if let Err(e) = self.run_once().await {
                error!("sync pass failed: {e:#}");
            }
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;
        let sync = self.clone();

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let sync = sync.clone();
            Box::pin(async move {
                if let Err(e) = sync.run_once().await {
                    error!("sync pass failed: {e:#}");
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;
        info!(cron = cron_expr, "sync scheduler running");

        // The scheduler drives itself; this task just stays alive.
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    /// One full pass over the mapping list.
    pub async fn run_once(&self) -> Result<SyncStats> {
        info!("starting sync pass");

        let mappings = match self.mappings.fetch_mappings().await {
            Ok(m) => m,
            Err(e) => {
                error!("failed to fetch mappings, aborting sync: {e:#}");
                return Ok(SyncStats::default());
            }
        };

        let valid: Vec<FribbMapping> =
            mappings.into_iter().filter(|m| m.anilist != 0).collect();
        if valid.is_empty() {
            info!("no mappings to process");
            return Ok(SyncStats::default());
        }

        let total = valid.len();
        let limiter = Arc::new(RateLimiter::new(
            self.settings.requests_per_minute,
            self.settings.requests_per_minute,
        ));
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent));
        let stats = Arc::new(Mutex::new(SyncStats::default()));
        let mut workers = JoinSet::new();

        for mapping in valid {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("worker semaphore closed")?;
            let sync = self.clone();
            let limiter = Arc::clone(&limiter);
            let stats = Arc::clone(&stats);

            workers.spawn(async move {
                let _permit = permit;
                let anilist_id = mapping.anilist;
                let mut visited = HashSet::new();

                match sync.process_title(mapping, &limiter, &mut visited).await {
                    Ok(()) => {
                        let mut s = stats.lock().await;
                        s.processed += 1;
                        if s.processed % 100 == 0 {
                            info!(processed = s.processed, total, "sync progress");
                        }
                    }
                    Err(e) => {
                        error!(anilist_id, "failed to process mapping: {e:#}");
                        stats.lock().await.errors += 1;
                    }
                }
            });
        }

        while workers.join_next().await.is_some() {}

        let stats = *stats.lock().await;
        info!(
            processed = stats.processed,
            errors = stats.errors,
            "sync pass complete"
        );
        Ok(stats)
    }

    /// The full per-title pipeline: terminal-status check, rate-limited
    /// fetch, transform, transactional upsert, then expansion. `visited`
    /// spans the whole recursive expansion of one primary title and breaks
    /// relation cycles.
    fn process_title<'a>(
        &'a self,
        mapping: FribbMapping,
        limiter: &'a RateLimiter,
        visited: &'a mut HashSet<i32>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let anilist_id = mapping.anilist;

            if let Some(existing) = self.store.find_title_brief(anilist_id).await? {
                if existing.status.is_terminal() {
                    debug!(
                        anilist_id,
                        title = %existing.title,
                        status = ?existing.status,
                        "skipping terminal title"
                    );
                    visited.insert(anilist_id);
                    return Ok(());
                }
            }

            limiter.acquire().await;
            let media = self
                .fetcher
                .fetch(anilist_id)
                .await
                .with_context(|| format!("fetch anilist media {anilist_id}"))?;

            let graph = transform::build_graph(media, &mapping);
            debug!(
                anilist_id,
                title = %graph.record.title.preferred(),
                status = ?graph.record.status,
                "processing title"
            );

            let anime_id = self
                .store
                .upsert_graph(&graph)
                .await
                .with_context(|| format!("upsert anilist media {anilist_id}"))?;
            visited.insert(anilist_id);

            // Expansion failures are demoted: the primary title and its
            // immediate edges are already durable.
            if let Err(e) = self.expand(anime_id, &graph, limiter, visited).await {
                warn!(anilist_id, "expansion failed: {e:#}");
            }

            Ok(())
        })
    }

    /// Materialize every distinct referenced title once, then link the
    /// surviving edges in a second transaction.
    async fn expand(
        &self,
        anime_id: i32,
        graph: &crate::models::graph::AnimeGraph,
        limiter: &RateLimiter,
        visited: &mut HashSet<i32>,
    ) -> Result<()> {
        let targets: Vec<i32> = graph
            .relations
            .iter()
            .map(|r| r.anilist_id)
            .chain(graph.recommendations.iter().map(|r| r.anilist_id))
            .collect();

        for target in targets {
            if !visited.insert(target) {
                continue;
            }

            let stub = FribbMapping {
                anilist: target,
                ..FribbMapping::default()
            };
            if let Err(e) = self.process_title(stub, limiter, visited).await {
                warn!(
                    anilist_id = target,
                    "failed to materialize referenced title: {e:#}"
                );
            }
        }

        self.store
            .link_expansion(anime_id, &graph.relations, &graph.recommendations)
            .await
    }
}
