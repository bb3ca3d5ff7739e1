//! In-memory domain directory with background refresh.
//!
//! The directory is one immutable `Arc<[Domain]>`. A refresh builds a complete new list and
//! replaces the pointer in a single write, so readers see either the old or the new list.
//! Registry failures keep the previous list and only flip the health flag.

use crate::{Domain, PolicyDirectoryClient};
use fhir::ResearchStudy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub struct DomainCache {
    client: Arc<dyn PolicyDirectoryClient>,
    domains: RwLock<Arc<[Domain]>>,
    healthy: AtomicBool,
}

impl DomainCache {
    /// Create an empty, unhealthy cache. Nothing is fetched until a refresh runs.
    pub fn new(client: Arc<dyn PolicyDirectoryClient>) -> Self {
        Self {
            client,
            domains: RwLock::new(Arc::from(Vec::new())),
            healthy: AtomicBool::new(false),
        }
    }

    /// Current domain list.
    pub fn snapshot(&self) -> Arc<[Domain]> {
        self.domains.read().clone()
    }

    /// Outcome of the most recent refresh; `false` before the first one.
    pub fn healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Fetch the directory once and publish it.
    ///
    /// Returns `false` (and keeps serving the previous list) when the registry is unavailable.
    pub async fn refresh_once(&self) -> bool {
        let studies = match self.client.list_domains().await {
            Ok(studies) => studies,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to update domain cache. Data might be out of date."
                );
                self.healthy.store(false, Ordering::Release);
                return false;
            }
        };

        let domains = self.build_directory(&studies).await;
        let count = domains.len();
        *self.domains.write() = Arc::from(domains);
        self.healthy.store(true, Ordering::Release);

        tracing::debug!(domains = count, "Updated domain cache");
        true
    }

    async fn build_directory(&self, studies: &[ResearchStudy]) -> Vec<Domain> {
        let mut domains = Vec::with_capacity(studies.len());
        for study in studies {
            let mut domain = match Domain::from_research_study(study) {
                Ok(domain) => domain,
                Err(reason) => {
                    tracing::debug!(
                        study = study.primary_identifier().unwrap_or("<unnamed>"),
                        %reason,
                        "Skipping directory record"
                    );
                    continue;
                }
            };

            if domains.iter().any(|d: &Domain| d.name == domain.name) {
                tracing::warn!(domain = %domain.name, "Duplicate domain name, keeping first");
                continue;
            }

            domain.withdrawal_template_ref = self.withdrawal_template(&domain.name).await;
            domains.push(domain);
        }
        domains
    }

    async fn withdrawal_template(&self, domain_name: &str) -> Option<String> {
        match self.client.withdrawal_template(domain_name).await {
            Ok(template) => Some(template.trim().to_owned()).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(
                    domain = domain_name,
                    error = %e,
                    "Withdrawal template lookup failed, withdrawal detection disabled"
                );
                None
            }
        }
    }

    /// Refresh once, then keep refreshing every `interval` in a background task.
    ///
    /// The first refresh is awaited so a cold start never serves an empty directory because
    /// of a slow first tick.
    pub async fn start(self: &Arc<Self>, interval: Duration) -> RefreshHandle {
        self.refresh_once().await;
        tracing::info!(
            domains = self.snapshot().len(),
            healthy = self.healthy(),
            update_interval = %humantime::format_duration(interval),
            "Initialized domains. Updating periodically."
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(refresh_loop(self.clone(), interval, cancel.clone()));
        RefreshHandle { cancel, task }
    }
}

async fn refresh_loop(cache: Arc<DomainCache>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // The snapshot swap is the last, synchronous step of a refresh, so dropping an
        // in-flight refresh here cannot leave a partial directory behind.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = cache.refresh_once() => {}
        }
    }

    tracing::debug!("Domain cache refresh stopped");
}

/// Owner of the background refresh task.
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the loop to stop and wait for it to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Domain cache refresh task failed");
        }
    }
}
