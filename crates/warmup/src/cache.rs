//! The idempotent warm-up entry points.
//!
//! `warm` and `warm_tab_module` are fire-and-forget and safe to call from
//! any trigger (hover, completion event, delayed sweep) any number of
//! times: the registry deduplicates concurrent calls and the store
//! short-circuits jobs that were already prefetched. Network seams are
//! object-safe traits so page views and tests can substitute them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use sitepulse_client::AuditApi;
use sitepulse_core::TabKind;

use crate::registry::WarmupRegistry;
use crate::store::WarmupStore;

/// Fetches a dependent dashboard's data payload.
#[async_trait]
pub trait DashboardFetch: Send + Sync {
    async fn fetch_dashboard(
        &self,
        kind: TabKind,
        job_id: &str,
    ) -> Result<serde_json::Value, String>;
}

/// Loads (but does not meaningfully execute) the code module behind a
/// dashboard sub-tab.
#[async_trait]
pub trait ModuleLoad: Send + Sync {
    async fn load_module(&self, kind: TabKind) -> Result<(), String>;
}

/// Deduplicated, per-job background prefetcher for dependent dashboards.
pub struct WarmupCache {
    registry: Mutex<WarmupRegistry>,
    store: WarmupStore,
    fetcher: Arc<dyn DashboardFetch>,
    loader: Arc<dyn ModuleLoad>,
}

impl WarmupCache {
    pub fn new(
        store: WarmupStore,
        fetcher: Arc<dyn DashboardFetch>,
        loader: Arc<dyn ModuleLoad>,
    ) -> Self {
        Self {
            registry: Mutex::new(WarmupRegistry::new()),
            store,
            fetcher,
            loader,
        }
    }

    /// Prefetch the dashboard payload for `job_id` into the durable store.
    ///
    /// Returns immediately when an entry already exists or another warm-up
    /// for the same job is in flight. The in-flight flag is claimed before
    /// the first await on the network, so two concurrent calls can never
    /// both reach the fetch. The flag is released through a drop guard:
    /// a failed attempt, or a future dropped mid-fetch when its owner is
    /// torn down, can be retried by a later trigger. Best-effort: every
    /// failure is swallowed.
    pub async fn warm(&self, job_id: &str) {
        if self.store.contains(job_id) {
            tracing::debug!(job_id, "Warm-up cache hit, skipping prefetch");
            return;
        }

        let _claim = {
            let mut registry = self.registry();
            registry.activate(job_id);
            if !registry.try_begin(job_id) {
                tracing::debug!(job_id, "Warm-up already in flight, skipping");
                return;
            }
            InFlightClaim {
                registry: &self.registry,
                job_id,
            }
        };

        match self.fetcher.fetch_dashboard(TabKind::Overview, job_id).await {
            Ok(payload) => match self.store.put(job_id, &payload) {
                Ok(()) => tracing::debug!(job_id, "Warm-up entry cached"),
                Err(e) => tracing::debug!(job_id, error = %e, "Failed to persist warm-up entry"),
            },
            Err(e) => tracing::debug!(job_id, error = %e, "Warm-up prefetch failed"),
        }
    }

    /// Request the code module behind `kind`, at most once per page
    /// lifetime (per active job). The warmed flag sticks only when the
    /// load succeeds; a failed or dropped load releases it so a later
    /// trigger can retry.
    pub async fn warm_tab_module(&self, job_id: &str, kind: TabKind) {
        let mut claim = {
            let mut registry = self.registry();
            registry.activate(job_id);
            if !registry.try_mark_tab(kind) {
                tracing::trace!(job_id, %kind, "Tab module already warmed, skipping");
                return;
            }
            TabClaim {
                registry: &self.registry,
                kind,
                keep: false,
            }
        };

        match self.loader.load_module(kind).await {
            Ok(()) => claim.keep = true,
            Err(e) => tracing::debug!(job_id, %kind, error = %e, "Module warm-up failed"),
        }
    }

    /// Post-completion sweep: prefetch the dashboard payload and request
    /// every sub-tab's module. Idempotent like its parts.
    pub async fn warm_dependents(&self, job_id: &str) {
        self.warm(job_id).await;
        for kind in TabKind::ALL {
            self.warm_tab_module(job_id, kind).await;
        }
    }

    /// Registry operations are short flag flips and never held across an
    /// await; a poisoned lock only means a panicked test thread, so the
    /// inner value is recovered.
    fn registry(&self) -> MutexGuard<'_, WarmupRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases a job's in-flight claim on drop, including when the owning
/// `warm` future is cancelled mid-fetch.
struct InFlightClaim<'a> {
    registry: &'a Mutex<WarmupRegistry>,
    job_id: &'a str,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finish(self.job_id);
    }
}

/// Releases a tab's warmed flag on drop unless the load succeeded.
struct TabClaim<'a> {
    registry: &'a Mutex<WarmupRegistry>,
    kind: TabKind,
    keep: bool,
}

impl Drop for TabClaim<'_> {
    fn drop(&mut self) {
        if !self.keep {
            self.registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .unmark_tab(self.kind);
        }
    }
}

/// [`DashboardFetch`] backed by the audit backend's dashboard endpoint.
pub struct ApiDashboardFetch {
    api: Arc<AuditApi>,
}

impl ApiDashboardFetch {
    pub fn new(api: Arc<AuditApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DashboardFetch for ApiDashboardFetch {
    async fn fetch_dashboard(
        &self,
        kind: TabKind,
        job_id: &str,
    ) -> Result<serde_json::Value, String> {
        self.api
            .get_dashboard(kind, job_id)
            .await
            .map_err(|e| e.to_string())
    }
}

/// [`ModuleLoad`] that fetches the tab's script bundle and discards the
/// body, priming the HTTP cache the dashboard will load the bundle from.
pub struct HttpModuleLoad {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModuleLoad {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl ModuleLoad for HttpModuleLoad {
    async fn load_module(&self, kind: TabKind) -> Result<(), String> {
        let url = format!("{}/assets/tabs/{}.js", self.base_url, kind);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("bundle request failed: {}", response.status()));
        }
        // Drain the body so the cache actually stores it.
        let _ = response.bytes().await.map_err(|e| e.to_string())?;
        tracing::trace!(%kind, "Tab module bundle warmed");
        Ok(())
    }
}
