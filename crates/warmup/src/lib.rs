//! Speculative warm-up of dependent dashboards.
//!
//! Once an audit job completes (or the user hovers a navigation target),
//! the client prefetches dashboard data into a durable per-job cache and
//! pre-loads the code modules behind each sub-tab, so the destination
//! dashboard paints fast on first open. All of it is best-effort: the
//! destination performs its own authoritative fetch regardless, so every
//! failure here is swallowed.
//!
//! - [`WarmupRegistry`] — per-job in-flight flags and per-tab warmed set,
//!   an explicit value (not module-global state) reset on job change.
//! - [`WarmupStore`] — durable file-backed payload cache keyed by job id.
//! - [`WarmupCache`] — the idempotent `warm` / `warm_tab_module` entry
//!   points over pluggable fetch/load seams.

pub mod cache;
pub mod registry;
pub mod store;

pub use cache::{ApiDashboardFetch, DashboardFetch, HttpModuleLoad, ModuleLoad, WarmupCache};
pub use registry::WarmupRegistry;
pub use store::{StoreError, WarmupStore};
