//! Lifecycle orchestration for the audit job view.
//!
//! [`LifecycleController`] owns the job-view state machine
//! (`Configuring → Running → Completed | Failed`), decides which status
//! transport runs, and guarantees that for a given job id at most one of
//! {push subscription, poll loop, warm-up sweep} is doing work at a time.

pub mod controller;
pub mod policy;

pub use controller::{LifecycleController, ViewState};
pub use policy::select_transport;
