//! Dependent dashboard sub-tabs fed by a finished audit job.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The dashboards a user can open once an audit completes.
///
/// `as_str` yields the path segment used by the dashboard data endpoint
/// (`GET /dashboards/{kind}/{job_id}`) and by the module bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    /// Summary dashboard, the default landing tab after completion.
    Overview,
    /// Commerce / conversion analysis.
    Commerce,
    /// Content quality analysis.
    Content,
    /// Technical performance analysis.
    Performance,
}

impl TabKind {
    /// All tabs, in warm-up priority order.
    pub const ALL: [TabKind; 4] = [
        TabKind::Overview,
        TabKind::Commerce,
        TabKind::Content,
        TabKind::Performance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TabKind::Overview => "overview",
            TabKind::Commerce => "commerce",
            TabKind::Content => "content",
            TabKind::Performance => "performance",
        }
    }
}

impl fmt::Display for TabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
