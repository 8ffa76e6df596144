pub mod routes;

use serde::Serialize;

use crate::analytics::{ProductivityTrends, UserStats};

/// Both dashboard views, computed from one read of the owner's tasks.
#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub stats: UserStats,
    pub trends: ProductivityTrends,
}
