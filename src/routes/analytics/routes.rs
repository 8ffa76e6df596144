use axum::{extract::State, Json};
use chrono::Utc;

use super::OverviewResponse;
use crate::analytics::{self, ProductivityTrends, UserStats};
use crate::error::AppResult;
use crate::routes::middleware_auth::CurrentOwner;
use crate::state::AppState;

pub async fn stats(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
) -> AppResult<Json<UserStats>> {
    let tasks = state.tasks.find_by_owner(user_id).await?;
    Ok(Json(analytics::user_stats(user_id, &tasks)))
}

pub async fn trends(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
) -> AppResult<Json<ProductivityTrends>> {
    let tasks = state.tasks.find_by_owner(user_id).await?;
    Ok(Json(analytics::productivity_trends(
        user_id,
        &tasks,
        Utc::now(),
    )))
}

pub async fn overview(
    State(state): State<AppState>,
    CurrentOwner(user_id): CurrentOwner,
) -> AppResult<Json<OverviewResponse>> {
    let tasks = state.tasks.find_by_owner(user_id).await?;
    Ok(Json(OverviewResponse {
        stats: analytics::user_stats(user_id, &tasks),
        trends: analytics::productivity_trends(user_id, &tasks, Utc::now()),
    }))
}
