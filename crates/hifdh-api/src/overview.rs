//! The per-student overview: profile, aggregate numbers, recent history.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hifdh_core::{
  goal::GoalStatus,
  record::{DailyLog, Profile},
  store::StudyStore,
  summary::{ProgressSummary, summarize},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  auth::{Authenticated, require_self_or_admin},
  error::ApiError,
};

/// How many recent logs ride along with an overview.
const RECENT_LIMIT: usize = 30;

/// Everything a dashboard needs for one student in a single response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
  pub profile:     Profile,
  pub goal_status: GoalStatus,
  pub summary:     ProgressSummary,
  /// Newest first, capped at [`RECENT_LIMIT`].
  pub recent:      Vec<DailyLog>,
}

/// `GET /students/{id}/overview` — profile, summary, and recent logs in
/// one round trip. The summary covers the whole history even though only
/// the newest slice is returned.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Overview>, ApiError>
where
  S: StudyStore + 'static,
{
  require_self_or_admin(&actor, id)?;

  let profile = store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id}")))?;
  let logs = store.list_entries(id, None).await.map_err(ApiError::store)?;

  let summary = summarize(&logs);
  let goal_status = profile.goal.status();
  let mut recent = logs;
  recent.truncate(RECENT_LIMIT);

  Ok(Json(Overview { profile, goal_status, summary, recent }))
}
