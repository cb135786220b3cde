//! Daily-log endpoints: the day's entry form and the history list.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use hifdh_core::{
  calendar,
  record::{DailyLog, NewEntry, ReadingQuality, SavedEntry},
  store::StudyStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  auth::{Authenticated, require_self_or_admin},
  error::ApiError,
};

/// Request body for the entry form. Every field is optional so the form
/// sends only what was filled in; omitted amounts store as blank text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryBody {
  pub sabak:               String,
  pub sabak_dhor:          String,
  pub dhor:                String,
  pub sabak_dhor_mistakes: String,
  pub dhor_mistakes:       String,

  pub sabak_read:      Option<ReadingQuality>,
  pub sabak_dhor_read: Option<ReadingQuality>,
  pub dhor_read:       Option<ReadingQuality>,

  pub weekly_goal:        Option<String>,
  pub mark_goal_complete: bool,
}

impl From<EntryBody> for NewEntry {
  fn from(body: EntryBody) -> Self {
    NewEntry {
      sabak:               body.sabak,
      sabak_dhor:          body.sabak_dhor,
      dhor:                body.dhor,
      sabak_dhor_mistakes: body.sabak_dhor_mistakes,
      dhor_mistakes:       body.dhor_mistakes,
      sabak_read:          body.sabak_read,
      sabak_dhor_read:     body.sabak_dhor_read,
      dhor_read:           body.dhor_read,
      weekly_goal:         body.weekly_goal,
      mark_goal_complete:  body.mark_goal_complete,
    }
  }
}

/// `PUT /students/{id}/logs/{date}` — write the day's record.
///
/// Only the current day in the class timezone is writable; any other date
/// answers 409, so a form left open overnight cannot rewrite history.
/// Students write their own day, admins anyone's. Marking the weekly goal
/// complete is an admin action even on one's own goal.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
  Path((id, date)): Path<(Uuid, NaiveDate)>,
  Json(body): Json<EntryBody>,
) -> Result<Json<SavedEntry>, ApiError>
where
  S: StudyStore + 'static,
{
  require_self_or_admin(&actor, id)?;
  if body.mark_goal_complete && !actor.role.is_admin() {
    return Err(ApiError::Forbidden);
  }

  let today = calendar::day_key(Utc::now());
  if date != today {
    return Err(ApiError::Conflict(format!(
      "only the current day ({today}) can be saved"
    )));
  }

  let saved = store
    .save_entry(actor, id, date, body.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(saved))
}

/// `GET /students/{id}/logs/{date}` — one day's record, if that day was
/// saved.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
  Path((id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<DailyLog>, ApiError>
where
  S: StudyStore + 'static,
{
  require_self_or_admin(&actor, id)?;
  let log = store
    .get_entry(id, date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no record for {date}")))?;
  Ok(Json(log))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Cap on how many records come back. Absent means the whole history.
  pub limit: Option<usize>,
}

/// `GET /students/{id}/logs?limit=N` — history, newest first.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DailyLog>>, ApiError>
where
  S: StudyStore + 'static,
{
  require_self_or_admin(&actor, id)?;
  let logs = store
    .list_entries(id, params.limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(logs))
}
