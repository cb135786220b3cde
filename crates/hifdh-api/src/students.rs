//! Student roster endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hifdh_core::{record::Profile, store::StudyStore};
use uuid::Uuid;

use crate::{
  auth::{Authenticated, require_admin, require_self_or_admin},
  error::ApiError,
};

/// `GET /students` — every student account, ordered by email. Admin only:
/// students never see each other's records, starting with the roster
/// itself.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: StudyStore + 'static,
{
  require_admin(&actor)?;
  let students = store.list_students().await.map_err(ApiError::store)?;
  Ok(Json(students))
}

/// `GET /students/{id}` — one student's profile, for the student themself
/// or an admin.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError>
where
  S: StudyStore + 'static,
{
  require_self_or_admin(&actor, id)?;
  let profile = store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id}")))?;
  Ok(Json(profile))
}
