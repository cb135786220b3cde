//! JSON HTTP API for the hifdh tracker.
//!
//! A thin layer over a [`StudyStore`]: handlers authenticate the caller,
//! decide who may touch which records, and hand everything else to the
//! store. The router is generic over the store so tests can run the whole
//! surface against an in-memory backend.
//!
//! | Method | Path                         | Who may call it       |
//! |--------|------------------------------|-----------------------|
//! | POST   | `/signup`                    | anyone                |
//! | POST   | `/login`                     | anyone                |
//! | GET    | `/me`                        | any signed-in account |
//! | GET    | `/students`                  | admins                |
//! | GET    | `/students/{id}`             | that student or admin |
//! | GET    | `/students/{id}/overview`    | that student or admin |
//! | GET    | `/students/{id}/logs`        | that student or admin |
//! | GET    | `/students/{id}/logs/{date}` | that student or admin |
//! | PUT    | `/students/{id}/logs/{date}` | that student or admin |
//!
//! Authentication is HTTP Basic on every route below `/me`; the two auth
//! routes take credentials in the request body instead.

pub mod auth;
pub mod error;
pub mod logs;
pub mod overview;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use hifdh_core::store::StudyStore;

pub use crate::{auth::Authenticated, error::ApiError};

/// Build the API router with every route mounted at the root. The caller
/// decides where to nest it; the bundled server uses `/api`.
pub fn api_router<S>(store: Arc<S>) -> Router
where
  S: StudyStore + 'static,
{
  Router::new()
    .route("/signup", post(auth::signup))
    .route("/login", post(auth::login))
    .route("/me", get(auth::me))
    .route("/students", get(students::list))
    .route("/students/{id}", get(students::get_one))
    .route("/students/{id}/overview", get(overview::get_one))
    .route("/students/{id}/logs", get(logs::list))
    .route(
      "/students/{id}/logs/{date}",
      get(logs::get_one).put(logs::upsert),
    )
    .with_state(store)
}
