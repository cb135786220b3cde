//! Server assembly for the hifdh tracker.
//!
//! Wires the JSON API from [`hifdh_api`] onto a concrete store and nests
//! it under `/api`, with request tracing across the whole tree. The
//! binary in this crate adds configuration loading and an admin
//! bootstrap; everything behavioural lives in the layers below.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use hifdh_core::store::StudyStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application router around any store.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: StudyStore + 'static,
{
  Router::new()
    .nest("/api", hifdh_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use chrono::{NaiveDate, Utc};
  use hifdh_core::{
    calendar,
    record::{NewEntry, NewProfile, Role},
  };
  use hifdh_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  fn auth_header(email: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{pass}")))
  }

  fn today() -> NaiveDate {
    calendar::day_key(Utc::now())
  }

  async fn oneshot_raw(
    store:   Arc<SqliteStore>,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(store).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Sign a student up through the API and return their id.
  async fn signup(store: &Arc<SqliteStore>, email: &str, pass: &str) -> Uuid {
    let resp = oneshot_raw(
      store.clone(),
      "POST",
      "/api/signup",
      vec![(header::CONTENT_TYPE, "application/json")],
      &json!({ "email": email, "password": pass }).to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["userId"]
      .as_str()
      .unwrap()
      .parse()
      .unwrap()
  }

  /// Sign-up only creates students, so admins are seeded directly.
  async fn seed_admin(store: &Arc<SqliteStore>, email: &str, pass: &str) -> Uuid {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(pass.as_bytes(), &salt)
      .unwrap()
      .to_string();
    let profile = store
      .create_profile(NewProfile {
        email:         email.to_string(),
        password_hash: hash,
        role:          Role::Admin,
      })
      .await
      .unwrap();
    profile.user_id
  }

  async fn put_entry(
    store: &Arc<SqliteStore>,
    auth:  &str,
    id:    Uuid,
    date:  NaiveDate,
    body:  Value,
  ) -> axum::response::Response {
    oneshot_raw(
      store.clone(),
      "PUT",
      &format!("/api/students/{id}/logs/{date}"),
      vec![
        (header::AUTHORIZATION, auth),
        (header::CONTENT_TYPE, "application/json"),
      ],
      &body.to_string(),
    )
    .await
  }

  // ── Sign-up and login ────────────────────────────────────────────────────

  #[tokio::test]
  async fn signup_creates_a_student_profile() {
    let store = make_store().await;
    let resp = oneshot_raw(
      store.clone(),
      "POST",
      "/api/signup",
      vec![(header::CONTENT_TYPE, "application/json")],
      &json!({ "email": "Aisha@Example.com", "password": "secret1" })
        .to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let profile = body_json(resp).await;
    assert_eq!(profile["email"], json!("aisha@example.com"));
    assert_eq!(profile["role"], json!("student"));
    assert_eq!(profile["currentSabak"], json!(""));
    assert_eq!(profile["weeklyGoal"], json!(""));
  }

  #[tokio::test]
  async fn signup_rejects_invalid_email() {
    let store = make_store().await;
    let resp = oneshot_raw(
      store.clone(),
      "POST",
      "/api/signup",
      vec![(header::CONTENT_TYPE, "application/json")],
      &json!({ "email": "not-an-email", "password": "secret1" }).to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      body_json(resp).await["error"],
      json!("Please enter a valid email address.")
    );
  }

  #[tokio::test]
  async fn signup_rejects_weak_password() {
    let store = make_store().await;
    let resp = oneshot_raw(
      store.clone(),
      "POST",
      "/api/signup",
      vec![(header::CONTENT_TYPE, "application/json")],
      &json!({ "email": "aisha@example.com", "password": "short" })
        .to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      body_json(resp).await["error"],
      json!("Password is too weak. Please use at least 6 characters.")
    );
  }

  #[tokio::test]
  async fn duplicate_signup_is_a_conflict() {
    let store = make_store().await;
    signup(&store, "aisha@example.com", "secret1").await;

    // Same address with different casing is still the same account.
    let resp = oneshot_raw(
      store.clone(),
      "POST",
      "/api/signup",
      vec![(header::CONTENT_TYPE, "application/json")],
      &json!({ "email": "AISHA@example.com", "password": "secret2" })
        .to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
      body_json(resp).await["error"],
      json!("This email is already registered. Please sign in instead.")
    );
  }

  #[tokio::test]
  async fn login_returns_the_profile() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;

    let resp = oneshot_raw(
      store.clone(),
      "POST",
      "/api/login",
      vec![(header::CONTENT_TYPE, "application/json")],
      &json!({ "email": " AISHA@example.com ", "password": "secret1" })
        .to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let profile = body_json(resp).await;
    assert_eq!(profile["userId"], json!(id.to_string()));
    assert_eq!(profile["role"], json!("student"));
  }

  #[tokio::test]
  async fn login_rejects_wrong_password_and_unknown_email() {
    let store = make_store().await;
    signup(&store, "aisha@example.com", "secret1").await;

    for body in [
      json!({ "email": "aisha@example.com", "password": "wrong" }),
      json!({ "email": "nobody@example.com", "password": "secret1" }),
    ] {
      let resp = oneshot_raw(
        store.clone(),
        "POST",
        "/api/login",
        vec![(header::CONTENT_TYPE, "application/json")],
        &body.to_string(),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
      assert_eq!(
        body_json(resp).await["error"],
        json!("Incorrect email or password.")
      );
    }
  }

  #[tokio::test]
  async fn unauthenticated_requests_are_challenged() {
    let store = make_store().await;
    let resp = oneshot_raw(store.clone(), "GET", "/api/me", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let challenge = resp
      .headers()
      .get(header::WWW_AUTHENTICATE)
      .unwrap()
      .to_str()
      .unwrap();
    assert!(challenge.contains("Basic"), "challenge: {challenge}");
  }

  #[tokio::test]
  async fn me_returns_the_callers_own_profile() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    let resp = oneshot_raw(
      store.clone(),
      "GET",
      "/api/me",
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["userId"], json!(id.to_string()));
  }

  // ── Authorisation ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn roster_is_admins_only() {
    let store = make_store().await;
    signup(&store, "maryam@example.com", "secret1").await;
    signup(&store, "aisha@example.com", "secret1").await;
    seed_admin(&store, "teacher@example.com", "admin-pass").await;

    let student = auth_header("aisha@example.com", "secret1");
    let resp = oneshot_raw(
      store.clone(),
      "GET",
      "/api/students",
      vec![(header::AUTHORIZATION, student.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = auth_header("teacher@example.com", "admin-pass");
    let resp = oneshot_raw(
      store.clone(),
      "GET",
      "/api/students",
      vec![(header::AUTHORIZATION, admin.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let emails: Vec<String> = body_json(resp)
      .await
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["email"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(emails, ["aisha@example.com", "maryam@example.com"]);
  }

  #[tokio::test]
  async fn students_cannot_read_each_other() {
    let store = make_store().await;
    let aisha = signup(&store, "aisha@example.com", "secret1").await;
    let zaid = signup(&store, "zaid@example.com", "secret1").await;

    let auth = auth_header("aisha@example.com", "secret1");
    for uri in [
      format!("/api/students/{zaid}"),
      format!("/api/students/{zaid}/logs"),
      format!("/api/students/{zaid}/overview"),
    ] {
      let resp = oneshot_raw(
        store.clone(),
        "GET",
        &uri,
        vec![(header::AUTHORIZATION, auth.as_str())],
        "",
      )
      .await;
      assert_eq!(resp.status(), StatusCode::FORBIDDEN, "uri: {uri}");
    }

    // Their own record is fine, and an admin can see anyone's.
    let resp = oneshot_raw(
      store.clone(),
      "GET",
      &format!("/api/students/{aisha}"),
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    seed_admin(&store, "teacher@example.com", "admin-pass").await;
    let admin = auth_header("teacher@example.com", "admin-pass");
    let resp = oneshot_raw(
      store.clone(),
      "GET",
      &format!("/api/students/{zaid}"),
      vec![(header::AUTHORIZATION, admin.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_student_is_not_found() {
    let store = make_store().await;
    seed_admin(&store, "teacher@example.com", "admin-pass").await;
    let admin = auth_header("teacher@example.com", "admin-pass");

    let resp = oneshot_raw(
      store.clone(),
      "GET",
      &format!("/api/students/{}", Uuid::new_v4()),
      vec![(header::AUTHORIZATION, admin.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Daily logs ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn saving_today_writes_log_and_profile_together() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    let resp = put_entry(
      &store,
      &auth,
      id,
      today(),
      json!({ "sabak": "2 pages", "sabakRead": "Good" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let saved = body_json(resp).await;
    assert_eq!(saved["log"]["sabak"], json!("2 pages"));
    assert_eq!(saved["log"]["sabakRead"], json!("Good"));
    assert_eq!(saved["log"]["updatedByEmail"], json!("aisha@example.com"));
    assert_eq!(saved["profile"]["currentSabak"], json!("2 pages"));

    let resp = oneshot_raw(
      store.clone(),
      "GET",
      &format!("/api/students/{id}/logs/{}", today()),
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      body_json(resp).await["dateKey"],
      json!(today().to_string())
    );
  }

  #[tokio::test]
  async fn only_the_current_day_is_writable() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    let yesterday = today().pred_opt().unwrap();
    let resp =
      put_entry(&store, &auth, id, yesterday, json!({ "sabak": "2 pages" }))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn admin_saves_on_behalf_of_a_student() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let admin_id = seed_admin(&store, "teacher@example.com", "admin-pass").await;
    let admin = auth_header("teacher@example.com", "admin-pass");

    let resp = put_entry(
      &store,
      &admin,
      id,
      today(),
      json!({ "sabak": "3 pages", "dhorRead": "Average" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let saved = body_json(resp).await;
    assert_eq!(saved["log"]["userId"], json!(id.to_string()));
    assert_eq!(
      saved["log"]["updatedByEmail"],
      json!("teacher@example.com")
    );
    assert_eq!(
      saved["profile"]["lastUpdatedBy"],
      json!(admin_id.to_string())
    );
  }

  #[tokio::test]
  async fn student_cannot_write_another_students_day() {
    let store = make_store().await;
    signup(&store, "aisha@example.com", "secret1").await;
    let zaid = signup(&store, "zaid@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    let resp =
      put_entry(&store, &auth, zaid, today(), json!({ "sabak": "1 page" }))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn history_is_newest_first_and_limited() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    // The API only writes today, so older days are seeded directly.
    let actor = store.get_profile(id).await.unwrap().unwrap().actor();
    for day in [10, 11, 12] {
      let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
      let entry = NewEntry {
        sabak: format!("day {day}"),
        ..NewEntry::default()
      };
      store.save_entry(actor.clone(), id, date, entry).await.unwrap();
    }

    let resp = oneshot_raw(
      store.clone(),
      "GET",
      &format!("/api/students/{id}/logs?limit=2"),
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let days: Vec<String> = body_json(resp)
      .await
      .as_array()
      .unwrap()
      .iter()
      .map(|log| log["dateKey"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(days, ["2024-06-12", "2024-06-11"]);
  }

  // ── Goals ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn goal_locks_for_the_week_until_an_admin_completes_it() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    let resp = put_entry(
      &store,
      &auth,
      id,
      today(),
      json!({ "weeklyGoal": "10 pages" }),
    )
    .await;
    let saved = body_json(resp).await;
    assert_eq!(saved["profile"]["weeklyGoal"], json!("10 pages"));

    // A second target in the same week is ignored.
    let resp = put_entry(
      &store,
      &auth,
      id,
      today(),
      json!({ "weeklyGoal": "20 pages" }),
    )
    .await;
    let saved = body_json(resp).await;
    assert_eq!(saved["profile"]["weeklyGoal"], json!("10 pages"));

    // Completion is an admin action, even on one's own goal.
    let resp = put_entry(
      &store,
      &auth,
      id,
      today(),
      json!({ "markGoalComplete": true }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    seed_admin(&store, "teacher@example.com", "admin-pass").await;
    let admin = auth_header("teacher@example.com", "admin-pass");
    let resp = put_entry(
      &store,
      &admin,
      id,
      today(),
      json!({ "markGoalComplete": true }),
    )
    .await;
    let saved = body_json(resp).await;
    assert_eq!(
      saved["profile"]["weeklyGoalCompletedDateKey"],
      json!(today().to_string())
    );
    assert_eq!(saved["profile"]["weeklyGoalDurationDays"], json!(1));
  }

  // ── Overview ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn overview_aggregates_history() {
    let store = make_store().await;
    let id = signup(&store, "aisha@example.com", "secret1").await;
    let auth = auth_header("aisha@example.com", "secret1");

    put_entry(
      &store,
      &auth,
      id,
      today(),
      json!({ "sabak": "4 pages", "weeklyGoal": "10 pages" }),
    )
    .await;

    let resp = oneshot_raw(
      store.clone(),
      "GET",
      &format!("/api/students/{id}/overview"),
      vec![(header::AUTHORIZATION, auth.as_str())],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let overview = body_json(resp).await;
    assert_eq!(overview["profile"]["email"], json!("aisha@example.com"));
    assert_eq!(overview["goalStatus"], json!("open"));
    assert_eq!(overview["summary"]["totalDays"], json!(1));
    assert_eq!(overview["summary"]["avgSabak"].as_f64().unwrap(), 4.0);
    assert_eq!(overview["summary"]["latestGoal"].as_f64().unwrap(), 10.0);
    assert_eq!(overview["recent"].as_array().unwrap().len(), 1);
  }
}
