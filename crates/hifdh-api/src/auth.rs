//! Accounts, login, and the Basic-auth extractor.
//!
//! An account is an email plus an argon2id password hash. Sign-up always
//! creates a student; admin accounts are created from the command line.
//! The two auth endpoints take credentials in the request body and answer
//! with the sentences the sign-in form shows verbatim, so the wording here
//! is load-bearing. Every other route authenticates with HTTP Basic,
//! verified against the stored hash on each request.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use hifdh_core::{
  record::{Actor, NewProfile, Profile, Role},
  store::{StoreFailure, StudyStore},
};
use rand_core::OsRng;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Shortest password sign-up will accept.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Request body for `/signup` and `/login`.
#[derive(Debug, Deserialize)]
pub struct AuthBody {
  pub email:    String,
  pub password: String,
}

// ─── User-facing failures ────────────────────────────────────────────────────

/// Failures of the sign-up and login flows. The display strings are shown
/// to end users unchanged and existing clients match on them, so treat
/// them as frozen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
  #[error("Incorrect email or password.")]
  BadCredentials,
  #[error("Please enter a valid email address.")]
  InvalidEmail,
  #[error("Password is too weak. Please use at least 6 characters.")]
  WeakPassword,
  #[error("This email is already registered. Please sign in instead.")]
  EmailTaken,
  #[error("Network error. Please check your internet connection and try again.")]
  Backend,
  #[error("Login failed. Please try again.")]
  LoginFailed,
  #[error("Signup failed. Please try again.")]
  SignupFailed,
}

impl AuthError {
  pub(crate) fn status(&self) -> StatusCode {
    match self {
      AuthError::BadCredentials => StatusCode::UNAUTHORIZED,
      AuthError::InvalidEmail | AuthError::WeakPassword => {
        StatusCode::BAD_REQUEST
      }
      AuthError::EmailTaken => StatusCode::CONFLICT,
      AuthError::Backend => StatusCode::SERVICE_UNAVAILABLE,
      AuthError::LoginFailed | AuthError::SignupFailed => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

/// Collapse a backend failure into the sentence the form should show.
fn classify<E>(err: E, fallback: AuthError) -> AuthError
where
  E: StoreFailure,
{
  if err.is_transient() {
    AuthError::Backend
  } else if err.is_conflict() {
    AuthError::EmailTaken
  } else {
    tracing::error!(error = %err, "auth request failed against the store");
    fallback
  }
}

// ─── Email and password plumbing ─────────────────────────────────────────────

/// Lowercase and trim an address. Lookups and stored emails both go
/// through here, which is what makes sign-in case-insensitive.
pub fn normalize_email(raw: &str) -> String {
  raw.trim().to_lowercase()
}

/// A light syntactic check: one `@` with something before it and a dotted
/// domain after it. Anything stricter starts rejecting real addresses.
fn email_is_valid(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && !email.contains(char::is_whitespace)
    && !domain.contains('@')
}

fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|_| AuthError::SignupFailed.into())
}

/// Verify a password against a stored PHC string. A hash that fails to
/// parse counts as a mismatch rather than an error.
fn password_matches(stored_hash: &str, password: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(stored_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /signup` — create a student account and return its profile.
pub async fn signup<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<AuthBody>,
) -> Result<(StatusCode, Json<Profile>), ApiError>
where
  S: StudyStore + 'static,
{
  let email = normalize_email(&body.email);
  if !email_is_valid(&email) {
    return Err(AuthError::InvalidEmail.into());
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AuthError::WeakPassword.into());
  }

  let profile = store
    .create_profile(NewProfile {
      email,
      password_hash: hash_password(&body.password)?,
      role: Role::Student,
    })
    .await
    .map_err(|e| classify(e, AuthError::SignupFailed))?;

  tracing::info!(user_id = %profile.user_id, "account created");
  Ok((StatusCode::CREATED, Json(profile)))
}

/// `POST /login` — check credentials and return the caller's profile.
///
/// An unknown email and a wrong password get the same answer, so the
/// endpoint does not reveal which addresses have accounts.
pub async fn login<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<AuthBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: StudyStore + 'static,
{
  let email = normalize_email(&body.email);
  let credential = store
    .get_credential(&email)
    .await
    .map_err(|e| classify(e, AuthError::LoginFailed))?
    .ok_or(AuthError::BadCredentials)?;
  if !password_matches(&credential.password_hash, &body.password) {
    return Err(AuthError::BadCredentials.into());
  }

  let profile = store
    .get_profile(credential.user_id)
    .await
    .map_err(|e| classify(e, AuthError::LoginFailed))?
    .ok_or(AuthError::LoginFailed)?;
  Ok(Json(profile))
}

/// `GET /me` — the signed-in caller's own profile.
pub async fn me<S>(
  State(store): State<Arc<S>>,
  Authenticated(actor): Authenticated,
) -> Result<Json<Profile>, ApiError>
where
  S: StudyStore + 'static,
{
  let profile = store
    .get_profile(actor.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {}", actor.user_id)))?;
  Ok(Json(profile))
}

// ─── Extractor and guards ────────────────────────────────────────────────────

/// The verified identity of the caller, pulled from HTTP Basic
/// credentials. Rejects with 401 and a `WWW-Authenticate` challenge when
/// the header is missing, malformed, or does not match a stored hash.
pub struct Authenticated(pub Actor);

impl<S> FromRequestParts<Arc<S>> for Authenticated
where
  S: StudyStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let credential = store
      .get_credential(&email)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    if !password_matches(&credential.password_hash, &password) {
      return Err(ApiError::Unauthorized);
    }

    Ok(Authenticated(Actor {
      user_id: credential.user_id,
      email:   credential.email,
      role:    credential.role,
    }))
  }
}

/// Pull `email:password` out of a Basic `Authorization` header.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((normalize_email(email), password.to_string()))
}

/// Admins only.
pub fn require_admin(actor: &Actor) -> Result<(), ApiError> {
  if actor.role.is_admin() {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}

/// The record's owner, or any admin.
pub fn require_self_or_admin(
  actor: &Actor,
  user_id: Uuid,
) -> Result<(), ApiError> {
  if actor.user_id == user_id || actor.role.is_admin() {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}
