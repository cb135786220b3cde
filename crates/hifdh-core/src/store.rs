//! The [`StudyStore`] trait, the storage seam between the domain logic and
//! whatever backend persists it.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::record::{
  Actor, Credential, DailyLog, NewEntry, NewProfile, Profile, SavedEntry,
};

// ─── Failure classification ──────────────────────────────────────────────────

/// Classification hooks the HTTP layer uses to choose a response for a
/// backend failure: transient trouble (a briefly locked database, an
/// unreachable backend) should come back as "try again shortly" rather
/// than a generic server error. Everything defaults to `false`.
pub trait StoreFailure: std::error::Error {
  /// A retry of the same request has a reasonable chance of succeeding.
  fn is_transient(&self) -> bool { false }

  /// The backend refused access, e.g. a read-only or unreadable database
  /// file. Retrying will not help until an operator intervenes.
  fn is_permission(&self) -> bool { false }

  /// The write lost to a uniqueness rule, e.g. an email already taken.
  fn is_conflict(&self) -> bool { false }

  /// The record the operation was aimed at does not exist.
  fn is_missing(&self) -> bool { false }
}

// Lets test doubles declare themselves infallible.
impl StoreFailure for std::convert::Infallible {}

// ─── Store trait ─────────────────────────────────────────────────────────────

/// Abstraction over the tracker's storage backend.
///
/// Implementations own all durability concerns. In particular
/// [`save_entry`](StudyStore::save_entry) must apply its log upsert and
/// profile refresh atomically: a reader must never observe one without the
/// other, and concurrent saves must serialise rather than interleave.
pub trait StudyStore: Send + Sync {
  type Error: StoreFailure + Send + Sync + 'static;

  // ── Accounts ───────────────────────────────────────────────────────────────

  /// Create an account with a blank study state. Fails if the email is
  /// already registered.
  fn create_profile(
    &self,
    new_profile: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Look up the login credential for an email (already normalised to
  /// lowercase by the caller).
  fn get_credential<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + 'a;

  /// Every student profile, ordered by email ascending. Admin accounts are
  /// not included.
  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  // ── Daily entries ──────────────────────────────────────────────────────────

  /// Upsert the log for `date_key` and refresh the profile snapshot from
  /// it, applying the goal transitions for `actor`, all in one atomic
  /// step. Returns both records as committed.
  fn save_entry(
    &self,
    actor: Actor,
    user_id: Uuid,
    date_key: NaiveDate,
    entry: NewEntry,
  ) -> impl Future<Output = Result<SavedEntry, Self::Error>> + Send + '_;

  fn get_entry(
    &self,
    user_id: Uuid,
    date_key: NaiveDate,
  ) -> impl Future<Output = Result<Option<DailyLog>, Self::Error>> + Send + '_;

  /// A student's logs, newest first. `limit` caps the number returned;
  /// `None` returns the full history.
  fn list_entries(
    &self,
    user_id: Uuid,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<DailyLog>, Self::Error>> + Send + '_;
}
