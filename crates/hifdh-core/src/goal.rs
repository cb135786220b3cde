//! Weekly goal lifecycle.
//!
//! A goal is set at most once per ISO week and may later be marked
//! complete by an admin. The transition rules live here and nowhere else;
//! the storage and HTTP layers call in rather than re-deriving them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, calendar};

// ─── State ───────────────────────────────────────────────────────────────────

/// The weekly-goal fields carried on a profile and snapshotted onto every
/// daily log. Serialised flat under the persisted field names that
/// historical records were written with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalState {
  /// Free-text target, e.g. "10 pages". Empty means no goal is recorded.
  #[serde(rename = "weeklyGoal", default)]
  pub target:             String,
  /// ISO week the goal belongs to, e.g. "2024-W23". Empty alongside an
  /// empty target.
  #[serde(rename = "weeklyGoalWeekKey", default)]
  pub week_key:           String,
  /// Day the current goal was accepted.
  #[serde(rename = "weeklyGoalStartDateKey")]
  pub start_date_key:     Option<NaiveDate>,
  /// Day an admin marked the goal complete, if any.
  #[serde(rename = "weeklyGoalCompletedDateKey")]
  pub completed_date_key: Option<NaiveDate>,
  /// Inclusive day count from start to completion. Set together with
  /// `completed_date_key`, never independently.
  #[serde(rename = "weeklyGoalDurationDays")]
  pub duration_days:      Option<i64>,
}

/// Lifecycle position derived from a [`GoalState`]; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
  NoGoal,
  Open,
  Completed,
}

impl GoalState {
  pub fn status(&self) -> GoalStatus {
    if self.target.trim().is_empty() {
      GoalStatus::NoGoal
    } else if self.completed_date_key.is_some() {
      GoalStatus::Completed
    } else {
      GoalStatus::Open
    }
  }

  /// Whether a goal is already recorded for `week_key`. A locked week
  /// rejects any replacement target until the next week begins.
  pub fn is_locked_for(&self, week_key: &str) -> bool {
    !self.target.trim().is_empty() && self.week_key == week_key
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// Apply a goal proposal against the current state.
///
/// A blank candidate never changes anything, and a week that already has a
/// goal keeps it. Otherwise the candidate is accepted for today's week:
/// the start date is set to `today` and any completion fields from a
/// previous week are cleared, so a new week always starts open.
pub fn propose_goal(
  current: &GoalState,
  candidate: &str,
  today: NaiveDate,
) -> GoalState {
  let candidate = candidate.trim();
  let week = calendar::week_key(today);

  if candidate.is_empty() || current.is_locked_for(&week) {
    return current.clone();
  }

  GoalState {
    target:             candidate.to_owned(),
    week_key:           week,
    start_date_key:     Some(today),
    completed_date_key: None,
    duration_days:      None,
  }
}

/// Apply a completion request against the current state.
///
/// Only an open goal transitions: `mark_complete` is ignored when there is
/// no goal, and a second completion never moves the recorded date or
/// duration. Completion stamps `today` and the inclusive day count since
/// the goal's start.
pub fn propose_completion(
  current: &GoalState,
  mark_complete: bool,
  today: NaiveDate,
) -> Result<GoalState> {
  if !mark_complete
    || current.target.trim().is_empty()
    || current.completed_date_key.is_some()
  {
    return Ok(current.clone());
  }

  let start = current
    .start_date_key
    .ok_or_else(|| Error::GoalMissingStart(current.week_key.clone()))?;

  let mut next = current.clone();
  next.completed_date_key = Some(today);
  next.duration_days = Some(calendar::diff_days_inclusive(start, today));
  Ok(next)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
