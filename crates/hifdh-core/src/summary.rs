//! History aggregation.

use serde::{Deserialize, Serialize};

use crate::{numeric::first_number, record::DailyLog};

/// Summary statistics over a student's full history. Computed on demand,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
  /// Number of days with a saved record.
  pub total_days:  usize,
  /// Mean of the numeric sabak amounts, over only the days whose text
  /// parses to a positive number. Days parsing to zero still count
  /// towards `total_days`.
  pub avg_sabak:   f64,
  /// Numeric reading of the newest record's goal target.
  pub latest_goal: f64,
}

/// Fold a student's logs, ordered newest first, into a summary. An empty
/// history yields the all-zero summary rather than an error.
pub fn summarize(logs: &[DailyLog]) -> ProgressSummary {
  let amounts: Vec<f64> = logs
    .iter()
    .map(|log| first_number(&log.sabak))
    .filter(|n| *n > 0.0)
    .collect();

  let avg_sabak = if amounts.is_empty() {
    0.0
  } else {
    amounts.iter().sum::<f64>() / amounts.len() as f64
  };

  ProgressSummary {
    total_days: logs.len(),
    avg_sabak,
    latest_goal: logs
      .first()
      .map_or(0.0, |log| first_number(&log.goal.target)),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::goal::GoalState;

  fn log(day: u32, sabak: &str, goal_target: &str) -> DailyLog {
    let now = Utc::now();
    DailyLog {
      user_id:  Uuid::nil(),
      date_key: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),

      sabak:               sabak.to_owned(),
      sabak_dhor:          String::new(),
      dhor:                String::new(),
      sabak_dhor_mistakes: String::new(),
      dhor_mistakes:       String::new(),

      sabak_read:      None,
      sabak_dhor_read: None,
      dhor_read:       None,

      goal: GoalState {
        target: goal_target.to_owned(),
        ..GoalState::default()
      },

      updated_by:       Uuid::nil(),
      updated_by_email: "test@example.com".into(),
      created_at:       now,
      updated_at:       now,
    }
  }

  #[test]
  fn empty_history_is_all_zero() {
    let summary = summarize(&[]);
    assert_eq!(summary, ProgressSummary {
      total_days:  0,
      avg_sabak:   0.0,
      latest_goal: 0.0,
    });
  }

  #[test]
  fn zero_days_count_towards_totals_but_not_the_average() {
    // Newest first: 4 pages, a rest day, 2 pages.
    let logs = vec![log(12, "4", "10 pages"), log(11, "0", ""), log(10, "2", "")];
    let summary = summarize(&logs);
    assert_eq!(summary.total_days, 3);
    assert_eq!(summary.avg_sabak, 3.0);
    assert_eq!(summary.latest_goal, 10.0);
  }

  #[test]
  fn average_reads_numbers_out_of_free_text() {
    let logs = vec![log(11, "1,5 ruku", ""), log(10, "half a page", "")];
    let summary = summarize(&logs);
    // "half a page" has no digits, so only one day contributes.
    assert_eq!(summary.avg_sabak, 1.5);
    assert_eq!(summary.total_days, 2);
  }

  #[test]
  fn latest_goal_comes_from_the_newest_record_only() {
    let logs = vec![log(11, "1", "7"), log(10, "1", "20 pages")];
    assert_eq!(summarize(&logs).latest_goal, 7.0);
  }
}
