//! Calendar key derivation for the class timezone.
//!
//! Daily records are keyed by the civil date in Africa/Johannesburg, which
//! sits at UTC+2 with no daylight saving, so a fixed offset is exact.
//! Weekly goals are keyed by the ISO-8601 week.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

/// Seconds east of UTC for South African Standard Time.
const CLASS_UTC_OFFSET_SECS: i32 = 2 * 3600;

/// The civil date in class time for the given instant. Two students saving
/// at the same instant always land on the same day key, whatever their
/// browser thinks the date is.
pub fn day_key(now: DateTime<Utc>) -> NaiveDate {
  // Infallible for any offset under a day.
  let offset = FixedOffset::east_opt(CLASS_UTC_OFFSET_SECS).unwrap();
  now.with_timezone(&offset).date_naive()
}

/// ISO-8601 week identifier for a day key, formatted `YYYY-Www`.
///
/// Weeks start on Monday; week 1 is the week containing the year's first
/// Thursday. The year component is the ISO week-year, so the days around
/// New Year can carry the neighbouring year's label (2024-12-30 is
/// `2025-W01`, 2021-01-01 is `2020-W53`).
pub fn week_key(day: NaiveDate) -> String {
  let iso = day.iso_week();
  format!("{}-W{:02}", iso.year(), iso.week())
}

/// Inclusive day count from `start` to `end`: same day counts as 1, the
/// next day as 2. An `end` before `start` clamps to 1 rather than going
/// negative.
pub fn diff_days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
  (end - start).num_days().max(0) + 1
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  // ── Day keys ─────────────────────────────────────────────────────────

  #[test]
  fn day_key_follows_class_time_not_utc() {
    // 21:59 UTC is 23:59 class time, still the same day.
    let before = Utc.with_ymd_and_hms(2024, 1, 1, 21, 59, 59).unwrap();
    assert_eq!(day_key(before), d(2024, 1, 1));

    // 22:00 UTC is midnight class time, the next day.
    let after = Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();
    assert_eq!(day_key(after), d(2024, 1, 2));
  }

  // ── Week keys ────────────────────────────────────────────────────────

  #[test]
  fn week_key_is_constant_within_a_week() {
    // 2024-06-10 is a Monday.
    let monday = d(2024, 6, 10);
    for offset in 0..7 {
      let day = monday + chrono::Days::new(offset);
      assert_eq!(week_key(day), "2024-W24");
    }
    assert_eq!(week_key(d(2024, 6, 17)), "2024-W25");
  }

  #[test]
  fn week_key_uses_iso_week_year_at_boundaries() {
    assert_eq!(week_key(d(2024, 1, 1)), "2024-W01");
    // The last days of December can belong to next year's week 1.
    assert_eq!(week_key(d(2024, 12, 30)), "2025-W01");
    // And the first days of January to the old year's last week.
    assert_eq!(week_key(d(2021, 1, 1)), "2020-W53");
  }

  #[test]
  fn week_number_is_zero_padded() {
    assert_eq!(week_key(d(2024, 2, 5)), "2024-W06");
  }

  // ── Inclusive day differences ────────────────────────────────────────

  #[test]
  fn same_day_counts_as_one() {
    assert_eq!(diff_days_inclusive(d(2024, 1, 1), d(2024, 1, 1)), 1);
  }

  #[test]
  fn span_is_inclusive_of_both_ends() {
    assert_eq!(diff_days_inclusive(d(2024, 1, 1), d(2024, 1, 4)), 4);
    assert_eq!(diff_days_inclusive(d(2024, 1, 29), d(2024, 2, 2)), 5);
  }

  #[test]
  fn reversed_span_clamps_to_one() {
    assert_eq!(diff_days_inclusive(d(2024, 1, 4), d(2024, 1, 1)), 1);
  }
}
