//! Error types for `hifdh-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A goal with a non-empty target but no start date reached the
  /// completion path. Proposals always record a start date, so this can
  /// only come from corrupted stored state.
  #[error("weekly goal for week {0} has no start date")]
  GoalMissingStart(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
