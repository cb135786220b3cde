//! Domain model for the hifdh class tracker.
//!
//! Everything that defines the tracker's behaviour lives here: calendar
//! keys, the weekly-goal lifecycle, record shapes, history aggregation,
//! and the [`store::StudyStore`] trait the backends implement. The crate
//! knows nothing about HTTP or SQL.

pub mod calendar;
pub mod error;
pub mod goal;
pub mod numeric;
pub mod record;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
