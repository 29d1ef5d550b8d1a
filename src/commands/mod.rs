//! Operations over the database, shared by the shell and the HTTP server
//!
//! Every function takes the pool (or the whole `AppState` when it needs the
//! coach client) and returns `AppResult`. "Today" is the local calendar day.

pub mod coach;
pub mod nutrition;
pub mod profile;
pub mod workouts;

use chrono::NaiveDate;

/// Calendar day in the local timezone
pub fn local_today() -> NaiveDate {
  chrono::Local::now().date_naive()
}

/// Parse an optional `YYYY-MM-DD` string, blank meaning today
pub fn parse_date_or_today(raw: Option<&str>) -> crate::error::AppResult<NaiveDate> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .map_err(|_| crate::error::AppError::invalid(format!("Invalid date '{}', expected YYYY-MM-DD", s))),
    None => Ok(local_today()),
  }
}
