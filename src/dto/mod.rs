//! Request and response shapes for the HTTP API.

pub mod analytics;
pub mod auth;
pub mod beams;
pub mod catalog;
pub mod deliveries;
pub mod reports;

use chrono::NaiveDate;

use crate::errors::ServiceError;

/// Rejects windows whose start falls after their end.
pub fn ensure_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ServiceError> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(ServiceError::ValidationError(format!(
            "start_date {} is after end_date {}",
            s, e
        ))),
        _ => Ok(()),
    }
}
