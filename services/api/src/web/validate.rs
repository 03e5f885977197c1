//! services/api/src/web/validate.rs
//!
//! Field checks applied to request payloads before any store or gateway call.

use crate::error::ApiError;
use cofounder_core::ports::PortError;
use tracing::error;
use uuid::Uuid;

pub const MAX_SIMULATION_MONTHS: u32 = 60;

/// Rejects empty or whitespace-only values.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

pub fn require_months_in_range(months: u32) -> Result<(), ApiError> {
    if months == 0 || months > MAX_SIMULATION_MONTHS {
        return Err(ApiError::Validation(format!(
            "'months' must be between 1 and {}",
            MAX_SIMULATION_MONTHS
        )));
    }
    Ok(())
}

/// Ids are opaque to callers. One that is not a UUID cannot name any record.
pub fn parse_entity_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Logs a port failure with some context and converts it into the API error.
pub fn log_port_error(context: &'static str) -> impl FnOnce(PortError) -> ApiError {
    move |e| {
        error!("{}: {:?}", context, e);
        ApiError::Port(e)
    }
}
