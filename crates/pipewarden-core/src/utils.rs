//! Common utility functions

use url::Url;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Generate a new UUID v4
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Trim `value` and reject it when nothing is left.
pub fn require_non_blank(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Replace the password of a database URL with `***` so it can be logged.
/// Input that does not parse as a URL is returned unchanged.
pub fn redact_database_url(database_url: &str) -> String {
    let mut url = match Url::parse(database_url) {
        Ok(url) => url,
        Err(_) => return database_url.to_string(),
    };
    if url.password().is_none() {
        return database_url.to_string();
    }
    match url.set_password(Some("***")) {
        Ok(()) => url.to_string(),
        Err(()) => database_url.to_string(),
    }
}
