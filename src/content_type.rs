use tracing::error;

use crate::error::{AccountError, Result};

pub const JSON: &str = "application/json";

/// Require the request's declared content type to be exactly `media_type`.
pub fn check_content_type(media_type: &str, declared: Option<&str>) -> Result<()> {
    if declared == Some(media_type) {
        return Ok(());
    }

    error!(content_type = ?declared, "Invalid Content-Type");
    Err(AccountError::UnsupportedMediaType {
        expected: media_type.to_string(),
        found: declared.map(str::to_string),
    })
}
