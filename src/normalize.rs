//! Input normalisation helpers for node names and enumerated settings.
//!
//! Every user-supplied string passes through one of these functions before a
//! session is opened, so bad input is reported as a usage error and never
//! reaches the server.

use crate::constants::{LOG_ROTATION_TYPES, MAX_NAME_LEN, NODE_MANAGER_TYPES};
use crate::models::{AttributeKind, AttributeValue};
use crate::utils::ValidationError;

fn invalid(what: &str, value: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidName {
        what: what.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Normalise a server or machine name: trim whitespace and validate.
///
/// Names are case-sensitive on the server, so case is preserved. A name
/// becomes one path segment, so it may not contain `/`.
pub fn normalize_node_name(what: &str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing {
            what: what.to_string(),
        });
    }

    if trimmed.len() > MAX_NAME_LEN {
        return Err(invalid(
            what,
            trimmed,
            format!("exceeds {} characters", MAX_NAME_LEN),
        ));
    }

    if trimmed.contains('/') {
        return Err(invalid(what, trimmed, "must not contain '/'"));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(invalid(what, trimmed, "contains control characters"));
    }

    Ok(trimmed.to_string())
}

/// Canonicalise a log rotation type (`bysize` becomes `bySize`).
pub fn normalize_rotation_type(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    LOG_ROTATION_TYPES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(trimmed))
        .map(|known| known.to_string())
        .ok_or_else(|| {
            invalid(
                "log rotation type",
                trimmed,
                format!("expected one of {}", LOG_ROTATION_TYPES.join(", ")),
            )
        })
}

/// Canonicalise a node manager type.
///
/// Known types are matched case-insensitively; anything else is passed
/// through trimmed for the server to accept or reject.
pub fn normalize_nm_type(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing {
            what: "node manager type".to_string(),
        });
    }

    Ok(NODE_MANAGER_TYPES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(trimmed))
        .map(|known| known.to_string())
        .unwrap_or_else(|| trimmed.to_string()))
}

/// Parse an integer setting that must not be negative
pub fn parse_count(what: &str, raw: &str) -> Result<i64, ValidationError> {
    let value = AttributeValue::parse_as(AttributeKind::Integer, raw)?;
    match value.as_int() {
        Some(n) if n >= 0 => Ok(n),
        _ => Err(invalid(what, raw.trim(), "must be zero or greater")),
    }
}

/// Parse a listen port (1-65535)
pub fn parse_port(raw: &str) -> Result<i64, ValidationError> {
    let port = parse_count("listen port", raw)?;
    if !(1..=i64::from(u16::MAX)).contains(&port) {
        return Err(invalid("listen port", raw.trim(), "must be between 1 and 65535"));
    }
    Ok(port)
}

pub fn parse_flag(raw: &str) -> Result<bool, ValidationError> {
    let value = AttributeValue::parse_as(AttributeKind::Boolean, raw)?;
    Ok(value.as_bool().unwrap_or_default())
}
