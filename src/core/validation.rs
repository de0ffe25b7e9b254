//! Input validation performed before any remote call
//!
//! Everything here is pure: failures surface as [`ValidationError`] and map to
//! the usage exit status without a connection ever being opened.

use crate::models::{AdminUrl, Credentials, SecureString, Username};
use crate::utils::{CredentialError, ValidationError};

/// Build credentials from raw strings, rejecting empty or malformed parts
///
/// # Security
/// - Password is never logged or included in the error
pub fn validate_credentials(
    username: &str,
    password: &str,
    admin_url: &str,
) -> Result<Credentials, ValidationError> {
    let username = Username::new(username.trim())?;
    if password.is_empty() {
        return Err(CredentialError::EmptyPassword.into());
    }
    let admin_url = AdminUrl::parse(admin_url)?;
    Ok(Credentials::new(
        username,
        SecureString::new(password),
        admin_url,
    )?)
}

/// Attribute names are identifiers such as `ListenPort` or `ELFFields`
pub fn validate_attribute_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    let invalid = |reason: &str| ValidationError::InvalidName {
        what: "attribute name".to_string(),
        value: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = trimmed.chars();
    match chars.next() {
        None => Err(ValidationError::Missing {
            what: "attribute name".to_string(),
        }),
        Some(first) if !first.is_ascii_alphabetic() => Err(invalid("must start with a letter")),
        Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Err(invalid("only letters, digits and '_' are allowed"))
        }
        Some(_) => Ok(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        let creds = validate_credentials(" weblogic ", "welcome1", "t3://localhost:7001").unwrap();
        assert_eq!(creds.username().as_str(), "weblogic");
        assert_eq!(creds.admin_url().scheme(), "t3");

        assert!(validate_credentials("", "welcome1", "t3://localhost:7001").is_err());
        assert!(validate_credentials("weblogic", "", "t3://localhost:7001").is_err());
        assert!(validate_credentials("weblogic", "welcome1", "localhost").is_err());
    }

    #[test]
    fn test_validation_error_hides_password() {
        let err = validate_credentials("weblogic", "welcome1", "::bad::").unwrap_err();
        assert!(!err.to_string().contains("welcome1"));
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(validate_attribute_name(" ListenPort ").unwrap(), "ListenPort");
        assert!(validate_attribute_name("ELFFields").is_ok());
        assert!(validate_attribute_name("").is_err());
        assert!(validate_attribute_name("9Port").is_err());
        assert!(validate_attribute_name("Listen-Port").is_err());
    }
}
