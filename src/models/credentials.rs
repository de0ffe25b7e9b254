//! Credential types for the admin endpoint
//!
//! SECURITY: Credential types implement Drop to clear sensitive data.

use crate::utils::CredentialError;
use std::fmt;
use std::path::PathBuf;
use url::Url;
use zeroize::Zeroize;

/// Admin account name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Create a new username after validation
    pub fn new(username: impl Into<String>) -> Result<Self, CredentialError> {
        let username = username.into();

        if username.trim().is_empty() {
            return Err(CredentialError::InvalidUsername(
                "Username cannot be empty".to_string(),
            ));
        }

        if username.len() > 256 {
            return Err(CredentialError::InvalidUsername(
                "Username exceeds maximum length (256)".to_string(),
            ));
        }

        if username.chars().any(char::is_control) {
            return Err(CredentialError::InvalidUsername(
                "Username contains control characters".to_string(),
            ));
        }

        Ok(Username(username))
    }

    /// Get the username as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Username {
    type Error = CredentialError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Username::new(value)
    }
}

/// Password that zeros memory on drop
///
/// SECURITY: This type never implements Display or Debug in a way that reveals the password.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString(String);

impl SecureString {
    /// Create a new secure string
    pub fn new(password: impl Into<String>) -> Self {
        SecureString(password.into())
    }

    /// Get the password as a string slice
    ///
    /// Use this sparingly and only when handing the secret to a backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SECURITY: Never reveal the password content
        write!(f, "SecureString(*** {} bytes ***)", self.0.len())
    }
}

/// Network address of the remote configuration service
///
/// Accepts any scheme the url crate can parse (`t3://host:7001`, `https://...`,
/// `file:///path/domain.json`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminUrl(Url);

impl AdminUrl {
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        Url::parse(trimmed)
            .map(AdminUrl)
            .map_err(|e| CredentialError::InvalidAdminUrl {
                url: trimmed.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Local path for `file:` URLs
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme() != "file" {
            return None;
        }
        self.0.to_file_path().ok()
    }
}

impl fmt::Display for AdminUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to open a session against one admin endpoint
#[derive(Clone, Debug)]
pub struct Credentials {
    username: Username,
    password: SecureString,
    admin_url: AdminUrl,
}

impl Credentials {
    pub fn new(
        username: Username,
        password: SecureString,
        admin_url: AdminUrl,
    ) -> Result<Self, CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }
        Ok(Credentials {
            username,
            password,
            admin_url,
        })
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &SecureString {
        &self.password
    }

    pub fn admin_url(&self) -> &AdminUrl {
        &self.admin_url
    }
}
