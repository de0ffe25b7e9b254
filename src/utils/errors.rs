//! Error types for wlconfig
//!
//! All error types use thiserror for clean error handling.
//! SECURITY: Error messages MUST NOT contain passwords or sensitive data.

use std::path::PathBuf;

use crate::core::session::{Operation, SessionState};
use crate::models::{AttributeKind, ConfigPath};

/// Top-level error for every session and navigation operation
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    /// Transport failure in the middle of an established session
    #[error("remote call failed during {operation}: {reason}")]
    Remote { operation: Operation, reason: String },
}

impl SessionError {
    /// Stable label for the error kind, printed by the CLI
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Connect(_) => "ConnectError",
            SessionError::Edit(_) => "EditError",
            SessionError::NotFound(_) => "NotFoundError",
            SessionError::Attribute(AttributeError::NotFound { .. }) => "AttributeError.NotFound",
            SessionError::Attribute(AttributeError::TypeMismatch { .. }) => {
                "AttributeError.TypeMismatch"
            }
            SessionError::Commit(CommitError::Rejected { .. }) => "CommitError.Rejected",
            SessionError::Commit(CommitError::StagedNotApplied { .. }) => {
                "CommitError.StagedNotApplied"
            }
            SessionError::Protocol(_) => "ProtocolViolation",
            SessionError::Remote { .. } => "RemoteError",
        }
    }

    /// The operation that was being attempted when the error occurred
    pub fn operation(&self) -> Operation {
        match self {
            SessionError::Connect(_) => Operation::Connect,
            SessionError::Edit(EditError::CancelFailed(_)) => Operation::Cancel,
            SessionError::Edit(_) => Operation::BeginEdit,
            SessionError::NotFound(_) => Operation::Resolve,
            SessionError::Attribute(AttributeError::NotFound { operation, .. }) => *operation,
            SessionError::Attribute(AttributeError::TypeMismatch { operation, .. }) => *operation,
            SessionError::Commit(_) => Operation::Commit,
            SessionError::Protocol(violation) => violation.operation(),
            SessionError::Remote { operation, .. } => *operation,
        }
    }
}

/// Errors from establishing the admin connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("credentials rejected for user '{username}'")]
    Rejected { username: String },

    #[error("admin endpoint {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },
}

/// Errors from acquiring or releasing the edit lock
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("edit lock is held by {holder}")]
    LockHeld { holder: String },

    #[error("edit could not be started: {0}")]
    Remote(String),

    #[error("edit could not be cancelled: {0}")]
    CancelFailed(String),
}

/// A path segment that does not exist in the remote tree
#[derive(Debug, thiserror::Error)]
#[error("no node '{segment}' at segment {segment_index} of {path}")]
pub struct NotFoundError {
    pub path: ConfigPath,
    /// Zero-based index of the first missing segment
    pub segment_index: usize,
    pub segment: String,
}

/// Errors from typed attribute access
#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    #[error("attribute '{name}' not found on {path}")]
    NotFound {
        operation: Operation,
        path: ConfigPath,
        name: String,
    },

    #[error("attribute '{name}' is {expected}, got {found}")]
    TypeMismatch {
        operation: Operation,
        name: String,
        expected: AttributeKind,
        found: AttributeKind,
    },
}

/// Errors from save + activate
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// Save failed; the remote tree is unchanged
    #[error("changes rejected: {reason}")]
    Rejected { reason: String },

    /// Save succeeded but activation failed; pending changes remain on the server
    #[error("changes saved but not activated, pending changes need manual cleanup: {reason}")]
    StagedNotApplied { reason: String },
}

impl CommitError {
    /// Whether the remote tree was left holding staged changes
    pub fn is_staged(&self) -> bool {
        matches!(self, CommitError::StagedNotApplied { .. })
    }
}

/// Misuse of the session API. Never caused by user input.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("{operation} is not allowed while {state}")]
    InvalidState {
        operation: Operation,
        state: SessionState,
    },

    #[error("node {path} belongs to an earlier connection")]
    StaleNode { operation: Operation, path: ConfigPath },
}

impl ProtocolViolation {
    pub fn operation(&self) -> Operation {
        match self {
            ProtocolViolation::InvalidState { operation, .. }
            | ProtocolViolation::StaleNode { operation, .. } => *operation,
        }
    }
}

/// Errors reported by a remote configuration service backend
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("authentication rejected for user '{0}'")]
    AuthenticationRejected(String),

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("edit lock held by {0}")]
    LockHeld(String),

    #[error("no node at segment {segment_index} of {path}")]
    NodeNotFound {
        path: ConfigPath,
        segment_index: usize,
    },

    #[error("attribute '{0}' not found")]
    AttributeNotFound(String),

    #[error("attribute '{name}' is {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: AttributeKind,
        found: AttributeKind,
    },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("no edit in progress")]
    NoEditInProgress,

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from building credentials
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid username format: {0}")]
    InvalidUsername(String),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Invalid admin URL '{url}': {reason}")]
    InvalidAdminUrl { url: String, reason: String },
}

/// Errors from parsing a configuration path
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigPathError {
    #[error("path segment {0} is empty")]
    EmptySegment(usize),

    #[error("path segment '{0}' contains '/'")]
    SeparatorInSegment(String),
}

/// A raw string that does not parse as the requested attribute kind
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("'{raw}' is not a valid {expected} value")]
pub struct ValueParseError {
    pub raw: String,
    pub expected: AttributeKind,
}

/// Errors from input validation before any remote call
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(#[from] CredentialError),

    #[error("{what} is required")]
    Missing { what: String },

    #[error("Invalid {what} '{value}': {reason}")]
    InvalidName {
        what: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    InvalidValue(#[from] ValueParseError),

    #[error(transparent)]
    InvalidPath(#[from] ConfigPathError),
}

/// Errors from loading a properties file
#[derive(Debug, thiserror::Error)]
pub enum PropertiesError {
    #[error("Failed to read properties file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required property '{0}'")]
    MissingKey(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Errors surfaced by the command-line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Properties(#[from] PropertiesError),

    #[error("{} during {}: {source}", source.kind(), source.operation())]
    Session {
        #[from]
        source: SessionError,
    },
}

impl CliError {
    /// Process exit code: 2 for usage and validation problems, 1 for everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) | CliError::Validation(_) | CliError::Properties(_) => {
                crate::constants::EXIT_USAGE
            }
            CliError::Session { .. } => crate::constants::EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_error_variants_are_distinct() {
        let staged = CommitError::StagedNotApplied {
            reason: "activation timed out".to_string(),
        };
        let rejected = CommitError::Rejected {
            reason: "invalid port".to_string(),
        };

        assert!(staged.is_staged());
        assert!(!rejected.is_staged());
        assert_eq!(
            SessionError::from(staged).kind(),
            "CommitError.StagedNotApplied"
        );
        assert_eq!(SessionError::from(rejected).kind(), "CommitError.Rejected");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage("missing -s".to_string()).exit_code(), 2);
        assert_eq!(
            CliError::from(PropertiesError::MissingKey("admin.url".to_string())).exit_code(),
            2
        );
        let session = SessionError::from(ConnectError::Rejected {
            username: "weblogic".to_string(),
        });
        assert_eq!(CliError::from(session).exit_code(), 1);
    }

    #[test]
    fn test_cli_error_names_kind_and_operation() {
        let err = CliError::from(SessionError::from(EditError::LockHeld {
            holder: "operator".to_string(),
        }));
        let message = err.to_string();
        assert!(message.starts_with("EditError during BeginEdit"));
        assert!(message.contains("operator"));
    }
}
