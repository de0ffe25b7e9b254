//! wlconfig - transactional configuration edits for WebLogic domains
//!
//! A [`ConfigSession`] owns the connection and edit lifecycle, a
//! [`ConfigTreeNavigator`] resolves paths and reads or writes typed
//! attributes through it. The CLI builds on both via [`commands`].

// Public modules
pub mod cli;
pub mod commands;
pub mod constants;
pub mod core;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod platform;
pub mod properties;
pub mod utils;

// Re-export commonly used types
pub use self::core::{
    validate_credentials, CommitOutcome, ConfigNode, ConfigSession, ConfigTreeNavigator,
    InMemoryConfigService, RemoteConfigService, SessionState,
};
pub use models::{
    AdminUrl, AttributeChange, AttributeKind, AttributeValue, ConfigPath, ConfigTree, Credentials,
    SecureString, Username,
};
pub use utils::{
    AttributeError, CommitError, ConnectError, EditError, NotFoundError, ProtocolViolation,
    SessionError, ValidationError,
};
