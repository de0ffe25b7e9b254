//! # Utilities Module
//!
//! Cross-cutting concerns shared by the core, the backends and the CLI.
//!
//! ## Modules
//!
//! - [`errors`]: Typed error hierarchy using `thiserror` for domain-specific errors
//!
//! ## Design Notes
//!
//! Error types are defined in this module to avoid circular dependencies between
//! the `core` and `platform` modules. Every error is terminal for a single
//! invocation: nothing in this crate retries a remote call.

pub mod errors;

pub use errors::{
    AttributeError, CliError, CommitError, ConfigPathError, ConnectError, CredentialError,
    EditError, NotFoundError, PropertiesError, ProtocolViolation, RemoteError, SessionError,
    ValidationError, ValueParseError,
};
