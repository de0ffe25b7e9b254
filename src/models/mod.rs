//! # Domain Models
//!
//! Credentials for the admin endpoint, configuration-tree addresses and the
//! scalar attribute values that live on tree nodes.
//!
//! ## Security Design
//!
//! The [`SecureString`] type holds the admin password:
//! - Password data is zeroed on drop
//! - Never exposed in `Debug` or `Display` implementations
//! - Echoed to operators only as the `****` placeholder
//!
//! Credentials are built once per invocation and passed to
//! [`ConfigSession::connect`](crate::core::ConfigSession::connect) explicitly;
//! nothing in the crate keeps them in process-wide state.

pub mod config;
pub mod credentials;
pub mod tree;

pub use config::{AttributeChange, AttributeKind, AttributeValue, ConfigPath};
pub use credentials::{AdminUrl, Credentials, SecureString, Username};
pub use tree::ConfigTree;
