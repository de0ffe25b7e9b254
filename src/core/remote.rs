//! Remote configuration service abstraction
//!
//! The admin endpoint is an external collaborator. This trait is the typed
//! client surface the session drives; every method is one blocking round trip.
//! Backends live in `src/platform/` and the persistent fake in [`super::memory`].

use crate::models::{AttributeValue, ConfigPath, Credentials};
use crate::utils::RemoteError;
use std::fmt;

/// Opaque reference to a node, issued by the backend that resolved it
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(String);

impl NodeHandle {
    pub fn new(id: impl Into<String>) -> Self {
        NodeHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote configuration service operations
///
/// Implementations must not log or echo the password they receive in `connect`.
pub trait RemoteConfigService {
    /// Address of the admin endpoint, for diagnostics
    fn endpoint(&self) -> &str;

    fn connect(&mut self, credentials: &Credentials) -> Result<(), RemoteError>;

    /// Acquire the exclusive edit lock
    fn begin_edit(&mut self) -> Result<(), RemoteError>;

    /// Resolve a full path; `RemoteError::NodeNotFound` carries the first missing segment
    fn navigate(&mut self, path: &ConfigPath) -> Result<NodeHandle, RemoteError>;

    fn get_attribute(&mut self, node: &NodeHandle, name: &str) -> Result<AttributeValue, RemoteError>;

    fn set_attribute(
        &mut self,
        node: &NodeHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), RemoteError>;

    /// Validate and stage pending changes
    fn save(&mut self) -> Result<(), RemoteError>;

    /// Apply staged changes and release the edit lock
    fn activate(&mut self) -> Result<(), RemoteError>;

    /// Discard pending changes and release the edit lock
    fn cancel_edit(&mut self) -> Result<(), RemoteError>;

    fn disconnect(&mut self) -> Result<(), RemoteError>;
}

impl<T: RemoteConfigService + ?Sized> RemoteConfigService for Box<T> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn connect(&mut self, credentials: &Credentials) -> Result<(), RemoteError> {
        (**self).connect(credentials)
    }

    fn begin_edit(&mut self) -> Result<(), RemoteError> {
        (**self).begin_edit()
    }

    fn navigate(&mut self, path: &ConfigPath) -> Result<NodeHandle, RemoteError> {
        (**self).navigate(path)
    }

    fn get_attribute(&mut self, node: &NodeHandle, name: &str) -> Result<AttributeValue, RemoteError> {
        (**self).get_attribute(node, name)
    }

    fn set_attribute(
        &mut self,
        node: &NodeHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), RemoteError> {
        (**self).set_attribute(node, name, value)
    }

    fn save(&mut self) -> Result<(), RemoteError> {
        (**self).save()
    }

    fn activate(&mut self) -> Result<(), RemoteError> {
        (**self).activate()
    }

    fn cancel_edit(&mut self) -> Result<(), RemoteError> {
        (**self).cancel_edit()
    }

    fn disconnect(&mut self) -> Result<(), RemoteError> {
        (**self).disconnect()
    }
}
