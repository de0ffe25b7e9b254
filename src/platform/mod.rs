//! Concrete backends selected from the admin URL
//!
//! `file://` URLs open a domain snapshot on disk. Every other scheme names a
//! live admin server, which this build has no transport for; connecting to
//! one fails as unreachable instead of silently falling back to something else.

pub mod file_domain;

pub use file_domain::{DomainSnapshot, FileDomainService};

use crate::core::remote::{NodeHandle, RemoteConfigService};
use crate::models::{AdminUrl, AttributeValue, ConfigPath, Credentials};
use crate::utils::RemoteError;
use tracing::debug;

/// Pick the backend for `url`
pub fn backend_for(url: &AdminUrl) -> Box<dyn RemoteConfigService> {
    match url.to_file_path() {
        Some(path) => {
            debug!(path = %path.display(), "using domain snapshot backend");
            Box::new(FileDomainService::new(path))
        }
        None => {
            let reason = if url.scheme() == "file" {
                "file URL does not name a local path".to_string()
            } else {
                format!("no transport available for scheme '{}'", url.scheme())
            };
            Box::new(NoTransport::new(url.as_str(), reason))
        }
    }
}

/// Placeholder for endpoints that cannot be reached from this build
#[derive(Debug)]
pub struct NoTransport {
    endpoint: String,
    reason: String,
}

impl NoTransport {
    pub fn new(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

impl RemoteConfigService for NoTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connect(&mut self, _credentials: &Credentials) -> Result<(), RemoteError> {
        Err(RemoteError::Unreachable(self.reason.clone()))
    }

    fn begin_edit(&mut self) -> Result<(), RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn navigate(&mut self, _path: &ConfigPath) -> Result<NodeHandle, RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn get_attribute(&mut self, _node: &NodeHandle, _name: &str) -> Result<AttributeValue, RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn set_attribute(
        &mut self,
        _node: &NodeHandle,
        _name: &str,
        _value: AttributeValue,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn save(&mut self) -> Result<(), RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn activate(&mut self) -> Result<(), RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn cancel_edit(&mut self) -> Result<(), RemoteError> {
        Err(RemoteError::NotConnected)
    }

    fn disconnect(&mut self) -> Result<(), RemoteError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::ConfigSession;
    use crate::utils::{ConnectError, SessionError};

    #[test]
    fn test_file_url_selects_snapshot_backend() {
        let url = AdminUrl::parse("file:///tmp/base_domain.json").unwrap();
        let backend = backend_for(&url);
        assert!(backend.endpoint().starts_with("file://"));
        assert!(backend.endpoint().ends_with("base_domain.json"));
    }

    #[test]
    fn test_network_scheme_is_unreachable() {
        let url = AdminUrl::parse("t3://localhost:7001").unwrap();
        let mut session = ConfigSession::new(backend_for(&url));
        let creds = Credentials::new(
            crate::models::Username::new("weblogic").unwrap(),
            crate::models::SecureString::new("welcome1"),
            url,
        )
        .unwrap();

        match session.connect(&creds).unwrap_err() {
            SessionError::Connect(ConnectError::Unreachable { url, reason }) => {
                assert_eq!(url, "t3://localhost:7001");
                assert!(reason.contains("t3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
