//! Path resolution and typed attribute access
//!
//! The navigator holds no state of its own. Every call goes through the
//! session, which decides whether the call is legal right now; the navigator
//! only translates backend answers into the crate's error taxonomy.

use super::remote::{NodeHandle, RemoteConfigService};
use super::session::{ConfigSession, Operation};
use crate::models::{AttributeChange, AttributeKind, AttributeValue, ConfigPath};
use crate::utils::{AttributeError, NotFoundError, RemoteError, SessionError};
use tracing::debug;

/// A resolved node. Only valid within the connection that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigNode {
    path: ConfigPath,
    handle: NodeHandle,
    epoch: u64,
}

impl ConfigNode {
    pub fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConfigTreeNavigator;

impl ConfigTreeNavigator {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `path` in any connected state.
    ///
    /// Fails with [`NotFoundError`] naming the first segment that does not exist.
    pub fn resolve<S: RemoteConfigService>(
        &self,
        session: &mut ConfigSession<S>,
        path: &ConfigPath,
    ) -> Result<ConfigNode, SessionError> {
        let epoch = session.epoch();
        let remote = session.reader(Operation::Resolve, None)?;
        debug!(%path, "resolving");

        match remote.navigate(path) {
            Ok(handle) => Ok(ConfigNode {
                path: path.clone(),
                handle,
                epoch,
            }),
            Err(RemoteError::NodeNotFound { segment_index, .. }) => {
                // A backend reporting past the end still points at the last segment
                let index = segment_index.min(path.len().saturating_sub(1));
                Err(NotFoundError {
                    path: path.clone(),
                    segment_index: index,
                    segment: path.segments().get(index).cloned().unwrap_or_default(),
                }
                .into())
            }
            Err(other) => Err(remote_failure(Operation::Resolve, other)),
        }
    }

    pub fn get_attribute<S: RemoteConfigService>(
        &self,
        session: &mut ConfigSession<S>,
        node: &ConfigNode,
        name: &str,
    ) -> Result<AttributeValue, SessionError> {
        let remote = session.reader(Operation::GetAttribute, Some(node))?;
        remote
            .get_attribute(&node.handle, name)
            .map_err(|e| attribute_failure(Operation::GetAttribute, node, name, e))
    }

    pub fn get_int<S: RemoteConfigService>(
        &self,
        session: &mut ConfigSession<S>,
        node: &ConfigNode,
        name: &str,
    ) -> Result<i64, SessionError> {
        let value = self.get_attribute(session, node, name)?;
        value
            .as_int()
            .ok_or_else(|| mismatch(Operation::GetAttribute, name, AttributeKind::Integer, &value))
    }

    pub fn get_bool<S: RemoteConfigService>(
        &self,
        session: &mut ConfigSession<S>,
        node: &ConfigNode,
        name: &str,
    ) -> Result<bool, SessionError> {
        let value = self.get_attribute(session, node, name)?;
        value
            .as_bool()
            .ok_or_else(|| mismatch(Operation::GetAttribute, name, AttributeKind::Boolean, &value))
    }

    pub fn get_string<S: RemoteConfigService>(
        &self,
        session: &mut ConfigSession<S>,
        node: &ConfigNode,
        name: &str,
    ) -> Result<String, SessionError> {
        let value = self.get_attribute(session, node, name)?;
        match value {
            AttributeValue::Str(s) => Ok(s),
            other => Err(mismatch(Operation::GetAttribute, name, AttributeKind::String, &other)),
        }
    }

    /// Write one attribute. Only legal while the session is `Editing`.
    ///
    /// The current value is read first so the change can be reported and the
    /// value's kind checked before anything is sent.
    pub fn set_attribute<S: RemoteConfigService>(
        &self,
        session: &mut ConfigSession<S>,
        node: &ConfigNode,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<AttributeChange, SessionError> {
        let value = value.into();
        let remote = session.writer(Operation::SetAttribute, node)?;

        let old = remote
            .get_attribute(&node.handle, name)
            .map_err(|e| attribute_failure(Operation::SetAttribute, node, name, e))?;
        if old.kind() != value.kind() {
            return Err(AttributeError::TypeMismatch {
                operation: Operation::SetAttribute,
                name: name.to_string(),
                expected: old.kind(),
                found: value.kind(),
            }
            .into());
        }

        debug!(path = %node.path, %name, %old, new = %value, "setting attribute");
        remote
            .set_attribute(&node.handle, name, value.clone())
            .map_err(|e| attribute_failure(Operation::SetAttribute, node, name, e))?;

        Ok(AttributeChange {
            path: node.path.clone(),
            name: name.to_string(),
            old: Some(old),
            new: value,
        })
    }
}

fn mismatch(
    operation: Operation,
    name: &str,
    expected: AttributeKind,
    found: &AttributeValue,
) -> SessionError {
    AttributeError::TypeMismatch {
        operation,
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
    .into()
}

fn attribute_failure(
    operation: Operation,
    node: &ConfigNode,
    name: &str,
    err: RemoteError,
) -> SessionError {
    match err {
        RemoteError::AttributeNotFound(_) => AttributeError::NotFound {
            operation,
            path: node.path.clone(),
            name: name.to_string(),
        }
        .into(),
        RemoteError::TypeMismatch {
            name,
            expected,
            found,
        } => AttributeError::TypeMismatch {
            operation,
            name,
            expected,
            found,
        }
        .into(),
        other => remote_failure(operation, other),
    }
}

fn remote_failure(operation: Operation, err: RemoteError) -> SessionError {
    SessionError::Remote {
        operation,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{sample_credentials, sample_domain, InMemoryConfigService, RemoteCall};
    use crate::core::session::SessionState;
    use crate::utils::ProtocolViolation;

    fn connected() -> ConfigSession<InMemoryConfigService> {
        let mut session = ConfigSession::new(InMemoryConfigService::new(sample_domain()));
        session.connect(&sample_credentials()).unwrap();
        session
    }

    fn path(raw: &str) -> ConfigPath {
        ConfigPath::parse(raw).unwrap()
    }

    #[test]
    fn test_resolve_reports_first_missing_segment() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();

        let err = nav
            .resolve(&mut session, &path("/Servers/missingServer"))
            .unwrap_err();
        match err {
            SessionError::NotFound(nf) => {
                assert_eq!(nf.segment_index, 1);
                assert_eq!(nf.segment, "missingServer");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Segment k of N, not N
        let err = nav
            .resolve(&mut session, &path("/Servers/nope/Log/nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotFound(NotFoundError {
                segment_index: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_requires_connection() {
        let mut session = ConfigSession::new(InMemoryConfigService::new(sample_domain()));
        let err = ConfigTreeNavigator::new()
            .resolve(&mut session, &path("/Servers"))
            .unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
        assert!(session.remote().calls().is_empty());
    }

    #[test]
    fn test_typed_getters() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();

        assert_eq!(nav.get_int(&mut session, &node, "ListenPort").unwrap(), 7001);
        assert!(nav.get_bool(&mut session, &node, "AutoRestart").unwrap());
        assert_eq!(
            nav.get_string(&mut session, &node, "Name").unwrap(),
            "AdminServer"
        );

        let err = nav.get_bool(&mut session, &node, "ListenPort").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Attribute(AttributeError::TypeMismatch {
                operation: Operation::GetAttribute,
                expected: AttributeKind::Boolean,
                found: AttributeKind::Integer,
                ..
            })
        ));
        assert_eq!(err.operation(), Operation::GetAttribute);
        assert!(err
            .to_string()
            .starts_with("AttributeError.TypeMismatch during GetAttribute"));
    }

    #[test]
    fn test_get_missing_attribute() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();

        let err = nav.get_attribute(&mut session, &node, "Bogus").unwrap_err();
        assert_eq!(err.kind(), "AttributeError.NotFound");
        assert_eq!(err.operation(), Operation::GetAttribute);
    }

    #[test]
    fn test_set_outside_edit_fails_before_any_remote_call() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();
        let calls_before = session.remote().calls().len();

        let err = nav
            .set_attribute(&mut session, &node, "ListenPort", 9001i64)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::InvalidState {
                operation: Operation::SetAttribute,
                state: SessionState::Connected,
            })
        ));
        assert_eq!(session.remote().calls().len(), calls_before);
    }

    #[test]
    fn test_set_after_edit_ends_fails_before_any_remote_call() {
        let nav = ConfigTreeNavigator::new();
        let finish: [(fn(&mut ConfigSession<InMemoryConfigService>), SessionState); 3] = [
            (|s| s.commit().unwrap(), SessionState::Committed),
            (|s| s.cancel().unwrap(), SessionState::Cancelled),
            (|s| s.disconnect(), SessionState::Disconnected),
        ];

        for (end_edit, expected) in finish {
            let mut session = connected();
            session.begin_edit().unwrap();
            let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();
            end_edit(&mut session);
            assert_eq!(session.state(), expected);
            let calls_before = session.remote().calls().len();

            let err = nav
                .set_attribute(&mut session, &node, "ListenPort", 9001i64)
                .unwrap_err();
            match err {
                SessionError::Protocol(ProtocolViolation::InvalidState { operation, state }) => {
                    assert_eq!(operation, Operation::SetAttribute);
                    assert_eq!(state, expected);
                }
                other => panic!("expected InvalidState from {:?}, got {other}", expected),
            }
            assert_eq!(session.remote().calls().len(), calls_before);
        }
    }

    #[test]
    fn test_set_reports_change_and_checks_kind() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();
        session.begin_edit().unwrap();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();

        let change = nav
            .set_attribute(&mut session, &node, "ListenPort", 9001i64)
            .unwrap();
        assert_eq!(change.old, Some(AttributeValue::Int(7001)));
        assert_eq!(change.new, AttributeValue::Int(9001));

        let err = nav
            .set_attribute(&mut session, &node, "ListenPort", "9002")
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Attribute(AttributeError::TypeMismatch {
                operation: Operation::SetAttribute,
                expected: AttributeKind::Integer,
                found: AttributeKind::String,
                ..
            })
        ));

        let err = nav
            .set_attribute(&mut session, &node, "NoSuchAttribute", 1i64)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Attribute(AttributeError::NotFound {
                operation: Operation::SetAttribute,
                ..
            })
        ));
    }

    #[test]
    fn test_set_commit_get_round_trip() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();
        session.begin_edit().unwrap();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();
        nav.set_attribute(&mut session, &node, "ListenPort", 9001i64)
            .unwrap();
        session.commit().unwrap();

        assert_eq!(nav.get_int(&mut session, &node, "ListenPort").unwrap(), 9001);

        // Still there after a fresh connection to the same service
        session.disconnect();
        session.connect(&sample_credentials()).unwrap();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();
        assert_eq!(nav.get_int(&mut session, &node, "ListenPort").unwrap(), 9001);
    }

    #[test]
    fn test_node_from_previous_connection_is_stale() {
        let mut session = connected();
        let nav = ConfigTreeNavigator::new();
        let node = nav.resolve(&mut session, &path("/Servers/AdminServer")).unwrap();
        session.disconnect();
        session.connect(&sample_credentials()).unwrap();

        assert!(matches!(
            nav.get_attribute(&mut session, &node, "ListenPort"),
            Err(SessionError::Protocol(ProtocolViolation::StaleNode { .. }))
        ));
        assert_eq!(
            session
                .remote()
                .count_calls(&RemoteCall::GetAttribute {
                    path: path("/Servers/AdminServer"),
                    name: "ListenPort".to_string(),
                }),
            0
        );
    }
}
