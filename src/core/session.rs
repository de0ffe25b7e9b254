//! Transactional edit session against a remote configuration service
//!
//! [`ConfigSession`] is the single authority over whether mutation is legal.
//! It walks the lifecycle
//!
//! ```text
//! Disconnected --connect--> Connected --begin_edit--> Editing
//! Editing --commit ok--> Committed     Editing --commit err--> Connected
//! Editing --cancel--> Cancelled        any --disconnect--> Disconnected
//! ```
//!
//! `Committed` and `Cancelled` behave as `Connected` for every precondition.
//! Dropping a session disconnects it, cancelling any open edit first so the
//! remote lock is never left behind.

use super::navigator::ConfigNode;
use super::remote::RemoteConfigService;
use crate::models::Credentials;
use crate::utils::{
    CommitError, ConnectError, EditError, ProtocolViolation, RemoteError, SessionError,
};
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Editing,
    Committed,
    Cancelled,
}

impl SessionState {
    /// Holds a live connection handle
    pub fn is_connected(self) -> bool {
        !matches!(self, SessionState::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Session and navigation operations, used in error reports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Connect,
    BeginEdit,
    Resolve,
    GetAttribute,
    SetAttribute,
    Commit,
    SkipCommit,
    Cancel,
    Disconnect,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// How the most recent commit ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// Saved but not activated; the server holds pending changes
    StagedNotApplied,
    /// Save failed; the server tree is unchanged
    Rejected,
}

pub struct ConfigSession<S: RemoteConfigService> {
    remote: S,
    state: SessionState,
    username: Option<String>,
    epoch: u64,
    last_commit: Option<CommitOutcome>,
}

impl<S: RemoteConfigService> ConfigSession<S> {
    pub fn new(remote: S) -> Self {
        Self {
            remote,
            state: SessionState::Disconnected,
            username: None,
            epoch: 0,
            last_commit: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Incremented on every successful connect; nodes from older epochs are stale
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn last_commit(&self) -> Option<CommitOutcome> {
        self.last_commit
    }

    /// The last commit saved changes that were never activated
    pub fn has_pending_changes(&self) -> bool {
        self.last_commit == Some(CommitOutcome::StagedNotApplied)
    }

    /// Account the session is connected as
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Read-only access to the backend, mainly for inspection in tests
    pub fn remote(&self) -> &S {
        &self.remote
    }

    /// Establish the connection handle. State stays `Disconnected` on failure.
    pub fn connect(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        self.require(Operation::Connect, |state| {
            state == SessionState::Disconnected
        })?;

        let username = credentials.username().as_str();
        debug!(endpoint = %self.remote.endpoint(), user = %username, "connecting");

        self.remote.connect(credentials).map_err(|e| match e {
            RemoteError::AuthenticationRejected(_) => ConnectError::Rejected {
                username: username.to_string(),
            },
            other => ConnectError::Unreachable {
                url: self.remote.endpoint().to_string(),
                reason: other.to_string(),
            },
        })?;

        self.state = SessionState::Connected;
        self.username = Some(username.to_string());
        self.epoch += 1;
        self.last_commit = None;
        info!(endpoint = %self.remote.endpoint(), user = %username, "connected");
        Ok(())
    }

    /// Acquire the exclusive edit lock. State stays `Connected` on failure.
    pub fn begin_edit(&mut self) -> Result<(), SessionError> {
        self.require(Operation::BeginEdit, |state| {
            state.is_connected() && state != SessionState::Editing
        })?;

        self.remote.begin_edit().map_err(|e| match e {
            RemoteError::LockHeld(holder) => EditError::LockHeld { holder },
            other => EditError::Remote(other.to_string()),
        })?;

        self.state = SessionState::Editing;
        info!("edit started");
        Ok(())
    }

    /// Save then activate.
    ///
    /// On failure the session is back in `Connected` and no longer owns the
    /// edit. A rejected save cancels the remote edit; a failed activation leaves
    /// the staged changes on the server for an operator to resolve.
    pub fn commit(&mut self) -> Result<(), SessionError> {
        self.require(Operation::Commit, |state| state == SessionState::Editing)?;

        if let Err(e) = self.remote.save() {
            let reason = e.to_string();
            error!(%reason, "save rejected, abandoning edit");
            if let Err(cancel_err) = self.remote.cancel_edit() {
                warn!(error = %cancel_err, "failed to release edit after rejected save");
            }
            self.state = SessionState::Connected;
            self.last_commit = Some(CommitOutcome::Rejected);
            return Err(CommitError::Rejected { reason }.into());
        }
        debug!("changes saved");

        if let Err(e) = self.remote.activate() {
            let reason = e.to_string();
            error!(
                %reason,
                "activation failed; saved changes remain pending on the server"
            );
            self.state = SessionState::Connected;
            self.last_commit = Some(CommitOutcome::StagedNotApplied);
            return Err(CommitError::StagedNotApplied { reason }.into());
        }

        self.state = SessionState::Committed;
        self.last_commit = Some(CommitOutcome::Applied);
        info!("changes activated");
        Ok(())
    }

    /// Close a read-only pass: nothing to persist
    pub fn skip_commit(&mut self) -> Result<(), SessionError> {
        self.require(Operation::SkipCommit, |state| {
            state.is_connected() && state != SessionState::Editing
        })?;
        self.state = SessionState::Connected;
        debug!("list-only pass, nothing to commit");
        Ok(())
    }

    /// Discard pending changes and release the edit lock
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.require(Operation::Cancel, |state| state == SessionState::Editing)?;

        match self.remote.cancel_edit() {
            Ok(()) => {
                self.state = SessionState::Cancelled;
                info!("edit cancelled");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Connected;
                Err(EditError::CancelFailed(e.to_string()).into())
            }
        }
    }

    /// Release every handle. Legal from any state and idempotent.
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }

        if self.state == SessionState::Editing {
            warn!("disconnecting with an open edit, cancelling it");
            if let Err(e) = self.remote.cancel_edit() {
                warn!(error = %e, "failed to cancel edit; the lock may still be held");
            }
        }

        if let Err(e) = self.remote.disconnect() {
            warn!(error = %e, "remote disconnect failed");
        }

        self.state = SessionState::Disconnected;
        self.username = None;
        info!("disconnected");
    }

    /// Backend access for reads: any connected state, node from this connection
    pub(crate) fn reader(
        &mut self,
        operation: Operation,
        node: Option<&ConfigNode>,
    ) -> Result<&mut S, ProtocolViolation> {
        self.require(operation, SessionState::is_connected)?;
        self.check_node(operation, node)?;
        Ok(&mut self.remote)
    }

    /// Backend access for writes: only while `Editing`
    pub(crate) fn writer(
        &mut self,
        operation: Operation,
        node: &ConfigNode,
    ) -> Result<&mut S, ProtocolViolation> {
        self.require(operation, |state| state == SessionState::Editing)?;
        self.check_node(operation, Some(node))?;
        Ok(&mut self.remote)
    }

    fn check_node(
        &self,
        operation: Operation,
        node: Option<&ConfigNode>,
    ) -> Result<(), ProtocolViolation> {
        match node {
            Some(node) if node.epoch() != self.epoch => Err(ProtocolViolation::StaleNode {
                operation,
                path: node.path().clone(),
            }),
            _ => Ok(()),
        }
    }

    fn require(
        &self,
        operation: Operation,
        allowed: impl Fn(SessionState) -> bool,
    ) -> Result<(), ProtocolViolation> {
        if allowed(self.state) {
            Ok(())
        } else {
            Err(ProtocolViolation::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

impl<S: RemoteConfigService> Drop for ConfigSession<S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{
        sample_credentials, sample_domain, FaultPlan, InMemoryConfigService, RemoteCall,
    };

    fn session_with(faults: FaultPlan) -> ConfigSession<InMemoryConfigService> {
        ConfigSession::new(InMemoryConfigService::new(sample_domain()).with_faults(faults))
    }

    fn connected() -> ConfigSession<InMemoryConfigService> {
        let mut session = session_with(FaultPlan::default());
        session.connect(&sample_credentials()).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = session_with(FaultPlan::default());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.remote().calls().is_empty());
    }

    #[test]
    fn test_connect_failure_stays_disconnected() {
        let mut session = ConfigSession::new(
            InMemoryConfigService::new(sample_domain()).with_account("weblogic", "different"),
        );
        let err = session.connect(&sample_credentials()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Connect(ConnectError::Rejected { ref username }) if username == "weblogic"
        ));
        assert!(!err.to_string().contains("welcome1"));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_unreachable_endpoint() {
        let mut session = session_with(FaultPlan {
            unreachable: true,
            ..FaultPlan::default()
        });
        let err = session.connect(&sample_credentials()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Connect(ConnectError::Unreachable { .. })
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_connect_twice_is_protocol_violation() {
        let mut session = connected();
        let err = session.connect(&sample_credentials()).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_begin_edit_lock_contention() {
        let mut session = session_with(FaultPlan {
            lock_holder: Some("operator".to_string()),
            ..FaultPlan::default()
        });
        session.connect(&sample_credentials()).unwrap();

        let err = session.begin_edit().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Edit(EditError::LockHeld { ref holder }) if holder == "operator"
        ));
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_begin_edit_twice_is_protocol_violation() {
        let mut session = connected();
        session.begin_edit().unwrap();
        let err = session.begin_edit().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolViolation::InvalidState {
                operation: Operation::BeginEdit,
                state: SessionState::Editing,
            })
        ));
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_begin_edit_requires_connection() {
        let mut session = session_with(FaultPlan::default());
        assert!(matches!(
            session.begin_edit(),
            Err(SessionError::Protocol(_))
        ));
    }

    #[test]
    fn test_commit_success() {
        let mut session = connected();
        session.begin_edit().unwrap();
        session.commit().unwrap();

        assert_eq!(session.state(), SessionState::Committed);
        assert_eq!(session.last_commit(), Some(CommitOutcome::Applied));
        assert!(!session.has_pending_changes());

        // Committed behaves as Connected
        session.begin_edit().unwrap();
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_commit_outside_edit_is_protocol_violation() {
        let mut session = connected();
        assert!(matches!(session.commit(), Err(SessionError::Protocol(_))));
        assert_eq!(session.remote().count_calls(&RemoteCall::Save), 0);
    }

    #[test]
    fn test_rejected_save_releases_edit() {
        let mut session = session_with(FaultPlan {
            save_failure: Some("ListenPort out of range".to_string()),
            ..FaultPlan::default()
        });
        session.connect(&sample_credentials()).unwrap();
        session.begin_edit().unwrap();

        let err = session.commit().unwrap_err();
        match err {
            SessionError::Commit(commit) => assert!(!commit.is_staged()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.last_commit(), Some(CommitOutcome::Rejected));
        assert!(!session.has_pending_changes());
        assert!(session.remote().edit_holder().is_none());
        assert_eq!(session.remote().count_calls(&RemoteCall::Activate), 0);
    }

    #[test]
    fn test_failed_activation_is_staged_not_applied() {
        let mut session = session_with(FaultPlan {
            activate_failure: Some("managed server ms1 unreachable".to_string()),
            ..FaultPlan::default()
        });
        session.connect(&sample_credentials()).unwrap();
        session.begin_edit().unwrap();

        let err = session.commit().unwrap_err();
        assert_eq!(err.kind(), "CommitError.StagedNotApplied");
        match err {
            SessionError::Commit(commit) => assert!(commit.is_staged()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.last_commit(), Some(CommitOutcome::StagedNotApplied));
        assert!(session.has_pending_changes());
        assert!(session.remote().has_staged_changes());
        // No implicit retry
        assert_eq!(session.remote().count_calls(&RemoteCall::Activate), 1);
    }

    #[test]
    fn test_cancel_releases_lock() {
        let mut session = connected();
        session.begin_edit().unwrap();
        session.cancel().unwrap();

        assert_eq!(session.state(), SessionState::Cancelled);
        assert!(session.remote().edit_holder().is_none());
        session.skip_commit().unwrap();
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_cancel_without_edit_is_protocol_violation() {
        let mut session = connected();
        assert!(matches!(session.cancel(), Err(SessionError::Protocol(_))));
    }

    #[test]
    fn test_skip_commit_while_editing_is_protocol_violation() {
        let mut session = connected();
        session.begin_edit().unwrap();
        assert!(matches!(
            session.skip_commit(),
            Err(SessionError::Protocol(_))
        ));
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_disconnect_is_idempotent_from_every_state() {
        let setups: [fn(&mut ConfigSession<InMemoryConfigService>); 5] = [
            |_| {},
            |s| s.connect(&sample_credentials()).unwrap(),
            |s| {
                s.connect(&sample_credentials()).unwrap();
                s.begin_edit().unwrap();
            },
            |s| {
                s.connect(&sample_credentials()).unwrap();
                s.begin_edit().unwrap();
                s.commit().unwrap();
            },
            |s| {
                s.connect(&sample_credentials()).unwrap();
                s.begin_edit().unwrap();
                s.cancel().unwrap();
            },
        ];

        for setup in setups {
            let mut session = session_with(FaultPlan::default());
            setup(&mut session);

            session.disconnect();
            assert_eq!(session.state(), SessionState::Disconnected);
            let calls_after_first = session.remote().calls().len();

            session.disconnect();
            assert_eq!(session.state(), SessionState::Disconnected);
            assert_eq!(session.remote().calls().len(), calls_after_first);
        }
    }

    #[test]
    fn test_disconnect_while_editing_cancels_edit() {
        let mut session = connected();
        session.begin_edit().unwrap();
        session.disconnect();

        assert_eq!(session.remote().count_calls(&RemoteCall::CancelEdit), 1);
        assert!(session.remote().edit_holder().is_none());
        assert!(!session.remote().is_connected());
    }

    #[test]
    fn test_reconnect_bumps_epoch() {
        let mut session = connected();
        assert_eq!(session.epoch(), 1);
        session.disconnect();
        session.connect(&sample_credentials()).unwrap();
        assert_eq!(session.epoch(), 2);
        assert_eq!(session.username(), Some("weblogic"));
    }
}
