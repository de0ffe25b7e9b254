//! In-memory configuration service
//!
//! Holds a [`ConfigTree`] plus an optional edit in progress, and keeps state
//! across connect/disconnect the way a real admin server does. Every call is
//! recorded so tests can assert exactly which round trips happened, and a
//! [`FaultPlan`] simulates rejected logins, lock contention and commit failures.
//! The file-backed backend builds on it.

use super::remote::{NodeHandle, RemoteConfigService};
use crate::constants::MEMORY_ENDPOINT;
use crate::models::{AttributeValue, ConfigPath, ConfigTree, Credentials, SecureString};
use crate::utils::RemoteError;

/// One recorded round trip
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCall {
    Connect { username: String },
    BeginEdit,
    Navigate { path: ConfigPath },
    GetAttribute { path: ConfigPath, name: String },
    SetAttribute {
        path: ConfigPath,
        name: String,
        value: AttributeValue,
    },
    Save,
    Activate,
    CancelEdit,
    Disconnect,
}

impl RemoteCall {
    /// Calls that touch the edit lock or pending changes
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RemoteCall::BeginEdit
                | RemoteCall::SetAttribute { .. }
                | RemoteCall::Save
                | RemoteCall::Activate
                | RemoteCall::CancelEdit
        )
    }
}

/// Simulated failure conditions
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    /// Connect fails as if the endpoint were down
    pub unreachable: bool,
    /// Another administrator holds the edit lock
    pub lock_holder: Option<String>,
    /// Save fails validation with this reason
    pub save_failure: Option<String>,
    /// Activate fails with this reason after a successful save
    pub activate_failure: Option<String>,
}

#[derive(Clone, Debug)]
struct EditState {
    holder: String,
    working: ConfigTree,
    staged: bool,
}

pub struct InMemoryConfigService {
    endpoint: String,
    tree: ConfigTree,
    account: Option<(String, SecureString)>,
    connected_as: Option<String>,
    edit: Option<EditState>,
    faults: FaultPlan,
    calls: Vec<RemoteCall>,
}

impl InMemoryConfigService {
    /// Create a service that accepts any credentials
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            endpoint: MEMORY_ENDPOINT.to_string(),
            tree,
            account: None,
            connected_as: None,
            edit: None,
            faults: FaultPlan::default(),
            calls: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Only accept this username/password pair
    pub fn with_account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.account = Some((username.into(), SecureString::new(password)));
        self
    }

    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// The activated tree
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Working tree of the current user's edit, once it has been saved
    pub fn staged_tree(&self) -> Option<&ConfigTree> {
        let user = self.connected_as.as_deref()?;
        self.edit
            .as_ref()
            .filter(|edit| edit.holder == user && edit.staged)
            .map(|edit| &edit.working)
    }

    pub fn edit_holder(&self) -> Option<&str> {
        self.edit.as_ref().map(|edit| edit.holder.as_str())
    }

    /// Saved-but-not-activated changes exist on the server
    pub fn has_staged_changes(&self) -> bool {
        self.edit.as_ref().is_some_and(|edit| edit.staged)
    }

    pub fn is_connected(&self) -> bool {
        self.connected_as.is_some()
    }

    pub fn connected_user(&self) -> Option<&str> {
        self.connected_as.as_deref()
    }

    /// Swap in a newer activated tree, e.g. one re-read from disk.
    ///
    /// Refused while any edit is open so staged work is never discarded.
    pub fn reload(&mut self, tree: ConfigTree) -> Result<(), RemoteError> {
        if let Some(edit) = &self.edit {
            return Err(RemoteError::LockHeld(edit.holder.clone()));
        }
        self.tree = tree;
        Ok(())
    }

    pub fn calls(&self) -> &[RemoteCall] {
        &self.calls
    }

    pub fn mutation_calls(&self) -> usize {
        self.calls.iter().filter(|call| call.is_mutation()).count()
    }

    pub fn count_calls(&self, call: &RemoteCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    fn require_connected(&self) -> Result<String, RemoteError> {
        self.connected_as.clone().ok_or(RemoteError::NotConnected)
    }

    fn view(&self) -> &ConfigTree {
        match (&self.edit, &self.connected_as) {
            (Some(edit), Some(user)) if &edit.holder == user => &edit.working,
            _ => &self.tree,
        }
    }

    fn own_edit_mut(&mut self) -> Result<&mut EditState, RemoteError> {
        let user = self
            .connected_as
            .as_deref()
            .ok_or(RemoteError::NotConnected)?;
        match self.edit.as_mut() {
            Some(edit) if edit.holder == user => Ok(edit),
            _ => Err(RemoteError::NoEditInProgress),
        }
    }

    fn handle_path(node: &NodeHandle) -> Result<ConfigPath, RemoteError> {
        ConfigPath::parse(node.as_str())
            .map_err(|e| RemoteError::Failed(format!("malformed node handle '{}': {}", node, e)))
    }

    fn not_found(path: &ConfigPath, segment_index: usize) -> RemoteError {
        RemoteError::NodeNotFound {
            path: path.clone(),
            segment_index,
        }
    }
}

impl RemoteConfigService for InMemoryConfigService {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connect(&mut self, credentials: &Credentials) -> Result<(), RemoteError> {
        let username = credentials.username().as_str();
        self.calls.push(RemoteCall::Connect {
            username: username.to_string(),
        });

        if self.faults.unreachable {
            return Err(RemoteError::Unreachable(format!(
                "connection to {} timed out",
                self.endpoint
            )));
        }

        if let Some((expected_user, expected_password)) = &self.account {
            if expected_user != username || expected_password != credentials.password() {
                return Err(RemoteError::AuthenticationRejected(username.to_string()));
            }
        }

        self.connected_as = Some(username.to_string());
        Ok(())
    }

    fn begin_edit(&mut self) -> Result<(), RemoteError> {
        self.calls.push(RemoteCall::BeginEdit);
        let user = self.require_connected()?;

        if let Some(holder) = &self.faults.lock_holder {
            return Err(RemoteError::LockHeld(holder.clone()));
        }

        if let Some(edit) = &self.edit {
            if edit.holder != user {
                return Err(RemoteError::LockHeld(edit.holder.clone()));
            }
            // Re-entering our own edit resumes it, staged changes included
            return Ok(());
        }

        self.edit = Some(EditState {
            holder: user,
            working: self.tree.clone(),
            staged: false,
        });
        Ok(())
    }

    fn navigate(&mut self, path: &ConfigPath) -> Result<NodeHandle, RemoteError> {
        self.calls.push(RemoteCall::Navigate { path: path.clone() });
        self.require_connected()?;

        self.view()
            .lookup(path)
            .map(|_| NodeHandle::new(path.to_string()))
            .map_err(|index| Self::not_found(path, index))
    }

    fn get_attribute(&mut self, node: &NodeHandle, name: &str) -> Result<AttributeValue, RemoteError> {
        let path = Self::handle_path(node)?;
        self.calls.push(RemoteCall::GetAttribute {
            path: path.clone(),
            name: name.to_string(),
        });
        self.require_connected()?;

        let target = self
            .view()
            .lookup(&path)
            .map_err(|index| Self::not_found(&path, index))?;
        target
            .attribute(name)
            .cloned()
            .ok_or_else(|| RemoteError::AttributeNotFound(name.to_string()))
    }

    fn set_attribute(
        &mut self,
        node: &NodeHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), RemoteError> {
        let path = Self::handle_path(node)?;
        self.calls.push(RemoteCall::SetAttribute {
            path: path.clone(),
            name: name.to_string(),
            value: value.clone(),
        });

        let edit = self.own_edit_mut()?;
        let target = edit
            .working
            .lookup_mut(&path)
            .map_err(|index| Self::not_found(&path, index))?;
        let current = target
            .attribute(name)
            .ok_or_else(|| RemoteError::AttributeNotFound(name.to_string()))?;
        if current.kind() != value.kind() {
            return Err(RemoteError::TypeMismatch {
                name: name.to_string(),
                expected: current.kind(),
                found: value.kind(),
            });
        }

        target.replace_attribute(name, value);
        edit.staged = false;
        Ok(())
    }

    fn save(&mut self) -> Result<(), RemoteError> {
        self.calls.push(RemoteCall::Save);
        let failure = self.faults.save_failure.clone();
        let edit = self.own_edit_mut()?;

        if let Some(reason) = failure {
            return Err(RemoteError::ValidationFailed(reason));
        }
        edit.staged = true;
        Ok(())
    }

    fn activate(&mut self) -> Result<(), RemoteError> {
        self.calls.push(RemoteCall::Activate);
        let failure = self.faults.activate_failure.clone();
        let edit = self.own_edit_mut()?;

        if !edit.staged {
            return Err(RemoteError::Failed(
                "changes must be saved before activation".to_string(),
            ));
        }
        if let Some(reason) = failure {
            return Err(RemoteError::Failed(reason));
        }

        if let Some(edit) = self.edit.take() {
            self.tree = edit.working;
        }
        Ok(())
    }

    fn cancel_edit(&mut self) -> Result<(), RemoteError> {
        self.calls.push(RemoteCall::CancelEdit);
        self.own_edit_mut()?;
        self.edit = None;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), RemoteError> {
        self.calls.push(RemoteCall::Disconnect);
        // An open edit survives the disconnect, exactly like a stale lock on a real server
        self.connected_as = None;
        Ok(())
    }
}

/// Small domain used by tests across the crate
#[cfg(test)]
pub(crate) fn sample_domain() -> ConfigTree {
    fn server(name: &str, port: i64) -> ConfigTree {
        ConfigTree::new()
            .with_attribute("Name", name)
            .with_attribute("ListenPort", port)
            .with_attribute("AutoRestart", true)
            .with_attribute("RestartDelaySeconds", 0i64)
            .with_attribute("MaxRequestParameterCount", 10000i64)
            .with_child(
                "Log",
                ConfigTree::new().with_child(
                    name,
                    ConfigTree::new()
                        .with_attribute("RotationType", "bySize")
                        .with_attribute("FileCount", 7i64),
                ),
            )
            .with_child(
                "WebServer",
                ConfigTree::new().with_child(
                    name,
                    ConfigTree::new().with_child(
                        "WebServerLog",
                        ConfigTree::new().with_child(
                            name,
                            ConfigTree::new()
                                .with_attribute("RotationType", "bySize")
                                .with_attribute("FileCount", 7i64)
                                .with_attribute("LogFileFormat", "common")
                                .with_attribute("ELFFields", "date time cs-method cs-uri sc-status"),
                        ),
                    ),
                ),
            )
    }

    fn machine(name: &str) -> ConfigTree {
        ConfigTree::new().with_attribute("Name", name).with_child(
            "NodeManager",
            ConfigTree::new().with_child(
                name,
                ConfigTree::new()
                    .with_attribute("NMType", "SSL")
                    .with_attribute("ListenPort", 5556i64),
            ),
        )
    }

    ConfigTree::new()
        .with_attribute("Name", "base_domain")
        .with_child(
            "Servers",
            ConfigTree::new()
                .with_child("AdminServer", server("AdminServer", 7001))
                .with_child("ms1", server("ms1", 8001)),
        )
        .with_child(
            "Machines",
            ConfigTree::new().with_child("machine1", machine("machine1")),
        )
}

#[cfg(test)]
pub(crate) fn sample_credentials() -> Credentials {
    use crate::models::{AdminUrl, Username};

    Credentials::new(
        Username::new("weblogic").unwrap(),
        SecureString::new("welcome1"),
        AdminUrl::parse("t3://localhost:7001").unwrap(),
    )
    .unwrap()
}
