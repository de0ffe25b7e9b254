//! Domain snapshot on local disk
//!
//! Reads a JSON snapshot of a domain's configuration tree and writes it back
//! on activation, the way offline tooling edits a domain directory instead of
//! talking to a running admin server. Selected with a `file://` admin URL.
//!
//! The edit lock is a sibling `<snapshot>.lock` file created atomically, so two
//! administrators working on the same snapshot exclude each other.

use crate::constants::LOCK_FILE_SUFFIX;
use crate::core::memory::InMemoryConfigService;
use crate::core::remote::{NodeHandle, RemoteConfigService};
use crate::models::{AttributeValue, ConfigPath, ConfigTree, Credentials};
use crate::utils::RemoteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk layout of a domain snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    /// When present, only this account may connect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
    pub root: ConfigTree,
}

impl DomainSnapshot {
    pub fn load(path: &Path) -> Result<Self, RemoteError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RemoteError::Unreachable(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            RemoteError::Unreachable(format!("{} is not a domain snapshot: {}", path.display(), e))
        })
    }

    /// Replace the snapshot atomically (write to a temp file, then rename)
    pub fn store(&self, path: &Path) -> Result<(), RemoteError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)
            .map_err(|e| RemoteError::Failed(format!("failed to serialize snapshot: {}", e)))?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| RemoteError::Io(e.error))?;
        Ok(())
    }
}

/// Contents of the lock file
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

pub struct FileDomainService {
    path: PathBuf,
    endpoint: String,
    inner: Option<InMemoryConfigService>,
    holds_lock: bool,
}

impl FileDomainService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let endpoint = format!("file://{}", path.display());
        Self {
            path,
            endpoint,
            inner: None,
            holds_lock: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(LOCK_FILE_SUFFIX);
        PathBuf::from(name)
    }

    fn inner(&mut self) -> Result<&mut InMemoryConfigService, RemoteError> {
        self.inner.as_mut().ok_or(RemoteError::NotConnected)
    }

    fn acquire_lock(&mut self, holder: &str) -> Result<(), RemoteError> {
        let lock_path = self.lock_path();
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&lock_path)
                    .ok()
                    .and_then(|raw| serde_json::from_str::<LockInfo>(&raw).ok())
                    .map(|info| format!("{} since {}", info.holder, info.acquired_at))
                    .unwrap_or_else(|| format!("unknown holder ({})", lock_path.display()));
                return Err(RemoteError::LockHeld(holder));
            }
            Err(e) => return Err(e.into()),
        };

        let info = LockInfo {
            holder: holder.to_string(),
            acquired_at: Utc::now(),
        };
        let body = serde_json::to_vec(&info)
            .map_err(|e| RemoteError::Failed(format!("failed to write lock file: {}", e)))?;
        file.write_all(&body)?;
        self.holds_lock = true;
        debug!(lock = %lock_path.display(), "edit lock acquired");
        Ok(())
    }

    /// Open the edit on the tree as it is on disk now. Once the lock is ours
    /// no one else can change it, but they may have since we connected.
    fn start_edit(&mut self, reload: bool) -> Result<(), RemoteError> {
        if reload {
            let snapshot = DomainSnapshot::load(&self.path)?;
            self.inner()?.reload(snapshot.root)?;
            debug!(path = %self.path.display(), "snapshot reloaded under edit lock");
        }
        self.inner()?.begin_edit()
    }

    fn release_lock(&mut self) -> Result<(), RemoteError> {
        if !self.holds_lock {
            return Ok(());
        }
        let lock_path = self.lock_path();
        match fs::remove_file(&lock_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(lock = %lock_path.display(), "edit lock file vanished");
            }
            Err(e) => return Err(e.into()),
        }
        self.holds_lock = false;
        debug!(lock = %lock_path.display(), "edit lock released");
        Ok(())
    }
}

impl RemoteConfigService for FileDomainService {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connect(&mut self, credentials: &Credentials) -> Result<(), RemoteError> {
        let snapshot = DomainSnapshot::load(&self.path)?;
        let username = credentials.username().as_str();

        if let Some(admin) = &snapshot.admin_user {
            if admin != username {
                return Err(RemoteError::AuthenticationRejected(username.to_string()));
            }
        }

        let mut inner = InMemoryConfigService::new(snapshot.root).with_endpoint(self.endpoint.clone());
        inner.connect(credentials)?;
        self.inner = Some(inner);
        Ok(())
    }

    fn begin_edit(&mut self) -> Result<(), RemoteError> {
        let user = self
            .inner
            .as_ref()
            .and_then(|inner| inner.connected_user())
            .map(str::to_string)
            .ok_or(RemoteError::NotConnected)?;

        let fresh = !self.holds_lock;
        if fresh {
            self.acquire_lock(&user)?;
        }
        if let Err(e) = self.start_edit(fresh) {
            if fresh {
                if let Err(release_err) = self.release_lock() {
                    warn!(error = %release_err, "failed to release edit lock");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn navigate(&mut self, path: &ConfigPath) -> Result<NodeHandle, RemoteError> {
        self.inner()?.navigate(path)
    }

    fn get_attribute(&mut self, node: &NodeHandle, name: &str) -> Result<AttributeValue, RemoteError> {
        self.inner()?.get_attribute(node, name)
    }

    fn set_attribute(
        &mut self,
        node: &NodeHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), RemoteError> {
        self.inner()?.set_attribute(node, name, value)
    }

    fn save(&mut self) -> Result<(), RemoteError> {
        self.inner()?.save()
    }

    fn activate(&mut self) -> Result<(), RemoteError> {
        let inner = self.inner()?;
        let staged = inner
            .staged_tree()
            .cloned()
            .ok_or_else(|| RemoteError::Failed("changes must be saved before activation".to_string()))?;

        // Re-read so fields this tool does not model survive the rewrite
        let mut snapshot = DomainSnapshot::load(&self.path)?;
        snapshot.root = staged;
        snapshot.store(&self.path)?;

        self.inner()?.activate()?;

        // The snapshot is written: from here on the commit has happened
        if let Err(e) = self.release_lock() {
            warn!(
                lock = %self.lock_path().display(),
                error = %e,
                "changes activated but the edit lock could not be removed"
            );
            self.holds_lock = false;
        }
        Ok(())
    }

    fn cancel_edit(&mut self) -> Result<(), RemoteError> {
        self.inner()?.cancel_edit()?;
        self.release_lock()
    }

    fn disconnect(&mut self) -> Result<(), RemoteError> {
        if let Some(mut inner) = self.inner.take() {
            inner.disconnect()?;
        }
        // A lock still held here stays on disk until someone cancels it
        self.holds_lock = false;
        Ok(())
    }
}
