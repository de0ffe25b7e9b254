//! # Application-Wide Constants
//!
//! Property keys, exit codes and fixed strings shared by the core, the
//! backends and the CLI.

// ============================================================================
// Credentials
// ============================================================================

/// Placeholder printed wherever the admin password would otherwise appear
pub const MASKED_PASSWORD: &str = "****";

/// Properties-file key for the admin account name
pub const PROP_ADMIN_USERNAME: &str = "admin.username";

/// Properties-file key for the admin password
pub const PROP_ADMIN_PASSWORD: &str = "admin.password";

/// Properties-file key for the admin endpoint URL (`t3://host:7001`, `file:///...`)
pub const PROP_ADMIN_URL: &str = "admin.url";

// ============================================================================
// Script-specific properties
// ============================================================================

/// Default server name for commands that accept `-s`
pub const PROP_SERVER_NAME: &str = "sv.name";

/// Log rotation type for `log-settings` (`bySize`, `byTime`, `none`)
pub const PROP_LOG_ROTATION_TYPE: &str = "log.rotation.type";

/// Number of rotated log files to keep for `log-settings`
pub const PROP_LOG_ROTATION_COUNT: &str = "log.rotation.count";

/// Rotation types accepted by the server, in their canonical spelling
pub const LOG_ROTATION_TYPES: &[&str] = &["bySize", "byTime", "none"];

/// Node manager transport types, in their canonical spelling
///
/// Other values are passed through unchanged and left to the server to judge.
pub const NODE_MANAGER_TYPES: &[&str] = &["SSL", "Plain", "SSH", "RSH"];

// ============================================================================
// Process
// ============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// Any failure after input validation (connect, edit, navigation, commit)
pub const EXIT_FAILURE: u8 = 1;

/// Usage or input-validation error
pub const EXIT_USAGE: u8 = 2;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "WLCONFIG_LOG";

// ============================================================================
// Backends
// ============================================================================

/// Endpoint label reported by the in-memory service
pub const MEMORY_ENDPOINT: &str = "memory://local";

/// Suffix appended to a domain snapshot path to form its edit-lock file
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// Maximum length of a server, machine or other node name
pub const MAX_NAME_LEN: usize = 256;
