//! Core session logic (backend-agnostic)
//!
//! CRITICAL: This module MUST NOT import CLI, file-format or platform-specific code.

pub mod memory;
pub mod navigator;
pub mod remote;
pub mod session;
pub mod validation;

pub use memory::{FaultPlan, InMemoryConfigService, RemoteCall};
pub use navigator::{ConfigNode, ConfigTreeNavigator};
pub use remote::{NodeHandle, RemoteConfigService};
pub use session::{CommitOutcome, ConfigSession, Operation, SessionState};
pub use validation::{validate_attribute_name, validate_credentials};
