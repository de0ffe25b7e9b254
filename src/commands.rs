//! Change plans and their execution
//!
//! Every subcommand boils down to a [`ChangePlan`]: one or more sections, each
//! naming a node, the attributes to write on it and the attributes to report
//! back. [`run_plan`] executes a whole plan inside one connection, one edit
//! and one commit, so a multi-section plan either lands together or not at all.

use crate::core::navigator::ConfigTreeNavigator;
use crate::core::remote::RemoteConfigService;
use crate::core::session::{ConfigSession, Operation, SessionState};
use crate::models::{AttributeChange, AttributeKind, AttributeValue, ConfigPath, Credentials};
use crate::normalize;
use crate::utils::{AttributeError, SessionError, ValidationError};
use std::fmt;
use tracing::{info, warn};

/// Value to write, either already typed or raw text to parse against the
/// attribute's current kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingValue {
    Typed(AttributeValue),
    Raw(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Setting {
    pub name: String,
    pub value: SettingValue,
}

/// One node of a plan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub path: ConfigPath,
    pub changes: Vec<Setting>,
    pub reads: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, path: ConfigPath) -> Self {
        Self {
            title: title.into(),
            path,
            changes: Vec::new(),
            reads: Vec::new(),
        }
    }

    /// Write `value` and report the attribute afterwards
    pub fn set(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.changes.push(Setting {
            name: name.to_string(),
            value: SettingValue::Typed(value.into()),
        });
        self.read(name)
    }

    /// Write text parsed against the attribute's current kind
    pub fn set_raw(mut self, name: &str, raw: impl Into<String>) -> Self {
        self.changes.push(Setting {
            name: name.to_string(),
            value: SettingValue::Raw(raw.into()),
        });
        self.read(name)
    }

    /// Report an attribute without writing it
    pub fn read(mut self, name: &str) -> Self {
        if !self.reads.iter().any(|r| r == name) {
            self.reads.push(name.to_string());
        }
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangePlan {
    pub sections: Vec<Section>,
}

impl ChangePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Plan writes nothing
    pub fn is_read_only(&self) -> bool {
        self.sections.iter().all(|s| s.changes.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Apply,
    /// Connect and report only: no edit, no writes, no commit
    ListOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionReport {
    pub title: String,
    pub values: Vec<(String, AttributeValue)>,
}

/// What a plan read and wrote
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub mode: Mode,
    pub sections: Vec<SectionReport>,
    pub changes: Vec<AttributeChange>,
}

impl Report {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            sections: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Reported value of `name` in the section titled `title`
    pub fn value(&self, title: &str, name: &str) -> Option<&AttributeValue> {
        self.sections
            .iter()
            .find(|s| s.title == title)?
            .values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            if section.title.is_empty() {
                writeln!(f, "\n---- Result:")?;
            } else {
                writeln!(f, "\n---- Result: {}", section.title)?;
            }
            for (name, value) in &section.values {
                writeln!(f, "{} = {}", name, value)?;
            }
        }

        if self.mode == Mode::Apply {
            writeln!(f, "\n---- Changes")?;
            if self.changes.is_empty() {
                writeln!(f, "(none)")?;
            }
            for change in &self.changes {
                writeln!(f, "{}", change)?;
            }
        }
        Ok(())
    }
}

/// Execute `plan` in a single connection.
///
/// In [`Mode::Apply`] all writes share one edit and one commit. Any failure
/// cancels an edit that is still open, and the session is always
/// disconnected before returning.
pub fn run_plan<S: RemoteConfigService>(
    session: &mut ConfigSession<S>,
    credentials: &Credentials,
    plan: &ChangePlan,
    mode: Mode,
) -> Result<Report, SessionError> {
    session.connect(credentials)?;

    let result = execute(session, plan, mode);
    if let Err(e) = &result {
        warn!(kind = e.kind(), operation = %e.operation(), "plan failed");
        if session.state() == SessionState::Editing {
            if let Err(cancel_err) = session.cancel() {
                warn!(error = %cancel_err, "failed to cancel edit after error");
            }
        }
    }
    session.disconnect();
    result
}

fn execute<S: RemoteConfigService>(
    session: &mut ConfigSession<S>,
    plan: &ChangePlan,
    mode: Mode,
) -> Result<Report, SessionError> {
    let nav = ConfigTreeNavigator::new();
    let mut report = Report::new(mode);

    if mode == Mode::Apply {
        session.begin_edit()?;
    }

    for section in &plan.sections {
        let node = nav.resolve(session, &section.path)?;

        if mode == Mode::Apply {
            for setting in &section.changes {
                let value = match &setting.value {
                    SettingValue::Typed(value) => value.clone(),
                    SettingValue::Raw(raw) => {
                        let current = nav.get_attribute(session, &node, &setting.name)?;
                        parse_raw(&setting.name, current.kind(), raw)?
                    }
                };
                report
                    .changes
                    .push(nav.set_attribute(session, &node, &setting.name, value)?);
            }
        }

        let mut values = Vec::with_capacity(section.reads.len());
        for name in &section.reads {
            values.push((name.clone(), nav.get_attribute(session, &node, name)?));
        }
        report.sections.push(SectionReport {
            title: section.title.clone(),
            values,
        });
    }

    match mode {
        Mode::Apply => session.commit()?,
        Mode::ListOnly => session.skip_commit()?,
    }
    info!(
        sections = report.sections.len(),
        changes = report.changes.len(),
        "plan complete"
    );
    Ok(report)
}

fn parse_raw(name: &str, kind: AttributeKind, raw: &str) -> Result<AttributeValue, SessionError> {
    AttributeValue::parse_as(kind, raw).map_err(|_| {
        AttributeError::TypeMismatch {
            operation: Operation::SetAttribute,
            name: name.to_string(),
            expected: kind,
            found: AttributeKind::String,
        }
        .into()
    })
}

// ============================================================================
// Plan builders, one per subcommand
// ============================================================================

fn server_path(server: &str) -> Result<ConfigPath, ValidationError> {
    Ok(ConfigPath::from_segments(["Servers", server])?)
}

/// Single-attribute plan on `/Servers/<server>`
fn server_attribute(
    server: &str,
    attribute: &str,
    value: Option<AttributeValue>,
) -> Result<ChangePlan, ValidationError> {
    let server = normalize::normalize_node_name("server name", server)?;
    let section = Section::new("", server_path(&server)?);
    let section = match value {
        Some(value) => section.set(attribute, value),
        None => section.read(attribute),
    };
    Ok(ChangePlan::new().section(section))
}

pub fn listen_port(server: &str, port: Option<i64>) -> Result<ChangePlan, ValidationError> {
    server_attribute(server, "ListenPort", port.map(AttributeValue::Int))
}

pub fn auto_restart(server: &str, enabled: Option<bool>) -> Result<ChangePlan, ValidationError> {
    server_attribute(server, "AutoRestart", enabled.map(AttributeValue::Bool))
}

pub fn max_request_parameter_count(
    server: &str,
    count: Option<i64>,
) -> Result<ChangePlan, ValidationError> {
    server_attribute(server, "MaxRequestParameterCount", count.map(AttributeValue::Int))
}

pub fn restart_delay(server: &str, seconds: Option<i64>) -> Result<ChangePlan, ValidationError> {
    server_attribute(server, "RestartDelaySeconds", seconds.map(AttributeValue::Int))
}

pub fn machine_nm_type(machine: &str, nm_type: Option<&str>) -> Result<ChangePlan, ValidationError> {
    let machine = normalize::normalize_node_name("machine name", machine)?;
    let nm_type = nm_type.map(normalize::normalize_nm_type).transpose()?;
    let path = ConfigPath::from_segments(["Machines", machine.as_str(), "NodeManager", machine.as_str()])?;

    let section = Section::new("", path);
    let section = match &nm_type {
        Some(t) => section.set("NMType", t.as_str()),
        None => section.read("NMType"),
    };
    Ok(ChangePlan::new().section(section))
}

/// Rotation settings for the server log and the web server access log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRotation {
    pub rotation_type: String,
    pub file_count: i64,
}

pub fn log_settings(server: &str, rotation: Option<LogRotation>) -> Result<ChangePlan, ValidationError> {
    let server = normalize::normalize_node_name("server name", server)?;
    let common = ConfigPath::from_segments(["Servers", server.as_str(), "Log", server.as_str()])?;
    let web = ConfigPath::from_segments([
        "Servers",
        server.as_str(),
        "WebServer",
        server.as_str(),
        "WebServerLog",
        server.as_str(),
    ])?;

    let mut common = Section::new("common server logging", common);
    let mut web = Section::new("WebServer logging", web);
    match &rotation {
        Some(r) => {
            common = common
                .set("RotationType", r.rotation_type.as_str())
                .set("FileCount", r.file_count);
            web = web
                .set("RotationType", r.rotation_type.as_str())
                .set("FileCount", r.file_count);
        }
        None => {
            common = common.read("RotationType").read("FileCount");
            web = web.read("RotationType").read("FileCount");
        }
    }
    web = web.read("LogFileFormat").read("ELFFields");

    Ok(ChangePlan::new().section(common).section(web))
}

/// Read arbitrary attributes of one node
pub fn get_attributes(path: &str, names: &[String]) -> Result<ChangePlan, ValidationError> {
    let path = ConfigPath::parse(path)?;
    if names.is_empty() {
        return Err(ValidationError::Missing {
            what: "attribute name".to_string(),
        });
    }

    let mut section = Section::new(path.to_string(), path.clone());
    for name in names {
        section = section.read(crate::core::validate_attribute_name(name)?);
    }
    Ok(ChangePlan::new().section(section))
}

/// Write one attribute, the value parsed against its current kind
pub fn set_attribute(path: &str, name: &str, raw: Option<&str>) -> Result<ChangePlan, ValidationError> {
    let path = ConfigPath::parse(path)?;
    let name = crate::core::validate_attribute_name(name)?;

    let section = Section::new(path.to_string(), path.clone());
    let section = match raw {
        Some(raw) => section.set_raw(name, raw),
        None => section.read(name),
    };
    Ok(ChangePlan::new().section(section))
}
