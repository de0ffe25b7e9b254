//! Command-line front end
//!
//! Argument parsing with clap. Each subcommand becomes a change plan, which
//! is validated completely before any connection is attempted.

use crate::commands::{self, ChangePlan, LogRotation, Mode, Report};
use crate::constants::{
    MASKED_PASSWORD, PROP_ADMIN_URL, PROP_ADMIN_USERNAME, PROP_LOG_ROTATION_COUNT,
    PROP_LOG_ROTATION_TYPE, PROP_SERVER_NAME,
};
use crate::core::remote::RemoteConfigService;
use crate::core::session::ConfigSession;
use crate::models::Credentials;
use crate::normalize;
use crate::platform;
use crate::properties::Properties;
use crate::utils::{CliError, ValidationError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

/// wlconfig - read and change WebLogic domain configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "wlconfig", version)]
#[command(about = "Read and change attributes of a WebLogic domain inside one edit session")]
pub struct Cli {
    /// Properties file holding admin.username, admin.password and admin.url
    #[arg(short = 'p', long, env = "WLCONFIG_PROPERTIES", global = true)]
    pub properties: Option<PathBuf>,

    /// Connect and print current values without editing anything
    #[arg(short = 'l', long, global = true)]
    pub list_only: bool,

    /// Debug diagnostics on stderr (overridden by WLCONFIG_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set ListenPort of a server
    ListenPort {
        #[arg(short = 's', long = "server")]
        server: String,
        #[arg(short = 'o', long = "port")]
        port: Option<String>,
    },

    /// Set AutoRestart of a server (True or False)
    AutoRestart {
        #[arg(short = 's', long = "server")]
        server: String,
        #[arg(short = 'v', long = "value")]
        value: Option<String>,
    },

    /// Set MaxRequestParameterCount of a server
    MaxReqParamCount {
        #[arg(short = 's', long = "server")]
        server: String,
        #[arg(short = 'v', long = "value")]
        value: Option<String>,
    },

    /// Set RestartDelaySeconds of a server
    RestartDelay {
        #[arg(short = 's', long = "server")]
        server: String,
        #[arg(short = 'v', long = "value")]
        value: Option<String>,
    },

    /// Set the node manager type of a machine (usually SSL or Plain)
    MachineNmType {
        #[arg(short = 'm', long = "machine")]
        machine: String,
        #[arg(short = 't', long = "type")]
        nm_type: Option<String>,
    },

    /// Set log rotation for the server log and the web server log.
    /// Values come from log.rotation.type and log.rotation.count.
    LogSettings {
        /// Defaults to sv.name from the properties file
        #[arg(short = 's', long = "server")]
        server: Option<String>,
    },

    /// Print attributes of any node
    Get {
        #[arg(long)]
        path: String,
        #[arg(long = "attr", required = true, num_args = 1..)]
        attrs: Vec<String>,
    },

    /// Set one attribute of any node, parsing the value as the attribute's current type
    Set {
        #[arg(long)]
        path: String,
        #[arg(long = "attr")]
        attr: String,
        #[arg(long)]
        value: Option<String>,
    },
}

impl Command {
    /// Inputs exactly as given, before any validation
    pub fn inputs(&self, props: &Properties) -> Vec<(&'static str, String)> {
        let given = |value: &Option<String>| value.clone().unwrap_or_default();
        let prop = |key: &str| props.get(key).unwrap_or_default().to_string();
        match self {
            Command::ListenPort { server, port } => {
                vec![("svName", server.clone()), ("port", given(port))]
            }
            Command::AutoRestart { server, value } => {
                vec![("svName", server.clone()), ("restart", given(value))]
            }
            Command::MaxReqParamCount { server, value } => {
                vec![("svName", server.clone()), ("count", given(value))]
            }
            Command::RestartDelay { server, value } => {
                vec![("svName", server.clone()), ("sec", given(value))]
            }
            Command::MachineNmType { machine, nm_type } => {
                vec![("machinename", machine.clone()), ("nmtype", given(nm_type))]
            }
            Command::LogSettings { server } => vec![
                ("svName", server.clone().unwrap_or_else(|| prop(PROP_SERVER_NAME))),
                ("rotationType", prop(PROP_LOG_ROTATION_TYPE)),
                ("rotationCount", prop(PROP_LOG_ROTATION_COUNT)),
            ],
            Command::Get { path, attrs } => {
                vec![("path", path.clone()), ("attributes", attrs.join(" "))]
            }
            Command::Set { path, attr, value } => vec![
                ("path", path.clone()),
                ("attribute", attr.clone()),
                ("value", given(value)),
            ],
        }
    }
}

/// Input echo printed before anything is validated
///
/// # Security
/// - The password is never read here; it always shows as `****`
pub fn echo(command: &Command, props: &Properties) -> String {
    let mut out = String::new();
    for (name, value) in command.inputs(props) {
        out.push_str(&format!("{} = {}\n", name, value));
    }
    out.push_str(&format!(
        "adminUsername = {}\n",
        props.get(PROP_ADMIN_USERNAME).unwrap_or_default()
    ));
    out.push_str(&format!("adminPassword = {}\n", MASKED_PASSWORD));
    out.push_str(&format!(
        "adminURL = {}\n",
        props.get(PROP_ADMIN_URL).unwrap_or_default()
    ));
    out
}

/// A fully validated invocation, ready to run
#[derive(Debug)]
pub struct Invocation {
    pub plan: ChangePlan,
    pub credentials: Credentials,
    pub mode: Mode,
}

impl Invocation {
    pub fn prepare(cli: &Cli, props: &Properties) -> Result<Self, CliError> {
        let plan = build_plan(&cli.command, props, cli.list_only)?;
        let credentials = props.credentials()?;
        let mode = if cli.list_only || plan.is_read_only() {
            Mode::ListOnly
        } else {
            Mode::Apply
        };
        debug!(?mode, sections = plan.sections.len(), "invocation prepared");
        Ok(Self {
            plan,
            credentials,
            mode,
        })
    }

    pub fn run<S: RemoteConfigService>(&self, service: S) -> Result<Report, CliError> {
        let mut session = ConfigSession::new(service);
        let report = commands::run_plan(&mut session, &self.credentials, &self.plan, self.mode)?;
        Ok(report)
    }
}

/// Load properties, build the plan, run it against the backend the admin URL names
pub fn run(cli: &Cli) -> Result<(), CliError> {
    let path = cli
        .properties
        .as_deref()
        .ok_or_else(|| CliError::Usage("a properties file is required (-p <file>)".to_string()))?;
    println!("properties = {}", path.display());
    let props = Properties::load(path)?;
    print!("{}", echo(&cli.command, &props));

    let invocation = Invocation::prepare(cli, &props)?;

    let backend = platform::backend_for(invocation.credentials.admin_url());
    info!(endpoint = %backend.endpoint(), mode = ?invocation.mode, "running");
    let report = invocation.run(backend)?;
    println!("{}", report);
    Ok(())
}

fn required<'a>(value: &'a Option<String>, list_only: bool, what: &str) -> Result<Option<&'a str>, ValidationError> {
    match value.as_deref() {
        Some(v) => Ok(Some(v)),
        None if list_only => Ok(None),
        None => Err(ValidationError::Missing {
            what: what.to_string(),
        }),
    }
}

fn build_plan(command: &Command, props: &Properties, list_only: bool) -> Result<ChangePlan, CliError> {
    let plan = match command {
        Command::ListenPort { server, port } => {
            let port = required(port, list_only, "listen port (-o)")?
                .map(normalize::parse_port)
                .transpose()?;
            commands::listen_port(server, port)?
        }
        Command::AutoRestart { server, value } => {
            let value = required(value, list_only, "AutoRestart value (-v)")?
                .map(normalize::parse_flag)
                .transpose()?;
            commands::auto_restart(server, value)?
        }
        Command::MaxReqParamCount { server, value } => {
            let value = required(value, list_only, "parameter count (-v)")?
                .map(|raw| normalize::parse_count("parameter count", raw))
                .transpose()?;
            commands::max_request_parameter_count(server, value)?
        }
        Command::RestartDelay { server, value } => {
            let value = required(value, list_only, "restart delay (-v)")?
                .map(|raw| normalize::parse_count("restart delay", raw))
                .transpose()?;
            commands::restart_delay(server, value)?
        }
        Command::MachineNmType { machine, nm_type } => {
            let nm_type = required(nm_type, list_only, "node manager type (-t)")?;
            commands::machine_nm_type(machine, nm_type)?
        }
        Command::LogSettings { server } => {
            let server = match server {
                Some(server) => server.as_str(),
                None => props.require(PROP_SERVER_NAME)?,
            };
            let rotation = if list_only {
                None
            } else {
                Some(LogRotation {
                    rotation_type: normalize::normalize_rotation_type(
                        props.require(PROP_LOG_ROTATION_TYPE)?,
                    )?,
                    file_count: normalize::parse_count(
                        "log rotation count",
                        props.require(PROP_LOG_ROTATION_COUNT)?,
                    )?,
                })
            };
            commands::log_settings(server, rotation)?
        }
        Command::Get { path, attrs } => commands::get_attributes(path, attrs)?,
        Command::Set { path, attr, value } => {
            let value = required(value, list_only, "value (--value)")?;
            commands::set_attribute(path, attr, value)?
        }
    };
    Ok(plan)
}
