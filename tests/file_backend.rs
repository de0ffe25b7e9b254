//! CLI runs against a domain snapshot on disk.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use wlconfig::cli::{self, Cli};
use wlconfig::constants::{EXIT_FAILURE, EXIT_USAGE};
use wlconfig::platform::DomainSnapshot;
use wlconfig::{AttributeValue, ConfigPath, ConfigTree};

fn write_domain(dir: &Path) -> PathBuf {
    let server = ConfigTree::new()
        .with_attribute("Name", "ms1")
        .with_attribute("ListenPort", 8001i64)
        .with_attribute("RestartDelaySeconds", 0i64)
        .with_child(
            "Log",
            ConfigTree::new().with_child(
                "ms1",
                ConfigTree::new()
                    .with_attribute("RotationType", "bySize")
                    .with_attribute("FileCount", 7i64),
            ),
        )
        .with_child(
            "WebServer",
            ConfigTree::new().with_child(
                "ms1",
                ConfigTree::new().with_child(
                    "WebServerLog",
                    ConfigTree::new().with_child(
                        "ms1",
                        ConfigTree::new()
                            .with_attribute("RotationType", "bySize")
                            .with_attribute("FileCount", 7i64)
                            .with_attribute("LogFileFormat", "common")
                            .with_attribute("ELFFields", "date time"),
                    ),
                ),
            ),
        );

    let snapshot = DomainSnapshot {
        admin_user: Some("weblogic".to_string()),
        root: ConfigTree::new().with_child("Servers", ConfigTree::new().with_child("ms1", server)),
    };
    let path = dir.join("base_domain.json");
    snapshot.store(&path).unwrap();
    path
}

fn write_properties(dir: &Path, domain: &Path) -> PathBuf {
    let url = url::Url::from_file_path(domain).unwrap();
    let body = format!(
        "admin.username=weblogic\n\
         admin.password=welcome1\n\
         admin.url={}\n\
         sv.name=ms1\n\
         log.rotation.type=byTime\n\
         log.rotation.count=30\n",
        url
    );
    let path = dir.join("domain.properties");
    fs::write(&path, body).unwrap();
    path
}

fn run(props: &Path, args: &[&str]) -> Result<(), wlconfig::utils::CliError> {
    let mut argv = vec!["wlconfig", "-p", props.to_str().unwrap()];
    argv.extend_from_slice(args);
    cli::run(&Cli::try_parse_from(argv).unwrap())
}

fn attribute(domain: &Path, path: &str, name: &str) -> Option<AttributeValue> {
    let snapshot = DomainSnapshot::load(domain).unwrap();
    snapshot
        .root
        .lookup(&ConfigPath::parse(path).unwrap())
        .ok()?
        .attribute(name)
        .cloned()
}

#[test]
fn listen_port_is_written_to_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let domain = write_domain(dir.path());
    let props = write_properties(dir.path(), &domain);

    run(&props, &["listen-port", "-s", "ms1", "-o", "9001"]).unwrap();

    assert_eq!(
        attribute(&domain, "/Servers/ms1", "ListenPort"),
        Some(AttributeValue::Int(9001))
    );
    assert!(!dir.path().join("base_domain.json.lock").exists());
}

#[test]
fn log_settings_updates_both_logs() {
    let dir = tempfile::tempdir().unwrap();
    let domain = write_domain(dir.path());
    let props = write_properties(dir.path(), &domain);

    run(&props, &["log-settings"]).unwrap();

    for path in ["/Servers/ms1/Log/ms1", "/Servers/ms1/WebServer/ms1/WebServerLog/ms1"] {
        assert_eq!(
            attribute(&domain, path, "RotationType"),
            Some(AttributeValue::from("byTime"))
        );
        assert_eq!(attribute(&domain, path, "FileCount"), Some(AttributeValue::Int(30)));
    }
}

#[test]
fn list_only_leaves_the_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let domain = write_domain(dir.path());
    let props = write_properties(dir.path(), &domain);
    let before = fs::read_to_string(&domain).unwrap();

    run(&props, &["-l", "restart-delay", "-s", "ms1", "-v", "60"]).unwrap();

    assert_eq!(fs::read_to_string(&domain).unwrap(), before);
}

#[test]
fn failed_edit_releases_the_lock_file() {
    let dir = tempfile::tempdir().unwrap();
    let domain = write_domain(dir.path());
    let props = write_properties(dir.path(), &domain);
    let before = fs::read_to_string(&domain).unwrap();

    let err = run(&props, &["set", "--path", "/Servers/ms1", "--attr", "ListenPort", "--value", "http"])
        .unwrap_err();

    assert_eq!(err.exit_code(), EXIT_FAILURE);
    assert!(err.to_string().starts_with("AttributeError.TypeMismatch during SetAttribute"));
    assert!(!dir.path().join("base_domain.json.lock").exists());
    assert_eq!(fs::read_to_string(&domain).unwrap(), before);
}

#[test]
fn held_lock_blocks_the_edit() {
    let dir = tempfile::tempdir().unwrap();
    let domain = write_domain(dir.path());
    let props = write_properties(dir.path(), &domain);
    fs::write(dir.path().join("base_domain.json.lock"), "{}").unwrap();

    let err = run(&props, &["listen-port", "-s", "ms1", "-o", "9001"]).unwrap_err();

    assert_eq!(err.exit_code(), EXIT_FAILURE);
    assert!(err.to_string().starts_with("EditError during BeginEdit"));
    assert_eq!(
        attribute(&domain, "/Servers/ms1", "ListenPort"),
        Some(AttributeValue::Int(8001))
    );
}

#[test]
fn missing_properties_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&dir.path().join("absent.properties"), &["listen-port", "-s", "ms1", "-o", "9001"])
        .unwrap_err();
    assert_eq!(err.exit_code(), EXIT_USAGE);
}
