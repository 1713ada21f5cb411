//! Layering behaviour of the configuration loader: file < environment < CLI.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig as _;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use crunchy_config::{
    Config, DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USERNAME,
    LogFormat, default_log_filter, default_log_format,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(&'static str, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            temp_dir: TempDir::new().expect("temp dir"),
            cli_args: RefCell::new(vec![OsString::from("crunchyd")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _guard: guard,
        }
    }

    fn write_config(&self, toml: &str) {
        let path = self.temp_dir.path().join("crunchy.toml");
        fs::write(&path, toml).expect("write configuration");
        self.push_cli_arg("--config-path");
        self.push_cli_arg(path.into_os_string());
    }

    fn set_env(&self, key: &'static str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024; the mutex held by
        // the harness serialises access and `Drop` restores the old value.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides.borrow_mut().push((key, previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }
        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        self.loaded
            .borrow()
            .clone()
            .expect("configuration was not loaded")
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            match value {
                Some(previous) => unsafe { std::env::set_var(key, previous) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the port to {port} and the log format to \"{format}\"")]
fn given_port_and_format_file(harness: &Harness, port: u16, format: String) {
    harness.write_config(&format!("port = {port}\nlog_format = \"{format}\"\n"));
}

#[given("a configuration file setting the credentials to \"{username}\" and \"{password}\"")]
fn given_credentials_file(harness: &Harness, username: String, password: String) {
    harness.write_config(&format!(
        "username = \"{username}\"\npassword = \"{password}\"\n"
    ));
}

#[given("the environment sets CRUNCHY_PORT to {port}")]
fn given_environment_port(harness: &Harness, port: u16) {
    harness.set_env("CRUNCHY_PORT", &port.to_string());
}

#[when("the command line sets the port to {port}")]
fn when_cli_port(harness: &Harness, port: u16) {
    harness.push_cli_arg("--port");
    harness.push_cli_arg(port.to_string());
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();
    assert_eq!(config.bind_address(), (DEFAULT_HOST, DEFAULT_PORT));
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
    assert!(config.server_root().is_none());
    assert!(config.credentials().matches(DEFAULT_USERNAME, DEFAULT_PASSWORD));
}

#[then("loading the configuration resolves the port to {port}")]
fn then_resolved_port(harness: &Harness, port: u16) {
    assert_eq!(harness.config().port, port);
}

#[then("the log format is \"{format}\"")]
fn then_log_format(harness: &Harness, format: String) {
    let expected: LogFormat = format.parse().expect("known log format");
    assert_eq!(harness.config().log_format(), expected);
}

#[then("loading the configuration accepts \"{username}\" with \"{password}\"")]
fn then_credentials_accepted(harness: &Harness, username: String, password: String) {
    assert!(harness.config().credentials().matches(&username, &password));
}

#[then("the default credentials are rejected")]
fn then_default_credentials_rejected(harness: &Harness) {
    assert!(
        !harness
            .config()
            .credentials()
            .matches(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    );
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Defaults apply without overrides"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The configuration file overrides defaults"
)]
fn file_overrides_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The command line overrides the environment"
)]
fn cli_overrides_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Credentials can be replaced from the configuration file"
)]
fn credentials_from_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}
