//! Shared fixtures for the server test suites.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ortho_config::{OrthoConfig as _, OrthoError};

use crunchy_config::Config;
use crunchy_plugins::{
    CapabilitySet, Plugin, PluginHost, PluginLoader, Registries, Request, Response, SessionToken,
};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;

pub(crate) const USERNAME: &str = "crunchy";
pub(crate) const PASSWORD: &str = "secret";
pub(crate) const BODY_LIMIT: usize = 1024;

/// Loopback configuration on an ephemeral port with test credentials.
pub(crate) fn test_config() -> Config {
    Config {
        port: 0,
        username: USERNAME.to_owned(),
        password: PASSWORD.to_owned(),
        max_body_bytes: BODY_LIMIT,
        ..Config::default()
    }
}

pub(crate) type HandlerFn = fn(&Request) -> anyhow::Result<Response>;

/// Route registered by a [`RoutePlugin`].
#[derive(Clone, Copy)]
pub(crate) enum Route {
    Session(&'static str, HandlerFn),
    Exact(&'static str, HandlerFn),
    Prefix(&'static str, HandlerFn),
    Default(HandlerFn),
}

/// Plugin that only registers HTTP routes.
pub(crate) struct RoutePlugin {
    name: &'static str,
    routes: Vec<Route>,
}

impl RoutePlugin {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            routes: Vec::new(),
        }
    }

    pub(crate) fn with(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }
}

impl Plugin for RoutePlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn register(&self, host: &mut PluginHost<'_>) -> anyhow::Result<()> {
        for route in &self.routes {
            match *route {
                Route::Session(base, handler) => {
                    host.register_session_handler(base, handler)?;
                }
                Route::Exact(path, handler) => host.register_http_handler(path, handler)?,
                Route::Prefix(prefix, handler) => host.register_prefix_handler(prefix, handler)?,
                Route::Default(handler) => host.register_default_handler(handler)?,
            }
        }
        Ok(())
    }
}

/// Plugin requiring an `interpreter` capability nobody provides.
struct Notebook;

impl Plugin for Notebook {
    fn name(&self) -> &str {
        "notebook"
    }

    fn requires(&self) -> CapabilitySet {
        CapabilitySet::from_iter(["interpreter"])
    }

    fn register(&self, _host: &mut PluginHost<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) fn notebook_requiring_interpreter() -> Box<dyn Plugin> {
    Box::new(Notebook)
}

/// Loads `plugins` under a freshly generated token.
pub(crate) fn load_registries(plugins: Vec<Box<dyn Plugin>>) -> Arc<Registries> {
    let mut loader = PluginLoader::new();
    for plugin in plugins {
        loader.add(plugin);
    }
    let token = SessionToken::generate().expect("token generation");
    Arc::new(loader.load(token).expect("plugins load"))
}

/// Reports method, path and `uid` back to the caller.
pub(crate) fn describe(request: &Request) -> anyhow::Result<Response> {
    Ok(Response::ok(format!(
        "{} {} {}",
        request.method(),
        request.path(),
        request.uid().unwrap_or("-")
    )))
}

pub(crate) fn echo_body(request: &Request) -> anyhow::Result<Response> {
    Ok(Response::ok(request.body().to_vec()))
}

pub(crate) fn fallback(_request: &Request) -> anyhow::Result<Response> {
    Ok(Response::ok("fallback"))
}

pub(crate) fn failing(_request: &Request) -> anyhow::Result<Response> {
    Err(anyhow::anyhow!("interpreter exploded").context("running cell"))
}

pub(crate) fn panicking(_request: &Request) -> anyhow::Result<Response> {
    panic!("handler blew up")
}

pub(crate) fn slow(request: &Request) -> anyhow::Result<Response> {
    std::thread::sleep(Duration::from_millis(150));
    echo_body(request)
}

/// `Authorization` header value for `username:password`.
pub(crate) fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Builds a raw request that asks the server to close the connection once it
/// answers, adding `Content-Length` for non-empty bodies.
pub(crate) fn raw_request(method: &str, target: &str, auth: Option<&str>, body: &[u8]) -> Vec<u8> {
    let mut raw =
        format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if let Some(auth) = auth {
        raw.push_str(&format!("Authorization: {auth}\r\n"));
    }
    if !body.is_empty() {
        raw.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    raw.push_str("\r\n");
    let mut bytes = raw.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Authorised request with the test credentials.
pub(crate) fn authorised(method: &str, target: &str, body: &[u8]) -> Vec<u8> {
    raw_request(method, target, Some(&basic_auth(USERNAME, PASSWORD)), body)
}

/// Response parsed off the wire.
#[derive(Debug)]
pub(crate) struct WireResponse {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl WireResponse {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn parse(bytes: &[u8]) -> Self {
        let split = bytes
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .expect("response head terminator");
        let head = std::str::from_utf8(&bytes[..split]).expect("utf8 head");
        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|line| line.split(' ').nth(1))
            .and_then(|code| code.parse().ok())
            .expect("status code");
        let headers = lines
            .filter_map(|line| line.split_once(": "))
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();
        Self {
            status,
            headers,
            body: bytes[split + 4..].to_vec(),
        }
    }
}

/// Sends `raw` over a fresh connection and reads until the server closes.
pub(crate) fn exchange(addr: SocketAddr, raw: &[u8]) -> WireResponse {
    let mut stream = TcpStream::connect(addr).expect("connect to server");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    stream.write_all(raw).expect("send request");
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).expect("read response");
    WireResponse::parse(&bytes)
}

/// Loader returning a fixed configuration.
pub(crate) struct FixedConfigLoader(pub(crate) Config);

impl ConfigLoader for FixedConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.0.clone())
    }
}

/// Loader that fails by passing an invalid port on the command line.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("crunchyd"),
            OsString::from("--port"),
            OsString::from("notaport"),
        ];
        Config::load_from_iter(args)
    }
}

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    PluginsLoaded(Vec<String>),
    ListenerReady,
    ShutdownComplete,
}

/// Records health events for assertions.
#[derive(Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn plugins_loaded(&self, order: &[String]) {
        self.record(HealthEvent::PluginsLoaded(order.to_vec()));
    }

    fn listener_ready(&self, _addr: SocketAddr) {
        self.record(HealthEvent::ListenerReady);
    }

    fn shutdown_complete(&self) {
        self.record(HealthEvent::ShutdownComplete);
    }
}
