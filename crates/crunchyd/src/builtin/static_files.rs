//! Default handler serving files from the configured server root.

use std::fs;
use std::io;

use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use crunchy_plugins::{CapabilitySet, HttpHandler, Plugin, PluginHost, Request, Response};
use tracing::{debug, info};

use super::BUILTIN_TARGET;

const INDEX_FILE: &str = "index.html";

/// Serves `server_root` through the default route.
///
/// Without a root the plugin registers nothing, so unmatched paths keep
/// answering `204`.
#[derive(Debug, Clone, Default)]
pub struct StaticFiles {
    root: Option<Utf8PathBuf>,
}

impl StaticFiles {
    /// Builds the plugin for an optional root directory.
    #[must_use]
    pub const fn new(root: Option<Utf8PathBuf>) -> Self {
        Self { root }
    }
}

impl Plugin for StaticFiles {
    fn name(&self) -> &str {
        "static_files"
    }

    fn provides(&self) -> CapabilitySet {
        CapabilitySet::from_iter(["static_files"])
    }

    fn register(&self, host: &mut PluginHost<'_>) -> anyhow::Result<()> {
        let Some(root) = &self.root else {
            debug!(target: BUILTIN_TARGET, "no server root configured; static files disabled");
            return Ok(());
        };
        host.register_default_handler(FileHandler { root: root.clone() })?;
        info!(target: BUILTIN_TARGET, %root, "serving static files");
        Ok(())
    }
}

struct FileHandler {
    root: Utf8PathBuf,
}

impl FileHandler {
    /// Maps a request path below the root; `None` for traversal attempts.
    fn resolve(&self, path: &str) -> Option<Utf8PathBuf> {
        let mut resolved = self.root.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => return None,
                segment if segment.contains('\\') || segment.contains('\0') => return None,
                segment => resolved.push(segment),
            }
        }
        if resolved.is_dir() {
            resolved.push(INDEX_FILE);
        }
        Some(resolved)
    }
}

impl HttpHandler for FileHandler {
    fn handle(&self, request: &Request) -> anyhow::Result<Response> {
        let Some(path) = self.resolve(request.path()) else {
            debug!(target: BUILTIN_TARGET, path = request.path(), "rejected path traversal");
            return Ok(Response::not_found());
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Response::ok(bytes).with_content_type(content_type(&path))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Response::not_found()),
            Err(error) => Err(error).with_context(|| format!("failed to read '{path}'")),
        }
    }
}

fn content_type(path: &Utf8Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}
