//! Plugins compiled into the server.

mod echo;
mod static_files;

use crunchy_config::Config;
use crunchy_plugins::Plugin;

pub use self::echo::{ECHO_PATH, Echo};
pub use self::static_files::StaticFiles;

pub(crate) const BUILTIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::builtin");

/// Built-in plugins in declaration order.
#[must_use]
pub fn builtin_plugins(config: &Config) -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(StaticFiles::new(config.server_root().map(ToOwned::to_owned))),
        Box::new(Echo),
    ]
}
