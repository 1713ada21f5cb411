//! Log output selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How telemetry events are rendered on stderr.
///
/// Parsing is case-insensitive, so `--log-format COMPACT` and
/// `CRUNCHY_LOG_FORMAT=json` are both accepted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened to the top level.
    #[default]
    Json,
    /// Terse text lines for interactive use.
    Compact,
}

/// Returned when text names no known [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
