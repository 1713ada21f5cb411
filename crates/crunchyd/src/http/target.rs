//! Request-target decoding.

use percent_encoding::percent_decode_str;

/// Decoded path and query arguments of a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestTarget {
    pub(crate) path: String,
    /// Arguments in query order; later duplicates override earlier ones
    /// once applied to a request.
    pub(crate) args: Vec<(String, String)>,
}

/// Splits `target` at the first `?` and decodes both halves.
///
/// The path is percent-decoded as is. Query pairs are separated by `&`,
/// have `+` read as a space before percent-decoding, and are skipped when
/// they carry no `=`.
pub(crate) fn parse_target(target: &str) -> RequestTarget {
    let (raw_path, query) = target.split_once('?').unwrap_or((target, ""));
    let path = percent_decode_str(raw_path).decode_utf8_lossy().into_owned();
    let args = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (decode_component(key), decode_component(value)))
        .collect();
    RequestTarget { path, args }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
