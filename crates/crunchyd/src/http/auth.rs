//! HTTP Basic authentication against the configured credential pair.
//!
//! One shared username and password guard every path. This suits a server
//! bound to loopback for a single trusted user and nothing wider: there is
//! no lockout, no rate limiting and no per-user identity.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use crunchy_config::Credentials;

/// Realm announced in the authentication challenge.
pub(crate) const REALM: &str = "Crunchy Access";

/// Value of the `WWW-Authenticate` header sent with a `401`.
pub(crate) fn challenge() -> String {
    format!("Basic realm=\"{REALM}\"")
}

/// Checks an `Authorization` header value against `credentials`.
pub(crate) fn is_authorised(header: Option<&str>, credentials: &Credentials) -> bool {
    let Some((scheme, encoded)) = header.and_then(|value| value.trim().split_once(' ')) else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return false;
    }
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(pair) = String::from_utf8(decoded) else {
        return false;
    };
    pair.split_once(':')
        .is_some_and(|(username, password)| credentials.matches(username, password))
}
