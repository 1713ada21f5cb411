//! Per-process random token used to namespace session-scoped routes.
//!
//! Any route that only same-session browser code should reach is registered
//! as `base + token`. The router never inspects the token: reachability rests
//! entirely on the token being unguessable, which makes this
//! capability-by-obscurity rather than authorisation.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::error::TokenError;

/// Bytes of OS entropy per token (160 bits).
const TOKEN_BYTES: usize = 20;

static PROCESS_TOKEN: OnceCell<SessionToken> = OnceCell::new();

/// Opaque printable token, constant for the lifetime of the process.
///
/// # Example
///
/// ```
/// use crunchy_plugins::SessionToken;
///
/// let token = SessionToken::current().expect("entropy available");
/// assert_eq!(token.scope("/exec"), format!("/exec{token}"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh token from the operating system CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Entropy`] when the entropy source is unavailable.
    /// Callers must treat this as fatal: a predictable token must never be
    /// served.
    pub fn generate() -> Result<Self, TokenError> {
        let mut bytes = [0_u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|error| TokenError::Entropy {
            message: error.to_string(),
        })?;
        Ok(Self::from_entropy(&bytes))
    }

    /// Lower-case hex rendering keeps the token path-safe.
    fn from_entropy(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Returns the process-wide token, generating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Entropy`] if the first generation fails; later
    /// calls retry.
    pub fn current() -> Result<&'static Self, TokenError> {
        PROCESS_TOKEN.get_or_try_init(Self::generate)
    }

    /// Token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends the token to `base`, producing a session-scoped path.
    #[must_use]
    pub fn scope(&self, base: &str) -> String {
        let mut path = String::with_capacity(base.len() + self.0.len());
        path.push_str(base);
        path.push_str(&self.0);
        path
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionToken(<redacted>)")
    }
}
