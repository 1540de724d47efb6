//! Stateless two-step confirmation for destructive actions.
//!
//! A destructive call without a token fails with
//! [`Error::ConfirmationRequired`](crate::Error::ConfirmationRequired). The
//! token is derived from the action and the exact state it would change, so
//! the confirming call only has to recompute and compare it. Any change to
//! that state in between invalidates the token.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Context string for BLAKE3 key derivation.
const DERIVE_CONTEXT: &str = "fleetlog 2024-06 destructive action confirmation";

/// Number of hex characters kept from the hash.
const TOKEN_LEN: usize = 16;

/// Opaque token proving the caller saw the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// Derive the token for `action` applied to the given state parts.
    ///
    /// Parts are length-prefixed before hashing so `["ab", "c"]` and
    /// `["a", "bc"]` produce different tokens.
    #[must_use]
    pub fn derive(action: &str, parts: &[&str]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(DERIVE_CONTEXT);
        hasher.update(action.as_bytes());
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let hex = hasher.finalize().to_hex();
        Self(hex.as_str()[..TOKEN_LEN].to_string())
    }

    /// Wrap a token supplied by a caller (e.g. from the command line).
    #[must_use]
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_ascii_lowercase())
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of checking a caller-supplied token against the expected one.
#[must_use]
pub(crate) fn is_confirmed(
    supplied: Option<&ConfirmationToken>,
    expected: &ConfirmationToken,
) -> bool {
    supplied.is_some_and(|token| token == expected)
}
