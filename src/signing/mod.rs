//! Session signing layer
//!
//! Reconstructs the wallet provider's hash and signature protocol over field
//! elements, including the wildcard-root correction the provider's own client
//! gets wrong. Credentials are opaque inputs: nothing in here derives them.

pub mod hash;
pub mod session;
pub mod signer;

pub use session::{apply_wildcard_fix, session_signing_hash, SignatureBundle};
pub use signer::ControllerClient;

use sha3::{Digest, Keccak256};
use starknet_types_core::felt::Felt;

use crate::core::error::{DelveError, Result};

/// Typed-data prefix for off-chain messages
pub fn starknet_message_prefix() -> Felt {
    short_string("StarkNet Message")
}

/// Transaction-hash prefix for the direct invoke path
pub fn invoke_prefix() -> Felt {
    short_string("invoke")
}

/// ASCII short-string encoding into a single field element
pub fn short_string(s: &str) -> Felt {
    debug_assert!(s.len() <= 31, "short strings fit in one field element");
    Felt::from_bytes_be_slice(s.as_bytes())
}

/// Entry-point selector: keccak-256 of the name, truncated into the field
/// (top six bits masked off).
pub fn selector_from_name(name: &str) -> Felt {
    let mut hash: [u8; 32] = Keccak256::digest(name.as_bytes()).into();
    hash[0] &= 0x03;
    Felt::from_bytes_be(&hash)
}

/// Opaque session credentials supplied at startup
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    /// Account contract the session is registered on
    pub controller_address: Felt,
    /// Locally held signing key for the session
    pub session_private_key: Felt,
    /// Identifier of the session key as the account knows it
    pub session_key_guid: Felt,
    /// Hash of the registered session object; part of the signing domain
    pub registered_session_hash: Felt,
    /// Reserved root meaning "all policies pre-approved"
    pub wildcard_root: Felt,
    /// Unix timestamp the session authorization expires at
    pub expires_at: u64,
}

impl SessionCredentials {
    /// Load credentials from the environment.
    ///
    /// Required: DELVEBOT_CONTROLLER_ADDRESS, DELVEBOT_SESSION_PRIVATE_KEY,
    /// DELVEBOT_SESSION_KEY_GUID, DELVEBOT_SESSION_HASH,
    /// DELVEBOT_WILDCARD_ROOT, DELVEBOT_SESSION_EXPIRES_AT
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            controller_address: felt_env("DELVEBOT_CONTROLLER_ADDRESS")?,
            session_private_key: felt_env("DELVEBOT_SESSION_PRIVATE_KEY")?,
            session_key_guid: felt_env("DELVEBOT_SESSION_KEY_GUID")?,
            registered_session_hash: felt_env("DELVEBOT_SESSION_HASH")?,
            wildcard_root: felt_env("DELVEBOT_WILDCARD_ROOT")?,
            expires_at: std::env::var("DELVEBOT_SESSION_EXPIRES_AT")
                .map_err(|_| missing("DELVEBOT_SESSION_EXPIRES_AT"))?
                .parse()
                .map_err(|_| DelveError::Credentials("expiry is not a unix timestamp".into()))?,
        })
    }
}

fn felt_env(key: &str) -> Result<Felt> {
    let raw = std::env::var(key).map_err(|_| missing(key))?;
    Felt::from_hex(&raw).map_err(|_| DelveError::Credentials(format!("{key} is not a field element")))
}

fn missing(key: &str) -> DelveError {
    DelveError::Credentials(format!("{key} not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_in_field() {
        let s = selector_from_name("attack");
        // top 6 bits masked: value fits under 2^250
        let bytes = s.to_bytes_be();
        assert_eq!(bytes[0] & 0xfc, 0);
        // deterministic
        assert_eq!(s, selector_from_name("attack"));
        assert_ne!(s, selector_from_name("flee"));
    }

    #[test]
    fn test_short_string_round_trip() {
        let felt = short_string("invoke");
        let bytes = felt.to_bytes_be();
        assert_eq!(&bytes[32 - 6..], b"invoke");
    }
}
