//! Session signature bundles and the wildcard-root fix
//!
//! The bundle layout is a fixed wire contract with the account contract:
//!
//! ```text
//! [0]              scheme tag
//! [1]              reserved
//! [2]              policy-authorization root (or the wildcard sentinel)
//! [3..7]           reserved
//! [7]              auth-chain length N
//! [8..8+N]         authorization chain
//! [8+N..8+N+4]     signer type, session pubkey, r, s
//! [8+N+4..]        proof region (Merkle inclusion proof, length-prefixed)
//! ```
//!
//! The upstream signing client authorizes against a specific policy root even
//! when the registered session recognizes the wildcard root. The fix rewrites
//! the root, re-signs, and collapses the now-pointless proof to its zero
//! length prefix.

use starknet_crypto::{get_public_key, poseidon_hash_many, rfc6979_generate_k, sign};
use starknet_types_core::felt::Felt;

use super::{short_string, SessionCredentials};
use crate::core::error::{DelveError, Result};

/// Offset of the scheme tag
pub const SCHEME_OFFSET: usize = 0;
/// Offset of the policy-authorization root
pub const ROOT_OFFSET: usize = 2;
/// Offset of the auth-chain length
pub const AUTH_LEN_OFFSET: usize = 7;
/// Fixed header size preceding the auth chain
pub const HEADER_LEN: usize = 8;
/// Signer type, pubkey, r, s
pub const SIGNATURE_LEN: usize = 4;

/// A session authorization as a flat field-element sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBundle(pub Vec<Felt>);

impl SignatureBundle {
    pub fn auth_len(&self) -> usize {
        felt_to_usize(self.0[AUTH_LEN_OFFSET])
    }

    /// Index of the signer-type element
    pub fn signature_base(&self) -> usize {
        HEADER_LEN + self.auth_len()
    }

    pub fn r_offset(&self) -> usize {
        self.signature_base() + 2
    }

    pub fn s_offset(&self) -> usize {
        self.signature_base() + 3
    }

    /// Number of elements in the trailing proof region
    pub fn proof_len(&self) -> usize {
        self.0.len() - self.signature_base() - SIGNATURE_LEN
    }

    pub fn root(&self) -> Felt {
        self.0[ROOT_OFFSET]
    }

    /// Layout sanity: total length = 8 + authLen + 4 + proofLen, proof present
    pub fn validate(&self) -> Result<()> {
        if self.0.len() < HEADER_LEN + SIGNATURE_LEN + 1 {
            return Err(DelveError::Signing(format!(
                "signature bundle too short: {} elements",
                self.0.len()
            )));
        }
        let required = HEADER_LEN + self.auth_len() + SIGNATURE_LEN + 1;
        if self.0.len() < required {
            return Err(DelveError::Signing(format!(
                "signature bundle truncated: {} elements, {} required",
                self.0.len(),
                required
            )));
        }
        Ok(())
    }

    /// Build the bundle shape the upstream client produces: authorized
    /// against a specific policy root with its inclusion proof attached.
    pub fn build(
        creds: &SessionCredentials,
        message_hash: Felt,
        policy_root: Felt,
        proof: Vec<Felt>,
    ) -> Result<Self> {
        let signing_hash = session_signing_hash(message_hash, creds.registered_session_hash);
        let (r, s) = ecdsa_sign(creds.session_private_key, signing_hash)?;
        let pubkey = get_public_key(&creds.session_private_key);

        let mut elements = vec![Felt::ZERO; HEADER_LEN];
        elements[SCHEME_OFFSET] = short_string("session-token");
        elements[ROOT_OFFSET] = policy_root;
        elements[AUTH_LEN_OFFSET] = Felt::ZERO; // no nested authorization chain
        elements.push(Felt::ZERO); // signer type: session key
        elements.push(pubkey);
        elements.push(r);
        elements.push(s);
        elements.push(Felt::from(proof.len() as u64));
        elements.extend(proof);
        Ok(Self(elements))
    }
}

/// The hash actually signed: a fixed-arity combination of the message hash
/// and the registered session hash
pub fn session_signing_hash(message_hash: Felt, session_hash: Felt) -> Felt {
    poseidon_hash_many(&[message_hash, session_hash, Felt::TWO])
}

/// Rewrite an otherwise-valid bundle to use the wildcard policy root.
///
/// Idempotent on the root field and the proof-tail length: applying it twice
/// neither changes offset 2 again nor shrinks the tail below one element.
pub fn apply_wildcard_fix(
    bundle: &mut SignatureBundle,
    message_hash: Felt,
    creds: &SessionCredentials,
) -> Result<()> {
    bundle.validate()?;

    bundle.0[ROOT_OFFSET] = creds.wildcard_root;

    let signing_hash = session_signing_hash(message_hash, creds.registered_session_hash);
    let (r, s) = ecdsa_sign(creds.session_private_key, signing_hash)?;
    let r_offset = bundle.r_offset();
    let s_offset = bundle.s_offset();
    bundle.0[r_offset] = r;
    bundle.0[s_offset] = s;

    // Wildcard needs no inclusion proof: one zero element (an empty
    // length-prefixed array) replaces the whole tail
    bundle.0.truncate(bundle.signature_base() + SIGNATURE_LEN);
    bundle.0.push(Felt::ZERO);
    Ok(())
}

/// RFC-6979 deterministic ECDSA over the curve the account verifies against
fn ecdsa_sign(private_key: Felt, message: Felt) -> Result<(Felt, Felt)> {
    let k = rfc6979_generate_k(&message, &private_key, None);
    let signature = sign(&private_key, &message, &k)
        .map_err(|e| DelveError::Signing(format!("ecdsa sign failed: {e}")))?;
    Ok((signature.r, signature.s))
}

fn felt_to_usize(felt: Felt) -> usize {
    let bytes = felt.to_bytes_be();
    let mut value = 0usize;
    for &b in &bytes[24..] {
        value = value << 8 | b as usize;
    }
    value
}
