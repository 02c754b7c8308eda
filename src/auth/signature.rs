//! Webhook signature computation and comparison.
//!
//! Signatures are hex-encoded HMAC digests over the raw payload bytes.
//! All comparisons are constant-time: execution time must not depend on
//! where two byte sequences first differ.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// HMAC algorithm a provider signs payloads with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA256 (GitHub, custom webhooks)
    Sha256,
    /// HMAC-SHA1 (Bitbucket)
    Sha1,
}

/// Compute the hex-encoded HMAC of `payload` under `secret`.
pub fn compute_hmac_hex(algorithm: SignatureAlgorithm, secret: &[u8], payload: &[u8]) -> String {
    match algorithm {
        SignatureAlgorithm::Sha256 => {
            // HMAC accepts keys of any length; new_from_slice cannot fail here
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts any key length");
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac =
                HmacSha1::new_from_slice(secret).expect("HMAC-SHA1 accepts any key length");
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
    }
}

/// Verify a presented hex-encoded HMAC signature over `payload`.
///
/// Returns `false` for undecodable hex, wrong digest length, or mismatching
/// digests; data-driven failures never panic.
pub fn verify_hmac(
    algorithm: SignatureAlgorithm,
    secret: &[u8],
    payload: &[u8],
    presented_hex: &str,
) -> bool {
    let presented = match hex::decode(presented_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let expected = match algorithm {
        SignatureAlgorithm::Sha256 => {
            let mut mac = match HmacSha256::new_from_slice(secret) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac = match HmacSha1::new_from_slice(secret) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    };
    expected.as_slice().ct_eq(presented.as_slice()).into()
}

/// Compare a presented token directly against the stored secret.
///
/// GitLab webhooks carry the shared secret itself, not an HMAC digest; the
/// token must never be hashed before comparison.
pub fn verify_secret_equality(secret: &str, presented: &str) -> bool {
    secret.as_bytes().ct_eq(presented.as_bytes()).into()
}
