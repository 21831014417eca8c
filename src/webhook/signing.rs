//! Webhook body signatures.
//!
//! Receivers recompute HMAC-SHA256 over the raw request body with the shared
//! secret and compare against the hex value of [`SIGNATURE_HEADER`].

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Errorly-Secret";

/// Hex HMAC-SHA256 of `body` keyed by `secret`; `None` without a secret.
#[must_use]
pub fn sign(body: &[u8], secret: &str) -> Option<String> {
    if secret.is_empty() {
        return None;
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check a received signature in constant time.
#[must_use]
pub fn verify(body: &[u8], secret: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
