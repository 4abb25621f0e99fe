use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// # NDOC
/// component: `subsystems::ingestion::signature`
/// purpose: Verifies Meta's `X-Hub-Signature-256` header — HMAC-SHA256 of
///   the raw request body, keyed by the configured app secret. A pure,
///   directly testable function so the caller's HTTP layer never re-derives
///   the comparison logic.
/// invariants:
///   - Comparison happens against constant-time semantics from the `hmac`
///     crate's `verify_slice`, not a manual `==` on hex strings.
pub fn verify_meta_signature(app_secret: &str, raw_body: &[u8], header_value: &str) -> bool {
    let Some(hex_sig) = header_value.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected_bytes) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected_bytes).is_ok()
}
