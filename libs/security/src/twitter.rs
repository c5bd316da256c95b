use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::signature::{SignatureError, constant_time_eq, hmac_sha256};

/// Header carrying the Account Activity API payload signature.
pub const TWITTER_SIGNATURE_HEADER: &str = "x-twitter-webhooks-signature";

/// Answer to the Account Activity API challenge-response check.
///
/// ```
/// let token = bb_security::twitter_crc_response("secret", "challenge");
/// assert!(token.starts_with("sha256="));
/// ```
pub fn twitter_crc_response(consumer_secret: &str, crc_token: &str) -> String {
    let digest = hmac_sha256(consumer_secret.as_bytes(), crc_token.as_bytes());
    format!("sha256={}", B64.encode(digest))
}

/// Checks a `sha256=<base64>` payload signature computed with the consumer secret.
pub fn verify_twitter_signature(
    consumer_secret: &str,
    body: &[u8],
    provided: Option<&str>,
) -> Result<(), SignatureError> {
    let provided = provided.ok_or(SignatureError::Missing)?;
    let encoded = provided
        .strip_prefix("sha256=")
        .ok_or(SignatureError::Malformed)?;
    let provided = B64
        .decode(encoded)
        .map_err(|_| SignatureError::Malformed)?;
    let expected = hmac_sha256(consumer_secret.as_bytes(), body);
    if constant_time_eq(&expected, &provided) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
