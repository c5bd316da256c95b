use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature header malformed")]
    Malformed,
    #[error("signature mismatch")]
    Mismatch,
    #[error("request timestamp outside the accepted window")]
    StaleTimestamp,
}

pub fn hmac_sha256(secret: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts any key length"),
    };
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

pub fn hmac_sha1(secret: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts any key length"),
    };
    mac.update(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Compares a configured shared secret with the value a caller presented.
pub fn verify_shared_secret(expected: &str, provided: Option<&str>) -> Result<(), SignatureError> {
    let provided = provided.ok_or(SignatureError::Missing)?;
    if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Accepts `timestamp` only when it lies within `tolerance` of `now`, in either direction.
pub fn verify_timestamp_tolerance(
    timestamp: OffsetDateTime,
    now: OffsetDateTime,
    tolerance: Duration,
) -> Result<(), SignatureError> {
    if (now - timestamp).abs() <= tolerance {
        Ok(())
    } else {
        Err(SignatureError::StaleTimestamp)
    }
}
