use async_trait::async_trait;
use axum::http::HeaderMap;
use url::Url;

pub const CERT_CHAIN_URL_HEADER: &str = "signaturecertchainurl";
pub const SIGNATURE_HEADER: &str = "signature-256";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("alexa request verification failed: {0}")]
pub struct VerificationError(pub String);

/// Checks the authenticity of a request before it is parsed.
#[async_trait]
pub trait RequestVerifier: Send + Sync {
    async fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), VerificationError>;
}

/// Trusts every request. Suitable behind a gateway that already verified the signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl RequestVerifier for AcceptAll {
    async fn verify(&self, _headers: &HeaderMap, _body: &[u8]) -> Result<(), VerificationError> {
        Ok(())
    }
}

/// Requires the signature headers and a certificate chain URL on Amazon's signing bucket.
///
/// The certificate itself is not fetched; pair it with a verifier that does when running without
/// a trusted gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertChainUrlVerifier;

#[async_trait]
impl RequestVerifier for CertChainUrlVerifier {
    async fn verify(&self, headers: &HeaderMap, _body: &[u8]) -> Result<(), VerificationError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
        };
        if header(SIGNATURE_HEADER).is_none() {
            return Err(VerificationError("signature header missing".into()));
        }
        let url = header(CERT_CHAIN_URL_HEADER)
            .ok_or_else(|| VerificationError("certificate chain url missing".into()))?;
        validate_cert_chain_url(url)
    }
}

/// Accepts only `https://s3.amazonaws.com[:443]/echo.api/...` certificate URLs.
///
/// ```
/// use bb_provider_alexa::validate_cert_chain_url;
///
/// assert!(validate_cert_chain_url("https://s3.amazonaws.com/echo.api/echo-api-cert.pem").is_ok());
/// assert!(validate_cert_chain_url("https://s3.amazonaws.com/EcHo.aPi/echo-api-cert.pem").is_err());
/// assert!(validate_cert_chain_url("http://s3.amazonaws.com/echo.api/cert.pem").is_err());
/// ```
pub fn validate_cert_chain_url(raw: &str) -> Result<(), VerificationError> {
    let url = Url::parse(raw).map_err(|err| VerificationError(format!("bad cert url: {err}")))?;
    if url.scheme() != "https" {
        return Err(VerificationError("cert url must use https".into()));
    }
    if !url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case("s3.amazonaws.com"))
    {
        return Err(VerificationError("cert url host not allowed".into()));
    }
    if url.port_or_known_default() != Some(443) {
        return Err(VerificationError("cert url port not allowed".into()));
    }
    // path is normalized by the parser, so `/echo.api/../x` cannot slip through
    if !url.path().starts_with("/echo.api/") {
        return Err(VerificationError("cert url path not allowed".into()));
    }
    Ok(())
}
