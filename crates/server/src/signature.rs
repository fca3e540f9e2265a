//! Inbound webhook signature checks.
//!
//! The provider signs `url + key1 + value1 + key2 + value2 ...` (parameters
//! sorted by key) with HMAC-SHA1 keyed by the account secret and sends the
//! base64 digest in `X-Twilio-Signature`.

use axum::http::{header, HeaderMap, Uri};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use concierge_core::config::WebhookConfig;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

type HmacSha1 = Hmac<Sha1>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureOutcome {
    NotConfigured,
    Valid,
    Missing,
    Mismatch,
}

impl SignatureOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Valid => "valid",
            Self::Missing => "missing",
            Self::Mismatch => "mismatch",
        }
    }
}

pub fn verify_signature(
    secret: Option<&SecretString>,
    url: &str,
    params: &[(String, String)],
    provided: Option<&str>,
) -> SignatureOutcome {
    let Some(secret) = secret.map(|value| value.expose_secret()).filter(|value| !value.is_empty())
    else {
        return SignatureOutcome::NotConfigured;
    };
    let Some(provided) = provided.map(str::trim).filter(|value| !value.is_empty()) else {
        return SignatureOutcome::Missing;
    };
    let Ok(provided) = STANDARD.decode(provided) else {
        return SignatureOutcome::Mismatch;
    };
    let Some(mac) = signing_mac(secret, url, params) else {
        return SignatureOutcome::Mismatch;
    };

    match mac.verify_slice(&provided) {
        Ok(()) => SignatureOutcome::Valid,
        Err(_) => SignatureOutcome::Mismatch,
    }
}

/// Base64 signature for the given URL and form parameters.
#[cfg(test)]
pub(crate) fn compute_signature(
    secret: &str,
    url: &str,
    params: &[(String, String)],
) -> Option<String> {
    signing_mac(secret, url, params).map(|mac| STANDARD.encode(mac.finalize().into_bytes()))
}

fn signing_mac(secret: &str, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Some(mac)
}

/// The URL the provider signed: the configured public base plus the request
/// path and query, or a reconstruction from forwarding headers.
pub fn signed_url(config: &WebhookConfig, headers: &HeaderMap, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map(|value| value.as_str()).unwrap_or("/");

    if let Some(base) = config.public_base_url.as_deref() {
        return format!("{}{path_and_query}", base.trim_end_matches('/'));
    }

    let proto = header_value(headers, "x-forwarded-proto")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("https");
    let host = header_value(headers, "x-forwarded-host")
        .or_else(|| header_value(headers, header::HOST.as_str()))
        .unwrap_or("localhost");

    format!("{proto}://{host}{path_and_query}")
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
}
