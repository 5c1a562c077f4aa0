//! Signed webhook URLs for DingTalk and Feishu robots.
//!
//! Both sign `"<timestamp>\n<secret>"` with HMAC-SHA256 keyed by the secret and
//! append `timestamp` and the base64 signature as query parameters. DingTalk
//! uses milliseconds, Feishu seconds.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

use crate::config::WebhookKind;
use crate::error::{NotifierError, Result};

type HmacSha256 = Hmac<Sha256>;

pub fn signature(secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
        NotifierError::WebhookMisconfigured {
            kind: "signing".to_string(),
            reason: e.to_string(),
        }
    })?;
    mac.update(format!("{}\n{}", timestamp, secret).as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Appends `timestamp` and the url-encoded `sign` to `url`.
pub fn signed_url(kind: &WebhookKind, url: &str, secret: &str, timestamp: i64) -> Result<String> {
    let mut parsed = Url::parse(url).map_err(|e| NotifierError::WebhookMisconfigured {
        kind: kind.to_string(),
        reason: format!("invalid url: {}", e),
    })?;
    let sign = signature(secret, timestamp)?;
    parsed
        .query_pairs_mut()
        .append_pair("timestamp", &timestamp.to_string())
        .append_pair("sign", &sign);
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_base64() {
        let a = signature("SEC123", 1_700_000_000_000).unwrap();
        let b = signature("SEC123", 1_700_000_000_000).unwrap();
        assert_eq!(a, b);
        // 32-byte digest encodes to 44 base64 characters.
        assert_eq!(a.len(), 44);
        assert_ne!(a, signature("SEC123", 1_700_000_000_001).unwrap());
        assert_ne!(a, signature("OTHER", 1_700_000_000_000).unwrap());
    }

    #[test]
    fn signed_url_appends_to_existing_query() {
        let url = signed_url(
            &WebhookKind::DingTalk,
            "https://oapi.dingtalk.com/robot/send?access_token=abc",
            "SEC123",
            1_700_000_000_000,
        )
        .unwrap();

        assert!(url.starts_with(
            "https://oapi.dingtalk.com/robot/send?access_token=abc&timestamp=1700000000000&sign="
        ));
        let sign = url.rsplit("sign=").next().unwrap();
        assert!(!sign.contains('+'));
        assert!(!sign.contains('/'));
    }

    #[test]
    fn signed_url_without_query_starts_one() {
        let url = signed_url(
            &WebhookKind::Feishu,
            "https://open.feishu.cn/open-apis/bot/v2/hook/xyz",
            "s",
            1_700_000_000,
        )
        .unwrap();
        assert!(url.contains("/hook/xyz?timestamp=1700000000&sign="));
    }

    #[test]
    fn invalid_url_is_misconfiguration() {
        assert!(matches!(
            signed_url(&WebhookKind::DingTalk, "not a url", "s", 0),
            Err(NotifierError::WebhookMisconfigured { .. })
        ));
    }
}
