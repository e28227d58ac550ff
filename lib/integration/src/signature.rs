//! Request signing for the marketplace open API.
//!
//! Shop-level calls are signed with HMAC-SHA256 over
//! `path|access_token|shop_id|partner_id|timestamp`, hex encoded.

use crate::error::ChannelError;
use hmac::{Hmac, Mac};
use rootcause::prelude::Report;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Inputs of a shop-level request signature.
#[derive(Debug, Clone, Copy)]
pub struct SignatureInput<'a> {
    pub path: &'a str,
    pub access_token: &'a str,
    pub shop_id: u64,
    pub partner_id: u64,
    pub timestamp: i64,
}

impl SignatureInput<'_> {
    fn base_string(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.path, self.access_token, self.shop_id, self.partner_id, self.timestamp
        )
    }
}

/// Signs a request with the partner secret.
///
/// # Errors
///
/// Returns an error if the secret cannot be used as an HMAC key.
pub fn sign(secret: &[u8], input: &SignatureInput<'_>) -> Result<String, Report<ChannelError>> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| ChannelError::Signing {
        reason: e.to_string(),
    })?;
    mac.update(input.base_string().as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str) -> SignatureInput<'_> {
        SignatureInput {
            path,
            access_token: "token-abc",
            shop_id: 2233,
            partner_id: 1001,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn base_string_order() {
        assert_eq!(
            input("/api/v2/message/reply_message").base_string(),
            "/api/v2/message/reply_message|token-abc|2233|1001|1700000000"
        );
    }

    #[test]
    fn known_signatures() {
        assert_eq!(
            sign(b"segredo", &input("/api/v2/message/reply_message")).unwrap(),
            "14936b84cd1e5b79e08e195236c8ffd38ae31f2c19dcd91d611aa9ca27c1766b"
        );
        assert_eq!(
            sign(b"segredo", &input("/api/v2/message/mark_message_unread")).unwrap(),
            "dea3afb6485a2e477ddca52d0c1b64e13341145e57b86b4d71f5f1193c9587b7"
        );
    }

    #[test]
    fn signature_depends_on_secret() {
        let path = "/api/v2/message/reply_message";
        assert_ne!(
            sign(b"segredo", &input(path)).unwrap(),
            sign(b"outro", &input(path)).unwrap()
        );
    }
}
