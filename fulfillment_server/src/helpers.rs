use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The base64-encoded HMAC-SHA256 of `data` under `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::default(),
    };
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}

/// Checks a base64 webhook signature against `data`. The comparison runs in constant time.
pub fn verify_signature(secret: &str, data: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = base64::decode(signature.trim()) else {
        return false;
    };
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(data);
            mac.verify_slice(&expected).is_ok()
        },
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hmac_of_payload() {
        let hmac = calculate_hmac("secret", br#"{"order_number":"DT-1001"}"#);
        assert_eq!(hmac.len(), 44);
        assert_eq!(hmac, calculate_hmac("secret", br#"{"order_number":"DT-1001"}"#));
        assert_ne!(hmac, calculate_hmac("other", br#"{"order_number":"DT-1001"}"#));
    }

    #[test]
    fn known_vector() {
        let hmac = calculate_hmac("key", b"The quick brown fox jumps over the lazy dog");
        assert_eq!(hmac, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn signatures() {
        let body = br#"{"order_number":"DT-1001"}"#;
        let signature = calculate_hmac("secret", body);
        assert!(verify_signature("secret", body, &signature));
        assert!(verify_signature("secret", body, &format!(" {signature}\n")));
        assert!(!verify_signature("other", body, &signature));
        assert!(!verify_signature("secret", br#"{"order_number":"DT-1002"}"#, &signature));
        assert!(!verify_signature("secret", body, "not base64!"));
        assert!(!verify_signature("", body, &calculate_hmac("", body)));
    }
}
