//! Client-side token inspection. The payload is decoded only to read the
//! `exp` claim; signature verification stays the backend's job.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExpClaim {
    exp: i64,
}

/// Unix timestamp of the `exp` claim, or `None` for anything that does not
/// decode as a JWT payload.
pub fn decoded_exp(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload) = (parts.next()?, parts.next()?);
    parts.next()?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claim: ExpClaim = serde_json::from_slice(&bytes).ok()?;
    Some(claim.exp)
}

/// Malformed tokens count as expired: both lead to the same cleanup.
pub fn is_expired(token: &str, now_unix: i64) -> bool {
    match decoded_exp(token) {
        Some(exp) => exp <= now_unix,
        None => true,
    }
}

#[cfg(test)]
pub(crate) fn make_unsigned_token(exp: i64) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"alice","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_exp_from_a_well_formed_token() {
        let token = make_unsigned_token(1_900_000_000);
        assert_eq!(decoded_exp(&token), Some(1_900_000_000));
    }

    #[test]
    fn future_exp_is_not_expired() {
        let token = make_unsigned_token(2_000);
        assert!(!is_expired(&token, 1_000));
    }

    #[test]
    fn past_exp_is_expired() {
        let token = make_unsigned_token(1_000);
        assert!(is_expired(&token, 2_000));
        // Boundary: exactly now counts as expired.
        assert!(is_expired(&token, 1_000));
    }

    #[test]
    fn malformed_tokens_are_expired() {
        assert!(is_expired("", 0));
        assert!(is_expired("not-a-jwt", 0));
        assert!(is_expired("a.b", 0));
        assert!(is_expired("a.%%%.c", 0));
    }
}
