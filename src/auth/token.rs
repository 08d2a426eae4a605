//! Stateless signed session tokens.
//!
//! A token embeds the full credential claim, so resolving the caller behind a
//! bearer token is purely cryptographic and never touches the store. The
//! tradeoff is the absence of immediate revocation: a token stays valid until
//! its expiry elapses.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::CredentialClaim;
use crate::error::{AppError, TokenError};

/// Bearer credential handed to clients: the signed compact string plus the
/// fixed scheme tag.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Wire payload. `user` stays a raw JSON value through signature validation
/// so a verified-but-undecodable claim maps to `MalformedClaim` rather than
/// `InvalidToken`.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    user: serde_json::Value,
}

/// Builds and parses signed session tokens.
///
/// Holds the process-wide signing secret and algorithm, read once from
/// configuration and immutable afterwards; safe to share across concurrent
/// requests without locking.
pub struct TokenCodec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Only shared-secret (HMAC) algorithms are accepted; anything else in
    /// the configuration is a startup error.
    pub fn new(secret: &str, algorithm: &str) -> Result<Self, AppError> {
        let algorithm: Algorithm = algorithm
            .parse()
            .map_err(|_| AppError::Config(format!("unknown JWT algorithm: {}", algorithm)))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AppError::Config(format!(
                "JWT algorithm {:?} does not use a shared secret",
                algorithm
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;

        Ok(Self {
            header: Header::new(algorithm),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign a token carrying `claim`, valid from now until now + `ttl_seconds`.
    pub fn issue(
        &self,
        claim: &CredentialClaim,
        ttl_seconds: i64,
    ) -> Result<AccessToken, TokenError> {
        let now = Utc::now().timestamp();
        let payload = TokenPayload {
            sub: claim.id.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
            user: serde_json::to_value(claim).map_err(|e| TokenError::Signing(e.to_string()))?,
        };

        let token = encode(&self.header, &payload, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(AccessToken::new(token))
    }

    /// Verify signature and expiry, then decode the embedded claim.
    ///
    /// `InvalidToken`: bad signature, malformed wire form, or elapsed expiry.
    /// `MalformedClaim`: signature verified but the claim is missing/mistyped.
    pub fn parse(&self, token: &str) -> Result<CredentialClaim, TokenError> {
        let data =
            decode::<TokenPayload>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    // Deserialization runs after signature verification, so a
                    // JSON error means the signature was good.
                    ErrorKind::Json(_) => TokenError::MalformedClaim,
                    _ => TokenError::InvalidToken,
                }
            })?;

        // A token is invalid from its expiry second onward; ttl <= 0 means
        // expired on arrival even within the second it was minted.
        let payload = data.claims;
        if payload.exp <= Utc::now().timestamp() {
            return Err(TokenError::InvalidToken);
        }

        serde_json::from_value(payload.user).map_err(|_| TokenError::MalformedClaim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn test_codec() -> TokenCodec {
        TokenCodec::new(SECRET, "HS256").expect("codec construction should succeed")
    }

    fn test_claim() -> CredentialClaim {
        CredentialClaim {
            id: 42,
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn test_issue_and_parse_roundtrip() {
        let codec = test_codec();
        let claim = test_claim();

        let token = codec.issue(&claim, 3600).expect("issue should succeed");
        assert_eq!(token.token_type, "bearer");
        // Compact serialization: header.payload.signature.
        assert_eq!(token.access_token.split('.').count(), 3);

        let parsed = codec.parse(&token.access_token).expect("parse should succeed");
        assert_eq!(parsed, claim);
    }

    #[test]
    fn test_zero_ttl_is_expired_on_arrival() {
        let codec = test_codec();
        let token = codec.issue(&test_claim(), 0).unwrap();
        assert_eq!(codec.parse(&token.access_token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_negative_ttl_is_expired_on_arrival() {
        let codec = test_codec();
        let token = codec.issue(&test_claim(), -60).unwrap();
        assert_eq!(codec.parse(&token.access_token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let codec = test_codec();
        let token = codec.issue(&test_claim(), 3600).unwrap().access_token;

        let (rest, signature) = token.rsplit_once('.').unwrap();
        let mid = signature.len() / 2;
        let original = signature.as_bytes()[mid] as char;
        let replacement = if original == 'x' { 'y' } else { 'x' };
        let mut tampered_sig = String::with_capacity(signature.len());
        tampered_sig.push_str(&signature[..mid]);
        tampered_sig.push(replacement);
        tampered_sig.push_str(&signature[mid + 1..]);
        let tampered = format!("{}.{}", rest, tampered_sig);
        assert_ne!(tampered, token);

        assert_eq!(codec.parse(&tampered), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let codec = test_codec();
        let other = TokenCodec::new("a-completely-different-secret", "HS256").unwrap();

        let token = other.issue(&test_claim(), 3600).unwrap();
        assert_eq!(codec.parse(&token.access_token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_garbage_token_fails() {
        let codec = test_codec();
        assert_eq!(codec.parse("not-a-token"), Err(TokenError::InvalidToken));
        assert_eq!(codec.parse("still.not.atoken"), Err(TokenError::InvalidToken));
        assert_eq!(codec.parse(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_verified_but_undecodable_claim_is_malformed() {
        // Same secret and shape, but `user` carries a string instead of the
        // claim object: signature verifies, claim decode must fail.
        #[derive(Serialize)]
        struct BadPayload {
            sub: String,
            iat: i64,
            nbf: i64,
            exp: i64,
            user: String,
        }

        let now = Utc::now().timestamp();
        let bad = BadPayload {
            sub: "42".to_string(),
            iat: now,
            nbf: now,
            exp: now + 3600,
            user: "not-an-object".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &bad,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(test_codec().parse(&token), Err(TokenError::MalformedClaim));
    }

    #[test]
    fn test_claim_with_missing_fields_is_malformed() {
        #[derive(Serialize)]
        struct PartialUserPayload {
            sub: String,
            iat: i64,
            nbf: i64,
            exp: i64,
            user: serde_json::Value,
        }

        let now = Utc::now().timestamp();
        let bad = PartialUserPayload {
            sub: "42".to_string(),
            iat: now,
            nbf: now,
            exp: now + 3600,
            user: serde_json::json!({"id": 42}),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &bad,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(test_codec().parse(&token), Err(TokenError::MalformedClaim));
    }

    #[test]
    fn test_expired_token_fails() {
        let now = Utc::now().timestamp();
        let payload = TokenPayload {
            sub: "42".to_string(),
            iat: now - 600,
            nbf: now - 600,
            exp: now - 300,
            user: serde_json::to_value(test_claim()).unwrap(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(test_codec().parse(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_asymmetric_algorithm_rejected_at_construction() {
        let result = TokenCodec::new(SECRET, "RS256");
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = TokenCodec::new(SECRET, "definitely-not-an-algorithm");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
