use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    domain::IdentityProfile,
    error::{AppError, Result},
};

/// Cookie the identity provider's frontend SDK stores its session JWT in.
pub const SESSION_COOKIE: &str = "__session";

/// Claims we read from identity provider tokens. Anything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl IdentityClaims {
    pub fn display_name(&self) -> Option<String> {
        if let Some(username) = self.username.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(username.trim().to_string());
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!full.is_empty()).then_some(full)
    }

    pub fn into_profile(self) -> Result<IdentityProfile> {
        let display_name = self.display_name();
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Identity token carries no email address".to_string()))?;

        Ok(IdentityProfile {
            external_id: self.sub,
            email,
            display_name,
        })
    }
}

/// Verifies identity provider JWTs.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// `None` when no verification key is configured; every request is then anonymous.
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>> {
        let (key, algorithm) = if let Some(pem) = config.token_public_key_pem.as_deref() {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AppError::Internal(format!("Invalid token public key: {}", e)))?;
            (key, Algorithm::RS256)
        } else if let Some(secret) = config.token_secret.as_deref() {
            (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
        } else {
            return Ok(None);
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.token_leeway_secs;
        if let Some(issuer) = config.token_issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }

        Ok(Some(Self { key, validation }))
    }

    pub fn hs256(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims> {
        decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected identity token: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        jar.get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: Option<&'a str>,
        username: Option<&'a str>,
        exp: i64,
    }

    fn mint(secret: &str, email: Option<&str>, exp: i64) -> String {
        encode(
            &Header::default(),
            &TestClaims { sub: "user_123", email, username: Some("ada"), exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let verifier = TokenVerifier::hs256("secret");
        let claims = verifier.verify(&mint("secret", Some("ada@campus.edu"), future())).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email.as_deref(), Some("ada@campus.edu"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret_and_expired() {
        let verifier = TokenVerifier::hs256("secret");
        assert!(matches!(
            verifier.verify(&mint("other", Some("a@b.c"), future())),
            Err(AppError::Unauthorized(_))
        ));
        let expired = chrono::Utc::now().timestamp() - 3600;
        assert!(verifier.verify(&mint("secret", Some("a@b.c"), expired)).is_err());
    }

    #[test]
    fn test_profile_requires_email() {
        let claims = IdentityClaims {
            sub: "user_1".to_string(),
            email: None,
            username: None,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
        };
        assert_eq!(claims.display_name().as_deref(), Some("Ada Lovelace"));
        assert!(matches!(claims.into_profile(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_no_key_configured_means_no_verifier() {
        let config = AuthConfig {
            token_secret: None,
            token_public_key_pem: None,
            token_issuer: None,
            token_leeway_secs: 0,
            allowed_domains: Vec::new(),
        };
        assert!(TokenVerifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "cookie-token"));

        assert_eq!(extract_token(&headers, &jar).as_deref(), Some("header-token"));
        assert_eq!(extract_token(&HeaderMap::new(), &jar).as_deref(), Some("cookie-token"));
        assert_eq!(extract_token(&HeaderMap::new(), &CookieJar::new()), None);
    }
}
