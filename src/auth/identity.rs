use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api_error::ApiError;
use crate::models::Match;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Token validation failed: {0}")]
    TokenValidation(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
            _ => IdentityError::TokenValidation(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Player,
}

/// Bearer token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub player_id: Option<String>,
    pub exp: i64,
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
    pub competitor_id: Option<String>,
}

impl Identity {
    pub fn admin(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Admin,
            competitor_id: None,
        }
    }

    pub fn player(subject: impl Into<String>, competitor_id: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: Role::Player,
            competitor_id: Some(competitor_id.into()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Admins score any match; players only matches they occupy a slot in.
    pub fn can_score(&self, m: &Match) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Player => self
                .competitor_id
                .as_deref()
                .map(|id| m.involves(id))
                .unwrap_or(false),
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
            competitor_id: claims.player_id.filter(|id| !id.is_empty()),
        }
    }
}

/// HS256 token verification against a shared secret.
#[derive(Clone)]
pub struct IdentityVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.into())
    }

    /// Sign a token for `identity`, valid for `ttl`.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, IdentityError> {
        let claims = Claims {
            sub: identity.subject.clone(),
            role: identity.role,
            player_id: identity.competitor_id.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::TokenGeneration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Phase};

    #[test]
    fn test_issue_and_verify_round_trip() {
        let verifier = IdentityVerifier::new("test_secret");
        let identity = Identity::player("user-7", "p_7");
        let token = verifier.issue(&identity, Duration::minutes(5)).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), identity);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = IdentityVerifier::new("one")
            .issue(&Identity::admin("root"), Duration::minutes(5))
            .unwrap();
        let err = IdentityVerifier::new("two").verify(&token).unwrap_err();
        assert!(matches!(err, IdentityError::TokenValidation(_)));
    }

    #[test]
    fn test_expired_token() {
        let verifier = IdentityVerifier::new("test_secret");
        let token = verifier.issue(&Identity::admin("root"), Duration::hours(-2)).unwrap();
        assert!(matches!(verifier.verify(&token), Err(IdentityError::TokenExpired)));
    }

    #[test]
    fn test_players_score_only_their_matches() {
        let m = Match::scheduled("mg_1", Category::A, Phase::Group, "p_1", "p_2");
        assert!(Identity::player("u1", "p_1").can_score(&m));
        assert!(!Identity::player("u3", "p_3").can_score(&m));
        assert!(Identity::admin("root").can_score(&m));

        let placeholder = Match::scheduled("me_1", Category::A, Phase::Elimination, "", "");
        let anonymous = Identity {
            subject: "u4".to_string(),
            role: Role::Player,
            competitor_id: Some(String::new()),
        };
        assert!(!anonymous.can_score(&placeholder));
    }

    #[test]
    fn test_require_admin() {
        assert!(Identity::admin("root").require_admin().is_ok());
        assert!(matches!(
            Identity::player("u1", "p_1").require_admin(),
            Err(ApiError::Forbidden)
        ));
    }
}
