use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use tracing::{debug, warn};

use super::identity::{Identity, IdentityVerifier};
use crate::api_error::ApiError;

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<Identity, ApiError> {
    let verifier = req.app_data::<web::Data<IdentityVerifier>>().ok_or_else(|| {
        warn!("Identity verifier is not registered");
        ApiError::InternalServerError
    })?;

    let Some(token) = bearer_token(req) else {
        warn!("Missing or malformed authorization header");
        return Err(ApiError::Unauthorized);
    };

    match verifier.verify(token) {
        Ok(identity) => {
            debug!(subject = %identity.subject, role = ?identity.role, "Request authenticated");
            Ok(identity)
        }
        Err(e) => {
            warn!(error = %e, "Token validation failed");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Handlers take an `Identity` argument to require a valid bearer token.
impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
