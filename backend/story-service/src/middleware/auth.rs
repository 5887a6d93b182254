//! Session identity and the authentication guard.
//!
//! The auth service signs an HS256 token whose `sub` is the user id. It
//! arrives in the session cookie or as a Bearer header. `SessionIdentity`
//! decodes it for every request; handlers that take a [`UserId`] are guarded
//! and send anonymous callers back to `/`.

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Where the guard sends anonymous callers.
pub const LOGIN_REDIRECT: &str = "/";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// HS256 keys for session tokens.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `user_id` valid for `ttl_secs`.
    pub fn issue(&self, user_id: Uuid, ttl_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: Utc::now().timestamp() + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Validate `token` and return the user id it names.
    pub fn verify(&self, token: &str) -> Result<Uuid, String> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| format!("invalid token: {e}"))?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| "invalid token: malformed user id".to_string())
    }
}

/// Authenticated user id stored in request extensions.
///
/// As an extractor this is the guard: without a session it fails with a
/// redirect to [`LOGIN_REDIRECT`]. Use `Option<UserId>` for pages that only
/// want to know who is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match req.extensions().get::<UserId>() {
            Some(user_id) => Ok(*user_id),
            None => {
                tracing::debug!(path = %req.path(), "anonymous request to guarded route");
                let redirect = HttpResponse::Found()
                    .insert_header((header::LOCATION, LOGIN_REDIRECT))
                    .finish();
                Err(InternalError::from_response("authentication required", redirect).into())
            }
        })
    }
}

/// Middleware that resolves the session token into a [`UserId`].
#[derive(Clone)]
pub struct SessionIdentity {
    keys: Arc<JwtKeys>,
    cookie_name: Arc<str>,
}

impl SessionIdentity {
    pub fn new(keys: Arc<JwtKeys>, cookie_name: &str) -> Self {
        Self {
            keys,
            cookie_name: Arc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionIdentityService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionIdentityService {
            service: Rc::new(service),
            keys: self.keys.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionIdentityService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
    cookie_name: Arc<str>,
}

impl<S> SessionIdentityService<S> {
    fn token(&self, req: &ServiceRequest) -> Option<String> {
        if let Some(cookie) = req.cookie(&self.cookie_name) {
            return Some(cookie.value().to_string());
        }

        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string)
    }
}

impl<S, B> Service<ServiceRequest> for SessionIdentityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(token) = self.token(&req) {
            match self.keys.verify(&token) {
                Ok(user_id) => {
                    req.extensions_mut().insert(UserId(user_id));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring session token");
                }
            }
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let keys = JwtKeys::from_secret(b"test-secret");
        let user = Uuid::new_v4();
        let token = keys.issue(user, 60).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let issuer = JwtKeys::from_secret(b"one");
        let verifier = JwtKeys::from_secret(b"two");
        let token = issuer.issue(Uuid::new_v4(), 60).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = JwtKeys::from_secret(b"test-secret");
        // Past the default 60s leeway.
        let token = keys.issue(Uuid::new_v4(), -600).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
