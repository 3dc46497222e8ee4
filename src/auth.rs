use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, TokenSource},
    error::AppError,
    models::ObjectId,
};

/// Name of the cookie carrying the token when `TokenSource::Cookie` is active.
pub const TOKEN_COOKIE: &str = "jwt";

/// Claims
///
/// Payload signed into every token. Nothing about the token is stored server-side;
/// `exp` alone bounds its lifetime.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's `ObjectId` as a string.
    pub sub: String,
    /// Issued At, seconds since the epoch.
    pub iat: u64,
    /// Expiration Time, seconds since the epoch.
    pub exp: u64,
}

/// TokenService
///
/// Mints and checks HS256 tokens with the process-wide secret. Cheap to clone; the
/// keys are derived once when the state is built.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs a token for `user_id` that expires `ttl` from now.
    pub fn issue(&self, user_id: &ObjectId) -> Result<String, AppError> {
        let iat = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl.as_secs()),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Server(format!("token signing failed: {e}")))
    }

    /// Returns the user id embedded in a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<ObjectId, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!(reason = ?other, "rejected invalid token"),
            }
            AppError::unauthorized()
        })?;

        ObjectId::parse(&data.claims.sub).map_err(|_| AppError::unauthorized())
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers take it as an argument;
/// if the token is absent or invalid, the request is rejected with 401 before the
/// handler body or the store is ever touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: ObjectId,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by `auth_middleware` on this request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);
        let tokens = TokenService::from_ref(state);

        let token = match config.token_source {
            TokenSource::Bearer => bearer_token(&parts.headers),
            TokenSource::Cookie => cookie_token(&parts.headers),
        }
        .ok_or_else(AppError::unauthorized)?;

        let id = tokens.verify(&token)?;
        Ok(AuthUser { id })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

/// auth_middleware
///
/// Route layer for the protected router. Extracting `AuthUser` performs the whole
/// check; on success the identity is stashed in the request extensions so handlers
/// reuse it instead of verifying the token a second time.
pub async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// Builds the HttpOnly, SameSite=Strict cookie handed out at signin in cookie mode.
pub fn token_cookie(token: &str, ttl: Duration) -> Result<Cookie<'static>, AppError> {
    Cookie::parse(format!(
        "{TOKEN_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        ttl.as_secs()
    ))
    .map_err(|e| AppError::Server(format!("token cookie could not be built: {e}")))
}

/// A cookie that, when removed from a jar, clears the token on the client.
pub fn cleared_token_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, "")).path("/").build()
}
