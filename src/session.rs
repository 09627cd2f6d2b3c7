/**
 * Admin Session Guard
 * Shared-secret login, signed session cookie, and the `RequireAdmin` extractor
 */
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::AdminSecret;
use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "admin_session";

/// Session lifetime in days (token expiry and cookie max-age)
const SESSION_EXPIRY_DAYS: i64 = 7;

/// Claims carried by the session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub nonce: String,
}

struct Inner {
    secret: AdminSecret,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    secure_cookie: bool,
}

#[derive(Clone)]
pub struct SessionGuard {
    inner: Arc<Inner>,
}

impl SessionGuard {
    pub fn new(secret: AdminSecret, signing_secret: &str, secure_cookie: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                secret,
                encoding_key: EncodingKey::from_secret(signing_secret.as_bytes()),
                decoding_key: DecodingKey::from_secret(signing_secret.as_bytes()),
                secure_cookie,
            }),
        }
    }

    /// True only for the configured admin secret. bcrypt mode is CPU-bound;
    /// call it from a blocking task.
    pub fn verify_password(&self, candidate: &str) -> bool {
        match &self.inner.secret {
            AdminSecret::Plain(expected) => candidate.as_bytes().ct_eq(expected.as_bytes()).into(),
            AdminSecret::Bcrypt(hash) => bcrypt::verify(candidate, hash).unwrap_or_else(|e| {
                tracing::error!("Stored admin password hash is invalid: {}", e);
                false
            }),
        }
    }

    pub fn create_session(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: "admin".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(SESSION_EXPIRY_DAYS)).timestamp(),
            nonce: Alphanumeric.sample_string(&mut rand::rng(), 16),
        };

        encode(&Header::default(), &claims, &self.inner.encoding_key)
    }

    /// Signature and expiry are checked on every call.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let data = decode::<SessionClaims>(token, &self.inner.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }

    pub fn is_authenticated(&self, jar: &CookieJar) -> bool {
        jar.get(SESSION_COOKIE)
            .map(|cookie| self.verify_session(cookie.value()).is_ok())
            .unwrap_or(false)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.inner.secure_cookie)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(SESSION_EXPIRY_DAYS))
            .build()
    }

    /// Always emits an expired `admin_session` cookie, whether or not the
    /// request carried one.
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        let mut removal = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.inner.secure_cookie)
            .same_site(SameSite::Lax)
            .build();
        removal.make_removal();
        jar.add(removal)
    }
}

/// Extractor for admin-only handlers. Rejects with 401 unless the request
/// carries a valid session cookie.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if state.session.is_authenticated(&jar) {
            Ok(RequireAdmin)
        } else {
            Err(ApiError::Unauthorized("Unauthorized"))
        }
    }
}
