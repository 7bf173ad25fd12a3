/*!
 * # Authentication
 *
 * Admin accounts log in with a username and password and receive a signed
 * HS256 bearer token. Every route except login, health and status sits
 * behind [`auth_middleware`], which validates the token and stores the
 * [`AuthUser`] in the request extensions.
 */

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dto::auth::TokenResponse;
use crate::entities::admin_user;
use crate::errors::ServiceError;

pub mod password;

pub use password::{hash_password, verify_password};

/// Claims carried in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin username
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller extracted from a validated token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub token_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            token_id: claims.jti,
        }
    }
}

/// Token signing configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingToken,

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountDisabled,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::Service(ServiceError::DatabaseError(err))
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidCredentials => ServiceError::Unauthorized(err.to_string()),
            AuthError::AccountDisabled => ServiceError::Forbidden(err.to_string()),
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            AuthError::Service(inner) => inner,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Issues and validates tokens and checks admin credentials
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Signs an access token for `username`.
    pub fn issue_token(&self, username: &str) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as usize,
        })
    }

    /// Decodes `token`, checking signature, expiry, issuer and audience.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Checks credentials against `admin_users` and records the login time.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<admin_user::Model, AuthError> {
        let user = admin_user::Entity::find()
            .filter(admin_user::Column::Username.eq(username))
            .one(&*self.db)
            .await?;

        let Some(user) = user else {
            counter!("powerloom.auth.login_failure", 1);
            warn!("login attempt for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            counter!("powerloom.auth.login_failure", 1);
            warn!("login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            counter!("powerloom.auth.login_failure", 1);
            return Err(AuthError::AccountDisabled);
        }

        let now = Utc::now();
        let mut active: admin_user::ActiveModel = user.into();
        active.last_login = Set(Some(now));
        active.updated_at = Set(now);
        let user = active.update(&*self.db).await?;

        counter!("powerloom.auth.login_success", 1);
        info!("admin logged in");
        Ok(user)
    }

    /// Authenticates and issues a token in one step.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let user = self.authenticate(username, password).await?;
        self.issue_token(&user.username)
    }
}

/// Validates the bearer token and stores the caller in request extensions.
///
/// Expects an `Arc<AuthService>` extension injected by an outer layer.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(auth_service) = request.extensions().get::<Arc<AuthService>>().cloned() else {
        return ServiceError::InternalError("Authentication service not available".into())
            .into_response();
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            debug!(username = %user.username, "request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    auth_service.validate_token(token).map(AuthUser::from)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SECRET: &str = "k7Qp2vXz9LmN4rTy8WbE3hJd6FgS1cVa0uIoPqRs5tYwZxCvBnMlKjHgFdSaQwEr";

    fn service() -> AuthService {
        let cfg = AuthConfig::new(
            SECRET.into(),
            "powerloom-auth".into(),
            "powerloom-api".into(),
            Duration::from_secs(3600),
        );
        AuthService::new(cfg, Arc::new(DatabaseConnection::Disconnected))
    }

    #[test]
    fn issued_token_validates() {
        let svc = service();
        let token = svc.issue_token("admin").unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 3600);

        let claims = svc.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.aud, "powerloom-api");
    }

    #[test]
    fn token_for_other_audience_is_rejected() {
        let svc = service();
        let mut other = service();
        other.config.jwt_audience = "someone-else".into();
        let token = other.issue_token("admin").unwrap();
        assert_matches!(
            svc.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "admin".into(),
            jti: "t".into(),
            iat: now - 7200,
            exp: now - 3600,
            nbf: now - 7200,
            iss: "powerloom-auth".into(),
            aud: "powerloom-api".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_matches!(svc.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn header_parsing() {
        let svc = service();
        let mut headers = HeaderMap::new();
        assert_matches!(
            extract_auth_from_headers(&headers, &svc),
            Err(AuthError::MissingToken)
        );

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_matches!(
            extract_auth_from_headers(&headers, &svc),
            Err(AuthError::MissingToken)
        );

        let token = svc.issue_token("admin").unwrap().access_token;
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        let user = extract_auth_from_headers(&headers, &svc).unwrap();
        assert_eq!(user.username, "admin");
    }

    #[test]
    fn auth_errors_map_to_service_errors() {
        assert_eq!(ServiceError::from(AuthError::InvalidCredentials).code(), "UNAUTHORIZED");
        assert_eq!(ServiceError::from(AuthError::AccountDisabled).code(), "FORBIDDEN");
        assert_eq!(ServiceError::from(AuthError::TokenExpired).code(), "UNAUTHORIZED");
    }
}
