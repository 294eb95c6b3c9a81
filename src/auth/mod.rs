//! Authentication and request-scoped authorization context.
//!
//! Login verifies an argon2 password hash against the active users table and
//! issues a JWT carrying the caller's identity, role, and unit. Handlers
//! receive that identity as a [`RequestContext`] extractor and pass it into
//! every service call; no session state exists anywhere.

pub mod roles;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::user::{self, Entity as UserEntity};
use crate::errors::ServiceError;
use crate::services::activity_log::{actions, ActivityEntry, ActivityLogService};
use crate::AppState;

pub use roles::{can_access, Role};

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        issuer: String,
        audience: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            issuer,
            audience,
            token_expiration,
        }
    }
}

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub unit_id: Option<i32>,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Request-scoped caller identity, populated once at the transport boundary
/// and passed explicitly into every service call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
    pub unit_id: Option<i32>,
    pub ip_address: Option<String>,
}

impl RequestContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::SystemAdmin
    }

    /// Fails with Forbidden unless the caller holds `required` (or is admin).
    pub fn require(&self, required: Role) -> Result<(), ServiceError> {
        if can_access(self.role, required) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role {} required",
                required.as_str()
            )))
        }
    }
}

/// Hashes a password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

/// Verifies a password against a stored argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issues and validates bearer tokens; owns the login flow.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub unit_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserInfo,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self {
            config,
            db,
            activity,
        }
    }

    /// Verifies the credentials and returns a bearer token.
    ///
    /// A failed attempt is logged with a null actor before the caller sees
    /// Unauthorized; the message never says which part was wrong.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: Option<String>,
    ) -> Result<TokenResponse, ServiceError> {
        let account = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;

        let verified = match &account {
            Some(account) => verify_password(password, &account.password_hash)?,
            None => false,
        };
        let Some(account) = account.filter(|_| verified) else {
            warn!(username, "rejected login attempt");
            self.activity
                .record(ActivityEntry {
                    user_id: None,
                    action: actions::FAILED_LOGIN,
                    table_name: None,
                    record_id: None,
                    details: Some(format!("username: {username}")),
                    ip_address,
                })
                .await;
            return Err(ServiceError::Unauthorized(
                "invalid username or password".to_string(),
            ));
        };

        let role = Role::from_str(&account.role).map_err(|_| {
            ServiceError::InternalError(format!("account {} has unknown role", account.id))
        })?;

        let token = self.issue_token(&account, role)?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(account.id),
                action: actions::LOGIN,
                table_name: None,
                record_id: None,
                details: Some(format!("role: {}", role.as_str())),
                ip_address,
            })
            .await;

        info!(user_id = account.id, role = role.as_str(), "login succeeded");

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs(),
            user: UserInfo {
                id: account.id,
                username: account.username,
                name: account.name,
                role,
                unit_id: account.unit_id,
            },
        })
    }

    fn issue_token(&self, account: &user::Model, role: Role) -> Result<String, ServiceError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: account.id.to_string(),
            name: account.name.clone(),
            role,
            unit_id: account.unit_id,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(self.config.token_expiration.as_secs() as i64))
                .timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::AuthError(e.to_string()))
    }

    /// Decodes and validates a bearer token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {e}")))
    }

    pub fn activity(&self) -> &ActivityLogService {
        &self.activity
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_service = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("auth service missing from request extensions".into())
            })?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;

        let claims = auth_service.validate_token(token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| ServiceError::Unauthorized("malformed subject claim".to_string()))?;

        Ok(RequestContext {
            user_id,
            name: claims.name,
            role: claims.role,
            unit_id: claims.unit_id,
            ip_address: client_ip(&parts.headers),
        })
    }
}

/// Routes under `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
}

/// Authenticate and receive a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<crate::ApiResponse<TokenResponse>>, ServiceError> {
    request.validate()?;
    let token = state
        .services
        .auth
        .login(&request.username, &request.password, client_ip(&headers))
        .await?;
    Ok(Json(crate::ApiResponse::success(token)))
}

/// Record a logout; tokens are stateless and expire on their own
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logout recorded")),
    security(("Bearer" = []))
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<crate::ApiResponse<()>>, ServiceError> {
    state
        .services
        .auth
        .activity()
        .record(ActivityEntry {
            user_id: Some(ctx.user_id),
            action: actions::LOGOUT,
            table_name: None,
            record_id: None,
            details: None,
            ip_address: ctx.ip_address.clone(),
        })
        .await;
    Ok(Json(crate::ApiResponse::success(())))
}

/// Echo the caller's resolved identity
#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Caller identity", body = UserInfo)),
    security(("Bearer" = []))
)]
pub async fn me_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<crate::ApiResponse<UserInfo>>, ServiceError> {
    let account = UserEntity::find_by_id(ctx.user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))?;

    Ok(Json(crate::ApiResponse::success(UserInfo {
        id: account.id,
        username: account.username,
        name: account.name,
        role: ctx.role,
        unit_id: account.unit_id,
    })))
}
