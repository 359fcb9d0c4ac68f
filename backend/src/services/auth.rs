//! Authentication service for login and token management

use bcrypt::verify;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::{AppError, AppResult, Entity};
use shared::models::User;
use shared::types::Role;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for login
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Response after successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_model(self) -> AppResult<User> {
        let role = Role::from_str(&self.role)
            .ok_or_else(|| anyhow::anyhow!("unknown role in users table: {}", self.role))?;
        Ok(User {
            id: self.id,
            username: self.username,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate user with username and password
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, is_active, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(&input.username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !row.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let hash = row.password_hash.as_deref().ok_or(AppError::InvalidCredentials)?;
        let valid = verify(&input.password, hash)
            .map_err(|e| anyhow::anyhow!("password verification failed: {}", e))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let user = row.into_model()?;
        let access_token = self.generate_token(&user)?;

        tracing::info!(user_id = user.id, "user logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user,
        })
    }

    /// Fetch the current user by id
    pub async fn me(&self, user_id: i64) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound {
            entity: Entity::User,
            id: user_id,
        })?;

        row.into_model()
    }

    /// Generate a signed access token
    fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow::anyhow!("token generation failed: {}", e))?;

        Ok(token)
    }
}
