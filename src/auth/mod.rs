// Authentication
//
// Passwords are stored as bcrypt hashes. Access tokens are HS256 JWTs whose
// `sub` claim is the username; they are verified on every request and the
// user is re-loaded from the store so disabled accounts stop working at once.

pub mod admin;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{StoreError, UserRecord, UserRole, UserStore};

pub use admin::AdminAuth;

/// Lifetime used when a caller does not ask for a specific one
pub const DEFAULT_TOKEN_MINUTES: i64 = 15;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    InvalidToken(#[source] Option<jsonwebtoken::errors::Error>),

    #[error("Inactive user")]
    Inactive,

    #[error("Permission denied")]
    Forbidden,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Input for account creation; `password` is plain text here only
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(skip, default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

/// Token issuing and verification, plus credential checks against a store
#[derive(Clone)]
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_token_ttl: Duration,
    bcrypt_cost: u32,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(secret: &str, access_token_minutes: i64, bcrypt_cost: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl: Duration::minutes(access_token_minutes),
            bcrypt_cost,
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// bcrypt is CPU bound, so hashing runs on the blocking pool.
    pub async fn hash_password(&self, plain: &str) -> Result<String, AuthError> {
        let plain = plain.to_string();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
        Ok(hashed)
    }

    /// Malformed hashes count as a mismatch.
    pub async fn verify_password(plain: &str, hashed: &str) -> Result<bool, AuthError> {
        let plain = plain.to_string();
        let hashed = hashed.to_string();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed).unwrap_or(false))
                .await?;
        Ok(matches)
    }

    pub fn create_access_token(
        &self,
        subject: &str,
        expires_in: Option<Duration>,
    ) -> Result<String, AuthError> {
        let ttl = expires_in.unwrap_or_else(|| Duration::minutes(DEFAULT_TOKEN_MINUTES));
        let claims = Claims {
            sub: subject.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Encode)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| AuthError::InvalidToken(Some(e)))?;
        Ok(data.claims)
    }

    /// `Ok(None)` for unknown user or wrong password.
    pub async fn authenticate_user<S: UserStore>(
        &self,
        store: &S,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        let Some(user) = store.get_user_by_username(username).await? else {
            return Ok(None);
        };
        if !Self::verify_password(password, &user.password).await? {
            tracing::debug!(username, "password mismatch");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Hash the password and persist the account.
    pub async fn register_user<S: UserStore>(
        &self,
        store: &S,
        new_user: NewUser,
    ) -> Result<UserRecord, AuthError> {
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: new_user.username,
            full_name: new_user.full_name,
            email: new_user.email.filter(|e| !e.is_empty()),
            password: self.hash_password(&new_user.password).await?,
            disabled: false,
            role: new_user.role,
        };
        Ok(store.insert_user(record).await?)
    }

    /// Resolve a bearer token to its user.
    pub async fn current_user<S: UserStore>(
        &self,
        store: &S,
        token: &str,
    ) -> Result<UserRecord, AuthError> {
        let claims = self.decode_token(token)?;
        store
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken(None))
    }

    /// Like [`Self::current_user`], rejecting disabled accounts.
    pub async fn current_active_user<S: UserStore>(
        &self,
        store: &S,
        token: &str,
    ) -> Result<UserRecord, AuthError> {
        let user = self.current_user(store, token).await?;
        if user.disabled {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }
}
