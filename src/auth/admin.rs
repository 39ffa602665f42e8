// Admin session backend
//
// Admins log in with the same credentials as the API, but the resulting JWT
// lives in an `admin_token` cookie instead of a bearer header. Every request
// re-validates the token and re-checks the admin role.

use chrono::Duration;

use super::{AuthError, Authenticator};
use crate::store::{UserRecord, UserRole, UserStore};

pub const ADMIN_COOKIE: &str = "admin_token";
pub const ADMIN_TOKEN_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct AdminAuth {
    authenticator: Authenticator,
}

impl AdminAuth {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }

    /// Check credentials and issue a session token for an admin account.
    pub async fn login<S: UserStore>(
        &self,
        store: &S,
        username: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let user = self
            .authenticator
            .authenticate_user(store, username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.role != UserRole::Admin {
            tracing::warn!(username, "non-admin attempted admin login");
            return Err(AuthError::Forbidden);
        }

        let token = self
            .authenticator
            .create_access_token(&user.username, Some(Duration::days(ADMIN_TOKEN_DAYS)))?;
        tracing::info!(username, "admin logged in");
        Ok(token)
    }

    /// Resolve the session token to an admin user.
    pub async fn authenticate<S: UserStore>(
        &self,
        store: &S,
        token: Option<&str>,
    ) -> Result<UserRecord, AuthError> {
        let token = token.ok_or(AuthError::InvalidToken(None))?;
        let user = self.authenticator.current_active_user(store, token).await?;
        if user.role != UserRole::Admin {
            return Err(AuthError::Forbidden);
        }
        Ok(user)
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/admin; HttpOnly; SameSite=Lax; Max-Age={}",
            ADMIN_COOKIE,
            token,
            Duration::days(ADMIN_TOKEN_DAYS).num_seconds()
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/admin; HttpOnly; SameSite=Lax; Max-Age=0", ADMIN_COOKIE)
    }
}

/// Pull the admin token out of a raw `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ADMIN_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
