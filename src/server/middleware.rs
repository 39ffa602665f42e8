// Request extractors for authentication
//
// `CurrentUser` reads `Authorization: Bearer <jwt>`; `AdminSession` reads the
// `admin_token` cookie. Both re-load the user from the store on every request.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::{ServerError, SharedState};
use crate::auth::admin::token_from_cookie_header;
use crate::store::UserRecord;

/// Authenticated, active API user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

#[async_trait]
impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ServerError::Unauthorized("Not authenticated".to_string()))?;
        let user = state.auth.current_active_user(&state.store, token).await?;
        Ok(CurrentUser(user))
    }
}

/// Logged-in admin (cookie session)
#[derive(Debug, Clone)]
pub struct AdminSession(pub UserRecord);

#[async_trait]
impl FromRequestParts<SharedState> for AdminSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        let user = state.admin.authenticate(&state.store, token).await?;
        Ok(AdminSession(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_session_token_from_any_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("lang=en; admin_token=tok123"));
        assert_eq!(session_token(&headers), Some("tok123"));
    }
}
