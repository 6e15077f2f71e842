use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::SharedIdentity;

/// The signed-in user for the current request.
///
/// Handlers that need an identity take this as an argument; there is no
/// ambient "current user".
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Bearer token from the `Authorization` header, or from the
/// `access_token` query parameter (browsers cannot set headers on a
/// WebSocket upgrade).
fn access_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.access_token)
            .filter(|token| !token.is_empty())
    })
}

impl<S> FromRequestParts<S> for Session
where
    SharedIdentity: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = access_token(parts).ok_or(AppError::Unauthorized)?;
        let identity = SharedIdentity::from_ref(state);

        let Some(user) = identity.user(&token).await? else {
            tracing::debug!("access token not recognised");
            return Err(AppError::Unauthorized);
        };

        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token: token,
        })
    }
}

impl<S> OptionalFromRequestParts<S> for Session
where
    SharedIdentity: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Session as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(session) => Ok(Some(session)),
            Err(AppError::Unauthorized) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_from_header() {
        assert_eq!(access_token(&parts("/", Some("Bearer abc"))), Some("abc".to_string()));
    }

    #[test]
    fn test_token_from_query() {
        assert_eq!(
            access_token(&parts("/ws?access_token=xyz", None)),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn test_missing_or_malformed_token() {
        assert_eq!(access_token(&parts("/", None)), None);
        assert_eq!(access_token(&parts("/", Some("Basic abc"))), None);
        assert_eq!(access_token(&parts("/?access_token=", None)), None);
    }
}
