// Bearer-token session extraction for incoming requests
use crate::application::device_repository::Session;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::CookieJar;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use std::convert::Infallible;

const TOKEN_COOKIE: &str = "token";

/// Token from `Authorization: Bearer ...`, falling back to the `token` cookie
pub fn session_token(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: &CookieJar,
) -> Option<String> {
    bearer
        .map(|TypedHeader(auth)| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            jar.get(TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|token| !token.is_empty())
        })
}

/// Extractor wrapping the caller's [`Session`]; never rejects, the backend decides
pub struct RequestSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequestSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A malformed or non-bearer Authorization header reads as absent
        let bearer =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state).await?;
        let jar = CookieJar::from_request_parts(parts, state).await?;
        Ok(RequestSession(Session::new(session_token(bearer, &jar))))
    }
}
