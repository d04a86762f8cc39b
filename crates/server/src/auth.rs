//! Account endpoints: registration, email verification, login and logout.

use api_types::auth::{Credentials, Registered, SessionView, VerifyQuery};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::{TypedHeader, headers::Cookie};
use chrono::Utc;

use crate::{SESSION_COOKIE, ServerError, server::ServerState};

fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderValue, ServerError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .map_err(|_| ServerError::Generic("invalid session token".to_string()))
}

/// Creates an account and mails the verification link. When the mail
/// cannot be sent the account is discarded again.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<Registered>), ServerError> {
    let registration = state
        .engine
        .register(&payload.email, &payload.password)
        .await?;

    let link = format!(
        "{}/verify?token={}",
        state.public_url.trim_end_matches('/'),
        registration.verification_token
    );
    let email = mailer::verification_email(&registration.user.email, &link);
    if let Err(err) = state.mailer.send_verification_email(&email).await {
        tracing::warn!(
            "verification email to {} failed: {err}",
            registration.user.email
        );
        state
            .engine
            .discard_registration(registration.user.id)
            .await?;
        return Err(err.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            id: registration.user.id,
            email: registration.user.email,
        }),
    ))
}

pub async fn verify(
    State(state): State<ServerState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<Registered>, ServerError> {
    let user = state.engine.verify_email(&query.token).await?;
    tracing::info!("verified email of {}", user.email);
    Ok(Json(Registered {
        id: user.id,
        email: user.email,
    }))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ServerError> {
    let session = state
        .engine
        .login(&payload.email, &payload.password)
        .await?;

    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&session.token, max_age)?);

    Ok((
        headers,
        Json(SessionView {
            token: session.token,
            expires_at: session.expires_at,
        }),
    ))
}

/// Ends the current session, if any, and clears the cookie.
pub async fn logout(
    State(state): State<ServerState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<impl IntoResponse, ServerError> {
    if let Some(token) = cookies
        .as_ref()
        .and_then(|TypedHeader(cookie)| cookie.get(SESSION_COOKIE))
    {
        state.engine.logout(token).await?;
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie("", 0)?);
    Ok((StatusCode::NO_CONTENT, headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let value = session_cookie("abc", 60).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
    }
}
