//! Route gate for the logged-in area.
//!
//! The decision itself is a pure function of the request path and the
//! caller's claims. Claims come from a [`SessionVerifier`]; in production
//! that is the engine's session table.

use std::future::Future;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{TypedHeader, headers::Cookie};
use engine::{Claims, Engine};

use crate::{SESSION_COOKIE, server::ServerState};

/// First path segments the gate never looks at.
const EXCLUDED_SEGMENTS: [&str; 4] = ["_next", "api", "static", "fonts"];
/// Pages only meaningful for anonymous visitors.
const GUEST_PAGES: [&str; 3] = ["/login", "/register", "/forgot"];

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/auth/dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(&'static str),
}

/// Resolves a session token into claims.
///
/// `None` means "not logged in", whatever the reason.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> impl Future<Output = Option<Claims>> + Send;
}

impl SessionVerifier for Engine {
    fn verify(&self, token: &str) -> impl Future<Output = Option<Claims>> + Send {
        async move {
            match self.verify_session(token).await {
                Ok(claims) => claims,
                Err(err) => {
                    tracing::warn!("session verification failed: {err}");
                    None
                }
            }
        }
    }
}

/// Whether the gate applies to `path`: everything except framework assets,
/// the content API, static files and any path containing a dot.
pub fn is_gated_path(path: &str) -> bool {
    if path.contains('.') {
        return false;
    }
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    !EXCLUDED_SEGMENTS.contains(&first)
}

fn is_protected(path: &str) -> bool {
    path == "/auth" || path.starts_with("/auth/")
}

fn is_guest_page(path: &str) -> bool {
    GUEST_PAGES
        .iter()
        .any(|page| path == *page || path.strip_prefix(page) == Some("/"))
}

pub fn gate(path: &str, claims: Option<&Claims>) -> GateDecision {
    match claims {
        None if is_protected(path) => GateDecision::Redirect(LOGIN_PATH),
        Some(_) if is_guest_page(path) => GateDecision::Redirect(DASHBOARD_PATH),
        _ => GateDecision::Pass,
    }
}

pub(crate) async fn resolve_claims<V: SessionVerifier>(
    verifier: &V,
    cookies: Option<&Cookie>,
) -> Option<Claims> {
    let token = cookies?.get(SESSION_COOKIE)?;
    verifier.verify(token).await
}

/// Middleware running the gate on every request. Verified claims are
/// attached to the request extensions for the handlers behind it.
pub(crate) async fn gate_layer(
    cookies: Option<TypedHeader<Cookie>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_gated_path(&path) {
        return next.run(request).await;
    }

    let claims = resolve_claims(
        state.engine.as_ref(),
        cookies.as_ref().map(|TypedHeader(cookie)| cookie),
    )
    .await;
    let decision = gate(&path, claims.as_ref());
    tracing::debug!(
        "gate {path}: {decision:?} (logged in: {})",
        claims.is_some()
    );

    match decision {
        GateDecision::Redirect(target) => Redirect::to(target).into_response(),
        GateDecision::Pass => {
            if let Some(claims) = claims {
                request.extensions_mut().insert(claims);
            }
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use axum_extra::headers::Header;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn claims() -> Claims {
        Claims {
            user_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            expires_at: Utc::now(),
        }
    }

    struct FixedVerifier(Option<Claims>);

    impl SessionVerifier for FixedVerifier {
        fn verify(&self, _token: &str) -> impl Future<Output = Option<Claims>> + Send {
            let claims = self.0.clone();
            async move { claims }
        }
    }

    #[test]
    fn anonymous_visitors_are_sent_to_login() {
        assert_eq!(gate("/auth/dashboard", None), GateDecision::Redirect("/login"));
        assert_eq!(gate("/auth", None), GateDecision::Redirect("/login"));
        assert_eq!(gate("/login", None), GateDecision::Pass);
        assert_eq!(gate("/", None), GateDecision::Pass);
        assert_eq!(gate("/authors", None), GateDecision::Pass);
    }

    #[test]
    fn logged_in_users_skip_guest_pages() {
        let claims = claims();
        for page in ["/login", "/register", "/forgot", "/login/"] {
            assert_eq!(
                gate(page, Some(&claims)),
                GateDecision::Redirect("/auth/dashboard")
            );
        }
        assert_eq!(gate("/auth/dashboard", Some(&claims)), GateDecision::Pass);
        assert_eq!(gate("/courses", Some(&claims)), GateDecision::Pass);
    }

    #[test]
    fn matcher_skips_assets_and_api() {
        assert!(!is_gated_path("/_next/static/chunk"));
        assert!(!is_gated_path("/api/blogs"));
        assert!(!is_gated_path("/static/logo"));
        assert!(!is_gated_path("/fonts/inter"));
        assert!(!is_gated_path("/favicon.ico"));
        assert!(!is_gated_path("/auth/report.csv"));
        assert!(is_gated_path("/auth/dashboard"));
        assert!(is_gated_path("/apiary"));
        assert!(is_gated_path("/"));
    }

    #[tokio::test]
    async fn claims_come_from_the_session_cookie() {
        let expected = claims();
        let verifier = FixedVerifier(Some(expected.clone()));

        assert_eq!(resolve_claims(&verifier, None).await, None);

        let cookie = Cookie::decode(&mut std::iter::once(
            &axum::http::HeaderValue::from_static("theme=dark"),
        ))
        .unwrap();
        assert_eq!(resolve_claims(&verifier, Some(&cookie)).await, None);

        let cookie = Cookie::decode(&mut std::iter::once(
            &axum::http::HeaderValue::from_static("theme=dark; session=abc"),
        ))
        .unwrap();
        assert_eq!(resolve_claims(&verifier, Some(&cookie)).await, Some(expected));

        let rejecting = FixedVerifier(None);
        assert_eq!(resolve_claims(&rejecting, Some(&cookie)).await, None);
    }
}
