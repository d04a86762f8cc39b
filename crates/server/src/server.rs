use axum::{
    Extension, Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use engine::{Claims, Engine};
use mailer::Mailer;

use std::sync::Arc;

use crate::{auth, budgets, categories, content, dashboard, gate, ledger};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub mailer: Arc<Mailer>,
    /// Base URL used in links sent by email (e.g. `https://ledgerly.app`).
    pub public_url: String,
}

impl ServerState {
    pub fn new(engine: Engine, mailer: Mailer, public_url: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            mailer: Arc::new(mailer),
            public_url: public_url.into(),
        }
    }
}

/// Rejects requests that did not present a valid session cookie.
async fn require_session(
    claims: Option<Extension<Claims>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if claims.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let private = Router::new()
        .route("/ledger/{kind}", get(ledger::list).post(ledger::create))
        .route(
            "/ledger/{kind}/{id}",
            get(ledger::get).put(ledger::update).delete(ledger::delete),
        )
        .route(
            "/categories/{kind}",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{kind}/{id}",
            axum::routing::patch(categories::update).delete(categories::delete),
        )
        .route("/budgets", get(budgets::list))
        .route("/budgets/verify", get(budgets::verify))
        .route("/auth/dashboard", get(dashboard::dashboard))
        .route("/auth/{kind}/export", get(dashboard::export))
        .route_layer(middleware::from_fn(require_session));

    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/verify", get(auth::verify))
        .route("/api/blogs", get(content::blogs))
        .route("/api/home-blogs", get(content::home_blogs))
        .route("/api/blog-detail", get(content::blog_detail))
        .route("/api/courses", get(content::courses))
        .route("/api/home-courses", get(content::home_courses))
        .route("/api/course-detail", get(content::course_detail))
        .route("/api/lessons-by-course", get(content::lessons_by_course));

    private
        .merge(public)
        .layer(middleware::from_fn_with_state(state.clone(), gate::gate_layer))
        .with_state(state)
}

pub async fn run(state: ServerState, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
