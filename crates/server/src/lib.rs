use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use mailer::MailError;

use api_types::ErrorBody;
pub use gate::{GateDecision, SessionVerifier, gate, is_gated_path};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod auth;
mod budgets;
mod categories;
mod content;
mod dashboard;
mod gate;
mod ledger;
mod server;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

pub mod types {
    pub mod ledger {
        pub use api_types::ledger::{
            EntryListQuery, EntryListResponse, EntryNew, EntryView, LedgerKind, LedgerTotal,
        };
    }

    pub mod category {
        pub use api_types::category::{CategoriesResponse, CategoryNew, CategoryUpdate, CategoryView};
    }

    pub mod budget {
        pub use api_types::budget::{
            BudgetDriftView, BudgetVerifyResponse, BudgetView, BudgetsResponse, DashboardResponse,
        };
    }

    pub mod auth {
        pub use api_types::auth::{Credentials, Registered, SessionView, VerifyQuery};
    }

    pub mod content {
        pub use api_types::content::{BlogView, ContentQuery, CourseView, LessonView};
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Mail(MailError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Export(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Export(msg) => {
            tracing::error!("export error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Mail(err) => {
                tracing::error!("{err}");
                (StatusCode::BAD_GATEWAY, "failed to send email".to_string())
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<MailError> for ServerError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_unauthorized_maps_to_401() {
        let res =
            ServerError::from(EngineError::Unauthorized("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn database_errors_are_hidden() {
        let err = EngineError::Database(DbErr::Custom("disk on fire".to_string()));
        assert_eq!(message_for_engine_error(err), "internal server error");
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
