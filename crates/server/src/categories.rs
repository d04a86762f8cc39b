//! Categories API endpoints.

use api_types::{
    category::{CategoriesResponse, CategoryNew, CategoryUpdate, CategoryView},
    ledger::LedgerKind as ApiKind,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Money;
use uuid::Uuid;

use crate::{
    ServerError,
    ledger::{api_kind, engine_kind},
    server::ServerState,
};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        kind: api_kind(category.kind),
        name: category.name,
        budget_limit_minor: category.budget_limit.map(Money::minor),
        created_at: category.created_at,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Path(kind): Path<ApiKind>,
) -> Result<Json<CategoriesResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(engine_kind(kind))
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoriesResponse { categories }))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(kind): Path<ApiKind>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let limit = payload.budget_limit.map(Money::from_major).transpose()?;
    let category = state
        .engine
        .create_category(engine_kind(kind), &payload.name, limit)
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((kind, category_id)): Path<(ApiKind, Uuid)>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_none() && payload.budget_limit.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name or budget_limit".to_string(),
        ));
    }
    let limit = payload
        .budget_limit
        .map(|limit| limit.map(Money::from_major).transpose())
        .transpose()?;

    let category = state
        .engine
        .update_category(
            engine_kind(kind),
            category_id,
            payload.name.as_deref(),
            limit,
        )
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((kind, category_id)): Path<(ApiKind, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(engine_kind(kind), category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
