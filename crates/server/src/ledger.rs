//! Ledger API endpoints, shared by the three ledger kinds.

use api_types::ledger::{
    EntryListQuery, EntryListResponse, EntryNew, EntryView, LedgerKind as ApiKind,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

const DEFAULT_PAGE_SIZE: u64 = 50;

pub(crate) fn engine_kind(kind: ApiKind) -> engine::LedgerKind {
    match kind {
        ApiKind::Expense => engine::LedgerKind::Expense,
        ApiKind::Income => engine::LedgerKind::Income,
        ApiKind::Invest => engine::LedgerKind::Invest,
    }
}

pub(crate) fn api_kind(kind: engine::LedgerKind) -> ApiKind {
    match kind {
        engine::LedgerKind::Expense => ApiKind::Expense,
        engine::LedgerKind::Income => ApiKind::Income,
        engine::LedgerKind::Invest => ApiKind::Invest,
    }
}

fn map_entry(entry: engine::Entry) -> EntryView {
    EntryView {
        id: entry.id,
        kind: api_kind(entry.kind),
        date: entry.date,
        amount_minor: entry.amount.minor(),
        amount_display: entry.amount.to_string(),
        category_id: entry.category_id,
        note: entry.note,
        created_at: entry.created_at,
    }
}

fn map_input(payload: EntryNew) -> engine::EntryInput {
    engine::EntryInput {
        date: payload.date,
        amount: payload.amount,
        category_id: payload.category_id,
        note: payload.note,
    }
}

pub(crate) fn map_filter(query: &EntryListQuery) -> engine::EntryFilter {
    engine::EntryFilter {
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Path(kind): Path<ApiKind>,
    Query(query): Query<EntryListQuery>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let page = state
        .engine
        .list_entries(
            engine_kind(kind),
            &map_filter(&query),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.cursor.as_deref(),
        )
        .await?;

    Ok(Json(EntryListResponse {
        entries: page.entries.into_iter().map(map_entry).collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(ApiKind, Uuid)>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state.engine.entry(engine_kind(kind), id).await?;
    Ok(Json(map_entry(entry)))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(kind): Path<ApiKind>,
    Json(payload): Json<EntryNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let entry = state
        .engine
        .create_entry(engine_kind(kind), &map_input(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_entry(entry))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(ApiKind, Uuid)>,
    Json(payload): Json<EntryNew>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state
        .engine
        .update_entry(engine_kind(kind), id, &map_input(payload))
        .await?;
    Ok(Json(map_entry(entry)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((kind, id)): Path<(ApiKind, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_entry(engine_kind(kind), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
