//! Pages of the logged-in area.

use api_types::{
    budget::DashboardResponse,
    ledger::{EntryListQuery, LedgerKind as ApiKind, LedgerTotal},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use engine::Claims;

use crate::{
    ServerError,
    budgets::map_budget,
    ledger::{api_kind, engine_kind, map_filter},
    server::ServerState,
};

/// Budgets overview plus the total of every ledger.
pub async fn dashboard(
    Extension(claims): Extension<Claims>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardResponse>, ServerError> {
    let budgets = state
        .engine
        .budgets()
        .await?
        .into_iter()
        .map(map_budget)
        .collect::<Result<_, _>>()?;
    let totals = state
        .engine
        .ledger_totals()
        .await?
        .into_iter()
        .map(|(kind, total)| LedgerTotal {
            kind: api_kind(kind),
            total_minor: total.minor(),
        })
        .collect();

    Ok(Json(DashboardResponse {
        email: claims.email,
        budgets,
        totals,
    }))
}

/// CSV download of a ledger, honoring the list filters.
pub async fn export(
    State(state): State<ServerState>,
    Path(kind): Path<ApiKind>,
    Query(query): Query<EntryListQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let kind = engine_kind(kind);
    let csv = state
        .engine
        .export_entries(kind, &map_filter(&query))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", kind.entries_table()),
            ),
        ],
        csv,
    ))
}
