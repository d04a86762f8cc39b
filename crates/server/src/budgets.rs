//! Budget API endpoints

use api_types::budget::{BudgetDriftView, BudgetVerifyResponse, BudgetView, BudgetsResponse};
use axum::{Json, extract::State};
use engine::Money;

use crate::{ServerError, server::ServerState};

pub(crate) fn map_budget(budget: engine::BudgetOverview) -> Result<BudgetView, ServerError> {
    Ok(BudgetView {
        remaining_minor: budget.remaining()?.map(Money::minor),
        over_limit: budget.over_limit(),
        category_id: budget.category_id,
        category: budget.category,
        limit_minor: budget.limit.map(Money::minor),
        current_minor: budget.current_amount.minor(),
    })
}

fn map_drift(drift: engine::BudgetDrift) -> BudgetDriftView {
    BudgetDriftView {
        consistent: drift.is_consistent(),
        category_id: drift.category_id,
        category: drift.category,
        stored_minor: drift.stored.map(Money::minor),
        expected_minor: drift.expected.minor(),
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<BudgetsResponse>, ServerError> {
    let budgets = state
        .engine
        .budgets()
        .await?
        .into_iter()
        .map(map_budget)
        .collect::<Result<_, _>>()?;
    Ok(Json(BudgetsResponse { budgets }))
}

/// Compares stored budgets with the ledger without modifying anything.
pub async fn verify(
    State(state): State<ServerState>,
) -> Result<Json<BudgetVerifyResponse>, ServerError> {
    let budgets = state
        .engine
        .verify_budgets()
        .await?
        .into_iter()
        .map(map_drift)
        .collect();
    Ok(Json(BudgetVerifyResponse { budgets }))
}
