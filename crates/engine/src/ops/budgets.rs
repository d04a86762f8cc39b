use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetDrift, BudgetOverview, EngineError, Money, ResultEngine, budgets,
    categories::category_expenses, entries::expenses,
};

use super::{Engine, with_tx};

/// Adds `delta` to the stored budget of `category_id` in a single
/// `UPDATE ... SET current = current + delta` statement, so concurrent
/// adjustments on the same category cannot lose updates.
///
/// The statement only matches rows where the sum stays inside `i64`; SQLite
/// would otherwise store the overflowed value as REAL.
pub(super) async fn apply_budget_delta<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
    delta: Money,
) -> ResultEngine<()> {
    let delta = delta.minor();
    let in_range = if delta >= 0 {
        budgets::Column::CurrentAmountMinor.lte(i64::MAX - delta)
    } else {
        budgets::Column::CurrentAmountMinor.gte(i64::MIN - delta)
    };

    let res = budgets::Entity::update_many()
        .col_expr(
            budgets::Column::CurrentAmountMinor,
            Expr::col(budgets::Column::CurrentAmountMinor).add(delta),
        )
        .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(budgets::Column::CategoryId.eq(category_id.to_string()))
        .filter(in_range)
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        let exists = budgets::Entity::find_by_id(category_id.to_string())
            .one(db)
            .await?
            .is_some();
        return Err(if exists {
            EngineError::Validation(format!(
                "budget for category {category_id} would overflow"
            ))
        } else {
            EngineError::KeyNotFound(format!("budget for category {category_id}"))
        });
    }
    Ok(())
}

/// Creates the zeroed budget row that accompanies a new expense category.
pub(super) async fn insert_budget<C: ConnectionTrait>(db: &C, category_id: Uuid) -> ResultEngine<()> {
    let model = budgets::ActiveModel {
        category_id: ActiveValue::Set(category_id.to_string()),
        current_amount_minor: ActiveValue::Set(0),
        updated_at: ActiveValue::Set(Utc::now()),
    };
    model.insert(db).await?;
    Ok(())
}

pub(super) async fn delete_budget<C: ConnectionTrait>(db: &C, category_id: Uuid) -> ResultEngine<()> {
    budgets::Entity::delete_by_id(category_id.to_string())
        .exec(db)
        .await?;
    Ok(())
}

async fn stored_budgets<C: ConnectionTrait>(db: &C) -> ResultEngine<HashMap<Uuid, Budget>> {
    budgets::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|model| Budget::try_from(model).map(|budget| (budget.category_id, budget)))
        .collect()
}

impl Engine {
    /// Applies a signed delta to the running budget of an expense category
    /// and returns the updated budget.
    pub async fn adjust_budget_current_amount(
        &self,
        category_id: Uuid,
        delta: Money,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            apply_budget_delta(&db_tx, category_id, delta).await?;
            let model = budgets::Entity::find_by_id(category_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("budget for category {category_id}"))
                })?;
            Budget::try_from(model)
        })
    }

    /// Returns the stored budget of one expense category.
    pub async fn budget(&self, category_id: Uuid) -> ResultEngine<Budget> {
        let model = budgets::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("budget for category {category_id}")))?;
        Budget::try_from(model)
    }

    /// Budget overview for every expense category, ordered by category name.
    pub async fn budgets(&self) -> ResultEngine<Vec<BudgetOverview>> {
        let categories = category_expenses::list(&self.database).await?;
        let stored = stored_budgets(&self.database).await?;

        Ok(categories
            .into_iter()
            .map(|category| BudgetOverview {
                current_amount: stored
                    .get(&category.id)
                    .map_or(Money::ZERO, |budget| budget.current_amount),
                category_id: category.id,
                category: category.name,
                limit: category.budget_limit,
            })
            .collect())
    }

    /// Compares every stored budget with the sum of its expenses.
    pub async fn verify_budgets(&self) -> ResultEngine<Vec<BudgetDrift>> {
        self.budget_drifts(&self.database).await
    }

    /// Rewrites every expense budget from the ledger. Returns the budgets
    /// that had drifted, with the value they held before the repair.
    pub async fn recompute_budgets(&self) -> ResultEngine<Vec<BudgetDrift>> {
        with_tx!(self, |db_tx| {
            let drifts = self.budget_drifts(&db_tx).await?;
            let mut repaired = Vec::new();

            for drift in drifts {
                if drift.is_consistent() {
                    continue;
                }
                tracing::warn!(
                    "budget drift on '{}': stored {:?}, expected {}",
                    drift.category,
                    drift.stored.map(|m| m.to_string()),
                    drift.expected
                );

                let model = budgets::ActiveModel {
                    category_id: ActiveValue::Set(drift.category_id.to_string()),
                    current_amount_minor: ActiveValue::Set(drift.expected.minor()),
                    updated_at: ActiveValue::Set(Utc::now()),
                };
                if drift.stored.is_some() {
                    model.update(&db_tx).await?;
                } else {
                    model.insert(&db_tx).await?;
                }
                repaired.push(drift);
            }

            Ok(repaired)
        })
    }

    async fn budget_drifts<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<Vec<BudgetDrift>> {
        let categories = category_expenses::list(db).await?;
        let stored = stored_budgets(db).await?;
        let expected: HashMap<Uuid, Money> = expenses::totals_by_category(db)
            .await?
            .into_iter()
            .collect();

        Ok(categories
            .into_iter()
            .map(|category| BudgetDrift {
                stored: stored.get(&category.id).map(|budget| budget.current_amount),
                expected: expected.get(&category.id).copied().unwrap_or(Money::ZERO),
                category_id: category.id,
                category: category.name,
            })
            .collect())
    }
}

