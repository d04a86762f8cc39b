use chrono::Utc;
use sea_orm::{ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use crate::{
    Category, EngineError, LedgerKind, Money, ResultEngine,
    kind::{with_categories, with_entries},
    util::{normalize_category_display, normalize_category_key},
};

use super::{
    Engine,
    budgets::{delete_budget, insert_budget},
    with_tx,
};

fn validate_budget_limit(kind: LedgerKind, limit: Option<Money>) -> ResultEngine<()> {
    let Some(limit) = limit else {
        return Ok(());
    };
    if !kind.tracks_budget() {
        return Err(EngineError::Validation(format!(
            "budget limits apply to expense categories only, not {kind}"
        )));
    }
    if limit.is_negative() {
        return Err(EngineError::Validation(
            "budget limit must be >= 0".to_string(),
        ));
    }
    if limit > Money::MAX_INPUT {
        return Err(EngineError::Validation(format!(
            "budget limit must be <= {}",
            Money::MAX_INPUT
        )));
    }
    Ok(())
}

impl Engine {
    /// Fetches a category of `kind`, failing with `KeyNotFound` if it does not exist.
    pub(super) async fn require_category<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: LedgerKind,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        with_categories!(kind, table => table::find(db, category_id).await?)
            .ok_or_else(|| EngineError::KeyNotFound(format!("{kind} category {category_id}")))
    }

    /// Lists the categories of `kind`, ordered by name.
    pub async fn list_categories(&self, kind: LedgerKind) -> ResultEngine<Vec<Category>> {
        with_categories!(kind, table => table::list(&self.database).await)
    }

    pub async fn category(&self, kind: LedgerKind, category_id: Uuid) -> ResultEngine<Category> {
        self.require_category(&self.database, kind, category_id)
            .await
    }

    /// Registers a new category. Expense categories start with an empty budget.
    pub async fn create_category(
        &self,
        kind: LedgerKind,
        name: &str,
        budget_limit: Option<Money>,
    ) -> ResultEngine<Category> {
        let display = normalize_category_display(name)?;
        let key = normalize_category_key(&display);
        validate_budget_limit(kind, budget_limit)?;

        with_tx!(self, |db_tx| {
            let existing = with_categories!(kind, table => table::find_by_key(&db_tx, &key).await?);
            if existing.is_some() {
                return Err(EngineError::ExistingKey(format!("{kind} category '{display}'")));
            }

            let category = Category {
                id: Uuid::new_v4(),
                kind,
                name: display,
                budget_limit,
                created_at: Utc::now(),
            };
            with_categories!(kind, table => table::insert(&db_tx, &category).await?);
            if kind.tracks_budget() {
                insert_budget(&db_tx, category.id).await?;
            }

            tracing::info!(
                "created category '{}' in {}",
                category.name,
                kind.categories_table()
            );
            Ok(category)
        })
    }

    /// Renames a category and/or changes its budget limit.
    ///
    /// `budget_limit` is a patch: `None` leaves the limit untouched,
    /// `Some(None)` clears it.
    pub async fn update_category(
        &self,
        kind: LedgerKind,
        category_id: Uuid,
        name: Option<&str>,
        budget_limit: Option<Option<Money>>,
    ) -> ResultEngine<Category> {
        let display = name.map(normalize_category_display).transpose()?;
        if let Some(limit) = budget_limit {
            validate_budget_limit(kind, limit)?;
        }

        with_tx!(self, |db_tx| {
            let mut category = self.require_category(&db_tx, kind, category_id).await?;

            if let Some(display) = display {
                let key = normalize_category_key(&display);
                let clash =
                    with_categories!(kind, table => table::find_by_key(&db_tx, &key).await?);
                if clash.is_some_and(|other| other.id != category_id) {
                    return Err(EngineError::ExistingKey(format!(
                        "{kind} category '{display}'"
                    )));
                }
                category.name = display;
            }
            if let Some(limit) = budget_limit {
                category.budget_limit = limit;
            }

            with_categories!(kind, table => table::update(&db_tx, &category).await?);
            Ok(category)
        })
    }

    /// Deletes a category that no entry references anymore.
    pub async fn delete_category(&self, kind: LedgerKind, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, kind, category_id).await?;

            let in_use =
                with_entries!(kind, table => table::count_for_category(&db_tx, category_id).await?);
            if in_use > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "{kind} category {category_id} is referenced by {in_use} entries"
                )));
            }

            if kind.tracks_budget() {
                delete_budget(&db_tx, category_id).await?;
            }
            with_categories!(kind, table => table::delete(&db_tx, category_id).await?);

            tracing::info!("deleted category {category_id} from {}", kind.categories_table());
            Ok(())
        })
    }
}
