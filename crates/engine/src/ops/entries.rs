use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    Entry, EngineError, EntryFilter, EntryInput, EntryPage, LedgerKind, Money, ResultEngine,
    entries::EntryCursor,
    kind::with_entries,
};

use super::{Engine, budgets::apply_budget_delta, with_tx};

pub(super) const MAX_PAGE_SIZE: u64 = 500;

/// Budget changes implied by replacing `before` with `after`.
///
/// `None` on one side means the entry is being created (`before`) or deleted
/// (`after`). A category change yields two adjustments: the old category loses
/// the old amount and the new one gains the new amount. Zero deltas are
/// dropped.
pub(crate) fn budget_deltas(before: Option<&Entry>, after: Option<&Entry>) -> Vec<(Uuid, Money)> {
    let deltas = match (before, after) {
        (None, None) => Vec::new(),
        (None, Some(new)) => vec![(new.category_id, new.amount)],
        (Some(old), None) => vec![(old.category_id, -old.amount)],
        (Some(old), Some(new)) if old.category_id == new.category_id => {
            vec![(new.category_id, new.amount - old.amount)]
        }
        (Some(old), Some(new)) => vec![(old.category_id, -old.amount), (new.category_id, new.amount)],
    };

    deltas
        .into_iter()
        .filter(|(_, delta)| *delta != Money::ZERO)
        .collect()
}

impl Engine {
    /// Lists entries of `kind`, newest first (`date DESC`, then id), with
    /// cursor-based pagination.
    ///
    /// Fails with `KeyNotFound` when the filter names a category that does not
    /// exist for this kind.
    pub async fn list_entries(
        &self,
        kind: LedgerKind,
        filter: &EntryFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<EntryPage> {
        filter.validate()?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let after = cursor.map(EntryCursor::decode).transpose()?;

        if let Some(category_id) = filter.category_id {
            self.require_category(&self.database, kind, category_id)
                .await?;
        }

        let mut entries = with_entries!(kind, table => {
            table::page(&self.database, filter, after.as_ref(), limit + 1).await?
        });

        let next_cursor = if entries.len() as u64 > limit {
            entries.truncate(limit as usize);
            entries
                .last()
                .map(|entry| EntryCursor::after(entry).encode())
                .transpose()?
        } else {
            None
        };

        Ok(EntryPage {
            entries,
            next_cursor,
        })
    }

    /// Returns a single entry.
    pub async fn entry(&self, kind: LedgerKind, id: Uuid) -> ResultEngine<Entry> {
        with_entries!(kind, table => table::find(&self.database, id).await?)
            .ok_or_else(|| EngineError::KeyNotFound(format!("{kind} {id}")))
    }

    /// Stores a new entry. Expenses also raise their category budget.
    pub async fn create_entry(&self, kind: LedgerKind, input: &EntryInput) -> ResultEngine<Entry> {
        let fields = input.validate()?;
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, kind, fields.category_id)
                .await?;

            let entry = Entry {
                id: Uuid::new_v4(),
                kind,
                date: fields.date,
                amount: fields.amount,
                category_id: fields.category_id,
                note: fields.note,
                created_at: Utc::now(),
            };
            with_entries!(kind, table => table::insert(&db_tx, &entry).await?);

            if kind.tracks_budget() {
                for (category_id, delta) in budget_deltas(None, Some(&entry)) {
                    apply_budget_delta(&db_tx, category_id, delta).await?;
                }
            }

            tracing::debug!(
                "created {kind} {} ({}) in {}",
                entry.id,
                entry.amount,
                kind.entries_table()
            );
            Ok(entry)
        })
    }

    /// Replaces every field of an existing entry.
    ///
    /// For expenses the budget adjustments and the row update share one
    /// database transaction, so the old and new category budgets can never be
    /// left half-updated.
    pub async fn update_entry(
        &self,
        kind: LedgerKind,
        id: Uuid,
        input: &EntryInput,
    ) -> ResultEngine<Entry> {
        let fields = input.validate()?;
        with_tx!(self, |db_tx| {
            let existing = with_entries!(kind, table => table::find(&db_tx, id).await?)
                .ok_or_else(|| EngineError::KeyNotFound(format!("{kind} {id}")))?;
            self.require_category(&db_tx, kind, fields.category_id)
                .await?;

            let updated = Entry {
                id,
                kind,
                date: fields.date,
                amount: fields.amount,
                category_id: fields.category_id,
                note: fields.note,
                created_at: existing.created_at,
            };
            with_entries!(kind, table => table::update(&db_tx, &updated).await?);

            if kind.tracks_budget() {
                for (category_id, delta) in budget_deltas(Some(&existing), Some(&updated)) {
                    apply_budget_delta(&db_tx, category_id, delta).await?;
                }
            }

            tracing::debug!("updated {kind} {id}");
            Ok(updated)
        })
    }

    /// Removes an entry and returns what was deleted. Expenses also lower
    /// their category budget.
    pub async fn delete_entry(&self, kind: LedgerKind, id: Uuid) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            let existing = with_entries!(kind, table => table::find(&db_tx, id).await?)
                .ok_or_else(|| EngineError::KeyNotFound(format!("{kind} {id}")))?;

            let removed = with_entries!(kind, table => table::delete(&db_tx, id).await?);
            if removed == 0 {
                return Err(EngineError::KeyNotFound(format!("{kind} {id}")));
            }

            if kind.tracks_budget() {
                for (category_id, delta) in budget_deltas(Some(&existing), None) {
                    apply_budget_delta(&db_tx, category_id, delta).await?;
                }
            }

            tracing::debug!("deleted {kind} {id}");
            Ok(existing)
        })
    }

    /// Sum of all entries, per ledger kind.
    pub async fn ledger_totals(&self) -> ResultEngine<Vec<(LedgerKind, Money)>> {
        let mut totals = Vec::with_capacity(LedgerKind::ALL.len());
        for kind in LedgerKind::ALL {
            let per_category = with_entries!(kind, table => {
                table::totals_by_category(&self.database).await?
            });
            let total = per_category
                .into_iter()
                .try_fold(Money::ZERO, |acc, (_, amount)| acc.checked_add(amount))
                .ok_or_else(|| EngineError::Validation(format!("{kind} total is out of range")))?;
            totals.push((kind, total));
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry(category_id: Uuid, amount: i64) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            kind: LedgerKind::Expense,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            amount: Money::new(amount),
            category_id,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_delete_are_symmetric() {
        let food = Uuid::new_v4();
        let e = entry(food, 1200);
        assert_eq!(budget_deltas(None, Some(&e)), vec![(food, Money::new(1200))]);
        assert_eq!(budget_deltas(Some(&e), None), vec![(food, Money::new(-1200))]);
    }

    #[test]
    fn same_category_update_applies_difference() {
        let food = Uuid::new_v4();
        let old = entry(food, 1200);
        let new = entry(food, 1500);
        assert_eq!(
            budget_deltas(Some(&old), Some(&new)),
            vec![(food, Money::new(300))]
        );
        assert!(budget_deltas(Some(&old), Some(&old)).is_empty());
    }

    #[test]
    fn category_change_moves_amounts() {
        let food = Uuid::new_v4();
        let rent = Uuid::new_v4();
        let old = entry(food, 1200);
        let new = entry(rent, 900);
        assert_eq!(
            budget_deltas(Some(&old), Some(&new)),
            vec![(food, Money::new(-1200)), (rent, Money::new(900))]
        );
    }

    #[test]
    fn zero_amount_entries_produce_no_adjustment() {
        let food = Uuid::new_v4();
        assert!(budget_deltas(None, Some(&entry(food, 0))).is_empty());
    }
}
