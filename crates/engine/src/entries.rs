//! Ledger entries.
//!
//! An `Entry` is one expense, income or investment record. The three kinds
//! live in separate tables with identical shape; `entry_table!` generates the
//! sea-orm entity and the row-level gateway functions for each of them.

use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, LedgerKind, Money, ResultEngine,
    util::{normalize_optional_text, parse_date},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub id: Uuid,
    pub kind: LedgerKind,
    pub date: NaiveDate,
    pub amount: Money,
    pub category_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw entry fields as submitted by a form.
#[derive(Clone, Debug)]
pub struct EntryInput {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Major units, must be finite and `>= 0`.
    pub amount: f64,
    pub category_id: Uuid,
    pub note: Option<String>,
}

/// Validated entry fields.
#[derive(Clone, Debug)]
pub(crate) struct EntryFields {
    pub(crate) date: NaiveDate,
    pub(crate) amount: Money,
    pub(crate) category_id: Uuid,
    pub(crate) note: Option<String>,
}

impl EntryInput {
    pub(crate) fn validate(&self) -> ResultEngine<EntryFields> {
        Ok(EntryFields {
            date: parse_date(&self.date)?,
            amount: Money::from_major(self.amount)?,
            category_id: self.category_id,
            note: normalize_optional_text(self.note.as_deref()),
        })
    }
}

/// Filters for listing entries. Both date bounds are inclusive.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl EntryFilter {
    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(EngineError::Validation(
                "invalid range: from must be <= to".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of entries, newest first.
#[derive(Clone, Debug)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    pub next_cursor: Option<String>,
}

/// Position after the last returned entry: `(date DESC, id DESC)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EntryCursor {
    pub(crate) date: NaiveDate,
    pub(crate) id: String,
}

impl EntryCursor {
    pub(crate) fn after(entry: &Entry) -> Self {
        Self {
            date: entry.date,
            id: entry.id.to_string(),
        }
    }

    pub(crate) fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::Validation("invalid entries cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    pub(crate) fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::Validation("invalid entries cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::Validation("invalid entries cursor".to_string()))
    }
}

macro_rules! entry_table {
    ($module:ident, $table:tt, $kind:expr) => {
        pub(crate) mod $module {
            use sea_orm::{
                ActiveValue, Condition, PaginatorTrait, QueryOrder, QuerySelect,
                entity::prelude::*,
            };
            use uuid::Uuid;

            use super::{Entry, EntryCursor, EntryFilter};
            use crate::{EngineError, LedgerKind, Money, ResultEngine, util::parse_uuid};

            pub(crate) const KIND: LedgerKind = $kind;

            #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
            #[sea_orm(table_name = $table)]
            pub struct Model {
                #[sea_orm(primary_key, auto_increment = false)]
                pub id: String,
                pub date: Date,
                pub amount_minor: i64,
                pub category_id: String,
                pub note: Option<String>,
                pub created_at: DateTimeUtc,
            }

            #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
            pub enum Relation {}

            impl ActiveModelBehavior for ActiveModel {}

            impl TryFrom<Model> for Entry {
                type Error = EngineError;

                fn try_from(model: Model) -> Result<Self, Self::Error> {
                    Ok(Entry {
                        id: parse_uuid(&model.id, "entry")?,
                        kind: KIND,
                        date: model.date,
                        amount: Money::new(model.amount_minor),
                        category_id: parse_uuid(&model.category_id, "category")?,
                        note: model.note,
                        created_at: model.created_at,
                    })
                }
            }

            impl From<&Entry> for ActiveModel {
                fn from(entry: &Entry) -> Self {
                    Self {
                        id: ActiveValue::Set(entry.id.to_string()),
                        date: ActiveValue::Set(entry.date),
                        amount_minor: ActiveValue::Set(entry.amount.minor()),
                        category_id: ActiveValue::Set(entry.category_id.to_string()),
                        note: ActiveValue::Set(entry.note.clone()),
                        created_at: ActiveValue::Set(entry.created_at),
                    }
                }
            }

            pub(crate) async fn find<C: ConnectionTrait>(
                db: &C,
                id: Uuid,
            ) -> ResultEngine<Option<Entry>> {
                Entity::find_by_id(id.to_string())
                    .one(db)
                    .await?
                    .map(Entry::try_from)
                    .transpose()
            }

            pub(crate) async fn page<C: ConnectionTrait>(
                db: &C,
                filter: &EntryFilter,
                after: Option<&EntryCursor>,
                limit: u64,
            ) -> ResultEngine<Vec<Entry>> {
                let mut query = Entity::find();
                if let Some(category_id) = filter.category_id {
                    query = query.filter(Column::CategoryId.eq(category_id.to_string()));
                }
                if let Some(from) = filter.from {
                    query = query.filter(Column::Date.gte(from));
                }
                if let Some(to) = filter.to {
                    query = query.filter(Column::Date.lte(to));
                }
                if let Some(cursor) = after {
                    query = query.filter(
                        Condition::any().add(Column::Date.lt(cursor.date)).add(
                            Condition::all()
                                .add(Column::Date.eq(cursor.date))
                                .add(Column::Id.lt(cursor.id.clone())),
                        ),
                    );
                }

                query
                    .order_by_desc(Column::Date)
                    .order_by_desc(Column::Id)
                    .limit(limit)
                    .all(db)
                    .await?
                    .into_iter()
                    .map(Entry::try_from)
                    .collect()
            }

            pub(crate) async fn insert<C: ConnectionTrait>(db: &C, entry: &Entry) -> ResultEngine<()> {
                ActiveModel::from(entry).insert(db).await?;
                Ok(())
            }

            pub(crate) async fn update<C: ConnectionTrait>(db: &C, entry: &Entry) -> ResultEngine<()> {
                ActiveModel::from(entry).update(db).await?;
                Ok(())
            }

            pub(crate) async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> ResultEngine<u64> {
                let res = Entity::delete_by_id(id.to_string()).exec(db).await?;
                Ok(res.rows_affected)
            }

            pub(crate) async fn count_for_category<C: ConnectionTrait>(
                db: &C,
                category_id: Uuid,
            ) -> ResultEngine<u64> {
                Ok(Entity::find()
                    .filter(Column::CategoryId.eq(category_id.to_string()))
                    .count(db)
                    .await?)
            }

            /// Sum of amounts grouped by category.
            pub(crate) async fn totals_by_category<C: ConnectionTrait>(
                db: &C,
            ) -> ResultEngine<Vec<(Uuid, Money)>> {
                let rows: Vec<(String, Option<i64>)> = Entity::find()
                    .select_only()
                    .column(Column::CategoryId)
                    .column_as(Column::AmountMinor.sum(), "total")
                    .group_by(Column::CategoryId)
                    .into_tuple()
                    .all(db)
                    .await?;

                rows.into_iter()
                    .map(|(category_id, total)| {
                        Ok((
                            parse_uuid(&category_id, "category")?,
                            Money::new(total.unwrap_or(0)),
                        ))
                    })
                    .collect()
            }
        }
    };
}

entry_table!(expenses, "expenses", LedgerKind::Expense);
entry_table!(incomes, "incomes", LedgerKind::Income);
entry_table!(invests, "invests", LedgerKind::Invest);
