//! Category registry, one table per ledger kind.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{LedgerKind, Money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub kind: LedgerKind,
    pub name: String,
    /// Optional spending limit compared against the running budget.
    pub budget_limit: Option<Money>,
    pub created_at: DateTime<Utc>,
}

macro_rules! category_table {
    ($module:ident, $table:tt, $kind:expr) => {
        pub(crate) mod $module {
            use sea_orm::{ActiveValue, QueryOrder, entity::prelude::*};
            use uuid::Uuid;

            use super::Category;
            use crate::{
                EngineError, LedgerKind, Money, ResultEngine,
                util::{normalize_category_key, parse_uuid},
            };

            pub(crate) const KIND: LedgerKind = $kind;

            #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
            #[sea_orm(table_name = $table)]
            pub struct Model {
                #[sea_orm(primary_key, auto_increment = false)]
                pub id: String,
                pub name: String,
                pub name_norm: String,
                pub budget_limit_minor: Option<i64>,
                pub created_at: DateTimeUtc,
            }

            #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
            pub enum Relation {}

            impl ActiveModelBehavior for ActiveModel {}

            impl TryFrom<Model> for Category {
                type Error = EngineError;

                fn try_from(model: Model) -> Result<Self, Self::Error> {
                    Ok(Category {
                        id: parse_uuid(&model.id, "category")?,
                        kind: KIND,
                        name: model.name,
                        budget_limit: model.budget_limit_minor.map(Money::new),
                        created_at: model.created_at,
                    })
                }
            }

            impl From<&Category> for ActiveModel {
                fn from(category: &Category) -> Self {
                    Self {
                        id: ActiveValue::Set(category.id.to_string()),
                        name: ActiveValue::Set(category.name.clone()),
                        name_norm: ActiveValue::Set(normalize_category_key(&category.name)),
                        budget_limit_minor: ActiveValue::Set(
                            category.budget_limit.map(Money::minor),
                        ),
                        created_at: ActiveValue::Set(category.created_at),
                    }
                }
            }

            pub(crate) async fn find<C: ConnectionTrait>(
                db: &C,
                id: Uuid,
            ) -> ResultEngine<Option<Category>> {
                Entity::find_by_id(id.to_string())
                    .one(db)
                    .await?
                    .map(Category::try_from)
                    .transpose()
            }

            pub(crate) async fn find_by_key<C: ConnectionTrait>(
                db: &C,
                name_norm: &str,
            ) -> ResultEngine<Option<Category>> {
                Entity::find()
                    .filter(Column::NameNorm.eq(name_norm))
                    .one(db)
                    .await?
                    .map(Category::try_from)
                    .transpose()
            }

            pub(crate) async fn list<C: ConnectionTrait>(db: &C) -> ResultEngine<Vec<Category>> {
                Entity::find()
                    .order_by_asc(Column::NameNorm)
                    .all(db)
                    .await?
                    .into_iter()
                    .map(Category::try_from)
                    .collect()
            }

            pub(crate) async fn insert<C: ConnectionTrait>(
                db: &C,
                category: &Category,
            ) -> ResultEngine<()> {
                ActiveModel::from(category).insert(db).await?;
                Ok(())
            }

            pub(crate) async fn update<C: ConnectionTrait>(
                db: &C,
                category: &Category,
            ) -> ResultEngine<()> {
                ActiveModel::from(category).update(db).await?;
                Ok(())
            }

            pub(crate) async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> ResultEngine<u64> {
                let res = Entity::delete_by_id(id.to_string()).exec(db).await?;
                Ok(res.rows_affected)
            }
        }
    };
}

category_table!(category_expenses, "category_expenses", LedgerKind::Expense);
category_table!(category_incomes, "category_incomes", LedgerKind::Income);
category_table!(category_invests, "category_invests", LedgerKind::Invest);
