//! Running budget totals for expense categories.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: String,
    pub current_amount_minor: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Stored running total of one expense category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    pub category_id: Uuid,
    pub current_amount: Money,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            category_id: parse_uuid(&model.category_id, "category")?,
            current_amount: Money::new(model.current_amount_minor),
            updated_at: model.updated_at,
        })
    }
}

/// Budget joined with its category, as shown on the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetOverview {
    pub category_id: Uuid,
    pub category: String,
    pub limit: Option<Money>,
    pub current_amount: Money,
}

impl BudgetOverview {
    /// Amount left before reaching the limit (negative when exceeded).
    pub fn remaining(&self) -> Result<Option<Money>, EngineError> {
        self.limit
            .map(|limit| {
                limit.checked_sub(self.current_amount).ok_or_else(|| {
                    EngineError::Validation(format!(
                        "remaining budget of '{}' is out of range",
                        self.category
                    ))
                })
            })
            .transpose()
    }

    pub fn over_limit(&self) -> bool {
        self.limit.is_some_and(|limit| self.current_amount > limit)
    }
}

/// Difference between a stored budget and the total recomputed from the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetDrift {
    pub category_id: Uuid,
    pub category: String,
    pub stored: Option<Money>,
    pub expected: Money,
}

impl BudgetDrift {
    pub fn is_consistent(&self) -> bool {
        self.stored == Some(self.expected)
    }
}
