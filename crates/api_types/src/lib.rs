//! JSON types of the HTTP API.
//!
//! Request bodies carry money in major units (`12.5`); responses carry
//! `*_minor` integer cents, plus a formatted string where one is shown.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod ledger {
    use super::*;

    /// Which ledger a request targets. Appears in paths as `expense`,
    /// `income` or `invest`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LedgerKind {
        Expense,
        Income,
        Invest,
    }

    impl LedgerKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Expense => "expense",
                Self::Income => "income",
                Self::Invest => "invest",
            }
        }
    }

    /// Request body for creating or replacing an entry.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryNew {
        /// `YYYY-MM-DD`.
        pub date: String,
        /// Major units (e.g. `12.5`). Must be finite and `>= 0`.
        pub amount: f64,
        pub category_id: Uuid,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub kind: LedgerKind,
        pub date: NaiveDate,
        pub amount_minor: i64,
        /// Amount with thousands separators, e.g. `1,234.50`.
        pub amount_display: String,
        pub category_id: Uuid,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryListQuery {
        pub category_id: Option<Uuid>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    /// Per-kind total shown on the dashboard.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerTotal {
        pub kind: LedgerKind,
        pub total_minor: i64,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        /// Major units, expense categories only.
        pub budget_limit: Option<f64>,
    }

    /// Partial update. An explicit `"budget_limit": null` clears the
    /// limit; an absent field leaves it unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "double_option"
        )]
        pub budget_limit: Option<Option<f64>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub kind: ledger::LedgerKind,
        pub name: String,
        pub budget_limit_minor: Option<i64>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<CategoryView>,
    }

    mod double_option {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S>(value: &Option<Option<f64>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(inner) => inner.serialize(serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<f64>::deserialize(deserializer).map(Some)
        }
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub category_id: Uuid,
        pub category: String,
        pub limit_minor: Option<i64>,
        pub current_minor: i64,
        /// `limit - current`; negative when the limit is exceeded.
        pub remaining_minor: Option<i64>,
        pub over_limit: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetsResponse {
        pub budgets: Vec<BudgetView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetDriftView {
        pub category_id: Uuid,
        pub category: String,
        /// `None` when the budget row is missing.
        pub stored_minor: Option<i64>,
        pub expected_minor: i64,
        pub consistent: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetVerifyResponse {
        pub budgets: Vec<BudgetDriftView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardResponse {
        pub email: String,
        pub budgets: Vec<BudgetView>,
        pub totals: Vec<ledger::LedgerTotal>,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Registered {
        pub id: Uuid,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionView {
        pub token: String,
        pub expires_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerifyQuery {
        pub token: String,
    }
}

pub mod content {
    use super::*;

    /// Query string of the detail endpoints: `?url=<slug>`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContentQuery {
        pub url: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CourseView {
        pub slug: String,
        pub title: String,
        pub description: Option<String>,
        pub image: Option<String>,
        pub featured: bool,
        pub published_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LessonView {
        pub slug: String,
        pub title: String,
        pub content: String,
        pub position: i32,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BlogView {
        pub slug: String,
        pub title: String,
        pub summary: Option<String>,
        pub body: String,
        pub featured: bool,
        pub published_at: DateTime<Utc>,
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::category::CategoryUpdate;

    #[test]
    fn category_update_distinguishes_null_from_absent() {
        let absent: CategoryUpdate = serde_json::from_str(r#"{"name":"Food"}"#).unwrap();
        assert_eq!(absent.budget_limit, None);

        let cleared: CategoryUpdate = serde_json::from_str(r#"{"budget_limit":null}"#).unwrap();
        assert_eq!(cleared.budget_limit, Some(None));

        let set: CategoryUpdate = serde_json::from_str(r#"{"budget_limit":12.5}"#).unwrap();
        assert_eq!(set.budget_limit, Some(Some(12.5)));
    }
}
