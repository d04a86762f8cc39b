//! Ledger domains.
//!
//! Expenses, incomes and investments share one record shape; the kind only
//! selects which tables back the ledger and whether budgets are adjusted.

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Expense,
    Income,
    Invest,
}

impl LedgerKind {
    pub const ALL: [LedgerKind; 3] = [Self::Expense, Self::Income, Self::Invest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Invest => "invest",
        }
    }

    /// Name of the table holding the entries of this kind.
    pub fn entries_table(self) -> &'static str {
        match self {
            Self::Expense => "expenses",
            Self::Income => "incomes",
            Self::Invest => "invests",
        }
    }

    /// Name of the table holding the categories of this kind.
    pub fn categories_table(self) -> &'static str {
        match self {
            Self::Expense => "category_expenses",
            Self::Income => "category_incomes",
            Self::Invest => "category_invests",
        }
    }

    /// Only expense categories carry a running budget.
    pub fn tracks_budget(self) -> bool {
        matches!(self, Self::Expense)
    }
}

impl std::fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LedgerKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" | "expenses" => Ok(Self::Expense),
            "income" | "incomes" => Ok(Self::Income),
            "invest" | "invests" => Ok(Self::Invest),
            other => Err(EngineError::Validation(format!(
                "invalid ledger kind: {other}"
            ))),
        }
    }
}

/// Runs `$body` with `$table` bound to the entry table module of `$kind`.
macro_rules! with_entries {
    ($kind:expr, $table:ident => $body:expr) => {
        match $kind {
            $crate::LedgerKind::Expense => {
                use $crate::entries::expenses as $table;
                $body
            }
            $crate::LedgerKind::Income => {
                use $crate::entries::incomes as $table;
                $body
            }
            $crate::LedgerKind::Invest => {
                use $crate::entries::invests as $table;
                $body
            }
        }
    };
}

/// Runs `$body` with `$table` bound to the category table module of `$kind`.
macro_rules! with_categories {
    ($kind:expr, $table:ident => $body:expr) => {
        match $kind {
            $crate::LedgerKind::Expense => {
                use $crate::categories::category_expenses as $table;
                $body
            }
            $crate::LedgerKind::Income => {
                use $crate::categories::category_incomes as $table;
                $body
            }
            $crate::LedgerKind::Invest => {
                use $crate::categories::category_invests as $table;
                $body
            }
        }
    };
}

pub(crate) use {with_categories, with_entries};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_and_plural_names() {
        assert_eq!(LedgerKind::try_from("expense").unwrap(), LedgerKind::Expense);
        assert_eq!(LedgerKind::try_from("Incomes").unwrap(), LedgerKind::Income);
        assert_eq!(LedgerKind::try_from(" invest ").unwrap(), LedgerKind::Invest);
        assert!(LedgerKind::try_from("savings").is_err());
    }

    #[test]
    fn only_expenses_track_budgets() {
        assert!(LedgerKind::Expense.tracks_budget());
        assert!(!LedgerKind::Income.tracks_budget());
        assert!(!LedgerKind::Invest.tracks_budget());
    }
}
