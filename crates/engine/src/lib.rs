//! Ledger engine: expense/income/investment entries, their categories,
//! expense budgets, read-only site content and login sessions, all stored
//! through sea-orm.

pub use accounts::{Claims, Registration, Session, User};
pub use budgets::{Budget, BudgetDrift, BudgetOverview};
pub use categories::Category;
pub use content::{Blog, Course, Lesson};
pub use entries::{Entry, EntryFilter, EntryInput, EntryPage};
pub use error::EngineError;
pub use kind::LedgerKind;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};

mod accounts;
mod budgets;
mod categories;
mod content;
mod entries;
mod error;
mod export;
mod kind;
mod money;
mod ops;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
