use chrono::Duration;
use sea_orm::DatabaseConnection;

mod accounts;
mod budgets;
mod categories;
mod content;
mod entries;
mod export;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    session_ttl: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// How long a login session stays valid.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    session_ttl: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the session lifetime (default: 7 days).
    pub fn session_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.session_ttl = Some(ttl);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> crate::ResultEngine<Engine> {
        let session_ttl = self
            .session_ttl
            .unwrap_or_else(|| Duration::hours(DEFAULT_SESSION_TTL_HOURS));
        if session_ttl <= Duration::zero() {
            return Err(crate::EngineError::Validation(
                "session ttl must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            session_ttl,
        })
    }
}
