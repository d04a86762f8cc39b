use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

const DEFAULT_MAIL_FROM: &str = "noreply@ledgerly.local";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerly={level},server={level},engine={level},mailer={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("No server settings found, nothing to run");
        return Ok(());
    };
    tracing::info!("Found server settings...");

    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .session_ttl(settings.session.ttl()?)
        .build()
        .await?;

    let from = settings
        .mail
        .from
        .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
    let mailer = match (settings.mail.smtp, settings.mail.relay_url) {
        (Some(smtp), _) => {
            tracing::info!("Sending mail through smtp://{}:{}", smtp.host, smtp.port);
            mailer::Mailer::smtp(smtp.to_config(), &from)?
        }
        (None, Some(relay_url)) => {
            tracing::info!("Sending mail through {relay_url}");
            mailer::Mailer::relay(reqwest::Client::new(), relay_url, from, settings.mail.api_key)
        }
        (None, None) => {
            tracing::warn!("No mail transport configured: verification emails are only logged");
            mailer::Mailer::log()
        }
    };

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let public_url = server
        .public_url
        .unwrap_or_else(|| format!("http://{addr}"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    server::run_with_listener(
        server::ServerState::new(engine, mailer, public_url),
        listener,
    )
    .await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
