//! Application settings, read from `settings.toml` (optional) and
//! `LEDGERLY_`-prefixed environment variables, e.g.
//! `LEDGERLY_SERVER__PORT=8080` or `LEDGERLY_MAIL__SMTP__HOST=...`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
    /// Base URL put in emailed links. Defaults to `http://{bind}:{port}`.
    pub public_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Smtp {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_true() -> bool {
    true
}

impl Smtp {
    pub fn to_config(&self) -> mailer::SmtpConfig {
        mailer::SmtpConfig {
            host: self.host.clone(),
            port: self.port,
            tls: self.tls,
            credentials: self.username.clone().zip(self.password.clone()),
        }
    }
}

/// Mail delivery. SMTP wins over the relay; with neither, mails are only
/// logged.
#[derive(Debug, Default, Deserialize)]
pub struct Mail {
    pub smtp: Option<Smtp>,
    /// HTTP endpoint accepting JSON messages.
    pub relay_url: Option<String>,
    pub from: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub ttl_hours: i64,
}

impl Session {
    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_hours(self.ttl_hours).ok_or_else(|| {
            ConfigError::Message(format!(
                "session.ttl_hours out of range: {}",
                self.ttl_hours
            ))
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub mail: Mail,
    #[serde(default)]
    pub session: Session,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("LEDGERLY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
