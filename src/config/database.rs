use super::env::{flag_or, non_empty, parse_or, process_env};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Postgres pool settings.
///
/// SQL statement logging is off unless `DB_LOG_SQL` is set: a sitemap page
/// selects up to 50,000 rows and would flood the log.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub log_sql: bool,
}

impl DatabaseConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let url = non_empty(&lookup, "DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable must be set"))?;

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10u32).max(1);
        let min_connections = parse_or(&lookup, "DB_MIN_CONNECTIONS", 2u32).min(max_connections);
        let connect_timeout = Duration::from_secs(parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 5));

        Ok(Self {
            url,
            max_connections,
            min_connections,
            connect_timeout,
            log_sql: flag_or(&lookup, "DB_LOG_SQL", false),
        })
    }

    pub async fn connect(&self) -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(self.log_sql);

        Database::connect(opt).await
    }
}
