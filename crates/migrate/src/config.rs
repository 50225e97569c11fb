//! Environment configuration for the migration tool.

/// Default for `DB_MAX_CONNECTIONS`.
const DEFAULT_MAX_CONNECTIONS: u32 = goalbot_db::DEFAULT_MAX_CONNECTIONS;

/// Configuration loaded from environment variables.
///
/// | Env Var                   | Default |
/// |---------------------------|---------|
/// | `DATABASE_URL`            | --      |
/// | `DB_MAX_CONNECTIONS`      | `5`     |
/// | `GOALBOT_ENABLE_SESSIONS` | `false` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    /// Required by every command that talks to the database.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Include the optional sessions migration.
    pub enable_sessions: bool,
}

impl MigrateConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to the default with a warning rather
    /// than aborting; an operator running `bundle` should not need a valid
    /// pool size.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "DB_MAX_CONNECTIONS is not a valid u32, using default");
                DEFAULT_MAX_CONNECTIONS
            }),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let enable_sessions = lookup("GOALBOT_ENABLE_SESSIONS")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            database_url,
            max_connections,
            enable_sessions,
        }
    }

    /// The database URL, or an error naming the missing variable.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
