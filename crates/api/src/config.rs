/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    /// `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Drain budget for background tasks at shutdown, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// PostgreSQL connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// Capacity of each observer's outbound channel (default: `64`).
    pub observer_buffer: usize,
    /// Seconds between full snapshot pushes; `0` disables them (default: `15`).
    pub snapshot_interval_secs: u64,
    /// Seed the stock points into an empty registry (default: `true`).
    pub seed_default_points: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                       |
    /// | `DATABASE_URL`           | unset (in-memory store)    |
    /// | `OBSERVER_BUFFER`        | `64`                       |
    /// | `SNAPSHOT_INTERVAL_SECS` | `15`                       |
    /// | `SEED_DEFAULT_POINTS`    | `true`                     |
    ///
    /// Panics on unparsable values; misconfiguration should stop startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let observer_buffer: usize = std::env::var("OBSERVER_BUFFER")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("OBSERVER_BUFFER must be a valid usize");
        assert!(observer_buffer > 0, "OBSERVER_BUFFER must be positive");

        let snapshot_interval_secs: u64 = std::env::var("SNAPSHOT_INTERVAL_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("SNAPSHOT_INTERVAL_SECS must be a valid u64");

        let seed_default_points = std::env::var("SEED_DEFAULT_POINTS")
            .map(|v| parse_flag(&v).expect("SEED_DEFAULT_POINTS must be true or false"))
            .unwrap_or(true);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            observer_buffer,
            snapshot_interval_secs,
            seed_default_points,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
