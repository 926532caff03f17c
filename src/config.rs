use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

/// Course directory API server.
#[derive(Parser, Debug, Clone)]
#[command(name = "runda", version)]
pub struct Config {
    /// API server port
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Environment
    #[arg(long, env = "ENV", value_enum, default_value_t = Environment::Development)]
    pub env: Environment,

    /// Base URL
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:4000")]
    pub base_url: String,

    #[command(flatten)]
    pub db: DbConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL DSN
    #[arg(long = "db-dsn", env = "DB_DSN")]
    pub dsn: String,

    /// Run embedded migrations at startup
    #[arg(
        long = "db-automigrate",
        env = "DB_AUTOMIGRATE",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub automigrate: bool,

    /// PostgreSQL max open connections
    #[arg(long = "db-max-open-conns", env = "DB_MAX_OPEN_CONNS", default_value_t = 25)]
    pub max_open_conns: u32,

    /// Idle connections the pool keeps open
    #[arg(long = "db-min-idle-conns", env = "DB_MIN_IDLE_CONNS", default_value_t = 0)]
    pub min_idle_conns: u32,

    /// PostgreSQL max connection idle time (minutes)
    #[arg(long = "db-max-idle-time", env = "DB_MAX_IDLE_TIME", default_value_t = 15)]
    pub max_idle_time_mins: u64,

    /// PostgreSQL max connection lifetime (hours)
    #[arg(long = "db-max-lifetime", env = "DB_MAX_LIFETIME", default_value_t = 2)]
    pub max_lifetime_hours: u64,

    /// Per-query timeout (seconds)
    #[arg(long = "db-query-timeout", env = "DB_QUERY_TIMEOUT", default_value_t = 3)]
    pub query_timeout_secs: u64,
}

impl DbConfig {
    pub fn max_idle_time(&self) -> Duration {
        Duration::from_secs(self.max_idle_time_mins * 60)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_hours * 60 * 60)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg =
            Config::try_parse_from(["runda", "--db-dsn", "postgres://localhost/runda"]).unwrap();
        assert!(cfg.db.automigrate);
        assert_eq!(cfg.db.max_open_conns, 25);
        assert_eq!(cfg.db.max_idle_time(), Duration::from_secs(15 * 60));
        assert_eq!(cfg.db.max_lifetime(), Duration::from_secs(2 * 60 * 60));
        assert_eq!(cfg.db.query_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::try_parse_from([
            "runda",
            "--db-dsn",
            "postgres://db/runda",
            "--port",
            "8080",
            "--env",
            "production",
            "--db-automigrate",
            "false",
            "--db-query-timeout",
            "10",
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.env.as_str(), "production");
        assert!(!cfg.db.automigrate);
        assert_eq!(cfg.db.query_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_unknown_environment() {
        let res = Config::try_parse_from(["runda", "--db-dsn", "x", "--env", "qa"]);
        assert!(res.is_err());
    }
}
