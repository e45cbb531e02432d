use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Loan period used by `POST /loans/borrow` when the request omits `days`
    pub default_loan_days: u32,
    /// Row cap for the top-readers report when the caller gives none
    pub top_readers_limit: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::with_profile(env::var("PROFILE").unwrap_or_else(|_| "default".to_string()))
    }

    /// Same as `from_env`, but with the profile chosen by the caller
    /// (`--profile` on the command line wins over `PROFILE`).
    pub fn with_profile(profile: String) -> Self {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://library.db?mode=rwc".to_string()
            } else {
                format!("sqlite://library_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            profile,
            default_loan_days: env::var("DEFAULT_LOAN_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(crate::services::lending_service::DEFAULT_LOAN_DAYS),
            top_readers_limit: env::var("TOP_READERS_LIMIT")
                .ok()
                .and_then(|l| l.parse().ok())
                .unwrap_or(crate::services::analytics_service::DEFAULT_TOP_READERS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            profile: "default".to_string(),
            default_loan_days: crate::services::lending_service::DEFAULT_LOAN_DAYS,
            top_readers_limit: crate::services::analytics_service::DEFAULT_TOP_READERS,
        }
    }
}
