//! Application state shared by the HTTP handlers

use sea_orm::DatabaseConnection;

use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub default_loan_days: u32,
    pub top_readers_limit: u64,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            db,
            default_loan_days: config.default_loan_days,
            top_readers_limit: config.top_readers_limit,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Lets handlers extract the connection directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
