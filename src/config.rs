// src/config.rs
use std::env;

/// Runtime configuration, read once at startup from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database path.
    pub db_path: String,
    /// Bind address for the HTTP server, e.g. "127.0.0.1:5000".
    pub bind_addr: String,
    /// Directory where generated report artifacts are written.
    pub reports_dir: String,
    /// Contact address for support reports.
    pub admin_email: String,
    /// Seed a year of demo readings at startup if the readings table is empty.
    pub seed_demo: bool,
    /// Brevo API key. Empty means console mail mode (codes are logged).
    pub brevo_api_key: String,
    pub sender_email: String,
    pub sender_name: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: var_or("GRIDWATCH_DB", "gridwatch.sqlite3"),
            bind_addr: var_or("GRIDWATCH_ADDR", "127.0.0.1:5000"),
            reports_dir: var_or("GRIDWATCH_REPORTS_DIR", "reports"),
            admin_email: var_or("ADMIN_EMAIL", "admin@gridwatch.local"),
            seed_demo: env::var("GRIDWATCH_SEED_DEMO").map(|v| v == "1").unwrap_or(false),
            brevo_api_key: var_or("BREVO_API_KEY", ""),
            sender_email: var_or("MAIL_SENDER_EMAIL", "noreply@gridwatch.local"),
            sender_name: var_or("MAIL_SENDER_NAME", "Gridwatch"),
        }
    }
}
