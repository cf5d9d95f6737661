pub mod analytics;
pub mod auth;
pub mod incidents;
pub mod notifications;
pub mod readings;
pub mod stats;

use astra::Request;
use serde::de::DeserializeOwned;

use crate::auth::sessions::{self, AuthedUser};
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::ServerError;
use crate::mailer::Mailer;

/// Everything a request handler can reach: storage, outgoing mail and the
/// startup configuration.
pub struct AppState {
    pub db: Database,
    pub mailer: Mailer,
    pub config: AppConfig,
}

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Decode a JSON request body. Malformed JSON is the caller's fault.
pub fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    serde_json::from_reader(req.body_mut().reader())
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Resolve the bearer token on the request to a user.
pub fn authenticate(
    req: &Request,
    state: &AppState,
    now: i64,
) -> Result<AuthedUser, ServerError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthorized("missing bearer token".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::Unauthorized("missing bearer token".into()))?
        .trim();

    state
        .db
        .with_conn(|conn| sessions::load_user_from_session(conn, token, now))?
        .ok_or_else(|| ServerError::Unauthorized("invalid or expired token".into()))
}

/// Admin gate for mutating and analytics endpoints.
pub fn require_admin(user: &AuthedUser) -> Result<(), ServerError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServerError::Forbidden("admin access required".into()))
    }
}
