use std::sync::atomic::{AtomicUsize, Ordering};

use astra::{Body, Request, Response};
use http::Method;
use serde_json::Value;

use crate::auth::passwords::hash_password;
use crate::auth::sessions::create_session;
use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::db::users::{self, NewUser};
use crate::handlers::AppState;
use crate::mailer::Mailer;
use crate::responses::error_to_response;
use crate::router::handle;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Initialize a fresh test DB using the production schema.
pub fn init_test_db() -> Database {
    let path = std::env::temp_dir().join(format!(
        "gridwatch_router_test_{}_{}.sqlite",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_file(&path);

    let db = Database::new(path.to_string_lossy().to_string());
    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

/// A full application state with console mail and a scratch reports dir.
pub fn test_state() -> AppState {
    let db = init_test_db();
    let reports_dir = std::env::temp_dir().join(format!(
        "gridwatch_test_reports_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let config = AppConfig {
        db_path: String::new(),
        bind_addr: "127.0.0.1:0".into(),
        reports_dir: reports_dir.to_string_lossy().to_string(),
        admin_email: "admin@example.com".into(),
        seed_demo: false,
        brevo_api_key: String::new(),
        sender_email: "noreply@example.com".into(),
        sender_name: "Test".into(),
    };

    AppState {
        db,
        mailer: Mailer::Console,
        config,
    }
}

/// Drive one request through the router, mapping errors to responses the way
/// main() does.
pub fn send(
    state: &AppState,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut req = Request::new(match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    });

    *req.method_mut() = method;
    *req.uri_mut() = path.parse().unwrap();
    if let Some(t) = token {
        req.headers_mut()
            .insert("Authorization", format!("Bearer {t}").parse().unwrap());
    }

    match handle(req, state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    }
}

pub fn body_json(resp: Response) -> Value {
    let mut body = resp.into_body();
    serde_json::from_reader(body.reader()).expect("response body should be JSON")
}

pub fn now_unix() -> i64 {
    crate::handlers::now_unix()
}

/// Insert a verified account directly and hand back a live bearer token.
pub fn login_as(state: &AppState, email: &str, role: &str) -> String {
    state
        .db
        .with_conn(|conn| {
            let user = NewUser {
                name: "Test".into(),
                surname: "User".into(),
                neighborhood: "Fatih".into(),
                email: email.into(),
                password_hash: hash_password("test-password-1")?,
                role: role.into(),
            };
            let user_id = users::create_user(conn, &user, now_unix())?;
            users::mark_verified(conn, user_id)?;
            create_session(conn, user_id, now_unix())
        })
        .expect("login_as setup failed")
}
