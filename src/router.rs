use std::collections::HashMap;

use astra::Request;
use serde_json::json;

use crate::errors::ServerError;
use crate::handlers::{self, AppState};
use crate::responses::json_ok;
use crate::responses::ResultResp;

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let params = parse_query(&req);

    match (method.as_str(), path.as_str()) {
        ("GET", "/") => json_ok(json!({ "message": "Utility monitoring API is up." })),

        // Accounts
        ("POST", "/api/auth/register") => handlers::auth::register(&mut req, state),
        ("POST", "/api/auth/verify") => handlers::auth::verify(&mut req, state),
        ("POST", "/api/auth/resend") => handlers::auth::resend(&mut req, state),
        ("POST", "/api/auth/login") => handlers::auth::login(&mut req, state),
        ("POST", "/api/auth/logout") => handlers::auth::logout(&req, state),

        // Readings
        ("GET", "/api/readings/weekly-averages") => {
            handlers::readings::weekly_averages(&req, state)
        }
        ("GET", "/api/readings/search") => handlers::readings::search(&req, state, &params),
        ("POST", "/api/readings") => handlers::readings::ingest(&mut req, state),

        // Consumption stats
        ("GET", "/api/stats/dashboard") => handlers::stats::dashboard(&req, state),
        ("GET", "/api/stats/timeseries") => handlers::stats::timeseries(&req, state, &params),

        // Incidents
        ("GET", "/api/incidents") => handlers::incidents::list(&req, state, &params),
        ("GET", "/api/incidents/live-dashboard") => {
            handlers::incidents::live_dashboard(&req, state)
        }
        ("POST", "/api/incidents/instant") => handlers::incidents::create_instant(&mut req, state),
        ("POST", "/api/incidents/planned") => handlers::incidents::create_planned(&mut req, state),
        ("POST", "/api/incidents/simulate") => handlers::incidents::simulate(&req, state),
        ("PUT", p) => {
            let id = trailing_id(p, "/api/incidents/", "/resolve")?;
            handlers::incidents::resolve(&req, state, id)
        }

        // Analytics + reports
        ("GET", "/api/analytics/statistical-summary") => {
            handlers::analytics::statistical_summary(&req, state, &params)
        }
        ("GET", "/api/analytics/time-series") => {
            handlers::analytics::time_series(&req, state, &params)
        }
        ("POST", "/api/analytics/generate-report") => {
            handlers::analytics::generate_report(&mut req, state)
        }
        ("GET", "/api/analytics/documents") => handlers::analytics::list_documents(&req, state),
        ("DELETE", p) if p.starts_with("/api/analytics/documents/") => {
            let id = trailing_id(p, "/api/analytics/documents/", "")?;
            handlers::analytics::delete_document(&req, state, id)
        }
        ("GET", p) if p.starts_with("/api/analytics/reports/") => {
            let filename = &p["/api/analytics/reports/".len()..];
            handlers::analytics::download(&req, state, filename)
        }

        // Notifications
        ("POST", "/api/notifications/notify-neighborhood") => {
            handlers::notifications::notify_neighborhood(&mut req, state)
        }
        ("POST", "/api/support/report") => handlers::notifications::support_report(&mut req, state),

        _ => Err(ServerError::NotFound),
    }
}

/// Extract the numeric id between a path prefix and suffix,
/// e.g. "/api/incidents/17/resolve" -> 17.
fn trailing_id(path: &str, prefix: &str, suffix: &str) -> Result<i64, ServerError> {
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .and_then(|id| id.parse::<i64>().ok())
        .ok_or(ServerError::NotFound)
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            map.insert(k.into_owned(), v.into_owned());
        }
    }

    map
}
