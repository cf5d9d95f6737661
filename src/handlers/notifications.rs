// src/handlers/notifications.rs
use astra::Request;
use log::warn;
use serde::Deserialize;
use serde_json::json;

use crate::db::users;
use crate::domain::resource::Resource;
use crate::errors::ServerError;
use crate::handlers::{authenticate, now_unix, read_json, require_admin, AppState};
use crate::responses::{json_ok, ResultResp};

#[derive(Deserialize)]
struct NotifyNeighborhoodRequest {
    neighborhood: String,
    resource: String,
    message: String,
}

/// Mail every verified account registered in a neighborhood.
pub fn notify_neighborhood(req: &mut Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let body: NotifyNeighborhoodRequest = read_json(req)?;
    let resource = Resource::parse(&body.resource)?;
    let neighborhood = body.neighborhood.trim();
    if neighborhood.is_empty() {
        return Err(ServerError::BadRequest("neighborhood is required".into()));
    }

    let emails = state
        .db
        .with_conn(|conn| users::verified_emails_in_neighborhood(conn, neighborhood))?;

    let mut notified = 0;
    for email in &emails {
        match state
            .mailer
            .send_incident_notice(email, neighborhood, resource.as_str(), &body.message)
        {
            Ok(()) => notified += 1,
            Err(e) => warn!("incident notice to {email} failed: {e}"),
        }
    }

    json_ok(json!({ "notifiedCount": notified }))
}

#[derive(Deserialize)]
struct SupportReportRequest {
    neighborhood: Option<String>,
    resource: String,
    message: String,
    reporter: Option<String>,
}

/// Forward an abnormal-consumption report to the configured admin contact.
/// The neighborhood defaults to the reporting user's own.
pub fn support_report(req: &mut Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let body: SupportReportRequest = read_json(req)?;
    let resource = Resource::parse(&body.resource)?;

    let neighborhood = body
        .neighborhood
        .unwrap_or_else(|| user.neighborhood.clone());
    let reporter = body.reporter.unwrap_or_else(|| user.email.clone());
    state.mailer.send_support_report(
        &state.config.admin_email,
        neighborhood.trim(),
        resource.as_str(),
        &reporter,
        &body.message,
    )?;

    json_ok(json!({ "message": "Support report sent." }))
}
