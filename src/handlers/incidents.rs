// src/handlers/incidents.rs
use std::collections::HashMap;

use astra::Request;
use serde::Deserialize;
use serde_json::json;

use crate::db::incidents::{self, IncidentRow, NewIncident};
use crate::domain::incident::{window_is_active, IncidentKind, IncidentStatus};
use crate::domain::resource::Resource;
use crate::errors::ServerError;
use crate::handlers::{authenticate, now_unix, read_json, require_admin, AppState};
use crate::responses::{json_created, json_ok, ResultResp};
use crate::simulation;

fn incident_json(row: &IncidentRow, now: i64) -> serde_json::Value {
    // Whether the outage window actually covers the current moment; planned
    // outages can be ongoing in status but not started yet.
    let window_active = row.status == "ongoing" && window_is_active(now, row.started_at, row.ended_at);
    json!({
        "id": row.id,
        "neighborhood": row.neighborhood,
        "resource": row.resource,
        "kind": row.kind,
        "status": row.status,
        "description": row.description,
        "started_at": row.started_at,
        "ended_at": row.ended_at,
        "estimated_hours": row.estimated_hours,
        "created_at": row.created_at,
        "resolved_at": row.resolved_at,
        "window_active": window_active,
    })
}

pub fn list(req: &Request, state: &AppState, params: &HashMap<String, String>) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let kind = params
        .get("kind")
        .map(|s| IncidentKind::parse(s))
        .transpose()?;
    let status = params
        .get("status")
        .map(|s| IncidentStatus::parse(s))
        .transpose()?;

    let rows = state
        .db
        .with_conn(|conn| incidents::list_incidents(conn, kind, status))?;

    let data: Vec<_> = rows.iter().map(|r| incident_json(r, now)).collect();
    json_ok(json!(data))
}

/// Ongoing incidents grouped per neighborhood, for the live overview.
pub fn live_dashboard(req: &Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let rows = state.db.with_conn(|conn| incidents::list_ongoing(conn))?;

    // Group while keeping the newest-first order inside each neighborhood.
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
    for row in &rows {
        if !grouped.contains_key(&row.neighborhood) {
            order.push(row.neighborhood.clone());
        }
        grouped
            .entry(row.neighborhood.clone())
            .or_default()
            .push(incident_json(row, now));
    }

    let data: Vec<_> = order
        .into_iter()
        .map(|name| {
            let incidents = grouped.remove(&name).unwrap_or_default();
            json!({ "neighborhood": name, "incidents": incidents })
        })
        .collect();

    json_ok(json!(data))
}

#[derive(Deserialize)]
struct InstantIncidentRequest {
    neighborhood: String,
    resource: String,
    description: Option<String>,
}

pub fn create_instant(req: &mut Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let body: InstantIncidentRequest = read_json(req)?;
    let resource = Resource::parse(&body.resource)?;
    if body.neighborhood.trim().is_empty() {
        return Err(ServerError::BadRequest("neighborhood is required".into()));
    }

    let incident = NewIncident {
        neighborhood: body.neighborhood.trim().to_string(),
        resource,
        kind: IncidentKind::Instant,
        description: body.description,
        started_at: now,
        ended_at: None,
        estimated_hours: None,
    };

    let row = state.db.with_conn(|conn| {
        let id = incidents::create_incident(conn, &incident, now)?;
        incidents::find_by_id(conn, id)?.ok_or(ServerError::InternalError)
    })?;

    json_created(incident_json(&row, now))
}

#[derive(Deserialize)]
struct PlannedIncidentRequest {
    neighborhood: String,
    resource: String,
    description: Option<String>,
    started_at: i64,
    ended_at: i64,
    estimated_hours: Option<i64>,
}

pub fn create_planned(req: &mut Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let body: PlannedIncidentRequest = read_json(req)?;
    let resource = Resource::parse(&body.resource)?;
    if body.neighborhood.trim().is_empty() {
        return Err(ServerError::BadRequest("neighborhood is required".into()));
    }
    if body.ended_at <= body.started_at {
        return Err(ServerError::BadRequest("outage window must end after it starts".into()));
    }

    // Fall back to the window length, rounded up to whole hours.
    let estimated_hours = body
        .estimated_hours
        .unwrap_or((body.ended_at - body.started_at + 3599) / 3600);

    let incident = NewIncident {
        neighborhood: body.neighborhood.trim().to_string(),
        resource,
        kind: IncidentKind::Planned,
        description: body.description,
        started_at: body.started_at,
        ended_at: Some(body.ended_at),
        estimated_hours: Some(estimated_hours),
    };

    let row = state.db.with_conn(|conn| {
        let id = incidents::create_incident(conn, &incident, now)?;
        incidents::find_by_id(conn, id)?.ok_or(ServerError::InternalError)
    })?;

    json_created(incident_json(&row, now))
}

pub fn resolve(req: &Request, state: &AppState, id: i64) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let flipped = state
        .db
        .with_conn(|conn| incidents::resolve_incident(conn, id, now))?;
    if !flipped {
        return Err(ServerError::BadRequest("incident is already resolved".into()));
    }

    json_ok(json!({ "message": "Incident resolved." }))
}

pub fn simulate(req: &Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let row = simulation::generate_random_incident(&state.db, now)?;
    json_created(incident_json(&row, now))
}
