// src/handlers/readings.rs
use std::collections::HashMap;

use astra::Request;
use serde::Deserialize;
use serde_json::json;

use crate::db::{neighborhoods, readings};
use crate::domain::resource::Resource;
use crate::domain::stats::is_anomalous;
use crate::errors::ServerError;
use crate::handlers::{authenticate, now_unix, read_json, require_admin, AppState};
use crate::responses::{json_created, json_ok, ResultResp};

const WEEK_SECS: i64 = 7 * 86_400;
/// Sample size and threshold for the ingest anomaly check.
const ANOMALY_SAMPLE: i64 = 50;
const ANOMALY_SIGMA: f64 = 3.0;

pub fn weekly_averages(req: &Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let rows = state
        .db
        .with_conn(|conn| readings::weekly_averages(conn, now - WEEK_SECS))?;

    let data: Vec<_> = rows
        .iter()
        .map(|r| {
            json!({
                "neighborhood": r.neighborhood,
                "resource": r.resource,
                "average": r.average,
            })
        })
        .collect();

    json_ok(json!(data))
}

pub fn search(req: &Request, state: &AppState, params: &HashMap<String, String>) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let query = params
        .get("query")
        .map(String::as_str)
        .ok_or_else(|| ServerError::BadRequest("missing query parameter".into()))?;

    let names = state
        .db
        .with_conn(|conn| readings::search_neighborhoods(conn, query))?;

    json_ok(json!(names))
}

#[derive(Deserialize)]
struct IngestRequest {
    neighborhood: String,
    resource: String,
    amount: f64,
    unit: Option<String>,
    recorded_at: Option<i64>,
}

pub fn ingest(req: &mut Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let body: IngestRequest = read_json(req)?;
    let resource = Resource::parse(&body.resource)?;
    if !body.amount.is_finite() || body.amount < 0.0 {
        return Err(ServerError::BadRequest("amount must be a non-negative number".into()));
    }

    let unit = body.unit.unwrap_or_else(|| resource.unit().to_string());
    let recorded_at = body.recorded_at.unwrap_or(now);

    let (id, anomaly) = state.db.with_conn(|conn| {
        // Readings are keyed by configured neighborhoods, not free text.
        if neighborhoods::find_by_name(conn, body.neighborhood.trim())?.is_none() {
            return Err(ServerError::BadRequest(format!(
                "unknown neighborhood: {}",
                body.neighborhood.trim()
            )));
        }

        let history = readings::recent_amounts(conn, body.neighborhood.trim(), resource, ANOMALY_SAMPLE)?;
        let anomaly = is_anomalous(&history, body.amount, ANOMALY_SIGMA);

        let id = readings::insert_reading(
            conn,
            body.neighborhood.trim(),
            resource,
            body.amount,
            &unit,
            recorded_at,
            anomaly,
        )?;
        Ok((id, anomaly))
    })?;

    json_created(json!({ "id": id, "anomaly": anomaly }))
}
