// src/handlers/stats.rs
use std::collections::HashMap;

use astra::Request;
use serde_json::json;

use crate::db::stats;
use crate::domain::resource::Resource;
use crate::errors::ServerError;
use crate::handlers::{authenticate, now_unix, AppState};
use crate::responses::{json_ok, ResultResp};

const DASHBOARD_WINDOW_SECS: i64 = 30 * 86_400;

pub fn dashboard(req: &Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let rows = state
        .db
        .with_conn(|conn| stats::dashboard(conn, now - DASHBOARD_WINDOW_SECS))?;

    let data: Vec<_> = rows
        .iter()
        .map(|r| {
            let cell = |c: &stats::ResourceAverage| {
                json!({ "average": c.average, "baseline": c.baseline })
            };
            json!({
                "neighborhood": r.neighborhood,
                "electricity": cell(&r.electricity),
                "water": cell(&r.water),
                "gas": cell(&r.gas),
            })
        })
        .collect();

    json_ok(json!(data))
}

pub fn timeseries(
    req: &Request,
    state: &AppState,
    params: &HashMap<String, String>,
) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let neighborhood = params
        .get("neighborhood")
        .map(String::as_str)
        .ok_or_else(|| ServerError::BadRequest("missing neighborhood parameter".into()))?;
    let resource = params
        .get("resource")
        .map(String::as_str)
        .ok_or_else(|| ServerError::BadRequest("missing resource parameter".into()))?;
    let resource = Resource::parse(resource)?;

    let points = state.db.with_conn(|conn| {
        stats::daily_series(conn, neighborhood, resource, now - DASHBOARD_WINDOW_SECS)
    })?;

    let data: Vec<_> = points
        .iter()
        .map(|p| json!({ "day": p.day, "average": p.average }))
        .collect();

    json_ok(json!(data))
}
