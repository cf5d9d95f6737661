// src/handlers/analytics.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use astra::Request;
use log::warn;
use serde::Deserialize;
use serde_json::json;

use crate::db::{documents, neighborhoods, stats};
use crate::domain::resource::Resource;
use crate::errors::ServerError;
use crate::handlers::{authenticate, now_unix, read_json, require_admin, AppState};
use crate::reports::{build_monthly_report, report_filename, ReportScope};
use crate::responses::{json_created, json_ok, report_response, ResultResp};

fn parse_month(params: &HashMap<String, String>) -> Result<u8, ServerError> {
    params
        .get("month")
        .ok_or_else(|| ServerError::BadRequest("missing month parameter".into()))?
        .parse::<u8>()
        .map_err(|_| ServerError::BadRequest("month must be a number".into()))
}

fn parse_year(params: &HashMap<String, String>) -> Result<i32, ServerError> {
    params
        .get("year")
        .ok_or_else(|| ServerError::BadRequest("missing year parameter".into()))?
        .parse::<i32>()
        .map_err(|_| ServerError::BadRequest("year must be a number".into()))
}

pub fn statistical_summary(
    req: &Request,
    state: &AppState,
    params: &HashMap<String, String>,
) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let month = parse_month(params)?;
    let year = parse_year(params)?;

    let rows = state
        .db
        .with_conn(|conn| stats::monthly_summary(conn, year, month))?;

    let data: Vec<_> = rows
        .iter()
        .map(|r| {
            json!({
                "neighborhood": r.neighborhood,
                "resource": r.resource,
                "average": r.average,
                "peak": r.peak,
                "minimum": r.minimum,
                "total": r.total,
                "samples": r.samples,
                "change_pct": r.change_pct,
            })
        })
        .collect();

    json_ok(json!(data))
}

pub fn time_series(
    req: &Request,
    state: &AppState,
    params: &HashMap<String, String>,
) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let year = parse_year(params)?;
    let breakdown = state.db.with_conn(|conn| stats::yearly_breakdown(conn, year))?;

    let months: Vec<_> = breakdown
        .months
        .iter()
        .map(|m| {
            json!({
                "month": m.month,
                "resource": m.resource,
                "average": m.average,
                "samples": m.samples,
            })
        })
        .collect();
    let seasons: Vec<_> = breakdown
        .seasons
        .iter()
        .map(|s| {
            json!({
                "season": s.season,
                "resource": s.resource,
                "average": s.average,
            })
        })
        .collect();

    json_ok(json!({ "year": year, "months": months, "seasons": seasons }))
}

#[derive(Deserialize)]
struct GenerateReportRequest {
    month: u8,
    year: i32,
    neighborhood: String,
    /// A concrete resource or "all".
    resource: String,
}

pub fn generate_report(req: &mut Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let body: GenerateReportRequest = read_json(req)?;

    let resource = match body.resource.trim().to_lowercase().as_str() {
        "all" | "" => None,
        other => Some(Resource::parse(other)?),
    };

    let neighborhood = body.neighborhood.trim().to_string();
    let known = state
        .db
        .with_conn(|conn| neighborhoods::find_by_name(conn, &neighborhood))?;
    if known.is_none() {
        return Err(ServerError::BadRequest(format!(
            "unknown neighborhood: {neighborhood}"
        )));
    }

    let scope = ReportScope {
        neighborhood: neighborhood.clone(),
        resource,
        month: body.month,
        year: body.year,
    };
    let (buffer, rows) = build_monthly_report(&state.db, &scope)?;

    fs::create_dir_all(&state.config.reports_dir)
        .map_err(|e| ServerError::ReportError(format!("create reports dir failed: {e}")))?;

    let filename = report_filename(body.year, body.month, &neighborhood, resource);
    let path = Path::new(&state.config.reports_dir).join(&filename);
    fs::write(&path, &buffer)
        .map_err(|e| ServerError::ReportError(format!("write report failed: {e}")))?;

    let document_id = state.db.with_conn(|conn| {
        documents::insert_document(
            conn,
            &filename,
            &neighborhood,
            resource.map(|r| r.as_str()).unwrap_or("all"),
            body.month as i64,
            body.year as i64,
            buffer.len() as i64,
            now,
        )
    })?;

    json_created(json!({
        "documentId": document_id,
        "filename": filename,
        "rows": rows,
        "downloadUrl": format!("/api/analytics/reports/{filename}"),
    }))
}

pub fn list_documents(req: &Request, state: &AppState) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let docs = state.db.with_conn(|conn| documents::list_documents(conn))?;

    let data: Vec<_> = docs
        .iter()
        .map(|d| {
            json!({
                "id": d.id,
                "filename": d.filename,
                "neighborhood": d.neighborhood,
                "resource": d.resource,
                "month": d.month,
                "year": d.year,
                "size_bytes": d.size_bytes,
                "created_at": d.created_at,
                "download_url": format!("/api/analytics/reports/{}", d.filename),
            })
        })
        .collect();

    json_ok(json!(data))
}

pub fn delete_document(req: &Request, state: &AppState, id: i64) -> ResultResp {
    let now = now_unix();
    let user = authenticate(req, state, now)?;
    require_admin(&user)?;

    let row = state
        .db
        .with_conn(|conn| documents::delete_document(conn, id))?;

    let path = Path::new(&state.config.reports_dir).join(&row.filename);
    if let Err(e) = fs::remove_file(&path) {
        // The metadata row is gone either way; a missing file is not fatal.
        warn!("could not remove report artifact {}: {e}", path.display());
    }

    json_ok(json!({ "message": "Report deleted." }))
}

/// Serve a stored artifact. Only filenames registered in report_documents
/// resolve, which also rules out path traversal.
pub fn download(req: &Request, state: &AppState, filename: &str) -> ResultResp {
    let now = now_unix();
    authenticate(req, state, now)?;

    let doc = state
        .db
        .with_conn(|conn| documents::find_by_filename(conn, filename))?
        .ok_or(ServerError::NotFound)?;

    let path = Path::new(&state.config.reports_dir).join(&doc.filename);
    let buffer = fs::read(&path)
        .map_err(|e| ServerError::ReportError(format!("read report failed: {e}")))?;

    report_response(buffer, &doc.filename)
}
