// src/db/incidents.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::incident::{IncidentKind, IncidentStatus};
use crate::domain::resource::Resource;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct IncidentRow {
    pub id: i64,
    pub neighborhood: String,
    pub resource: String,
    pub kind: String,
    pub status: String,
    pub description: Option<String>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub estimated_hours: Option<i64>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewIncident {
    pub neighborhood: String,
    pub resource: Resource,
    pub kind: IncidentKind,
    pub description: Option<String>,
    pub started_at: i64,
    pub ended_at: Option<i64>,
    pub estimated_hours: Option<i64>,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IncidentRow> {
    Ok(IncidentRow {
        id: row.get(0)?,
        neighborhood: row.get(1)?,
        resource: row.get(2)?,
        kind: row.get(3)?,
        status: row.get(4)?,
        description: row.get(5)?,
        started_at: row.get(6)?,
        ended_at: row.get(7)?,
        estimated_hours: row.get(8)?,
        created_at: row.get(9)?,
        resolved_at: row.get(10)?,
    })
}

const SELECT_COLUMNS: &str = "id, neighborhood, resource, kind, status, description, \
     started_at, ended_at, estimated_hours, created_at, resolved_at";

pub fn create_incident(
    conn: &Connection,
    incident: &NewIncident,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into incidents
          (neighborhood, resource, kind, status, description, started_at, ended_at, estimated_hours, created_at)
        values (?, ?, ?, 'ongoing', ?, ?, ?, ?, ?)
        "#,
        params![
            incident.neighborhood,
            incident.resource.as_str(),
            incident.kind.as_str(),
            incident.description,
            incident.started_at,
            incident.ended_at,
            incident.estimated_hours,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert incident failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<IncidentRow>, ServerError> {
    conn.query_row(
        &format!("select {SELECT_COLUMNS} from incidents where id = ?"),
        params![id],
        map_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select incident failed: {e}")))
}

/// List incidents, newest first, optionally filtered by kind and/or status.
pub fn list_incidents(
    conn: &Connection,
    kind: Option<IncidentKind>,
    status: Option<IncidentStatus>,
) -> Result<Vec<IncidentRow>, ServerError> {
    let mut sql = format!("select {SELECT_COLUMNS} from incidents where 1 = 1");
    let mut binds: Vec<String> = Vec::new();
    if let Some(k) = kind {
        sql.push_str(" and kind = ?");
        binds.push(k.as_str().to_string());
    }
    if let Some(s) = status {
        sql.push_str(" and status = ?");
        binds.push(s.as_str().to_string());
    }
    sql.push_str(" order by started_at desc, id desc");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(format!("prepare incidents failed: {e}")))?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(binds.iter()), map_row)
        .map_err(|e| ServerError::DbError(format!("query incidents failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(format!("read incident failed: {e}")))?);
    }
    Ok(out)
}

/// Ongoing incidents, newest first, for the live dashboard.
pub fn list_ongoing(conn: &Connection) -> Result<Vec<IncidentRow>, ServerError> {
    list_incidents(conn, None, Some(IncidentStatus::Ongoing))
}

/// Flip one incident from ongoing to resolved. Returns false when the
/// incident was already resolved; NotFound when the id does not exist.
pub fn resolve_incident(conn: &Connection, id: i64, now: i64) -> Result<bool, ServerError> {
    let updated = conn
        .execute(
            "update incidents set status = 'resolved', resolved_at = ? where id = ? and status = 'ongoing'",
            params![now, id],
        )
        .map_err(|e| ServerError::DbError(format!("resolve incident failed: {e}")))?;

    if updated == 1 {
        return Ok(true);
    }

    // Distinguish "already resolved" from "no such incident".
    match find_by_id(conn, id)? {
        Some(_) => Ok(false),
        None => Err(ServerError::NotFound),
    }
}
