// src/db/readings.rs
use rusqlite::{params, Connection};

use crate::domain::resource::Resource;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct ReadingRow {
    pub id: i64,
    pub neighborhood: String,
    pub resource: String,
    pub amount: f64,
    pub unit: String,
    pub recorded_at: i64,
    pub anomaly: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAverage {
    pub neighborhood: String,
    pub resource: String,
    pub average: f64,
}

pub fn insert_reading(
    conn: &Connection,
    neighborhood: &str,
    resource: Resource,
    amount: f64,
    unit: &str,
    recorded_at: i64,
    anomaly: bool,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        INSERT INTO readings (neighborhood, resource, amount, unit, recorded_at, anomaly)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![neighborhood, resource.as_str(), amount, unit, recorded_at, anomaly],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

/// Most recent amounts for one meter scope, newest first. Sample for the
/// anomaly check on ingest.
pub fn recent_amounts(
    conn: &Connection,
    neighborhood: &str,
    resource: Resource,
    limit: i64,
) -> Result<Vec<f64>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT amount
            FROM readings
            WHERE neighborhood = ?1 AND resource = ?2
            ORDER BY recorded_at DESC, id DESC
            LIMIT ?3
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![neighborhood, resource.as_str(), limit], |row| {
            row.get::<_, f64>(0)
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Average consumption per (neighborhood, resource) since the cutoff,
/// rounded to two decimals.
pub fn weekly_averages(conn: &Connection, since: i64) -> Result<Vec<WeeklyAverage>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                neighborhood,             -- 0
                resource,                 -- 1
                ROUND(AVG(amount), 2)     -- 2
            FROM readings
            WHERE recorded_at >= ?1
            GROUP BY neighborhood, resource
            ORDER BY neighborhood, resource
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![since], |row| {
            Ok(WeeklyAverage {
                neighborhood: row.get(0)?,
                resource: row.get(1)?,
                average: row.get(2)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(results)
}

/// Distinct neighborhood names with readings, filtered by a case-insensitive
/// substring.
pub fn search_neighborhoods(
    conn: &Connection,
    query: &str,
) -> Result<Vec<String>, ServerError> {
    let pattern = format!("%{}%", query.trim());
    let mut stmt = conn
        .prepare(
            r#"
            SELECT DISTINCT neighborhood
            FROM readings
            WHERE neighborhood LIKE ?1
            ORDER BY neighborhood
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![pattern], |row| row.get::<_, String>(0))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn count_readings(conn: &Connection) -> Result<i64, ServerError> {
    conn.query_row("SELECT COUNT(*) FROM readings", [], |r| r.get(0))
        .map_err(|e| ServerError::DbError(e.to_string()))
}

/// One page of a chunked report fetch: rows with id > last_id inside the
/// window, ascending by id so every row is visited exactly once.
pub fn fetch_report_chunk(
    conn: &Connection,
    neighborhood: &str,
    resource: Option<Resource>,
    from: i64,
    to: i64,
    last_id: i64,
    limit: i64,
) -> Result<Vec<ReadingRow>, ServerError> {
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<ReadingRow> {
        Ok(ReadingRow {
            id: row.get(0)?,
            neighborhood: row.get(1)?,
            resource: row.get(2)?,
            amount: row.get(3)?,
            unit: row.get(4)?,
            recorded_at: row.get(5)?,
            anomaly: row.get(6)?,
        })
    };

    let mut out = Vec::new();
    match resource {
        Some(res) => {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, neighborhood, resource, amount, unit, recorded_at, anomaly
                    FROM readings
                    WHERE neighborhood = ?1 AND resource = ?2
                      AND recorded_at >= ?3 AND recorded_at < ?4
                      AND id > ?5
                    ORDER BY id
                    LIMIT ?6
                    "#,
                )
                .map_err(|e| ServerError::DbError(e.to_string()))?;
            let rows = stmt
                .query_map(
                    params![neighborhood, res.as_str(), from, to, last_id, limit],
                    map_row,
                )
                .map_err(|e| ServerError::DbError(e.to_string()))?;
            for r in rows {
                out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
            }
        }
        None => {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, neighborhood, resource, amount, unit, recorded_at, anomaly
                    FROM readings
                    WHERE neighborhood = ?1
                      AND recorded_at >= ?2 AND recorded_at < ?3
                      AND id > ?4
                    ORDER BY id
                    LIMIT ?5
                    "#,
                )
                .map_err(|e| ServerError::DbError(e.to_string()))?;
            let rows = stmt
                .query_map(params![neighborhood, from, to, last_id, limit], map_row)
                .map_err(|e| ServerError::DbError(e.to_string()))?;
            for r in rows {
                out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
            }
        }
    }
    Ok(out)
}
