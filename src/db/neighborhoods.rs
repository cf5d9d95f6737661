// src/db/neighborhoods.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::resource::Resource;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct NeighborhoodRow {
    pub id: i64,
    pub name: String,
    pub profile: String,
    pub base_electricity: f64,
    pub base_water: f64,
    pub base_gas: f64,
}

impl NeighborhoodRow {
    /// Baseline consumption used when an aggregation window has no readings.
    pub fn baseline(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Electricity => self.base_electricity,
            Resource::Water => self.base_water,
            Resource::Gas => self.base_gas,
        }
    }
}

pub fn list_all(conn: &Connection) -> Result<Vec<NeighborhoodRow>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            select id, name, profile, base_electricity, base_water, base_gas
            from neighborhoods
            order by name
            "#,
        )
        .map_err(|e| ServerError::DbError(format!("prepare neighborhoods failed: {e}")))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(NeighborhoodRow {
                id: row.get(0)?,
                name: row.get(1)?,
                profile: row.get(2)?,
                base_electricity: row.get(3)?,
                base_water: row.get(4)?,
                base_gas: row.get(5)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("query neighborhoods failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(format!("read neighborhood failed: {e}")))?);
    }
    Ok(out)
}

pub fn find_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<NeighborhoodRow>, ServerError> {
    conn.query_row(
        r#"
        select id, name, profile, base_electricity, base_water, base_gas
        from neighborhoods
        where name = ?
        "#,
        params![name],
        |row| {
            Ok(NeighborhoodRow {
                id: row.get(0)?,
                name: row.get(1)?,
                profile: row.get(2)?,
                base_electricity: row.get(3)?,
                base_water: row.get(4)?,
                base_gas: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select neighborhood failed: {e}")))
}
