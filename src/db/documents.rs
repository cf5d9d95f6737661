// src/db/documents.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: i64,
    pub filename: String,
    pub neighborhood: String,
    pub resource: String,
    pub month: i64,
    pub year: i64,
    pub size_bytes: i64,
    pub created_at: i64,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        filename: row.get(1)?,
        neighborhood: row.get(2)?,
        resource: row.get(3)?,
        month: row.get(4)?,
        year: row.get(5)?,
        size_bytes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const SELECT_COLUMNS: &str =
    "id, filename, neighborhood, resource, month, year, size_bytes, created_at";

/// Register a generated artifact. Re-generating the same scope replaces the
/// previous row (the file on disk is overwritten by the caller).
pub fn insert_document(
    conn: &Connection,
    filename: &str,
    neighborhood: &str,
    resource: &str,
    month: i64,
    year: i64,
    size_bytes: i64,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into report_documents (filename, neighborhood, resource, month, year, size_bytes, created_at)
        values (?, ?, ?, ?, ?, ?, ?)
        on conflict(filename) do update set
            size_bytes = excluded.size_bytes,
            created_at = excluded.created_at
        "#,
        params![filename, neighborhood, resource, month, year, size_bytes, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert document failed: {e}")))?;

    conn.query_row(
        "select id from report_documents where filename = ?",
        params![filename],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("select document id failed: {e}")))
}

pub fn list_documents(conn: &Connection) -> Result<Vec<DocumentRow>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {SELECT_COLUMNS} from report_documents order by created_at desc, id desc"
        ))
        .map_err(|e| ServerError::DbError(format!("prepare documents failed: {e}")))?;

    let rows = stmt
        .query_map([], map_row)
        .map_err(|e| ServerError::DbError(format!("query documents failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(format!("read document failed: {e}")))?);
    }
    Ok(out)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<DocumentRow>, ServerError> {
    conn.query_row(
        &format!("select {SELECT_COLUMNS} from report_documents where id = ?"),
        params![id],
        map_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select document failed: {e}")))
}

pub fn find_by_filename(
    conn: &Connection,
    filename: &str,
) -> Result<Option<DocumentRow>, ServerError> {
    conn.query_row(
        &format!("select {SELECT_COLUMNS} from report_documents where filename = ?"),
        params![filename],
        map_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select document failed: {e}")))
}

/// Remove the metadata row. Returns the row so the caller can delete the
/// artifact from disk as well.
pub fn delete_document(conn: &Connection, id: i64) -> Result<DocumentRow, ServerError> {
    let row = find_by_id(conn, id)?.ok_or(ServerError::NotFound)?;
    conn.execute("delete from report_documents where id = ?", params![id])
        .map_err(|e| ServerError::DbError(format!("delete document failed: {e}")))?;
    Ok(row)
}
