//! Repository layer over the SQLite connection.
//!
//! # Responsibility
//! - Define the `NodeStore` contract used by reorder, capture and services.
//! - Keep SQL, transactions and row parsing behind repository boundaries.
//!
//! # Invariants
//! - Repositories refuse connections that are not fully migrated.
//! - Multi-row writes run inside one `IMMEDIATE` transaction.

pub mod node_store;
pub mod settings_repo;

use rusqlite::Connection;

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
