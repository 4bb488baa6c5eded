//! Database schema and operations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{BatchRecord, YieldStatus};

/// Open a short-lived connection with the schema in place
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per batch; re-saving an id replaces the row
        CREATE TABLE IF NOT EXISTS batches (
            id TEXT PRIMARY KEY,
            created_on TEXT NOT NULL,
            operator TEXT NOT NULL,
            beverage TEXT,
            extraction_total REAL NOT NULL,
            transfer_total REAL NOT NULL,
            final_volume REAL NOT NULL,
            percentage REAL NOT NULL,
            status TEXT NOT NULL,
            detail TEXT
        );
        "#,
    )?;
    Ok(())
}

/// Insert or replace a batch
pub fn upsert_batch(conn: &Connection, batch: &BatchRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO batches (id, created_on, operator, beverage, extraction_total,
             transfer_total, final_volume, percentage, status, detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            &batch.id,
            batch.created_on.to_string(),
            &batch.operator,
            &batch.beverage,
            batch.extraction_total,
            batch.transfer_total,
            batch.final_volume,
            batch.percentage,
            batch.status.as_str(),
            &batch.detail,
        ),
    )?;
    Ok(())
}

const SELECT_BATCH: &str = "SELECT id, created_on, operator, beverage, extraction_total, transfer_total,
        final_volume, percentage, status, detail
     FROM batches";

fn row_to_batch(row: &Row) -> rusqlite::Result<BatchRecord> {
    let created_on: String = row.get(1)?;
    let status: String = row.get(8)?;

    Ok(BatchRecord {
        id: row.get(0)?,
        created_on: created_on.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        operator: row.get(2)?,
        beverage: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        extraction_total: row.get(4)?,
        transfer_total: row.get(5)?,
        final_volume: row.get(6)?,
        percentage: row.get(7)?,
        status: status.parse::<YieldStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?,
        detail: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
    })
}

/// List all batches in storage order
pub fn list_batches(conn: &Connection) -> Result<Vec<BatchRecord>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", SELECT_BATCH))?;

    let rows = stmt.query_map([], row_to_batch)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Look up a single batch by id
pub fn get_batch(conn: &Connection, id: &str) -> Result<Option<BatchRecord>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_BATCH))?;
    let batch = stmt.query_row([id], row_to_batch).optional()?;
    Ok(batch)
}
