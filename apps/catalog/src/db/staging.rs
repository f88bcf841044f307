//! Transaction-scoped staging tables for bulk feed imports.
//!
//! Each import builds a temp table from the feed schema, streams the parsed
//! rows in with COPY, and lets the merge statements work set-based against
//! it. The table is dropped with the transaction, so a failed import leaves
//! nothing behind.

use std::collections::HashMap;

use sqlx::{Postgres, Row, Transaction};

use kolben_feeds::schema::{FeedSchema, Value};

use crate::error::Result;

/// Creates the staging table for `schema` and COPYs `rows` into it.
///
/// Duplicate natural keys within one feed collapse to the last occurrence
/// before COPY, so merge statements never see an ambiguous key. Returns the
/// number of rows staged.
pub async fn load(
    tx: &mut Transaction<'_, Postgres>,
    schema: &FeedSchema,
    rows: &[Vec<Value>],
) -> Result<u64> {
    sqlx::query(&create_table_sql(schema))
        .execute(&mut **tx)
        .await
        .map_err(crate::Error::Database)?;

    if rows.is_empty() {
        return Ok(0);
    }

    let rows = dedupe_by_natural_key(schema, rows);

    let copy_start = std::time::Instant::now();
    let data = copy_payload(&rows);

    let mut copy = tx
        .copy_in_raw(&copy_statement(schema))
        .await
        .map_err(crate::Error::Database)?;
    copy.send(data.as_bytes())
        .await
        .map_err(crate::Error::Database)?;
    copy.finish().await.map_err(crate::Error::Database)?;

    let staged: i64 = sqlx::query(&format!("SELECT count(*) FROM {}", schema.table))
        .fetch_one(&mut **tx)
        .await
        .map_err(crate::Error::Database)?
        .get(0);

    tracing::debug!(
        table = schema.table,
        rows = staged,
        elapsed_ms = copy_start.elapsed().as_millis() as u64,
        "staging table loaded"
    );

    Ok(staged as u64)
}

fn dedupe_by_natural_key<'a>(schema: &FeedSchema, rows: &'a [Vec<Value>]) -> Vec<&'a Vec<Value>> {
    let key_indexes: Vec<usize> = schema
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| schema.natural_key.contains(&c.name))
        .map(|(i, _)| i)
        .collect();

    let mut by_key: HashMap<Vec<String>, usize> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        let key: Vec<String> = key_indexes
            .iter()
            .map(|&k| match &row[k] {
                Value::Text(s) => s.clone(),
                Value::Integer(n) => n.to_string(),
                Value::Numeric(d) => d.to_string(),
            })
            .collect();
        // Later rows win, matching "last occurrence" feed semantics.
        by_key.insert(key, i);
    }

    if by_key.len() == rows.len() {
        return rows.iter().collect();
    }

    tracing::warn!(
        table = schema.table,
        collapsed = rows.len() - by_key.len(),
        "feed carries duplicate natural keys, keeping last occurrences"
    );

    let mut kept: Vec<usize> = by_key.into_values().collect();
    kept.sort_unstable();
    kept.into_iter().map(|i| &rows[i]).collect()
}

fn create_table_sql(schema: &FeedSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.ty.sql()))
        .collect();
    format!(
        "CREATE TEMP TABLE {} ({}) ON COMMIT DROP",
        schema.table,
        columns.join(", ")
    )
}

fn copy_statement(schema: &FeedSchema) -> String {
    let columns: Vec<&str> = schema.columns.iter().map(|c| c.name).collect();
    format!(
        "COPY {} ({}) FROM STDIN",
        schema.table,
        columns.join(", ")
    )
}

fn copy_payload<R: AsRef<[Value]>>(rows: &[R]) -> String {
    let mut data = String::with_capacity(rows.len() * 128);
    for row in rows {
        let mut first = true;
        for value in row.as_ref() {
            if !first {
                data.push('\t');
            }
            first = false;
            match value {
                Value::Text(s) => data.push_str(&escape_copy(s)),
                Value::Integer(n) => data.push_str(&n.to_string()),
                Value::Numeric(d) => data.push_str(&d.to_string()),
            }
        }
        data.push('\n');
    }
    data
}

fn escape_copy(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    // Escape backslashes, newlines, tabs
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
