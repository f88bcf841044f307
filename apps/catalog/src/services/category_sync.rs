//! Two-phase merge of the category hierarchy.
//!
//! Parents are referenced by csv_id inside the feed, and a parent row may
//! appear after its children. Phase one upserts every category flat, so all
//! ids exist; phase two resolves parent links against the merged table.
//! Rows caught in a parent-reference cycle are relinked as roots instead of
//! failing the import.

use std::collections::{HashMap, HashSet};

use sqlx::{Postgres, Transaction};

use kolben_feeds::CategoryRecord;

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryMergeCounts {
    pub upserted: u64,
    pub deleted: u64,
    pub relinked: u64,
}

pub async fn sync(
    tx: &mut Transaction<'_, Postgres>,
    records: &[CategoryRecord],
) -> Result<CategoryMergeCounts> {
    let upserted = upsert_flat(tx).await?;
    let deleted = delete_unreferenced(tx).await?;

    let cyclic = cyclic_members(records);
    if !cyclic.is_empty() {
        let mut ids: Vec<&str> = cyclic.iter().map(String::as_str).collect();
        ids.sort_unstable();
        tracing::warn!(
            categories = ?ids,
            "parent references form a cycle, relinking members as roots"
        );
    }
    let relinked = relink_parents(tx, &cyclic).await?;

    tracing::info!(upserted, deleted, relinked, "category merge complete");

    Ok(CategoryMergeCounts {
        upserted,
        deleted,
        relinked,
    })
}

/// Phase one: make every staged category exist by csv_id. Parent links are
/// untouched here; stale ones are corrected in phase two.
async fn upsert_flat(tx: &mut Transaction<'_, Postgres>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (id, csv_id, name, parent_id)
        SELECT gen_random_uuid(), s.csv_id, s.name, NULL
        FROM staging_categories s
        ON CONFLICT (csv_id) DO UPDATE SET name = EXCLUDED.name
        WHERE categories.name IS DISTINCT FROM EXCLUDED.name
        "#,
    )
    .execute(&mut **tx)
    .await
    .map_err(Error::from_sqlx)?;
    Ok(result.rows_affected())
}

/// Categories absent from the feed are deleted only while no product still
/// points at them. A referenced category survives until the product side
/// stops using it. Children of a deleted parent become roots through the
/// ON DELETE SET NULL foreign key.
async fn delete_unreferenced(tx: &mut Transaction<'_, Postgres>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM categories c
        WHERE NOT EXISTS (
            SELECT 1 FROM staging_categories s WHERE s.csv_id = c.csv_id
        )
        AND NOT EXISTS (
            SELECT 1 FROM products p WHERE c.id = ANY (p.category_ids)
        )
        "#,
    )
    .execute(&mut **tx)
    .await
    .map_err(Error::from_sqlx)?;
    Ok(result.rows_affected())
}

/// Phase two: point every staged category at its parent's uuid. Cycle
/// members and categories with an empty or unknown parent reference become
/// roots. Only rows whose parent actually changes are written.
async fn relink_parents(
    tx: &mut Transaction<'_, Postgres>,
    cyclic: &HashSet<String>,
) -> Result<u64> {
    let cyclic_ids: Vec<String> = cyclic.iter().cloned().collect();
    let result = sqlx::query(
        r#"
        UPDATE categories c
        SET parent_id = t.new_parent
        FROM (
            SELECT s.csv_id,
                   CASE WHEN s.csv_id = ANY ($1) THEN NULL
                        ELSE pc.id
                   END AS new_parent
            FROM staging_categories s
            LEFT JOIN categories pc
              ON pc.csv_id = s.parent_csv_id AND s.parent_csv_id <> ''
        ) t
        WHERE c.csv_id = t.csv_id
          AND c.parent_id IS DISTINCT FROM t.new_parent
        "#,
    )
    .bind(&cyclic_ids)
    .execute(&mut **tx)
    .await
    .map_err(Error::from_sqlx)?;
    Ok(result.rows_affected())
}

/// Returns the csv_ids that sit on a parent-reference cycle. Categories
/// that merely point into a cycle are not members; their parent link still
/// resolves.
fn cyclic_members(records: &[CategoryRecord]) -> HashSet<String> {
    let parent_of: HashMap<&str, &str> = records
        .iter()
        .filter_map(|r| {
            r.parent_csv_id
                .as_deref()
                .map(|p| (r.csv_id.as_str(), p))
        })
        .collect();

    let mut cyclic: HashSet<String> = HashSet::new();
    let mut cleared: HashSet<&str> = HashSet::new();

    for record in records {
        let mut path: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = record.csv_id.as_str();

        loop {
            if cleared.contains(current) || cyclic.contains(current) {
                break;
            }
            if !seen.insert(current) {
                // Everything from the first repeat onward is on the cycle.
                let start = path.iter().position(|&id| id == current).unwrap_or(0);
                for &member in &path[start..] {
                    cyclic.insert(member.to_string());
                }
                break;
            }
            path.push(current);
            match parent_of.get(current) {
                Some(&parent) => current = parent,
                None => break,
            }
        }

        for &id in &path {
            if !cyclic.contains(id) {
                cleared.insert(id);
            }
        }
    }

    cyclic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(csv_id: &str, parent: Option<&str>) -> CategoryRecord {
        CategoryRecord {
            csv_id: csv_id.to_string(),
            name: format!("Category {csv_id}"),
            parent_csv_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn acyclic_forest_has_no_cycle_members() {
        let records = vec![
            record("1", None),
            record("2", Some("1")),
            record("3", Some("2")),
            record("4", Some("1")),
        ];
        assert!(cyclic_members(&records).is_empty());
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let records = vec![record("1", Some("1")), record("2", None)];
        let cyclic = cyclic_members(&records);
        assert_eq!(cyclic, HashSet::from(["1".to_string()]));
    }

    #[test]
    fn mutual_references_are_both_members() {
        let records = vec![
            record("a", Some("b")),
            record("b", Some("a")),
            record("c", Some("a")),
        ];
        let cyclic = cyclic_members(&records);
        // "c" points into the cycle but is not on it.
        assert_eq!(
            cyclic,
            HashSet::from(["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn long_cycle_is_fully_detected() {
        let records = vec![
            record("1", Some("2")),
            record("2", Some("3")),
            record("3", Some("1")),
            record("4", None),
            record("5", Some("4")),
        ];
        let cyclic = cyclic_members(&records);
        assert_eq!(cyclic.len(), 3);
        assert!(cyclic.contains("1"));
        assert!(cyclic.contains("2"));
        assert!(cyclic.contains("3"));
    }

    #[test]
    fn parent_pointing_at_a_missing_row_is_not_cyclic() {
        let records = vec![record("1", Some("99"))];
        assert!(cyclic_members(&records).is_empty());
    }
}
