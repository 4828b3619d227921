use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TokenforgeError;
use crate::models::{Filter, Record};

const SCHEMA: &str = include_str!("../../../migrations/001_initial.sql");

/// SQLite-backed snapshot of backend rows.
///
/// Rows are kept as the JSON documents the backend serves, keyed by
/// `(Record::TABLE, id)`, so every record type shares one table.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, TokenforgeError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, TokenforgeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ── Record CRUD ─────────────────────────────────────────────

    /// Insert a new row. Fails if a row with the same id already exists.
    pub fn insert<R: Record>(&self, record: &R) -> Result<R, TokenforgeError> {
        let data = serde_json::to_string(record)?;
        let inserted = self.conn.execute(
            "INSERT INTO records (kind, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, id) DO NOTHING",
            params![R::TABLE, record.id(), data, Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            return Err(TokenforgeError::Validation(format!(
                "{} row {} already exists",
                R::TABLE,
                record.id()
            )));
        }
        Ok(record.clone())
    }

    /// Get a row by id.
    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>, TokenforgeError> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE kind = ?1 AND id = ?2",
                params![R::TABLE, id],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d).map_err(Into::into))
            .transpose()
    }

    /// All rows of a kind matching the filter, in insertion order.
    pub fn list<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, TokenforgeError> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM records WHERE kind = ?1 ORDER BY rowid")?;
        let docs = stmt
            .query_map(params![R::TABLE], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let value: serde_json::Value = serde_json::from_str(&doc)?;
            if filter.matches(&value) {
                rows.push(serde_json::from_value(value)?);
            }
        }
        Ok(rows)
    }

    /// Replace an existing row.
    pub fn update<R: Record>(&self, record: &R) -> Result<R, TokenforgeError> {
        let data = serde_json::to_string(record)?;
        let changed = self.conn.execute(
            "UPDATE records SET data = ?1, updated_at = ?2 WHERE kind = ?3 AND id = ?4",
            params![data, Utc::now().to_rfc3339(), R::TABLE, record.id()],
        )?;
        if changed == 0 {
            return Err(TokenforgeError::NotFound(format!(
                "{} row {}",
                R::TABLE,
                record.id()
            )));
        }
        Ok(record.clone())
    }

    /// Delete a row by id.
    pub fn delete<R: Record>(&self, id: &str) -> Result<(), TokenforgeError> {
        let changed = self.conn.execute(
            "DELETE FROM records WHERE kind = ?1 AND id = ?2",
            params![R::TABLE, id],
        )?;
        if changed == 0 {
            return Err(TokenforgeError::NotFound(format!("{} row {id}", R::TABLE)));
        }
        Ok(())
    }

    /// Delete every row of a kind matching the filter. Returns the count.
    pub fn delete_where<R: Record>(&self, filter: &Filter) -> Result<usize, TokenforgeError> {
        let doomed: Vec<R> = self.list(filter)?;
        for row in &doomed {
            self.delete::<R>(row.id())?;
        }
        Ok(doomed.len())
    }

    // ── Sync ────────────────────────────────────────────────────

    /// Replace all rows of a kind matching `scope` with `rows`, atomically,
    /// and record the sync time.
    pub fn replace_all<R: Record>(
        &self,
        scope: &Filter,
        rows: &[R],
    ) -> Result<usize, TokenforgeError> {
        let tx = self.conn.unchecked_transaction()?;
        let stale: Vec<R> = self.list(scope)?;
        for row in &stale {
            tx.execute(
                "DELETE FROM records WHERE kind = ?1 AND id = ?2",
                params![R::TABLE, row.id()],
            )?;
        }
        let now = Utc::now().to_rfc3339();
        for row in rows {
            tx.execute(
                "INSERT INTO records (kind, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(kind, id) DO UPDATE SET
                   data = excluded.data,
                   updated_at = excluded.updated_at",
                params![R::TABLE, row.id(), serde_json::to_string(row)?, now],
            )?;
        }
        tx.execute(
            "INSERT INTO sync_state (kind, last_synced_at) VALUES (?1, ?2)
             ON CONFLICT(kind) DO UPDATE SET last_synced_at = excluded.last_synced_at",
            params![R::TABLE, now],
        )?;
        tx.commit()?;
        tracing::debug!(kind = R::TABLE, count = rows.len(), "replaced snapshot rows");
        Ok(rows.len())
    }

    /// When the given kind was last pulled from the backend.
    pub fn last_sync(&self, kind: &str) -> Result<Option<DateTime<Utc>>, TokenforgeError> {
        let ts: Option<String> = self
            .conn
            .query_row(
                "SELECT last_synced_at FROM sync_state WHERE kind = ?1",
                params![kind],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Row counts per kind, for status output.
    pub fn counts(&self) -> Result<Vec<(String, i64)>, TokenforgeError> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM records GROUP BY kind ORDER BY kind")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Brand, ColorRole, ColorToken, Platform, Unit};

    #[test]
    fn test_insert_and_get_brand() {
        let db = Storage::open_memory().unwrap();
        let brand = Brand::new("Acme", Some("Marketing site".into()));
        db.insert(&brand).unwrap();

        let fetched: Brand = db.get(&brand.id).unwrap().unwrap();
        assert_eq!(fetched, brand);
        assert!(db.get::<Brand>("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let db = Storage::open_memory().unwrap();
        let brand = Brand::new("Acme", None);
        db.insert(&brand).unwrap();
        assert!(matches!(
            db.insert(&brand),
            Err(TokenforgeError::Validation(_))
        ));
    }

    #[test]
    fn test_list_filters_by_brand() {
        let db = Storage::open_memory().unwrap();
        let a = Brand::new("A", None);
        let b = Brand::new("B", None);
        db.insert(&a).unwrap();
        db.insert(&b).unwrap();
        db.insert(&Platform::new(&a.id, "Web", Unit::Rem)).unwrap();
        db.insert(&Platform::new(&a.id, "iOS", Unit::Pt)).unwrap();
        db.insert(&Platform::new(&b.id, "Android", Unit::Sp)).unwrap();

        let for_a: Vec<Platform> = db.list(&Filter::eq("brand_id", &a.id)).unwrap();
        let names: Vec<&str> = for_a.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Web", "iOS"]);

        let all: Vec<Platform> = db.list(&Filter::all()).unwrap();
        assert_eq!(all.len(), 3);
        let brands: Vec<Brand> = db.list(&Filter::all()).unwrap();
        assert_eq!(brands.len(), 2);
    }

    #[test]
    fn test_update_and_delete() {
        let db = Storage::open_memory().unwrap();
        let mut color = ColorToken::new("b1", "primary", "#336699", ColorRole::Primary).unwrap();
        db.insert(&color).unwrap();

        color.hex = "#000000".into();
        db.update(&color).unwrap();
        let fetched: ColorToken = db.get(&color.id).unwrap().unwrap();
        assert_eq!(fetched.hex, "#000000");

        db.delete::<ColorToken>(&color.id).unwrap();
        assert!(db.get::<ColorToken>(&color.id).unwrap().is_none());
        assert!(matches!(
            db.delete::<ColorToken>(&color.id),
            Err(TokenforgeError::NotFound(_))
        ));
        assert!(matches!(db.update(&color), Err(TokenforgeError::NotFound(_))));
    }

    #[test]
    fn test_replace_all_scoped() {
        let db = Storage::open_memory().unwrap();
        let keep = ColorToken::new("other", "keep", "#111111", ColorRole::Neutral).unwrap();
        let stale = ColorToken::new("b1", "stale", "#222222", ColorRole::Neutral).unwrap();
        db.insert(&keep).unwrap();
        db.insert(&stale).unwrap();
        assert!(db.last_sync(ColorToken::TABLE).unwrap().is_none());

        let fresh = vec![
            ColorToken::new("b1", "a", "#333333", ColorRole::Accent).unwrap(),
            ColorToken::new("b1", "b", "#444444", ColorRole::Accent).unwrap(),
        ];
        let n = db.replace_all(&Filter::eq("brand_id", "b1"), &fresh).unwrap();
        assert_eq!(n, 2);

        let b1: Vec<ColorToken> = db.list(&Filter::eq("brand_id", "b1")).unwrap();
        assert_eq!(b1.len(), 2);
        assert!(db.get::<ColorToken>(&stale.id).unwrap().is_none());
        assert!(db.get::<ColorToken>(&keep.id).unwrap().is_some());
        assert!(db.last_sync(ColorToken::TABLE).unwrap().is_some());
    }

    #[test]
    fn test_delete_where_and_counts() {
        let db = Storage::open_memory().unwrap();
        db.insert(&Platform::new("b1", "Web", Unit::Px)).unwrap();
        db.insert(&Platform::new("b1", "iOS", Unit::Pt)).unwrap();
        db.insert(&Brand::new("b", None)).unwrap();

        let removed = db
            .delete_where::<Platform>(&Filter::eq("brand_id", "b1"))
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.counts().unwrap(), vec![("brands".to_string(), 1)]);
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.db");
        {
            let db = Storage::open(&path).unwrap();
            db.insert(&Brand::new("Persisted", None)).unwrap();
        }
        let db = Storage::open(&path).unwrap();
        let brands: Vec<Brand> = db.list(&Filter::all()).unwrap();
        assert_eq!(brands[0].name, "Persisted");
    }
}
