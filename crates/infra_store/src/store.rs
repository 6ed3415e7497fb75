//! SQLite-backed quote store.
//!
//! The server opens the database read-write with [`DeliveryStore::open`],
//! which creates the schema on first use. Readers such as the CLI use
//! [`DeliveryStore::open_read_only`], which never writes to the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{info, instrument};

use crate::error::StoreError;
use crate::record::DeliveryRecord;
use crate::schema;

/// Thread-safe quote store over a single SQLite connection.
///
/// Cloning shares the connection. Calls are synchronous; async callers should
/// run them on a blocking thread.
#[derive(Clone)]
pub struct DeliveryStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl DeliveryStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialise(&conn)?;

        info!(path = %path.display(), "quote database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_owned(),
        })
    }

    /// Open an existing database without write access.
    ///
    /// No schema or pragmas are applied. Fails if the file does not exist or
    /// was not created by [`open`](Self::open); any write through the
    /// returned store fails with [`StoreError::Database`].
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let version: Option<u32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| {
                StoreError::Database(format!("{} is not a quote database: {e}", path.display()))
            })?;

        info!(
            path = %path.display(),
            schema_version = ?version,
            "quote database opened read-only"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_owned(),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialise(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        })
    }

    fn initialise(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(schema::PRAGMAS)
            .map_err(|e| StoreError::Database(format!("pragmas: {e}")))?;
        conn.execute_batch(schema::CREATE_TABLES)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;

        let version: Option<u32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;

        if version.is_none() {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [schema::SCHEMA_VERSION],
            )
            .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;
        }
        Ok(())
    }

    /// Execute a closure with the database connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Location of the database file, or `:memory:`
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new record. A second record with the same ticket id is a
    /// [`StoreError::Conflict`].
    #[instrument(skip(self, record), fields(ticket_id = %record.ticket_id))]
    pub fn save(&self, record: &DeliveryRecord) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO delivery_requests ({}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    schema::RECORD_COLUMNS
                ),
                params![
                    record.ticket_id,
                    record.user_id,
                    record.material_type,
                    record.distance,
                    record.urgency,
                    record.weight,
                    record.location_type,
                    record.total_price,
                    record.status.as_str(),
                    record.created_at_column(),
                ],
            )
            .map_err(|e| match StoreError::from(e) {
                StoreError::Conflict(_) => {
                    StoreError::Conflict(format!("ticket {} already exists", record.ticket_id))
                }
                other => other,
            })?;
            Ok(())
        })
    }

    /// Fetch one record by ticket id.
    #[instrument(skip(self))]
    pub fn get(&self, ticket_id: &str) -> Result<DeliveryRecord, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM delivery_requests WHERE ticket_id = ?1",
                schema::RECORD_COLUMNS
            ))?;
            let mut rows = stmt.query([ticket_id])?;
            let record = match rows.next()? {
                Some(row) => DeliveryRecord::from_row(row)?,
                None => return Err(StoreError::NotFound(format!("ticket {ticket_id}"))),
            };
            Ok(record)
        })
    }

    /// Every record, newest first.
    #[instrument(skip(self))]
    pub fn list_recent(&self) -> Result<Vec<DeliveryRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM delivery_requests ORDER BY created_at DESC, rowid DESC",
                schema::RECORD_COLUMNS
            ))?;
            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(DeliveryRecord::from_row(row)?);
            }
            Ok(records)
        })
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM delivery_requests", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    /// Liveness check used by the health endpoint.
    pub fn ping(&self) -> bool {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(StoreError::from)
        })
        .is_ok()
    }
}

impl std::fmt::Debug for DeliveryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use delivery_core::{DeliveryInputs, PricingPipeline, QuoteStatus};

    fn record(ticket_id: &str, minutes: i64) -> DeliveryRecord {
        let state = PricingPipeline::offline().run(
            ticket_id,
            "user-1",
            DeliveryInputs::new("standard", 10.0, "standard", 3.0, "urban"),
        );
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        DeliveryRecord::from_state(&state, base + Duration::minutes(minutes))
    }

    #[test]
    fn open_in_memory() {
        let store = DeliveryStore::in_memory().unwrap();
        assert_eq!(store.path(), Path::new(":memory:"));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.ping());
    }

    #[test]
    fn schema_version_set() {
        let store = DeliveryStore::in_memory().unwrap();
        let version: u32 = store
            .with_conn(|conn| {
                conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))
                    .map_err(StoreError::from)
            })
            .unwrap();
        assert_eq!(version, schema::SCHEMA_VERSION);
    }

    #[test]
    fn save_and_get() {
        let store = DeliveryStore::in_memory().unwrap();
        let rec = record("D-0001", 0);
        store.save(&rec).unwrap();

        let fetched = store.get("D-0001").unwrap();
        assert_eq!(fetched, rec);
        assert_eq!(fetched.status, QuoteStatus::Completed);
        assert_eq!(fetched.total_price, 50.0);
    }

    #[test]
    fn get_nonexistent_is_not_found() {
        let store = DeliveryStore::in_memory().unwrap();
        let err = store.get("D-MISSING").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("D-MISSING"));
    }

    #[test]
    fn duplicate_ticket_is_conflict() {
        let store = DeliveryStore::in_memory().unwrap();
        store.save(&record("D-0001", 0)).unwrap();
        let err = store.save(&record("D-0001", 5)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn list_recent_is_newest_first() {
        let store = DeliveryStore::in_memory().unwrap();
        store.save(&record("D-OLD", 0)).unwrap();
        store.save(&record("D-NEW", 30)).unwrap();
        store.save(&record("D-MID", 10)).unwrap();

        let ids: Vec<_> = store
            .list_recent()
            .unwrap()
            .into_iter()
            .map(|r| r.ticket_id)
            .collect();
        assert_eq!(ids, vec!["D-NEW", "D-MID", "D-OLD"]);
    }

    #[test]
    fn list_recent_breaks_ties_by_insertion() {
        let store = DeliveryStore::in_memory().unwrap();
        store.save(&record("D-FIRST", 0)).unwrap();
        store.save(&record("D-SECOND", 0)).unwrap();

        let ids: Vec<_> = store
            .list_recent()
            .unwrap()
            .into_iter()
            .map(|r| r.ticket_id)
            .collect();
        assert_eq!(ids, vec!["D-SECOND", "D-FIRST"]);
    }

    #[test]
    fn corrupt_status_is_reported() {
        let store = DeliveryStore::in_memory().unwrap();
        store.save(&record("D-0001", 0)).unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE delivery_requests SET status = 'exploded' WHERE ticket_id = 'D-0001'",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let err = store.get("D-0001").unwrap_err();
        assert!(matches!(
            err,
            StoreError::CorruptRow {
                column: "status",
                ..
            }
        ));
    }
}
