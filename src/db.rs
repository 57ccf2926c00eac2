use crate::engine::{classify, compute_bmi, Category, Measurement};
use crate::error::{BmiError, Result, StorageCause};
use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage format for the `date` column, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One computed measurement. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiRecord {
    /// Row id assigned by the store (None until appended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub user: String,

    /// Kilograms
    pub weight: f64,

    /// Centimeters
    pub height: f64,

    pub bmi: f64,

    pub category: Category,

    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

impl BmiRecord {
    /// Compute BMI and category for a validated measurement, stamped `at`.
    pub fn from_measurement(measurement: &Measurement, at: NaiveDateTime) -> Result<Self> {
        let bmi = compute_bmi(measurement.weight, measurement.height)?;
        let (category, _) = classify(bmi);

        Ok(BmiRecord {
            id: None,
            user: measurement.user.clone(),
            weight: measurement.weight,
            height: measurement.height,
            bmi,
            category,
            timestamp: at.with_nanosecond(0).unwrap_or(at),
        })
    }

    /// Same as `from_measurement`, stamped with the local wall clock.
    pub fn now(measurement: &Measurement) -> Result<Self> {
        Self::from_measurement(measurement, Local::now().naive_local())
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// CONNECTION-LEVEL OPERATIONS
// ============================================================================

/// Create the schema. Safe to call on every startup.
pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bmi_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user TEXT NOT NULL,
            weight REAL NOT NULL,
            height REAL NOT NULL,
            bmi REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bmi_history_user ON bmi_history(user)",
        [],
    )?;

    Ok(())
}

/// Insert a record and return its row id. Existing rows are never touched.
pub fn insert_record(conn: &Connection, record: &BmiRecord) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO bmi_history (user, weight, height, bmi, category, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.user,
            record.weight,
            record.height,
            record.bmi,
            record.category.as_str(),
            record.formatted_timestamp(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// All records for `user` in the order they were appended.
///
/// Row ids only grow, so this stays correct when the wall clock steps back.
pub fn get_records_by_user(conn: &Connection, user: &str) -> rusqlite::Result<Vec<BmiRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user, weight, height, bmi, category, date
         FROM bmi_history
         WHERE user = ?1
         ORDER BY id ASC",
    )?;

    let records = stmt
        .query_map([user], |row| {
            let category_str: String = row.get(5)?;
            let date_str: String = row.get(6)?;

            // Labels written by older builds may not parse; keep the row readable
            let category = category_str.parse().unwrap_or(Category::Unknown);
            let timestamp = NaiveDateTime::parse_from_str(&date_str, TIMESTAMP_FORMAT)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;

            Ok(BmiRecord {
                id: Some(row.get(0)?),
                user: row.get(1)?,
                weight: row.get(2)?,
                height: row.get(3)?,
                bmi: row.get(4)?,
                category,
                timestamp,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

pub fn count_records(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM bmi_history", [], |row| row.get(0))
}

// ============================================================================
// RECORD STORE HANDLE
// ============================================================================

/// File-backed record store.
///
/// The handle only remembers where the database lives; every operation opens
/// its own connection and closes it before returning.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Open (and if needed create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = RecordStore {
            path: path.as_ref().to_path_buf(),
        };

        let conn = store.connect()?;
        setup_database(&conn).map_err(|e| store.unavailable(e))?;
        info!(path = %store.path.display(), "record store ready");

        Ok(store)
    }

    /// Create the parent directory first, then `open`.
    pub fn open_with_parent(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| BmiError::StorageUnavailable {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        }

        Self::open(path)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path).map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, source: impl Into<StorageCause>) -> BmiError {
        BmiError::StorageUnavailable {
            path: self.path.clone(),
            source: source.into(),
        }
    }

    pub fn append(&self, record: &BmiRecord) -> Result<i64> {
        let conn = self.connect()?;
        let id = insert_record(&conn, record).map_err(|e| self.unavailable(e))?;
        debug!(id, user = %record.user, bmi = record.bmi, "appended record");
        Ok(id)
    }

    pub fn query_by_user(&self, user: &str) -> Result<Vec<BmiRecord>> {
        let conn = self.connect()?;
        let records = get_records_by_user(&conn, user).map_err(|e| self.unavailable(e))?;
        debug!(user, count = records.len(), "queried records");
        Ok(records)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        count_records(&conn).map_err(|e| self.unavailable(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn create_test_record(user: &str, weight: f64, height: f64, when: NaiveDateTime) -> BmiRecord {
        let measurement = Measurement {
            user: user.to_string(),
            weight,
            height,
        };
        BmiRecord::from_measurement(&measurement, when).unwrap()
    }

    #[test]
    fn test_record_derives_bmi_and_category() {
        let record = create_test_record("alice", 70.0, 175.0, at(1, 9));
        assert_eq!(record.bmi, 22.86);
        assert_eq!(record.category, Category::Normal);
        assert_eq!(record.id, None);
        assert_eq!(record.formatted_timestamp(), "2024-03-01 09:00:00");
    }

    #[test]
    fn test_timestamp_truncated_to_seconds() {
        let precise = at(1, 9).with_nanosecond(123_456_789).unwrap();
        let record = create_test_record("alice", 70.0, 175.0, precise);
        assert_eq!(record.timestamp, at(1, 9));
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        insert_record(&conn, &create_test_record("alice", 70.0, 175.0, at(1, 9))).unwrap();

        setup_database(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'bmi_history'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
        assert_eq!(count_records(&conn).unwrap(), 1);
    }

    #[test]
    fn test_insert_and_query_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let first = create_test_record("alice", 70.0, 175.0, at(1, 9));
        let second = create_test_record("alice", 95.0, 170.0, at(2, 9));
        let other = create_test_record("bob", 50.0, 180.0, at(1, 10));

        let id1 = insert_record(&conn, &first).unwrap();
        insert_record(&conn, &other).unwrap();
        let id2 = insert_record(&conn, &second).unwrap();
        assert!(id2 > id1);

        let records = get_records_by_user(&conn, "alice").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], BmiRecord { id: Some(id1), ..first });
        assert_eq!(records[1], BmiRecord { id: Some(id2), ..second });
    }

    #[test]
    fn test_query_keeps_append_order_when_clock_steps_back() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let before = at(27, 1).with_minute(50).unwrap();
        let after_fall_back = at(27, 1).with_minute(10).unwrap();
        insert_record(&conn, &create_test_record("alice", 70.0, 175.0, before)).unwrap();
        insert_record(&conn, &create_test_record("alice", 80.0, 175.0, after_fall_back)).unwrap();
        // Same second as the previous entry
        insert_record(&conn, &create_test_record("alice", 81.0, 175.0, after_fall_back)).unwrap();

        let weights: Vec<f64> = get_records_by_user(&conn, "alice")
            .unwrap()
            .iter()
            .map(|r| r.weight)
            .collect();
        assert_eq!(weights, vec![70.0, 80.0, 81.0]);
    }

    #[test]
    fn test_unknown_user_is_empty_not_error() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        assert!(get_records_by_user(&conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bmi_data.db");

        let store = RecordStore::open(&path).unwrap();
        store
            .append(&create_test_record("alice", 70.0, 175.0, at(1, 9)))
            .unwrap();
        drop(store);

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        let records = reopened.query_by_user("alice").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bmi, 22.86);
    }

    #[test]
    fn test_unopenable_store_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("bmi_data.db");

        let err = RecordStore::open(&path).unwrap_err();
        assert!(matches!(err, BmiError::StorageUnavailable { .. }));
    }

    #[test]
    fn test_store_failing_after_open_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("gone")).unwrap();
        let store = RecordStore::open(dir.path().join("gone").join("bmi_data.db")).unwrap();
        std::fs::remove_dir_all(dir.path().join("gone")).unwrap();

        let record = create_test_record("alice", 70.0, 175.0, at(1, 9));
        assert!(matches!(
            store.append(&record),
            Err(BmiError::StorageUnavailable { source: StorageCause::Sqlite(_), .. })
        ));
        assert!(matches!(
            store.query_by_user("alice"),
            Err(BmiError::StorageUnavailable { .. })
        ));
        assert!(store.count().is_err());
    }

    #[test]
    fn test_open_with_parent_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bmi_data.db");

        let store = RecordStore::open_with_parent(&path).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(path.is_file());
    }

    #[test]
    fn test_open_with_parent_blocked_by_file_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let err = RecordStore::open_with_parent(blocker.join("bmi_data.db")).unwrap_err();
        assert!(matches!(
            err,
            BmiError::StorageUnavailable { source: StorageCause::Io(_), .. }
        ));
    }

    #[test]
    fn test_record_serializes_with_storage_timestamp() {
        let record = create_test_record("alice", 70.0, 175.0, at(1, 9));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], "2024-03-01 09:00:00");
        assert_eq!(json["category"], "Normal");
        assert!(json.get("id").is_none());
    }
}
