use crate::domain::JournalNote;
use rusqlite::{Connection, params};
use sqlx::Connection as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

static NOTES_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum NoteStoreError {
    #[error(transparent)]
    ResolveStateDir(#[from] super::ResolveStateDirError),

    #[error("failed to create notes state dir {path}: {source}")]
    CreateStateDir { path: String, source: io::Error },

    #[error("failed to run notes migrations: {0}")]
    Migrate(String),

    #[error("failed to open notes DB at {path}: {source}")]
    OpenDb {
        path: String,
        source: rusqlite::Error,
    },

    #[error("failed to query notes DB: {0}")]
    Query(#[from] rusqlite::Error),
}

/// The `journal_notes` collection. Create/update/delete assign timestamps at
/// write time; callers never pass a timestamp in.
#[derive(Clone, Debug)]
pub struct NoteStore {
    db_path: PathBuf,
}

impl NoteStore {
    pub fn open_default() -> Result<Self, NoteStoreError> {
        let db_path = super::resolve_notes_db_path()?;
        Self::open(db_path)
    }

    pub fn open(db_path: PathBuf) -> Result<Self, NoteStoreError> {
        ensure_notes_db_ready(&db_path)?;
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// All notes owned by `uid`, newest creation first. The caller displays
    /// this list as-is; ordering lives here, not in the view.
    pub fn list_notes(&self, uid: &str) -> Result<Vec<JournalNote>, NoteStoreError> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT id, uid, text, created_at_unix_ms, updated_at_unix_ms \
             FROM journal_notes WHERE uid = ?1 \
             ORDER BY created_at_unix_ms DESC, id DESC",
        )?;

        let rows = stmt.query_map([uid], |row| {
            let id: String = row.get(0)?;
            let uid: String = row.get(1)?;
            let text: String = row.get(2)?;
            let created_at_ms: Option<i64> = row.get(3)?;
            let updated_at_ms: Option<i64> = row.get(4)?;
            Ok(JournalNote {
                id,
                uid,
                text,
                created_at: unix_ms_to_system_time(created_at_ms),
                updated_at: unix_ms_to_system_time(updated_at_ms),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn create_note(&self, uid: &str, text: &str) -> Result<String, NoteStoreError> {
        let conn = self.connection()?;
        let now_ms = system_time_to_unix_ms(SystemTime::now());
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO journal_notes (id, uid, text, created_at_unix_ms, updated_at_unix_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, uid, text, now_ms, now_ms],
        )?;

        Ok(id)
    }

    /// Replaces the text and refreshes the update timestamp. The creation
    /// timestamp is immutable, so the note keeps its list position.
    pub fn update_note(&self, id: &str, text: &str) -> Result<bool, NoteStoreError> {
        let conn = self.connection()?;
        let now_ms = system_time_to_unix_ms(SystemTime::now());

        let affected = conn.execute(
            "UPDATE journal_notes SET text = ?2, updated_at_unix_ms = ?3 WHERE id = ?1",
            params![id, text, now_ms],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_note(&self, id: &str) -> Result<bool, NoteStoreError> {
        let conn = self.connection()?;
        let affected = conn.execute("DELETE FROM journal_notes WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Profile record written once at registration, keyed by the new uid.
    pub fn write_profile(&self, uid: &str, name: &str, email: &str) -> Result<(), NoteStoreError> {
        let conn = self.connection()?;
        let now_ms = system_time_to_unix_ms(SystemTime::now());

        conn.execute(
            "INSERT INTO profiles (uid, name, email, created_at_unix_ms) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(uid) DO UPDATE SET name = excluded.name, email = excluded.email",
            params![uid, name, email, now_ms],
        )?;
        Ok(())
    }

    fn connection(&self) -> Result<Connection, NoteStoreError> {
        let conn = Connection::open(&self.db_path).map_err(|error| NoteStoreError::OpenDb {
            path: self.db_path.display().to_string(),
            source: error,
        })?;
        let _ = conn.busy_timeout(Duration::from_millis(250));
        Ok(conn)
    }
}

fn ensure_notes_db_ready(db_path: &Path) -> Result<(), NoteStoreError> {
    let parent = db_path.parent().unwrap_or(db_path);
    fs::create_dir_all(parent).map_err(|error| NoteStoreError::CreateStateDir {
        path: parent.display().to_string(),
        source: error,
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|error| NoteStoreError::Migrate(error.to_string()))?;

    runtime
        .block_on(async {
            let options = sqlx::sqlite::SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true);
            let mut conn = sqlx::SqliteConnection::connect_with(&options)
                .await
                .map_err(|error| error.to_string())?;

            NOTES_MIGRATOR
                .run(&mut conn)
                .await
                .map_err(|error| error.to_string())?;

            Ok::<(), String>(())
        })
        .map_err(NoteStoreError::Migrate)?;

    Ok(())
}

fn unix_ms_to_system_time(ms: Option<i64>) -> Option<SystemTime> {
    match ms {
        Some(ms) if ms > 0 => Some(UNIX_EPOCH + Duration::from_millis(ms as u64)),
        _ => None,
    }
}

fn system_time_to_unix_ms(time: SystemTime) -> i64 {
    let delta = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(delta.as_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use tempfile::tempdir;

    #[test]
    fn create_list_update_delete_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        let id = store.create_note("u1", "hello").expect("create");

        let notes = store.list_notes("u1").expect("list");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, id);
        assert_eq!(notes[0].text, "hello");
        assert!(notes[0].created_at.is_some());
        assert!(notes[0].updated_at.is_some());

        assert!(store.update_note(&id, "hello again").expect("update"));
        let notes = store.list_notes("u1").expect("list after edit");
        assert_eq!(notes[0].text, "hello again");

        assert!(store.delete_note(&id).expect("delete"));
        assert!(store.list_notes("u1").expect("list after delete").is_empty());
    }

    #[test]
    fn list_is_filtered_by_owner() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        store.create_note("alice", "mine").expect("create");
        store.create_note("bob", "theirs").expect("create");

        let notes = store.list_notes("alice").expect("list");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].uid, "alice");
        assert_eq!(notes[0].text, "mine");
    }

    #[test]
    fn list_orders_by_creation_descending() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        store.create_note("u1", "older").expect("create");
        sleep(Duration::from_millis(5));
        store.create_note("u1", "newer").expect("create");

        let notes = store.list_notes("u1").expect("list");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].text, "newer");
        assert_eq!(notes[1].text, "older");
    }

    #[test]
    fn edit_keeps_list_position() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        let first = store.create_note("u1", "first").expect("create");
        sleep(Duration::from_millis(5));
        store.create_note("u1", "second").expect("create");

        sleep(Duration::from_millis(5));
        assert!(store.update_note(&first, "first edited").expect("update"));

        let notes = store.list_notes("u1").expect("list");
        assert_eq!(notes[0].text, "second");
        assert_eq!(notes[1].text, "first edited");
        assert!(notes[1].updated_at > notes[1].created_at);
    }

    #[test]
    fn delete_unknown_id_reports_false() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");
        assert!(!store.delete_note("no-such-id").expect("delete"));
        assert!(!store.update_note("no-such-id", "text").expect("update"));
    }

    #[test]
    fn write_profile_upserts_by_uid() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        store.write_profile("u1", "Ada", "ada@x.com").expect("write");
        store
            .write_profile("u1", "Ada L", "ada@x.com")
            .expect("rewrite");
    }
}
