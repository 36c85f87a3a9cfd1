use crate::domain::JournalNote;
use crate::infra::{NoteStore, WatchSignal, watch_notes_db};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::time::Duration;
use thiserror::Error;

/// Pushed by a live subscription. Every `Snapshot` carries the complete
/// current result set for the subscribed owner; the receiver replaces its
/// list wholesale and never merges.
#[derive(Clone, Debug)]
pub enum NotesSignal {
    Snapshot(Vec<JournalNote>),
    Error(String),
}

#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Watch(#[from] super::WatchNotesDbError),
}

/// Live query over "all notes owned by `uid`, newest first".
///
/// An initial snapshot is pushed immediately; afterwards every change to the
/// DB family triggers a requery and a fresh full snapshot. Dropping the
/// subscription stops the worker and releases the filesystem watch.
#[derive(Debug)]
pub struct NotesSubscription {
    uid: String,
    rx: Receiver<NotesSignal>,
    stop: Arc<AtomicBool>,
}

impl NotesSubscription {
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn try_recv(&self) -> Option<NotesSignal> {
        self.rx.try_recv().ok()
    }
}

impl Drop for NotesSubscription {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

pub fn subscribe_notes(store: NoteStore, uid: String) -> Result<NotesSubscription, SubscribeError> {
    let watcher = watch_notes_db(store.db_path())?;

    // Capacity 1 keeps at most one pending snapshot; an intermediate state
    // is superseded by the next full snapshot anyway.
    let (tx, rx) = sync_channel::<NotesSignal>(1);
    let stop = Arc::new(AtomicBool::new(false));

    let worker_uid = uid.clone();
    let worker_stop = stop.clone();
    std::thread::spawn(move || run_subscription(store, worker_uid, watcher, tx, worker_stop));

    Ok(NotesSubscription { uid, rx, stop })
}

fn run_subscription(
    store: NoteStore,
    uid: String,
    watcher: crate::infra::NotesDbWatcher,
    tx: SyncSender<NotesSignal>,
    stop: Arc<AtomicBool>,
) {
    let debounce = Duration::from_millis(150);

    if push_snapshot(&store, &uid, &tx).is_err() {
        return;
    }

    loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }

        let Some(signal) = watcher.recv_timeout(Duration::from_millis(250)) else {
            continue;
        };

        match signal {
            WatchSignal::Changed => {
                // Swallow the burst of events a single write produces. The
                // drain is bounded so a continuously-changing DB family can
                // neither starve snapshot pushes nor delay teardown.
                for _ in 0..8 {
                    if stop.load(Ordering::Relaxed) {
                        return;
                    }
                    if watcher.recv_timeout(debounce).is_none() {
                        break;
                    }
                }
                if push_snapshot(&store, &uid, &tx).is_err() {
                    return;
                }
            }
            WatchSignal::Error(message) => {
                if tx.send(NotesSignal::Error(message)).is_err() {
                    return;
                }
            }
        }
    }
}

fn push_snapshot(store: &NoteStore, uid: &str, tx: &SyncSender<NotesSignal>) -> Result<(), ()> {
    let signal = match store.list_notes(uid) {
        Ok(notes) => NotesSignal::Snapshot(notes),
        Err(error) => NotesSignal::Error(error.to_string()),
    };
    tx.send(signal).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn wait_for_snapshot(sub: &NotesSubscription, timeout: Duration) -> Option<Vec<JournalNote>> {
        let deadline = std::time::Instant::now() + timeout;
        let mut latest = None;
        loop {
            while let Some(signal) = sub.try_recv() {
                if let NotesSignal::Snapshot(notes) = signal {
                    latest = Some(notes);
                }
            }
            if latest.is_some() || std::time::Instant::now() >= deadline {
                return latest;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn subscription_pushes_initial_snapshot() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");
        store.create_note("u1", "pre-existing").expect("create");

        let sub = subscribe_notes(store, "u1".to_string()).expect("subscribe");
        let notes = wait_for_snapshot(&sub, Duration::from_secs(2)).expect("snapshot");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "pre-existing");
    }

    #[test]
    fn snapshot_excludes_other_owners() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");
        store.create_note("u1", "mine").expect("create");
        store.create_note("u2", "not mine").expect("create");

        let sub = subscribe_notes(store, "u1".to_string()).expect("subscribe");
        let notes = wait_for_snapshot(&sub, Duration::from_secs(2)).expect("snapshot");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].uid, "u1");
    }

    #[test]
    fn burst_of_writes_still_yields_a_full_snapshot() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        let sub = subscribe_notes(store.clone(), "u1".to_string()).expect("subscribe");
        wait_for_snapshot(&sub, Duration::from_secs(2)).expect("initial");

        for index in 0..10 {
            store
                .create_note("u1", &format!("entry {index}"))
                .expect("create");
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(notes) = wait_for_snapshot(&sub, Duration::from_millis(200)) {
                if notes.len() == 10 {
                    return;
                }
            }
            assert!(
                std::time::Instant::now() < deadline,
                "no snapshot covering the whole burst arrived"
            );
        }
    }

    #[test]
    fn write_after_subscribe_produces_fresh_snapshot() {
        let dir = tempdir().expect("tempdir");
        let store = NoteStore::open(dir.path().join("notes.db")).expect("open");

        let sub = subscribe_notes(store.clone(), "u1".to_string()).expect("subscribe");
        let initial = wait_for_snapshot(&sub, Duration::from_secs(2)).expect("initial");
        assert!(initial.is_empty());

        store.create_note("u1", "hello").expect("create");

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(notes) = wait_for_snapshot(&sub, Duration::from_millis(200)) {
                if notes.len() == 1 {
                    assert_eq!(notes[0].text, "hello");
                    return;
                }
            }
            assert!(
                std::time::Instant::now() < deadline,
                "no snapshot with the new note arrived"
            );
        }
    }
}
