use notify::event::EventKind;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{Receiver, channel};
use thiserror::Error;

#[derive(Clone, Debug)]
pub enum WatchSignal {
    Changed,
    Error(String),
}

/// Filesystem watcher over the notes DB family (the db file plus its -wal
/// and -shm siblings). Any mutation of the family signals `Changed`.
#[derive(Debug)]
pub struct NotesDbWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<WatchSignal>,
}

impl NotesDbWatcher {
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<WatchSignal> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[derive(Debug, Error)]
pub enum WatchNotesDbError {
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("notes DB path has no parent directory")]
    NoParentDir,
}

pub fn watch_notes_db(db_path: &Path) -> Result<NotesDbWatcher, WatchNotesDbError> {
    let Some(parent_dir) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Err(WatchNotesDbError::NoParentDir);
    };
    let db_file_name = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .unwrap_or_default();

    let (tx, rx) = channel::<WatchSignal>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                if should_trigger_requery(&event, &db_file_name) {
                    let _ = tx.send(WatchSignal::Changed);
                }
            }
            Err(error) => {
                let _ = tx.send(WatchSignal::Error(error.to_string()));
            }
        },
        Config::default(),
    )?;

    watcher.watch(parent_dir, RecursiveMode::NonRecursive)?;

    Ok(NotesDbWatcher {
        _watcher: watcher,
        rx,
    })
}

fn should_trigger_requery(event: &notify::Event, db_file_name: &str) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    if event.paths.is_empty() {
        return true;
    }

    event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(db_file_name))
    })
}
