use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

/// Watches a schema file for changes. Notifications arrive on the watcher's
/// backend thread and queue up until [`SchemaWatch::changed`] drains them.
pub struct SchemaWatch {
    path: PathBuf,
    file_name: Option<OsString>,
    rx: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl SchemaWatch {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

        // Editors often save by replacing the file, which drops a watch on the
        // file itself.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!(path = %path.display(), "watching schema file");

        Ok(Self {
            path: path.to_path_buf(),
            file_name: path.file_name().map(ToOwned::to_owned),
            rx,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains pending notifications; true when any of them touched the
    /// schema file.
    pub fn changed(&self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => changed |= self.concerns_schema(&event),
                Err(err) => warn!(error = %err, "schema watch error"),
            }
        }
        changed
    }

    fn concerns_schema(&self, event: &Event) -> bool {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
        ) {
            return false;
        }
        event
            .paths
            .iter()
            .any(|path| path.file_name().map(ToOwned::to_owned) == self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaWatch;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use notify::{Event, EventKind};
    use std::fs;

    #[test]
    fn only_writes_to_the_schema_file_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let schema = dir.path().join("form.yaml");
        fs::write(&schema, "type: object\nfields: {}\n").expect("write");
        let watch = SchemaWatch::new(&schema).expect("watch");

        let modified = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(schema.clone());
        assert!(watch.concerns_schema(&modified));

        let replaced = Event::new(EventKind::Create(CreateKind::File)).add_path(schema.clone());
        assert!(watch.concerns_schema(&replaced));

        let read = Event::new(EventKind::Access(AccessKind::Any)).add_path(schema);
        assert!(!watch.concerns_schema(&read));

        let other = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(dir.path().join("other.yaml"));
        assert!(!watch.concerns_schema(&other));
    }
}
