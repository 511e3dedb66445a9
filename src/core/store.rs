// Whole-file document persistence with a sidecar advisory lock and atomic replace.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use libc::{EACCES, EPERM};
use tracing::{debug, warn};

use crate::core::document::Document;
use crate::core::error::{Error, ErrorKind};
use crate::core::paths::{lock_path_for, temp_path_for};
use crate::json::parse;

#[derive(Clone, Debug)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Creates the file holding `{table: []}` when nothing exists yet.
    pub fn ensure_exists(&self, table: &str) -> Result<(), Error> {
        if self.exists() {
            return Ok(());
        }
        self.ensure_parent_dir()?;
        debug!(path = %self.path.display(), table, "creating document");
        self.write_all(&Document::with_table(table))
    }

    pub fn read_all(&self) -> Result<Document, Error> {
        let text = fs::read_to_string(&self.path).map_err(|err| io_error(&self.path, err))?;
        let document = decode_document(&text, &self.path)?;
        debug!(path = %self.path.display(), tables = document.len(), "read document");
        Ok(document)
    }

    pub fn write_all(&self, document: &Document) -> Result<(), Error> {
        let encoded = serde_json::to_vec(document).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode document")
                .with_path(&self.path)
                .with_source(err)
        })?;

        let temp = temp_path_for(&self.path);
        let replaced = write_synced(&temp, &encoded)
            .map_err(|err| io_error(&temp, err))
            .and_then(|()| fs::rename(&temp, &self.path).map_err(|err| io_error(&self.path, err)));
        if let Err(err) = replaced {
            match fs::remove_file(&temp) {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    warn!(path = %temp.display(), error = %cleanup, "failed to remove temp file");
                }
                _ => {}
            }
            return Err(err);
        }

        debug!(
            path = %self.path.display(),
            tables = document.len(),
            bytes = encoded.len(),
            "wrote document"
        );
        Ok(())
    }

    /// Truncates the file to empty content. All tables are lost.
    pub fn clear(&self) -> Result<(), Error> {
        self.ensure_parent_dir()?;
        File::create(&self.path).map_err(|err| io_error(&self.path, err))?;
        debug!(path = %self.path.display(), "cleared document");
        Ok(())
    }

    /// Exclusive advisory lock held for one read-modify-write cycle.
    pub fn lock(&self) -> Result<StoreLock, Error> {
        self.ensure_parent_dir()?;
        let lock_path = lock_path_for(&self.path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|err| io_error(&lock_path, err))?;
        file.lock_exclusive().map_err(|err| {
            Error::new(lock_error_kind(&err))
                .with_message("failed to lock document")
                .with_path(&lock_path)
                .with_source(err)
        })?;
        Ok(StoreLock { file })
    }

    fn ensure_parent_dir(&self) -> Result<(), Error> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|err| io_error(parent, err))
            }
            _ => Ok(()),
        }
    }
}

pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn decode_document(text: &str, path: &Path) -> Result<Document, Error> {
    if text.trim().is_empty() {
        warn!(path = %path.display(), "document is empty; starting from no tables");
        return Ok(Document::new());
    }
    let decoded: Option<Document> = parse::from_str(text).map_err(|err| {
        let hint = parse::hint_for_error(
            &err,
            "document",
            "an object mapping table names to arrays of objects",
        );
        Error::new(ErrorKind::Corrupt)
            .with_message("document is not a JSON object of record arrays")
            .with_hint(hint)
            .with_path(path)
            .with_source(err)
    })?;
    Ok(decoded.unwrap_or_default())
}

fn io_error(path: &Path, err: io::Error) -> Error {
    let kind = match err.kind() {
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    };
    Error::new(kind).with_path(path).with_source(err)
}

fn lock_error_kind(err: &io::Error) -> ErrorKind {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM {
        return ErrorKind::Permission;
    }
    match err.kind() {
        io::ErrorKind::WouldBlock => ErrorKind::Busy,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentStore;
    use crate::core::document::Document;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn ensure_exists_writes_single_empty_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("nested").join("db.json"));
        store.ensure_exists("users").expect("ensure");

        let text = std::fs::read_to_string(store.path()).expect("read");
        assert_eq!(text, r#"{"users":[]}"#);
        assert_eq!(store.read_all().expect("read_all"), Document::with_table("users"));
    }

    #[test]
    fn ensure_exists_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));
        std::fs::write(store.path(), r#"{"posts":[{"id":1}]}"#).expect("seed");

        store.ensure_exists("users").expect("ensure");
        let document = store.read_all().expect("read");
        assert!(document.contains_table("posts"));
        assert!(!document.contains_table("users"));
    }

    #[test]
    fn corrupt_content_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));
        std::fs::write(store.path(), "{not json").expect("seed");

        let err = store.read_all().expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(err.hint().unwrap_or_default().contains("parse category: syntax"));
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));
        std::fs::write(store.path(), r#"{"users": {"id": 1}}"#).expect("seed");

        let err = store.read_all().expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(err.hint().unwrap_or_default().contains("parse category: data"));
    }

    #[test]
    fn empty_and_null_content_read_as_empty_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));

        std::fs::write(store.path(), "  \n").expect("seed");
        assert!(store.read_all().expect("read").is_empty());

        std::fs::write(store.path(), "null").expect("seed");
        assert!(store.read_all().expect("read").is_empty());
    }

    #[test]
    fn write_all_replaces_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));
        store.ensure_exists("users").expect("ensure");

        let mut document = Document::new();
        document.replace_table(
            "users",
            vec![json!({"id": 1}).as_object().cloned().expect("object")],
        );
        store.write_all(&document).expect("write");

        assert_eq!(store.read_all().expect("read"), document);
        assert!(!dir.path().join("db.json.tmp").exists());
    }

    #[test]
    fn failed_replace_removes_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("db.json");
        std::fs::create_dir(&target).expect("dir in place of file");
        std::fs::write(target.join("keep"), b"x").expect("populate");
        let store = DocumentStore::new(target.clone());

        let err = store
            .write_all(&Document::with_table("users"))
            .expect_err("rename onto directory");
        assert_eq!(err.path(), Some(target.as_path()));
        assert!(!dir.path().join("db.json.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn clear_truncates_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));
        store.ensure_exists("users").expect("ensure");

        store.clear().expect("clear");
        let text = std::fs::read_to_string(store.path()).expect("read");
        assert!(text.is_empty());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(dir.path().join("db.json"));
        {
            let _lock = store.lock().expect("first lock");
        }
        let _lock = store.lock().expect("second lock");
        assert!(dir.path().join("db.json.lock").exists());
    }

    #[test]
    fn lock_errors_map_to_expected_kinds() {
        let err = std::io::Error::from_raw_os_error(libc::EAGAIN);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Busy);

        let err = std::io::Error::from_raw_os_error(libc::EACCES);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Permission);

        let err = std::io::Error::from_raw_os_error(libc::EPERM);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Permission);

        let err = std::io::Error::from_raw_os_error(libc::EBADF);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Io);
    }
}
