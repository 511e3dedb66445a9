//! Purpose: Storage path resolution from the configured directory and file name.
//! Exports: `resolve_db_path`, `lock_path_for`, `temp_path_for`.
//! Role: Keep library and CLI path semantics aligned from one source.
//! Invariants: Exactly one separator joins the directory and the file name.
//! Invariants: Sidecar files live next to the document so renames stay on one filesystem.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub fn resolve_db_path(db_path: &str, db_name: &str) -> PathBuf {
    let dir = db_path.trim_end_matches('/');
    let name = db_name.trim_start_matches('/');
    if db_path.is_empty() {
        return PathBuf::from(name);
    }
    PathBuf::from(format!("{dir}/{name}"))
}

pub fn lock_path_for(path: &Path) -> PathBuf {
    sidecar(path, ".lock")
}

pub fn temp_path_for(path: &Path) -> PathBuf {
    sidecar(path, ".tmp")
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("database"));
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::{lock_path_for, resolve_db_path, temp_path_for};
    use std::path::{Path, PathBuf};

    #[test]
    fn separators_are_normalized() {
        let expected = PathBuf::from("/var/data/db.json");
        assert_eq!(resolve_db_path("/var/data", "db.json"), expected);
        assert_eq!(resolve_db_path("/var/data/", "db.json"), expected);
        assert_eq!(resolve_db_path("/var/data//", "/db.json"), expected);
    }

    #[test]
    fn empty_directory_is_relative() {
        assert_eq!(resolve_db_path("", "db.json"), PathBuf::from("db.json"));
    }

    #[test]
    fn root_directory_keeps_single_separator() {
        assert_eq!(resolve_db_path("/", "db.json"), PathBuf::from("/db.json"));
    }

    #[test]
    fn sidecars_sit_next_to_document() {
        let path = Path::new("/var/data/db.json");
        assert_eq!(lock_path_for(path), PathBuf::from("/var/data/db.json.lock"));
        assert_eq!(temp_path_for(path), PathBuf::from("/var/data/db.json.tmp"));
    }
}
