//! File-based shard backend.

use crate::backend::ShardBackend;
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix for in-flight writes. Blobs carrying it are never listed.
const TEMP_SUFFIX: &str = ".tmp";

/// A shard backend over a flat directory.
///
/// Each blob is one regular file directly inside the directory.
/// Subdirectories are ignored.
///
/// # Durability
///
/// `write` goes to `<name>.tmp`, is synced with `File::sync_all()`, and is
/// then renamed over the target. A crash mid-write leaves either the old
/// or the new contents, never a truncated file.
///
/// # Example
///
/// ```no_run
/// use yarndb_storage::{FileBackend, ShardBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("data")).unwrap();
/// backend.write("records_default.yaml", b"{}\n").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Opens a backend rooted at an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        let meta = fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", root.display()),
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Opens a backend, creating the directory (and parents) if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_create_dirs(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Self::open(root)
    }

    /// Returns the backend's directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the full path a blob is stored at.
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn checked_path(&self, name: &str) -> StorageResult<PathBuf> {
        let plain = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != ".."
            && !name.ends_with(TEMP_SUFFIX);
        if !plain {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.path_of(name))
    }
}

impl ShardBackend for FileBackend {
    fn list(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Non-UTF-8 names cannot be shard names.
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.checked_path(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::blob_io(name, e),
        })
    }

    fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.checked_path(name)?;
        let temp = self.root.join(format!("{name}{TEMP_SUFFIX}"));

        let result = (|| -> io::Result<()> {
            let mut file: File = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&temp, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::blob_io(name, e));
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let path = self.checked_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::blob_io(name, e)),
        }
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.checked_path(name)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write("records_a.yaml", b"a: 1\n").unwrap();
        assert_eq!(backend.read("records_a.yaml").unwrap(), b"a: 1\n");
    }

    #[test]
    fn write_replaces_contents() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write("s.yaml", b"a much longer first version").unwrap();
        backend.write("s.yaml", b"short").unwrap();
        assert_eq!(backend.read("s.yaml").unwrap(), b"short");
    }

    #[test]
    fn list_is_sorted_and_skips_dirs_and_temps() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write("b.yaml", b"").unwrap();
        backend.write("a.yaml", b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("c.yaml.tmp"), b"partial").unwrap();

        assert_eq!(backend.list().unwrap(), vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        let result = backend.read("missing.yaml");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.remove("missing.yaml").unwrap();
        backend.write("x.yaml", b"x").unwrap();
        backend.remove("x.yaml").unwrap();
        assert!(!backend.exists("x.yaml").unwrap());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        for name in ["", "../escape.yaml", "a/b.yaml", "x.yaml.tmp"] {
            let result = backend.write(name, b"");
            assert!(matches!(result, Err(StorageError::InvalidName(_))), "{name}");
        }
    }

    #[test]
    fn open_with_create_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("a").join("b");

        let backend = FileBackend::open_with_create_dirs(&root).unwrap();
        assert!(backend.list().unwrap().is_empty());
        assert!(root.is_dir());
    }

    #[test]
    fn open_rejects_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"").unwrap();

        assert!(FileBackend::open(&file).is_err());
    }

    #[test]
    fn persistence_across_instances() {
        let dir = tempdir().unwrap();
        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.write("keep.yaml", b"persistent data").unwrap();
        }
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.read("keep.yaml").unwrap(), b"persistent data");
    }
}
