//! Local filesystem [`super::ObjectStore`], grown from
//! `file_storage::local::LocalBackend`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{ObjectMeta, ObjectStore, StoreError, StoreResult};

/// Stores every log artifact under a single root directory on local disk.
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_err(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            reason: source.to_string(),
        }
    }

    fn list_recursive(dir: &Path, out: &mut Vec<ObjectMeta>) -> StoreResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Self::io_err(dir, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| Self::io_err(dir, e))?;
            let path = entry.path();
            let metadata = entry.metadata().map_err(|e| Self::io_err(&path, e))?;
            if metadata.is_dir() {
                Self::list_recursive(&path, out)?;
                continue;
            }
            let modification_time_millis = metadata
                .modified()
                .map_err(|e| Self::io_err(&path, e))
                .map(system_time_to_millis)?;
            out.push(ObjectMeta {
                path,
                modification_time_millis,
                size: metadata.len(),
            });
        }
        Ok(())
    }
}

fn system_time_to_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

impl ObjectStore for LocalObjectStore {
    fn list(&self, prefix: &Path) -> StoreResult<Vec<ObjectMeta>> {
        let mut out = Vec::new();
        Self::list_recursive(prefix, &mut out)?;
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn delete(&self, path: &Path) -> StoreResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_err(path, e)),
        }
    }

    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(path.exists())
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(parent, e))?;
        }
        fs::write(path, bytes).map_err(|e| Self::io_err(path, e))
    }

    fn read(&self, path: &Path) -> StoreResult<Vec<u8>> {
        fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.display().to_string())
            } else {
                Self::io_err(path, e)
            }
        })
    }

    fn set_modification_time(&self, path: &Path, millis: i64) -> StoreResult<()> {
        let time = if millis >= 0 {
            UNIX_EPOCH + Duration::from_millis(millis as u64)
        } else {
            UNIX_EPOCH - Duration::from_millis((-millis) as u64)
        };
        let file = fs::File::options()
            .write(true)
            .open(path)
            .map_err(|e| Self::io_err(path, e))?;
        file.set_modified(time).map_err(|e| Self::io_err(path, e))
    }
}
