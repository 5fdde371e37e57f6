//! Shared harness for building synthetic log directories, equivalent in
//! role to `tests/crash/harness.rs` for the teacher's crash tests: the
//! scenario tests below only describe absolute modification times and
//! artifact shapes, never raw path construction.
//!
//! All `mod_time_millis` arguments are absolute epoch millis, not ages:
//! callers compute them relative to whatever `now` the scenario uses.

use std::path::{Path, PathBuf};

use logkeep::codec;
use logkeep::model::{Action, ProtocolDescriptor};
use logkeep::protection::ChecksumRecord;
use logkeep::store::{LocalObjectStore, ObjectStore};
use tempfile::TempDir;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// A temp-dir-backed log root with a store already pointed at it.
pub struct TestLog {
    pub temp: TempDir,
    pub store: LocalObjectStore,
}

impl TestLog {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = LocalObjectStore::new(temp.path().to_path_buf());
        Self { temp, store }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn write_commit(&self, version: u64, mod_time_millis: i64) {
        let path = codec::commit_path(self.root(), version);
        self.store.write(&path, b"{}").unwrap();
        self.store.set_modification_time(&path, mod_time_millis).unwrap();
    }

    pub fn write_staged_commit(&self, version: u64, mod_time_millis: i64) {
        let path = self
            .root()
            .join(codec::STAGED_COMMITS_DIR)
            .join(format!("{:020}.json", version));
        self.store.write(&path, b"{}").unwrap();
        self.store.set_modification_time(&path, mod_time_millis).unwrap();
    }

    pub fn write_checksum(&self, version: u64, protocol: Option<ProtocolDescriptor>, mod_time_millis: i64) {
        let path = codec::checksum_path(self.root(), version);
        let record = ChecksumRecord { version, protocol };
        self.store.write(&path, serde_json::to_vec(&record).unwrap().as_slice()).unwrap();
        self.store.set_modification_time(&path, mod_time_millis).unwrap();
    }

    pub fn write_classic_checkpoint(&self, version: u64, mod_time_millis: i64) -> PathBuf {
        let path = codec::compat_classic_checkpoint_path(self.root(), version);
        self.store.write(&path, b"[]").unwrap();
        self.store.set_modification_time(&path, mod_time_millis).unwrap();
        path
    }

    pub fn write_v2_checkpoint_json(&self, version: u64, sidecars: &[&str], mod_time_millis: i64) -> PathBuf {
        let index = logkeep::compat::V2CheckpointIndex {
            sidecars: sidecars.iter().map(|s| s.to_string()).collect(),
            actions: vec![Action(serde_json::json!({"add": {"path": format!("p-{version}")}}))],
        };
        let path = self.root().join(format!("{:020}.checkpoint.v2.json", version));
        self.store.write(&path, serde_json::to_vec(&index).unwrap().as_slice()).unwrap();
        self.store.set_modification_time(&path, mod_time_millis).unwrap();
        path
    }

    pub fn write_sidecar(&self, name: &str, mod_time_millis: i64) -> PathBuf {
        let path = self.root().join(codec::SIDECARS_DIR).join(name);
        self.store.write(&path, b"part").unwrap();
        self.store.set_modification_time(&path, mod_time_millis).unwrap();
        path
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.store.exists(path).unwrap()
    }
}
