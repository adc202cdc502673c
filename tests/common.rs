//! Shared test helpers for the efivarstore integration tests.
#![allow(dead_code)]

use log::Level;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use efivarstore::logging::AuditSink;
use efivarstore::EfivarfsStore;

/// In-memory audit sink so tests can assert on diagnostics.
#[derive(Clone, Default, Debug)]
pub struct TestAudit {
    pub lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl AuditSink for TestAudit {
    fn log(&self, level: Level, msg: &str) {
        self.lines.lock().unwrap().push((level, msg.to_string()));
    }
}

impl TestAudit {
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

/// Scratch efivarfs root plus a couple of fake ESP mount points.
pub struct TestRoot {
    pub dir: tempfile::TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        for sub in ["efivars", "esp1", "esp2"] {
            std::fs::create_dir(dir.path().join(sub)).expect("mkdir");
        }
        Self { dir }
    }

    pub fn vars(&self) -> PathBuf {
        self.dir.path().join("efivars")
    }

    pub fn esp(&self, n: usize) -> PathBuf {
        self.dir.path().join(format!("esp{n}"))
    }

    pub fn store(&self) -> EfivarfsStore<TestAudit> {
        self.store_with(TestAudit::default())
    }

    pub fn store_with(&self, audit: TestAudit) -> EfivarfsStore<TestAudit> {
        EfivarfsStore::with_root(self.vars())
            .with_esp_paths(vec![self.esp(1), self.esp(2)])
            .with_read_delay(Duration::ZERO)
            .with_audit(audit)
    }
}

/// Raw on-disk bytes for a variable: native-order attributes then data.
pub fn raw_variable(attrs: u32, data: &[u8]) -> Vec<u8> {
    let mut v = attrs.to_ne_bytes().to_vec();
    v.extend_from_slice(data);
    v
}

/// Try to set the immutable bit on `path`; false when the filesystem or our
/// privileges do not allow it.
pub fn try_make_immutable(path: &Path) -> bool {
    let Ok(f) = std::fs::File::open(path) else {
        return false;
    };
    efivarstore::fs::set_fd_immutable(&f, true).is_ok() && is_immutable(path)
}

pub fn is_immutable(path: &Path) -> bool {
    std::fs::File::open(path)
        .ok()
        .and_then(|f| rustix::fs::ioctl_getflags(&f).ok())
        .is_some_and(|fl| fl.contains(rustix::fs::IFlags::IMMUTABLE))
}

/// Clear the immutable bit so the tempdir can be removed.
pub fn clear_immutable(path: &Path) {
    if let Ok(f) = std::fs::File::open(path) {
        let _ = efivarstore::fs::set_fd_immutable(&f, false);
    }
}
