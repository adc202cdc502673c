//! efivarfs-backed [`VariableStore`].
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::Level;
use rustix::fs::Mode;
use uuid::Uuid;

use crate::constants::{DEFAULT_APPEND_MODE, ESP_CANDIDATES};
use crate::fs::mount::probe_efivarfs;
use crate::fs::paths::{efivarfs_root, path_for};
use crate::logging::{AuditSink, LogSink};
use crate::sync::{EspSync, SyncOutcome};
use crate::types::errors::{id_str, Result, VarError};
use crate::types::{VariableAttributes, VariableKey, VariableRecord};

use super::enumerate::list_variables;
use super::read::{read_variable, throttle_delay, variable_size};
use super::write::{delete_variable, proceed, stay, validate, write_variable, Interleave};
use super::VariableStore;

/// Variables stored as `<root>/<name>-<guid>` files on efivarfs.
#[derive(Debug)]
pub struct EfivarfsStore<A: AuditSink = LogSink> {
    root: PathBuf,
    esp_paths: Vec<PathBuf>,
    read_delay: Duration,
    audit: A,
}

impl EfivarfsStore<LogSink> {
    /// Store rooted at the process-wide efivarfs root (`EFIVARFS_PATH` or
    /// the sysfs default).
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(efivarfs_root())
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            esp_paths: ESP_CANDIDATES.iter().map(PathBuf::from).collect(),
            read_delay: throttle_delay(),
            audit: LogSink,
        }
    }
}

impl Default for EfivarfsStore<LogSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AuditSink> EfivarfsStore<A> {
    pub fn with_audit<B: AuditSink>(self, audit: B) -> EfivarfsStore<B> {
        EfivarfsStore {
            root: self.root,
            esp_paths: self.esp_paths,
            read_delay: self.read_delay,
            audit,
        }
    }

    /// Replace the ordered list of ESP mount points searched during sync.
    #[must_use]
    pub fn with_esp_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.esp_paths = paths;
        self
    }

    /// Override the per-read throttle derived from the effective uid.
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file of a variable.
    ///
    /// # Errors
    ///
    /// `PathTooLong` when the formatted path reaches `PATH_MAX`.
    pub fn path_for(&self, guid: &Uuid, name: &str) -> Result<PathBuf> {
        path_for(&self.root, guid, name)
    }

    /// Mirror `VarToFile` onto the ESP if the platform asks for it.
    ///
    /// Failures only degrade persistence and are logged, except a partial
    /// write of the ESP file, which terminates the process with status 1.
    pub fn sync_persistent(&self) -> Option<SyncOutcome> {
        let pass = EspSync {
            root: &self.root,
            esp_paths: &self.esp_paths,
            read_delay: self.read_delay,
            audit: &self.audit,
        };
        match pass.run() {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_fatal() => {
                self.audit.log(Level::Error, &format!("Error: {e}"));
                // Exiting here skips the write session's cleanup, so an
                // immutable bit cleared for this write stays cleared.
                std::process::exit(1);
            }
            Err(e) => {
                self.audit.log(Level::Warn, &format!("ESP sync skipped: {e}"));
                None
            }
        }
    }

    fn report(&self, op: &str, key: &str, res: &Result<()>) {
        match res {
            Ok(()) => self.audit.log(Level::Debug, &format!("{op} {key}: ok")),
            Err(e) => self.audit.log(
                Level::Debug,
                &format!("{op} {key} failed ({}): {e}", id_str(e.id())),
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_with_race_window<F: FnOnce(&Path)>(
        &self,
        guid: &Uuid,
        name: &str,
        data: &[u8],
        attributes: VariableAttributes,
        mode: u32,
        between_opens: F,
    ) -> Result<()> {
        self.set_inner(guid, name, data, attributes, mode, between_opens)
    }

    fn set_inner<F: FnOnce(&Path)>(
        &self,
        guid: &Uuid,
        name: &str,
        data: &[u8],
        attributes: VariableAttributes,
        mode: u32,
        between_opens: F,
    ) -> Result<()> {
        validate(name, data)?;
        let path = self.path_for(guid, name)?;
        let res = write_variable(
            &self.audit,
            &path,
            data,
            attributes,
            mode,
            Interleave {
                between_opens,
                after_write_open: proceed,
            },
            || {
                self.sync_persistent();
            },
        );
        self.report("set", &VariableKey::new(*guid, name).to_string(), &res);
        res
    }
}

impl<A: AuditSink> VariableStore for EfivarfsStore<A> {
    fn name(&self) -> &'static str {
        "efivarfs"
    }

    fn probe(&self) -> Result<()> {
        probe_efivarfs(&self.root)
    }

    fn get(&self, guid: &Uuid, name: &str) -> Result<VariableRecord> {
        let path = self.path_for(guid, name)?;
        read_variable(&path, self.read_delay)
    }

    fn set(
        &self,
        guid: &Uuid,
        name: &str,
        data: &[u8],
        attributes: VariableAttributes,
        mode: u32,
    ) -> Result<()> {
        self.set_inner(guid, name, data, attributes, mode, stay)
    }

    fn append(
        &self,
        guid: &Uuid,
        name: &str,
        data: &[u8],
        attributes: VariableAttributes,
    ) -> Result<()> {
        self.set(
            guid,
            name,
            data,
            attributes | VariableAttributes::APPEND_WRITE,
            DEFAULT_APPEND_MODE,
        )
    }

    fn delete(&self, guid: &Uuid, name: &str) -> Result<()> {
        let path = self.path_for(guid, name)?;
        let res = delete_variable(&path);
        // The mirror is refreshed whether or not the unlink went through.
        self.sync_persistent();
        self.report("delete", &VariableKey::new(*guid, name).to_string(), &res);
        res
    }

    fn variables(&self) -> Result<Vec<VariableKey>> {
        list_variables(&self.root)
    }

    fn chmod(&self, guid: &Uuid, name: &str, mode: u32) -> Result<()> {
        let path = self.path_for(guid, name)?;
        let res = rustix::fs::chmod(&path, Mode::from_bits_truncate(mode))
            .map_err(|e| VarError::from_errno("chmod", &path, e));
        self.report(
            &format!("chmod 0{mode:o}"),
            &VariableKey::new(*guid, name).to_string(),
            &res,
        );
        res
    }

    fn size(&self, guid: &Uuid, name: &str) -> Result<usize> {
        let path = self.path_for(guid, name)?;
        variable_size(&path)
    }
}
