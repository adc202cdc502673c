//! ESP mirroring of volatile-backed variable state.
//!
//! Some firmware keeps runtime variables in volatile storage and reloads them
//! at boot from a file on the EFI System Partition. Two reserved variables
//! drive this: `RTStorageVolatile` names the file (relative to the ESP) and
//! `VarToFile` holds the bytes to put there. After every mutation the store
//! copies `VarToFile`, minus its attribute header, over that file.
use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::Level;
use thiserror::Error;

use crate::constants::{
    ATTR_HEADER_LEN, ESP_COPY_CHUNK, FILE_STORE_VARS_GUID, MAX_ESP_FILENAME_LEN, RTSV_NAME,
    VAR_TO_FILE_NAME,
};
use crate::fs::paths::path_for;
use crate::logging::AuditSink;
use crate::store::read::read_variable;
use crate::types::errors::VarError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// `RTStorageVolatile` is absent: the platform does not use ESP mirroring.
    NotConfigured,
    /// No candidate ESP mount holds the named file.
    NoEspFile { filename: PathBuf },
    Mirrored { dest: PathBuf, bytes: u64 },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("ESP filename is unusable ({len} bytes, limit {max})")]
    BadFilename { len: usize, max: usize },
    #[error("cannot locate VarToFile: {0}")]
    SourcePath(#[source] VarError),
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not skip the attribute header of {path}: file is too small")]
    ShortSource { path: PathBuf },
    #[error("reading {path} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write data to ESP file {path}: {source}")]
    PartialWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// A half-written ESP file is worse than a stale one; callers abort on these.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, SyncError::PartialWrite { .. })
    }
}

/// Decode the `RTStorageVolatile` payload into an ESP-relative filename.
///
/// The payload is a C string: anything after the first NUL is ignored. A
/// leading `/` is dropped so the name stays under the ESP mount it is joined
/// to.
///
/// # Errors
///
/// `BadFilename` when the payload is too long or names nothing.
pub fn esp_filename(raw: &[u8]) -> Result<PathBuf, SyncError> {
    if raw.len() > MAX_ESP_FILENAME_LEN {
        return Err(SyncError::BadFilename {
            len: raw.len(),
            max: MAX_ESP_FILENAME_LEN,
        });
    }
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut name = &raw[..end];
    while let Some(rest) = name.strip_prefix(b"/") {
        name = rest;
    }
    if name.is_empty() {
        return Err(SyncError::BadFilename {
            len: 0,
            max: MAX_ESP_FILENAME_LEN,
        });
    }
    Ok(PathBuf::from(OsStr::from_bytes(name)))
}

/// First `<candidate>/<filename>` that exists as a regular file.
#[must_use]
pub fn find_esp_file(candidates: &[PathBuf], filename: &Path) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|mnt| mnt.join(filename))
        .find(|p| std::fs::metadata(p).is_ok_and(|md| md.is_file()))
}

/// Copy `src` minus its 4-byte attribute header over `dest`.
///
/// The source header is checked before `dest` is opened, so a truncated
/// source leaves the ESP file as it was.
///
/// # Errors
///
/// `PartialWrite` (fatal) when the destination stops accepting bytes; the
/// other variants for failures that leave `dest` untouched or merely stale.
pub fn mirror_payload(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    let mut input = File::open(src).map_err(|source| SyncError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let mut header = [0u8; ATTR_HEADER_LEN];
    input.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SyncError::ShortSource {
                path: src.to_path_buf(),
            }
        } else {
            SyncError::Read {
                path: src.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut output = File::create(dest).map_err(|source| SyncError::Open {
        path: dest.to_path_buf(),
        source,
    })?;
    let mut chunk = [0u8; ESP_COPY_CHUNK];
    let mut total = 0u64;
    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(SyncError::Read {
                    path: src.to_path_buf(),
                    source,
                })
            }
        };
        output
            .write_all(&chunk[..n])
            .map_err(|source| SyncError::PartialWrite {
                path: dest.to_path_buf(),
                source,
            })?;
        total += n as u64;
    }
    Ok(total)
}

/// One ESP mirroring pass over a given efivarfs root.
pub struct EspSync<'a, A: AuditSink + ?Sized> {
    pub root: &'a Path,
    pub esp_paths: &'a [PathBuf],
    pub read_delay: Duration,
    pub audit: &'a A,
}

impl<A: AuditSink + ?Sized> EspSync<'_, A> {
    /// # Errors
    ///
    /// Any failure after the ESP file has been located; check
    /// [`SyncError::is_fatal`] before deciding how loudly to fail.
    pub fn run(&self) -> Result<SyncOutcome, SyncError> {
        let rtsv = match path_for(self.root, &FILE_STORE_VARS_GUID, RTSV_NAME)
            .and_then(|p| read_variable(&p, self.read_delay))
        {
            Ok(rec) => rec,
            Err(e) => {
                if !e.is_not_found() {
                    self.audit
                        .log(Level::Debug, &format!("{RTSV_NAME} unreadable: {e}"));
                }
                return Ok(SyncOutcome::NotConfigured);
            }
        };

        let filename = esp_filename(&rtsv.data)?;
        let Some(dest) = find_esp_file(self.esp_paths, &filename) else {
            self.audit.log(
                Level::Warn,
                &format!(
                    "'{}' file not found in ESP partition. EFI variable changes won't persist reboots",
                    filename.display()
                ),
            );
            return Ok(SyncOutcome::NoEspFile { filename });
        };

        let src = path_for(self.root, &FILE_STORE_VARS_GUID, VAR_TO_FILE_NAME)
            .map_err(SyncError::SourcePath)?;
        let bytes = mirror_payload(&src, &dest)?;
        self.audit.log(
            Level::Debug,
            &format!("mirrored {bytes} bytes of {VAR_TO_FILE_NAME} to {}", dest.display()),
        );
        Ok(SyncOutcome::Mirrored { dest, bytes })
    }
}
