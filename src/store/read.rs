//! Variable file reads.
use std::fs::File;
use std::io::Read as _;
use std::path::Path;
use std::time::Duration;

use rustix::fs::{open, Mode, OFlags};
use rustix::io::Errno;

use crate::constants::{ATTR_HEADER_LEN, UNPRIVILEGED_READ_DELAY};
use crate::types::errors::{Result, VarError};
use crate::types::{VariableAttributes, VariableRecord};

/// Per-syscall read delay for the calling process: none for root, otherwise
/// enough to stay under the kernel's ~100 reads/s limit for unprivileged users.
#[must_use]
pub fn throttle_delay() -> Duration {
    if rustix::process::geteuid().is_root() {
        Duration::ZERO
    } else {
        UNPRIVILEGED_READ_DELAY
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

/// Read the attribute word and payload of the variable file at `path`.
///
/// The descriptor is owned for the whole call and closed on every path, so
/// the error returned is always the one from the failing read.
pub(crate) fn read_variable(path: &Path, delay: Duration) -> Result<VariableRecord> {
    let fd = open(path, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty())
        .map_err(|e| VarError::from_errno("open", path, e))?;

    pause(delay);
    let mut header = [0u8; ATTR_HEADER_LEN];
    let n = rustix::io::read(&fd, &mut header[..]).map_err(|e| VarError::from_errno("read", path, e))?;
    if n < ATTR_HEADER_LEN {
        return Err(VarError::Truncated {
            path: path.to_path_buf(),
        });
    }

    pause(delay);
    let mut data = Vec::new();
    File::from(fd)
        .read_to_end(&mut data)
        .map_err(|e| VarError::from_io("read", path, &e))?;

    Ok(VariableRecord {
        attributes: VariableAttributes::from_ne_bytes(header),
        data,
    })
}

/// Payload length derived from the file size, without reading the file.
///
/// A file too short to hold the attribute word is `Truncated`, the same
/// answer `read_variable` gives for it.
pub(crate) fn variable_size(path: &Path) -> Result<usize> {
    let st = rustix::fs::stat(path).map_err(|e| VarError::from_errno("stat", path, e))?;
    let total = usize::try_from(st.st_size).map_err(|_| VarError::Sys {
        op: "stat",
        path: path.to_path_buf(),
        errno: Errno::OVERFLOW,
    })?;
    if total < ATTR_HEADER_LEN {
        return Err(VarError::Truncated {
            path: path.to_path_buf(),
        });
    }
    Ok(total - ATTR_HEADER_LEN)
}
