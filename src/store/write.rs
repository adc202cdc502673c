//! Set/append/delete state machine for variable files.
//!
//! A protected variable file is immutable, and its immutable bit can only be
//! cleared through a read-only descriptor. `set` therefore opens the path
//! twice: read-only first (clear the bit, remember dev/ino), then for writing.
//! The second open uses `O_CREAT|O_EXCL` when the first found nothing, and a
//! dev/ino comparison when it did, so a file created, removed or replaced in
//! between is never silently clobbered.
use std::path::Path;

use log::Level;
use rustix::fd::OwnedFd;
use rustix::fs::{fstat, open, IFlags, Mode, OFlags};
use rustix::io::Errno;

use crate::constants::{ATTR_HEADER_LEN, MAX_NAME_LEN};
use crate::fs::immutable::{make_fd_mutable, restore_flags, set_fd_immutable};
use crate::logging::AuditSink;
use crate::types::errors::{id_str, ErrorId, Result, VarError};
use crate::types::VariableAttributes;

/// Reject names and payloads the on-disk layout cannot carry.
pub(crate) fn validate(name: &str, data: &[u8]) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(VarError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    if data.len() > usize::MAX - ATTR_HEADER_LEN {
        return Err(VarError::SizeOverflow { len: data.len() });
    }
    Ok(())
}

/// Attribute word followed by the payload, as one buffer for a single write.
pub(crate) fn encode(attributes: VariableAttributes, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ATTR_HEADER_LEN + data.len());
    buf.extend_from_slice(&attributes.to_ne_bytes());
    buf.extend_from_slice(data);
    buf
}

#[derive(Clone, Copy, Debug)]
enum FdSlot {
    Read,
    Write,
}

/// Descriptors and pending cleanup for one `set`. Dropping it undoes
/// whatever the call left half-done.
struct WriteSession<'p> {
    path: &'p Path,
    wfd: Option<OwnedFd>,
    rfd: Option<OwnedFd>,
    /// Raw `IFlags` bits, kept as `u32` because `IFlags` is not `Copy`.
    restore: Option<(FdSlot, u32)>,
    committed: bool,
}

impl<'p> WriteSession<'p> {
    const fn new(path: &'p Path) -> Self {
        Self {
            path,
            wfd: None,
            rfd: None,
            restore: None,
            committed: false,
        }
    }

    /// We created the file ourselves: there was nothing to open read-only.
    const fn created(&self) -> bool {
        self.rfd.is_none()
    }
}

impl Drop for WriteSession<'_> {
    fn drop(&mut self) {
        if !self.committed && self.created() && self.wfd.is_some() {
            if let Err(e) = rustix::fs::unlink(self.path) {
                log::debug!("failed to unlink {}: {e}", self.path.display());
            }
        }
        if let Some((slot, bits)) = self.restore {
            let fd = match slot {
                FdSlot::Read => self.rfd.as_ref(),
                FdSlot::Write => self.wfd.as_ref(),
            };
            if let Some(fd) = fd {
                restore_flags(fd, IFlags::from_bits_retain(bits));
            }
        }
    }
}

/// Flag bits to put back later if `fd` was immutable and we managed to clear it.
fn clear_immutable(fd: &OwnedFd) -> Option<u32> {
    make_fd_mutable(fd)
        .ok()
        .filter(|orig| orig.contains(IFlags::IMMUTABLE))
        .map(|orig| orig.bits())
}

/// Points inside [`write_variable`] where callers can interleave other work.
///
/// `between_opens` runs after the read-only open and before the write open.
/// `after_write_open` runs once the write descriptor is held, before any
/// byte is written; an error from it aborts the write like a failed syscall.
pub(crate) struct Interleave<B, O> {
    pub between_opens: B,
    pub after_write_open: O,
}

/// No-op `between_opens`.
pub(crate) fn stay(_: &Path) {}

/// No-op `after_write_open`.
pub(crate) fn proceed(_: &Path) -> Result<()> {
    Ok(())
}

/// Replace (or append to) the variable file at `path`.
///
/// Production callers pass [`stay`] and [`proceed`] as the interleave
/// points. `after_write` runs once the data is on disk, before any cleanup.
pub(crate) fn write_variable<A, B, O, W>(
    audit: &A,
    path: &Path,
    data: &[u8],
    attributes: VariableAttributes,
    mode: u32,
    interleave: Interleave<B, O>,
    after_write: W,
) -> Result<()>
where
    A: AuditSink + ?Sized,
    B: FnOnce(&Path),
    O: FnOnce(&Path) -> Result<()>,
    W: FnOnce(),
{
    let buf = encode(attributes, data);
    let mut s = WriteSession::new(path);

    // A failed read-only open only means the variable does not exist yet.
    s.rfd = open(path, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty()).ok();
    let mut identity = None;
    if let Some(rfd) = s.rfd.as_ref() {
        let st = fstat(rfd).map_err(|e| VarError::from_errno("fstat", path, e))?;
        identity = Some((st.st_dev, st.st_ino));
        s.restore = clear_immutable(rfd).map(|f| (FdSlot::Read, f));
    }

    (interleave.between_opens)(path);

    let appending = attributes.contains(VariableAttributes::APPEND_WRITE);
    let mut oflags = OFlags::WRONLY | OFlags::CLOEXEC;
    if appending {
        oflags |= OFlags::APPEND;
    }
    if s.created() {
        oflags |= OFlags::CREATE | OFlags::EXCL;
    }
    let wfd = open(path, oflags, Mode::from_bits_truncate(mode)).map_err(|e| {
        audit.log(
            Level::Debug,
            &format!(
                "failed to {} {} for {}: {e}",
                if s.created() { "create" } else { "open" },
                path.display(),
                if appending { "appending" } else { "writing" },
            ),
        );
        VarError::from_errno(if s.created() { "create" } else { "open" }, path, e)
    })?;

    match identity {
        // A protected file we just created is immutable from birth.
        None => {
            if let Some(f) = clear_immutable(&wfd) {
                s.restore = Some((FdSlot::Write, f));
            }
        }
        Some((dev, ino)) => {
            let st = fstat(&wfd).map_err(|e| VarError::from_errno("fstat", path, e))?;
            if st.st_dev != dev || st.st_ino != ino {
                audit.log(
                    Level::Warn,
                    &format!(
                        "{}: {} changed identity between opens",
                        id_str(ErrorId::E_RACE),
                        path.display()
                    ),
                );
                return Err(VarError::RaceDetected {
                    path: path.to_path_buf(),
                });
            }
        }
    }
    let wfd = s.wfd.insert(wfd);
    (interleave.after_write_open)(path)?;

    let n = rustix::io::write(&*wfd, &buf).map_err(|e| VarError::from_errno("write", path, e))?;
    if n != buf.len() {
        return Err(VarError::Sys {
            op: "write",
            path: path.to_path_buf(),
            errno: Errno::IO,
        });
    }

    after_write();
    s.committed = true;
    Ok(())
}

/// Unlink the variable file at `path`, clearing its immutable bit first.
pub(crate) fn delete_variable(path: &Path) -> Result<()> {
    // Best effort: the file may be mutable already, or absent.
    if let Ok(fd) = open(path, OFlags::RDONLY | OFlags::CLOEXEC, Mode::empty()) {
        let _ = set_fd_immutable(&fd, false);
    }
    rustix::fs::unlink(path).map_err(|e| VarError::from_errno("unlink", path, e))
}
