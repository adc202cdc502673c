//! Inode immutable-flag handling (`FS_IOC_GETFLAGS` / `FS_IOC_SETFLAGS`).
//!
//! efivarfs marks variables the kernel considers dangerous to remove as
//! immutable. Mutations clear the bit first and put it back afterwards, on
//! success and on failure alike. Filesystems without flag support answer the
//! ioctl with `ENOTTY` (or `EOPNOTSUPP`); that is not an error here.
use rustix::fd::AsFd;
use rustix::fs::IFlags;
use rustix::io::Errno;

fn is_unsupported(e: Errno) -> bool {
    e == Errno::NOTTY || e == Errno::OPNOTSUPP
}

/// Read the inode flags of `fd`.
///
/// # Errors
///
/// Returns the ioctl errno.
pub fn get_flags<Fd: AsFd>(fd: Fd) -> Result<IFlags, Errno> {
    rustix::fs::ioctl_getflags(fd)
}

/// Replace the inode flags of `fd`.
///
/// # Errors
///
/// Returns the ioctl errno.
pub fn set_flags<Fd: AsFd>(fd: Fd, flags: IFlags) -> Result<(), Errno> {
    rustix::fs::ioctl_setflags(fd, flags)
}

/// Make `fd` immutable (or not), touching the inode only when the bit must
/// change. Unsupported flag control counts as success.
///
/// # Errors
///
/// Returns the errno of a failed query or update.
pub fn set_fd_immutable<Fd: AsFd>(fd: Fd, immutable: bool) -> Result<(), Errno> {
    let flags = match get_flags(&fd) {
        Ok(f) => f,
        Err(e) if is_unsupported(e) => return Ok(()),
        Err(e) => return Err(e),
    };
    if flags.contains(IFlags::IMMUTABLE) == immutable {
        return Ok(());
    }
    let mut want = flags;
    want.set(IFlags::IMMUTABLE, immutable);
    set_flags(&fd, want)
}

/// Clear the immutable bit on `fd` and return the flags it had before, so the
/// caller can hand them back to [`restore_flags`] later.
///
/// # Errors
///
/// Returns the ioctl errno; unsupported flag control is reported too, since
/// callers treat any failure here as "nothing to restore".
pub fn make_fd_mutable<Fd: AsFd>(fd: Fd) -> Result<IFlags, Errno> {
    let orig = get_flags(&fd)?;
    if !orig.contains(IFlags::IMMUTABLE) {
        return Ok(orig);
    }
    // IFlags is neither Copy nor Clone.
    set_flags(&fd, IFlags::from_bits_retain(orig.bits()) - IFlags::IMMUTABLE)?;
    Ok(orig)
}

/// Best-effort reapplication of flags captured by [`make_fd_mutable`].
pub fn restore_flags<Fd: AsFd>(fd: Fd, orig: IFlags) {
    if let Err(e) = set_flags(fd, orig) {
        log::debug!("restoring inode flags failed: {e}");
    }
}
