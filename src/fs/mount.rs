//! Filesystem-type probe for the efivarfs mount root.

use std::path::Path;

use crate::constants::EFIVARFS_MAGIC;
use crate::fs::paths::root_is_env_override;
use crate::types::errors::{Result, VarError};

/// `f_type` of the filesystem holding `path`, widened to `u64`.
///
/// # Errors
///
/// Returns the classified `statfs` failure.
pub fn fs_magic(path: &Path) -> Result<u64> {
    let st = rustix::fs::statfs(path).map_err(|e| VarError::from_errno("statfs", path, e))?;
    // f_type is signed on some targets; the magic is a 32-bit pattern.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let magic = st.f_type as u32;
    Ok(u64::from(magic))
}

/// Succeed only when `root` is backed by efivarfs, or when it is exactly the
/// directory named by `EFIVARFS_PATH` (substitute roots used by harnesses).
///
/// # Errors
///
/// `NotEfivarfs` on a type mismatch without a matching override, or the
/// `statfs` failure itself.
pub fn probe_efivarfs(root: &Path) -> Result<()> {
    let magic = fs_magic(root)?;
    if magic == u64::from(EFIVARFS_MAGIC) {
        return Ok(());
    }
    if root_is_env_override(root) {
        return Ok(());
    }
    Err(VarError::NotEfivarfs {
        path: root.to_path_buf(),
        magic,
    })
}
