//! Mount-root resolution and per-variable path construction.

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use uuid::Uuid;

use crate::constants::{DEFAULT_EFIVARFS_ROOT, ENV_ROOT_OVERRIDE, MAX_PATH_LEN};
use crate::types::errors::{Result, VarError};

static EFIVARFS_ROOT: OnceLock<PathBuf> = OnceLock::new();

/// Process-wide efivarfs root: `EFIVARFS_PATH` if set when first asked, else
/// the default sysfs location. Resolved once and shared by all readers.
pub fn efivarfs_root() -> &'static Path {
    EFIVARFS_ROOT.get_or_init(|| resolve_root(std::env::var_os(ENV_ROOT_OVERRIDE)))
}

fn resolve_root(env: Option<OsString>) -> PathBuf {
    match env {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_EFIVARFS_ROOT),
    }
}

/// Whether `root` is exactly the directory named by `EFIVARFS_PATH`.
pub fn root_is_env_override(root: &Path) -> bool {
    std::env::var_os(ENV_ROOT_OVERRIDE).is_some_and(|v| v.as_os_str() == root.as_os_str())
}

/// Build `<root>/<name>-<guid>`, rejecting paths at or beyond `PATH_MAX`.
///
/// The name is appended textually, never joined, so a leading `/` in it
/// cannot replace the root.
pub fn path_for(root: &Path, guid: &Uuid, name: &str) -> Result<PathBuf> {
    let mut raw = OsString::from(root.as_os_str());
    if !raw.as_bytes().ends_with(b"/") {
        raw.push("/");
    }
    raw.push(format!("{name}-{}", guid.hyphenated()));
    let path = PathBuf::from(raw);
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(VarError::PathTooLong {
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_without_override() {
        assert_eq!(resolve_root(None), PathBuf::from(DEFAULT_EFIVARFS_ROOT));
        assert_eq!(
            resolve_root(Some(OsString::new())),
            PathBuf::from(DEFAULT_EFIVARFS_ROOT)
        );
    }

    #[test]
    fn override_is_copied_verbatim() {
        let root = resolve_root(Some(OsString::from("/tmp/vars")));
        assert_eq!(root, PathBuf::from("/tmp/vars"));
    }

    #[test]
    fn path_matches_efivarfs_layout() {
        let guid = Uuid::from_u128(0x8be4df61_93ca_11d2_aa0d_00e098032b8c);
        let p = path_for(Path::new(DEFAULT_EFIVARFS_ROOT), &guid, "BootOrder")
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            p,
            Path::new("/sys/firmware/efi/efivars/BootOrder-8be4df61-93ca-11d2-aa0d-00e098032b8c")
        );
        // A root without a trailing slash lands in the same place.
        let q = path_for(Path::new("/sys/firmware/efi/efivars"), &guid, "BootOrder")
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(p, q);
    }

    #[test]
    fn leading_slash_in_name_stays_under_root() {
        let root = Path::new("/tmp/efivars");
        let p = path_for(root, &Uuid::nil(), "/tmp/outside").unwrap_or_else(|e| panic!("{e}"));
        assert!(p.starts_with(root), "{} escaped the root", p.display());
        assert_eq!(
            p.as_os_str(),
            "/tmp/efivars//tmp/outside-00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn oversized_path_is_rejected_per_call() {
        let name = "A".repeat(MAX_PATH_LEN);
        let err = path_for(Path::new("/r"), &Uuid::nil(), &name).unwrap_err();
        assert!(matches!(err, VarError::PathTooLong { .. }));
        assert!(path_for(Path::new("/r"), &Uuid::nil(), "ok").is_ok());
    }
}
