//! Shared crate-wide constants for efivarstore.
//!
//! Centralizes magic values and default locations used across modules.
//! Adjusting these here will propagate through the crate.
use std::time::Duration;

use uuid::Uuid;

/// Environment variable that overrides the efivarfs mount root.
/// When it names the root directly, the filesystem-type probe is relaxed so
/// test harnesses can point the store at a scratch directory.
pub const ENV_ROOT_OVERRIDE: &str = "EFIVARFS_PATH";

/// Default efivarfs mount root. Note the trailing slash.
pub const DEFAULT_EFIVARFS_ROOT: &str = "/sys/firmware/efi/efivars/";

/// `statfs(2)` magic reported by efivarfs (`EFIVARFS_MAGIC` in `linux/magic.h`).
pub const EFIVARFS_MAGIC: u32 = 0xde5e_81e4;

/// Size of the attribute word that prefixes every variable file.
pub const ATTR_HEADER_LEN: usize = std::mem::size_of::<u32>();

/// Longest variable name accepted by `set`, in bytes.
pub const MAX_NAME_LEN: usize = 1024;

/// Formatted variable paths must stay strictly below this length (`PATH_MAX`).
pub const MAX_PATH_LEN: usize = 4096;

/// Delay applied before each read syscall for unprivileged callers.
/// The kernel rate-limits non-root efivarfs reads to roughly 100 per second.
pub const UNPRIVILEGED_READ_DELAY: Duration = Duration::from_millis(10);

/// Mode used when `append` has to create the variable file.
pub const DEFAULT_APPEND_MODE: u32 = 0o644;

/// Namespace of the reserved variables that drive ESP persistence.
pub const FILE_STORE_VARS_GUID: Uuid = Uuid::from_u128(0xb2ac5fc9_92b7_4acd_aeac_11e818c3130c);

/// Reserved variable holding the ESP-relative name of the mirror file.
pub const RTSV_NAME: &str = "RTStorageVolatile";

/// Reserved variable holding the payload mirrored onto the ESP.
pub const VAR_TO_FILE_NAME: &str = "VarToFile";

/// Longest accepted mirror filename (`PATH_MAX / 4`).
pub const MAX_ESP_FILENAME_LEN: usize = MAX_PATH_LEN / 4;

/// ESP mount points searched, in order, for the mirror file.
pub const ESP_CANDIDATES: &[&str] = &["/boot/efi/", "/boot/", "/efi/"];

/// Chunk size used when streaming `VarToFile` onto the ESP.
pub const ESP_COPY_CHUNK: usize = 1024;
