pub mod immutable;
pub mod mount;
pub mod paths;

pub use immutable::{make_fd_mutable, restore_flags, set_fd_immutable};
pub use mount::probe_efivarfs;
pub use paths::{efivarfs_root, path_for};
