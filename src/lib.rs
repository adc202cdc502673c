#![forbid(unsafe_code)]
//! efivarstore: UEFI runtime variables on top of Linux efivarfs.
//!
//! Safety model highlights:
//! - Every variable is one file, `<root>/<name>-<guid>`, holding a 4-byte native-order
//!   attribute word followed by the payload.
//! - Mutations clear the kernel immutable bit through a read-only descriptor, compare
//!   dev/ino between the read-only and write opens to catch replacement races, and always
//!   put the immutable bit back.
//! - After each mutation the `VarToFile` payload is mirrored onto the ESP for firmware that
//!   keeps variables in volatile storage.
//! - This crate forbids `unsafe` and uses `rustix` for syscalls.

pub mod constants;
pub mod fs;
pub mod logging;
pub mod store;
pub mod sync;
pub mod types;

pub use store::{select_store, EfivarfsStore, VariableStore};
pub use types::{VarError, VariableAttributes, VariableKey, VariableRecord};
