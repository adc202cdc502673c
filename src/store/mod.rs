//! The variable-store capability interface and its efivarfs implementation.
use uuid::Uuid;

use crate::types::errors::Result;
use crate::types::{VariableAttributes, VariableKey, VariableRecord};

mod efivarfs;
mod enumerate;
pub(crate) mod read;
pub(crate) mod write;

pub use efivarfs::EfivarfsStore;
pub use read::throttle_delay;

/// Operations every variable backend offers to higher-level tooling.
///
/// Backends are chosen at runtime with [`select_store`]; callers never name a
/// concrete store.
pub trait VariableStore {
    /// Short backend label used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this backend can serve the running system.
    fn probe(&self) -> Result<()>;

    fn get(&self, guid: &Uuid, name: &str) -> Result<VariableRecord>;

    /// Create or replace a variable. `mode` applies only when the backing
    /// file is created.
    fn set(
        &self,
        guid: &Uuid,
        name: &str,
        data: &[u8],
        attributes: VariableAttributes,
        mode: u32,
    ) -> Result<()>;

    /// Append to a variable; the append-write attribute is forced on.
    fn append(
        &self,
        guid: &Uuid,
        name: &str,
        data: &[u8],
        attributes: VariableAttributes,
    ) -> Result<()>;

    fn delete(&self, guid: &Uuid, name: &str) -> Result<()>;

    fn variables(&self) -> Result<Vec<VariableKey>>;

    fn chmod(&self, guid: &Uuid, name: &str, mode: u32) -> Result<()>;

    /// Payload length in bytes, excluding the attribute header.
    fn size(&self, guid: &Uuid, name: &str) -> Result<usize>;

    fn attributes(&self, guid: &Uuid, name: &str) -> Result<VariableAttributes> {
        self.get(guid, name).map(|rec| rec.attributes)
    }
}

/// First candidate whose probe succeeds.
#[must_use]
pub fn select_store(candidates: &[Box<dyn VariableStore>]) -> Option<&dyn VariableStore> {
    candidates.iter().map(|b| &**b).find(|s| match s.probe() {
        Ok(()) => true,
        Err(e) => {
            log::debug!("variable store {} unavailable: {e}", s.name());
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::errors::VarError;
    use std::path::PathBuf;

    struct Absent;

    impl VariableStore for Absent {
        fn name(&self) -> &'static str {
            "absent"
        }
        fn probe(&self) -> Result<()> {
            Err(VarError::NotEfivarfs {
                path: PathBuf::from("/nowhere"),
                magic: 0,
            })
        }
        fn get(&self, _: &Uuid, _: &str) -> Result<VariableRecord> {
            unreachable!()
        }
        fn set(&self, _: &Uuid, _: &str, _: &[u8], _: VariableAttributes, _: u32) -> Result<()> {
            unreachable!()
        }
        fn append(&self, _: &Uuid, _: &str, _: &[u8], _: VariableAttributes) -> Result<()> {
            unreachable!()
        }
        fn delete(&self, _: &Uuid, _: &str) -> Result<()> {
            unreachable!()
        }
        fn variables(&self) -> Result<Vec<VariableKey>> {
            unreachable!()
        }
        fn chmod(&self, _: &Uuid, _: &str, _: u32) -> Result<()> {
            unreachable!()
        }
        fn size(&self, _: &Uuid, _: &str) -> Result<usize> {
            unreachable!()
        }
    }

    #[test]
    fn selection_skips_failed_probes() {
        let none: Vec<Box<dyn VariableStore>> = vec![Box::new(Absent)];
        assert!(select_store(&none).is_none());
    }
}
