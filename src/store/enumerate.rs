//! Listing of the variables present under the mount root.
use std::path::Path;

use crate::types::errors::{Result, VarError};
use crate::types::VariableKey;

/// Every `<name>-<guid>` entry under `root`, sorted. Entries that do not
/// parse as variable filenames are skipped.
pub(crate) fn list_variables(root: &Path) -> Result<Vec<VariableKey>> {
    let rd = std::fs::read_dir(root).map_err(|e| VarError::from_io("opendir", root, &e))?;
    let mut out = Vec::new();
    for entry in rd {
        let entry = entry.map_err(|e| VarError::from_io("readdir", root, &e))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if let Some(key) = VariableKey::from_file_name(&name) {
            out.push(key);
        }
    }
    out.sort();
    Ok(out)
}
