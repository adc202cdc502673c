//! Variable identity and contents.
use std::fmt;

use uuid::Uuid;

use super::attributes::VariableAttributes;

/// Identifies exactly one variable: a namespace GUID plus a name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableKey {
    pub guid: Uuid,
    pub name: String,
}

impl VariableKey {
    pub fn new(guid: Uuid, name: impl Into<String>) -> Self {
        Self {
            guid,
            name: name.into(),
        }
    }

    /// Parse an efivarfs filename of the form `<name>-<guid>`.
    ///
    /// The GUID is always the trailing 36 characters, so names that contain
    /// dashes themselves still split correctly.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        const GUID_TEXT_LEN: usize = 36;
        let split = file_name.len().checked_sub(GUID_TEXT_LEN + 1)?;
        if split == 0 || !file_name.is_char_boundary(split) {
            return None;
        }
        let (name, rest) = file_name.split_at(split);
        let guid_text = rest.strip_prefix('-')?;
        let guid = Uuid::try_parse(guid_text).ok()?;
        Some(Self::new(guid, name))
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.guid.hyphenated())
    }
}

/// A variable's attribute word and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableRecord {
    pub attributes: VariableAttributes,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_round_trips_through_display() {
        let key = VariableKey::new(
            Uuid::from_u128(0x8be4df61_93ca_11d2_aa0d_00e098032b8c),
            "Boot0001",
        );
        let text = key.to_string();
        assert_eq!(text, "Boot0001-8be4df61-93ca-11d2-aa0d-00e098032b8c");
        assert_eq!(VariableKey::from_file_name(&text), Some(key));
    }

    #[test]
    fn dashed_names_split_on_the_guid() {
        let k = VariableKey::from_file_name("my-var-00000000-0000-0000-0000-000000000000")
            .unwrap_or_else(|| panic!("should parse"));
        assert_eq!(k.name, "my-var");
        assert_eq!(k.guid, Uuid::nil());
    }

    #[test]
    fn rejects_garbage() {
        assert!(VariableKey::from_file_name("README").is_none());
        assert!(VariableKey::from_file_name("-00000000-0000-0000-0000-000000000000").is_none());
        assert!(VariableKey::from_file_name("Foo-not-a-guid-at-all-but-36-chars-long").is_none());
    }
}
