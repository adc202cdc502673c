//! UEFI variable attribute flags.

bitflags::bitflags! {
    /// Attribute word stored in the first four bytes of every variable file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VariableAttributes: u32 {
        const NON_VOLATILE = 0x0000_0001;
        const BOOTSERVICE_ACCESS = 0x0000_0002;
        const RUNTIME_ACCESS = 0x0000_0004;
        const HARDWARE_ERROR_RECORD = 0x0000_0008;
        const AUTHENTICATED_WRITE_ACCESS = 0x0000_0010;
        const TIME_BASED_AUTHENTICATED_WRITE_ACCESS = 0x0000_0020;
        const APPEND_WRITE = 0x0000_0040;
        const ENHANCED_AUTHENTICATED_ACCESS = 0x0000_0080;

        // Firmware may report bits we do not name; keep them intact.
        const _ = !0;
    }
}

impl VariableAttributes {
    /// Attribute word in native byte order, as laid out on disk.
    #[must_use]
    pub fn to_ne_bytes(self) -> [u8; 4] {
        self.bits().to_ne_bytes()
    }

    #[must_use]
    pub fn from_ne_bytes(raw: [u8; 4]) -> Self {
        Self::from_bits_retain(u32::from_ne_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_survive_the_header() {
        let a = VariableAttributes::from_bits_retain(0x8000_0007);
        assert_eq!(VariableAttributes::from_ne_bytes(a.to_ne_bytes()), a);
        assert!(a.contains(VariableAttributes::RUNTIME_ACCESS));
    }

    #[test]
    fn header_is_native_order() {
        let a = VariableAttributes::NON_VOLATILE
            | VariableAttributes::BOOTSERVICE_ACCESS
            | VariableAttributes::RUNTIME_ACCESS;
        assert_eq!(a.to_ne_bytes(), 7u32.to_ne_bytes());
    }
}
