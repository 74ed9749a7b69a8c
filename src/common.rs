/// Whether the format of a table is 32- or 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// 64-bit DWARF
    Dwarf64 = 8,
    /// 32-bit DWARF
    Dwarf32 = 4,
}

impl Format {
    /// Return the serialized size of an initial length field for the format.
    #[inline]
    pub fn initial_length_size(self) -> u8 {
        match self {
            Format::Dwarf32 => 4,
            Format::Dwarf64 => 12,
        }
    }

    /// Return the natural word size for the format
    #[inline]
    pub fn word_size(self) -> u8 {
        match self {
            Format::Dwarf32 => 4,
            Format::Dwarf64 => 8,
        }
    }
}

/// Encoding parameters that are commonly used for multiple DWARF sections.
///
/// This is intended to be small enough to pass by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
// `address_size` and `format` are used more often than `version`, so keep
// them first.
#[repr(C)]
pub struct Encoding {
    /// The size of an address.
    ///
    /// Accelerator tables never store addresses, so this is normally zero.
    pub address_size: u8,

    /// Whether the table uses 32-bit or 64-bit DWARF.
    pub format: Format,

    /// The version of the table that owns the values being decoded.
    pub version: u16,
}

/// An offset into the `.debug_info` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct DebugInfoOffset<T = usize>(pub T);

/// An offset into the `.debug_names` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct DebugNamesOffset<T = usize>(pub T);

/// An offset into the `.debug_str` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct DebugStrOffset<T = usize>(pub T);

/// An offset into one of the Apple accelerator table sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct AppleTableOffset<T = usize>(pub T);

/// A type signature as used in `.debug_names` foreign type unit lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebugTypeSignature(pub u64);

/// An offset into the current compilation or type unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct UnitOffset<T = usize>(pub T);

/// An identifier for an accelerator table section or one of the sections it
/// refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    /// The `.debug_names` section.
    DebugNames,
    /// The `.debug_str` section.
    DebugStr,
    /// The `.apple_names` section.
    AppleNames,
    /// The `.apple_types` section.
    AppleTypes,
    /// The `.apple_namespaces` section.
    AppleNamespaces,
    /// The `.apple_objc` section.
    AppleObjc,
}

impl SectionId {
    /// All of the accelerator table sections, in the order they are usually dumped.
    pub const ACCELERATOR_TABLES: [SectionId; 5] = [
        SectionId::AppleNames,
        SectionId::AppleTypes,
        SectionId::AppleNamespaces,
        SectionId::AppleObjc,
        SectionId::DebugNames,
    ];

    /// Returns the ELF section name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            SectionId::DebugNames => ".debug_names",
            SectionId::DebugStr => ".debug_str",
            SectionId::AppleNames => ".apple_names",
            SectionId::AppleTypes => ".apple_types",
            SectionId::AppleNamespaces => ".apple_namespaces",
            SectionId::AppleObjc => ".apple_objc",
        }
    }

    /// Returns the Mach-O section name for this kind.
    ///
    /// Mach-O section names are limited to 16 bytes, so some of them
    /// are truncated.
    pub fn macho_name(self) -> &'static str {
        match self {
            SectionId::DebugNames => "__debug_names",
            SectionId::DebugStr => "__debug_str",
            SectionId::AppleNames => "__apple_names",
            SectionId::AppleTypes => "__apple_types",
            SectionId::AppleNamespaces => "__apple_namespac",
            SectionId::AppleObjc => "__apple_objc",
        }
    }

    /// Returns true if the section uses the Apple hash table layout.
    pub fn is_apple_table(self) -> bool {
        matches!(
            self,
            SectionId::AppleNames
                | SectionId::AppleTypes
                | SectionId::AppleNamespaces
                | SectionId::AppleObjc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_names() {
        assert_eq!(SectionId::AppleNames.name(), ".apple_names");
        assert_eq!(SectionId::AppleNamespaces.macho_name(), "__apple_namespac");
        assert!(SectionId::AppleObjc.is_apple_table());
        assert!(!SectionId::DebugNames.is_apple_table());
    }

    #[test]
    fn test_word_sizes() {
        assert_eq!(Format::Dwarf32.word_size(), 4);
        assert_eq!(Format::Dwarf64.word_size(), 8);
        assert_eq!(Format::Dwarf64.initial_length_size(), 12);
    }
}
