use crate::common::{DebugStrOffset, SectionId};
use crate::endianity::Endianity;
use crate::read::{EndianSlice, Reader, Result, Section};

/// The `DebugStr` struct represents the strings found in the `.debug_str`
/// section.
///
/// Both `.debug_names` and the Apple accelerator tables store names as
/// offsets into this section.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugStr<R> {
    debug_str_section: R,
}

impl<'input, Endian> DebugStr<EndianSlice<'input, Endian>>
where
    Endian: Endianity,
{
    /// Construct a new `DebugStr` instance from the data in the `.debug_str`
    /// section.
    ///
    /// It is the caller's responsibility to read the `.debug_str` section and
    /// present it as a `&[u8]` slice. That means using some ELF loader on
    /// Linux, a Mach-O loader on macOS, etc.
    ///
    /// ```
    /// use dwarf_accel::{DebugStr, LittleEndian};
    ///
    /// # let buf = [0x00, 0x01, 0x02, 0x03];
    /// # let read_debug_str_section_somehow = || &buf;
    /// let debug_str = DebugStr::new(read_debug_str_section_somehow(), LittleEndian);
    /// ```
    pub fn new(debug_str_section: &'input [u8], endian: Endian) -> Self {
        Self::from(EndianSlice::new(debug_str_section, endian))
    }
}

impl<R: Reader> DebugStr<R> {
    /// Lookup a string from the `.debug_str` section by `DebugStrOffset`.
    ///
    /// ```
    /// use dwarf_accel::{DebugStr, DebugStrOffset, LittleEndian};
    ///
    /// let buf = b"main\0int\0";
    /// let debug_str = DebugStr::new(buf, LittleEndian);
    /// assert_eq!(debug_str.get_str(DebugStrOffset(5)).unwrap().slice(), b"int");
    /// ```
    pub fn get_str(&self, offset: DebugStrOffset) -> Result<R> {
        let input = &mut self.debug_str_section.clone();
        input.skip(offset.0)?;
        input.read_null_terminated_slice()
    }
}

impl<R> Section<R> for DebugStr<R> {
    fn id() -> SectionId {
        SectionId::DebugStr
    }

    fn reader(&self) -> &R {
        &self.debug_str_section
    }
}

impl<R> From<R> for DebugStr<R> {
    fn from(debug_str_section: R) -> Self {
        DebugStr { debug_str_section }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endianity::LittleEndian;
    use crate::read::Error;

    #[test]
    fn test_get_str() {
        let buf = b"\0foo\0bar";
        let debug_str = DebugStr::new(buf, LittleEndian);
        assert_eq!(debug_str.get_str(DebugStrOffset(0)).unwrap().slice(), b"");
        assert_eq!(debug_str.get_str(DebugStrOffset(1)).unwrap().slice(), b"foo");
        // Missing terminator.
        assert!(matches!(
            debug_str.get_str(DebugStrOffset(5)),
            Err(Error::UnexpectedEof(_))
        ));
        // Out of bounds.
        assert!(matches!(
            debug_str.get_str(DebugStrOffset(100)),
            Err(Error::UnexpectedEof(_))
        ));
    }
}
