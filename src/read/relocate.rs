use alloc::borrow::Cow;

use crate::common::Format;
use crate::read::{Reader, ReaderOffsetId, Result};

/// Trait for relocating addresses and offsets while reading a section.
pub trait Relocate {
    /// Relocate an address which was read from the given section offset.
    fn relocate_address(&self, offset: usize, value: u64) -> Result<u64>;

    /// Relocate a value which was read from the given section offset.
    fn relocate_offset(&self, offset: usize, value: usize) -> Result<usize>;
}

/// A `Reader` which applies relocations to addresses and offsets.
///
/// This is useful for reading sections which contain relocations,
/// such as those in a relocatable object file.
/// It is generally not used for reading sections in an executable file.
///
/// Accelerator tables refer to `.debug_str` and `.debug_info` by offset,
/// and these are the values that a linker patches.
#[derive(Debug, Clone)]
pub struct RelocateReader<R: Reader, T: Relocate> {
    section: R,
    reader: R,
    relocate: T,
}

impl<R, T> RelocateReader<R, T>
where
    R: Reader,
    T: Relocate,
{
    /// Create a new `RelocateReader` which applies relocations to the given section reader.
    pub fn new(section: R, relocate: T) -> Self {
        let reader = section.clone();
        Self {
            section,
            reader,
            relocate,
        }
    }

    /// Return the reader for the remaining data.
    pub fn inner(&self) -> &R {
        &self.reader
    }

    fn section_offset(&self) -> usize {
        self.reader.offset_from(&self.section)
    }
}

impl<R, T> Reader for RelocateReader<R, T>
where
    R: Reader,
    T: Relocate + core::fmt::Debug + Clone,
{
    type Endian = R::Endian;

    fn read_address(&mut self, address_size: u8) -> Result<u64> {
        let offset = self.section_offset();
        let value = self.reader.read_address(address_size)?;
        self.relocate.relocate_address(offset, value)
    }

    fn read_offset(&mut self, format: Format) -> Result<usize> {
        let offset = self.section_offset();
        let value = self.reader.read_offset(format)?;
        self.relocate.relocate_offset(offset, value)
    }

    fn read_sized_offset(&mut self, size: u8) -> Result<usize> {
        let offset = self.section_offset();
        let value = self.reader.read_sized_offset(size)?;
        self.relocate.relocate_offset(offset, value)
    }

    #[inline]
    fn split(&mut self, len: usize) -> Result<Self> {
        let mut other = self.clone();
        other.reader.truncate(len)?;
        self.reader.skip(len)?;
        Ok(other)
    }

    // All remaining methods simply delegate to `self.reader`.

    #[inline]
    fn endian(&self) -> Self::Endian {
        self.reader.endian()
    }

    #[inline]
    fn len(&self) -> usize {
        self.reader.len()
    }

    #[inline]
    fn empty(&mut self) {
        self.reader.empty()
    }

    #[inline]
    fn truncate(&mut self, len: usize) -> Result<()> {
        self.reader.truncate(len)
    }

    #[inline]
    fn offset_from(&self, base: &Self) -> usize {
        self.reader.offset_from(&base.reader)
    }

    #[inline]
    fn offset_id(&self) -> ReaderOffsetId {
        self.reader.offset_id()
    }

    #[inline]
    fn lookup_offset_id(&self, id: ReaderOffsetId) -> Option<usize> {
        self.reader.lookup_offset_id(id)
    }

    #[inline]
    fn find(&self, byte: u8) -> Result<usize> {
        self.reader.find(byte)
    }

    #[inline]
    fn skip(&mut self, len: usize) -> Result<()> {
        self.reader.skip(len)
    }

    #[inline]
    fn to_slice(&self) -> Result<Cow<'_, [u8]>> {
        self.reader.to_slice()
    }

    #[inline]
    fn to_string(&self) -> Result<Cow<'_, str>> {
        self.reader.to_string()
    }

    #[inline]
    fn to_string_lossy(&self) -> Result<Cow<'_, str>> {
        self.reader.to_string_lossy()
    }

    #[inline]
    fn read_slice(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_slice(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endianity::LittleEndian;
    use crate::read::EndianSlice;

    #[derive(Debug, Clone, Copy)]
    struct AddAtOffset {
        offset: usize,
        addend: usize,
    }

    impl Relocate for AddAtOffset {
        fn relocate_address(&self, offset: usize, value: u64) -> Result<u64> {
            if offset == self.offset {
                Ok(value + self.addend as u64)
            } else {
                Ok(value)
            }
        }

        fn relocate_offset(&self, offset: usize, value: usize) -> Result<usize> {
            if offset == self.offset {
                Ok(value + self.addend)
            } else {
                Ok(value)
            }
        }
    }

    #[test]
    fn test_relocate_offset() {
        let buf = [1, 0, 0, 0, 2, 0, 0, 0];
        let section = EndianSlice::new(&buf, LittleEndian);
        let relocate = AddAtOffset {
            offset: 4,
            addend: 0x100,
        };
        let mut reader = RelocateReader::new(section, relocate);
        assert_eq!(reader.read_offset(Format::Dwarf32), Ok(1));
        assert_eq!(reader.read_offset(Format::Dwarf32), Ok(0x102));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_relocate_after_split() {
        let buf = [0, 0, 1, 0, 0, 0];
        let section = EndianSlice::new(&buf, LittleEndian);
        let relocate = AddAtOffset {
            offset: 2,
            addend: 0x10,
        };
        let mut reader = RelocateReader::new(section, relocate);
        reader.skip(2).unwrap();
        let mut split = reader.split(4).unwrap();
        assert_eq!(split.read_sized_offset(4), Ok(0x11));
        // Plain integer reads are never relocated.
        let mut reader = RelocateReader::new(section, relocate);
        reader.skip(2).unwrap();
        assert_eq!(reader.read_u32(), Ok(1));
    }
}
