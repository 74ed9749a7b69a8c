//! Read the DWARF 5 `.debug_names` section.
//!
//! The section is a sequence of name index units, each covering one or more
//! compilation units. A unit is laid out as consecutive regions:
//!
//! 1. the header, ending with an optional augmentation string padded to 4 bytes;
//! 2. the CU list, the local TU list and the foreign TU signatures;
//! 3. the hash table: a bucket array, then one hash per name;
//! 4. the name table: a string offset and an entry offset per name;
//! 5. the abbreviation table;
//! 6. the entry pool, holding a null terminated series of entries per name.
//!
//! [`NameIndex::new`] checks that every region fits within the unit before
//! anything else is read. Entries are decoded on demand.

use alloc::collections::btree_map;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::common::{
    DebugInfoOffset, DebugNamesOffset, DebugStrOffset, DebugTypeSignature, Encoding, Format,
    SectionId, UnitOffset,
};
use crate::constants;
use crate::endianity::Endianity;
use crate::case_fold::case_folding_djb_hash;
use crate::read::{
    DebugStr, EndianSlice, Error, FormValue, Reader, Result, Section, TableRegion,
};

/// The size of the header fields that follow the unit length.
const FIXED_HEADER_SIZE: usize = 32;

/// The `.debug_names` section.
///
/// Use [`DebugNames::headers`] to walk the name index units lazily, or
/// [`DebugNames::name_indexes`] to parse all of them at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugNames<R> {
    section: R,
}

impl<'input, Endian> DebugNames<EndianSlice<'input, Endian>>
where
    Endian: Endianity,
{
    /// Construct a new `DebugNames` instance from the data in the `.debug_names`
    /// section.
    ///
    /// It is the caller's responsibility to read the `.debug_names` section and
    /// present it as a `&[u8]` slice. That means using some ELF loader on
    /// Linux, a Mach-O loader on macOS, etc.
    ///
    /// ```
    /// use dwarf_accel::{DebugNames, LittleEndian};
    ///
    /// # let buf = [0x00, 0x01, 0x02, 0x03];
    /// # let read_debug_names_section_somehow = || &buf;
    /// let debug_names =
    ///     DebugNames::new(read_debug_names_section_somehow(), LittleEndian);
    /// ```
    pub fn new(debug_names_section: &'input [u8], endian: Endian) -> Self {
        Self::from(EndianSlice::new(debug_names_section, endian))
    }
}

impl<R: Reader> DebugNames<R> {
    /// Iterate over the headers of all name indexes in the section.
    ///
    /// Iteration stops after the first error, since the position of the next
    /// name index depends on the length of the one that failed.
    pub fn headers(&self) -> NameIndexHeaderIter<R> {
        NameIndexHeaderIter {
            input: self.section.clone(),
            end_offset: self.section.len(),
        }
    }

    /// Parse every name index in the section, in order.
    ///
    /// Any failure is fatal to the whole section.
    pub fn name_indexes(&self) -> Result<Vec<NameIndex<R>>> {
        let mut indexes = Vec::new();
        let mut headers = self.headers();
        while let Some(header) = headers.next()? {
            let offset = header.offset();
            let index = header.index().inspect_err(|e| {
                tracing::debug!(offset = offset.0, error = %e, "invalid name index");
            })?;
            indexes.push(index);
        }
        tracing::trace!(count = indexes.len(), "parsed .debug_names");
        Ok(indexes)
    }
}

impl<R> Section<R> for DebugNames<R> {
    fn id() -> SectionId {
        SectionId::DebugNames
    }

    fn reader(&self) -> &R {
        &self.section
    }
}

impl<R> From<R> for DebugNames<R> {
    fn from(debug_names_section: R) -> Self {
        DebugNames {
            section: debug_names_section,
        }
    }
}

/// An iterator over the name index headers in the `.debug_names` section.
#[derive(Debug, Clone)]
pub struct NameIndexHeaderIter<R: Reader> {
    input: R,
    end_offset: usize,
}

impl<R: Reader> NameIndexHeaderIter<R> {
    /// Advance the iterator and return the next name index header.
    ///
    /// Returns `Ok(None)` when iteration is complete.
    pub fn next(&mut self) -> Result<Option<NameIndexHeader<R>>> {
        if self.input.is_empty() {
            return Ok(None);
        }

        let offset = DebugNamesOffset(self.end_offset - self.input.len());
        let result = NameIndexHeader::parse(&mut self.input, offset).map(Some);
        if let Err(e) = result {
            tracing::debug!(offset = offset.0, error = %e, "invalid name index header");
            self.input.empty();
        }
        result
    }
}

#[cfg(feature = "fallible-iterator")]
impl<R: Reader> fallible_iterator::FallibleIterator for NameIndexHeaderIter<R> {
    type Item = NameIndexHeader<R>;
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        NameIndexHeaderIter::next(self)
    }
}

impl<R: Reader> Iterator for NameIndexHeaderIter<R> {
    type Item = Result<NameIndexHeader<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        NameIndexHeaderIter::next(self).transpose()
    }
}

/// The header of a name index in the `.debug_names` section.
#[derive(Debug, Clone)]
pub struct NameIndexHeader<R: Reader> {
    /// The section offset of the header.
    offset: DebugNamesOffset,
    /// The length of this name index, excluding the initial length field.
    length: usize,
    /// The format of the unit.
    format: Format,
    /// Version of the name index format (must be 5).
    version: u16,
    /// Reserved padding after the version.
    padding: u16,
    /// Number of compilation units in the CU list.
    compile_unit_count: u32,
    /// Number of type units in the local TU list.
    local_type_unit_count: u32,
    /// Number of type units in the foreign TU list.
    foreign_type_unit_count: u32,
    /// Number of buckets in the hash table.
    bucket_count: u32,
    /// Number of unique name entries.
    name_count: u32,
    /// Size of the abbreviations table in bytes.
    abbrev_table_size: u32,
    /// The augmentation string.
    augmentation_string: Option<R>,
    /// The remaining unparsed contents of the index.
    content: R,
    /// The section offset of `content`.
    content_offset: DebugNamesOffset,
}

impl<R: Reader> NameIndexHeader<R> {
    /// Convert the header into a `NameIndex`.
    pub fn index(self) -> Result<NameIndex<R>> {
        NameIndex::new(self)
    }

    /// Return the section offset of this name index.
    #[inline]
    pub fn offset(&self) -> DebugNamesOffset {
        self.offset
    }

    /// Return the index length, excluding the initial length field.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Return the section offset of the name index that follows this one.
    pub fn next_unit_offset(&self) -> DebugNamesOffset {
        DebugNamesOffset(
            self.offset.0 + usize::from(self.format.initial_length_size()) + self.length,
        )
    }

    /// Return the format (DWARF32 or DWARF64).
    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Return the version of this name index.
    #[inline]
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Return the reserved padding field.
    #[inline]
    pub fn padding(&self) -> u16 {
        self.padding
    }

    /// Return the number of compilation units in this index.
    #[inline]
    pub fn compile_unit_count(&self) -> u32 {
        self.compile_unit_count
    }

    /// Return the number of local type units in this index.
    #[inline]
    pub fn local_type_unit_count(&self) -> u32 {
        self.local_type_unit_count
    }

    /// Return the number of foreign type units in this index.
    #[inline]
    pub fn foreign_type_unit_count(&self) -> u32 {
        self.foreign_type_unit_count
    }

    /// Return the number of buckets in the hash table.
    #[inline]
    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// Return the number of unique name entries.
    #[inline]
    pub fn name_count(&self) -> u32 {
        self.name_count
    }

    /// Return the size of the abbreviations table in bytes.
    #[inline]
    pub fn abbrev_table_size(&self) -> u32 {
        self.abbrev_table_size
    }

    /// Return the augmentation string.
    #[inline]
    pub fn augmentation_string(&self) -> Option<&R> {
        self.augmentation_string.as_ref()
    }

    fn parse(input: &mut R, offset: DebugNamesOffset) -> Result<Self> {
        let (length, format) = input.read_initial_length().map_err(|e| match e {
            Error::UnexpectedEof(_) => Error::SectionTooSmall(TableRegion::Header),
            e => e,
        })?;
        let mut input = input
            .split(length)
            .map_err(|_| Error::SectionTooSmall(TableRegion::UnitContents))?;
        if input.len() < FIXED_HEADER_SIZE {
            return Err(Error::SectionTooSmall(TableRegion::Header));
        }

        let version = input.read_u16()?;
        if version != 5 {
            return Err(Error::UnknownVersion(u64::from(version)));
        }

        let padding = input.read_u16()?;
        let compile_unit_count = input.read_u32()?;
        let local_type_unit_count = input.read_u32()?;
        let foreign_type_unit_count = input.read_u32()?;
        let bucket_count = input.read_u32()?;
        let name_count = input.read_u32()?;
        let abbrev_table_size = input.read_u32()?;
        let augmentation_string_size = input.read_u32()? as usize;
        let augmentation_padding = (4 - (augmentation_string_size & 3)) & 3;
        let augmentation_string = if augmentation_string_size > 0 {
            let val = input
                .split(augmentation_string_size)
                .map_err(|_| Error::SectionTooSmall(TableRegion::Augmentation))?;
            input
                .skip(augmentation_padding)
                .map_err(|_| Error::SectionTooSmall(TableRegion::Augmentation))?;
            Some(val)
        } else {
            None
        };

        let content_offset = DebugNamesOffset(
            offset.0
                + usize::from(format.initial_length_size())
                + FIXED_HEADER_SIZE
                + augmentation_string_size
                + augmentation_padding,
        );

        Ok(NameIndexHeader {
            offset,
            length,
            format,
            version,
            padding,
            compile_unit_count,
            local_type_unit_count,
            foreign_type_unit_count,
            bucket_count,
            name_count,
            abbrev_table_size,
            augmentation_string,
            content: input,
            content_offset,
        })
    }
}

/// An index into the name table of a `NameIndex`.
///
/// This is used as an index into the list of string offsets, the list of entry
/// offsets, and the list of hashes.
///
/// As in the DWARF data, indexes start at 1. The buckets of the hash table
/// use 0 to mean that a bucket is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameTableIndex(pub u32);

/// A resolved entry of the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameTableEntry {
    /// The index of the name.
    pub index: NameTableIndex,
    /// The offset of the name string in `.debug_str`.
    pub string_offset: DebugStrOffset,
    /// The section offset of the first entry for the name.
    pub entry_offset: DebugNamesOffset,
}

/// A reference to a type unit.
///
/// This is the result of looking up a type unit index obtained from a `DW_IDX_type_unit`
/// attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTypeUnit {
    /// The offset of a local type unit in the `.debug_info` section.
    Local(DebugInfoOffset),
    /// The type signature of a foreign type unit.
    Foreign(DebugTypeSignature),
}

/// The section offsets of each part of a name index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameIndexLayout {
    /// The start of the name index header.
    pub unit: DebugNamesOffset,
    /// The compilation unit list.
    pub compile_units: DebugNamesOffset,
    /// The local type unit list.
    pub local_type_units: DebugNamesOffset,
    /// The foreign type unit list.
    pub foreign_type_units: DebugNamesOffset,
    /// The bucket array.
    pub buckets: DebugNamesOffset,
    /// The hash array.
    pub hashes: DebugNamesOffset,
    /// The string offsets array of the name table.
    pub string_offsets: DebugNamesOffset,
    /// The entry offsets array of the name table.
    pub entry_offsets: DebugNamesOffset,
    /// The abbreviation table.
    pub abbreviations: DebugNamesOffset,
    /// The entry pool.
    pub entries: DebugNamesOffset,
    /// The end of the name index.
    pub end: DebugNamesOffset,
}

fn split_region<R: Reader>(
    reader: &mut R,
    offset: &mut usize,
    len: u64,
    region: TableRegion,
) -> Result<R> {
    if len > reader.len() as u64 {
        return Err(Error::SectionTooSmall(region));
    }
    let len = len as usize;
    *offset += len;
    reader.split(len)
}

/// A single name index from the `.debug_names` section.
///
/// It provides access to the compilation unit table, type unit tables, hash table, name
/// table, and entry pool that make up the accelerated lookup structure.
#[derive(Debug, Clone)]
pub struct NameIndex<R: Reader> {
    header: NameIndexHeader<R>,
    layout: NameIndexLayout,

    // Pre-sliced readers for each part.
    compile_unit_list: R,
    local_type_unit_list: R,
    foreign_type_unit_list: R,
    bucket_data: R,
    hash_table_data: R,
    name_table_data: R,
    entry_offset_data: R,
    entry_pool: R,

    abbreviations: NameAbbreviations,
}

impl<R: Reader> NameIndex<R> {
    /// Create a new name index from a header.
    ///
    /// Every array is checked against the unit length before the
    /// abbreviation table is parsed.
    pub fn new(header: NameIndexHeader<R>) -> Result<Self> {
        let mut reader = header.content.clone();
        let mut offset = header.content_offset.0;
        let word_size = u64::from(header.format.word_size());

        let compile_units = DebugNamesOffset(offset);
        let compile_unit_list = split_region(
            &mut reader,
            &mut offset,
            u64::from(header.compile_unit_count) * word_size,
            TableRegion::UnitLists,
        )?;
        let local_type_units = DebugNamesOffset(offset);
        let local_type_unit_list = split_region(
            &mut reader,
            &mut offset,
            u64::from(header.local_type_unit_count) * word_size,
            TableRegion::UnitLists,
        )?;
        // Always 8 bytes per signature.
        let foreign_type_units = DebugNamesOffset(offset);
        let foreign_type_unit_list = split_region(
            &mut reader,
            &mut offset,
            u64::from(header.foreign_type_unit_count) * 8,
            TableRegion::UnitLists,
        )?;

        let hash_table_size = if header.bucket_count == 0 {
            0
        } else {
            u64::from(header.name_count) * 4
        };
        let buckets = DebugNamesOffset(offset);
        let bucket_data = split_region(
            &mut reader,
            &mut offset,
            u64::from(header.bucket_count) * 4,
            TableRegion::BucketsAndHashes,
        )?;
        let hashes = DebugNamesOffset(offset);
        let hash_table_data = split_region(
            &mut reader,
            &mut offset,
            hash_table_size,
            TableRegion::BucketsAndHashes,
        )?;

        let name_table_size = u64::from(header.name_count) * word_size;
        let string_offsets = DebugNamesOffset(offset);
        let name_table_data = split_region(
            &mut reader,
            &mut offset,
            name_table_size,
            TableRegion::NameTable,
        )?;
        let entry_offsets = DebugNamesOffset(offset);
        let entry_offset_data = split_region(
            &mut reader,
            &mut offset,
            name_table_size,
            TableRegion::NameTable,
        )?;

        let abbreviations = DebugNamesOffset(offset);
        let abbreviation_table = split_region(
            &mut reader,
            &mut offset,
            u64::from(header.abbrev_table_size),
            TableRegion::Abbreviations,
        )?;

        // Remaining data is the entry pool.
        let entries = DebugNamesOffset(offset);
        let end = DebugNamesOffset(offset + reader.len());
        let entry_pool = reader;

        let layout = NameIndexLayout {
            unit: header.offset,
            compile_units,
            local_type_units,
            foreign_type_units,
            buckets,
            hashes,
            string_offsets,
            entry_offsets,
            abbreviations,
            entries,
            end,
        };

        let abbreviations = NameAbbreviations::parse(abbreviation_table)?;
        tracing::trace!(
            offset = header.offset.0,
            names = header.name_count,
            abbreviations = abbreviations.len(),
            "parsed name index"
        );

        Ok(NameIndex {
            header,
            layout,
            compile_unit_list,
            local_type_unit_list,
            foreign_type_unit_list,
            bucket_data,
            hash_table_data,
            name_table_data,
            entry_offset_data,
            entry_pool,
            abbreviations,
        })
    }

    /// Return the header of this name index.
    pub fn header(&self) -> &NameIndexHeader<R> {
        &self.header
    }

    /// Return the section offsets of each part of this name index.
    pub fn layout(&self) -> &NameIndexLayout {
        &self.layout
    }

    /// Return the format (DWARF32 or DWARF64).
    pub fn format(&self) -> Format {
        self.header.format
    }

    /// Return the encoding used for the values of entries.
    ///
    /// Name indexes never contain addresses, so the address size is 0.
    pub fn encoding(&self) -> Encoding {
        Encoding {
            address_size: 0,
            format: self.header.format,
            version: self.header.version,
        }
    }

    fn word_size(&self) -> usize {
        usize::from(self.header.format.word_size())
    }

    /// Return the number of compilation units in this index.
    pub fn compile_unit_count(&self) -> u32 {
        self.header.compile_unit_count
    }

    /// Get the `.debug_info` offset of a compilation unit.
    ///
    /// `index` must be less than [`Self::compile_unit_count`].
    ///
    /// Returns an error if `index` is invalid.
    pub fn compile_unit(&self, index: u32) -> Result<DebugInfoOffset> {
        if index >= self.header.compile_unit_count {
            return Err(Error::InvalidNameAttributeIndex(u64::from(index)));
        }
        let mut reader = self.compile_unit_list.clone();
        reader.skip(index as usize * self.word_size())?;
        reader.read_offset(self.header.format).map(DebugInfoOffset)
    }

    /// Return the `.debug_info` offset of the default compilation unit, if any.
    ///
    /// If there is only one compilation unit, then entries may omit the `DW_IDX_compile_unit`
    /// attribute.
    pub fn default_compile_unit(&self) -> Result<Option<DebugInfoOffset>> {
        if self.header.compile_unit_count == 1 {
            self.compile_unit(0).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Return the number of local type units in this index.
    pub fn local_type_unit_count(&self) -> u32 {
        self.header.local_type_unit_count
    }

    /// Get the `.debug_info` offset of a local type unit.
    ///
    /// `index` must be less than [`Self::local_type_unit_count`].
    ///
    /// Returns an error if `index` is invalid.
    pub fn local_type_unit(&self, index: u32) -> Result<DebugInfoOffset> {
        if index >= self.header.local_type_unit_count {
            return Err(Error::InvalidNameAttributeIndex(u64::from(index)));
        }
        let mut reader = self.local_type_unit_list.clone();
        reader.skip(index as usize * self.word_size())?;
        reader.read_offset(self.header.format).map(DebugInfoOffset)
    }

    /// Return the number of foreign type units in this index.
    pub fn foreign_type_unit_count(&self) -> u32 {
        self.header.foreign_type_unit_count
    }

    /// Get the signature of a foreign type unit.
    ///
    /// `index` must be less than [`Self::foreign_type_unit_count`].
    ///
    /// Returns an error if `index` is invalid.
    pub fn foreign_type_unit(&self, index: u32) -> Result<DebugTypeSignature> {
        if index >= self.header.foreign_type_unit_count {
            return Err(Error::InvalidNameAttributeIndex(u64::from(index)));
        }
        let mut reader = self.foreign_type_unit_list.clone();
        reader.skip(index as usize * 8)?;
        reader.read_u64().map(DebugTypeSignature)
    }

    /// Return the number of type units in this index, both local and foreign.
    pub fn type_unit_count(&self) -> u32 {
        self.header
            .local_type_unit_count
            .saturating_add(self.header.foreign_type_unit_count)
    }

    /// Get a type unit reference.
    ///
    /// `index` must be less than [`Self::type_unit_count`], and normally is
    /// obtained from a `DW_IDX_type_unit` attribute.
    ///
    /// Returns an error if `index` is invalid.
    pub fn type_unit(&self, index: u32) -> Result<NameTypeUnit> {
        if let Some(foreign_index) = index.checked_sub(self.header.local_type_unit_count) {
            self.foreign_type_unit(foreign_index)
                .map(NameTypeUnit::Foreign)
                .map_err(|_| Error::InvalidNameAttributeIndex(u64::from(index)))
        } else {
            self.local_type_unit(index).map(NameTypeUnit::Local)
        }
    }

    /// Return true if the name index contains a hash table.
    pub fn has_hash_table(&self) -> bool {
        self.header.bucket_count != 0
    }

    /// Return the number of buckets in the hash table.
    pub fn bucket_count(&self) -> u32 {
        self.header.bucket_count
    }

    /// Return the index of the first name in a bucket.
    ///
    /// The given bucket index is 0 based, and must be less than [`Self::bucket_count`].
    ///
    /// Returns `Ok(None)` if the bucket is empty, and `Error::InvalidNameIndex`
    /// if the bucket refers to a name beyond the name count.
    pub fn bucket(&self, bucket_index: u32) -> Result<Option<NameTableIndex>> {
        if !self.has_hash_table() {
            return Err(Error::MissingHashTable);
        }
        if bucket_index >= self.header.bucket_count {
            return Err(Error::InvalidBucketIndex(bucket_index));
        }
        let mut reader = self.bucket_data.clone();
        reader.skip(bucket_index as usize * 4)?;
        match reader.read_u32()? {
            0 => Ok(None),
            index if index > self.header.name_count => Err(Error::InvalidNameIndex(index)),
            index => Ok(Some(NameTableIndex(index))),
        }
    }

    /// Return the hash of the name at the given index.
    pub fn hash(&self, index: NameTableIndex) -> Result<u32> {
        if !self.has_hash_table() {
            return Err(Error::MissingHashTable);
        }
        let position = self.name_position(index)?;
        let mut reader = self.hash_table_data.clone();
        reader.skip(position * 4)?;
        reader.read_u32()
    }

    /// Iterate over the hash entries for a bucket in the hash table.
    ///
    /// This function is only for diagnostic uses. Usually [`Self::find_by_hash`] should be
    /// called instead.
    ///
    /// The given bucket index is 0 based, and must be less than [`Self::bucket_count`].
    ///
    /// Returns an error if there is no hash table or the bucket index is invalid.
    /// Returns `Ok(None)` if the bucket is empty.
    pub fn find_by_bucket(&self, bucket_index: u32) -> Result<Option<NameBucketIter<R>>> {
        NameBucketIter::new(self, bucket_index)
    }

    /// Iterate over the indexes of the names with the given hash value.
    ///
    /// The user must then check each name to see if it matches the desired name.
    ///
    /// Returns an error if there is no hash table.
    pub fn find_by_hash(&self, hash_value: u32) -> Result<NameHashIter<R>> {
        NameHashIter::new(self, hash_value)
    }

    /// Find the index of a name, using the hash table if there is one.
    ///
    /// The hash table is searched with [`case_folding_djb_hash`], and the
    /// candidates are compared with `name` exactly. Without a hash table,
    /// every name is compared.
    ///
    /// A candidate whose string cannot be read is skipped.
    pub fn find_name(
        &self,
        name: &[u8],
        debug_str: &DebugStr<R>,
    ) -> Result<Option<NameTableIndex>> {
        if self.has_hash_table() {
            let mut indexes = self.find_by_hash(case_folding_djb_hash(name))?;
            while let Some(index) = indexes.next()? {
                if self.name_matches(index, name, debug_str) {
                    return Ok(Some(index));
                }
            }
        } else {
            for index in self.names() {
                if self.name_matches(index, name, debug_str) {
                    return Ok(Some(index));
                }
            }
        }
        Ok(None)
    }

    fn name_matches(&self, index: NameTableIndex, name: &[u8], debug_str: &DebugStr<R>) -> bool {
        let string = self
            .name_string(index, debug_str)
            .and_then(|string| Ok(string.to_slice()?.as_ref() == name));
        match string {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!(
                    offset = self.header.offset.0,
                    index = index.0,
                    error = %e,
                    "skipping unreadable name"
                );
                false
            }
        }
    }

    /// Get the number of names in the name index.
    ///
    /// This is the maximum valid [`NameTableIndex`].
    pub fn name_count(&self) -> u32 {
        self.header.name_count
    }

    /// Iterate over the indexes of all names in the name table.
    pub fn names(&self) -> NameTableIter {
        NameTableIter::new(self)
    }

    fn name_position(&self, index: NameTableIndex) -> Result<usize> {
        if index.0 == 0 || index.0 > self.header.name_count {
            return Err(Error::InvalidNameIndex(index.0));
        }
        Ok((index.0 - 1) as usize)
    }

    /// Get the string offset and the section offset of the entries for the
    /// name at the given index.
    ///
    /// Returns an error if `index` is invalid.
    pub fn name_table_entry(&self, index: NameTableIndex) -> Result<NameTableEntry> {
        let position = self.name_position(index)?;
        let string_offset = self.name_string_offset(index)?;

        let mut reader = self.entry_offset_data.clone();
        reader.skip(position * self.word_size())?;
        // Relative to the entry pool, so never relocated.
        let relative = reader.read_word(self.header.format)?;
        let entry_offset = self
            .layout
            .entries
            .0
            .checked_add(relative)
            .ok_or(Error::UnsupportedOffset)?;
        Ok(NameTableEntry {
            index,
            string_offset,
            entry_offset: DebugNamesOffset(entry_offset),
        })
    }

    /// Get the string table offset for the name at the given index.
    ///
    /// Returns an error if `index` is invalid.
    pub fn name_string_offset(&self, index: NameTableIndex) -> Result<DebugStrOffset> {
        let position = self.name_position(index)?;
        let mut reader = self.name_table_data.clone();
        reader.skip(position * self.word_size())?;
        reader.read_offset(self.header.format).map(DebugStrOffset)
    }

    /// Get the name at the given index using the provided `.debug_str` section.
    ///
    /// Returns an error if `index` is invalid, or the string table offset is invalid.
    pub fn name_string(&self, index: NameTableIndex, debug_str: &DebugStr<R>) -> Result<R> {
        let offset = self.name_string_offset(index)?;
        debug_str.get_str(offset)
    }

    /// Iterate over the series of entries for the given name table index.
    ///
    /// Each name in the name table has a corresponding series of entries
    /// with that name in the entry pool.
    ///
    /// Returns an error if `index` is invalid, or the entry pool offset is invalid.
    pub fn name_entries(&self, index: NameTableIndex) -> Result<NameEntryIter<'_, R>> {
        let entry = self.name_table_entry(index)?;
        let entries = self.entries_at(entry.entry_offset)?;
        Ok(NameEntryIter {
            name_index: self,
            entries,
            done: false,
        })
    }

    fn entries_at(&self, offset: DebugNamesOffset) -> Result<R> {
        let start = offset
            .0
            .checked_sub(self.layout.entries.0)
            .filter(|start| *start <= self.entry_pool.len())
            .ok_or(Error::OffsetOutOfBounds(offset.0 as u64))?;
        let mut entries = self.entry_pool.clone();
        entries.skip(start)?;
        Ok(entries)
    }

    /// Convert an offset within the entry pool to a section offset.
    pub fn entry_offset(&self, offset: NameEntryOffset) -> Result<DebugNamesOffset> {
        if offset.0 > self.entry_pool.len() {
            return Err(Error::OffsetOutOfBounds(offset.0 as u64));
        }
        Ok(DebugNamesOffset(self.layout.entries.0 + offset.0))
    }

    /// Parse the entry at the given section offset.
    ///
    /// Returns `Ok(None)` if the entry is the null entry that ends a series,
    /// `Error::InvalidAbbreviationCode` if the entry's abbreviation code is
    /// not in the abbreviation table, and `Error::UnterminatedEntryList` if
    /// the offset is at the end of the entry pool.
    pub fn entry(&self, offset: DebugNamesOffset) -> Result<Option<NameEntry<R>>> {
        let mut entries = self.entries_at(offset)?;
        NameEntry::parse(&mut entries, offset, &self.abbreviations, self.encoding())
    }

    /// Parse the entry at the given entry pool offset.
    ///
    /// This is useful for reading the entry referenced by a `DW_IDX_parent` attribute.
    pub fn name_entry(&self, offset: NameEntryOffset) -> Result<Option<NameEntry<R>>> {
        self.entry(self.entry_offset(offset)?)
    }

    /// Get the abbreviation table for name entries in this name index.
    pub fn abbreviations(&self) -> &NameAbbreviations {
        &self.abbreviations
    }
}

/// An iterator over the indexes of all names in a name index.
#[derive(Debug, Clone)]
pub struct NameTableIter {
    name_table_index: NameTableIndex,
    name_count: u32,
}

impl NameTableIter {
    fn new<R: Reader>(name_index: &NameIndex<R>) -> Self {
        NameTableIter {
            name_table_index: NameTableIndex(1),
            name_count: name_index.header.name_count,
        }
    }
}

impl Iterator for NameTableIter {
    type Item = NameTableIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let name_table_index = self.name_table_index;
        if name_table_index.0 > self.name_count {
            return None;
        }
        self.name_table_index.0 += 1;
        Some(name_table_index)
    }
}

/// An iterator over the hash entries for a bucket in a name index hash table.
#[derive(Debug, Clone)]
pub struct NameBucketIter<R: Reader> {
    reader: R,
    name_table_index: NameTableIndex,
    name_count: u32,
    bucket_index: u32,
    bucket_count: u32,
}

impl<R: Reader> NameBucketIter<R> {
    fn new(name_index: &NameIndex<R>, bucket_index: u32) -> Result<Option<Self>> {
        let Some(name_table_index) = name_index.bucket(bucket_index)? else {
            return Ok(None);
        };

        let mut reader = name_index.hash_table_data.clone();
        reader.skip((name_table_index.0 - 1) as usize * 4)?;

        Ok(Some(NameBucketIter {
            reader,
            name_table_index,
            name_count: name_index.header.name_count,
            bucket_index,
            bucket_count: name_index.header.bucket_count,
        }))
    }

    /// Advance the iterator and return the next name table index and hash.
    ///
    /// Iteration stops at the first hash that belongs to a different bucket.
    pub fn next(&mut self) -> Result<Option<(NameTableIndex, u32)>> {
        let name_table_index = self.name_table_index;
        if name_table_index.0 > self.name_count {
            return Ok(None);
        }
        let hash = self.reader.read_u32()?;
        if hash % self.bucket_count != self.bucket_index {
            self.name_table_index.0 = self.name_count.saturating_add(1);
            return Ok(None);
        }
        self.name_table_index.0 += 1;
        Ok(Some((name_table_index, hash)))
    }
}

#[cfg(feature = "fallible-iterator")]
impl<R: Reader> fallible_iterator::FallibleIterator for NameBucketIter<R> {
    type Item = (NameTableIndex, u32);
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        NameBucketIter::next(self)
    }
}

impl<R: Reader> Iterator for NameBucketIter<R> {
    type Item = Result<(NameTableIndex, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        NameBucketIter::next(self).transpose()
    }
}

/// An iterator over the indexes of the names in a name index hash table that match a hash
/// value.
#[derive(Debug, Clone)]
pub struct NameHashIter<R: Reader> {
    bucket_iter: Option<NameBucketIter<R>>,
    hash: u32,
}

impl<R: Reader> NameHashIter<R> {
    fn new(name_index: &NameIndex<R>, hash: u32) -> Result<Self> {
        if !name_index.has_hash_table() {
            return Err(Error::MissingHashTable);
        }
        let bucket_index = hash % name_index.header.bucket_count;
        let bucket_iter = NameBucketIter::new(name_index, bucket_index)?;

        Ok(NameHashIter { bucket_iter, hash })
    }

    /// Advance the iterator and return the next name table index.
    pub fn next(&mut self) -> Result<Option<NameTableIndex>> {
        let Some(bucket_iter) = &mut self.bucket_iter else {
            return Ok(None);
        };
        while let Some((name_table_index, hash)) = bucket_iter.next()? {
            if hash == self.hash {
                return Ok(Some(name_table_index));
            }
        }
        Ok(None)
    }
}

#[cfg(feature = "fallible-iterator")]
impl<R: Reader> fallible_iterator::FallibleIterator for NameHashIter<R> {
    type Item = NameTableIndex;
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        NameHashIter::next(self)
    }
}

impl<R: Reader> Iterator for NameHashIter<R> {
    type Item = Result<NameTableIndex>;

    fn next(&mut self) -> Option<Self::Item> {
        NameHashIter::next(self).transpose()
    }
}

/// An iterator for a series of name entries in a name index entry pool.
///
/// Each name in a name index corresponds to a series of entries
/// with that name.
#[derive(Debug, Clone)]
pub struct NameEntryIter<'a, R: Reader> {
    name_index: &'a NameIndex<R>,
    entries: R,
    done: bool,
}

impl<'a, R: Reader> NameEntryIter<'a, R> {
    /// Advance the iterator and return the next name entry.
    ///
    /// Returns `Ok(None)` after the null entry that ends the series. After
    /// an error, the rest of the series is abandoned.
    pub fn next(&mut self) -> Result<Option<NameEntry<R>>> {
        if self.done {
            return Ok(None);
        }

        let offset = DebugNamesOffset(
            self.name_index.layout.entries.0
                + self.entries.offset_from(&self.name_index.entry_pool),
        );
        let result = NameEntry::parse(
            &mut self.entries,
            offset,
            &self.name_index.abbreviations,
            self.name_index.encoding(),
        );
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }
}

#[cfg(feature = "fallible-iterator")]
impl<'a, R: Reader> fallible_iterator::FallibleIterator for NameEntryIter<'a, R> {
    type Item = NameEntry<R>;
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        NameEntryIter::next(self)
    }
}

impl<'a, R: Reader> Iterator for NameEntryIter<'a, R> {
    type Item = Result<NameEntry<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        NameEntryIter::next(self).transpose()
    }
}

/// An offset into the entry pool of a name index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct NameEntryOffset(pub usize);

/// A parsed entry from the `.debug_names` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry<R: Reader> {
    /// The section offset of the entry.
    pub offset: DebugNamesOffset,

    /// The abbreviation code for this entry.
    pub abbrev_code: u64,

    /// The DIE tag for this entry.
    pub tag: constants::DwTag,

    /// The attributes for this entry.
    pub attrs: Vec<NameAttribute<R>>,
}

impl<R: Reader> NameEntry<R> {
    fn attr(&self, index: constants::DwIdx) -> Option<&NameAttribute<R>> {
        self.attrs.iter().find(|attr| attr.index == index)
    }

    /// Get the value of the `DW_IDX_compile_unit` attribute, if any.
    ///
    /// If neither `DW_IDX_compile_unit` nor `DW_IDX_type_unit` exist then you should use
    /// [`NameIndex::default_compile_unit`].
    ///
    /// If both `DW_IDX_compile_unit` and `DW_IDX_type_unit` exist then this value is for
    /// a skeleton CU that may be used to locate a split DWARF object file containing
    /// the type unit.
    pub fn compile_unit(&self, names: &NameIndex<R>) -> Result<Option<DebugInfoOffset>> {
        self.attr(constants::DW_IDX_compile_unit)
            .map(|attr| attr.compile_unit(names))
            .transpose()
    }

    /// Get the value of the `DW_IDX_type_unit` attribute, if any.
    pub fn type_unit(&self, names: &NameIndex<R>) -> Result<Option<NameTypeUnit>> {
        self.attr(constants::DW_IDX_type_unit)
            .map(|attr| attr.type_unit(names))
            .transpose()
    }

    /// Get the value of the `DW_IDX_die_offset` attribute, if any.
    ///
    /// This is the offset of the DIE within the compile unit or type unit.
    pub fn die_offset(&self) -> Result<Option<UnitOffset>> {
        self.attr(constants::DW_IDX_die_offset)
            .map(NameAttribute::die_offset)
            .transpose()
    }

    /// Get the value of the `DW_IDX_parent` attribute, if any.
    ///
    /// Returns `Ok(Some(Some(offset)))` if the DIE parent is indexed.
    /// Returns `Ok(Some(None))` if the DIE parent is not indexed.
    /// Returns `Ok(None)` if it is unknown whether the DIE parent is indexed
    /// because the producer did not generate a `DW_IDX_parent` attribute.
    pub fn parent(&self) -> Result<Option<Option<NameEntryOffset>>> {
        self.attr(constants::DW_IDX_parent)
            .map(NameAttribute::parent)
            .transpose()
    }

    /// Get the value of the `DW_IDX_type_hash` attribute, if any.
    pub fn type_hash(&self) -> Result<Option<u64>> {
        self.attr(constants::DW_IDX_type_hash)
            .map(NameAttribute::type_hash)
            .transpose()
    }

    /// Parse a single entry from the entry pool.
    fn parse(
        entry_reader: &mut R,
        offset: DebugNamesOffset,
        abbreviations: &NameAbbreviations,
        encoding: Encoding,
    ) -> Result<Option<NameEntry<R>>> {
        if entry_reader.is_empty() {
            return Err(Error::UnterminatedEntryList);
        }
        let abbrev_code = entry_reader.read_uleb128().map_err(|e| match e {
            Error::UnexpectedEof(_) => Error::UnterminatedEntryList,
            e => e,
        })?;
        if abbrev_code == 0 {
            return Ok(None);
        }
        let Some(abbrev) = abbreviations.get(abbrev_code) else {
            return Err(Error::InvalidAbbreviationCode(abbrev_code));
        };
        let mut attrs = Vec::with_capacity(abbrev.attributes.len());
        for attr in &abbrev.attributes {
            let value = FormValue::parse(entry_reader, attr.form, encoding)?;
            attrs.push(NameAttribute {
                index: attr.index,
                form: attr.form,
                value,
            });
        }

        Ok(Some(NameEntry {
            offset,
            abbrev_code,
            tag: abbrev.tag,
            attrs,
        }))
    }
}

/// A parsed attribute for a [`NameEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAttribute<R: Reader> {
    index: constants::DwIdx,
    form: constants::DwForm,
    value: FormValue<R>,
}

impl<R: Reader> NameAttribute<R> {
    /// Get the attribute index kind.
    pub fn index(&self) -> constants::DwIdx {
        self.index
    }

    /// Get the attribute form.
    pub fn form(&self) -> constants::DwForm {
        self.form
    }

    /// Get the attribute value.
    ///
    /// Interpretation of this value depends on the index kind and form.
    pub fn value(&self) -> &FormValue<R> {
        &self.value
    }

    fn unit_index(&self) -> Result<u32> {
        let val = self
            .value
            .unsigned_constant()
            .ok_or(Error::UnsupportedAttributeForm(self.form))?;
        u32::try_from(val).map_err(|_| Error::InvalidNameAttributeIndex(val))
    }

    /// Get the value of a `DW_IDX_compile_unit` attribute.
    pub fn compile_unit(&self, names: &NameIndex<R>) -> Result<DebugInfoOffset> {
        names.compile_unit(self.unit_index()?)
    }

    /// Get the value of a `DW_IDX_type_unit` attribute.
    pub fn type_unit(&self, names: &NameIndex<R>) -> Result<NameTypeUnit> {
        names.type_unit(self.unit_index()?)
    }

    /// Get the value of a `DW_IDX_die_offset` attribute.
    pub fn die_offset(&self) -> Result<UnitOffset> {
        self.value
            .unit_ref()
            .ok_or(Error::UnsupportedAttributeForm(self.form))
    }

    /// Get the value of a `DW_IDX_parent` attribute.
    ///
    /// Returns `Ok(Some(offset))` if the DIE parent is indexed.
    /// Returns `Ok(None)` if the DIE parent is not indexed.
    pub fn parent(&self) -> Result<Option<NameEntryOffset>> {
        match self.value {
            FormValue::UnitRef(offset) => Ok(Some(NameEntryOffset(offset.0))),
            FormValue::Flag(true) => Ok(None),
            _ => Err(Error::UnsupportedAttributeForm(self.form)),
        }
    }

    /// Get the value of a `DW_IDX_type_hash` attribute.
    pub fn type_hash(&self) -> Result<u64> {
        self.value
            .unsigned_constant()
            .ok_or(Error::UnsupportedAttributeForm(self.form))
    }
}

/// A table of name entry abbreviations, keyed by code.
#[derive(Debug, Default, Clone)]
pub struct NameAbbreviations {
    abbreviations: BTreeMap<u64, NameAbbreviation>,
}

impl NameAbbreviations {
    /// Get an abbreviation by its code.
    pub fn get(&self, code: u64) -> Option<&NameAbbreviation> {
        self.abbreviations.get(&code)
    }

    /// Iterate over the abbreviations in order of their codes.
    pub fn iter(&self) -> impl Iterator<Item = &NameAbbreviation> + '_ {
        self.abbreviations.values()
    }

    /// Return the number of abbreviations.
    pub fn len(&self) -> usize {
        self.abbreviations.len()
    }

    /// Return true if there are no abbreviations.
    pub fn is_empty(&self) -> bool {
        self.abbreviations.is_empty()
    }

    /// Parse the abbreviation table from a reader that covers exactly the
    /// declared size of the table.
    ///
    /// The table must end with a null code before the reader is exhausted.
    fn parse<R: Reader>(mut reader: R) -> Result<NameAbbreviations> {
        fn unterminated(e: Error) -> Error {
            match e {
                Error::UnexpectedEof(_) => Error::UnterminatedAbbreviationTable,
                e => e,
            }
        }

        let mut abbreviations = BTreeMap::new();
        loop {
            if reader.is_empty() {
                return Err(Error::UnterminatedAbbreviationTable);
            }
            let code = reader.read_uleb128().map_err(unterminated)?;
            if code == 0 {
                break;
            }

            let tag = constants::DwTag(reader.read_uleb128_u16().map_err(unterminated)?);
            let mut attributes = Vec::new();
            loop {
                if reader.is_empty() {
                    return Err(Error::UnterminatedAbbreviationTable);
                }
                let index = reader.read_uleb128_u16().map_err(unterminated)?;
                let form = reader.read_uleb128_u16().map_err(unterminated)?;
                if index == 0 && form == 0 {
                    break;
                }
                attributes.push(NameAbbreviationAttribute {
                    index: constants::DwIdx(index),
                    form: constants::DwForm(form),
                });
            }

            match abbreviations.entry(code) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(NameAbbreviation {
                        code,
                        tag,
                        attributes,
                    });
                }
                btree_map::Entry::Occupied(_) => {
                    return Err(Error::DuplicateAbbreviationCode(code));
                }
            }
        }

        Ok(NameAbbreviations { abbreviations })
    }
}

/// A name abbreviation entry defines how name entries are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAbbreviation {
    code: u64,
    tag: constants::DwTag,
    attributes: Vec<NameAbbreviationAttribute>,
}

impl NameAbbreviation {
    /// Get the abbreviation code.
    pub fn code(&self) -> u64 {
        self.code
    }

    /// Get the DIE tag.
    pub fn tag(&self) -> constants::DwTag {
        self.tag
    }

    /// Get the attribute specifications.
    pub fn attributes(&self) -> &[NameAbbreviationAttribute] {
        &self.attributes
    }
}

/// An attribute specification in a name abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAbbreviationAttribute {
    index: constants::DwIdx,
    form: constants::DwForm,
}

impl NameAbbreviationAttribute {
    /// Get the attribute index kind.
    pub fn index(&self) -> constants::DwIdx {
        self.index
    }

    /// Get the attribute form.
    pub fn form(&self) -> constants::DwForm {
        self.form
    }
}
