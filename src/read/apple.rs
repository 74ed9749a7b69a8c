//! Functions for parsing the Apple accelerator tables.
//!
//! The `.apple_names`, `.apple_types`, `.apple_namespaces` and `.apple_objc`
//! sections (`__apple_names` etc. in Mach-O files) all share one layout:
//!
//! - **Header**: magic, version, hash function, bucket and hash counts, and
//!   the length of the header data.
//! - **Header data**: the DIE offset base and a list of atoms, which describe
//!   the fields stored for each entry.
//! - **Buckets**: the index of the first hash in each bucket, or `u32::MAX`
//!   for an empty bucket.
//! - **Hashes**: the hash of each name, grouped by bucket.
//! - **Offsets**: for each hash, the section offset of a chain of names that
//!   share that hash.
//!
//! Each name in a chain is a `.debug_str` offset followed by a count of
//! entries, and each entry holds one value per atom. A zero string offset
//! ends the chain.

use alloc::vec::Vec;

use crate::common::{AppleTableOffset, DebugStrOffset, Encoding, Format};
use crate::constants;
use crate::endianity::Endianity;
use crate::hash::djb_hash;
use crate::read::{
    form_has_class, DebugStr, EndianSlice, Error, FormClass, FormValue, Reader, Result,
    TableRegion,
};

/// The size of the fixed part of an Apple table header.
const HEADER_SIZE: usize = 20;

/// The value of a bucket that contains no hashes.
const EMPTY_BUCKET: u32 = u32::MAX;

/// The fixed size header of an Apple accelerator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppleHeader {
    magic: u32,
    version: u16,
    hash_function: constants::DwHashFunction,
    bucket_count: u32,
    hash_count: u32,
    header_data_length: u32,
}

impl AppleHeader {
    fn parse<R: Reader>(input: &mut R) -> Result<Self> {
        if input.len() < HEADER_SIZE {
            return Err(Error::SectionTooSmall(TableRegion::Header));
        }
        Ok(AppleHeader {
            magic: input.read_u32()?,
            version: input.read_u16()?,
            hash_function: constants::DwHashFunction(input.read_u16()?),
            bucket_count: input.read_u32()?,
            hash_count: input.read_u32()?,
            header_data_length: input.read_u32()?,
        })
    }

    /// The magic number, which is normally [`constants::APPLE_HASH_MAGIC`].
    #[inline]
    pub fn magic(&self) -> u32 {
        self.magic
    }

    /// The version of the table format.
    #[inline]
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The hash function that the producer used.
    #[inline]
    pub fn hash_function(&self) -> constants::DwHashFunction {
        self.hash_function
    }

    /// The number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// The number of hashes, which is also the number of data offsets.
    #[inline]
    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    /// The length in bytes of the header data that follows the header.
    #[inline]
    pub fn header_data_length(&self) -> u32 {
        self.header_data_length
    }
}

/// The description of one field of each entry in an Apple table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppleAtom {
    atom: constants::DwAtom,
    form: constants::DwForm,
}

impl AppleAtom {
    /// Construct a new atom description.
    pub fn new(atom: constants::DwAtom, form: constants::DwForm) -> Self {
        AppleAtom { atom, form }
    }

    /// The kind of value.
    #[inline]
    pub fn atom(&self) -> constants::DwAtom {
        self.atom
    }

    /// The form that the value is encoded with.
    #[inline]
    pub fn form(&self) -> constants::DwForm {
        self.form
    }
}

/// An Apple accelerator table, such as the `.apple_names` section.
///
/// Parsing checks that the header, header data and the bucket, hash and
/// offset arrays are all within the section. The name chains that the
/// offsets point to are only read by lookups and iteration.
#[derive(Debug, Clone)]
pub struct AppleAccelTable<R: Reader> {
    section: R,
    debug_str: DebugStr<R>,
    header: AppleHeader,
    die_offset_base: u32,
    atoms: Vec<AppleAtom>,
    buckets: R,
    hashes: R,
    offsets: R,
}

impl<'input, Endian> AppleAccelTable<EndianSlice<'input, Endian>>
where
    Endian: Endianity,
{
    /// Parse an Apple accelerator table from the data in the section and
    /// the `.debug_str` section that its names refer to.
    ///
    /// ```
    /// use dwarf_accel::{AppleAccelTable, LittleEndian};
    ///
    /// # let buf = [0x48, 0x53, 0x41, 0x48, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0,
    /// #            8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
    /// # let read_apple_names_section_somehow = || &buf;
    /// # let debug_str_buf: [u8; 0] = [];
    /// # let read_debug_str_section_somehow = || &debug_str_buf;
    /// let table = AppleAccelTable::new(
    ///     read_apple_names_section_somehow(),
    ///     read_debug_str_section_somehow(),
    ///     LittleEndian,
    /// )
    /// .unwrap();
    /// assert_eq!(table.bucket_count(), 1);
    /// ```
    pub fn new(section: &'input [u8], debug_str: &'input [u8], endian: Endian) -> Result<Self> {
        AppleAccelTable::parse(
            EndianSlice::new(section, endian),
            DebugStr::new(debug_str, endian),
        )
    }
}

impl<R: Reader> AppleAccelTable<R> {
    /// Parse an Apple accelerator table.
    ///
    /// Returns `Error::SectionTooSmall` naming the first region that does not
    /// fit in the section.
    pub fn parse(section: R, debug_str: DebugStr<R>) -> Result<Self> {
        let mut input = section.clone();
        let header = AppleHeader::parse(&mut input)?;

        let tables_size = HEADER_SIZE as u64
            + u64::from(header.header_data_length)
            + u64::from(header.bucket_count) * 4
            + u64::from(header.hash_count) * 8;
        if tables_size > section.len() as u64 {
            return Err(Error::SectionTooSmall(TableRegion::BucketsAndHashes));
        }

        let mut header_data = input.split(header.header_data_length as usize)?;
        let (die_offset_base, atoms) = Self::parse_header_data(&mut header_data)
            .map_err(|_| Error::SectionTooSmall(TableRegion::HeaderData))?;

        let buckets = input.split(header.bucket_count as usize * 4)?;
        let hashes = input.split(header.hash_count as usize * 4)?;
        let offsets = input.split(header.hash_count as usize * 4)?;

        if header.magic != constants::APPLE_HASH_MAGIC {
            tracing::debug!(magic = header.magic, "unexpected apple table magic");
        }
        tracing::trace!(
            buckets = header.bucket_count,
            hashes = header.hash_count,
            atoms = atoms.len(),
            "parsed apple table"
        );

        Ok(AppleAccelTable {
            section,
            debug_str,
            header,
            die_offset_base,
            atoms,
            buckets,
            hashes,
            offsets,
        })
    }

    fn parse_header_data(input: &mut R) -> Result<(u32, Vec<AppleAtom>)> {
        let die_offset_base = input.read_u32()?;
        let atom_count = input.read_u32()?;
        if u64::from(atom_count) * 4 > input.len() as u64 {
            return Err(Error::UnexpectedEof(input.offset_id()));
        }
        let mut atoms = Vec::with_capacity(atom_count as usize);
        for _ in 0..atom_count {
            let atom = constants::DwAtom(input.read_u16()?);
            let form = constants::DwForm(input.read_u16()?);
            atoms.push(AppleAtom { atom, form });
        }
        Ok((die_offset_base, atoms))
    }

    /// The fixed size header.
    #[inline]
    pub fn header(&self) -> &AppleHeader {
        &self.header
    }

    /// The base that DIE offsets are relative to.
    #[inline]
    pub fn die_offset_base(&self) -> u32 {
        self.die_offset_base
    }

    /// The description of the fields of each entry, in order.
    #[inline]
    pub fn atoms(&self) -> &[AppleAtom] {
        &self.atoms
    }

    /// The number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> u32 {
        self.header.bucket_count
    }

    /// The number of hashes.
    #[inline]
    pub fn hash_count(&self) -> u32 {
        self.header.hash_count
    }

    /// The length of the header data.
    #[inline]
    pub fn header_data_length(&self) -> u32 {
        self.header.header_data_length
    }

    /// The `.debug_str` section that names are read from.
    #[inline]
    pub fn debug_str(&self) -> &DebugStr<R> {
        &self.debug_str
    }

    /// The encoding used to decode entry values.
    ///
    /// Apple tables are always 32-bit, and never contain addresses.
    pub fn encoding(&self) -> Encoding {
        Encoding {
            address_size: 0,
            format: Format::Dwarf32,
            version: self.header.version,
        }
    }

    /// Return true if the atoms that are interpreted by this crate use forms
    /// that can be read as unsigned constants.
    ///
    /// The `DW_ATOM_die_offset`, `DW_ATOM_die_tag` and `DW_ATOM_type_flags`
    /// atoms must use a constant or flag form, and must not use
    /// `DW_FORM_sdata`.
    pub fn validate_forms(&self) -> bool {
        self.atoms.iter().all(|atom| match atom.atom {
            constants::DW_ATOM_die_offset
            | constants::DW_ATOM_die_tag
            | constants::DW_ATOM_type_flags => {
                (form_has_class(atom.form, FormClass::Constant)
                    || form_has_class(atom.form, FormClass::Flag))
                    && atom.form != constants::DW_FORM_sdata
            }
            _ => true,
        })
    }

    /// Decode the values of a single entry, advancing `input` past it.
    pub fn read_entry(&self, input: &mut R) -> Result<AppleEntry<R>> {
        let encoding = self.encoding();
        let mut values = Vec::with_capacity(self.atoms.len());
        for atom in &self.atoms {
            let value = FormValue::parse(input, atom.form, encoding)?;
            values.push(AppleAtomValue {
                atom: atom.atom,
                form: atom.form,
                value,
            });
        }
        Ok(AppleEntry { values })
    }

    /// Decode a single entry and return its DIE offset and tag.
    ///
    /// Missing values default to [`constants::DW_INVALID_OFFSET`] and
    /// `DW_TAG_null`.
    pub fn read_atoms(&self, input: &mut R) -> Result<(u64, constants::DwTag)> {
        let entry = self.read_entry(input)?;
        Ok((entry.die_offset(), entry.tag()))
    }

    fn skip_entries(&self, input: &mut R, count: u32) -> Result<()> {
        if self.atoms.is_empty() {
            return Ok(());
        }
        let encoding = self.encoding();
        for _ in 0..count {
            for atom in &self.atoms {
                FormValue::skip(input, atom.form, encoding)?;
            }
        }
        Ok(())
    }

    /// Return the index of the first hash in the given bucket.
    ///
    /// Returns `Ok(None)` if the bucket is empty.
    pub fn bucket(&self, bucket_index: u32) -> Result<Option<u32>> {
        if bucket_index >= self.header.bucket_count {
            return Err(Error::InvalidBucketIndex(bucket_index));
        }
        let mut reader = self.buckets.clone();
        reader.skip(bucket_index as usize * 4)?;
        match reader.read_u32()? {
            EMPTY_BUCKET => Ok(None),
            index => Ok(Some(index)),
        }
    }

    /// Return the hash value at the given index in the hash array.
    pub fn hash(&self, hash_index: u32) -> Result<u32> {
        if hash_index >= self.header.hash_count {
            return Err(Error::InvalidNameIndex(hash_index));
        }
        let mut reader = self.hashes.clone();
        reader.skip(hash_index as usize * 4)?;
        reader.read_u32()
    }

    /// Return the section offset of the name chain for the given hash index.
    pub fn data_offset(&self, hash_index: u32) -> Result<AppleTableOffset> {
        if hash_index >= self.header.hash_count {
            return Err(Error::InvalidNameIndex(hash_index));
        }
        let mut reader = self.offsets.clone();
        reader.skip(hash_index as usize * 4)?;
        reader.read_u32().map(|offset| AppleTableOffset(offset as usize))
    }

    /// Iterate over the hash slots of a bucket.
    ///
    /// This is mainly for diagnostic uses. Usually [`Self::lookup`] should be
    /// called instead.
    ///
    /// Returns an error if the bucket index is invalid, and `Ok(None)` if the
    /// bucket is empty.
    pub fn find_by_bucket(&self, bucket_index: u32) -> Result<Option<AppleBucketIter<'_, R>>> {
        Ok(self
            .bucket(bucket_index)?
            .map(|hash_index| AppleBucketIter {
                table: self,
                bucket_index,
                hash_index,
            }))
    }

    /// Iterate over the chain of names at the given section offset.
    ///
    /// Returns `Error::OffsetOutOfBounds` if the offset is not within the
    /// section.
    pub fn names_at(&self, offset: AppleTableOffset) -> Result<AppleNameIter<'_, R>> {
        if offset.0 >= self.section.len() {
            return Err(Error::OffsetOutOfBounds(offset.0 as u64));
        }
        let mut input = self.section.clone();
        input.skip(offset.0)?;
        Ok(AppleNameIter {
            table: self,
            input,
            done: false,
        })
    }

    /// Look up the entries for a name.
    ///
    /// Only the chain of the bucket that the name hashes into is searched.
    /// If the name is not present, the returned iterator is empty.
    ///
    /// A name in the chain whose string cannot be read is skipped. An error is
    /// returned only if the chain itself cannot be followed.
    pub fn lookup(&self, name: &[u8]) -> Result<AppleValueIter<'_, R>> {
        if self.header.bucket_count == 0 {
            return Ok(AppleValueIter::end());
        }
        let hash = djb_hash(name);
        let bucket_index = hash % self.header.bucket_count;
        let mut slots = match self.find_by_bucket(bucket_index)? {
            Some(slots) => slots,
            None => return Ok(AppleValueIter::end()),
        };
        while let Some(slot) = slots.next()? {
            if slot.hash != hash {
                continue;
            }
            let mut names = self.names_at(slot.data_offset)?;
            while let Some(candidate) = names.next()? {
                let string = candidate
                    .name(&self.debug_str)
                    .and_then(|string| Ok(string.to_slice()?.as_ref() == name));
                match string {
                    Ok(true) => return Ok(candidate.entries(self)),
                    Ok(false) => {}
                    Err(e) => {
                        tracing::debug!(
                            offset = candidate.offset.0,
                            string_offset = candidate.string_offset.0,
                            error = %e,
                            "skipping unreadable apple name"
                        );
                    }
                }
            }
        }
        Ok(AppleValueIter::end())
    }

    fn section_offset(&self, input: &R) -> AppleTableOffset {
        AppleTableOffset(input.offset_from(&self.section))
    }
}

/// One slot of the hash array of an Apple table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppleHashSlot {
    /// The index of the slot in the hash and offset arrays.
    pub index: u32,
    /// The hash of the names in this slot.
    pub hash: u32,
    /// The section offset of the chain of names with this hash.
    pub data_offset: AppleTableOffset,
}

/// An iterator over the hash slots of one bucket of an Apple table.
#[derive(Debug, Clone)]
pub struct AppleBucketIter<'a, R: Reader> {
    table: &'a AppleAccelTable<R>,
    bucket_index: u32,
    hash_index: u32,
}

impl<'a, R: Reader> AppleBucketIter<'a, R> {
    /// Advance the iterator and return the next hash slot.
    ///
    /// Iteration stops at the first hash that belongs to a different bucket.
    pub fn next(&mut self) -> Result<Option<AppleHashSlot>> {
        let index = self.hash_index;
        if index >= self.table.header.hash_count {
            return Ok(None);
        }
        let hash = self.table.hash(index)?;
        if hash % self.table.header.bucket_count != self.bucket_index {
            self.hash_index = self.table.header.hash_count;
            return Ok(None);
        }
        self.hash_index += 1;
        let data_offset = self.table.data_offset(index)?;
        Ok(Some(AppleHashSlot {
            index,
            hash,
            data_offset,
        }))
    }
}

#[cfg(feature = "fallible-iterator")]
impl<'a, R: Reader> fallible_iterator::FallibleIterator for AppleBucketIter<'a, R> {
    type Item = AppleHashSlot;
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        AppleBucketIter::next(self)
    }
}

impl<'a, R: Reader> Iterator for AppleBucketIter<'a, R> {
    type Item = Result<AppleHashSlot>;

    fn next(&mut self) -> Option<Self::Item> {
        AppleBucketIter::next(self).transpose()
    }
}

/// A name in a chain of names that share a hash.
#[derive(Debug, Clone)]
pub struct AppleName<R: Reader> {
    offset: AppleTableOffset,
    string_offset: DebugStrOffset,
    entry_count: u32,
    data: R,
}

impl<R: Reader> AppleName<R> {
    /// The section offset of this name.
    #[inline]
    pub fn offset(&self) -> AppleTableOffset {
        self.offset
    }

    /// The `.debug_str` offset of the name string.
    #[inline]
    pub fn string_offset(&self) -> DebugStrOffset {
        self.string_offset
    }

    /// The number of entries for this name, as declared in the table.
    #[inline]
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// The raw data of the entries, which extends to the end of the section.
    #[inline]
    pub fn data(&self) -> &R {
        &self.data
    }

    /// Read the name string from `.debug_str`.
    pub fn name(&self, debug_str: &DebugStr<R>) -> Result<R> {
        debug_str.get_str(self.string_offset)
    }

    /// Iterate over the entries for this name.
    pub fn entries<'a>(&self, table: &'a AppleAccelTable<R>) -> AppleValueIter<'a, R> {
        AppleValueIter::with_count(table, self.data.clone(), self.entry_count)
    }
}

/// An iterator over a chain of names in an Apple table.
#[derive(Debug, Clone)]
pub struct AppleNameIter<'a, R: Reader> {
    table: &'a AppleAccelTable<R>,
    input: R,
    done: bool,
}

impl<'a, R: Reader> AppleNameIter<'a, R> {
    /// Advance the iterator and return the next name.
    ///
    /// Returns `Error::UnterminatedNameList` if the section ends before the
    /// zero string offset that ends the chain. If the entries of a name
    /// cannot be skipped, that name is returned and iteration ends after it.
    pub fn next(&mut self) -> Result<Option<AppleName<R>>> {
        if self.done {
            return Ok(None);
        }
        if self.input.len() < 4 {
            self.done = true;
            return Err(Error::UnterminatedNameList);
        }

        let offset = self.table.section_offset(&self.input);
        let string_offset = self.input.read_offset(Format::Dwarf32)?;
        if string_offset == 0 {
            self.done = true;
            return Ok(None);
        }
        let entry_count = match self.input.read_u32() {
            Ok(count) => count,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        let data = self.input.clone();
        if let Err(e) = self.table.skip_entries(&mut self.input, entry_count) {
            tracing::debug!(offset = offset.0, error = %e, "abandoning apple name chain");
            self.done = true;
        }

        Ok(Some(AppleName {
            offset,
            string_offset: DebugStrOffset(string_offset),
            entry_count,
            data,
        }))
    }
}

#[cfg(feature = "fallible-iterator")]
impl<'a, R: Reader> fallible_iterator::FallibleIterator for AppleNameIter<'a, R> {
    type Item = AppleName<R>;
    type Error = Error;

    fn next(&mut self) -> ::core::result::Result<Option<Self::Item>, Self::Error> {
        AppleNameIter::next(self)
    }
}

impl<'a, R: Reader> Iterator for AppleNameIter<'a, R> {
    type Item = Result<AppleName<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        AppleNameIter::next(self).transpose()
    }
}

/// A decoded value of an Apple table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppleAtomValue<R: Reader> {
    atom: constants::DwAtom,
    form: constants::DwForm,
    value: FormValue<R>,
}

impl<R: Reader> AppleAtomValue<R> {
    /// The kind of value.
    #[inline]
    pub fn atom(&self) -> constants::DwAtom {
        self.atom
    }

    /// The form that the value was decoded from.
    #[inline]
    pub fn form(&self) -> constants::DwForm {
        self.form
    }

    /// The decoded value.
    #[inline]
    pub fn value(&self) -> &FormValue<R> {
        &self.value
    }
}

/// The decoded values of one entry of an Apple table, one per atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleEntry<R: Reader> {
    values: Vec<AppleAtomValue<R>>,
}

impl<R: Reader> AppleEntry<R> {
    /// The values, in the order of the table's atoms.
    #[inline]
    pub fn values(&self) -> &[AppleAtomValue<R>] {
        &self.values
    }

    fn constant(&self, atom: constants::DwAtom) -> Option<u64> {
        self.values
            .iter()
            .find(|value| value.atom == atom)
            .and_then(|value| value.value.unsigned_constant())
    }

    /// The offset of the DIE, or [`constants::DW_INVALID_OFFSET`] if the
    /// table has no usable `DW_ATOM_die_offset` atom.
    pub fn die_offset(&self) -> u64 {
        self.constant(constants::DW_ATOM_die_offset)
            .unwrap_or(constants::DW_INVALID_OFFSET)
    }

    /// The tag of the DIE, or `DW_TAG_null` if the table has no usable
    /// `DW_ATOM_die_tag` atom.
    pub fn tag(&self) -> constants::DwTag {
        self.constant(constants::DW_ATOM_die_tag)
            .map(|tag| constants::DwTag(tag as u16))
            .unwrap_or(constants::DW_TAG_null)
    }

    /// The `DW_ATOM_type_flags` value, if any.
    pub fn type_flags(&self) -> Option<u64> {
        self.constant(constants::DW_ATOM_type_flags)
    }

    /// The `DW_ATOM_qual_name_hash` value, if any.
    pub fn qualified_name_hash(&self) -> Option<u64> {
        self.constant(constants::DW_ATOM_qual_name_hash)
    }
}

/// An iterator over the entries for one name in an Apple table.
///
/// The first entry is decoded when the iterator is created, and each call to
/// `next` decodes the one after it. The iterator ends after the declared
/// number of entries, or as soon as an entry cannot be decoded.
///
/// Two iterators compare equal when both are exhausted, so an iterator can
/// be compared against [`AppleValueIter::end`].
#[derive(Debug, Clone)]
pub struct AppleValueIter<'a, R: Reader> {
    table: Option<&'a AppleAccelTable<R>>,
    input: Option<R>,
    remaining: u32,
    current: Option<AppleEntry<R>>,
}

impl<'a, R: Reader> AppleValueIter<'a, R> {
    /// An exhausted iterator.
    pub fn end() -> Self {
        AppleValueIter {
            table: None,
            input: None,
            remaining: 0,
            current: None,
        }
    }

    /// Create an iterator for the entry count at the start of `input`.
    pub fn new(table: &'a AppleAccelTable<R>, mut input: R) -> Self {
        match input.read_u32() {
            Ok(count) => Self::with_count(table, input, count),
            Err(_) => Self::end(),
        }
    }

    fn with_count(table: &'a AppleAccelTable<R>, input: R, count: u32) -> Self {
        let mut iter = AppleValueIter {
            table: Some(table),
            input: Some(input),
            remaining: count,
            current: None,
        };
        iter.advance();
        iter
    }

    fn advance(&mut self) {
        self.current = None;
        let (Some(table), Some(input)) = (self.table, self.input.as_mut()) else {
            return;
        };
        if self.remaining == 0 {
            return;
        }
        match table.read_entry(input) {
            Ok(entry) => {
                self.remaining -= 1;
                self.current = Some(entry);
            }
            Err(e) => {
                tracing::trace!(error = %e, "apple entry decode failed");
                self.remaining = 0;
            }
        }
    }

    /// Return true if there are no more entries.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }
}

impl<'a, R: Reader> Iterator for AppleValueIter<'a, R> {
    type Item = AppleEntry<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.current.take()?;
        self.advance();
        Some(entry)
    }
}

impl<'a, R: Reader> core::iter::FusedIterator for AppleValueIter<'a, R> {}

impl<'a, R: Reader> PartialEq for AppleValueIter<'a, R> {
    fn eq(&self, other: &Self) -> bool {
        self.is_exhausted() && other.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::endianity::LittleEndian;
    use crate::test_util::AccelSectionMethods;
    use test_assembler::{Endian, Label, LabelMaker, Section};

    type Table<'a> = AppleAccelTable<EndianSlice<'a, LittleEndian>>;

    const NAMES: [(&str, u32, u32); 4] = [
        // (name, string offset, die offset)
        ("main", 1, 0x2a),
        ("foo", 6, 0x40),
        ("bar", 10, 0x50),
        ("baz", 14, 0x60),
    ];

    fn debug_str() -> Vec<u8> {
        b"\0main\0foo\0bar\0baz\0int\0".to_vec()
    }

    /// Build a table with a bucket for each of `bucket_count`, holding the
    /// names above with `DW_ATOM_die_offset` and `DW_ATOM_die_tag` atoms.
    fn names_table(bucket_count: u32) -> Vec<u8> {
        let mut slots: Vec<(u32, u32, u32)> = NAMES
            .iter()
            .map(|&(name, str_offset, die_offset)| (djb_hash(name.as_bytes()), str_offset, die_offset))
            .collect();
        slots.sort_by_key(|slot| (slot.0 % bucket_count, slot.0));

        let data: Vec<Label> = slots.iter().map(|_| Label::new()).collect();
        let mut buckets = Vec::new();
        for bucket in 0..bucket_count {
            let first = slots.iter().position(|slot| slot.0 % bucket_count == bucket);
            buckets.push(first.map_or(u32::MAX, |index| index as u32));
        }

        let section = Section::with_endian(Endian::Little);
        section.start().set_const(0);
        let mut section = section
            .apple_header(bucket_count, slots.len() as u32, 16)
            .D32(0)
            .D32(2)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_data4.0)
            .D16(DW_ATOM_die_tag.0)
            .D16(DW_FORM_data2.0);
        for bucket in buckets {
            section = section.D32(bucket);
        }
        for slot in &slots {
            section = section.D32(slot.0);
        }
        for label in &data {
            section = section.D32(label);
        }
        for (slot, label) in slots.iter().zip(data.iter()) {
            section = section
                .mark(label)
                .D32(slot.1)
                .D32(1)
                .D32(slot.2)
                .D16(DW_TAG_subprogram.0)
                .D32(0);
        }
        section.get_contents().unwrap()
    }

    #[test]
    fn test_lookup() {
        let debug_str = debug_str();
        for bucket_count in [1, 2, 3, 7] {
            let buf = names_table(bucket_count);
            let table = Table::new(&buf, &debug_str, LittleEndian).unwrap();
            assert!(table.validate_forms());
            assert_eq!(table.bucket_count(), bucket_count);
            assert_eq!(table.hash_count(), 4);
            assert_eq!(table.header().magic(), APPLE_HASH_MAGIC);
            assert_eq!(table.header().hash_function(), DW_hash_function_djb);

            for &(name, _, die_offset) in &NAMES {
                let entries: Vec<_> = table.lookup(name.as_bytes()).unwrap().collect();
                assert_eq!(entries.len(), 1, "{name}");
                assert_eq!(entries[0].die_offset(), u64::from(die_offset));
                assert_eq!(entries[0].tag(), DW_TAG_subprogram);
                assert_eq!(entries[0].type_flags(), None);
            }

            // Present in .debug_str, but not in the table.
            let iter = table.lookup(b"int").unwrap();
            assert!(iter == AppleValueIter::end());
            assert_eq!(table.lookup(b"missing").unwrap().count(), 0);
        }
    }

    #[test]
    fn test_bucket_walk() {
        let debug_str = debug_str();
        let buf = names_table(3);
        let table = Table::new(&buf, &debug_str, LittleEndian).unwrap();
        let mut seen = 0;
        for bucket in 0..table.bucket_count() {
            let Some(mut slots) = table.find_by_bucket(bucket).unwrap() else {
                continue;
            };
            while let Some(slot) = slots.next().unwrap() {
                assert_eq!(slot.hash % table.bucket_count(), bucket);
                let mut names = table.names_at(slot.data_offset).unwrap();
                let name = names.next().unwrap().unwrap();
                let string = name.name(table.debug_str()).unwrap();
                assert_eq!(djb_hash(string.slice()), slot.hash);
                assert_eq!(name.entry_count(), 1);
                assert!(names.next().unwrap().is_none());
                seen += 1;
            }
        }
        assert_eq!(seen, NAMES.len());
        assert_eq!(table.bucket(3), Err(Error::InvalidBucketIndex(3)));
    }

    #[test]
    fn test_hash_collision_chain() {
        // Two names that share a hash are stored in one chain.
        let debug_str = b"\0first\0second\0".to_vec();
        let hash = 0x1234_5678;
        let data = Label::new();
        let section = Section::with_endian(Endian::Little);
        section.start().set_const(0);
        let buf = section
            .apple_header(1, 1, 12)
            .D32(0)
            .D32(1)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_udata.0)
            .D32(0)
            .D32(hash)
            .D32(&data)
            .mark(&data)
            .D32(1)
            .D32(2)
            .D8(0x10)
            .D8(0x11)
            .D32(7)
            .D32(1)
            .D8(0x20)
            .D32(0)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &debug_str, LittleEndian).unwrap();

        let names: Vec<_> = table
            .names_at(table.data_offset(0).unwrap())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1].string_offset(), DebugStrOffset(7));
        let offsets: Vec<u64> = names[0].entries(&table).map(|e| e.die_offset()).collect();
        assert_eq!(offsets, [0x10, 0x11]);
        let offsets: Vec<u64> = names[1].entries(&table).map(|e| e.die_offset()).collect();
        assert_eq!(offsets, [0x20]);
    }

    #[test]
    fn test_empty_table() {
        let buf = Section::with_endian(Endian::Little)
            .apple_header(0, 0, 8)
            .D32(0)
            .D32(0)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &[], LittleEndian).unwrap();
        assert!(table.atoms().is_empty());
        assert!(table.lookup(b"main").unwrap() == AppleValueIter::end());
    }

    #[test]
    fn test_truncated() {
        let debug_str = debug_str();
        let buf = names_table(2);
        let header_data_end = HEADER_SIZE + 16;
        let arrays_end = header_data_end + 2 * 4 + 4 * 8;

        for len in 0..HEADER_SIZE {
            assert_eq!(
                Table::new(&buf[..len], &debug_str, LittleEndian).unwrap_err(),
                Error::SectionTooSmall(TableRegion::Header)
            );
        }
        for len in HEADER_SIZE..arrays_end {
            assert_eq!(
                Table::new(&buf[..len], &debug_str, LittleEndian).unwrap_err(),
                Error::SectionTooSmall(TableRegion::BucketsAndHashes)
            );
        }
        // The name chains are only read on lookup.
        let table = Table::new(&buf[..arrays_end], &debug_str, LittleEndian).unwrap();
        assert!(matches!(
            table.lookup(b"main"),
            Err(Error::OffsetOutOfBounds(_))
        ));
    }

    #[test]
    fn test_header_data_too_small() {
        // Two atoms declared, but only room for one.
        let buf = Section::with_endian(Endian::Little)
            .apple_header(0, 0, 12)
            .D32(0)
            .D32(2)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_data4.0)
            .D16(DW_ATOM_die_tag.0)
            .D16(DW_FORM_data2.0)
            .get_contents()
            .unwrap();
        assert_eq!(
            Table::new(&buf, &[], LittleEndian).unwrap_err(),
            Error::SectionTooSmall(TableRegion::HeaderData)
        );
    }

    #[test]
    fn test_validate_forms() {
        let table_with = |atoms: &[(DwAtom, DwForm)]| {
            let mut section = Section::with_endian(Endian::Little)
                .apple_header(0, 0, 8 + 4 * atoms.len() as u32)
                .D32(0)
                .D32(atoms.len() as u32);
            for &(atom, form) in atoms {
                section = section.D16(atom.0).D16(form.0);
            }
            section.get_contents().unwrap()
        };

        let buf = table_with(&[
            (DW_ATOM_die_offset, DW_FORM_data4),
            (DW_ATOM_die_tag, DW_FORM_data2),
            (DW_ATOM_type_flags, DW_FORM_data1),
            (DW_ATOM_qual_name_hash, DW_FORM_data4),
        ]);
        assert!(Table::new(&buf, &[], LittleEndian).unwrap().validate_forms());

        let buf = table_with(&[(DW_ATOM_die_offset, DW_FORM_flag)]);
        assert!(Table::new(&buf, &[], LittleEndian).unwrap().validate_forms());

        for atom in [DW_ATOM_die_offset, DW_ATOM_die_tag, DW_ATOM_type_flags] {
            let buf = table_with(&[(atom, DW_FORM_sdata)]);
            assert!(!Table::new(&buf, &[], LittleEndian).unwrap().validate_forms());
            let buf = table_with(&[(atom, DW_FORM_strp)]);
            assert!(!Table::new(&buf, &[], LittleEndian).unwrap().validate_forms());
        }

        // Atoms that are not interpreted may use any form.
        let buf = table_with(&[(DW_ATOM_cu_offset, DW_FORM_sdata)]);
        assert!(Table::new(&buf, &[], LittleEndian).unwrap().validate_forms());
    }

    #[test]
    fn test_read_atoms_defaults() {
        let buf = Section::with_endian(Endian::Little)
            .apple_header(0, 0, 12)
            .D32(0)
            .D32(1)
            .D16(DW_ATOM_type_flags.0)
            .D16(DW_FORM_data1.0)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &[], LittleEndian).unwrap();
        let data = [DW_FLAG_type_implementation as u8];
        let input = &mut EndianSlice::new(&data, LittleEndian);
        assert_eq!(
            table.read_atoms(input),
            Ok((DW_INVALID_OFFSET, DW_TAG_null))
        );
        assert!(input.is_empty());
    }

    #[test]
    fn test_read_atoms_ignores_sdata() {
        let buf = Section::with_endian(Endian::Little)
            .apple_header(0, 0, 16)
            .D32(0)
            .D32(2)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_sdata.0)
            .D16(DW_ATOM_die_tag.0)
            .D16(DW_FORM_data2.0)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &[], LittleEndian).unwrap();
        assert!(!table.validate_forms());
        let data = [0x05, DW_TAG_subprogram.0 as u8, 0];
        let input = &mut EndianSlice::new(&data, LittleEndian);
        assert_eq!(
            table.read_atoms(input),
            Ok((DW_INVALID_OFFSET, DW_TAG_subprogram))
        );
        assert!(input.is_empty());
    }

    #[test]
    fn test_value_iter_stops_on_bad_entry() {
        // Three entries declared, but the section ends inside the second.
        let buf = Section::with_endian(Endian::Little)
            .apple_header(0, 0, 12)
            .D32(0)
            .D32(1)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_data4.0)
            .D32(3)
            .D32(0x10)
            .D16(0x20)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &[], LittleEndian).unwrap();
        let mut input = EndianSlice::new(&buf, LittleEndian);
        input.skip(HEADER_SIZE + 12).unwrap();
        let mut iter = AppleValueIter::new(&table, input);
        assert!(iter != AppleValueIter::end());
        assert_eq!(iter.next().map(|e| e.die_offset()), Some(0x10));
        assert!(iter.next().is_none());
        assert!(iter == AppleValueIter::end());
    }

    #[test]
    fn test_unterminated_name_list() {
        let debug_str = b"\0name\0".to_vec();
        let data = Label::new();
        let section = Section::with_endian(Endian::Little);
        section.start().set_const(0);
        let buf = section
            .apple_header(1, 1, 8)
            .D32(0)
            .D32(0)
            .D32(0)
            .D32(djb_hash(b"name"))
            .D32(&data)
            .mark(&data)
            .D32(1)
            .D32(0)
            .D16(0)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &debug_str, LittleEndian).unwrap();
        let mut names = table.names_at(table.data_offset(0).unwrap()).unwrap();
        assert!(names.next().unwrap().is_some());
        assert!(matches!(names.next(), Err(Error::UnterminatedNameList)));
        assert!(names.next().unwrap().is_none());
        assert!(matches!(
            table.names_at(AppleTableOffset(buf.len())),
            Err(Error::OffsetOutOfBounds(_))
        ));
    }

    #[test]
    fn test_lookup_skips_unreadable_name() {
        // The first name in the chain points past the end of `.debug_str`.
        let debug_str = b"\0target\0".to_vec();
        let data = Label::new();
        let section = Section::with_endian(Endian::Little);
        section.start().set_const(0);
        let buf = section
            .apple_header(1, 1, 12)
            .D32(0)
            .D32(1)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_data4.0)
            .D32(0)
            .D32(djb_hash(b"target"))
            .D32(&data)
            .mark(&data)
            .D32(0x1000)
            .D32(1)
            .D32(0x10)
            .D32(1)
            .D32(1)
            .D32(0x20)
            .D32(0)
            .get_contents()
            .unwrap();
        let table = Table::new(&buf, &debug_str, LittleEndian).unwrap();
        let offsets: Vec<u64> = table
            .lookup(b"target")
            .unwrap()
            .map(|e| e.die_offset())
            .collect();
        assert_eq!(offsets, [0x20]);
        assert!(table.lookup(b"other").unwrap() == AppleValueIter::end());
    }

    #[derive(Debug, Clone, Copy)]
    struct RelocateAt(usize);

    impl crate::read::Relocate for RelocateAt {
        fn relocate_address(&self, _offset: usize, value: u64) -> Result<u64> {
            Ok(value)
        }

        fn relocate_offset(&self, offset: usize, value: usize) -> Result<usize> {
            Ok(if offset == self.0 { value + 1 } else { value })
        }
    }

    #[test]
    fn test_relocated_string_offset() {
        // The chain's string offset is zero until it is relocated.
        let debug_str = b"\0name\0".to_vec();
        let data = Label::new();
        let section = Section::with_endian(Endian::Little);
        section.start().set_const(0);
        let buf = section
            .apple_header(1, 1, 12)
            .D32(0)
            .D32(1)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_data4.0)
            .D32(0)
            .D32(djb_hash(b"name"))
            .D32(&data)
            .mark(&data)
            .D32(0)
            .D32(1)
            .D32(0x30)
            .D32(0)
            .get_contents()
            .unwrap();
        let chain = 20 + 12 + 4 + 4 + 4;
        let section = EndianSlice::new(&buf, LittleEndian);
        let section = crate::read::RelocateReader::new(section, RelocateAt(chain));
        let strings = EndianSlice::new(&debug_str, LittleEndian);
        let strings = crate::read::RelocateReader::new(strings, RelocateAt(chain));
        let table = AppleAccelTable::parse(section, DebugStr::from(strings)).unwrap();
        assert_eq!(table.data_offset(0), Ok(AppleTableOffset(chain)));
        let offsets: Vec<u64> = table.lookup(b"name").unwrap().map(|e| e.die_offset()).collect();
        assert_eq!(offsets, [0x30]);
    }
}
