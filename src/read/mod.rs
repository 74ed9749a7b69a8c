//! Read accelerator tables.
//!
//! * [Example Usage](#example-usage)
//! * [API Structure](#api-structure)
//!
//! ## Example Usage
//!
//! Find the DIE offsets of every function named `main`:
//!
//! ```rust,no_run
//! # fn example() -> Result<(), dwarf_accel::Error> {
//! # let apple_names_buf = [];
//! # let debug_str_buf = [];
//! use dwarf_accel::{AppleAccelTable, LittleEndian};
//!
//! // Read the `.apple_names` and `.debug_str` sections with whatever object
//! // loader you're using.
//! let table = AppleAccelTable::new(&apple_names_buf, &debug_str_buf, LittleEndian)?;
//!
//! for entry in table.lookup(b"main")? {
//!     println!("Found main at DIE offset 0x{:x}", entry.die_offset());
//! }
//! # unreachable!()
//! # }
//! ```
//!
//! ## API Structure
//!
//! * Each section gets its own type:
//!
//!   * [`AppleAccelTable`]: any of `.apple_names`, `.apple_types`,
//!     `.apple_namespaces` or `.apple_objc`.
//!
//!   * [`DebugNames`]: the `.debug_names` section, which holds a sequence of
//!     [`NameIndex`] units.
//!
//!   * [`DebugStr`]: the `.debug_str` section, which holds the names.
//!
//! * Parsing validates every count and offset in a table's header against the
//!   section length before anything else is read. Entries are only decoded
//!   when they are asked for.
//!
//! * Offsets into a section are strongly typed: an offset into `.debug_str` is
//!   the [`DebugStrOffset`](crate::DebugStrOffset) type.
//!
//! * Lookups compute the hash of a name and only walk the chain of the bucket
//!   that the hash selects.

use core::fmt;
use core::result;
#[cfg(feature = "std")]
use std::io;

use crate::common::SectionId;
use crate::constants;

mod apple;
pub use self::apple::*;

mod endian_slice;
pub use self::endian_slice::*;

mod form;
pub use self::form::*;

mod names;
pub use self::names::*;

mod reader;
pub use self::reader::*;

mod relocate;
pub use self::relocate::*;

mod str;
pub use self::str::*;

/// The region of an accelerator table that could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRegion {
    /// The fixed size header.
    Header,
    /// The contents of a `.debug_names` unit, as declared by its unit length.
    UnitContents,
    /// The augmentation string of a `.debug_names` header.
    Augmentation,
    /// The header data of an Apple table: the DIE offset base and the atoms.
    HeaderData,
    /// The compilation unit and type unit lists of a `.debug_names` unit.
    UnitLists,
    /// The bucket and hash arrays.
    BucketsAndHashes,
    /// The string offset and entry offset arrays of a `.debug_names` unit.
    NameTable,
    /// The abbreviation table of a `.debug_names` unit.
    Abbreviations,
}

impl TableRegion {
    fn description(self) -> &'static str {
        match self {
            TableRegion::Header => "header",
            TableRegion::UnitContents => "unit contents",
            TableRegion::Augmentation => "header augmentation",
            TableRegion::HeaderData => "header data",
            TableRegion::UnitLists => "unit lists",
            TableRegion::BucketsAndHashes => "buckets and hashes",
            TableRegion::NameTable => "name table",
            TableRegion::Abbreviations => "abbreviations",
        }
    }
}

/// The broad class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A declared size or offset exceeds the data that is available, or a
    /// list ran out of data before its terminator.
    Truncated,
    /// The data is internally inconsistent.
    Inconsistent,
    /// The data uses an encoding that is not supported.
    Unsupported,
}

/// An error that occurred when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading.
    Io,
    /// An error parsing an unsigned LEB128 value.
    BadUnsignedLeb128,
    /// An error parsing a signed LEB128 value.
    BadSignedLeb128,
    /// Found an unknown `DW_FORM_*` type.
    UnknownForm(constants::DwForm),
    /// Found an abbreviation code that has already been used.
    DuplicateAbbreviationCode(u64),
    /// Found an unknown reserved length value.
    UnknownReservedLength(u32),
    /// Found an unknown table version.
    UnknownVersion(u64),
    /// Found an entry with an abbreviation code that is not in the
    /// abbreviation table.
    InvalidAbbreviationCode(u64),
    /// Hit the end of input before it was expected.
    UnexpectedEof(ReaderOffsetId),
    /// A region of a table extends past the end of the section.
    SectionTooSmall(TableRegion),
    /// The abbreviation table ended without a null terminator.
    UnterminatedAbbreviationTable,
    /// The entry pool ended in the middle of a list of entries.
    UnterminatedEntryList,
    /// An Apple table name list ended without a null terminator.
    UnterminatedNameList,
    /// A bucket refers to a name index that is greater than the name count.
    InvalidNameIndex(u32),
    /// The bucket index is not less than the bucket count.
    InvalidBucketIndex(u32),
    /// The name index does not have a hash table.
    MissingHashTable,
    /// The specified address size is not supported.
    UnsupportedAddressSize(u8),
    /// The specified offset size is not supported.
    UnsupportedOffsetSize(u8),
    /// An offset value was larger than the maximum supported value.
    UnsupportedOffset,
    /// The given offset is out of bounds.
    OffsetOutOfBounds(u64),
    /// Found an invalid UTF-8 string.
    BadUtf8,
    /// An attribute used a form that is not valid for its kind.
    UnsupportedAttributeForm(constants::DwForm),
    /// Invalid index in a `.debug_names` attribute value.
    InvalidNameAttributeIndex(u64),
}

impl Error {
    /// Return the broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::UnexpectedEof(_)
            | Error::SectionTooSmall(_)
            | Error::UnterminatedAbbreviationTable
            | Error::UnterminatedEntryList
            | Error::UnterminatedNameList => ErrorKind::Truncated,
            Error::DuplicateAbbreviationCode(_)
            | Error::InvalidAbbreviationCode(_)
            | Error::InvalidNameIndex(_)
            | Error::InvalidBucketIndex(_)
            | Error::MissingHashTable
            | Error::OffsetOutOfBounds(_)
            | Error::UnknownReservedLength(_)
            | Error::UnknownVersion(_)
            | Error::BadUnsignedLeb128
            | Error::BadSignedLeb128
            | Error::InvalidNameAttributeIndex(_) => ErrorKind::Inconsistent,
            Error::Io
            | Error::UnknownForm(_)
            | Error::UnsupportedAddressSize(_)
            | Error::UnsupportedOffsetSize(_)
            | Error::UnsupportedOffset
            | Error::BadUtf8
            | Error::UnsupportedAttributeForm(_) => ErrorKind::Unsupported,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> ::core::result::Result<(), fmt::Error> {
        match *self {
            Error::Io => write!(f, "I/O error"),
            Error::BadUnsignedLeb128 => write!(f, "unsigned LEB128 overflow"),
            Error::BadSignedLeb128 => write!(f, "signed LEB128 overflow"),
            Error::UnknownForm(val) => write!(f, "unknown attribute form: 0x{:x}", val.0),
            Error::DuplicateAbbreviationCode(val) => {
                write!(f, "duplicate abbreviation code: {val}")
            }
            Error::UnknownReservedLength(val) => write!(f, "unknown reserved length: 0x{val:x}"),
            Error::UnknownVersion(version) => write!(f, "unknown table version: {version}"),
            Error::InvalidAbbreviationCode(val) => {
                write!(f, "invalid abbreviation code: {val}")
            }
            Error::UnexpectedEof(_) => write!(f, "unexpected end of input"),
            Error::SectionTooSmall(region) => {
                write!(f, "section too small: cannot read {}", region.description())
            }
            Error::UnterminatedAbbreviationTable => {
                write!(f, "incorrectly terminated abbreviation table")
            }
            Error::UnterminatedEntryList => write!(f, "incorrectly terminated entry list"),
            Error::UnterminatedNameList => write!(f, "incorrectly terminated name list"),
            Error::InvalidNameIndex(val) => write!(f, "invalid name index: {val}"),
            Error::InvalidBucketIndex(val) => write!(f, "invalid bucket index: {val}"),
            Error::MissingHashTable => write!(f, "hash table not present"),
            Error::UnsupportedAddressSize(val) => {
                write!(f, "unsupported address size: {val}")
            }
            Error::UnsupportedOffsetSize(val) => {
                write!(f, "unsupported offset size: {val}")
            }
            Error::UnsupportedOffset => {
                write!(f, "offset overflow")
            }
            Error::OffsetOutOfBounds(val) => write!(f, "invalid offset: 0x{val:x}"),
            Error::BadUtf8 => write!(f, "invalid UTF-8"),
            Error::UnsupportedAttributeForm(val) => {
                write!(f, "unsupported attribute form: 0x{:x}", val.0)
            }
            Error::InvalidNameAttributeIndex(val) => {
                write!(f, "invalid index in name attribute: 0x{val:x}")
            }
        }
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "std")]
impl From<io::Error> for Error {
    fn from(_: io::Error) -> Self {
        Error::Io
    }
}

/// The result of a parse.
pub type Result<T> = result::Result<T, Error>;

/// A convenience trait for loading accelerator table sections from object
/// files. To be used like:
///
/// ```
/// use dwarf_accel::{DebugNames, EndianSlice, LittleEndian, Section};
///
/// let buf = [0x00, 0x01, 0x02, 0x03];
/// let reader = EndianSlice::new(&buf, LittleEndian);
/// let loader = |name| -> Result<_, ()> { Ok(reader) };
///
/// let debug_names: DebugNames<_> = Section::load(loader).unwrap();
/// ```
pub trait Section<R>: From<R> {
    /// Returns the section id for this type.
    fn id() -> SectionId;

    /// Returns the ELF section name for this type.
    fn section_name() -> &'static str {
        Self::id().name()
    }

    /// Try to load the section using the given loader function.
    fn load<F, E>(f: F) -> core::result::Result<Self, E>
    where
        F: FnOnce(SectionId) -> core::result::Result<R, E>,
    {
        f(Self::id()).map(From::from)
    }

    /// Returns the `Reader` for this section.
    fn reader(&self) -> &R;

    /// Returns the section offset that corresponds to the given offset id.
    fn lookup_offset_id(&self, id: ReaderOffsetId) -> Option<(SectionId, usize)>
    where
        R: Reader,
    {
        self.reader()
            .lookup_offset_id(id)
            .map(|offset| (Self::id(), offset))
    }
}
