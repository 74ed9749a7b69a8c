//! Object file loading shared by the example programs.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::result;

use dwarf_accel::{DebugNames, DebugStr, EndianSlice, RunTimeEndian, SectionId};
use object::{Object, ObjectSection};
use typed_arena::Arena;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Accel(dwarf_accel::Error),
    Object(object::read::Error),
    Io,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> result::Result<(), fmt::Error> {
        match self {
            Error::Accel(err) => write!(f, "{}", err),
            Error::Object(err) => write!(f, "An object error occurred while reading: {}", err),
            Error::Io => write!(f, "An I/O error occurred while writing."),
        }
    }
}

impl From<dwarf_accel::Error> for Error {
    fn from(err: dwarf_accel::Error) -> Self {
        Error::Accel(err)
    }
}

impl From<io::Error> for Error {
    fn from(_: io::Error) -> Self {
        Error::Io
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Io
    }
}

impl From<object::read::Error> for Error {
    fn from(err: object::read::Error) -> Self {
        Error::Object(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Default)]
pub struct RelocationMap(object::read::RelocationMap);

impl RelocationMap {
    fn add(&mut self, file: &object::File, section: &object::Section) {
        for (offset, relocation) in section.relocations() {
            if let Err(e) = self.0.add(file, offset, relocation) {
                tracing::warn!(
                    section = section.name().unwrap_or("<unknown>"),
                    offset,
                    error = %e,
                    "relocation error"
                );
            }
        }
    }
}

impl<'a> dwarf_accel::Relocate for &'a RelocationMap {
    fn relocate_address(&self, offset: usize, value: u64) -> dwarf_accel::Result<u64> {
        Ok(self.0.relocate(offset as u64, value))
    }

    fn relocate_offset(&self, offset: usize, value: usize) -> dwarf_accel::Result<usize> {
        usize::try_from(self.0.relocate(offset as u64, value as u64))
            .map_err(|_| dwarf_accel::Error::UnsupportedOffset)
    }
}

pub type Relocate<'a, R> = dwarf_accel::RelocateReader<R, &'a RelocationMap>;

/// The reader used for every section.
pub type SectionReader<'a> = Relocate<'a, EndianSlice<'a, RunTimeEndian>>;

/// Owns the section data and relocations for the lifetime of the readers.
#[derive(Default)]
pub struct Arenas<'input> {
    data: Arena<Cow<'input, [u8]>>,
    relocations: Arena<RelocationMap>,
}

impl<'input> Arenas<'input> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Return the byte order of an object file.
pub fn file_endian(file: &object::File) -> RunTimeEndian {
    if file.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    }
}

/// Load a section with its relocations applied.
///
/// Returns `Ok(None)` if the file doesn't have the section.
pub fn load_file_section<'input, 'arena>(
    id: SectionId,
    file: &object::File<'input>,
    endian: RunTimeEndian,
    arenas: &'arena Arenas<'input>,
) -> Result<Option<SectionReader<'arena>>> {
    let Some(section) = file.section_by_name(id.name()) else {
        tracing::debug!(section = id.name(), "section not present");
        return Ok(None);
    };
    let mut relocations = RelocationMap::default();
    relocations.add(file, &section);
    let data = section.uncompressed_data()?;
    let data_ref = arenas.data.alloc(data);
    let relocations = arenas.relocations.alloc(relocations);
    Ok(Some(Relocate::new(
        EndianSlice::new(data_ref, endian),
        relocations,
    )))
}

fn empty_section<'arena>(endian: RunTimeEndian, arenas: &'arena Arenas<'_>) -> SectionReader<'arena> {
    // Use a non-zero capacity so that `ReaderOffsetId`s are unique.
    let data_ref = arenas.data.alloc(Cow::Owned(Vec::with_capacity(1)));
    let relocations = arenas.relocations.alloc(RelocationMap::default());
    Relocate::new(EndianSlice::new(data_ref, endian), relocations)
}

/// The accelerator table sections of an object file.
pub struct Sections<'a> {
    pub debug_str: DebugStr<SectionReader<'a>>,
    pub debug_names: Option<DebugNames<SectionReader<'a>>>,
    pub apple_tables: Vec<(SectionId, SectionReader<'a>)>,
}

impl<'a> Sections<'a> {
    /// Load every accelerator table section that the file has.
    pub fn load<'input>(file: &object::File<'input>, arenas: &'a Arenas<'input>) -> Result<Self> {
        let endian = file_endian(file);
        let debug_str = match load_file_section(SectionId::DebugStr, file, endian, arenas)? {
            Some(section) => section,
            None => empty_section(endian, arenas),
        };

        let mut debug_names = None;
        let mut apple_tables = Vec::new();
        for id in SectionId::ACCELERATOR_TABLES {
            let Some(section) = load_file_section(id, file, endian, arenas)? else {
                continue;
            };
            if id == SectionId::DebugNames {
                debug_names = Some(DebugNames::from(section));
            } else {
                apple_tables.push((id, section));
            }
        }

        Ok(Sections {
            debug_str: DebugStr::from(debug_str),
            debug_names,
            apple_tables,
        })
    }
}

/// Map a file into memory and parse it, reporting failures on stderr.
pub fn open_file(path: &str) -> Option<memmap2::Mmap> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Failed to open file '{}': {}", path, err);
            return None;
        }
    };
    match unsafe { memmap2::Mmap::map(&file) } {
        Ok(mmap) => Some(mmap),
        Err(err) => {
            eprintln!("Failed to map file '{}': {}", path, err);
            None
        }
    }
}

/// Install a `tracing` subscriber that is configured by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}
