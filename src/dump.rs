//! Text dumps of accelerator tables.
//!
//! The dumps only use the public reading API. Malformed entries are
//! reported inline and the dump continues with the next name, bucket or
//! unit where the layout allows it.
use core::fmt::{self, Write};

use crate::constants;
use crate::read::{
    AppleAccelTable, AppleName, DebugNames, DebugStr, Error, FormValue, NameIndex,
    NameTableIndex, Reader,
};

struct Printer<'w, W: Write> {
    w: &'w mut W,
    indent: usize,
}

impl<'w, W: Write> Printer<'w, W> {
    fn new(w: &'w mut W) -> Self {
        Printer { w, indent: 0 }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        for _ in 0..self.indent {
            self.w.write_str("  ")?;
        }
        self.w.write_fmt(args)?;
        self.w.write_char('\n')
    }

    fn open(&mut self, args: fmt::Arguments<'_>, delimiter: char) -> fmt::Result {
        for _ in 0..self.indent {
            self.w.write_str("  ")?;
        }
        self.w.write_fmt(args)?;
        self.w.write_char(' ')?;
        self.w.write_char(delimiter)?;
        self.w.write_char('\n')?;
        self.indent += 1;
        Ok(())
    }

    fn close(&mut self, delimiter: char) -> fmt::Result {
        self.indent = self.indent.saturating_sub(1);
        for _ in 0..self.indent {
            self.w.write_str("  ")?;
        }
        self.w.write_char(delimiter)?;
        self.w.write_char('\n')
    }

    fn error(&mut self, error: Error) -> fmt::Result {
        self.line(format_args!("error: {}", error))
    }
}

/// Formats a decoded attribute value.
struct DisplayValue<'a, R: Reader>(&'a FormValue<R>);

impl<'a, R: Reader> fmt::Display for DisplayValue<'a, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            FormValue::Addr(address) => write!(f, "0x{:016x}", address),
            FormValue::Block(ref data) | FormValue::Exprloc(ref data) => {
                write!(f, "<0x{:x} bytes>", data.len())
            }
            FormValue::Data1(data) => write!(f, "0x{:02x}", data),
            FormValue::Data2(data) => write!(f, "0x{:04x}", data),
            FormValue::Data4(data) => write!(f, "0x{:08x}", data),
            FormValue::Data8(data) => write!(f, "0x{:016x}", data),
            FormValue::Data16(data) => write!(f, "0x{:032x}", data),
            FormValue::Sdata(data) => write!(f, "{}", data),
            FormValue::Udata(data) => write!(f, "{}", data),
            FormValue::Flag(flag) => write!(f, "{}", flag),
            FormValue::SecOffset(offset) => write!(f, "0x{:08x}", offset),
            FormValue::UnitRef(offset) => write!(f, "0x{:08x}", offset.0),
            FormValue::DebugInfoRef(offset) => write!(f, "<.debug_info+0x{:08x}>", offset.0),
            FormValue::DebugInfoRefSup(offset) => write!(f, "<.debug_info(sup)+0x{:08x}>", offset),
            FormValue::DebugTypesRef(signature) => write!(f, "0x{:016x}", signature.0),
            FormValue::DebugStrRef(offset) => write!(f, "<.debug_str+0x{:08x}>", offset.0),
            FormValue::DebugStrRefSup(offset) => write!(f, "<.debug_str(sup)+0x{:08x}>", offset),
            FormValue::DebugLineStrRef(offset) => write!(f, "<.debug_line_str+0x{:08x}>", offset),
            FormValue::DebugStrOffsetsIndex(index)
            | FormValue::DebugAddrIndex(index)
            | FormValue::DebugLocListsIndex(index)
            | FormValue::DebugRngListsIndex(index) => write!(f, "indexed (0x{:08x})", index),
            FormValue::String(ref string) => match string.to_string_lossy() {
                Ok(string) => write!(f, "\"{}\"", string),
                Err(e) => write!(f, "<{}>", e),
            },
        }
    }
}

/// Formats a name string, or the error that prevented reading it.
struct DisplayName<R: Reader>(crate::read::Result<R>);

impl<R: Reader> fmt::Display for DisplayName<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Ok(name) => match name.to_string_lossy() {
                Ok(name) => write!(f, "\"{}\"", name),
                Err(e) => write!(f, "<{}>", e),
            },
            Err(e) => write!(f, "<{}>", e),
        }
    }
}

/// Write a dump of an Apple accelerator table.
///
/// The dump contains the header, the atoms, and then every bucket with its
/// hashes and name chains.
pub fn dump_apple_table<R: Reader, W: Write>(w: &mut W, table: &AppleAccelTable<R>) -> fmt::Result {
    let mut p = Printer::new(w);
    let header = table.header();
    p.open(format_args!("Header"), '{')?;
    p.line(format_args!("Magic: 0x{:x}", header.magic()))?;
    p.line(format_args!("Version: 0x{:x}", header.version()))?;
    p.line(format_args!("Hash function: 0x{:x}", header.hash_function().0))?;
    p.line(format_args!("Bucket count: {}", header.bucket_count()))?;
    p.line(format_args!("Hashes count: {}", header.hash_count()))?;
    p.line(format_args!("HeaderData length: {}", header.header_data_length()))?;
    p.close('}')?;

    p.open(format_args!("DIE offset base"), '{')?;
    p.line(format_args!("Offset: 0x{:x}", table.die_offset_base()))?;
    p.close('}')?;
    p.line(format_args!("Number of atoms: {}", table.atoms().len()))?;
    for (i, atom) in table.atoms().iter().enumerate() {
        p.open(format_args!("Atom {}", i), '{')?;
        p.line(format_args!("Type: {}", atom.atom()))?;
        p.line(format_args!("Form: {}", atom.form()))?;
        p.close('}')?;
    }

    for bucket_index in 0..table.bucket_count() {
        p.open(format_args!("Bucket {}", bucket_index), '[')?;
        match table.find_by_bucket(bucket_index) {
            Ok(Some(mut slots)) => loop {
                match slots.next() {
                    Ok(Some(slot)) => {
                        p.open(format_args!("Hash 0x{:08x}", slot.hash), '[')?;
                        dump_apple_chain(&mut p, table, slot.data_offset)?;
                        p.close(']')?;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        p.error(e)?;
                        break;
                    }
                }
            },
            Ok(None) => p.line(format_args!("EMPTY"))?,
            Err(e) => p.error(e)?,
        }
        p.close(']')?;
    }
    Ok(())
}

fn dump_apple_chain<R: Reader, W: Write>(
    p: &mut Printer<'_, W>,
    table: &AppleAccelTable<R>,
    offset: crate::common::AppleTableOffset,
) -> fmt::Result {
    let mut names = match table.names_at(offset) {
        Ok(names) => names,
        Err(Error::OffsetOutOfBounds(_)) => {
            return p.line(format_args!("Invalid section offset"));
        }
        Err(e) => return p.error(e),
    };
    loop {
        match names.next() {
            Ok(Some(name)) => {
                if !dump_apple_name(p, table, &name)? {
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(Error::UnterminatedNameList) => {
                return p.line(format_args!("Incorrectly terminated list."));
            }
            Err(e) => return p.error(e),
        }
    }
}

/// Returns false if the rest of the chain can't be located.
fn dump_apple_name<R: Reader, W: Write>(
    p: &mut Printer<'_, W>,
    table: &AppleAccelTable<R>,
    name: &AppleName<R>,
) -> core::result::Result<bool, fmt::Error> {
    p.open(format_args!("Name@0x{:x}", name.offset().0), '{')?;
    p.line(format_args!(
        "String: 0x{:08x} {}",
        name.string_offset().0,
        DisplayName(name.name(table.debug_str()))
    ))?;

    let encoding = table.encoding();
    let mut input = name.data().clone();
    let mut ok = true;
    // Without atoms there is nothing to show for each entry.
    let count = if table.atoms().is_empty() {
        0
    } else {
        name.entry_count()
    };
    'entries: for i in 0..count {
        p.open(format_args!("Data {}", i), '[')?;
        for (j, atom) in table.atoms().iter().enumerate() {
            match FormValue::parse(&mut input, atom.form(), encoding) {
                Ok(value) => {
                    if atom.atom() == constants::DW_ATOM_die_tag {
                        if let Some(tag) = value.unsigned_constant() {
                            p.line(format_args!(
                                "Atom[{}]: {}",
                                j,
                                constants::DwTag(tag as u16)
                            ))?;
                            continue;
                        }
                    }
                    p.line(format_args!("Atom[{}]: {}", j, DisplayValue(&value)))?;
                }
                Err(_) => {
                    p.line(format_args!("Error extracting the value"))?;
                    p.close(']')?;
                    ok = false;
                    break 'entries;
                }
            }
        }
        p.close(']')?;
    }
    p.close('}')?;
    Ok(ok)
}

/// Write a dump of every name index in a `.debug_names` section.
///
/// A unit that fails to parse is reported, and ends the dump since the
/// position of the following unit can't be trusted.
pub fn dump_debug_names<R: Reader, W: Write>(
    w: &mut W,
    debug_names: &DebugNames<R>,
    debug_str: &DebugStr<R>,
) -> fmt::Result {
    let mut headers = debug_names.headers();
    loop {
        match headers.next() {
            Ok(Some(header)) => {
                let offset = header.offset();
                match header.index() {
                    Ok(name_index) => dump_name_index(w, &name_index, debug_str)?,
                    Err(e) => {
                        let mut p = Printer::new(w);
                        p.line(format_args!("Name Index @ 0x{:x}", offset.0))?;
                        return p.error(e);
                    }
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => return Printer::new(w).error(e),
        }
    }
}

/// Write a dump of a single name index.
pub fn dump_name_index<R: Reader, W: Write>(
    w: &mut W,
    name_index: &NameIndex<R>,
    debug_str: &DebugStr<R>,
) -> fmt::Result {
    let mut p = Printer::new(w);
    let header = name_index.header();
    p.open(format_args!("Name Index @ 0x{:x}", header.offset().0), '{')?;

    p.open(format_args!("Header"), '{')?;
    p.line(format_args!("Length: 0x{:x}", header.length()))?;
    p.line(format_args!("Format: {:?}", header.format()))?;
    p.line(format_args!("Version: {}", header.version()))?;
    p.line(format_args!("Padding: 0x{:x}", header.padding()))?;
    p.line(format_args!("CU count: {}", header.compile_unit_count()))?;
    p.line(format_args!("Local TU count: {}", header.local_type_unit_count()))?;
    p.line(format_args!("Foreign TU count: {}", header.foreign_type_unit_count()))?;
    p.line(format_args!("Bucket count: {}", header.bucket_count()))?;
    p.line(format_args!("Name count: {}", header.name_count()))?;
    p.line(format_args!("Abbreviations table size: 0x{:x}", header.abbrev_table_size()))?;
    match header.augmentation_string() {
        Some(augmentation) => p.line(format_args!(
            "Augmentation: '{}'",
            DisplayName(Ok(augmentation.clone()))
        ))?,
        None => p.line(format_args!("Augmentation: ''"))?,
    }
    p.close('}')?;

    p.open(format_args!("Compilation Unit offsets"), '[')?;
    for i in 0..name_index.compile_unit_count() {
        match name_index.compile_unit(i) {
            Ok(offset) => p.line(format_args!("CU[{}]: 0x{:08x}", i, offset.0))?,
            Err(e) => p.error(e)?,
        }
    }
    p.close(']')?;

    if name_index.local_type_unit_count() != 0 {
        p.open(format_args!("Local Type Unit offsets"), '[')?;
        for i in 0..name_index.local_type_unit_count() {
            match name_index.local_type_unit(i) {
                Ok(offset) => p.line(format_args!("LocalTU[{}]: 0x{:08x}", i, offset.0))?,
                Err(e) => p.error(e)?,
            }
        }
        p.close(']')?;
    }

    if name_index.foreign_type_unit_count() != 0 {
        p.open(format_args!("Foreign Type Unit signatures"), '[')?;
        for i in 0..name_index.foreign_type_unit_count() {
            match name_index.foreign_type_unit(i) {
                Ok(signature) => {
                    p.line(format_args!("ForeignTU[{}]: 0x{:016x}", i, signature.0))?
                }
                Err(e) => p.error(e)?,
            }
        }
        p.close(']')?;
    }

    p.open(format_args!("Abbreviations"), '[')?;
    for abbrev in name_index.abbreviations().iter() {
        p.open(format_args!("Abbreviation 0x{:x}", abbrev.code()), '{')?;
        p.line(format_args!("Tag: {}", abbrev.tag()))?;
        for attr in abbrev.attributes() {
            p.line(format_args!("{}: {}", attr.index(), attr.form()))?;
        }
        p.close('}')?;
    }
    p.close(']')?;

    if name_index.has_hash_table() {
        for bucket_index in 0..name_index.bucket_count() {
            p.open(format_args!("Bucket {}", bucket_index), '[')?;
            match name_index.find_by_bucket(bucket_index) {
                Ok(Some(mut names)) => loop {
                    match names.next() {
                        Ok(Some((index, hash))) => {
                            dump_name(&mut p, name_index, debug_str, index, Some(hash))?
                        }
                        Ok(None) => break,
                        Err(e) => {
                            p.error(e)?;
                            break;
                        }
                    }
                },
                Ok(None) => p.line(format_args!("EMPTY"))?,
                Err(Error::InvalidNameIndex(_)) => {
                    p.line(format_args!("Name index is invalid"))?
                }
                Err(e) => p.error(e)?,
            }
            p.close(']')?;
        }
    } else {
        p.line(format_args!("Hash table not present"))?;
        for index in name_index.names() {
            dump_name(&mut p, name_index, debug_str, index, None)?;
        }
    }

    p.close('}')
}

fn dump_name<R: Reader, W: Write>(
    p: &mut Printer<'_, W>,
    name_index: &NameIndex<R>,
    debug_str: &DebugStr<R>,
    index: NameTableIndex,
    hash: Option<u32>,
) -> fmt::Result {
    p.open(format_args!("Name {}", index.0), '{')?;
    if let Some(hash) = hash {
        p.line(format_args!("Hash: 0x{:x}", hash))?;
    }
    let entry = match name_index.name_table_entry(index) {
        Ok(entry) => entry,
        Err(e) => {
            p.error(e)?;
            return p.close('}');
        }
    };
    p.line(format_args!(
        "String: 0x{:08x} {}",
        entry.string_offset.0,
        DisplayName(debug_str.get_str(entry.string_offset))
    ))?;

    match name_index.name_entries(index) {
        Ok(mut entries) => loop {
            match entries.next() {
                Ok(Some(entry)) => {
                    p.open(format_args!("Entry @ 0x{:x}", entry.offset.0), '{')?;
                    p.line(format_args!("Abbrev: 0x{:x}", entry.abbrev_code))?;
                    p.line(format_args!("Tag: {}", entry.tag))?;
                    for attr in &entry.attrs {
                        p.line(format_args!("{}: {}", attr.index(), DisplayValue(attr.value())))?;
                    }
                    p.close('}')?;
                }
                Ok(None) => break,
                Err(e) => {
                    p.error(e)?;
                    break;
                }
            }
        },
        Err(e) => p.error(e)?,
    }
    p.close('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Format;
    use crate::constants::*;
    use crate::endianity::LittleEndian;
    use crate::test_util::AccelSectionMethods;
    use alloc::string::String;
    use test_assembler::{Endian, Label, LabelMaker, Section};

    #[test]
    fn test_dump_apple_table() {
        let debug_str = b"\0main\0int\0";
        let int_chain = Label::new();
        let main_chain = Label::new();
        let section = Section::with_endian(Endian::Little)
            .apple_header(2, 2, 16)
            .D32(0)
            .D32(2)
            .D16(DW_ATOM_die_offset.0)
            .D16(DW_FORM_data4.0)
            .D16(DW_ATOM_die_tag.0)
            .D16(DW_FORM_data2.0)
            // Buckets
            .D32(0)
            .D32(0xffff_ffff)
            // Hashes
            .D32(0x0b88_8030)
            .D32(0x7c9a_7f6a)
            // Offsets
            .D32(&int_chain)
            .D32(&main_chain)
            .mark(&int_chain)
            .D32(6)
            .D32(1)
            .D32(0x40)
            .D16(DW_TAG_base_type.0)
            .D32(0)
            .mark(&main_chain)
            .D32(1)
            .D32(2)
            .D32(0x50)
            .D16(DW_TAG_subprogram.0)
            .D32(0x60)
            .D16(0x7777)
            .D32(0);
        section.start().set_const(0);
        let buf = section.get_contents().unwrap();
        let table = AppleAccelTable::new(&buf, debug_str, LittleEndian).unwrap();

        let mut out = String::new();
        dump_apple_table(&mut out, &table).unwrap();
        let expected = "\
Header {
  Magic: 0x48415348
  Version: 0x1
  Hash function: 0x0
  Bucket count: 2
  Hashes count: 2
  HeaderData length: 16
}
DIE offset base {
  Offset: 0x0
}
Number of atoms: 2
Atom 0 {
  Type: DW_ATOM_die_offset
  Form: DW_FORM_data4
}
Atom 1 {
  Type: DW_ATOM_die_tag
  Form: DW_FORM_data2
}
Bucket 0 [
  Hash 0x0b888030 [
    Name@0x3c {
      String: 0x00000006 \"int\"
      Data 0 [
        Atom[0]: 0x00000040
        Atom[1]: DW_TAG_base_type
      ]
    }
  ]
  Hash 0x7c9a7f6a [
    Name@0x4e {
      String: 0x00000001 \"main\"
      Data 0 [
        Atom[0]: 0x00000050
        Atom[1]: DW_TAG_subprogram
      ]
      Data 1 [
        Atom[0]: 0x00000060
        Atom[1]: DW_TAG_Unknown_0x7777
      ]
    }
  ]
]
Bucket 1 [
  EMPTY
]
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_apple_table_errors() {
        let debug_str = b"\0main\0";
        let bad_form_chain = Label::new();
        let unterminated_chain = Label::new();
        let section = Section::with_endian(Endian::Little)
            .apple_header(1, 3, 12)
            .D32(0)
            .D32(1)
            .D16(DW_ATOM_die_offset.0)
            .D16(0x7f)
            .D32(0)
            .D32(1)
            .D32(2)
            .D32(3)
            .D32(0xffff)
            .D32(&bad_form_chain)
            .D32(&unterminated_chain)
            .mark(&bad_form_chain)
            .D32(1)
            .D32(1)
            .D32(0)
            .mark(&unterminated_chain)
            .D32(1)
            .D32(0);
        section.start().set_const(0);
        let buf = section.get_contents().unwrap();
        let table = AppleAccelTable::new(&buf, debug_str, LittleEndian).unwrap();

        let mut out = String::new();
        dump_apple_table(&mut out, &table).unwrap();
        assert!(out.contains("Form: DW_FORM_Unknown_0x7f\n"));
        assert!(out.contains("Hash 0x00000001 [\n    Invalid section offset\n"));
        assert!(out.contains("Data 0 [\n        Error extracting the value\n      ]\n"));
        assert!(out.ends_with("    Incorrectly terminated list.\n  ]\n]\n"));
    }

    fn name_index_section(version: u16) -> Section {
        let length = Label::new();
        let start = Label::new();
        let end = Label::new();
        let abbrev_start = Label::new();
        let abbrev_end = Label::new();
        let abbrev_size = Label::new();
        let entries_1 = Label::new();
        let entries_2 = Label::new();
        let entries_2_offset = Label::new();

        let section = Section::with_endian(Endian::Little)
            .initial_length(Format::Dwarf32, &length, &start)
            .D16(version)
            .D16(0)
            .D32(1)
            .D32(0)
            .D32(0)
            .D32(2)
            .D32(2)
            .D32(&abbrev_size)
            .D32(0)
            // CU list
            .D32(0x20)
            // Buckets
            .D32(1)
            .D32(0)
            // Hashes
            .D32(0x0b88_8030)
            .D32(0x7c9a_7f6a)
            // String offsets
            .D32(6)
            .D32(1)
            // Entry offsets
            .D32(0)
            .D32(&entries_2_offset)
            .mark(&abbrev_start)
            .uleb(1)
            .uleb(DW_TAG_base_type.0.into())
            .uleb(DW_IDX_die_offset.0.into())
            .uleb(DW_FORM_ref4.0.into())
            .D8(0)
            .D8(0)
            .uleb(2)
            .uleb(0x4242)
            .uleb(0x3000)
            .uleb(DW_FORM_data1.0.into())
            .D8(0)
            .D8(0)
            .D8(0)
            .mark(&abbrev_end)
            .mark(&entries_1)
            .uleb(1)
            .D32(0x10)
            .D8(0)
            .mark(&entries_2)
            .uleb(2)
            .D8(7)
            .uleb(9)
            .mark(&end);
        length.set_const((&end - &start) as u64);
        abbrev_size.set_const((&abbrev_end - &abbrev_start) as u64);
        entries_2_offset.set_const((&entries_2 - &entries_1) as u64);
        section
    }

    #[test]
    fn test_dump_debug_names() {
        let debug_str = DebugStr::new(b"\0main\0int\0", LittleEndian);
        let section = name_index_section(5);
        let buf = section.get_contents().unwrap();
        let debug_names = DebugNames::new(&buf, LittleEndian);

        let mut out = String::new();
        dump_debug_names(&mut out, &debug_names, &debug_str).unwrap();
        let expected = alloc::format!(
            "\
Name Index @ 0x0 {{
  Header {{
    Length: 0x{length:x}
    Format: Dwarf32
    Version: 5
    Padding: 0x0
    CU count: 1
    Local TU count: 0
    Foreign TU count: 0
    Bucket count: 2
    Name count: 2
    Abbreviations table size: 0x10
    Augmentation: ''
  }}
  Compilation Unit offsets [
    CU[0]: 0x00000020
  ]
  Abbreviations [
    Abbreviation 0x1 {{
      Tag: DW_TAG_base_type
      DW_IDX_die_offset: DW_FORM_ref4
    }}
    Abbreviation 0x2 {{
      Tag: DW_TAG_Unknown_0x4242
      DW_IDX_Unknown_0x3000: DW_FORM_data1
    }}
  ]
  Bucket 0 [
    Name 1 {{
      Hash: 0xb888030
      String: 0x00000006 \"int\"
      Entry @ 0x{entries_1:x} {{
        Abbrev: 0x1
        Tag: DW_TAG_base_type
        DW_IDX_die_offset: 0x00000010
      }}
    }}
    Name 2 {{
      Hash: 0x7c9a7f6a
      String: 0x00000001 \"main\"
      Entry @ 0x{entries_2:x} {{
        Abbrev: 0x2
        Tag: DW_TAG_Unknown_0x4242
        DW_IDX_Unknown_0x3000: 0x07
      }}
      error: {error}
    }}
  ]
  Bucket 1 [
    EMPTY
  ]
}}
",
            length = buf.len() - 4,
            entries_1 = buf.len() - 9,
            entries_2 = buf.len() - 3,
            error = Error::InvalidAbbreviationCode(9),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_debug_names_bad_unit() {
        let debug_str = DebugStr::new(b"\0main\0int\0", LittleEndian);
        let first = name_index_section(5).get_contents().unwrap();
        let mut buf = first.clone();
        buf.extend(name_index_section(4).get_contents().unwrap());
        buf.extend(first);
        let debug_names = DebugNames::new(&buf, LittleEndian);

        let mut out = String::new();
        dump_debug_names(&mut out, &debug_names, &debug_str).unwrap();
        assert_eq!(out.matches("Name Index @").count(), 1);
        let error = alloc::format!("error: {}\n", Error::UnknownVersion(4));
        assert!(out.ends_with(&error));
    }

    #[test]
    fn test_dump_name_index_no_hash_table() {
        let debug_str = DebugStr::new(b"\0main\0", LittleEndian);
        let length = Label::new();
        let start = Label::new();
        let end = Label::new();
        let section = Section::with_endian(Endian::Little)
            .initial_length(Format::Dwarf32, &length, &start)
            .D16(5)
            .D16(0)
            .D32(0)
            .D32(0)
            .D32(0)
            .D32(0)
            .D32(1)
            .D32(1)
            .D32(0)
            // String offsets
            .D32(1)
            // Entry offsets
            .D32(0)
            .D8(0)
            .D8(0)
            .mark(&end);
        length.set_const((&end - &start) as u64);
        let buf = section.get_contents().unwrap();
        let debug_names = DebugNames::new(&buf, LittleEndian);
        let name_index = debug_names.name_indexes().unwrap().remove(0);

        let mut out = String::new();
        dump_name_index(&mut out, &name_index, &debug_str).unwrap();
        assert!(out.contains(
            "  Hash table not present\n  Name 1 {\n    String: 0x00000001 \"main\"\n  }\n"
        ));
    }

    #[test]
    fn test_display_value() {
        type Value<'a> = FormValue<crate::read::EndianSlice<'a, LittleEndian>>;
        let string = crate::read::EndianSlice::new(b"abc", LittleEndian);
        let cases: [(Value<'_>, &str); 5] = [
            (FormValue::Udata(42), "42"),
            (FormValue::Sdata(-1), "-1"),
            (FormValue::Flag(true), "true"),
            (FormValue::String(string), "\"abc\""),
            (FormValue::Block(string), "<0x3 bytes>"),
        ];
        for (value, expected) in cases {
            assert_eq!(alloc::format!("{}", DisplayValue(&value)), expected);
        }
    }
}
