//! Decoding of individual `DW_FORM_*` values.
//!
//! Both kinds of accelerator table describe the layout of their entries with
//! a list of (kind, form) pairs, and decode each value with the same rules
//! that `.debug_info` uses for attributes.

use crate::common::{DebugInfoOffset, DebugStrOffset, DebugTypeSignature, Encoding, UnitOffset};
use crate::constants;
use crate::endianity::Endianity;
use crate::read::{Error, Reader, Result};

/// The class of a form, as defined by the DWARF standard.
///
/// A form may belong to more than one class. For example, `DW_FORM_data4`
/// is both a constant and, before DWARF 4, a section offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormClass {
    /// A target address, or an index into `.debug_addr`.
    Address,
    /// An uninterpreted block of bytes.
    Block,
    /// An integer constant.
    Constant,
    /// A DWARF expression.
    Exprloc,
    /// A boolean flag.
    Flag,
    /// A reference to another debugging information entry.
    Reference,
    /// A string, or a reference to one.
    String,
    /// An offset into another debugging section.
    SectionOffset,
}

/// Return true if `form` belongs to `class`.
///
/// This does not depend on the version of the data, so `DW_FORM_data4` and
/// `DW_FORM_data8` are reported as both constants and section offsets.
pub fn form_has_class(form: constants::DwForm, class: FormClass) -> bool {
    use crate::constants::*;

    match class {
        FormClass::Address => matches!(
            form,
            DW_FORM_addr
                | DW_FORM_addrx
                | DW_FORM_addrx1
                | DW_FORM_addrx2
                | DW_FORM_addrx3
                | DW_FORM_addrx4
                | DW_FORM_GNU_addr_index
        ),
        FormClass::Block => matches!(
            form,
            DW_FORM_block | DW_FORM_block1 | DW_FORM_block2 | DW_FORM_block4
        ),
        FormClass::Constant => matches!(
            form,
            DW_FORM_data1
                | DW_FORM_data2
                | DW_FORM_data4
                | DW_FORM_data8
                | DW_FORM_data16
                | DW_FORM_sdata
                | DW_FORM_udata
                | DW_FORM_implicit_const
        ),
        FormClass::Exprloc => form == DW_FORM_exprloc,
        FormClass::Flag => matches!(form, DW_FORM_flag | DW_FORM_flag_present),
        FormClass::Reference => matches!(
            form,
            DW_FORM_ref1
                | DW_FORM_ref2
                | DW_FORM_ref4
                | DW_FORM_ref8
                | DW_FORM_ref_udata
                | DW_FORM_ref_addr
                | DW_FORM_ref_sig8
                | DW_FORM_ref_sup4
                | DW_FORM_ref_sup8
                | DW_FORM_GNU_ref_alt
        ),
        FormClass::String => matches!(
            form,
            DW_FORM_string
                | DW_FORM_strp
                | DW_FORM_line_strp
                | DW_FORM_strp_sup
                | DW_FORM_strx
                | DW_FORM_strx1
                | DW_FORM_strx2
                | DW_FORM_strx3
                | DW_FORM_strx4
                | DW_FORM_GNU_str_index
                | DW_FORM_GNU_strp_alt
        ),
        FormClass::SectionOffset => matches!(
            form,
            DW_FORM_sec_offset
                | DW_FORM_data4
                | DW_FORM_data8
                | DW_FORM_loclistx
                | DW_FORM_rnglistx
        ),
    }
}

/// A single decoded form value.
///
/// The variants keep the distinctions that matter to a consumer of an
/// accelerator table: constants keep their width, and references keep the
/// section they point into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormValue<R: Reader> {
    /// `DW_FORM_addr`
    Addr(u64),

    /// A slice of an arbitrary number of bytes.
    Block(R),

    /// A one byte constant data value.
    Data1(u8),

    /// A two byte constant data value.
    Data2(u16),

    /// A four byte constant data value.
    Data4(u32),

    /// An eight byte constant data value.
    Data8(u64),

    /// A sixteen byte constant data value.
    Data16(u128),

    /// A signed integer constant.
    Sdata(i64),

    /// An unsigned integer constant.
    Udata(u64),

    /// A DWARF expression.
    Exprloc(R),

    /// A boolean flag.
    Flag(bool),

    /// An offset into another section.
    SecOffset(usize),

    /// A reference to a DIE within the same unit.
    UnitRef(UnitOffset),

    /// A reference to a DIE anywhere in `.debug_info`.
    DebugInfoRef(DebugInfoOffset),

    /// A reference to a DIE in the supplementary object file.
    DebugInfoRefSup(usize),

    /// A type signature.
    DebugTypesRef(DebugTypeSignature),

    /// An offset into the `.debug_str` section.
    DebugStrRef(DebugStrOffset),

    /// An offset into the `.debug_str` section of the supplementary object file.
    DebugStrRefSup(usize),

    /// An offset into the `.debug_line_str` section.
    DebugLineStrRef(usize),

    /// An index into the string offsets table of a unit.
    DebugStrOffsetsIndex(u64),

    /// An index into the address table of a unit.
    DebugAddrIndex(u64),

    /// An index into the location lists table of a unit.
    DebugLocListsIndex(u64),

    /// An index into the range lists table of a unit.
    DebugRngListsIndex(u64),

    /// An inline null-terminated string.
    String(R),
}

impl<R: Reader> FormValue<R> {
    /// Decode a single value of the given form.
    ///
    /// `encoding` supplies the offset size, address size and version that
    /// some forms depend on. `DW_FORM_indirect` is followed to the form that
    /// it names.
    pub fn parse(
        input: &mut R,
        mut form: constants::DwForm,
        encoding: Encoding,
    ) -> Result<FormValue<R>> {
        loop {
            let value = match form {
                constants::DW_FORM_indirect => {
                    form = constants::DwForm(input.read_uleb128_u16()?);
                    continue;
                }
                constants::DW_FORM_addr => {
                    let addr = input.read_address(encoding.address_size)?;
                    FormValue::Addr(addr)
                }
                constants::DW_FORM_block1 => {
                    let len = input.read_u8().map(usize::from)?;
                    FormValue::Block(input.split(len)?)
                }
                constants::DW_FORM_block2 => {
                    let len = input.read_u16().map(usize::from)?;
                    FormValue::Block(input.split(len)?)
                }
                constants::DW_FORM_block4 => {
                    let len = input.read_u32()? as usize;
                    FormValue::Block(input.split(len)?)
                }
                constants::DW_FORM_block => {
                    let len = input.read_uleb128().and_then(super::u64_to_offset)?;
                    FormValue::Block(input.split(len)?)
                }
                constants::DW_FORM_exprloc => {
                    let len = input.read_uleb128().and_then(super::u64_to_offset)?;
                    FormValue::Exprloc(input.split(len)?)
                }
                constants::DW_FORM_data1 => FormValue::Data1(input.read_u8()?),
                constants::DW_FORM_data2 => FormValue::Data2(input.read_u16()?),
                constants::DW_FORM_data4 => FormValue::Data4(input.read_u32()?),
                constants::DW_FORM_data8 => FormValue::Data8(input.read_u64()?),
                constants::DW_FORM_data16 => {
                    let low = input.read_u64()?;
                    let high = input.read_u64()?;
                    let value = if input.endian().is_big_endian() {
                        (u128::from(low) << 64) | u128::from(high)
                    } else {
                        (u128::from(high) << 64) | u128::from(low)
                    };
                    FormValue::Data16(value)
                }
                constants::DW_FORM_sdata => FormValue::Sdata(input.read_sleb128()?),
                constants::DW_FORM_udata => FormValue::Udata(input.read_uleb128()?),
                constants::DW_FORM_flag => {
                    let present = input.read_u8()?;
                    FormValue::Flag(present != 0)
                }
                constants::DW_FORM_flag_present => {
                    // This form is only present in the abbreviation, not the data.
                    FormValue::Flag(true)
                }
                constants::DW_FORM_sec_offset => {
                    let offset = input.read_offset(encoding.format)?;
                    FormValue::SecOffset(offset)
                }
                constants::DW_FORM_ref1 => {
                    let reference = input.read_u8().map(usize::from)?;
                    FormValue::UnitRef(UnitOffset(reference))
                }
                constants::DW_FORM_ref2 => {
                    let reference = input.read_u16().map(usize::from)?;
                    FormValue::UnitRef(UnitOffset(reference))
                }
                constants::DW_FORM_ref4 => {
                    let reference = input.read_u32()? as usize;
                    FormValue::UnitRef(UnitOffset(reference))
                }
                constants::DW_FORM_ref8 => {
                    let reference = input.read_u64().and_then(super::u64_to_offset)?;
                    FormValue::UnitRef(UnitOffset(reference))
                }
                constants::DW_FORM_ref_udata => {
                    let reference = input.read_uleb128().and_then(super::u64_to_offset)?;
                    FormValue::UnitRef(UnitOffset(reference))
                }
                constants::DW_FORM_ref_addr => {
                    // DWARF version 2 specifies that DW_FORM_ref_addr has the
                    // same size as an address on the target system.
                    let offset = if encoding.version == 2 {
                        input.read_sized_offset(encoding.address_size)?
                    } else {
                        input.read_offset(encoding.format)?
                    };
                    FormValue::DebugInfoRef(DebugInfoOffset(offset))
                }
                constants::DW_FORM_ref_sig8 => {
                    let signature = input.read_u64()?;
                    FormValue::DebugTypesRef(DebugTypeSignature(signature))
                }
                constants::DW_FORM_ref_sup4 => {
                    let offset = input.read_u32()? as usize;
                    FormValue::DebugInfoRefSup(offset)
                }
                constants::DW_FORM_ref_sup8 => {
                    let offset = input.read_u64().and_then(super::u64_to_offset)?;
                    FormValue::DebugInfoRefSup(offset)
                }
                constants::DW_FORM_GNU_ref_alt => {
                    let offset = input.read_offset(encoding.format)?;
                    FormValue::DebugInfoRefSup(offset)
                }
                constants::DW_FORM_string => {
                    let string = input.read_null_terminated_slice()?;
                    FormValue::String(string)
                }
                constants::DW_FORM_strp => {
                    let offset = input.read_offset(encoding.format)?;
                    FormValue::DebugStrRef(DebugStrOffset(offset))
                }
                constants::DW_FORM_strp_sup | constants::DW_FORM_GNU_strp_alt => {
                    let offset = input.read_offset(encoding.format)?;
                    FormValue::DebugStrRefSup(offset)
                }
                constants::DW_FORM_line_strp => {
                    let offset = input.read_offset(encoding.format)?;
                    FormValue::DebugLineStrRef(offset)
                }
                constants::DW_FORM_strx | constants::DW_FORM_GNU_str_index => {
                    FormValue::DebugStrOffsetsIndex(input.read_uleb128()?)
                }
                constants::DW_FORM_strx1 => {
                    FormValue::DebugStrOffsetsIndex(input.read_u8()?.into())
                }
                constants::DW_FORM_strx2 => {
                    FormValue::DebugStrOffsetsIndex(input.read_u16()?.into())
                }
                constants::DW_FORM_strx3 => FormValue::DebugStrOffsetsIndex(input.read_uint(3)?),
                constants::DW_FORM_strx4 => {
                    FormValue::DebugStrOffsetsIndex(input.read_u32()?.into())
                }
                constants::DW_FORM_addrx | constants::DW_FORM_GNU_addr_index => {
                    FormValue::DebugAddrIndex(input.read_uleb128()?)
                }
                constants::DW_FORM_addrx1 => FormValue::DebugAddrIndex(input.read_u8()?.into()),
                constants::DW_FORM_addrx2 => FormValue::DebugAddrIndex(input.read_u16()?.into()),
                constants::DW_FORM_addrx3 => FormValue::DebugAddrIndex(input.read_uint(3)?),
                constants::DW_FORM_addrx4 => FormValue::DebugAddrIndex(input.read_u32()?.into()),
                constants::DW_FORM_loclistx => {
                    FormValue::DebugLocListsIndex(input.read_uleb128()?)
                }
                constants::DW_FORM_rnglistx => {
                    FormValue::DebugRngListsIndex(input.read_uleb128()?)
                }
                // The constant is stored in the abbreviation, and neither kind
                // of accelerator table has room for it.
                constants::DW_FORM_implicit_const => {
                    return Err(Error::UnsupportedAttributeForm(form));
                }
                _ => {
                    return Err(Error::UnknownForm(form));
                }
            };
            return Ok(value);
        }
    }

    /// Skip a single value of the given form, without decoding it.
    pub fn skip(input: &mut R, form: constants::DwForm, encoding: Encoding) -> Result<()> {
        FormValue::parse(input, form, encoding).map(|_| ())
    }

    /// Return the value as an unsigned constant, if its class permits.
    ///
    /// Constants and flags convert. `DW_FORM_sdata`, sixteen byte constants
    /// and all other classes do not, even if the value is not negative.
    pub fn unsigned_constant(&self) -> Option<u64> {
        Some(match *self {
            FormValue::Data1(data) => u64::from(data),
            FormValue::Data2(data) => u64::from(data),
            FormValue::Data4(data) => u64::from(data),
            FormValue::Data8(data) => data,
            FormValue::Udata(data) => data,
            FormValue::Flag(flag) => u64::from(flag),
            _ => return None,
        })
    }

    /// Return the value as a signed constant, if its class permits.
    pub fn signed_constant(&self) -> Option<i64> {
        Some(match *self {
            FormValue::Data1(data) => i64::from(data as i8),
            FormValue::Data2(data) => i64::from(data as i16),
            FormValue::Data4(data) => i64::from(data as i32),
            FormValue::Data8(data) => data as i64,
            FormValue::Sdata(data) => data,
            FormValue::Udata(data) => i64::try_from(data).ok()?,
            _ => return None,
        })
    }

    /// Return the value as a reference to a DIE within its unit.
    pub fn unit_ref(&self) -> Option<UnitOffset> {
        match *self {
            FormValue::UnitRef(offset) => Some(offset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Format;
    use crate::constants::*;
    use crate::endianity::LittleEndian;
    use crate::read::EndianSlice;
    use crate::test_util::AccelSectionMethods;
    use test_assembler::{Endian, Section};

    const ENCODING: Encoding = Encoding {
        address_size: 0,
        format: Format::Dwarf32,
        version: 5,
    };

    #[test]
    fn test_parse_constants() {
        let buf = Section::with_endian(Endian::Little)
            .D8(0x12)
            .D16(0x1234)
            .D32(0x1234_5678)
            .D64(0x1234_5678_9abc_def0)
            .uleb(0x3fff)
            .sleb(-2)
            .D8(1)
            .get_contents()
            .unwrap();
        let input = &mut EndianSlice::new(&buf, LittleEndian);

        let expected = [
            (DW_FORM_data1, FormValue::Data1(0x12)),
            (DW_FORM_data2, FormValue::Data2(0x1234)),
            (DW_FORM_data4, FormValue::Data4(0x1234_5678)),
            (DW_FORM_data8, FormValue::Data8(0x1234_5678_9abc_def0)),
            (DW_FORM_udata, FormValue::Udata(0x3fff)),
            (DW_FORM_sdata, FormValue::Sdata(-2)),
            (DW_FORM_flag, FormValue::Flag(true)),
            (DW_FORM_flag_present, FormValue::Flag(true)),
        ];
        for (form, value) in expected {
            assert_eq!(FormValue::parse(input, form, ENCODING), Ok(value));
        }
        assert!(input.is_empty());
    }

    #[test]
    fn test_parse_offsets() {
        for format in [Format::Dwarf32, Format::Dwarf64] {
            let encoding = Encoding { format, ..ENCODING };
            let buf = Section::with_endian(Endian::Little)
                .word(format.word_size(), 0x1234)
                .word(format.word_size(), 0x5678)
                .get_contents()
                .unwrap();
            let input = &mut EndianSlice::new(&buf, LittleEndian);
            assert_eq!(
                FormValue::parse(input, DW_FORM_strp, encoding),
                Ok(FormValue::DebugStrRef(DebugStrOffset(0x1234)))
            );
            assert_eq!(
                FormValue::parse(input, DW_FORM_sec_offset, encoding),
                Ok(FormValue::SecOffset(0x5678))
            );
            assert!(input.is_empty());
        }
    }

    #[test]
    fn test_parse_indirect() {
        let buf = Section::with_endian(Endian::Little)
            .uleb(DW_FORM_ref2.0.into())
            .D16(0x40)
            .get_contents()
            .unwrap();
        let input = &mut EndianSlice::new(&buf, LittleEndian);
        assert_eq!(
            FormValue::parse(input, DW_FORM_indirect, ENCODING),
            Ok(FormValue::UnitRef(UnitOffset(0x40)))
        );
    }

    #[test]
    fn test_parse_errors() {
        let buf = [0x01, 0x02];
        let input = &mut EndianSlice::new(&buf, LittleEndian);
        assert!(matches!(
            FormValue::parse(input, DW_FORM_data4, ENCODING),
            Err(Error::UnexpectedEof(_))
        ));
        let input = &mut EndianSlice::new(&buf, LittleEndian);
        assert_eq!(
            FormValue::parse(input, DwForm(0x99), ENCODING),
            Err(Error::UnknownForm(DwForm(0x99)))
        );
        // Accelerator tables never carry an address size.
        let input = &mut EndianSlice::new(&buf, LittleEndian);
        assert_eq!(
            FormValue::parse(input, DW_FORM_addr, ENCODING),
            Err(Error::UnsupportedAddressSize(0))
        );
    }

    #[test]
    fn test_unsigned_constant() {
        type V<'a> = FormValue<EndianSlice<'a, LittleEndian>>;
        assert_eq!(V::Data2(7).unsigned_constant(), Some(7));
        assert_eq!(V::Flag(true).unsigned_constant(), Some(1));
        assert_eq!(V::Sdata(5).unsigned_constant(), None);
        assert_eq!(V::Sdata(5).signed_constant(), Some(5));
        assert_eq!(V::Sdata(-1).unsigned_constant(), None);
        assert_eq!(V::UnitRef(UnitOffset(4)).unsigned_constant(), None);
        assert_eq!(V::Data1(0xff).signed_constant(), Some(-1));
    }

    #[test]
    fn test_form_classes() {
        assert!(form_has_class(DW_FORM_data4, FormClass::Constant));
        assert!(form_has_class(DW_FORM_data4, FormClass::SectionOffset));
        assert!(form_has_class(DW_FORM_sdata, FormClass::Constant));
        assert!(form_has_class(DW_FORM_flag_present, FormClass::Flag));
        assert!(!form_has_class(DW_FORM_ref4, FormClass::Constant));
        assert!(form_has_class(DW_FORM_ref4, FormClass::Reference));
        assert!(form_has_class(DW_FORM_strx3, FormClass::String));
    }
}
