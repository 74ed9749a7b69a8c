use dwarf_accel::{
    case_folding_djb_hash, djb_hash, AppleAccelTable, AppleValueIter, DebugNames,
    DebugNamesOffset, DebugStr, Error, ErrorKind, LittleEndian, NameTableIndex, TableRegion,
    UnitOffset, DW_ATOM_die_offset, DW_ATOM_die_tag, DW_ATOM_type_flags, DW_FORM_data1,
    DW_FORM_data2, DW_FORM_data4, DW_FORM_flag, DW_FORM_ref4, DW_FORM_sdata, DW_FORM_udata,
    DW_IDX_die_offset, DW_TAG_subprogram, DW_TAG_variable,
};
use test_assembler::{Endian, Label, LabelMaker, Section};

const NAMES: &[&str] = &[
    "main", "int", "char", "foo", "bar", "baz", "__ARRAY_SIZE_TYPE__", "std", "vector",
    "operator new", "_start", "printf", "malloc", "free", "Node", "List",
];

fn uleb(mut val: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    loop {
        let byte = (val & 0x7f) as u8;
        val >>= 7;
        if val == 0 {
            buf.push(byte);
            return buf;
        }
        buf.push(byte | 0x80);
    }
}

/// Append `names` to a string section, returning their offsets.
fn add_strings(debug_str: &mut Vec<u8>, names: &[&str]) -> Vec<u32> {
    if debug_str.is_empty() {
        debug_str.push(0);
    }
    names
        .iter()
        .map(|name| {
            let offset = debug_str.len() as u32;
            debug_str.extend_from_slice(name.as_bytes());
            debug_str.push(0);
            offset
        })
        .collect()
}

/// Build an Apple table with a DIE offset atom and one entry per name.
///
/// The DIE offset of the name at index `i` is `0x100 + i`.
fn apple_table(names: &[&str], bucket_count: u32) -> (Vec<u8>, Vec<u8>) {
    let mut debug_str = Vec::new();
    let string_offsets = add_strings(&mut debug_str, names);

    let mut slots: Vec<(u32, u32, usize)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let hash = djb_hash(name.as_bytes());
            (hash % bucket_count, hash, i)
        })
        .collect();
    slots.sort();

    let mut buckets = vec![u32::MAX; bucket_count as usize];
    for (index, &(bucket, _, _)) in slots.iter().enumerate().rev() {
        buckets[bucket as usize] = index as u32;
    }

    let chains: Vec<Label> = slots.iter().map(|_| Label::new()).collect();
    let mut section = Section::with_endian(Endian::Little)
        .D32(0x4841_5348)
        .D16(1)
        .D16(0)
        .D32(bucket_count)
        .D32(slots.len() as u32)
        .D32(12)
        .D32(0)
        .D32(1)
        .D16(DW_ATOM_die_offset.0)
        .D16(DW_FORM_data4.0);
    for bucket in &buckets {
        section = section.D32(*bucket);
    }
    for &(_, hash, _) in &slots {
        section = section.D32(hash);
    }
    for chain in &chains {
        section = section.D32(chain);
    }
    for (chain, &(_, _, i)) in chains.iter().zip(&slots) {
        section = section
            .mark(chain)
            .D32(string_offsets[i])
            .D32(1)
            .D32(0x100 + i as u32)
            .D32(0);
    }
    section.start().set_const(0);
    (section.get_contents().unwrap(), debug_str)
}

#[test]
fn apple_lookup_finds_every_name() {
    for bucket_count in 1..=8 {
        let (section, debug_str) = apple_table(NAMES, bucket_count);
        let table = AppleAccelTable::new(&section, &debug_str, LittleEndian).unwrap();
        assert!(table.validate_forms());

        for (i, name) in NAMES.iter().enumerate() {
            let offsets: Vec<u64> = table
                .lookup(name.as_bytes())
                .unwrap()
                .map(|entry| entry.die_offset())
                .collect();
            assert_eq!(offsets, [0x100 + i as u64], "{} in {} buckets", name, bucket_count);
        }

        for absent in ["", "mai", "main2", "MAIN", "quux"] {
            let values = table.lookup(absent.as_bytes()).unwrap();
            assert!(values == AppleValueIter::end(), "{}", absent);
        }
    }
}

#[test]
fn apple_bucket_walk_matches_hashes() {
    for bucket_count in [1, 3, 5, 16] {
        let (section, debug_str) = apple_table(NAMES, bucket_count);
        let table = AppleAccelTable::new(&section, &debug_str, LittleEndian).unwrap();
        let mut seen = 0;
        for bucket in 0..bucket_count {
            let Some(slots) = table.find_by_bucket(bucket).unwrap() else {
                continue;
            };
            for slot in slots {
                let slot = slot.unwrap();
                assert_eq!(slot.hash % bucket_count, bucket);
                for name in table.names_at(slot.data_offset).unwrap() {
                    let name = name.unwrap();
                    let string = name.name(table.debug_str()).unwrap();
                    assert_eq!(djb_hash(string.slice()), slot.hash);
                    seen += 1;
                }
            }
        }
        assert_eq!(seen, NAMES.len());
    }
}

#[test]
fn apple_truncated_tables_are_rejected() {
    let (section, debug_str) = apple_table(NAMES, 4);
    let arrays_end = 20 + 12 + 4 * 4 + NAMES.len() * 8;
    for len in 0..arrays_end {
        let error = AppleAccelTable::new(&section[..len], &debug_str, LittleEndian).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Truncated, "length {}", len);
    }
    assert!(AppleAccelTable::new(&section[..arrays_end], &debug_str, LittleEndian).is_ok());
}

fn apple_table_with_atoms(atoms: &[(u16, u16)]) -> Vec<u8> {
    let mut section = Section::with_endian(Endian::Little)
        .D32(0x4841_5348)
        .D16(1)
        .D16(0)
        .D32(0)
        .D32(0)
        .D32(8 + 4 * atoms.len() as u32)
        .D32(0)
        .D32(atoms.len() as u32);
    for &(atom, form) in atoms {
        section = section.D16(atom).D16(form);
    }
    section.get_contents().unwrap()
}

#[test]
fn apple_validate_forms() {
    let valid = apple_table_with_atoms(&[
        (DW_ATOM_die_offset.0, DW_FORM_data4.0),
        (DW_ATOM_die_tag.0, DW_FORM_data2.0),
        (DW_ATOM_type_flags.0, DW_FORM_data1.0),
    ]);
    let table = AppleAccelTable::new(&valid, &[], LittleEndian).unwrap();
    assert!(table.validate_forms());

    let valid = apple_table_with_atoms(&[
        (DW_ATOM_die_offset.0, DW_FORM_udata.0),
        (DW_ATOM_type_flags.0, DW_FORM_flag.0),
    ]);
    let table = AppleAccelTable::new(&valid, &[], LittleEndian).unwrap();
    assert!(table.validate_forms());

    for atom in [DW_ATOM_die_offset, DW_ATOM_die_tag, DW_ATOM_type_flags] {
        let invalid = apple_table_with_atoms(&[(atom.0, DW_FORM_sdata.0)]);
        let table = AppleAccelTable::new(&invalid, &[], LittleEndian).unwrap();
        assert!(!table.validate_forms(), "{}", atom);
    }
}

/// Build a `.debug_names` unit with one `DW_TAG_subprogram` entry per name.
///
/// The DIE offset of the name at index `i` is `die_offset_base + i`.
fn debug_names_unit(
    debug_str: &mut Vec<u8>,
    names: &[&str],
    bucket_count: u32,
    die_offset_base: u32,
    abbrevs: &[u8],
) -> Vec<u8> {
    let string_offsets = add_strings(debug_str, names);
    let mut order: Vec<(u32, u32, usize)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let hash = case_folding_djb_hash(name.as_bytes());
            (hash.checked_rem(bucket_count).unwrap_or(0), hash, i)
        })
        .collect();
    order.sort();

    let mut buckets = vec![0u32; bucket_count as usize];
    for (index, &(bucket, _, _)) in order.iter().enumerate().rev() {
        if bucket_count != 0 {
            buckets[bucket as usize] = index as u32 + 1;
        }
    }

    let length = Label::new();
    let start = Label::new();
    let end = Label::new();
    let mut section = Section::with_endian(Endian::Little)
        .D32(&length)
        .mark(&start)
        .D16(5)
        .D16(0)
        .D32(1)
        .D32(0)
        .D32(0)
        .D32(bucket_count)
        .D32(names.len() as u32)
        .D32(abbrevs.len() as u32)
        .D32(0)
        .D32(0);
    for bucket in &buckets {
        section = section.D32(*bucket);
    }
    if bucket_count != 0 {
        for &(_, hash, _) in &order {
            section = section.D32(hash);
        }
    }
    for &(_, _, i) in &order {
        section = section.D32(string_offsets[i]);
    }
    for position in 0..order.len() {
        section = section.D32(position as u32 * 6);
    }
    section = section.append_bytes(abbrevs);
    for &(_, _, i) in &order {
        section = section.D8(1).D32(die_offset_base + i as u32).D8(0);
    }
    section = section.mark(&end);
    length.set_const((&end - &start) as u64);
    section.get_contents().unwrap()
}

fn subprogram_abbrevs() -> Vec<u8> {
    let mut abbrevs = Vec::new();
    abbrevs.extend(uleb(1));
    abbrevs.extend(uleb(DW_TAG_subprogram.0.into()));
    abbrevs.extend(uleb(DW_IDX_die_offset.0.into()));
    abbrevs.extend(uleb(DW_FORM_ref4.0.into()));
    abbrevs.extend([0, 0, 0]);
    abbrevs
}

#[test]
fn debug_names_lookup_finds_every_name() {
    for bucket_count in 0..=5 {
        let mut debug_str = Vec::new();
        let section =
            debug_names_unit(&mut debug_str, NAMES, bucket_count, 0x40, &subprogram_abbrevs());
        let debug_names = DebugNames::new(&section, LittleEndian);
        let debug_str = DebugStr::new(&debug_str, LittleEndian);
        let name_indexes = debug_names.name_indexes().unwrap();
        assert_eq!(name_indexes.len(), 1);
        let name_index = &name_indexes[0];
        assert_eq!(name_index.has_hash_table(), bucket_count != 0);

        for (i, name) in NAMES.iter().enumerate() {
            let index = name_index
                .find_name(name.as_bytes(), &debug_str)
                .unwrap()
                .unwrap();
            let entries: Vec<_> = name_index
                .name_entries(index)
                .unwrap()
                .map(|entry| entry.unwrap().die_offset().unwrap())
                .collect();
            assert_eq!(entries, [Some(UnitOffset(0x40 + i))]);
        }
        assert_eq!(name_index.find_name(b"quux", &debug_str), Ok(None));

        for bucket in 0..bucket_count {
            let Some(names) = name_index.find_by_bucket(bucket).unwrap() else {
                continue;
            };
            for name in names {
                let (index, hash) = name.unwrap();
                assert_eq!(hash % bucket_count, bucket);
                let string = name_index.name_string(index, &debug_str).unwrap();
                assert_eq!(case_folding_djb_hash(string.slice()), hash);
            }
        }
    }
}

#[test]
fn debug_names_lookup_folds_case_when_hashing() {
    for bucket_count in [0, 1, 3] {
        let mut debug_str = Vec::new();
        let section = debug_names_unit(
            &mut debug_str,
            &["Main", "main", "Stra\u{df}e"],
            bucket_count,
            0x40,
            &subprogram_abbrevs(),
        );
        let debug_str = DebugStr::new(&debug_str, LittleEndian);
        let name_indexes = DebugNames::new(&section, LittleEndian)
            .name_indexes()
            .unwrap();
        let name_index = &name_indexes[0];

        let lookup = |name: &str| {
            name_index
                .find_name(name.as_bytes(), &debug_str)
                .unwrap()
                .map(|index| {
                    let mut entries = name_index.name_entries(index).unwrap();
                    entries.next().unwrap().unwrap().die_offset().unwrap()
                })
        };
        // The hash ignores case, but the names are still compared exactly.
        assert_eq!(lookup("Main"), Some(Some(UnitOffset(0x40))));
        assert_eq!(lookup("main"), Some(Some(UnitOffset(0x41))));
        assert_eq!(lookup("Stra\u{df}e"), Some(Some(UnitOffset(0x42))));
        assert_eq!(lookup("MAIN"), None);
        assert_eq!(lookup("STRA\u{1e9e}E"), None);

        if bucket_count != 0 {
            let hashes: Vec<u32> = name_index
                .names()
                .map(|index| name_index.hash(index).unwrap())
                .collect();
            assert_eq!(hashes.iter().filter(|&&hash| hash == 0x7c9a_7f6a).count(), 2);
        }
    }
}

#[test]
fn debug_names_lookup_skips_unreadable_names() {
    for bucket_count in [0, 1] {
        let mut debug_str = Vec::new();
        let mut section = debug_names_unit(
            &mut debug_str,
            &["Main", "main"],
            bucket_count,
            0x40,
            &subprogram_abbrevs(),
        );
        let string_offsets = DebugNames::new(&section, LittleEndian)
            .name_indexes()
            .unwrap()[0]
            .layout()
            .string_offsets
            .0;
        // Point the first name past the end of `.debug_str`.
        section[string_offsets..][..4].copy_from_slice(&0x1000u32.to_le_bytes());

        let debug_str = DebugStr::new(&debug_str, LittleEndian);
        let name_indexes = DebugNames::new(&section, LittleEndian)
            .name_indexes()
            .unwrap();
        let name_index = &name_indexes[0];
        assert!(name_index
            .name_string(NameTableIndex(1), &debug_str)
            .is_err());
        assert_eq!(
            name_index.find_name(b"main", &debug_str),
            Ok(Some(NameTableIndex(2)))
        );
        assert_eq!(name_index.find_name(b"Main", &debug_str), Ok(None));
    }
}

#[test]
fn debug_names_truncated_units_are_rejected() {
    let mut debug_str = Vec::new();
    let section = debug_names_unit(&mut debug_str, NAMES, 4, 0, &subprogram_abbrevs());
    let name_indexes = DebugNames::new(&section, LittleEndian)
        .name_indexes()
        .unwrap();
    let entries = name_indexes[0].layout().entries.0;

    for len in 1..section.len() {
        let debug_names = DebugNames::new(&section[..len], LittleEndian);
        let error = debug_names.name_indexes().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Truncated, "length {}", len);
    }

    // Shrink the unit length too, so that each region is cut short in turn.
    for len in 0..entries - 4 {
        let mut unit = section[..4 + len].to_vec();
        unit[..4].copy_from_slice(&(len as u32).to_le_bytes());
        let debug_names = DebugNames::new(&unit, LittleEndian);
        let error = debug_names.name_indexes().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Truncated, "unit length {}", len);
    }
}

#[test]
fn debug_names_truncated_augmentation() {
    let buf = Section::with_endian(Endian::Little)
        .D32(32 + 3)
        .D16(5)
        .D16(0)
        .D32(0)
        .D32(0)
        .D32(0)
        .D32(0)
        .D32(0)
        .D32(0)
        .D32(8)
        .append_bytes(b"LLV")
        .get_contents()
        .unwrap();
    let debug_names = DebugNames::new(&buf, LittleEndian);
    assert_eq!(
        debug_names.name_indexes().unwrap_err(),
        Error::SectionTooSmall(TableRegion::Augmentation)
    );
}

#[test]
fn debug_names_duplicate_abbreviation_code() {
    let mut abbrevs = Vec::new();
    for tag in [DW_TAG_subprogram, DW_TAG_variable] {
        abbrevs.extend(uleb(1));
        abbrevs.extend(uleb(tag.0.into()));
        abbrevs.extend(uleb(DW_IDX_die_offset.0.into()));
        abbrevs.extend(uleb(DW_FORM_ref4.0.into()));
        abbrevs.extend([0, 0]);
    }
    abbrevs.push(0);

    let mut debug_str = Vec::new();
    let section = debug_names_unit(&mut debug_str, &["main"], 1, 0, &abbrevs);
    let debug_names = DebugNames::new(&section, LittleEndian);
    let error = debug_names.name_indexes().unwrap_err();
    assert_eq!(error, Error::DuplicateAbbreviationCode(1));
    assert_eq!(error.kind(), ErrorKind::Inconsistent);
}

#[test]
fn debug_names_abbreviation_terminator() {
    let mut debug_str = Vec::new();

    // The attribute list is missing its (0, 0) terminator.
    let mut abbrevs = subprogram_abbrevs();
    abbrevs.truncate(abbrevs.len() - 3);
    let section = debug_names_unit(&mut debug_str, &["main"], 1, 0, &abbrevs);
    let debug_names = DebugNames::new(&section, LittleEndian);
    assert_eq!(
        debug_names.name_indexes().unwrap_err(),
        Error::UnterminatedAbbreviationTable
    );

    let section = debug_names_unit(&mut debug_str, &["main"], 1, 0, &subprogram_abbrevs());
    let name_indexes = DebugNames::new(&section, LittleEndian)
        .name_indexes()
        .unwrap();
    let abbrevs = name_indexes[0].abbreviations();
    assert_eq!(abbrevs.len(), 1);
    let abbrev = abbrevs.get(1).unwrap();
    assert_eq!(abbrev.tag(), DW_TAG_subprogram);
    assert_eq!(abbrev.attributes().len(), 1);
    assert_eq!(abbrev.attributes()[0].index(), DW_IDX_die_offset);
    assert_eq!(abbrev.attributes()[0].form(), DW_FORM_ref4);
}

#[test]
fn debug_names_entry_sentinel_and_invalid_code() {
    let mut debug_str = Vec::new();
    let section = debug_names_unit(&mut debug_str, &["main"], 1, 0x20, &subprogram_abbrevs());
    let name_indexes = DebugNames::new(&section, LittleEndian)
        .name_indexes()
        .unwrap();
    let name_index = &name_indexes[0];
    let entries = name_index.layout().entries.0;

    let entry = name_index.entry(DebugNamesOffset(entries)).unwrap().unwrap();
    assert_eq!(entry.die_offset(), Ok(Some(UnitOffset(0x20))));
    // The null entry after the first one.
    assert_eq!(name_index.entry(DebugNamesOffset(entries + 5)), Ok(None));
    // The DIE offset bytes 0x20 0x00 0x00 0x00 start with code 0x20.
    assert_eq!(
        name_index.entry(DebugNamesOffset(entries + 1)),
        Err(Error::InvalidAbbreviationCode(0x20))
    );
    assert_eq!(
        name_index.entry(DebugNamesOffset(entries + 6)),
        Err(Error::UnterminatedEntryList)
    );
}

#[test]
fn debug_names_two_units() {
    let mut debug_str = Vec::new();
    let mut section = debug_names_unit(
        &mut debug_str,
        &["main", "foo"],
        2,
        0x10,
        &subprogram_abbrevs(),
    );
    let first_len = section.len();
    section.extend(debug_names_unit(
        &mut debug_str,
        &["bar", "baz", "int"],
        3,
        0x80,
        &subprogram_abbrevs(),
    ));
    let debug_names = DebugNames::new(&section, LittleEndian);
    let debug_str = DebugStr::new(&debug_str, LittleEndian);

    let name_indexes = debug_names.name_indexes().unwrap();
    assert_eq!(name_indexes.len(), 2);
    assert_eq!(name_indexes[0].header().offset(), DebugNamesOffset(0));
    assert_eq!(name_indexes[1].header().offset(), DebugNamesOffset(first_len));
    assert_eq!(name_indexes[0].name_count(), 2);
    assert_eq!(name_indexes[1].name_count(), 3);

    let lookup = |unit: usize, name: &str| {
        let name_index = &name_indexes[unit];
        name_index
            .find_name(name.as_bytes(), &debug_str)
            .unwrap()
            .map(|index| {
                let mut entries = name_index.name_entries(index).unwrap();
                entries.next().unwrap().unwrap().die_offset().unwrap()
            })
    };
    assert_eq!(lookup(0, "main"), Some(Some(UnitOffset(0x10))));
    assert_eq!(lookup(0, "foo"), Some(Some(UnitOffset(0x11))));
    assert_eq!(lookup(0, "baz"), None);
    assert_eq!(lookup(1, "bar"), Some(Some(UnitOffset(0x80))));
    assert_eq!(lookup(1, "int"), Some(Some(UnitOffset(0x82))));
    assert_eq!(lookup(1, "main"), None);
}
