//! Look up names in the accelerator tables of an object file.

use std::env;
use std::io::{self, BufWriter, Write};
use std::process;

use dwarf_accel::{AppleAccelTable, NameIndex, NameTableIndex, Reader, SectionId};
use dwarf_accel_examples::{init_tracing, open_file, Arenas, Result, SectionReader, Sections};
use fallible_iterator::FallibleIterator;
use regex::bytes::Regex;

enum Pattern {
    Exact(Vec<u8>),
    Regex(Regex),
}

impl Pattern {
    fn is_match(&self, name: &[u8]) -> bool {
        match self {
            Pattern::Exact(pattern) => pattern == name,
            Pattern::Regex(regex) => regex.is_match(name),
        }
    }
}

fn print_usage(opts: &getopts::Options) -> ! {
    let brief = format!(
        "Usage: {} <options> <file> <name>...",
        env::args().next().unwrap()
    );
    write!(&mut io::stderr(), "{}", opts.usage(&brief)).ok();
    process::exit(1);
}

fn main() {
    let mut opts = getopts::Options::new();
    opts.optflag(
        "r",
        "regex",
        "treat names as regular expressions and scan every name",
    );

    let matches = match opts.parse(env::args().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            writeln!(&mut io::stderr(), "{:?}\n", e).ok();
            print_usage(&opts);
        }
    };
    if matches.free.len() < 2 {
        print_usage(&opts);
    }

    let patterns: Vec<Pattern> = matches.free[1..]
        .iter()
        .map(|name| {
            if matches.opt_present("r") {
                match Regex::new(name) {
                    Ok(r) => Pattern::Regex(r),
                    Err(e) => {
                        eprintln!("Invalid regular expression {}: {}", name, e);
                        process::exit(1);
                    }
                }
            } else {
                Pattern::Exact(name.as_bytes().to_vec())
            }
        })
        .collect();

    init_tracing();

    let file_path = &matches.free[0];
    let Some(mmap) = open_file(file_path) else {
        process::exit(1);
    };
    let file = match object::File::parse(&*mmap) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Failed to parse file '{}': {}", file_path, err);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    if let Err(err) = lookup_file(&mut w, &file, &patterns) {
        eprintln!("Failed to look up names in '{}': {}", file_path, err);
        process::exit(1);
    }
    w.flush().ok();
}

fn lookup_file<W: Write>(w: &mut W, file: &object::File, patterns: &[Pattern]) -> Result<()> {
    let arenas = Arenas::new();
    let sections = Sections::load(file, &arenas)?;

    for (id, section) in &sections.apple_tables {
        let table = AppleAccelTable::parse(section.clone(), sections.debug_str.clone())?;
        for pattern in patterns {
            match pattern {
                Pattern::Exact(name) => {
                    for entry in table.lookup(name)? {
                        print_apple_entry(w, *id, name, entry.die_offset(), entry.tag())?;
                    }
                }
                Pattern::Regex(_) => lookup_apple_regex(w, *id, &table, pattern)?,
            }
        }
    }

    if let Some(debug_names) = &sections.debug_names {
        for name_index in debug_names.name_indexes()? {
            for pattern in patterns {
                match pattern {
                    Pattern::Exact(name) => {
                        if let Some(index) = name_index.find_name(name, &sections.debug_str)? {
                            print_name_entries(w, &name_index, index, name)?;
                        }
                    }
                    Pattern::Regex(_) => {
                        for index in name_index.names() {
                            let name = name_index.name_string(index, &sections.debug_str)?;
                            let name = name.to_slice()?;
                            if pattern.is_match(&name) {
                                print_name_entries(w, &name_index, index, &name)?;
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn lookup_apple_regex<W: Write>(
    w: &mut W,
    id: SectionId,
    table: &AppleAccelTable<SectionReader<'_>>,
    pattern: &Pattern,
) -> Result<()> {
    for bucket in 0..table.bucket_count() {
        let Some(mut slots) = table.find_by_bucket(bucket)? else {
            continue;
        };
        while let Some(slot) = slots.next()? {
            let mut names = table.names_at(slot.data_offset)?;
            while let Some(name) = names.next()? {
                let string = name.name(table.debug_str())?;
                let string = string.to_slice()?;
                if !pattern.is_match(&string) {
                    continue;
                }
                for entry in name.entries(table) {
                    print_apple_entry(w, id, &string, entry.die_offset(), entry.tag())?;
                }
            }
        }
    }
    Ok(())
}

fn print_apple_entry<W: Write>(
    w: &mut W,
    id: SectionId,
    name: &[u8],
    die_offset: u64,
    tag: dwarf_accel::DwTag,
) -> Result<()> {
    writeln!(
        w,
        "{}: {}: {} <0x{:08x}>",
        id.name(),
        String::from_utf8_lossy(name),
        tag,
        die_offset
    )?;
    Ok(())
}

fn print_name_entries<W: Write>(
    w: &mut W,
    name_index: &NameIndex<SectionReader<'_>>,
    index: NameTableIndex,
    name: &[u8],
) -> Result<()> {
    let default_compile_unit = name_index.default_compile_unit()?;
    let entries = name_index.name_entries(index)?;
    FallibleIterator::for_each(entries, |entry| {
        let compile_unit = entry.compile_unit(name_index)?.or(default_compile_unit);
        let die_offset = entry.die_offset()?;
        write!(
            w,
            ".debug_names@0x{:x}: {}: {}",
            name_index.header().offset().0,
            String::from_utf8_lossy(name),
            entry.tag
        )
        .ok();
        if let Some(compile_unit) = compile_unit {
            write!(w, " cu 0x{:08x}", compile_unit.0).ok();
        }
        if let Some(type_unit) = entry.type_unit(name_index)? {
            write!(w, " tu {:?}", type_unit).ok();
        }
        if let Some(die_offset) = die_offset {
            write!(w, " <0x{:08x}>", die_offset.0).ok();
        }
        writeln!(w).ok();
        Ok(())
    })?;
    Ok(())
}
