//! Dump the accelerator tables of object files.

use std::env;
use std::io::{self, BufWriter, Write};
use std::process;

use dwarf_accel::dump::{dump_apple_table, dump_debug_names};
use dwarf_accel::AppleAccelTable;
use dwarf_accel_examples::{init_tracing, open_file, Arenas, Result, Sections};

#[derive(Default)]
struct Flags {
    apple: bool,
    debug_names: bool,
}

fn print_usage(opts: &getopts::Options) -> ! {
    let brief = format!("Usage: {} <options> <file>...", env::args().next().unwrap());
    write!(&mut io::stderr(), "{}", opts.usage(&brief)).ok();
    process::exit(1);
}

fn main() {
    let mut opts = getopts::Options::new();
    opts.optflag(
        "a",
        "apple",
        "print .apple_names, .apple_types, .apple_namespaces and .apple_objc",
    );
    opts.optflag("n", "debug-names", "print .debug_names");

    let matches = match opts.parse(env::args().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            writeln!(&mut io::stderr(), "{:?}\n", e).ok();
            print_usage(&opts);
        }
    };
    if matches.free.is_empty() {
        print_usage(&opts);
    }

    let mut flags = Flags {
        apple: matches.opt_present("a"),
        debug_names: matches.opt_present("n"),
    };
    if !flags.apple && !flags.debug_names {
        flags.apple = true;
        flags.debug_names = true;
    }

    init_tracing();

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    for file_path in &matches.free {
        if matches.free.len() != 1 {
            writeln!(w, "{}", file_path).ok();
            writeln!(w).ok();
        }

        let Some(mmap) = open_file(file_path) else {
            continue;
        };
        let file = match object::File::parse(&*mmap) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("Failed to parse file '{}': {}", file_path, err);
                continue;
            }
        };

        if let Err(err) = dump_file(&mut w, &file, &flags) {
            eprintln!("Failed to dump '{}': {}", file_path, err);
        }
    }
    w.flush().ok();
}

fn dump_file<W: Write>(w: &mut W, file: &object::File, flags: &Flags) -> Result<()> {
    let arenas = Arenas::new();
    let sections = Sections::load(file, &arenas)?;
    let mut out = String::new();

    if flags.apple {
        for (id, section) in &sections.apple_tables {
            writeln!(w, "{}:", id.name())?;
            match AppleAccelTable::parse(section.clone(), sections.debug_str.clone()) {
                Ok(table) => {
                    out.clear();
                    dump_apple_table(&mut out, &table)?;
                    w.write_all(out.as_bytes())?;
                }
                Err(err) => writeln!(w, "error: {}", err)?,
            }
            writeln!(w)?;
        }
    }

    if flags.debug_names {
        if let Some(debug_names) = &sections.debug_names {
            writeln!(w, ".debug_names:")?;
            out.clear();
            dump_debug_names(&mut out, debug_names, &sections.debug_str)?;
            w.write_all(out.as_bytes())?;
        }
    }
    Ok(())
}
