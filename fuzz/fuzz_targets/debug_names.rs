#![no_main]

use dwarf_accel::{DebugNames, DebugStr, LittleEndian};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The first half is `.debug_names` and the second half is `.debug_str`.
    let (section, strings) = data.split_at(data.len() / 2);
    let debug_names = DebugNames::new(section, LittleEndian);
    let debug_str = DebugStr::new(strings, LittleEndian);

    let mut output = String::new();
    let _ = dwarf_accel::dump::dump_debug_names(&mut output, &debug_names, &debug_str);

    let mut headers = debug_names.headers();
    while let Ok(Some(header)) = headers.next() {
        let Ok(name_index) = header.index() else {
            continue;
        };
        for i in 0..name_index.bucket_count() {
            let Ok(Some(mut bucket)) = name_index.find_by_bucket(i) else {
                continue;
            };
            while let Ok(Some((index, _hash))) = bucket.next() {
                if let Ok(name) = name_index.name_string(index, &debug_str) {
                    let _ = name_index.find_name(name.slice(), &debug_str);
                }
                let Ok(mut entries) = name_index.name_entries(index) else {
                    continue;
                };
                while let Ok(Some(entry)) = entries.next() {
                    let _ = entry.compile_unit(&name_index);
                    let _ = entry.type_unit(&name_index);
                    let _ = entry.parent();
                }
            }
        }
    }
});
