#![no_main]

use dwarf_accel::{AppleAccelTable, LittleEndian};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The first half is the table and the second half is `.debug_str`.
    let (section, strings) = data.split_at(data.len() / 2);
    let Ok(table) = AppleAccelTable::new(section, strings, LittleEndian) else {
        return;
    };

    let mut output = String::new();
    let _ = dwarf_accel::dump::dump_apple_table(&mut output, &table);

    for i in 0..table.bucket_count() {
        let Ok(Some(mut slots)) = table.find_by_bucket(i) else {
            continue;
        };
        while let Ok(Some(slot)) = slots.next() {
            let Ok(mut names) = table.names_at(slot.data_offset) else {
                continue;
            };
            while let Ok(Some(name)) = names.next() {
                if let Ok(string) = name.name(table.debug_str()) {
                    let _ = table.lookup(string.slice()).map(Iterator::count);
                }
                let _ = name.entries(&table).count();
            }
        }
    }
});
