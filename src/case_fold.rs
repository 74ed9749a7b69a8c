//! The case folding hash used by `.debug_names` producers.

use crate::hash::{djb_hash_byte, DJB_HASH_SEED};

include!("case_fold_data.rs");

fn case_fold_data(c: char) -> char {
    match CASE_FOLD_DATA.binary_search_by(|&(key, _)| key.cmp(&c)) {
        Ok(i) => CASE_FOLD_DATA[i].1,
        Err(_) => c,
    }
}

/// Fold a character for `.debug_names` hashing.
///
/// This is the simple case folding of DWARF 5 Section 6.1.1.4.5: the common
/// and simple mappings of the Unicode `CaseFolding.txt`, plus the Turkish
/// dotted upper case 'İ' and dotless lower case 'ı', which fold to 'i'.
pub fn case_fold(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_lowercase()
    } else {
        case_fold_data(c)
    }
}

/// Compute the case folding DJB hash of `name`.
///
/// This is the hash stored in the hash array of a `.debug_names` name index.
/// Each character is folded with [`case_fold`] and the UTF-8 encoding of the
/// result is hashed with [`djb_hash_byte`]. Bytes that are not valid UTF-8
/// are hashed unchanged.
///
/// ```
/// use dwarf_accel::{case_folding_djb_hash, djb_hash};
///
/// assert_eq!(case_folding_djb_hash(b"Main"), djb_hash(b"main"));
/// ```
pub fn case_folding_djb_hash(name: &[u8]) -> u32 {
    let mut hash = DJB_HASH_SEED;
    for chunk in name.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c.is_ascii() {
                hash = djb_hash_byte(hash, c.to_ascii_lowercase() as u8);
            } else {
                let mut bytes = [0; 4];
                for &byte in case_fold_data(c).encode_utf8(&mut bytes).as_bytes() {
                    hash = djb_hash_byte(hash, byte);
                }
            }
        }
        for &byte in chunk.invalid() {
            hash = djb_hash_byte(hash, byte);
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_fold() {
        for (c, fold) in [
            ('A', 'a'),
            ('1', '1'),
            ('\u{3a3}', '\u{3c3}'), // Greek sigma
            ('\u{3c2}', '\u{3c3}'), // final sigma
            ('\u{212a}', 'k'),      // Kelvin sign
            ('\u{1e9e}', '\u{df}'), // capital sharp s, simple mapping only
            ('\u{130}', 'i'),
            ('\u{131}', 'i'),
        ] {
            assert_eq!(case_fold(c), fold, "{:?}", c);
            assert_eq!(case_fold(fold), fold, "{:?}", fold);
        }
    }

    #[test]
    fn test_case_fold_data_sorted() {
        assert!(CASE_FOLD_DATA.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(CASE_FOLD_DATA.iter().all(|&(c, _)| !c.is_ascii()));
    }

    #[test]
    fn test_case_folding_djb_hash() {
        assert_eq!(case_folding_djb_hash(b""), 5381);
        assert_eq!(case_folding_djb_hash(b"Main"), 0x7c9a_7f6a);
        assert_eq!(case_folding_djb_hash(b"__ARRAY_SIZE_TYPE__"), 0x0cef_4cfb);
        let s = "\u{130}\u{131}\u{c0}\u{e0}\u{100}\u{101}\u{139}\u{13a}\u{415}\u{435}\
                 \u{1ea6}\u{1ea7}\u{212a}k\u{2c1d}\u{2c4d}\u{ff2d}\u{ff4d}\
                 \u{10c92}\u{10cd2}";
        assert_eq!(case_folding_djb_hash(s.as_bytes()), 1_145_571_043);
        // Invalid UTF-8 is hashed as is.
        assert_eq!(case_folding_djb_hash(b"\xff"), djb_hash_byte(5381, 0xff));
    }
}
