//! The DJB string hash, as used unmodified by the Apple tables.

/// The initial value of the DJB hash.
pub const DJB_HASH_SEED: u32 = 5381;

/// Update a DJB hash with a single byte.
#[inline]
pub fn djb_hash_byte(hash: u32, byte: u8) -> u32 {
    hash.wrapping_mul(33).wrapping_add(u32::from(byte))
}

/// Compute the DJB hash of `name`.
///
/// This is the hash function of Apple accelerator tables
/// (`DW_hash_function_djb`). No normalization is applied to the input bytes.
/// `.debug_names` hashes names with [`case_folding_djb_hash`](crate::case_folding_djb_hash)
/// instead.
///
/// ```
/// assert_eq!(dwarf_accel::djb_hash(b""), 5381);
/// assert_eq!(dwarf_accel::djb_hash(b"main"), 0x7c9a_7f6a);
/// ```
pub fn djb_hash(name: &[u8]) -> u32 {
    name.iter()
        .fold(DJB_HASH_SEED, |hash, &byte| djb_hash_byte(hash, byte))
}
