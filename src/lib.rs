//! A lazy, zero-copy reader for DWARF accelerator tables.
//!
//! Accelerator tables map names to debugging information entries, so that a
//! debugger can find the entries for a name without scanning `.debug_info`.
//! Two families of tables are supported:
//!
//! * **Apple tables:** `.apple_names`, `.apple_types`, `.apple_namespaces` and
//!   `.apple_objc`, as emitted for Mach-O targets. See [`AppleAccelTable`].
//!
//! * **DWARF 5 name indexes:** the `.debug_names` section, which holds one or
//!   more name index units. See [`DebugNames`] and [`NameIndex`].
//!
//! The reader is:
//!
//! * **Zero-copy:** everything is just a reference to the original input
//!   buffer. No copies of the input data ever get made.
//!
//! * **Lazy:** parsing a table only validates its layout. Entries are decoded
//!   when a lookup or iteration asks for them.
//!
//! * **Cross-platform:** this crate isn't coupled to any platform or object
//!   file format. Use your own ELF parser on Linux or a Mach-O parser on macOS.
//!
//!   * Unsure which object file parser to use? Try the cross-platform
//!     [`object`](https://github.com/gimli-rs/object) crate.
//!
//! ## Example Usage
//!
//! Look up a name in every name index of a `.debug_names` section:
//!
//! ```rust,no_run
//! # fn example() -> Result<(), dwarf_accel::Error> {
//! # let debug_names_buf = [];
//! # let debug_str_buf = [];
//! use dwarf_accel::{DebugNames, DebugStr, LittleEndian};
//!
//! let debug_names = DebugNames::new(&debug_names_buf, LittleEndian);
//! let debug_str = DebugStr::new(&debug_str_buf, LittleEndian);
//!
//! for name_index in debug_names.name_indexes()? {
//!     if let Some(name) = name_index.find_name(b"main", &debug_str)? {
//!         let mut entries = name_index.name_entries(name)?;
//!         while let Some(entry) = entries.next()? {
//!             println!("{}: {:?}", entry.tag, entry.die_offset()?);
//!         }
//!     }
//! }
//! # unreachable!()
//! # }
//! ```
//!
//! ## Using with `FallibleIterator`
//!
//! The lazy iterators implement both `Iterator<Item = Result<T>>` and, with
//! the `fallible-iterator` feature, the
//! [`fallible-iterator`](https://crates.io/crates/fallible-iterator) crate's
//! `FallibleIterator` trait.
//!
//! ## Cargo Features
//!
//! Cargo features that can be enabled with `dwarf-accel`:
//!
//! * `std`: Enabled by default. Use the `std` library. Disabling this feature
//!   allows using `dwarf-accel` in embedded environments that do not have
//!   access to `std`. Note that even when `std` is disabled, `dwarf-accel`
//!   still requires an implementation of the `alloc` crate.
//!
//! * `fallible-iterator`: Enabled by default. Implement the
//!   `FallibleIterator` trait for the lazy iterators.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![no_std]

#[allow(unused_imports)]
#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

extern crate alloc;

mod case_fold;
pub use crate::case_fold::*;

mod common;
pub use crate::common::*;

mod constants;
pub use crate::constants::*;

mod endianity;
pub use crate::endianity::*;

mod hash;
pub use crate::hash::*;

pub mod leb128;

pub mod read;
pub use crate::read::*;

pub mod dump;

#[cfg(test)]
mod test_util;
