#![allow(missing_docs)]

use alloc::vec::Vec;

use test_assembler::{Label, Section};

use crate::common::Format;
use crate::constants;

fn encode_unsigned(mut val: u64) -> Vec<u8> {
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

fn encode_signed(mut val: i64) -> Vec<u8> {
    let mut buf = Vec::new();
    loop {
        let byte = (val & 0x7f) as u8;
        val >>= 7;
        let done = (val == 0 && byte & 0x40 == 0) || (val == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return buf;
        }
        buf.push(byte | 0x80);
    }
}

pub trait AccelSectionMethods {
    fn sleb(self, val: i64) -> Self;
    fn uleb(self, val: u64) -> Self;
    fn initial_length(self, format: Format, length: &Label, start: &Label) -> Self;
    fn word(self, size: u8, val: u64) -> Self;
    fn apple_header(self, bucket_count: u32, hash_count: u32, header_data_length: u32) -> Self;
}

impl AccelSectionMethods for Section {
    fn sleb(self, val: i64) -> Self {
        self.append_bytes(&encode_signed(val))
    }

    fn uleb(self, val: u64) -> Self {
        self.append_bytes(&encode_unsigned(val))
    }

    fn initial_length(self, format: Format, length: &Label, start: &Label) -> Self {
        match format {
            Format::Dwarf32 => self.D32(length).mark(start),
            Format::Dwarf64 => self.D32(0xffff_ffff).D64(length).mark(start),
        }
    }

    fn word(self, size: u8, val: u64) -> Self {
        match size {
            4 => self.D32(val as u32),
            8 => self.D64(val),
            _ => panic!("unsupported word size"),
        }
    }

    fn apple_header(self, bucket_count: u32, hash_count: u32, header_data_length: u32) -> Self {
        self.D32(constants::APPLE_HASH_MAGIC)
            .D16(1)
            .D16(constants::DW_hash_function_djb.0)
            .D32(bucket_count)
            .D32(hash_count)
            .D32(header_data_length)
    }
}

#[test]
fn test_encode_leb128() {
    assert_eq!(encode_unsigned(0), [0]);
    assert_eq!(encode_unsigned(624_485), [0xe5, 0x8e, 0x26]);
    assert_eq!(encode_signed(-1), [0x7f]);
    assert_eq!(encode_signed(-123_456), [0xc0, 0xbb, 0x78]);
    assert_eq!(encode_signed(63), [0x3f]);
    assert_eq!(encode_signed(64), [0xc0, 0x00]);
}
