//! Read DWARF's "Little Endian Base 128" (LEB128) variable length integer
//! encoding.
//!
//! The implementation is a direct translation of the psuedocode in the DWARF 4
//! standard's appendix C.

#[doc(hidden)]
pub const CONTINUATION_BIT: u8 = 1 << 7;
#[doc(hidden)]
pub const SIGN_BIT: u8 = 1 << 6;

#[doc(hidden)]
#[inline]
pub fn low_bits_of_byte(byte: u8) -> u8 {
    byte & !CONTINUATION_BIT
}

/// A module for reading signed and unsigned integers that have been LEB128
/// encoded.
pub mod read {
    use super::{low_bits_of_byte, CONTINUATION_BIT, SIGN_BIT};
    use crate::read::{Error, Reader, Result};

    /// Read bytes until the LEB128 continuation bit is not set.
    pub fn skip<R: Reader>(r: &mut R) -> Result<()> {
        loop {
            let byte = r.read_u8()?;
            if byte & CONTINUATION_BIT == 0 {
                return Ok(());
            }
        }
    }

    /// Read an unsigned LEB128 number from the given `Reader` and
    /// return it or an error if reading failed.
    pub fn unsigned<R: Reader>(r: &mut R) -> Result<u64> {
        let mut result = 0;
        let mut shift = 0;

        loop {
            let byte = r.read_u8()?;
            if shift == 63 && byte != 0x00 && byte != 0x01 {
                return Err(Error::BadUnsignedLeb128);
            }

            let low_bits = u64::from(low_bits_of_byte(byte));
            result |= low_bits << shift;

            if byte & CONTINUATION_BIT == 0 {
                return Ok(result);
            }

            shift += 7;
        }
    }

    /// Read an LEB128 u16 from the given `Reader` and
    /// return it or an error if reading failed.
    pub fn u16<R: Reader>(r: &mut R) -> Result<u16> {
        let byte = r.read_u8()?;
        let mut result = u16::from(low_bits_of_byte(byte));
        if byte & CONTINUATION_BIT == 0 {
            return Ok(result);
        }

        let byte = r.read_u8()?;
        result |= u16::from(low_bits_of_byte(byte)) << 7;
        if byte & CONTINUATION_BIT == 0 {
            return Ok(result);
        }

        let byte = r.read_u8()?;
        if byte > 0x03 {
            return Err(Error::BadUnsignedLeb128);
        }
        result += u16::from(byte) << 14;
        Ok(result)
    }

    /// Read a signed LEB128 number from the given `Reader` and
    /// return it or an error if reading failed.
    pub fn signed<R: Reader>(r: &mut R) -> Result<i64> {
        let mut result = 0;
        let mut shift = 0;
        let size = 64;
        let mut byte;

        loop {
            byte = r.read_u8()?;
            if shift == 63 && byte != 0x00 && byte != 0x7f {
                return Err(Error::BadSignedLeb128);
            }

            let low_bits = i64::from(low_bits_of_byte(byte));
            result |= low_bits << shift;
            shift += 7;

            if byte & CONTINUATION_BIT == 0 {
                break;
            }
        }

        if shift < size && (SIGN_BIT & byte) == SIGN_BIT {
            // Sign extend the result.
            result |= !0 << shift;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::read;
    use crate::endianity::NativeEndian;
    use crate::read::{EndianSlice, Error};

    #[test]
    fn test_read_unsigned() {
        let buf = [0x02];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert_eq!(read::unsigned(&mut readable), Ok(2));

        let buf = [0x80 | 0x7f, 0x01];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert_eq!(read::unsigned(&mut readable), Ok(0xff));

        let buf = [0x80 | 0x39, 0x64];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert_eq!(read::unsigned(&mut readable), Ok(12857));
    }

    #[test]
    fn test_read_signed() {
        let buf = [0x7e];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert_eq!(read::signed(&mut readable), Ok(-2));

        let buf = [0x80 | 0x7f, 0x7e];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert_eq!(read::signed(&mut readable), Ok(-129));
    }

    #[test]
    fn test_read_unsigned_not_enough_data() {
        let buf = [0x80 | 0x01];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert!(matches!(
            read::unsigned(&mut readable),
            Err(Error::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_read_unsigned_overflow() {
        let buf = [
            0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x02,
        ];
        let mut readable = EndianSlice::new(&buf[..], NativeEndian);
        assert_eq!(read::unsigned(&mut readable), Err(Error::BadUnsignedLeb128));
    }

    #[test]
    fn test_read_u16() {
        for (buf, val) in [
            (&[2][..], 2),
            (&[0x7f][..], 0x7f),
            (&[0x80, 1][..], 0x80),
            (&[0xff, 0xff, 3][..], 0xffff),
        ] {
            let mut readable = EndianSlice::new(buf, NativeEndian);
            assert_eq!(read::u16(&mut readable), Ok(val));
        }

        let mut readable = EndianSlice::new(&[0xff, 0xff, 4], NativeEndian);
        assert_eq!(read::u16(&mut readable), Err(Error::BadUnsignedLeb128));
    }
}
