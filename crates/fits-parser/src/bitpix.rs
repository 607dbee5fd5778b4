//! Element encodings selected by BITPIX and big-endian element decoding.

use bytemuck::pod_collect_to_vec;

use crate::error::{Error, Result};

/// On-disk element type declared by the BITPIX keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    /// `8`: unsigned byte.
    U8,
    /// `16`: big-endian two's-complement.
    I16,
    /// `32`: big-endian two's-complement.
    I32,
    /// `64`: big-endian two's-complement.
    I64,
    /// `-32`: big-endian IEEE 754 single precision.
    F32,
    /// `-64`: big-endian IEEE 754 double precision.
    F64,
}

impl Bitpix {
    pub fn from_value(bitpix: i64) -> Result<Self> {
        match bitpix {
            8 => Ok(Bitpix::U8),
            16 => Ok(Bitpix::I16),
            32 => Ok(Bitpix::I32),
            64 => Ok(Bitpix::I64),
            -32 => Ok(Bitpix::F32),
            -64 => Ok(Bitpix::F64),
            other => Err(Error::InvalidBitpix(other)),
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Bitpix::U8 => 8,
            Bitpix::I16 => 16,
            Bitpix::I32 => 32,
            Bitpix::I64 => 64,
            Bitpix::F32 => -32,
            Bitpix::F64 => -64,
        }
    }

    /// `|BITPIX| / 8`.
    pub fn bytes_per_element(self) -> usize {
        (self.value().unsigned_abs() / 8) as usize
    }

    /// Decode one stored element from the first `bytes_per_element` bytes of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than one element.
    #[inline]
    pub fn decode(self, buf: &[u8]) -> f64 {
        match self {
            Bitpix::U8 => buf[0] as f64,
            Bitpix::I16 => i16::from_be_bytes([buf[0], buf[1]]) as f64,
            Bitpix::I32 => i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            Bitpix::I64 => i64::from_be_bytes(eight(buf)) as f64,
            Bitpix::F32 => f32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            Bitpix::F64 => f64::from_be_bytes(eight(buf)),
        }
    }

    /// Decode a whole byte run of stored elements. Trailing bytes that do not
    /// make up a full element are ignored.
    pub fn decode_all(self, raw: &[u8]) -> Vec<f64> {
        let usable = raw.len() - raw.len() % self.bytes_per_element();
        let raw = &raw[..usable];
        match self {
            Bitpix::U8 => raw.iter().map(|&b| b as f64).collect(),
            Bitpix::I16 => {
                let v: Vec<i16> = pod_collect_to_vec(raw);
                v.into_iter().map(|x| i16::from_be(x) as f64).collect()
            }
            Bitpix::I32 => {
                let v: Vec<i32> = pod_collect_to_vec(raw);
                v.into_iter().map(|x| i32::from_be(x) as f64).collect()
            }
            Bitpix::I64 => {
                let v: Vec<i64> = pod_collect_to_vec(raw);
                v.into_iter().map(|x| i64::from_be(x) as f64).collect()
            }
            Bitpix::F32 => {
                let v: Vec<u32> = pod_collect_to_vec(raw);
                v.into_iter()
                    .map(|x| f32::from_bits(u32::from_be(x)) as f64)
                    .collect()
            }
            Bitpix::F64 => {
                let v: Vec<u64> = pod_collect_to_vec(raw);
                v.into_iter()
                    .map(|x| f64::from_bits(u64::from_be(x)))
                    .collect()
            }
        }
    }
}

#[inline]
fn eight(buf: &[u8]) -> [u8; 8] {
    [
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [i64; 6] = [8, 16, 32, 64, -32, -64];

    #[test]
    fn from_value_accepts_standard_widths() {
        for bp in ALL {
            assert_eq!(Bitpix::from_value(bp).unwrap().value(), bp);
        }
    }

    #[test]
    fn from_value_rejects_others() {
        assert!(matches!(Bitpix::from_value(7), Err(Error::InvalidBitpix(7))));
        assert!(matches!(Bitpix::from_value(-16), Err(Error::InvalidBitpix(-16))));
    }

    #[test]
    fn bytes_per_element() {
        let widths: Vec<usize> = ALL
            .iter()
            .map(|&bp| Bitpix::from_value(bp).unwrap().bytes_per_element())
            .collect();
        assert_eq!(widths, [1, 2, 4, 8, 4, 8]);
    }

    #[test]
    fn decode_u8_is_unsigned() {
        assert_eq!(Bitpix::U8.decode(&[0xFF]), 255.0);
    }

    #[test]
    fn decode_i16_is_signed_big_endian() {
        assert_eq!(Bitpix::I16.decode(&[0xFF, 0xFE]), -2.0);
        assert_eq!(Bitpix::I16.decode(&[0x01, 0x00]), 256.0);
    }

    #[test]
    fn decode_i32_and_i64() {
        assert_eq!(Bitpix::I32.decode(&(-100_000i32).to_be_bytes()), -100_000.0);
        assert_eq!(Bitpix::I64.decode(&(1i64 << 40).to_be_bytes()), (1u64 << 40) as f64);
    }

    #[test]
    fn decode_floats() {
        assert_eq!(Bitpix::F32.decode(&1.5f32.to_be_bytes()), 1.5);
        assert_eq!(Bitpix::F64.decode(&(-2.25f64).to_be_bytes()), -2.25);
        assert!(Bitpix::F64.decode(&f64::NAN.to_be_bytes()).is_nan());
    }

    #[test]
    fn decode_all_matches_decode() {
        let mut raw = Vec::new();
        for v in [-3i16, 0, 7, i16::MAX] {
            raw.extend_from_slice(&v.to_be_bytes());
        }
        let all = Bitpix::I16.decode_all(&raw);
        let one_by_one: Vec<f64> = raw.chunks(2).map(|c| Bitpix::I16.decode(c)).collect();
        assert_eq!(all, one_by_one);
        assert_eq!(all, [-3.0, 0.0, 7.0, 32767.0]);
    }

    #[test]
    fn decode_all_ignores_partial_element() {
        let mut raw = 0.25f32.to_be_bytes().to_vec();
        raw.push(0xAA);
        assert_eq!(Bitpix::F32.decode_all(&raw), [0.25]);
    }
}
