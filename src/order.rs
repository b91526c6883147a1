use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::CodecError;

/// The byte order a payload uses to lay out a numeric value on the wire.
///
/// The integer value of each variant is the tag used by peers that agree on
/// the payload contract numerically (`0` for big, `1` for little).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = CodecError, constructor = CodecError::InvalidEndianness))]
#[repr(u8)]
pub enum Endianness {
    Big = 0,
    Little = 1,
}

impl Endianness {
    /// Byte order of the machine this crate was compiled for
    pub const HOST: Self = if cfg!(target_endian = "big") {
        Self::Big
    } else {
        Self::Little
    };
}

/// Reinterprets 8 wire bytes in `order` as a host integer. This is purely a
/// byte permutation: the bytes are reversed when `order` is not the host
/// order and left untouched otherwise.
pub fn to_host(bytes: [u8; 8], order: Endianness) -> u64 {
    match order {
        Endianness::Big => u64::from_be_bytes(bytes),
        Endianness::Little => u64::from_le_bytes(bytes),
    }
}

/// Inverse of [`to_host`]
pub fn from_host(value: u64, order: Endianness) -> [u8; 8] {
    match order {
        Endianness::Big => value.to_be_bytes(),
        Endianness::Little => value.to_le_bytes(),
    }
}

/// 4-byte variant of [`to_host`], used for single precision floats
pub fn to_host_u32(bytes: [u8; 4], order: Endianness) -> u32 {
    match order {
        Endianness::Big => u32::from_be_bytes(bytes),
        Endianness::Little => u32::from_le_bytes(bytes),
    }
}

/// 4-byte variant of [`from_host`]
pub fn from_host_u32(value: u32, order: Endianness) -> [u8; 4] {
    match order {
        Endianness::Big => value.to_be_bytes(),
        Endianness::Little => value.to_le_bytes(),
    }
}
