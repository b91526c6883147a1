use core::mem::size_of;

use heapless::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    order::{from_host, from_host_u32, to_host, to_host_u32, Endianness},
    MAX_PAYLOAD_LEN,
};

/// Raw bytes carried by a frame. The capacity is the classic CAN limit of 8
/// data bytes.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Selects how payload bytes are interpreted. The integer value of the enum
/// is the tag peers use when the contract is exchanged numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = CodecError, constructor = CodecError::InvalidKind))]
#[repr(u8)]
pub enum NumericKind {
    /// Zero extended integer of 1 to 8 bytes
    Unsigned = 0,
    /// Two's complement integer of 1 to 8 bytes
    Signed = 1,
    /// IEEE-754 single (4 bytes) or double (8 bytes) precision
    Float = 2,
}

impl NumericKind {
    /// Whether a payload of `len` bytes can hold a value of this kind
    pub const fn accepts_length(self, len: usize) -> bool {
        match self {
            Self::Unsigned | Self::Signed => len >= 1 && len <= MAX_PAYLOAD_LEN,
            Self::Float => len == 4 || len == 8,
        }
    }

    pub(crate) fn check_length(self, len: usize) -> Result<(), CodecError> {
        if self.accepts_length(len) {
            Ok(())
        } else {
            Err(CodecError::InvalidLength(self, len))
        }
    }
}

/// A decoded (or to be encoded) numeric value. Floats are always held in
/// double precision, whatever their width on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl HostValue {
    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Unsigned(_) => NumericKind::Unsigned,
            Self::Signed(_) => NumericKind::Signed,
            Self::Float(_) => NumericKind::Float,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Unsigned(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Signed(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<u64> for HostValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        Self::Signed(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    #[error("A payload of ({1:?}) bytes cannot hold a value of kind ({0:?})")]
    InvalidLength(NumericKind, usize),
    #[error("Value does not fit in ({0:?}) bytes")]
    Overflow(usize),
    #[error("Tried to decode endianness but it was invalid ({0:?})")]
    InvalidEndianness(u8),
    #[error("Tried to decode numeric kind but it was invalid ({0:?})")]
    InvalidKind(u8),
}

/* Decoding */

/// Reconstructs a value from payload bytes laid out in `order`.
///
/// Integers accept 1 to 8 bytes and are zero extended ([`NumericKind::Unsigned`])
/// or sign extended ([`NumericKind::Signed`]) to 64 bits. Floats accept exactly
/// 4 or 8 bytes; single precision values are widened to `f64`.
pub fn decode(payload: &[u8], kind: NumericKind, order: Endianness) -> Result<HostValue, CodecError> {
    kind.check_length(payload.len())?;

    Ok(match kind {
        NumericKind::Unsigned => HostValue::Unsigned(decode_integer(payload, false, order)),
        NumericKind::Signed => HostValue::Signed(decode_integer(payload, true, order) as i64),
        NumericKind::Float => HostValue::Float(match *payload {
            [a, b, c, d] => f32::from_bits(to_host_u32([a, b, c, d], order)).into(),
            [a, b, c, d, e, f, g, h] => f64::from_bits(to_host([a, b, c, d, e, f, g, h], order)),
            _ => return Err(CodecError::InvalidLength(kind, payload.len())),
        }),
    })
}

/// `payload` must hold 1 to 8 bytes
fn decode_integer(payload: &[u8], signed: bool, order: Endianness) -> u64 {
    let len = payload.len();

    let most_significant = match order {
        Endianness::Big => payload[0],
        Endianness::Little => payload[len - 1],
    };

    let fill = if signed && most_significant & 0x80 != 0 {
        0xFF
    } else {
        0x00
    };

    // High order bytes keep the fill, the payload lands in the low order end
    let mut buffer = [fill; 8];
    match order {
        Endianness::Big => buffer[8 - len..].copy_from_slice(payload),
        Endianness::Little => buffer[..len].copy_from_slice(payload),
    }

    to_host(buffer, order)
}

/// Decodes `payload` as the Rust type `T`, failing with
/// [`CodecError::Overflow`] if the wire value does not fit.
pub fn decode_as<T: Numeric>(payload: &[u8], order: Endianness) -> Result<T, CodecError> {
    let value = decode(payload, T::KIND, order)?;

    T::from_value(value).ok_or(CodecError::Overflow(size_of::<T>()))
}

/* Encoding */

/// Produces the shortest payload that decodes back to `value`.
///
/// Integers are trimmed of redundant high order bytes (keeping a sign guard
/// byte where needed), so the result is 1 to 8 bytes long. Floats are never
/// narrowed and always take 8 bytes.
pub fn encode(value: HostValue, order: Endianness) -> Payload {
    match value {
        HostValue::Unsigned(value) => {
            encode_integer(value, significant_bytes(value, false), order)
        }
        HostValue::Signed(value) => {
            let bits = value as u64;
            encode_integer(bits, significant_bytes(bits, true), order)
        }
        HostValue::Float(value) => from_host(value.to_bits(), order).into_iter().collect(),
    }
}

/// Encodes `value` into exactly `width` bytes.
///
/// Integers take 1 to 8 bytes and must be representable in `width` bytes.
/// Floats take 4 bytes (narrowed to single precision) or 8 bytes.
pub fn encode_fixed(value: HostValue, width: usize, order: Endianness) -> Result<Payload, CodecError> {
    value.kind().check_length(width)?;

    let (bits, signed) = match value {
        HostValue::Unsigned(value) => (value, false),
        HostValue::Signed(value) => (value as u64, true),
        HostValue::Float(value) if width == 4 => {
            return Ok(from_host_u32((value as f32).to_bits(), order)
                .into_iter()
                .collect())
        }
        HostValue::Float(value) => return Ok(from_host(value.to_bits(), order).into_iter().collect()),
    };

    if significant_bytes(bits, signed) > width {
        return Err(CodecError::Overflow(width));
    }

    Ok(encode_integer(bits, width, order))
}

pub fn encode_as<T: Numeric>(value: T, order: Endianness) -> Payload {
    encode(value.into_value(), order)
}

/// Keeps the `width` least significant bytes of `bits` in wire order
fn encode_integer(bits: u64, width: usize, order: Endianness) -> Payload {
    let wire = from_host(bits, order);

    let kept = match order {
        Endianness::Big => &wire[8 - width..],
        Endianness::Little => &wire[..width],
    };

    kept.iter().copied().collect()
}

/// Number of low order bytes needed to represent `bits` without changing its
/// value. A signed value keeps one extra byte whenever dropping it would leave
/// a most significant byte whose top bit disagrees with the sign.
fn significant_bytes(bits: u64, signed: bool) -> usize {
    let byte_at = |index: usize| (bits >> (index * 8)) as u8;

    let mut len = 8;

    while len > 1 {
        let top = byte_at(len - 1);
        let next_sign = byte_at(len - 2) & 0x80 != 0;

        let redundant = match (signed, top) {
            (false, 0x00) => true,
            (true, 0x00) => !next_sign,
            (true, 0xFF) => next_sign,
            _ => false,
        };

        if !redundant {
            break;
        }

        len -= 1;
    }

    len
}

/* Typed access */

/// Rust numeric types that map onto a [`NumericKind`]
pub trait Numeric: Copy {
    const KIND: NumericKind;

    fn into_value(self) -> HostValue;

    /// Returns `None` when `value` is of another kind or out of range for `Self`
    fn from_value(value: HostValue) -> Option<Self>;
}

macro_rules! impl_numeric {
    ($kind:ident, $variant:ident, $wide:ty: $($ty:ty),+) => {
        $(
            impl Numeric for $ty {
                const KIND: NumericKind = NumericKind::$kind;

                fn into_value(self) -> HostValue {
                    HostValue::$variant(<$wide>::from(self))
                }

                fn from_value(value: HostValue) -> Option<Self> {
                    match value {
                        HostValue::$variant(value) => <$ty>::try_from(value).ok(),
                        _ => None,
                    }
                }
            }
        )+
    };
}

impl_numeric!(Unsigned, Unsigned, u64: u8, u16, u32, u64);
impl_numeric!(Signed, Signed, i64: i8, i16, i32, i64);

impl Numeric for f32 {
    const KIND: NumericKind = NumericKind::Float;

    fn into_value(self) -> HostValue {
        HostValue::Float(self.into())
    }

    /// Finite doubles beyond the `f32` range return `None` instead of
    /// saturating to infinity
    fn from_value(value: HostValue) -> Option<Self> {
        let value = value.as_f64()?;
        let narrowed = value as f32;

        if value.is_finite() && !narrowed.is_finite() {
            return None;
        }

        Some(narrowed)
    }
}

impl Numeric for f64 {
    const KIND: NumericKind = NumericKind::Float;

    fn into_value(self) -> HostValue {
        HostValue::Float(self)
    }

    fn from_value(value: HostValue) -> Option<Self> {
        value.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: [Endianness; 2] = [Endianness::Big, Endianness::Little];

    fn unsigned_samples() -> impl Iterator<Item = u64> {
        (0..64)
            .flat_map(|shift| {
                let bit = 1u64 << shift;
                [bit - 1, bit, bit + 1, !bit]
            })
            .chain([0, u64::MAX, 0x0102_0304_0506_0708, 0xFF, 0x100, 0x1234])
    }

    fn signed_samples() -> impl Iterator<Item = i64> {
        unsigned_samples()
            .flat_map(|value| [value as i64, (value as i64).wrapping_neg()])
            .chain([0, -1, 127, -128, 128, -129, i64::MIN, i64::MAX])
    }

    #[test]
    fn unsigned_round_trip() {
        for order in ORDERS {
            for value in unsigned_samples() {
                let payload = encode(HostValue::Unsigned(value), order);

                assert_eq!(
                    decode(&payload, NumericKind::Unsigned, order),
                    Ok(HostValue::Unsigned(value)),
                    "{value:#x} via {payload:02x?}"
                );
            }
        }
    }

    #[test]
    fn signed_round_trip() {
        for order in ORDERS {
            for value in signed_samples() {
                let payload = encode(HostValue::Signed(value), order);

                assert_eq!(
                    decode(&payload, NumericKind::Signed, order),
                    Ok(HostValue::Signed(value)),
                    "{value} via {payload:02x?}"
                );
            }
        }
    }

    #[test]
    fn minimal_encodings() {
        assert_eq!(&encode(HostValue::Unsigned(0), Endianness::Big)[..], &[0x00]);
        assert_eq!(&encode(HostValue::Unsigned(0), Endianness::Little)[..], &[0x00]);
        assert_eq!(
            &encode(HostValue::Unsigned(0x1234), Endianness::Big)[..],
            &[0x12, 0x34]
        );
        assert_eq!(
            &encode(HostValue::Unsigned(0x1234), Endianness::Little)[..],
            &[0x34, 0x12]
        );
        assert_eq!(&encode(HostValue::Unsigned(0xFF), Endianness::Big)[..], &[0xFF]);
        assert_eq!(encode(HostValue::Unsigned(u64::MAX), Endianness::Big).len(), 8);

        assert_eq!(&encode(HostValue::Signed(-1), Endianness::Big)[..], &[0xFF]);
        assert_eq!(&encode(HostValue::Signed(0), Endianness::Big)[..], &[0x00]);
        assert_eq!(&encode(HostValue::Signed(127), Endianness::Big)[..], &[0x7F]);
        assert_eq!(&encode(HostValue::Signed(-128), Endianness::Big)[..], &[0x80]);
        assert_eq!(encode(HostValue::Signed(i64::MIN), Endianness::Big).len(), 8);
        assert_eq!(encode(HostValue::Signed(i64::MAX), Endianness::Little).len(), 8);
    }

    #[test]
    fn sign_guard_bytes() {
        assert_eq!(
            &encode(HostValue::Signed(128), Endianness::Big)[..],
            &[0x00, 0x80]
        );
        assert_eq!(
            &encode(HostValue::Signed(128), Endianness::Little)[..],
            &[0x80, 0x00]
        );
        assert_eq!(
            &encode(HostValue::Signed(-129), Endianness::Big)[..],
            &[0xFF, 0x7F]
        );
        assert_eq!(
            &encode(HostValue::Signed(0x8000), Endianness::Big)[..],
            &[0x00, 0x80, 0x00]
        );
    }

    #[test]
    fn endianness_symmetry() {
        let value = HostValue::Unsigned(0x0102_0304_0506_0708);

        let little = encode(value, Endianness::Little);
        let mut big = encode(value, Endianness::Big);

        assert_eq!(decode(&little, NumericKind::Unsigned, Endianness::Little), Ok(value));
        assert_eq!(&big[..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        big.reverse();
        assert_eq!(little, big);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(
            decode(&[0xFF], NumericKind::Signed, Endianness::Big),
            Ok(HostValue::Signed(-1))
        );
        assert_eq!(
            decode(&[0xFF], NumericKind::Unsigned, Endianness::Big),
            Ok(HostValue::Unsigned(0xFF))
        );
        assert_eq!(
            decode(&[0x2C, 0x81], NumericKind::Signed, Endianness::Little),
            Ok(HostValue::Signed(0x812C - 0x1_0000))
        );
        assert_eq!(
            decode(&[0x81, 0x2C], NumericKind::Signed, Endianness::Little),
            Ok(HostValue::Signed(0x2C81))
        );
        assert_eq!(
            decode(&[0x80, 0, 0], NumericKind::Signed, Endianness::Big),
            Ok(HostValue::Signed(-0x80_0000))
        );
    }

    #[test]
    fn float_exactness() {
        for order in ORDERS {
            for value in [3.14159, -0.0, 1.0e300, -2.5e-300, f64::MAX, f64::MIN_POSITIVE] {
                let payload = encode(HostValue::Float(value), order);
                assert_eq!(payload.len(), 8);

                let decoded = decode(&payload, NumericKind::Float, order)
                    .unwrap()
                    .as_f64()
                    .unwrap();

                assert_eq!(decoded.to_bits(), value.to_bits());
            }
        }

        assert_eq!(
            &encode(HostValue::Float(1.0), Endianness::Big)[..],
            &[0x3F, 0xF0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn single_precision_widens() {
        assert_eq!(
            decode(&[0x3F, 0x80, 0, 0], NumericKind::Float, Endianness::Big),
            Ok(HostValue::Float(1.0))
        );
        assert_eq!(
            decode(&[0, 0, 0xC0, 0xBF], NumericKind::Float, Endianness::Little),
            Ok(HostValue::Float(-1.5))
        );

        let pi = 3.14159f32;
        assert_eq!(
            decode(&pi.to_be_bytes(), NumericKind::Float, Endianness::Big),
            Ok(HostValue::Float(pi as f64))
        );
    }

    #[test]
    fn length_rejection() {
        assert_eq!(
            decode(&[0; 9], NumericKind::Unsigned, Endianness::Big),
            Err(CodecError::InvalidLength(NumericKind::Unsigned, 9))
        );
        assert_eq!(
            decode(&[], NumericKind::Signed, Endianness::Big),
            Err(CodecError::InvalidLength(NumericKind::Signed, 0))
        );
        assert_eq!(
            decode(&[0; 3], NumericKind::Float, Endianness::Big),
            Err(CodecError::InvalidLength(NumericKind::Float, 3))
        );
        assert_eq!(
            decode(&[0; 2], NumericKind::Float, Endianness::Little),
            Err(CodecError::InvalidLength(NumericKind::Float, 2))
        );
    }

    #[test]
    fn fixed_width_encoding() {
        assert_eq!(
            encode_fixed(HostValue::Unsigned(300), 2, Endianness::Big).as_deref(),
            Ok(&[0x01, 0x2C][..])
        );
        assert_eq!(
            encode_fixed(HostValue::Unsigned(300), 4, Endianness::Little).as_deref(),
            Ok(&[0x2C, 0x01, 0, 0][..])
        );
        assert_eq!(
            encode_fixed(HostValue::Signed(-2), 4, Endianness::Little).as_deref(),
            Ok(&[0xFE, 0xFF, 0xFF, 0xFF][..])
        );
        assert_eq!(
            encode_fixed(HostValue::Float(1.5), 4, Endianness::Big).as_deref(),
            Ok(&[0x3F, 0xC0, 0, 0][..])
        );
        assert_eq!(
            encode_fixed(HostValue::Float(1.5), 8, Endianness::Big).as_deref(),
            Ok(&[0x3F, 0xF8, 0, 0, 0, 0, 0, 0][..])
        );

        assert_eq!(
            encode_fixed(HostValue::Unsigned(300), 1, Endianness::Big),
            Err(CodecError::Overflow(1))
        );
        assert_eq!(
            encode_fixed(HostValue::Signed(128), 1, Endianness::Big),
            Err(CodecError::Overflow(1))
        );
        assert_eq!(
            encode_fixed(HostValue::Unsigned(1), 0, Endianness::Big),
            Err(CodecError::InvalidLength(NumericKind::Unsigned, 0))
        );
        assert_eq!(
            encode_fixed(HostValue::Float(1.0), 3, Endianness::Big),
            Err(CodecError::InvalidLength(NumericKind::Float, 3))
        );
    }

    #[test]
    fn typed_access() {
        assert_eq!(decode_as::<i16>(&[0xFF, 0x38], Endianness::Big), Ok(-200));
        assert_eq!(decode_as::<u32>(&[0x2C, 0x01], Endianness::Little), Ok(300));
        assert_eq!(
            decode_as::<u8>(&[0x01, 0x00], Endianness::Big),
            Err(CodecError::Overflow(1))
        );
        assert_eq!(
            decode_as::<f32>(&[0x3F, 0x80, 0, 0], Endianness::Big),
            Ok(1.0)
        );
        assert_eq!(
            decode_as::<f32>(
                &encode(HostValue::Float(1.0e300), Endianness::Big),
                Endianness::Big
            ),
            Err(CodecError::Overflow(4))
        );
        assert_eq!(
            decode_as::<f32>(
                &encode(HostValue::Float(f64::NEG_INFINITY), Endianness::Big),
                Endianness::Big
            ),
            Ok(f32::NEG_INFINITY)
        );

        assert_eq!(&encode_as(-1i8, Endianness::Big)[..], &[0xFF]);
        assert_eq!(&encode_as(300u16, Endianness::Big)[..], &[0x01, 0x2C]);
        assert_eq!(encode_as(0.5f32, Endianness::Little).len(), 8);
    }

    #[test]
    fn kind_tags() {
        assert_eq!(NumericKind::try_from(2), Ok(NumericKind::Float));
        assert_eq!(NumericKind::try_from(3), Err(CodecError::InvalidKind(3)));
        assert_eq!(u8::from(NumericKind::Signed), 1);
    }
}
