use embedded_can::Id;

use crate::{
    codec::{decode, encode_fixed, CodecError, HostValue, NumericKind, Payload},
    frame::{Frame, FrameError},
    order::Endianness,
    MAX_PAYLOAD_LEN,
};

/// The out-of-band contract for one value inside a frame payload: what kind
/// of number it is, its byte order, and which bytes of the payload hold it.
///
/// Both ends of the bus must use the same `Signal` for a given identifier,
/// nothing in the frame itself describes the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Signal {
    kind: NumericKind,
    order: Endianness,
    offset: usize,
    width: usize,
}

impl Signal {
    /// Creates a signal occupying `width` bytes starting at byte `offset`.
    /// The width must suit the kind (1..=8 for integers, 4 or 8 for floats)
    /// and the signal must end within the 8 byte payload.
    pub fn new(
        kind: NumericKind,
        order: Endianness,
        offset: usize,
        width: usize,
    ) -> Result<Self, SignalError> {
        kind.check_length(width)?;

        if offset
            .checked_add(width)
            .filter(|end| *end <= MAX_PAYLOAD_LEN)
            .is_none()
        {
            return Err(SignalError::OutOfBounds {
                offset,
                width,
                len: MAX_PAYLOAD_LEN,
            });
        }

        Ok(Self {
            kind,
            order,
            offset,
            width,
        })
    }

    /// A signal that starts at the first payload byte
    pub fn leading(kind: NumericKind, order: Endianness, width: usize) -> Result<Self, SignalError> {
        Self::new(kind, order, 0, width)
    }

    pub fn kind(&self) -> NumericKind {
        self.kind
    }

    pub fn order(&self) -> Endianness {
        self.order
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Cannot overflow, `new` guarantees the signal ends within the payload
    fn end(&self) -> usize {
        self.offset + self.width
    }

    pub fn decode(&self, frame: &Frame) -> Result<HostValue, SignalError> {
        self.decode_payload(frame.payload())
    }

    pub fn decode_payload(&self, payload: &[u8]) -> Result<HostValue, SignalError> {
        let bytes = payload
            .get(self.offset..self.end())
            .ok_or(SignalError::OutOfBounds {
                offset: self.offset,
                width: self.width,
                len: payload.len(),
            })?;

        Ok(decode(bytes, self.kind, self.order)?)
    }

    /// Writes `value` into its bytes of `payload`, zero filling the payload
    /// first if it is shorter than the end of the signal. Bytes belonging to
    /// other signals are left untouched.
    pub fn write(&self, payload: &mut Payload, value: HostValue) -> Result<(), SignalError> {
        if value.kind() != self.kind {
            return Err(SignalError::KindMismatch(self.kind, value.kind()));
        }

        let bytes = encode_fixed(value, self.width, self.order)?;

        if payload.len() < self.end() {
            payload
                .resize_default(self.end())
                .map_err(|_| FrameError::PayloadTooLong(self.end()))?;
        }

        payload[self.offset..self.end()].copy_from_slice(&bytes);

        Ok(())
    }

    /// Encodes `value` into a payload holding only this signal
    pub fn encode(&self, value: HostValue) -> Result<Payload, SignalError> {
        let mut payload = Payload::new();
        self.write(&mut payload, value)?;

        Ok(payload)
    }

    /// Encodes `value` and wraps it into a frame with the given identifier
    pub fn frame(&self, id: impl Into<Id>, value: HostValue) -> Result<Frame, SignalError> {
        let payload = self.encode(value)?;

        Ok(Frame::new(id, &payload)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalError {
    #[error("Signal of ({width:?}) bytes at offset ({offset:?}) does not fit a ({len:?}) byte payload")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },
    #[error("Signal expects a value of kind ({0:?}) but was given ({1:?})")]
    KindMismatch(NumericKind, NumericKind),
    #[error("Failed to convert signal value")]
    Codec(#[from] CodecError),
    #[error("Failed to assemble signal frame")]
    Frame(#[from] FrameError),
}
