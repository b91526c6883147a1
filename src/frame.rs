use embedded_can::{ExtendedId, Id, StandardId};

use crate::MAX_PAYLOAD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdKind {
    /// 11-bit identifier
    #[default]
    Standard,
    /// 29-bit identifier
    Extended,
}

pub trait IdExt {
    fn kind(self) -> IdKind;

    /// Numeric value of the identifier, without any kind flag
    fn raw(self) -> u32;
}

impl IdExt for Id {
    fn kind(self) -> IdKind {
        match self {
            Id::Standard(_) => IdKind::Standard,
            Id::Extended(_) => IdKind::Extended,
        }
    }

    fn raw(self) -> u32 {
        match self {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }
}

/// Builds an identifier from its numeric value, choosing a standard ID when
/// it fits in 11 bits and an extended ID when it fits in 29 bits. Anything
/// wider returns `None`.
pub fn identifier(raw: u32) -> Option<Id> {
    match u16::try_from(raw).ok().and_then(StandardId::new) {
        Some(id) => Some(Id::Standard(id)),
        None => ExtendedId::new(raw).map(Id::Extended),
    }
}

/// A classic CAN data frame: an identifier and up to 8 bytes of payload.
///
/// Frames carry no description of their payload. How the bytes are read is
/// agreed between sender and receiver ahead of time, see
/// [`Signal`](crate::Signal).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: Id,
    dlc: usize,
    data: [u8; MAX_PAYLOAD_LEN],
}

impl Frame {
    /// Creates a new data frame. `payload` must have a length in the range
    /// 0..=8; an empty payload is a valid frame carrying no data.
    pub fn new(id: impl Into<Id>, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }

        let mut data = [0u8; MAX_PAYLOAD_LEN];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            id: id.into(),
            dlc: payload.len(),
            data,
        })
    }

    /// Copies a frame produced by a CAN driver. Remote frames carry no
    /// payload and are rejected, as are frames longer than 8 bytes.
    pub fn from_can<F: embedded_can::Frame>(frame: &F) -> Result<Self, FrameError> {
        if frame.is_remote_frame() {
            return Err(FrameError::RemoteFrame(frame.id().raw()));
        }

        Self::new(frame.id(), frame.data())
    }

    /// Converts into a driver's frame type. Returns `None` if the driver
    /// refuses the frame.
    pub fn to_can<F: embedded_can::Frame>(&self) -> Option<F> {
        F::new(self.id, self.payload())
    }

    /// Gets the message ID of the frame
    pub fn id(&self) -> Id {
        self.id
    }

    /// Gets the DLC (Data Length Code) of the frame
    pub fn dlc(&self) -> usize {
        self.dlc
    }

    /// Slice over the payload (length matches the DLC)
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.dlc]
    }
}

pub fn make_frame(id: impl Into<Id>, payload: &[u8]) -> Result<Frame, FrameError> {
    Frame::new(id, payload)
}

pub fn payload_of(frame: &Frame) -> (&[u8], usize) {
    (frame.payload(), frame.dlc())
}

impl embedded_can::Frame for Frame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Frame::new(id, data).ok()
    }

    /// Remote frames are not representable
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.id.kind() == IdKind::Extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    #[error("Tried to build a frame with ({0:?}) bytes of payload (max 8)")]
    PayloadTooLong(usize),
    #[error("Received a remote frame ({0:#X}) which carries no payload")]
    RemoteFrame(u32),
}
