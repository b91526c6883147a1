use embedded_can::{blocking::Can, Error as _, ErrorKind, Frame as _, Id};

use crate::{
    codec::{decode, encode, CodecError, HostValue, NumericKind},
    filter::AcceptanceFilter,
    frame::{Frame, FrameError, IdExt},
    order::Endianness,
    signal::{Signal, SignalError},
};

/// Number of filter rules a [`Channel`] holds unless told otherwise
pub const DEFAULT_FILTER_RULES: usize = 16;

/// Moves whole frames between the caller and a blocking CAN driver.
///
/// Frames whose identifier is rejected by the acceptance filter, and remote
/// frames, are dropped on receive. A channel is not synchronized, callers
/// sharing one across threads must serialize access themselves.
#[derive(Debug)]
pub struct Channel<C, const N: usize = DEFAULT_FILTER_RULES> {
    can: C,
    filter: AcceptanceFilter<N>,
}

impl<C: Can> Channel<C> {
    pub fn new(can: C) -> Self {
        Self::with_filter(can, AcceptanceFilter::new())
    }
}

impl<C: Can, const N: usize> Channel<C, N> {
    pub fn with_filter(can: C, filter: AcceptanceFilter<N>) -> Self {
        Self { can, filter }
    }

    pub fn filter(&self) -> &AcceptanceFilter<N> {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: AcceptanceFilter<N>) {
        debug!("installing {=usize} filter rules", filter.rules().len());
        self.filter = filter;
    }

    pub fn driver(&mut self) -> &mut C {
        &mut self.can
    }

    /// Closes the channel, handing the driver back
    pub fn into_inner(self) -> C {
        self.can
    }

    /// Transmits exactly one frame, blocking until the driver accepts it
    pub fn send(&mut self, frame: &Frame) -> Result<(), ChannelError> {
        let raw: C::Frame = frame
            .to_can()
            .ok_or(ChannelError::Unrepresentable(frame.id().raw()))?;

        self.can.transmit(&raw).map_err(transport)?;

        trace!(
            "sent frame {=u32:#x} with {=usize} bytes",
            frame.id().raw(),
            frame.dlc()
        );

        Ok(())
    }

    /// Blocks until a data frame passing the acceptance filter arrives
    pub fn receive(&mut self) -> Result<Frame, ChannelError> {
        loop {
            let raw = self.can.receive().map_err(transport)?;
            let id = raw.id();

            if !self.filter.accepts(id) {
                warn!("dropping frame {=u32:#x} outside acceptance filter", id.raw());
                continue;
            }

            match Frame::from_can(&raw) {
                Ok(frame) => {
                    trace!(
                        "received frame {=u32:#x} with {=usize} bytes",
                        id.raw(),
                        frame.dlc()
                    );
                    return Ok(frame);
                }
                Err(FrameError::RemoteFrame(raw_id)) => {
                    warn!("skipping remote frame {=u32:#x}", raw_id);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Encodes `value` in its shortest form and sends it under `id`
    pub fn send_value(
        &mut self,
        id: impl Into<Id>,
        value: HostValue,
        order: Endianness,
    ) -> Result<(), ChannelError> {
        let payload = encode(value, order);
        let frame = Frame::new(id, &payload)?;

        self.send(&frame)
    }

    /// Receives the next accepted frame and decodes its whole payload
    pub fn receive_value(
        &mut self,
        kind: NumericKind,
        order: Endianness,
    ) -> Result<(Id, HostValue), ChannelError> {
        let frame = self.receive()?;
        let value = decode(frame.payload(), kind, order)?;

        Ok((frame.id(), value))
    }

    pub fn send_signal(
        &mut self,
        id: impl Into<Id>,
        signal: &Signal,
        value: HostValue,
    ) -> Result<(), ChannelError> {
        let frame = signal.frame(id, value)?;

        self.send(&frame)
    }

    pub fn receive_signal(&mut self, signal: &Signal) -> Result<(Id, HostValue), ChannelError> {
        let frame = self.receive()?;
        let value = signal.decode(&frame)?;

        Ok((frame.id(), value))
    }
}

fn transport<E: embedded_can::Error>(err: E) -> ChannelError {
    warn!("CAN transport failure");
    ChannelError::Transport(err.kind())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    #[error("CAN transport failed ({0:?})")]
    Transport(#[cfg_attr(feature = "defmt", defmt(Debug2Format))] ErrorKind),
    #[error("Driver refused a frame with identifier ({0:#X})")]
    Unrepresentable(u32),
    #[error("Failed to convert frame payload")]
    Codec(#[from] CodecError),
    #[error("Failed to assemble frame")]
    Frame(#[from] FrameError),
    #[error("Failed to read or write signal")]
    Signal(#[from] SignalError),
}
