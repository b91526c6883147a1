use embedded_can::{ErrorKind, Id};
use heapless::{Deque, Vec};

/// Driver frame supporting RTR and FD sized payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverFrame {
    id: Id,
    remote: bool,
    data: Vec<u8, 64>,
}

impl embedded_can::Frame for DriverFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Some(Self {
            id: id.into(),
            remote: false,
            data: Vec::from_slice(data).ok()?,
        })
    }

    fn new_remote(id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        Some(Self {
            id: id.into(),
            remote: true,
            data: Vec::new(),
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// In-memory bus: transmitted frames are queued and handed back by
/// `receive`. Receiving from an empty queue fails instead of blocking.
#[derive(Debug, Default)]
pub struct Loopback {
    pub queue: Deque<DriverFrame, 16>,
    pub fail_transmit: Option<ErrorKind>,
}

impl Loopback {
    pub fn inject(&mut self, frame: DriverFrame) {
        self.queue.push_back(frame).unwrap();
    }
}

impl embedded_can::blocking::Can for Loopback {
    type Frame = DriverFrame;
    type Error = ErrorKind;

    fn transmit(&mut self, frame: &Self::Frame) -> Result<(), Self::Error> {
        if let Some(kind) = self.fail_transmit {
            return Err(kind);
        }

        self.queue.push_back(frame.clone()).map_err(|_| ErrorKind::Overrun)
    }

    fn receive(&mut self) -> Result<Self::Frame, Self::Error> {
        self.queue.pop_front().ok_or(ErrorKind::Other)
    }
}
