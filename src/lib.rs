#![no_std]

//! Numeric values over classic CAN frames.
//!
//! A frame payload has no self-describing type: both ends agree out of band
//! on the kind of number, its byte width and its byte order. This crate
//! converts between host values and minimal payload bytes ([`encode`] /
//! [`decode`]), wraps payloads into [`Frame`]s, and moves frames over any
//! [`embedded_can::blocking::Can`] driver through a [`Channel`].
//!
//! ```
//! use canval::{decode, encode, make_frame, Endianness, HostValue, NumericKind};
//! use embedded_can::StandardId;
//!
//! let payload = encode(HostValue::Unsigned(300), Endianness::Big);
//! assert_eq!(&payload[..], &[0x01, 0x2C]);
//!
//! let frame = make_frame(StandardId::new(0x100).unwrap(), &payload).unwrap();
//! let value = decode(frame.payload(), NumericKind::Unsigned, Endianness::Big).unwrap();
//! assert_eq!(value, HostValue::Unsigned(300));
//! ```

// Must come first so the logging macros are visible to the other modules
mod fmt;

mod channel;
mod codec;
mod filter;
mod frame;
#[cfg(test)]
mod mocks;
mod order;
mod signal;

/// Maximum number of data bytes in a classic CAN frame
pub const MAX_PAYLOAD_LEN: usize = 8;

pub use channel::*;
pub use codec::*;
pub use filter::*;
pub use frame::*;
pub use order::*;
pub use signal::*;

pub use embedded_can::{ExtendedId, Id, StandardId};
