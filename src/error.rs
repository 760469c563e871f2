//! Error types.

use std::io;

use thiserror::Error;

/// Bus level failures. The device state after one of these is unknown.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("no device found ({vendor_id:04x}:{product_id:04x} at index #{index})")]
    DeviceNotFound {
        vendor_id: u16,
        product_id: u16,
        index: usize,
    },

    /// The device must deliver exactly one full frame per transfer.
    #[error("short {direction} transfer: {len} bytes")]
    ShortTransfer { direction: &'static str, len: usize },
}

/// The device answered, but not in a way the protocol allows.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("response opcode {actual:#04x} does not match request {expected:#04x}")]
    OpcodeMismatch { expected: u8, actual: u8 },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("unexpected response to {0:?}")]
    UnexpectedResponse(crate::protocol::Opcode),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("payload too large: {len} bytes, at most {max} fit in a frame")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("waveform buffer is empty")]
    EmptyBuffer,

    #[error("carrier frequency {frequency} Hz out of range {min}..={max}")]
    InvalidFrequency { frequency: u32, min: u32, max: u32 },

    /// The capture deadline elapsed before the end marker arrived.
    #[error("receive timeout, {entries} entries captured")]
    CaptureTimeout { entries: usize },

    #[error("invalid waveform file: {0}")]
    Format(String),

    #[error("codec error: {0}")]
    Codec(#[from] scroll::Error),

    #[error("device profile error: {0}")]
    Profile(#[from] serde_yaml::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::Protocol(ProtocolError::MalformedFrame(reason.into()))
    }

    /// Failures after which the device may be mid-operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Protocol(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
