//! The underlying binary protocol of the ADIR01P

use std::fmt;

use scroll::{Pread, Pwrite, BE};

use crate::constants::{
    opcodes, ENTRY_SIZE, MAX_PAYLOAD_SIZE, PACKET_SIZE, PADDING, WAVEFORM_HEADER_SIZE,
    WINDOW_ENTRIES,
};
use crate::error::{Error, ProtocolError, Result};

/// Byte 0 of every frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Version = opcodes::VERSION,
    ReceiveStart = opcodes::RECEIVE_START,
    ReceiveStop = opcodes::RECEIVE_STOP,
    ReceiveResult = opcodes::RECEIVE_RESULT,
    ReceiveSample = opcodes::RECEIVE_SAMPLE,
    SetData = opcodes::SET_DATA,
    Send = opcodes::SEND,
}

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            opcodes::VERSION => Ok(Opcode::Version),
            opcodes::RECEIVE_START => Ok(Opcode::ReceiveStart),
            opcodes::RECEIVE_STOP => Ok(Opcode::ReceiveStop),
            opcodes::RECEIVE_RESULT => Ok(Opcode::ReceiveResult),
            opcodes::RECEIVE_SAMPLE => Ok(Opcode::ReceiveSample),
            opcodes::SET_DATA => Ok(Opcode::SetData),
            opcodes::SEND => Ok(Opcode::Send),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

/// A raw 64-byte frame, request or response.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; PACKET_SIZE]);

impl Frame {
    /// Build a request frame. Unused bytes are padded with `0xff`.
    pub fn encode(opcode: Opcode, payload: &[u8]) -> Result<Frame> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        let mut raw = [PADDING; PACKET_SIZE];
        raw[0] = opcode as u8;
        raw[1..=payload.len()].copy_from_slice(payload);
        Ok(Frame(raw))
    }

    pub fn from_raw(raw: [u8; PACKET_SIZE]) -> Self {
        Frame(raw)
    }

    pub fn opcode(&self) -> u8 {
        self.0[0]
    }

    /// Everything after the opcode, padding included.
    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[{}]", hex::encode(self.0))
    }
}

/// Check that `response` answers a request with opcode `request`.
pub fn validate(request: Opcode, response: Frame) -> std::result::Result<Frame, ProtocolError> {
    if response.opcode() != request as u8 {
        return Err(ProtocolError::OpcodeMismatch {
            expected: request as u8,
            actual: response.opcode(),
        });
    }
    Ok(response)
}

/// ADIR01P Command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Query the firmware version, a 5 character string.
    Version,
    /// Start receiving with the given carrier frequency.
    ///
    /// The trailing 5 bytes (auto-stop flag and on/off times) are sent as zero.
    ReceiveStart { frequency: u16 },
    ReceiveStop,
    /// Read the waveform captured between start and stop.
    ReceiveResult,
    /// Read what has been captured so far, while still receiving.
    ReceiveSample,
    /// Upload one window of the waveform to the device buffer.
    SetData {
        total: u16,
        position: u16,
        data: Vec<u8>,
    },
    /// Transmit the first `entries` entries of the device buffer.
    Send { frequency: u16, entries: u16 },
}

impl Command {
    pub fn receive_start(frequency: u16) -> Self {
        Command::ReceiveStart { frequency }
    }

    pub fn set_data(total: u16, position: u16, data: Vec<u8>) -> Self {
        Command::SetData {
            total,
            position,
            data,
        }
    }

    pub fn send(frequency: u16, entries: u16) -> Self {
        Command::Send { frequency, entries }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Version => Opcode::Version,
            Command::ReceiveStart { .. } => Opcode::ReceiveStart,
            Command::ReceiveStop => Opcode::ReceiveStop,
            Command::ReceiveResult => Opcode::ReceiveResult,
            Command::ReceiveSample => Opcode::ReceiveSample,
            Command::SetData { .. } => Opcode::SetData,
            Command::Send { .. } => Opcode::Send,
        }
    }

    pub fn encode(&self) -> Result<Frame> {
        let opcode = self.opcode();
        match self {
            Command::Version
            | Command::ReceiveStop
            | Command::ReceiveResult
            | Command::ReceiveSample => Frame::encode(opcode, &[]),
            Command::ReceiveStart { frequency } => {
                let mut buf = [0u8; 7];
                buf.pwrite_with(*frequency, 0, BE)?;
                Frame::encode(opcode, &buf)
            }
            Command::SetData {
                total,
                position,
                data,
            } => {
                let max = WINDOW_ENTRIES * ENTRY_SIZE;
                if data.len() > max {
                    return Err(Error::PayloadTooLarge {
                        len: data.len(),
                        max,
                    });
                }
                if data.len() % ENTRY_SIZE != 0 {
                    return Err(Error::malformed(format!(
                        "set data window of {} bytes is not made of whole entries",
                        data.len()
                    )));
                }
                // TOTAL, POSITION, CHUNK, ENTRIES
                let mut buf = vec![0u8; 2 + 2 + 1 + data.len()];
                buf.pwrite_with(*total, 0, BE)?;
                buf.pwrite_with(*position, 2, BE)?;
                buf[4] = (data.len() / ENTRY_SIZE) as u8;
                buf[5..].copy_from_slice(data);
                Frame::encode(opcode, &buf)
            }
            Command::Send { frequency, entries } => {
                let mut buf = [0u8; 4];
                buf.pwrite_with(*frequency, 0, BE)?;
                buf.pwrite_with(*entries, 2, BE)?;
                Frame::encode(opcode, &buf)
            }
        }
    }
}

/// Transfer progress header of waveform fetch responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Progress {
    /// Entries the device holds in total.
    pub total: u16,
    /// Entries already transferred before this frame.
    pub position: u16,
    /// Entries carried by this frame.
    pub chunk_size: u8,
}

impl Progress {
    pub fn end(&self) -> usize {
        usize::from(self.position) + usize::from(self.chunk_size)
    }

    /// Whether the device still holds entries past this frame.
    pub fn has_more(&self) -> bool {
        self.total > 0 && self.chunk_size > 0 && usize::from(self.total) > self.end()
    }
}

/// Response to a Command, decoded by the opcode of the request.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Response {
    Version(String),
    Ack(Opcode),
    Waveform { progress: Progress, data: Vec<u8> },
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Version(version) => write!(f, "VERSION({})", version),
            Response::Ack(opcode) => write!(f, "ACK({:?})", opcode),
            Response::Waveform { progress, data } => write!(
                f,
                "WAVEFORM({}+{}/{})[{}]",
                progress.position,
                progress.chunk_size,
                progress.total,
                hex::encode(data)
            ),
        }
    }
}

impl Response {
    /// Decode a response frame that already passed [`validate`].
    pub fn parse(opcode: Opcode, frame: &Frame) -> Result<Self> {
        match opcode {
            Opcode::Version => {
                let version = frame.payload()[..5]
                    .iter()
                    .take_while(|&&c| c != 0x00 && c != PADDING)
                    .map(|&c| c as char)
                    .collect();
                Ok(Response::Version(version))
            }
            Opcode::ReceiveStart | Opcode::ReceiveStop | Opcode::SetData | Opcode::Send => {
                Ok(Response::Ack(opcode))
            }
            Opcode::ReceiveResult | Opcode::ReceiveSample => {
                let raw = frame.as_bytes();
                let progress = Progress {
                    total: raw.pread_with::<u16>(1, BE)?,
                    position: raw.pread_with::<u16>(3, BE)?,
                    chunk_size: raw[5],
                };
                if usize::from(progress.chunk_size) > WINDOW_ENTRIES {
                    return Err(Error::malformed(format!(
                        "chunk of {} entries exceeds the {} entry window",
                        progress.chunk_size, WINDOW_ENTRIES
                    )));
                }
                let len = usize::from(progress.chunk_size) * ENTRY_SIZE;
                let data = raw[WAVEFORM_HEADER_SIZE..WAVEFORM_HEADER_SIZE + len].to_vec();
                Ok(Response::Waveform { progress, data })
            }
        }
    }

    pub fn into_waveform(self, opcode: Opcode) -> Result<(Progress, Vec<u8>)> {
        match self {
            Response::Waveform { progress, data } => Ok((progress, data)),
            _ => Err(ProtocolError::UnexpectedResponse(opcode).into()),
        }
    }
}
