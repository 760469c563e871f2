//! Abstract Device transport interface.
use crate::constants::PACKET_SIZE;
use crate::error::{Result, TransportError};
use crate::protocol::{self, Command, Frame, Response};

pub use self::usb::UsbTransport;

mod usb;

/// Abstraction of the transport layer.
/// One 64-byte frame out, one 64-byte frame back, blocking.
pub trait Transport {
    fn send_raw(&mut self, raw: &[u8; PACKET_SIZE]) -> std::result::Result<(), TransportError>;
    fn recv_raw(&mut self) -> std::result::Result<[u8; PACKET_SIZE], TransportError>;

    fn transfer(&mut self, cmd: &Command) -> Result<Response> {
        let req = cmd.encode()?;
        log::debug!("=> {}", hex::encode(req.as_bytes()));
        dump_frame("write data", req.as_bytes());
        self.send_raw(req.as_bytes())?;

        let resp = Frame::from_raw(self.recv_raw()?);
        log::debug!("<= {}", hex::encode(resp.as_bytes()));
        dump_frame("read data", resp.as_bytes());
        let resp = protocol::validate(cmd.opcode(), resp)?;
        Response::parse(cmd.opcode(), &resp)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_raw(&mut self, raw: &[u8; PACKET_SIZE]) -> std::result::Result<(), TransportError> {
        (**self).send_raw(raw)
    }

    fn recv_raw(&mut self) -> std::result::Result<[u8; PACKET_SIZE], TransportError> {
        (**self).recv_raw()
    }
}

fn dump_frame(what: &str, raw: &[u8]) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }
    let mut out = Vec::new();
    if hxdmp::hexdump(raw, &mut out).is_ok() {
        log::trace!("{}\n{}", what, String::from_utf8_lossy(&out));
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;

    use super::*;
    use crate::constants::ENTRY_SIZE;

    /// Replays canned response frames and records every request.
    #[derive(Default)]
    pub struct MockTransport {
        pub requests: Vec<[u8; PACKET_SIZE]>,
        responses: VecDeque<Option<[u8; PACKET_SIZE]>>,
        /// Returned once the queue runs dry.
        idle: Option<[u8; PACKET_SIZE]>,
        /// Called with the number of frames received so far.
        hook: Option<Box<dyn FnMut(usize)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&mut self, raw: [u8; PACKET_SIZE]) -> &mut Self {
            self.responses.push_back(Some(raw));
            self
        }

        /// Queue a bus failure.
        pub fn push_failure(&mut self) -> &mut Self {
            self.responses.push_back(None);
            self
        }

        pub fn set_idle(&mut self, raw: [u8; PACKET_SIZE]) -> &mut Self {
            self.idle = Some(raw);
            self
        }

        pub fn set_hook(&mut self, hook: impl FnMut(usize) + 'static) -> &mut Self {
            self.hook = Some(Box::new(hook));
            self
        }

        pub fn opcodes(&self) -> Vec<u8> {
            self.requests.iter().map(|r| r[0]).collect()
        }
    }

    impl Transport for MockTransport {
        fn send_raw(&mut self, raw: &[u8; PACKET_SIZE]) -> std::result::Result<(), TransportError> {
            self.requests.push(*raw);
            Ok(())
        }

        fn recv_raw(&mut self) -> std::result::Result<[u8; PACKET_SIZE], TransportError> {
            let count = self.requests.len();
            if let Some(hook) = self.hook.as_mut() {
                hook(count);
            }
            match self.responses.pop_front() {
                Some(Some(raw)) => Ok(raw),
                Some(None) => Err(TransportError::ShortTransfer {
                    direction: "read",
                    len: 0,
                }),
                None => self.idle.ok_or(TransportError::ShortTransfer {
                    direction: "read",
                    len: 0,
                }),
            }
        }
    }

    /// A waveform fetch response.
    pub fn waveform_frame(opcode: u8, total: u16, position: u16, data: &[u8]) -> [u8; PACKET_SIZE] {
        let mut raw = [0u8; PACKET_SIZE];
        raw[0] = opcode;
        raw[1..3].copy_from_slice(&total.to_be_bytes());
        raw[3..5].copy_from_slice(&position.to_be_bytes());
        raw[5] = (data.len() / ENTRY_SIZE) as u8;
        raw[6..6 + data.len()].copy_from_slice(data);
        raw
    }

    pub fn ack_frame(opcode: u8) -> [u8; PACKET_SIZE] {
        let mut raw = [0u8; PACKET_SIZE];
        raw[0] = opcode;
        raw
    }
}
