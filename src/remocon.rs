//! Device operations: version, capture and replay.

use std::time::Duration;

use crate::capture::{CaptureOutcome, CaptureSession, CaptureStatus};
use crate::device::DeviceProfile;
use crate::error::{Error, ProtocolError, Result};
use crate::format::Recording;
use crate::protocol::{Command, Response};
use crate::reassembly::{fetch_waveform, FetchMode};
use crate::transmit::send_waveform_data;
use crate::transport::{Transport, UsbTransport};
use crate::waveform::Waveform;

pub struct Remocon<T: Transport> {
    transport: T,
    profile: DeviceProfile,
    poll_interval: Duration,
}

impl Remocon<UsbTransport> {
    pub fn new_from_usb(profile: DeviceProfile) -> Result<Self> {
        let transport = UsbTransport::open_any(&profile)?;
        log::debug!("opened {}", profile);
        Ok(Remocon::new(transport, profile))
    }
}

impl<T: Transport> Remocon<T> {
    pub fn new(transport: T, profile: DeviceProfile) -> Self {
        Remocon {
            transport,
            profile,
            poll_interval: Duration::ZERO,
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Pause between empty sample reads while waiting for a signal.
    pub fn set_poll_interval(&mut self, poll_interval: Duration) {
        self.poll_interval = poll_interval;
    }

    fn ack(&mut self, cmd: Command) -> Result<()> {
        let opcode = cmd.opcode();
        match self.transport.transfer(&cmd)? {
            Response::Ack(_) => Ok(()),
            _ => Err(ProtocolError::UnexpectedResponse(opcode).into()),
        }
    }

    pub fn version(&mut self) -> Result<String> {
        match self.transport.transfer(&Command::Version)? {
            Response::Version(version) => Ok(version),
            _ => Err(ProtocolError::UnexpectedResponse(Command::Version.opcode()).into()),
        }
    }

    pub fn receive_start(&mut self, frequency: u32) -> Result<()> {
        let frequency = self.profile.check_frequency(frequency)?;
        self.ack(Command::receive_start(frequency))?;
        log::info!("Receiving at {} Hz", frequency);
        Ok(())
    }

    pub fn receive_stop(&mut self) -> Result<()> {
        self.ack(Command::ReceiveStop)
    }

    /// Read the final waveform after receiving stopped.
    pub fn receive_result(&mut self) -> Result<Waveform> {
        let mut waveform = Waveform::with_capacity(self.profile.capacity);
        fetch_waveform(&mut self.transport, FetchMode::Result, &mut waveform)?;
        Ok(waveform)
    }

    /// Poll samples until the end marker arrives or `timeout` elapses.
    pub fn wait_received(&mut self, timeout: Duration) -> CaptureOutcome {
        CaptureSession::new(&mut self.transport, timeout)
            .with_capacity(self.profile.capacity)
            .with_poll_interval(self.poll_interval)
            .run()
    }

    /// Start receiving, wait for one complete transmission, stop, and read
    /// the result.
    pub fn capture(&mut self, frequency: u32, timeout: Duration) -> Result<Recording> {
        self.receive_start(frequency)?;

        let outcome = self.wait_received(timeout);
        log::debug!(
            "capture ended after {} polls with {} entries",
            outcome.polls,
            outcome.waveform.len()
        );
        match outcome.status {
            CaptureStatus::Complete => (),
            CaptureStatus::TimedOut => {
                if let Err(e) = self.receive_stop() {
                    log::warn!("receive stop after timeout failed: {}", e);
                }
                return Err(Error::CaptureTimeout {
                    entries: outcome.waveform.len(),
                });
            }
            CaptureStatus::Failed(e) => return Err(e),
        }

        self.receive_stop()?;
        let waveform = self.receive_result()?;
        log::info!("Received {} entries", waveform.len());
        Ok(Recording {
            frequency,
            waveform,
        })
    }

    pub fn set_data(&mut self, waveform: &Waveform) -> Result<()> {
        let frames = send_waveform_data(&mut self.transport, waveform)?;
        log::debug!("set data: {} frames", frames);
        Ok(())
    }

    pub fn send(&mut self, frequency: u32, entries: usize) -> Result<()> {
        let frequency = self.profile.check_frequency(frequency)?;
        let entries = u16::try_from(entries).map_err(|_| Error::PayloadTooLarge {
            len: entries,
            max: u16::MAX as usize,
        })?;
        self.ack(Command::send(frequency, entries))
    }

    /// Upload a recording and transmit it.
    pub fn transmit(&mut self, recording: &Recording) -> Result<()> {
        self.profile.check_frequency(recording.frequency)?;
        log::debug!("frequency: {}", recording.frequency);
        log::debug!("data size: {}", recording.waveform.as_bytes().len());
        log::debug!("data: {}", hex::encode(recording.waveform.as_bytes()));

        self.set_data(&recording.waveform)?;
        self.send(recording.frequency, recording.waveform.len())?;
        log::info!(
            "Sent {} entries at {} Hz",
            recording.waveform.len(),
            recording.frequency
        );
        Ok(())
    }
}
