//! Deadline-bounded capture loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Error;
use crate::reassembly::{fetch_waveform, FetchMode, FetchOutcome};
use crate::transport::Transport;
use crate::waveform::Waveform;

/// Cooperative cancellation flag, shared between the deadline timer and the
/// polling loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A wall-clock timer that cancels its token when it expires.
///
/// Disarming (or dropping) before expiry leaves the token untouched.
pub struct Deadline {
    disarm: Option<mpsc::Sender<()>>,
    timer: Option<JoinHandle<()>>,
}

impl Deadline {
    pub fn arm(timeout: Duration, token: CancelToken) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let timer = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
                log::warn!("receive timeout");
                token.cancel();
            }
        });
        Deadline {
            disarm: Some(tx),
            timer: Some(timer),
        }
    }

    pub fn disarm(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // closing the channel wakes the timer up
        drop(self.disarm.take());
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    Idle,
    Receiving,
    Complete,
    TimedOut,
    Error,
}

/// How a capture session ended.
#[derive(Debug)]
pub enum CaptureStatus {
    /// The end marker arrived.
    Complete,
    /// The deadline elapsed, or the session was cancelled, first.
    TimedOut,
    /// A transfer failed. The waveform holds what was read before.
    Failed(Error),
}

impl CaptureStatus {
    pub fn state(&self) -> CaptureState {
        match self {
            CaptureStatus::Complete => CaptureState::Complete,
            CaptureStatus::TimedOut => CaptureState::TimedOut,
            CaptureStatus::Failed(_) => CaptureState::Error,
        }
    }
}

#[derive(Debug)]
pub struct CaptureOutcome {
    pub status: CaptureStatus,
    pub waveform: Waveform,
    /// Sample reads issued, each possibly spanning several frames.
    pub polls: usize,
}

/// Polls the device's sample buffer until it holds a complete transmission.
///
/// The device must already be receiving. Only one transfer is ever in
/// flight; the deadline is observed between transfers, never during one.
pub struct CaptureSession<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    timeout: Duration,
    poll_interval: Duration,
    capacity: usize,
    token: CancelToken,
    state: CaptureState,
}

impl<'a, T: Transport + ?Sized> CaptureSession<'a, T> {
    pub fn new(transport: &'a mut T, timeout: Duration) -> Self {
        CaptureSession {
            transport,
            timeout,
            poll_interval: Duration::ZERO,
            capacity: crate::constants::DEFAULT_CAPACITY,
            token: CancelToken::new(),
            state: CaptureState::Idle,
        }
    }

    /// Pause between sample reads that found nothing. Zero busy-polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Waveform capacity in entries.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Cancelling the token ends the session as timed out at the next check.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    fn transition(&mut self, next: CaptureState) {
        log::debug!("capture: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn run(&mut self) -> CaptureOutcome {
        let mut waveform = Waveform::with_capacity(self.capacity);
        let mut polls = 0;

        let deadline = Deadline::arm(self.timeout, self.token.clone());
        self.transition(CaptureState::Receiving);

        let status = loop {
            if self.token.is_cancelled() {
                break CaptureStatus::TimedOut;
            }
            polls += 1;
            match fetch_waveform(&mut *self.transport, FetchMode::Sample, &mut waveform) {
                Ok(FetchOutcome::NoData) => {
                    if !self.poll_interval.is_zero() {
                        thread::sleep(self.poll_interval);
                    }
                }
                Ok(FetchOutcome::Received { entries, .. }) => {
                    log::trace!("sampled {} entries", entries);
                    if self.token.is_cancelled() {
                        break CaptureStatus::TimedOut;
                    }
                    if waveform.has_end_marker() {
                        break CaptureStatus::Complete;
                    }
                }
                Err(e) => {
                    log::error!("receive error: {}", e);
                    break CaptureStatus::Failed(e);
                }
            }
        };
        deadline.disarm();
        self.transition(status.state());

        CaptureOutcome {
            status,
            waveform,
            polls,
        }
    }
}
