//! ADIR01P USB infrared remote controller protocol implementation.

pub mod capture;
pub mod constants;
pub mod device;
pub mod error;
pub mod format;
pub mod protocol;
pub mod reassembly;
pub mod remocon;
pub mod transmit;
pub mod transport;
pub mod waveform;

pub use self::capture::{CaptureOutcome, CaptureSession, CaptureStatus, CancelToken};
pub use self::device::DeviceProfile;
pub use self::error::{Error, ProtocolError, Result, TransportError};
pub use self::format::Recording;
pub use self::protocol::{Command, Frame, Opcode, Response};
pub use self::remocon::Remocon;
pub use self::transport::Transport;
pub use self::waveform::Waveform;
