//! Multi-frame waveform reads.

use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::transport::Transport;
use crate::waveform::Waveform;

/// Which buffer of the device to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMode {
    /// The final result, after receiving stopped.
    Result,
    /// A snapshot taken while the device is still receiving.
    Sample,
}

impl FetchMode {
    fn command(self) -> Command {
        match self {
            FetchMode::Result => Command::ReceiveResult,
            FetchMode::Sample => Command::ReceiveSample,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
    /// Sampling only: the device has nothing captured yet.
    NoData,
    Received { total: u16, entries: usize },
}

/// Read the device's waveform into `waveform`, one frame at a time, until
/// the device reports nothing is left.
///
/// The buffer is cleared first. Any failure aborts the read; the buffer then
/// holds what arrived before it.
pub fn fetch_waveform<T: Transport + ?Sized>(
    transport: &mut T,
    mode: FetchMode,
    waveform: &mut Waveform,
) -> Result<FetchOutcome> {
    let cmd = mode.command();
    waveform.clear();

    let total = loop {
        let resp = transport.transfer(&cmd)?;
        let (progress, data) = resp.into_waveform(cmd.opcode())?;

        if mode == FetchMode::Sample && progress.total == 0 && waveform.is_empty() {
            return Ok(FetchOutcome::NoData);
        }
        if progress.chunk_size == 0 {
            break progress.total;
        }
        if usize::from(progress.position) != waveform.len() {
            return Err(Error::malformed(format!(
                "chunk at position {} after {} entries",
                progress.position,
                waveform.len()
            )));
        }
        if progress.end() > usize::from(progress.total) {
            return Err(Error::malformed(format!(
                "chunk {}+{} runs past total {}",
                progress.position, progress.chunk_size, progress.total
            )));
        }
        waveform.extend_from_slice(&data)?;

        if !progress.has_more() {
            break progress.total;
        }
    };
    log::debug!("{:?}: {} of {} entries", mode, waveform.len(), total);
    Ok(FetchOutcome::Received {
        total,
        entries: waveform.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::opcodes::{RECEIVE_RESULT, RECEIVE_SAMPLE};
    use crate::error::ProtocolError;
    use crate::transport::mock::{ack_frame, waveform_frame, MockTransport};

    fn entries(n: usize, seed: u8) -> Vec<u8> {
        (0..n * 4).map(|i| seed.wrapping_add(i as u8)).collect()
    }

    #[test]
    fn test_reassembles_in_order() {
        let a = entries(14, 0);
        let b = entries(14, 100);
        let c = entries(2, 200);
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 30, 0, &a))
            .push(waveform_frame(RECEIVE_RESULT, 30, 14, &b))
            .push(waveform_frame(RECEIVE_RESULT, 30, 28, &c));

        let mut waveform = Waveform::new();
        let outcome = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap();

        assert_eq!(outcome, FetchOutcome::Received { total: 30, entries: 30 });
        assert_eq!(waveform.as_bytes(), [a, b, c].concat());
        assert_eq!(mock.opcodes(), vec![RECEIVE_RESULT; 3]);
    }

    #[test]
    fn test_zero_chunk_stops() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 100, 0, &entries(14, 0)))
            .push(waveform_frame(RECEIVE_RESULT, 100, 14, &[]))
            .push(waveform_frame(RECEIVE_RESULT, 100, 14, &entries(14, 0)));

        let mut waveform = Waveform::new();
        let outcome = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap();

        assert_eq!(outcome, FetchOutcome::Received { total: 100, entries: 14 });
        assert_eq!(mock.requests.len(), 2);
    }

    #[test]
    fn test_zero_chunk_stops_even_when_inconsistent() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 5, 900, &[]));

        let mut waveform = Waveform::new();
        let outcome = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap();
        assert_eq!(outcome, FetchOutcome::Received { total: 5, entries: 0 });
    }

    #[test]
    fn test_empty_result() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 0, 0, &[]));

        let mut waveform = Waveform::new();
        let outcome = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap();
        assert_eq!(outcome, FetchOutcome::Received { total: 0, entries: 0 });
    }

    #[test]
    fn test_sample_no_data() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_SAMPLE, 0, 0, &[]));

        let mut waveform = Waveform::new();
        let outcome = fetch_waveform(&mut mock, FetchMode::Sample, &mut waveform).unwrap();
        assert_eq!(outcome, FetchOutcome::NoData);
        assert_eq!(mock.opcodes(), vec![RECEIVE_SAMPLE]);
    }

    #[test]
    fn test_clears_previous_pass() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_SAMPLE, 1, 0, &entries(1, 1)));

        let mut waveform = Waveform::new();
        waveform.extend_from_slice(&entries(3, 9)).unwrap();
        fetch_waveform(&mut mock, FetchMode::Sample, &mut waveform).unwrap();
        assert_eq!(waveform.as_bytes(), entries(1, 1));
    }

    #[test]
    fn test_chunk_past_total_is_malformed() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 10, 0, &entries(12, 0)));

        let mut waveform = Waveform::new();
        let err = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MalformedFrame(_))
        ));
        assert!(waveform.is_empty());
    }

    #[test]
    fn test_gap_is_malformed() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 40, 0, &entries(14, 0)))
            .push(waveform_frame(RECEIVE_RESULT, 40, 20, &entries(14, 0)));

        let mut waveform = Waveform::new();
        let err = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MalformedFrame(_))
        ));
        assert_eq!(waveform.len(), 14);
    }

    #[test]
    fn test_capacity_overflow_is_malformed() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 20, 0, &entries(14, 0)))
            .push(waveform_frame(RECEIVE_RESULT, 20, 14, &entries(6, 0)));

        let mut waveform = Waveform::with_capacity(16);
        let err = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MalformedFrame(_))
        ));
        assert_eq!(waveform.len(), 14);
    }

    #[test]
    fn test_failure_propagates_without_retry() {
        let mut mock = MockTransport::new();
        mock.push(waveform_frame(RECEIVE_RESULT, 20, 0, &entries(14, 0)))
            .push_failure()
            .push(waveform_frame(RECEIVE_RESULT, 20, 14, &entries(6, 0)));

        let mut waveform = Waveform::new();
        let err = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(mock.requests.len(), 2);
        assert_eq!(waveform.len(), 14);
    }

    #[test]
    fn test_opcode_mismatch() {
        let mut mock = MockTransport::new();
        mock.push(ack_frame(RECEIVE_SAMPLE));

        let mut waveform = Waveform::new();
        let err = fetch_waveform(&mut mock, FetchMode::Result, &mut waveform).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::OpcodeMismatch {
                expected: RECEIVE_RESULT,
                actual: RECEIVE_SAMPLE
            })
        ));
    }
}
