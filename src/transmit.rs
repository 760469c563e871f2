//! Multi-frame waveform upload.

use crate::constants::{ENTRY_SIZE, WINDOW_ENTRIES};
use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::transport::Transport;
use crate::waveform::Waveform;

/// Upload `waveform` to the device buffer in windows of at most 14 entries.
///
/// Returns the number of frames sent. A failed window aborts the whole
/// upload, it has to be restarted from the beginning.
pub fn send_waveform_data<T: Transport + ?Sized>(
    transport: &mut T,
    waveform: &Waveform,
) -> Result<usize> {
    if waveform.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    let total = u16::try_from(waveform.len()).map_err(|_| Error::PayloadTooLarge {
        len: waveform.len(),
        max: u16::MAX as usize,
    })?;

    let mut position = 0usize;
    let mut frames = 0;
    for window in waveform.as_bytes().chunks(WINDOW_ENTRIES * ENTRY_SIZE) {
        let cmd = Command::set_data(total, position as u16, window.to_vec());
        transport.transfer(&cmd)?;
        position += window.len() / ENTRY_SIZE;
        frames += 1;
        log::trace!("set data {}/{}", position, total);
    }
    log::debug!("uploaded {} entries in {} frames", total, frames);
    Ok(frames)
}
