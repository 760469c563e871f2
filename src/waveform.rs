//! In-memory waveform buffer.

use std::fmt;

use crate::constants::{DEFAULT_CAPACITY, END_MARKER, ENTRY_SIZE};
use crate::error::{Error, Result};

/// Ordered infrared entries, each a 4-byte mark/space duration pair.
///
/// The buffer is bounded by the device's capacity, every append is checked
/// against it and rejected instead of growing past it.
#[derive(Clone)]
pub struct Waveform {
    data: Vec<u8>,
    capacity: usize,
}

// Two waveforms are equal when they hold the same entries, whatever their capacity.
impl PartialEq for Waveform {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Waveform {}

impl Default for Waveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Waveform {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` is counted in entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Waveform {
            data: Vec::with_capacity(capacity * ENTRY_SIZE),
            capacity,
        }
    }

    /// Load a waveform from raw entry bytes, e.g. from a file.
    pub fn from_bytes(bytes: &[u8], capacity: usize) -> Result<Self> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(Error::Format(format!(
                "{} bytes is not a whole number of {}-byte entries",
                bytes.len(),
                ENTRY_SIZE
            )));
        }
        if bytes.len() / ENTRY_SIZE > capacity {
            return Err(Error::Format(format!(
                "{} entries exceed the capacity of {}",
                bytes.len() / ENTRY_SIZE,
                capacity
            )));
        }
        let mut waveform = Self::with_capacity(capacity);
        waveform.data.extend_from_slice(bytes);
        Ok(waveform)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len() / ENTRY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn entries(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(ENTRY_SIZE)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append entries received from the device.
    ///
    /// Checked before copying: a fragment that would overflow the buffer is a
    /// malformed frame, and nothing is appended.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(Error::malformed(format!(
                "fragment of {} bytes is not made of whole entries",
                bytes.len()
            )));
        }
        let entries = bytes.len() / ENTRY_SIZE;
        if self.len() + entries > self.capacity {
            return Err(Error::malformed(format!(
                "{} + {} entries overflow the waveform capacity of {}",
                self.len(),
                entries,
                self.capacity
            )));
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Whether the device marked the end of a bounded transmission.
    pub fn has_end_marker(&self) -> bool {
        self.data.ends_with(&END_MARKER)
    }
}

impl fmt::Debug for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Waveform({}/{})[{}]",
            self.len(),
            self.capacity,
            hex::encode(&self.data)
        )
    }
}
