//! Protocol constants of the ADIR01P infrared controller.

/// Every frame exchanged with the device is exactly this long.
pub const PACKET_SIZE: usize = 64;
/// Largest payload after the opcode byte.
pub const MAX_PAYLOAD_SIZE: usize = PACKET_SIZE - 1;
/// Filler for unused frame bytes, so legitimate zero payload bytes stay distinguishable.
pub const PADDING: u8 = 0xff;

/// One mark/space duration pair.
pub const ENTRY_SIZE: usize = 4;
/// total(2) + position(2) + chunk size(1) after the opcode.
pub const WAVEFORM_HEADER_SIZE: usize = 6;
/// Max entries per frame, 56 bytes fit behind the header.
pub const WINDOW_ENTRIES: usize = 14;
/// Waveform buffer size of the reference device, in entries (9600 bytes).
pub const DEFAULT_CAPACITY: usize = 2400;

pub const DEFAULT_FREQUENCY: u32 = 38000;
pub const RECEIVE_TIMEOUT_SECS: u64 = 5;

/// Tail bytes appended by the device when a bounded transmission ended.
pub const END_MARKER: [u8; 2] = [0x7f, 0xff];

pub mod opcodes {
    pub const RECEIVE_START: u8 = 0x31;
    pub const RECEIVE_STOP: u8 = 0x32;
    pub const RECEIVE_RESULT: u8 = 0x33;
    pub const SET_DATA: u8 = 0x34;
    pub const SEND: u8 = 0x35;
    pub const RECEIVE_SAMPLE: u8 = 0x37;
    pub const VERSION: u8 = 0x56;
}
