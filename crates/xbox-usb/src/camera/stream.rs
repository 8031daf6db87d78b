//! Isochronous frame streaming.
//!
//! Every IN token on the video endpoint gets a fixed-size packet. A frame is sent as a header
//! packet (16-byte start-of-frame marker followed by the first slice of the encoded image), then
//! raw body packets, then a footer packet carrying the end-of-frame marker. The stream then NAKs
//! for a fixed number of polls before starting the next frame; the guest driver uses that gap to
//! find frame boundaries.
//!
//! Packets always report the full [`PACKET_LEN`]. Bytes past the meaningful payload are whatever
//! the previous packet left in the scratch buffer.

use tracing::{trace, warn};

use super::encoder::{FrameEncoder, TestPattern};
use crate::usb::UsbHandshake;

pub const PACKET_LEN: usize = 768;

pub const FRAME_HEADER: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const FRAME_FOOTER: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0x51, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Encoded bytes carried by the header packet.
pub const FIRST_CHUNK_LEN: usize = PACKET_LEN - FRAME_HEADER.len();

/// Packet counter value after the footer; the idle tail runs from here.
const IDLE_START: u32 = 25;
/// Packet counter value of the last idle poll.
const IDLE_END: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// The next poll encodes a new frame and sends its header packet.
    FrameStart,
    /// Sending the encoded frame; `offset` is the next byte to send.
    Body { packet: u32, offset: usize },
    /// Inter-frame gap; polls NAK.
    Idle { packet: u32 },
    /// Last NAK of the gap; the poll after this starts a new frame.
    Rewind,
}

impl StreamState {
    /// Packets issued since the frame started, counting the idle polls.
    pub fn counter(&self) -> u32 {
        match *self {
            StreamState::FrameStart => 0,
            StreamState::Body { packet, .. } | StreamState::Idle { packet } => packet,
            StreamState::Rewind => IDLE_END,
        }
    }

    pub fn offset(&self) -> Option<usize> {
        match *self {
            StreamState::Body { offset, .. } => Some(offset),
            _ => None,
        }
    }
}

pub struct FrameStream {
    state: StreamState,
    frame: Vec<u8>,
    packet: [u8; PACKET_LEN],
    pattern: TestPattern,
    encoder: Box<dyn FrameEncoder>,
}

impl FrameStream {
    pub fn new(encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            state: StreamState::FrameStart,
            frame: Vec::new(),
            packet: [0; PACKET_LEN],
            pattern: TestPattern::new(),
            encoder,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The encoded frame currently being sent.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Rewinds to the start of a frame. The scratch packet keeps its contents.
    pub fn reset(&mut self) {
        self.state = StreamState::FrameStart;
    }

    /// Serves one IN poll, writing at most [`PACKET_LEN`] bytes into `buf`.
    pub fn next_packet(&mut self, buf: &mut [u8]) -> UsbHandshake {
        let state = self.state;
        self.state = match state {
            StreamState::FrameStart => {
                self.encode_next_frame();
                self.packet[..FRAME_HEADER.len()].copy_from_slice(&FRAME_HEADER);
                let len = self.frame.len().min(FIRST_CHUNK_LEN);
                self.packet[FRAME_HEADER.len()..FRAME_HEADER.len() + len]
                    .copy_from_slice(&self.frame[..len]);
                StreamState::Body {
                    packet: 1,
                    offset: FIRST_CHUNK_LEN,
                }
            }
            StreamState::Body { packet, offset } if offset < self.frame.len() => {
                let len = (self.frame.len() - offset).min(PACKET_LEN);
                self.packet[..len].copy_from_slice(&self.frame[offset..offset + len]);
                StreamState::Body {
                    packet: packet.saturating_add(1),
                    offset: offset + len,
                }
            }
            StreamState::Body { packet, .. } if packet < IDLE_START => {
                self.packet[..FRAME_FOOTER.len()].copy_from_slice(&FRAME_FOOTER);
                StreamState::Idle {
                    packet: IDLE_START,
                }
            }
            // A frame too large for the packet budget runs straight into the idle tail.
            StreamState::Body { packet, .. } | StreamState::Idle { packet } => {
                return self.idle(packet)
            }
            StreamState::Rewind => return self.idle(IDLE_END),
        };

        let len = buf.len().min(PACKET_LEN);
        buf[..len].copy_from_slice(&self.packet[..len]);
        trace!(state = ?self.state, len, "video packet");
        UsbHandshake::Ack { bytes: len }
    }

    fn idle(&mut self, packet: u32) -> UsbHandshake {
        self.state = if packet >= IDLE_END {
            StreamState::FrameStart
        } else if packet + 1 == IDLE_END {
            StreamState::Rewind
        } else {
            StreamState::Idle { packet: packet + 1 }
        };
        UsbHandshake::Nak
    }

    fn encode_next_frame(&mut self) {
        let image = self.pattern.next_frame();
        match self.encoder.encode(&image) {
            Ok(frame) => self.frame = frame,
            Err(err) => {
                warn!(%err, "camera frame encoding failed; sending an empty frame");
                self.frame.clear();
            }
        }
    }
}
