//! Transaction-level USB device interface.
//!
//! Host controller models drive attached devices one token at a time: a SETUP packet starts a
//! control transfer on endpoint 0, and IN/OUT tokens move data on any endpoint. Devices answer
//! each IN/OUT token synchronously with a [`UsbHandshake`].

use core::any::Any;

/// The 8-byte SETUP packet that starts every control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(self) -> [u8; 8] {
        let [v0, v1] = self.value.to_le_bytes();
        let [i0, i1] = self.index.to_le_bytes();
        let [l0, l1] = self.length.to_le_bytes();
        [self.request_type, self.request, v0, v1, i0, i1, l0, l1]
    }

    pub fn is_device_to_host(self) -> bool {
        self.request_type & 0x80 != 0
    }

    /// `bmRequestType` and `bRequest` packed into one code, e.g. `0xc101` for a vendor IN
    /// request 1 addressed to an interface.
    pub fn control_request(self) -> u16 {
        (u16::from(self.request_type) << 8) | u16::from(self.request)
    }
}

/// Result of a single IN or OUT token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsbHandshake {
    /// The token completed; `bytes` is the number of bytes moved.
    Ack { bytes: usize },
    /// No data is available yet; the host retries later.
    Nak,
    /// The endpoint refuses the request.
    Stall,
    Timeout,
}

impl UsbHandshake {
    pub fn is_ack(self) -> bool {
        matches!(self, UsbHandshake::Ack { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsbSpeed {
    Low,
    Full,
    High,
}

/// A USB function as seen by a host controller.
///
/// Implementations are driven from a single thread; the controller never delivers two tokens for
/// the same device concurrently.
pub trait UsbDevice {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn speed(&self) -> UsbSpeed {
        UsbSpeed::Full
    }

    /// Bus reset.
    fn reset(&mut self);

    /// Current guest-visible USB address.
    fn address(&self) -> u8;

    fn handle_setup(&mut self, setup: SetupPacket);

    fn handle_out(&mut self, ep: u8, data: &[u8]) -> UsbHandshake;

    fn handle_in(&mut self, ep: u8, buf: &mut [u8]) -> UsbHandshake;
}
