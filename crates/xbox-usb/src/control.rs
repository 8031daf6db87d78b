//! Endpoint-0 control pipe.
//!
//! Device models answer control requests at the request level through [`ControlHandler`]: one
//! call per transfer, with the OUT payload (if any) already collected and a buffer to fill for IN
//! responses. [`ControlPipe`] turns that into the SETUP/DATA/STATUS token sequence a host
//! controller drives.

use tracing::{debug, trace};

use crate::usb::{SetupPacket, UsbHandshake};

/// Size of the per-device control data buffer. Requests with a larger `wLength` stall.
pub const EP0_BUFFER_LEN: usize = 4096;

const REQ_SET_ADDRESS: u8 = 0x05;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlStatus {
    Success,
    Stall,
}

/// Request-level outcome of a control transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlCompletion {
    pub status: ControlStatus,
    pub actual_length: usize,
}

impl ControlCompletion {
    pub fn success(actual_length: usize) -> Self {
        Self {
            status: ControlStatus::Success,
            actual_length,
        }
    }

    pub fn stall() -> Self {
        Self {
            status: ControlStatus::Stall,
            actual_length: 0,
        }
    }

    pub fn is_stall(&self) -> bool {
        self.status == ControlStatus::Stall
    }
}

/// Request-level control dispatcher implemented by each device model.
pub trait ControlHandler {
    /// Handles one control transfer.
    ///
    /// `data` carries the OUT payload on entry and receives the IN response. It is at least
    /// `setup.length` bytes long when driven by [`ControlPipe`]. Returns `None` when the request is
    /// not recognized.
    fn handle_control(&mut self, setup: SetupPacket, data: &mut [u8])
        -> Option<ControlCompletion>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Ep0Stage {
    Idle,
    DataIn,
    DataOut,
    StatusIn,
    StatusOut,
}

#[derive(Debug)]
pub struct ControlPipe {
    stage: Ep0Stage,
    setup: Option<SetupPacket>,
    // Persistent across transfers; handlers see whatever the previous transfer left behind.
    buf: Box<[u8]>,
    in_len: usize,
    in_offset: usize,
    out_received: usize,
    stalled: bool,
    address: u8,
    pending_address: Option<u8>,
}

impl Default for ControlPipe {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPipe {
    pub fn new() -> Self {
        Self {
            stage: Ep0Stage::Idle,
            setup: None,
            buf: vec![0u8; EP0_BUFFER_LEN].into_boxed_slice(),
            in_len: 0,
            in_offset: 0,
            out_received: 0,
            stalled: false,
            address: 0,
            pending_address: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn reset(&mut self) {
        self.stage = Ep0Stage::Idle;
        self.setup = None;
        self.in_len = 0;
        self.in_offset = 0;
        self.out_received = 0;
        self.stalled = false;
        self.address = 0;
        self.pending_address = None;
    }

    pub fn handle_setup(&mut self, setup: SetupPacket, handler: &mut dyn ControlHandler) {
        // A new SETUP aborts any in-flight transfer, including a pending SET_ADDRESS.
        self.pending_address = None;
        self.setup = Some(setup);
        self.in_len = 0;
        self.in_offset = 0;
        self.out_received = 0;
        self.stalled = false;
        self.stage = Ep0Stage::Idle;

        if usize::from(setup.length) > self.buf.len() {
            debug!(
                request = setup.control_request(),
                length = setup.length,
                "control request exceeds ep0 buffer"
            );
            self.stalled = true;
            return;
        }

        if setup.request_type == 0x00 && setup.request == REQ_SET_ADDRESS {
            if setup.index != 0 || setup.length != 0 || setup.value > 127 {
                self.stalled = true;
                return;
            }
            self.pending_address = Some((setup.value & 0x7F) as u8);
            self.stage = Ep0Stage::StatusIn;
            return;
        }

        if !setup.is_device_to_host() && setup.length != 0 {
            self.stage = Ep0Stage::DataOut;
            return;
        }

        let completion = handler.handle_control(setup, &mut self.buf);
        self.complete(setup, completion);
    }

    pub fn handle_out(&mut self, data: &[u8], handler: &mut dyn ControlHandler) -> UsbHandshake {
        if self.stalled {
            return UsbHandshake::Stall;
        }
        let Some(setup) = self.setup else {
            return UsbHandshake::Nak;
        };

        match self.stage {
            Ep0Stage::DataOut => {
                let expected = usize::from(setup.length);
                let chunk = data.len().min(expected - self.out_received);
                self.buf[self.out_received..self.out_received + chunk]
                    .copy_from_slice(&data[..chunk]);
                self.out_received += chunk;
                if self.out_received >= expected {
                    let completion = handler.handle_control(setup, &mut self.buf);
                    self.complete(setup, completion);
                    if self.stalled {
                        return UsbHandshake::Stall;
                    }
                }
                UsbHandshake::Ack { bytes: chunk }
            }
            Ep0Stage::StatusOut => {
                self.stage = Ep0Stage::Idle;
                self.setup = None;
                UsbHandshake::Ack { bytes: 0 }
            }
            _ => UsbHandshake::Nak,
        }
    }

    pub fn handle_in(&mut self, buf: &mut [u8]) -> UsbHandshake {
        if self.stalled {
            return UsbHandshake::Stall;
        }

        match self.stage {
            Ep0Stage::DataIn => {
                let remaining = self.in_len.saturating_sub(self.in_offset);
                let len = buf.len().min(remaining);
                buf[..len].copy_from_slice(&self.buf[self.in_offset..self.in_offset + len]);
                self.in_offset += len;
                if self.in_offset >= self.in_len {
                    self.stage = Ep0Stage::StatusOut;
                }
                UsbHandshake::Ack { bytes: len }
            }
            Ep0Stage::StatusIn => {
                if let Some(addr) = self.pending_address.take() {
                    self.address = addr;
                }
                self.stage = Ep0Stage::Idle;
                self.setup = None;
                UsbHandshake::Ack { bytes: 0 }
            }
            _ => UsbHandshake::Nak,
        }
    }

    fn complete(&mut self, setup: SetupPacket, completion: Option<ControlCompletion>) {
        match completion {
            Some(ControlCompletion {
                status: ControlStatus::Success,
                actual_length,
            }) => {
                if setup.length == 0 {
                    self.stage = Ep0Stage::StatusIn;
                } else if setup.is_device_to_host() {
                    self.in_len = actual_length.min(usize::from(setup.length));
                    self.in_offset = 0;
                    self.stage = Ep0Stage::DataIn;
                } else {
                    self.stage = Ep0Stage::StatusIn;
                }
            }
            Some(_) => {
                trace!(request = setup.control_request(), "control request stalled");
                self.stalled = true;
            }
            None => {
                debug!(
                    request = setup.control_request(),
                    value = setup.value,
                    index = setup.index,
                    length = setup.length,
                    "unhandled control request"
                );
                self.stalled = true;
            }
        }
    }
}
