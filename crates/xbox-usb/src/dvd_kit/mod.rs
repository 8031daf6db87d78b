//! Xbox DVD Playback Kit: the IR receiver dongle that unlocks DVD playback.
//!
//! The dongle carries the player firmware, which the console downloads page by page over vendor
//! control requests. The remote itself is not modelled; the interrupt endpoint always reports the
//! same idle state.

pub mod config;
pub mod firmware;

use tracing::{debug, trace};

use crate::control::{ControlCompletion, ControlHandler, ControlPipe};
use crate::desc::{
    ConfigurationDescriptor, DeviceDescriptor, EndpointDescriptor, InterfaceDescriptor,
    StandardRequests, UsbDescriptors, ENDPOINT_XFER_INT,
};
use crate::usb::{SetupPacket, UsbDevice, UsbHandshake};

use self::config::DvdPlaybackKitConfig;
use self::firmware::{FirmwareError, FirmwareStore};

pub const DVD_KIT_VENDOR_ID: u16 = 0x045e;
pub const DVD_KIT_PRODUCT_ID: u16 = 0x0284;

pub const PRODUCT_DESCRIPTION: &str = "Microsoft Xbox DVD Playback Kit";

/// Firmware page read (`wValue` = page number).
pub const REQ_FIRMWARE_READ: u16 = 0xc101;
/// Second firmware read request; same semantics as [`REQ_FIRMWARE_READ`].
pub const REQ_FIRMWARE_READ_ALT: u16 = 0xc102;
pub const REQ_GET_ACCESSORY_DESCRIPTOR: u16 = 0xc106;
/// HID-style GET_REPORT, which the dongle rejects.
pub const REQ_GET_REPORT: u16 = 0xa101;

/// Length 8, type 0x42, accessory id 0x0001, type 0x03, subtype 0x00, input report 6 bytes,
/// output report 0 bytes.
pub const ACCESSORY_DESCRIPTOR: [u8; 8] = [0x08, 0x42, 0x00, 0x01, 0x03, 0x00, 0x06, 0x00];

/// Bytes written to the data buffer of a rejected GET_REPORT.
pub const GET_REPORT_FILLER: [u8; 6] = [0xFF; 6];

/// Interrupt IN report: no button held.
pub const CONTROLLER_REPORT: [u8; 6] = [0x00, 0x06, 0xa7, 0x0A, 0x40, 0x00];

const REPORT_ENDPOINT: u8 = 1;

static REPORT_ENDPOINTS: [EndpointDescriptor; 1] = [EndpointDescriptor {
    address: 0x80 | REPORT_ENDPOINT,
    attributes: ENDPOINT_XFER_INT,
    max_packet_size: 8,
    interval: 16,
}];

static INTERFACES: [InterfaceDescriptor; 2] = [
    InterfaceDescriptor {
        number: 0,
        alternate_setting: 0,
        class: 0x58,
        subclass: 0x42,
        protocol: 0,
        endpoints: &REPORT_ENDPOINTS,
    },
    InterfaceDescriptor {
        number: 1,
        alternate_setting: 0,
        class: 0x59,
        subclass: 0,
        protocol: 0,
        endpoints: &[],
    },
];

pub static DESCRIPTORS: UsbDescriptors = UsbDescriptors {
    device: DeviceDescriptor {
        bcd_usb: 0x0110,
        class: 0,
        subclass: 0,
        protocol: 0,
        max_packet_size0: 64,
        vendor_id: DVD_KIT_VENDOR_ID,
        product_id: DVD_KIT_PRODUCT_ID,
        bcd_device: 0x0100,
        manufacturer: 0,
        product: 0,
        serial_number: 0,
    },
    configuration: ConfigurationDescriptor {
        num_interfaces: 2,
        value: 1,
        attributes: 0,
        max_power: 0,
        interfaces: &INTERFACES,
    },
    strings: &[],
};

struct DvdKitControl {
    standard: StandardRequests,
    firmware: FirmwareStore,
}

impl ControlHandler for DvdKitControl {
    fn handle_control(
        &mut self,
        setup: SetupPacket,
        data: &mut [u8],
    ) -> Option<ControlCompletion> {
        if let Some(completion) = self.standard.handle(setup, data) {
            return Some(completion);
        }

        match setup.control_request() {
            REQ_FIRMWARE_READ | REQ_FIRMWARE_READ_ALT => {
                let length = usize::from(setup.length).min(data.len());
                let copied = match self.firmware.page(setup.value, length) {
                    Some(page) => {
                        data[..page.len()].copy_from_slice(page);
                        page.len()
                    }
                    None => 0,
                };
                trace!(page = setup.value, length, copied, "firmware read");
                Some(ControlCompletion::success(copied))
            }
            REQ_GET_ACCESSORY_DESCRIPTOR => {
                let len = ACCESSORY_DESCRIPTOR.len().min(data.len());
                data[..len].copy_from_slice(&ACCESSORY_DESCRIPTOR[..len]);
                Some(ControlCompletion::success(len))
            }
            REQ_GET_REPORT => {
                let len = GET_REPORT_FILLER.len().min(data.len());
                data[..len].copy_from_slice(&GET_REPORT_FILLER[..len]);
                debug!("GET_REPORT rejected");
                Some(ControlCompletion::stall())
            }
            _ => None,
        }
    }
}

pub struct XboxDvdPlaybackKit {
    pipe: ControlPipe,
    control: DvdKitControl,
}

impl XboxDvdPlaybackKit {
    /// Loads the firmware named by `config` and builds the device.
    pub fn realize(config: &DvdPlaybackKitConfig) -> Result<Self, FirmwareError> {
        let path = config.firmware_path().ok_or(FirmwareError::MissingPath)?;
        let firmware = FirmwareStore::load(path)?;
        Ok(Self::with_firmware(firmware))
    }

    pub fn with_firmware(firmware: FirmwareStore) -> Self {
        Self {
            pipe: ControlPipe::new(),
            control: DvdKitControl {
                standard: StandardRequests::new(&DESCRIPTORS),
                firmware,
            },
        }
    }

    pub fn firmware(&self) -> &FirmwareStore {
        &self.control.firmware
    }

    pub fn configuration(&self) -> u8 {
        self.control.standard.configuration()
    }

    /// Request-level control dispatch; see [`ControlHandler::handle_control`].
    pub fn handle_control(
        &mut self,
        setup: SetupPacket,
        data: &mut [u8],
    ) -> Option<ControlCompletion> {
        self.control.handle_control(setup, data)
    }
}

impl UsbDevice for XboxDvdPlaybackKit {
    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }

    fn reset(&mut self) {
        self.pipe.reset();
        self.control.standard.reset();
    }

    fn address(&self) -> u8 {
        self.pipe.address()
    }

    fn handle_setup(&mut self, setup: SetupPacket) {
        self.pipe.handle_setup(setup, &mut self.control);
    }

    fn handle_out(&mut self, ep: u8, data: &[u8]) -> UsbHandshake {
        if ep == 0 {
            return self.pipe.handle_out(data, &mut self.control);
        }
        trace!(ep, len = data.len(), "discarding OUT data");
        UsbHandshake::Ack { bytes: data.len() }
    }

    fn handle_in(&mut self, ep: u8, buf: &mut [u8]) -> UsbHandshake {
        match ep {
            0 => self.pipe.handle_in(buf),
            REPORT_ENDPOINT => {
                let len = CONTROLLER_REPORT.len().min(buf.len());
                buf[..len].copy_from_slice(&CONTROLLER_REPORT[..len]);
                UsbHandshake::Ack { bytes: len }
            }
            _ => UsbHandshake::Stall,
        }
    }
}
