//! Static descriptor tables and chapter 9 standard requests.

use crate::control::ControlCompletion;
use crate::usb::SetupPacket;

const REQ_GET_STATUS: u8 = 0x00;
const REQ_CLEAR_FEATURE: u8 = 0x01;
const REQ_SET_FEATURE: u8 = 0x03;
const REQ_GET_DESCRIPTOR: u8 = 0x06;
const REQ_GET_CONFIGURATION: u8 = 0x08;
const REQ_SET_CONFIGURATION: u8 = 0x09;
const REQ_GET_INTERFACE: u8 = 0x0A;
const REQ_SET_INTERFACE: u8 = 0x0B;

const FEATURE_ENDPOINT_HALT: u16 = 0x0000;
const FEATURE_DEVICE_REMOTE_WAKEUP: u16 = 0x0001;

const DESC_DEVICE: u8 = 0x01;
const DESC_CONFIGURATION: u8 = 0x02;
const DESC_STRING: u8 = 0x03;
const DESC_INTERFACE: u8 = 0x04;
const DESC_ENDPOINT: u8 = 0x05;

const LANGID_EN_US: u16 = 0x0409;

const MAX_INTERFACES: usize = 8;

pub const CLASS_VENDOR_SPECIFIC: u8 = 0xFF;

pub const ENDPOINT_XFER_ISOC: u8 = 0x01;
pub const ENDPOINT_XFER_INT: u8 = 0x03;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub number: u8,
    pub alternate_setting: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub endpoints: &'static [EndpointDescriptor],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigurationDescriptor {
    pub num_interfaces: u8,
    pub value: u8,
    pub attributes: u8,
    pub max_power: u8,
    /// Every interface/alternate-setting pair, in wire order.
    pub interfaces: &'static [InterfaceDescriptor],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub bcd_usb: u16,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub max_packet_size0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bcd_device: u16,
    pub manufacturer: u8,
    pub product: u8,
    pub serial_number: u8,
}

/// Everything a device reports during enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsbDescriptors {
    pub device: DeviceDescriptor,
    pub configuration: ConfigurationDescriptor,
    /// String table; index 0 is the language ID slot and is never read.
    pub strings: &'static [&'static str],
}

impl UsbDescriptors {
    pub fn device_descriptor(&self) -> [u8; 18] {
        let d = &self.device;
        let [u0, u1] = d.bcd_usb.to_le_bytes();
        let [v0, v1] = d.vendor_id.to_le_bytes();
        let [p0, p1] = d.product_id.to_le_bytes();
        let [r0, r1] = d.bcd_device.to_le_bytes();
        [
            18,
            DESC_DEVICE,
            u0,
            u1,
            d.class,
            d.subclass,
            d.protocol,
            d.max_packet_size0,
            v0,
            v1,
            p0,
            p1,
            r0,
            r1,
            d.manufacturer,
            d.product,
            d.serial_number,
            1, // bNumConfigurations
        ]
    }

    pub fn configuration_descriptor(&self) -> Vec<u8> {
        let c = &self.configuration;
        let mut out = vec![
            9,
            DESC_CONFIGURATION,
            0, // wTotalLength, patched below
            0,
            c.num_interfaces,
            c.value,
            0, // iConfiguration
            c.attributes,
            c.max_power,
        ];
        for iface in c.interfaces {
            out.extend_from_slice(&[
                9,
                DESC_INTERFACE,
                iface.number,
                iface.alternate_setting,
                iface.endpoints.len() as u8,
                iface.class,
                iface.subclass,
                iface.protocol,
                0, // iInterface
            ]);
            for ep in iface.endpoints {
                let [m0, m1] = ep.max_packet_size.to_le_bytes();
                out.extend_from_slice(&[7, DESC_ENDPOINT, ep.address, ep.attributes, m0, m1, ep.interval]);
            }
        }
        let [t0, t1] = (out.len() as u16).to_le_bytes();
        out[2] = t0;
        out[3] = t1;
        out
    }

    pub fn string_descriptor(&self, index: u8) -> Option<Vec<u8>> {
        if index == 0 {
            let [l0, l1] = LANGID_EN_US.to_le_bytes();
            return Some(vec![4, DESC_STRING, l0, l1]);
        }
        let s = self.strings.get(usize::from(index)).filter(|s| !s.is_empty())?;
        let mut out = vec![0, DESC_STRING];
        for ch in s.encode_utf16() {
            out.extend_from_slice(&ch.to_le_bytes());
        }
        out[0] = out.len() as u8;
        Some(out)
    }

    fn has_interface(&self, number: u8, alternate_setting: u8) -> bool {
        self.configuration
            .interfaces
            .iter()
            .any(|i| i.number == number && i.alternate_setting == alternate_setting)
    }

    fn has_endpoint(&self, address: u8) -> bool {
        self.configuration
            .interfaces
            .iter()
            .flat_map(|i| i.endpoints)
            .any(|ep| ep.address == address)
    }
}

/// Standard-request state of one device: configuration, alternate settings and remote wakeup.
#[derive(Debug)]
pub struct StandardRequests {
    descriptors: &'static UsbDescriptors,
    configuration: u8,
    alternate_settings: [u8; MAX_INTERFACES],
    remote_wakeup_enabled: bool,
}

impl StandardRequests {
    pub fn new(descriptors: &'static UsbDescriptors) -> Self {
        Self {
            descriptors,
            configuration: 0,
            alternate_settings: [0; MAX_INTERFACES],
            remote_wakeup_enabled: false,
        }
    }

    pub fn descriptors(&self) -> &'static UsbDescriptors {
        self.descriptors
    }

    pub fn configuration(&self) -> u8 {
        self.configuration
    }

    pub fn alternate_setting(&self, interface: u8) -> Option<u8> {
        if self.configuration == 0 || interface >= self.descriptors.configuration.num_interfaces {
            return None;
        }
        self.alternate_settings.get(usize::from(interface)).copied()
    }

    pub fn reset(&mut self) {
        self.configuration = 0;
        self.alternate_settings = [0; MAX_INTERFACES];
        self.remote_wakeup_enabled = false;
    }

    /// Handles a standard request. Returns `None` for anything that is not one, so the caller
    /// can try its vendor/class requests next.
    pub fn handle(&mut self, setup: SetupPacket, data: &mut [u8]) -> Option<ControlCompletion> {
        let completion = match (setup.request_type, setup.request) {
            (0x80, REQ_GET_DESCRIPTOR) => {
                let desc_type = (setup.value >> 8) as u8;
                let index = (setup.value & 0xFF) as u8;
                let desc = match desc_type {
                    DESC_DEVICE => Some(self.descriptors.device_descriptor().to_vec()),
                    DESC_CONFIGURATION => Some(self.descriptors.configuration_descriptor()),
                    DESC_STRING => self.descriptors.string_descriptor(index),
                    _ => None,
                };
                match desc {
                    Some(desc) => respond(setup, data, &desc),
                    None => ControlCompletion::stall(),
                }
            }
            (0x80, REQ_GET_CONFIGURATION) => respond(setup, data, &[self.configuration]),
            (0x00, REQ_SET_CONFIGURATION) => {
                let value = (setup.value & 0xFF) as u8;
                if value != 0 && value != self.descriptors.configuration.value {
                    return Some(ControlCompletion::stall());
                }
                self.configuration = value;
                self.alternate_settings = [0; MAX_INTERFACES];
                ControlCompletion::success(0)
            }
            (0x80, REQ_GET_STATUS) => {
                let mut status = 0u16;
                if self.descriptors.configuration.attributes & 0x40 != 0 {
                    status |= 1 << 0;
                }
                if self.remote_wakeup_enabled {
                    status |= 1 << 1;
                }
                respond(setup, data, &status.to_le_bytes())
            }
            (0x81, REQ_GET_STATUS) | (0x82, REQ_GET_STATUS) => respond(setup, data, &[0, 0]),
            (0x00, REQ_SET_FEATURE) | (0x00, REQ_CLEAR_FEATURE) => {
                if setup.value != FEATURE_DEVICE_REMOTE_WAKEUP {
                    return Some(ControlCompletion::stall());
                }
                self.remote_wakeup_enabled = setup.request == REQ_SET_FEATURE;
                ControlCompletion::success(0)
            }
            (0x02, REQ_CLEAR_FEATURE) | (0x02, REQ_SET_FEATURE) => {
                // Halt is not modelled; the request is acknowledged on known endpoints only.
                let ep = (setup.index & 0xFF) as u8;
                if setup.value != FEATURE_ENDPOINT_HALT || !self.descriptors.has_endpoint(ep) {
                    return Some(ControlCompletion::stall());
                }
                ControlCompletion::success(0)
            }
            (0x81, REQ_GET_INTERFACE) => {
                match self.alternate_setting((setup.index & 0xFF) as u8) {
                    Some(alt) => respond(setup, data, &[alt]),
                    None => ControlCompletion::stall(),
                }
            }
            (0x01, REQ_SET_INTERFACE) => {
                let interface = (setup.index & 0xFF) as u8;
                let alt = (setup.value & 0xFF) as u8;
                if self.alternate_setting(interface).is_none()
                    || !self.descriptors.has_interface(interface, alt)
                {
                    return Some(ControlCompletion::stall());
                }
                self.alternate_settings[usize::from(interface)] = alt;
                ControlCompletion::success(0)
            }
            _ => return None,
        };
        Some(completion)
    }
}

fn respond(setup: SetupPacket, data: &mut [u8], payload: &[u8]) -> ControlCompletion {
    let len = payload.len().min(usize::from(setup.length)).min(data.len());
    data[..len].copy_from_slice(&payload[..len]);
    ControlCompletion::success(len)
}
