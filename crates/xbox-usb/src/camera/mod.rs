//! Xbox Video Camera: a USB bridge chip in front of an image sensor.
//!
//! Endpoint 0 carries vendor register reads/writes to the bridge (see [`regs`]); the sensor is
//! only reachable through the bridge's I2C relay. Endpoint 1 IN streams JPEG frames (see
//! [`stream`]).

pub mod encoder;
pub mod regs;
pub mod stream;

use tracing::{debug, trace};

use crate::control::{ControlCompletion, ControlHandler, ControlPipe};
use crate::desc::{
    ConfigurationDescriptor, DeviceDescriptor, EndpointDescriptor, InterfaceDescriptor,
    StandardRequests, UsbDescriptors, CLASS_VENDOR_SPECIFIC, ENDPOINT_XFER_ISOC,
};
use crate::usb::{SetupPacket, UsbDevice, UsbHandshake};

use self::encoder::{FrameEncoder, JpegFrameEncoder};
use self::regs::RegisterFile;
use self::stream::{FrameStream, StreamState};

pub const CAMERA_VENDOR_ID: u16 = 0x045e;
pub const CAMERA_PRODUCT_ID: u16 = 0x028c;

pub const PRODUCT_DESCRIPTION: &str = "Microsoft Xbox Camera";

/// Vendor OUT request: write one bridge register (`wIndex` = register).
pub const REQ_REGISTER_WRITE: u16 = 0x4101;
/// Vendor IN request: read one bridge register, replicated `wLength` times.
pub const REQ_REGISTER_READ: u16 = 0xc101;

const VIDEO_ENDPOINT: u8 = 1;

const fn video_endpoint(max_packet_size: u16) -> [EndpointDescriptor; 1] {
    [EndpointDescriptor {
        address: 0x80 | VIDEO_ENDPOINT,
        attributes: ENDPOINT_XFER_ISOC,
        max_packet_size,
        interval: 1,
    }]
}

static VIDEO_ALT0: [EndpointDescriptor; 1] = video_endpoint(0);
static VIDEO_ALT1: [EndpointDescriptor; 1] = video_endpoint(384);
static VIDEO_ALT2: [EndpointDescriptor; 1] = video_endpoint(512);
static VIDEO_ALT3: [EndpointDescriptor; 1] = video_endpoint(768);
static VIDEO_ALT4: [EndpointDescriptor; 1] = video_endpoint(896);

const fn video_interface(
    alternate_setting: u8,
    endpoints: &'static [EndpointDescriptor],
) -> InterfaceDescriptor {
    InterfaceDescriptor {
        number: 0,
        alternate_setting,
        class: CLASS_VENDOR_SPECIFIC,
        subclass: 0,
        protocol: 0,
        endpoints,
    }
}

static INTERFACES: [InterfaceDescriptor; 5] = [
    video_interface(0, &VIDEO_ALT0),
    video_interface(1, &VIDEO_ALT1),
    video_interface(2, &VIDEO_ALT2),
    video_interface(3, &VIDEO_ALT3),
    video_interface(4, &VIDEO_ALT4),
];

pub static DESCRIPTORS: UsbDescriptors = UsbDescriptors {
    device: DeviceDescriptor {
        bcd_usb: 0x0110,
        class: 0,
        subclass: 0,
        protocol: 0,
        max_packet_size0: 8,
        vendor_id: CAMERA_VENDOR_ID,
        product_id: CAMERA_PRODUCT_ID,
        bcd_device: 0x0100,
        manufacturer: 1,
        product: 2,
        serial_number: 0,
    },
    configuration: ConfigurationDescriptor {
        num_interfaces: 1,
        value: 1,
        attributes: 0x80,
        max_power: 0xfa,
        interfaces: &INTERFACES,
    },
    strings: &["", "Microsoft", "Xbox Video Camera"],
};

/// Endpoint-0 state of the camera: standard requests plus the bridge register ports.
struct CameraControl {
    standard: StandardRequests,
    registers: RegisterFile,
}

impl ControlHandler for CameraControl {
    fn handle_control(
        &mut self,
        setup: SetupPacket,
        data: &mut [u8],
    ) -> Option<ControlCompletion> {
        if let Some(completion) = self.standard.handle(setup, data) {
            return Some(completion);
        }

        let index = (setup.index & 0xFF) as u8;
        match setup.control_request() {
            REQ_REGISTER_WRITE => {
                let payload = data.first().copied().unwrap_or(0);
                let op = self.registers.write(setup.index, payload);
                debug!(index = setup.index, payload, ?op, "reg_write");
                Some(ControlCompletion::success(1))
            }
            REQ_REGISTER_READ => {
                let len = usize::from(setup.length).min(data.len());
                self.registers.read(index, &mut data[..len]);
                debug!(index, value = self.registers.bridge_reg(index), len, "reg_read");
                Some(ControlCompletion::success(len))
            }
            _ => None,
        }
    }
}

pub struct XboxCamera {
    pipe: ControlPipe,
    control: CameraControl,
    stream: FrameStream,
}

impl Default for XboxCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl XboxCamera {
    pub fn new() -> Self {
        Self::with_encoder(Box::new(JpegFrameEncoder))
    }

    pub fn with_encoder(encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            pipe: ControlPipe::new(),
            control: CameraControl {
                standard: StandardRequests::new(&DESCRIPTORS),
                registers: RegisterFile::new(),
            },
            stream: FrameStream::new(encoder),
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.control.registers
    }

    pub fn stream(&self) -> &FrameStream {
        &self.stream
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    pub fn configuration(&self) -> u8 {
        self.control.standard.configuration()
    }

    /// Alternate setting of the video interface, if configured.
    pub fn alternate_setting(&self) -> Option<u8> {
        self.control.standard.alternate_setting(0)
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

impl UsbDevice for XboxCamera {
    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }

    fn reset(&mut self) {
        debug!("xbox camera reset");
        self.pipe.reset();
        self.control.standard.reset();
        self.control.registers.reset();
        self.stream.reset();
    }

    fn address(&self) -> u8 {
        self.pipe.address()
    }

    fn handle_setup(&mut self, setup: SetupPacket) {
        self.pipe.handle_setup(setup, &mut self.control);
    }

    fn handle_out(&mut self, ep: u8, data: &[u8]) -> UsbHandshake {
        match ep {
            0 => self.pipe.handle_out(data, &mut self.control),
            VIDEO_ENDPOINT => {
                trace!(len = data.len(), "discarding video OUT data");
                UsbHandshake::Ack { bytes: data.len() }
            }
            _ => UsbHandshake::Stall,
        }
    }

    fn handle_in(&mut self, ep: u8, buf: &mut [u8]) -> UsbHandshake {
        match ep {
            0 => self.pipe.handle_in(buf),
            VIDEO_ENDPOINT => self.stream.next_packet(buf),
            _ => UsbHandshake::Stall,
        }
    }
}
