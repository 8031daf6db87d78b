#![allow(dead_code)]

use image::RgbImage;
use xbox_usb::camera::encoder::{EncodeError, FrameEncoder};
use xbox_usb::usb::{SetupPacket, UsbDevice, UsbHandshake};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn setup(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> SetupPacket {
    SetupPacket {
        request_type,
        request,
        value,
        index,
        length,
    }
}

/// Runs a control IN transfer in 64-byte packets. Returns the handshake that ended it early if the
/// device stalled.
pub fn try_control_in(dev: &mut dyn UsbDevice, setup: SetupPacket) -> Result<Vec<u8>, UsbHandshake> {
    dev.handle_setup(setup);

    let mut out = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        match dev.handle_in(0, &mut buf) {
            UsbHandshake::Ack { bytes } => {
                out.extend_from_slice(&buf[..bytes]);
                if bytes < buf.len() {
                    break;
                }
            }
            UsbHandshake::Nak => break,
            other => return Err(other),
        }
    }

    // Status stage (OUT ZLP).
    assert!(matches!(dev.handle_out(0, &[]), UsbHandshake::Ack { .. }));
    Ok(out)
}

pub fn control_in(dev: &mut dyn UsbDevice, setup: SetupPacket) -> Vec<u8> {
    try_control_in(dev, setup).expect("expected control IN data")
}

/// Runs a control OUT transfer and returns the status-stage handshake.
pub fn control_out(dev: &mut dyn UsbDevice, setup: SetupPacket, data: &[u8]) -> UsbHandshake {
    dev.handle_setup(setup);
    for chunk in data.chunks(8) {
        match dev.handle_out(0, chunk) {
            UsbHandshake::Ack { .. } => {}
            other => return other,
        }
    }
    dev.handle_in(0, &mut [])
}

/// Returns the same bytes for every frame.
pub struct FixedFrame(pub Vec<u8>);

impl FrameEncoder for FixedFrame {
    fn encode(&mut self, _image: &RgbImage) -> Result<Vec<u8>, EncodeError> {
        Ok(self.0.clone())
    }
}
