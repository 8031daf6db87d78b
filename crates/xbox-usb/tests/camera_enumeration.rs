mod util;

use xbox_usb::camera::{CAMERA_PRODUCT_ID, CAMERA_VENDOR_ID};
use xbox_usb::usb::{UsbDevice, UsbHandshake};
use xbox_usb::XboxCamera;

use util::{control_in, control_out, setup, try_control_in};

fn utf16_string(desc: &[u8]) -> String {
    let units: Vec<u16> = desc[2..]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).unwrap()
}

#[test]
fn device_descriptor_identifies_the_camera() {
    let mut dev = XboxCamera::new();
    let desc = control_in(&mut dev, setup(0x80, 0x06, 0x0100, 0, 18));
    assert_eq!(desc.len(), 18);
    assert_eq!(&desc[..2], &[18, 0x01]);
    assert_eq!(u16::from_le_bytes([desc[2], desc[3]]), 0x0110);
    assert_eq!(desc[7], 8);
    assert_eq!(u16::from_le_bytes([desc[8], desc[9]]), CAMERA_VENDOR_ID);
    assert_eq!(u16::from_le_bytes([desc[10], desc[11]]), CAMERA_PRODUCT_ID);
    assert_eq!((CAMERA_VENDOR_ID, CAMERA_PRODUCT_ID), (0x045e, 0x028c));

    // A short read is truncated to wLength.
    assert_eq!(control_in(&mut dev, setup(0x80, 0x06, 0x0100, 0, 8)), desc[..8].to_vec());
}

#[test]
fn configuration_descriptor_lists_five_alternate_settings() {
    let mut dev = XboxCamera::new();
    let desc = control_in(&mut dev, setup(0x80, 0x06, 0x0200, 0, 0xff));
    assert_eq!(desc.len(), 9 + 5 * (9 + 7));
    assert_eq!(usize::from(u16::from_le_bytes([desc[2], desc[3]])), desc.len());
    assert_eq!(desc[4], 1);
    assert_eq!(desc[7], 0x80);
    assert_eq!(desc[8], 0xfa);

    let mps: Vec<u16> = desc[9..]
        .chunks_exact(16)
        .map(|iface| {
            assert_eq!(iface[5], 0xff);
            assert_eq!(&iface[11..13], &[0x81, 0x01]);
            u16::from_le_bytes([iface[13], iface[14]])
        })
        .collect();
    assert_eq!(mps, vec![0, 384, 512, 768, 896]);
}

#[test]
fn string_descriptors() {
    let mut dev = XboxCamera::new();
    let manufacturer = control_in(&mut dev, setup(0x80, 0x06, 0x0301, 0x0409, 0xff));
    assert_eq!(utf16_string(&manufacturer), "Microsoft");
    let product = control_in(&mut dev, setup(0x80, 0x06, 0x0302, 0x0409, 0xff));
    assert_eq!(utf16_string(&product), "Xbox Video Camera");

    assert_eq!(
        try_control_in(&mut dev, setup(0x80, 0x06, 0x0303, 0x0409, 0xff)),
        Err(UsbHandshake::Stall)
    );
}

#[test]
fn enumerate_and_select_bandwidth() {
    util::init_tracing();
    let mut dev = XboxCamera::new();

    assert_eq!(control_out(&mut dev, setup(0x00, 0x05, 7, 0, 0), &[]), UsbHandshake::Ack { bytes: 0 });
    assert_eq!(dev.address(), 7);

    assert_eq!(control_out(&mut dev, setup(0x00, 0x09, 1, 0, 0), &[]), UsbHandshake::Ack { bytes: 0 });
    assert_eq!(dev.configuration(), 1);
    assert_eq!(dev.alternate_setting(), Some(0));

    assert_eq!(control_out(&mut dev, setup(0x01, 0x0B, 3, 0, 0), &[]), UsbHandshake::Ack { bytes: 0 });
    assert_eq!(control_in(&mut dev, setup(0x81, 0x0A, 0, 0, 1)), vec![3]);

    // There is no alternate setting 5.
    assert_eq!(control_out(&mut dev, setup(0x01, 0x0B, 5, 0, 0), &[]), UsbHandshake::Stall);
    assert_eq!(dev.alternate_setting(), Some(3));

    dev.reset();
    assert_eq!(dev.address(), 0);
    assert_eq!(dev.configuration(), 0);
    assert_eq!(dev.alternate_setting(), None);
}

#[test]
fn unknown_vendor_request_stalls() {
    let mut dev = XboxCamera::new();
    assert_eq!(
        try_control_in(&mut dev, setup(0xc1, 0x02, 0, 0, 4)),
        Err(UsbHandshake::Stall)
    );
    // The pipe recovers on the next SETUP.
    assert_eq!(control_in(&mut dev, setup(0xc1, 0x01, 0, 0, 2)), vec![0xc0, 0xc0]);
}
