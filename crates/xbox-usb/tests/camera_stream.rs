mod util;

use xbox_usb::camera::stream::{
    StreamState, FIRST_CHUNK_LEN, FRAME_FOOTER, FRAME_HEADER, PACKET_LEN,
};
use xbox_usb::usb::{UsbDevice, UsbHandshake};
use xbox_usb::XboxCamera;

use util::FixedFrame;

const HEADER_MAGIC: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
];
const FOOTER_MAGIC: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0x51, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
];

fn camera_with_frame(len: usize) -> XboxCamera {
    let frame = (0..len).map(|i| (i % 199) as u8).collect();
    XboxCamera::with_encoder(Box::new(FixedFrame(frame)))
}

#[test]
fn magic_markers() {
    assert_eq!(FRAME_HEADER, HEADER_MAGIC);
    assert_eq!(FRAME_FOOTER, FOOTER_MAGIC);
}

#[test]
fn full_frame_cycle_takes_31_polls() {
    util::init_tracing();
    // Header packet plus 23 full body packets.
    let len = FIRST_CHUNK_LEN + 23 * PACKET_LEN;
    let mut dev = camera_with_frame(len);
    let mut buf = [0u8; PACKET_LEN];

    assert_eq!(dev.handle_in(1, &mut buf), UsbHandshake::Ack { bytes: PACKET_LEN });
    assert_eq!(&buf[..16], &HEADER_MAGIC);
    assert_eq!(&buf[16..], &dev.stream().frame()[..FIRST_CHUNK_LEN]);

    let mut last_offset = FIRST_CHUNK_LEN;
    for call in 2..=24 {
        assert_eq!(
            dev.handle_in(1, &mut buf),
            UsbHandshake::Ack { bytes: PACKET_LEN },
            "call {call}"
        );
        let offset = dev.stream_state().offset().unwrap();
        assert!(offset > last_offset);
        assert_eq!(&buf[..], &dev.stream().frame()[last_offset..offset]);
        last_offset = offset;
    }
    assert_eq!(last_offset, len);
    assert_eq!(dev.stream_state().counter(), 24);

    assert_eq!(dev.handle_in(1, &mut buf), UsbHandshake::Ack { bytes: PACKET_LEN });
    assert_eq!(&buf[..16], &FOOTER_MAGIC);
    assert_eq!(dev.stream_state().counter(), 25);

    for call in 26..=30 {
        assert_eq!(dev.handle_in(1, &mut buf), UsbHandshake::Nak, "call {call}");
    }
    assert_eq!(dev.stream_state(), StreamState::Rewind);
    assert_eq!(dev.stream_state().counter(), 30);

    assert_eq!(dev.handle_in(1, &mut buf), UsbHandshake::Nak);
    assert_eq!(dev.stream_state(), StreamState::FrameStart);

    assert!(dev.handle_in(1, &mut buf).is_ack());
    assert_eq!(&buf[..16], &HEADER_MAGIC);
}

#[test]
fn packets_always_report_full_length() {
    let mut dev = camera_with_frame(40);
    let mut buf = [0u8; PACKET_LEN];

    assert_eq!(dev.handle_in(1, &mut buf), UsbHandshake::Ack { bytes: PACKET_LEN });
    assert_eq!(&buf[16..56], &dev.stream().frame()[..]);
    assert_eq!(dev.handle_in(1, &mut buf), UsbHandshake::Ack { bytes: PACKET_LEN });
    assert_eq!(&buf[..16], &FOOTER_MAGIC);
    // The footer leaves the previous frame bytes behind it.
    assert_eq!(&buf[16..40], &dev.stream().frame()[..24]);
}

#[test]
fn reset_restarts_the_frame() {
    let mut dev = camera_with_frame(FIRST_CHUNK_LEN + 3 * PACKET_LEN);
    let mut buf = [0u8; PACKET_LEN];
    dev.handle_in(1, &mut buf);
    dev.handle_in(1, &mut buf);
    assert!(matches!(dev.stream_state(), StreamState::Body { packet: 2, .. }));

    dev.reset();
    assert_eq!(dev.stream_state(), StreamState::FrameStart);
    dev.handle_in(1, &mut buf);
    assert_eq!(&buf[..16], &HEADER_MAGIC);
}

#[test]
fn video_out_is_discarded() {
    let mut dev = camera_with_frame(100);
    assert_eq!(dev.handle_out(1, &[1, 2, 3]), UsbHandshake::Ack { bytes: 3 });
    assert_eq!(dev.stream_state(), StreamState::FrameStart);
    assert_eq!(dev.handle_in(2, &mut [0u8; 8]), UsbHandshake::Stall);
}

#[test]
fn default_encoder_streams_jpeg() {
    let mut dev = XboxCamera::new();
    let mut buf = [0u8; PACKET_LEN];
    dev.handle_in(1, &mut buf);
    assert_eq!(&buf[..16], &HEADER_MAGIC);
    // SOI marker right after the frame header.
    assert_eq!(&buf[16..18], &[0xFF, 0xD8]);
    assert!(dev.stream().frame().len() > FIRST_CHUNK_LEN);
}
