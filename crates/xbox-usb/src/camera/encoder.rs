//! Synthetic camera image and frame compression.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use thiserror::Error;

pub const FRAME_WIDTH: u32 = 320;
pub const FRAME_HEIGHT: u32 = 240;

/// JPEG quality the guest driver's decoder was tuned against.
pub const JPEG_QUALITY: u8 = 44;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("JPEG encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Compresses one raw frame into the byte stream carried by the isochronous endpoint.
pub trait FrameEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<u8>, EncodeError>;
}

/// Baseline JPEG at [`JPEG_QUALITY`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegFrameEncoder;

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(image)?;
        Ok(out)
    }
}

/// Moving gradient: red ramps left to right and scrolls by one step per frame, green ramps top
/// to bottom, blue is off.
#[derive(Debug, Default, Clone)]
pub struct TestPattern {
    frame_id: u8,
}

impl TestPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_id(&self) -> u8 {
        self.frame_id
    }

    pub fn next_frame(&mut self) -> RgbImage {
        let frame_id = self.frame_id;
        let image = RgbImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
            let red = (255 * x / FRAME_WIDTH) as u8;
            let green = (255 * y / FRAME_HEIGHT) as u8;
            Rgb([red.wrapping_add(frame_id), green, 0])
        });
        self.frame_id = self.frame_id.wrapping_add(1);
        image
    }
}
