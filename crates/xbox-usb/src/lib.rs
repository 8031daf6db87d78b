//! Emulated first-generation Xbox USB peripherals.
//!
//! Two devices are modelled at the USB transaction level:
//!
//! - [`XboxCamera`]: the Xbox Live video camera. A bridge chip exposes a 256-byte register file
//!   over vendor control requests and relays I2C traffic to the image sensor behind it; frames are
//!   streamed as JPEG over an isochronous IN endpoint.
//! - [`XboxDvdPlaybackKit`]: the DVD remote receiver, which serves the player firmware in 1 KiB
//!   pages over vendor control requests.
//!
//! Both implement [`UsbDevice`] and are meant to be attached to a host controller model that
//! delivers SETUP/IN/OUT tokens one at a time.

pub mod camera;
pub mod config;
pub mod control;
pub mod desc;
pub mod dvd_kit;
pub mod usb;

pub use camera::XboxCamera;
pub use config::XboxUsbDeviceConfig;
pub use control::{ControlCompletion, ControlHandler, ControlStatus};
pub use dvd_kit::XboxDvdPlaybackKit;
pub use usb::{SetupPacket, UsbDevice, UsbHandshake, UsbSpeed};
