//! Device selection by driver name.

use serde::{Deserialize, Serialize};

use crate::camera::{self, XboxCamera};
use crate::dvd_kit::config::DvdPlaybackKitConfig;
use crate::dvd_kit::firmware::FirmwareError;
use crate::dvd_kit::{self, XboxDvdPlaybackKit};
use crate::usb::UsbDevice;

/// One emulated peripheral, e.g. `{ "driver": "xbox_dvd_playback_kit", "file": "dvd.bin" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum XboxUsbDeviceConfig {
    XboxCamera,
    XboxDvdPlaybackKit(DvdPlaybackKitConfig),
}

impl XboxUsbDeviceConfig {
    pub fn product_description(&self) -> &'static str {
        match self {
            XboxUsbDeviceConfig::XboxCamera => camera::PRODUCT_DESCRIPTION,
            XboxUsbDeviceConfig::XboxDvdPlaybackKit(_) => dvd_kit::PRODUCT_DESCRIPTION,
        }
    }

    pub fn build(&self) -> Result<Box<dyn UsbDevice>, FirmwareError> {
        Ok(match self {
            XboxUsbDeviceConfig::XboxCamera => Box::new(XboxCamera::new()),
            XboxUsbDeviceConfig::XboxDvdPlaybackKit(config) => {
                Box::new(XboxDvdPlaybackKit::realize(config)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_names() {
        let camera: XboxUsbDeviceConfig =
            serde_json::from_str(r#"{ "driver": "xbox_camera" }"#).unwrap();
        assert_eq!(camera, XboxUsbDeviceConfig::XboxCamera);
        assert_eq!(camera.product_description(), "Microsoft Xbox Camera");

        let dvd: XboxUsbDeviceConfig =
            serde_json::from_str(r#"{ "driver": "xbox_dvd_playback_kit", "file": "dvd.bin" }"#)
                .unwrap();
        assert_eq!(dvd.product_description(), "Microsoft Xbox DVD Playback Kit");

        assert!(serde_json::from_str::<XboxUsbDeviceConfig>(r#"{ "driver": "xbox_hub" }"#).is_err());
    }

    #[test]
    fn dvd_kit_without_firmware_fails_to_build() {
        let config = XboxUsbDeviceConfig::XboxDvdPlaybackKit(DvdPlaybackKitConfig::new());
        assert!(matches!(config.build(), Err(FirmwareError::MissingPath)));
    }

    #[test]
    fn camera_builds_as_a_full_speed_device() {
        let dev = XboxUsbDeviceConfig::XboxCamera.build().unwrap();
        assert_eq!(dev.speed(), crate::usb::UsbSpeed::Full);
        assert!(dev.as_any().is::<XboxCamera>());
    }
}
