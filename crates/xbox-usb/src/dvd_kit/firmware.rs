//! Firmware image served to the guest in 1 KiB pages.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

/// Size of the firmware buffer on the real accessory.
pub const FIRMWARE_CAPACITY: usize = 0x40000;

/// Page granularity of firmware reads (`wValue` is a page number).
pub const PAGE_LEN: usize = 0x400;

#[derive(Debug, Error)]
pub enum FirmwareError {
    #[error("firmware file is required")]
    MissingPath,
    #[error("unable to access \"{}\"", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only firmware image, at most [`FIRMWARE_CAPACITY`] bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirmwareStore {
    data: Vec<u8>,
}

impl FirmwareStore {
    /// Reads the image at `path`. Anything past [`FIRMWARE_CAPACITY`] is dropped.
    pub fn load(path: &Path) -> Result<Self, FirmwareError> {
        let io_err = |source| FirmwareError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut data = Vec::new();
        file.take(FIRMWARE_CAPACITY as u64 + 1)
            .read_to_end(&mut data)
            .map_err(io_err)?;

        if data.len() > FIRMWARE_CAPACITY {
            warn!(
                path = %path.display(),
                capacity = FIRMWARE_CAPACITY,
                "firmware image larger than the accessory buffer; truncating"
            );
            data.truncate(FIRMWARE_CAPACITY);
        }
        info!(path = %path.display(), len = data.len(), "loaded DVD playback kit firmware");
        Ok(Self { data })
    }

    /// Builds a store from an in-memory image, truncated to [`FIRMWARE_CAPACITY`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len().min(FIRMWARE_CAPACITY);
        Self {
            data: bytes[..len].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// `length` bytes starting at page `page`, or `None` if any of them lies past the end of
    /// the image.
    pub fn page(&self, page: u16, length: usize) -> Option<&[u8]> {
        let offset = PAGE_LEN.checked_mul(usize::from(page))?;
        let end = offset.checked_add(length)?;
        self.data.get(offset..end)
    }
}
