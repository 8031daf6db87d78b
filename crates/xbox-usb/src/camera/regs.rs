//! Bridge and sensor register files.
//!
//! The bridge exposes a single-register read port and a write port over vendor control requests.
//! The sensor sits behind the bridge on an I2C bus: the guest loads the bus address and data
//! registers, then writes a command to [`REG_I2C_COMMAND`] to move one byte across.

use tracing::debug;

pub const REGISTER_FILE_LEN: usize = 0x100;

/// Sensor register the next I2C write targets.
pub const REG_I2C_WRITE_ADDRESS: u8 = 0x42;
/// Sensor register the next I2C read fetches.
pub const REG_I2C_READ_ADDRESS: u8 = 0x43;
/// Data byte moved by an I2C transaction.
pub const REG_I2C_DATA: u8 = 0x45;
/// Writing here with a recognized command byte runs an I2C transaction.
pub const REG_I2C_COMMAND: u8 = 0x47;

const I2C_COMMAND_WRITE: u8 = 1;
const I2C_COMMAND_READ: u8 = 5;

/// Power-on contents of the bridge register file.
pub const BRIDGE_DEFAULTS: [u8; REGISTER_FILE_LEN] = [
    0xc0, 0x00, 0xa8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    0x14, 0x1e, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x44, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x08, 0x98, 0xff, 0x00, 0x03, 0x00, 0x00, 0x1e, 0x01, 0xf1, 0x00, 0x01, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0xff, 0x50, 0x51, 0x52, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x3b, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0xff, 0x00, 0x01, 0x00, 0x21, 0x00, 0x02, 0x6d, 0x0e, 0x00, 0x02, 0x00, 0x11,
    0x00, 0x00, 0x0f, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xb4, 0x00, 0xff, 0x00, 0xff, 0x00, 0x00, 0xff, 0x03, 0x03, 0xfc, 0x00, 0xff, 0x00, 0x00, 0xff,
    0x00, 0x00, 0xff, 0x00, 0xff, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00, 0x7f, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x33, 0x04, 0x40, 0x40, 0x0c, 0x3f, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x0a, 0x0f, 0x1e, 0x2d, 0xff, 0x00, 0xff, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x02, 0x03, 0x00, 0x05, 0x02, 0x07, 0x00, 0x09, 0x02, 0x0b, 0x00, 0x0d, 0x02, 0x0f,
    0x00, 0x11, 0x02, 0x13, 0x00, 0x15, 0x02, 0x17, 0x00, 0x19, 0x02, 0x1b, 0x00, 0x1d, 0x02, 0x1f,
    0x50, 0x64, 0x82, 0x96, 0x82, 0x81, 0x00, 0x01, 0x02, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x20, 0x40, 0x60, 0x80, 0xa0, 0xc0, 0xe0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Power-on contents of the image sensor register file.
pub const SENSOR_DEFAULTS: [u8; REGISTER_FILE_LEN] = [
    0x00, 0x84, 0x84, 0x84, 0x34, 0x3e, 0x80, 0x8c, 0x00, 0x00, 0x76, 0x48, 0x7b, 0x5b, 0x00, 0x98,
    0x57, 0x00, 0x14, 0xa3, 0x04, 0x00, 0x00, 0x1a, 0xba, 0x03, 0xf3, 0x00, 0x7f, 0xa2, 0x00, 0x01,
    0xc0, 0x80, 0x80, 0xde, 0x10, 0x8a, 0xa2, 0xe2, 0x20, 0x00, 0x00, 0x00, 0x88, 0x81, 0x00, 0x94,
    0x40, 0xa0, 0xc0, 0x16, 0x16, 0x00, 0x00, 0x82, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xca, 0x00,
    0x06, 0xe0, 0x88, 0x11, 0x89, 0x02, 0x55, 0x01, 0x7a, 0x04, 0x00, 0x00, 0x11, 0x01, 0x06, 0x00,
    0x01, 0x00, 0x10, 0x50, 0x20, 0x02, 0x00, 0xf3, 0x80, 0x80, 0x80, 0x00, 0x00, 0x47, 0x27, 0x8a,
    0x83, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x01, 0x83, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1f, 0x1f,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x82, 0x00,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x7e, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x83, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x75, 0x75, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum I2cCommand {
    /// Bridge data register → sensor.
    Write,
    /// Sensor → bridge data register.
    Read,
}

/// What a bridge register write does beyond storing its byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterWrite {
    Plain,
    Relay(I2cCommand),
}

impl RegisterWrite {
    /// Classifies a write of `payload` to the raw 16-bit `wIndex`. Only an exact match on the
    /// command register relays; aliases such as 0x0147 are plain stores.
    pub fn classify(index: u16, payload: u8) -> Self {
        if index != u16::from(REG_I2C_COMMAND) {
            return RegisterWrite::Plain;
        }
        match payload {
            I2C_COMMAND_WRITE => RegisterWrite::Relay(I2cCommand::Write),
            I2C_COMMAND_READ => RegisterWrite::Relay(I2cCommand::Read),
            _ => RegisterWrite::Plain,
        }
    }
}

/// The bridge ("controller") and sensor register files of one camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    bridge: [u8; REGISTER_FILE_LEN],
    sensor: [u8; REGISTER_FILE_LEN],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            bridge: BRIDGE_DEFAULTS,
            sensor: SENSOR_DEFAULTS,
        }
    }

    /// Restores both files to their power-on contents.
    pub fn reset(&mut self) {
        self.bridge = BRIDGE_DEFAULTS;
        self.sensor = SENSOR_DEFAULTS;
    }

    pub fn bridge(&self) -> &[u8; REGISTER_FILE_LEN] {
        &self.bridge
    }

    pub fn sensor(&self) -> &[u8; REGISTER_FILE_LEN] {
        &self.sensor
    }

    pub fn bridge_reg(&self, index: u8) -> u8 {
        self.bridge[usize::from(index)]
    }

    pub fn sensor_reg(&self, index: u8) -> u8 {
        self.sensor[usize::from(index)]
    }

    /// Stores `payload` in bridge register `index & 0xFF`, running the I2C relay first when the
    /// write is an I2C command. The relay uses the address/data registers as they were before
    /// this write.
    pub fn write(&mut self, index: u16, payload: u8) -> RegisterWrite {
        let op = RegisterWrite::classify(index, payload);
        if let RegisterWrite::Relay(cmd) = op {
            self.relay(cmd);
        }
        self.bridge[usize::from(index & 0xFF)] = payload;
        op
    }

    fn relay(&mut self, cmd: I2cCommand) {
        match cmd {
            I2cCommand::Write => {
                let addr = self.bridge_reg(REG_I2C_WRITE_ADDRESS);
                let value = self.bridge_reg(REG_I2C_DATA);
                debug!(addr, value, "i2c write");
                self.sensor[usize::from(addr)] = value;
            }
            I2cCommand::Read => {
                let addr = self.bridge_reg(REG_I2C_READ_ADDRESS);
                let value = self.sensor_reg(addr);
                debug!(addr, value, "i2c read");
                self.bridge[usize::from(REG_I2C_DATA)] = value;
            }
        }
    }

    /// Fills `out` with copies of bridge register `index`. The read port does not
    /// auto-increment.
    pub fn read(&self, index: u8, out: &mut [u8]) {
        out.fill(self.bridge_reg(index));
    }
}
