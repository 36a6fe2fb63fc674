//! Wire constants for the ZFM/R30x/R55x/FPM10A protocol family.

/// Start code that opens every frame.
pub const START_CODE: u16 = 0xEF01;

/// Default device address used before any `set_address` call succeeds.
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Default password used before any `set_password` call succeeds.
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Default UART baud rate.
pub const DEFAULT_BAUD: u32 = 57600;

/// Size of the frame header up to and including the length field (start
/// code + address + type + length).
pub const HEADER_SIZE: usize = 9;

/// Size of the trailing checksum field.
pub const CHECKSUM_SIZE: usize = 2;

/// Char buffer identifiers.
pub const BUFFER1: u8 = 0x01;
pub const BUFFER2: u8 = 0x02;

/// Fixed image raster dimensions (spec §4.6).
pub const IMAGE_WIDTH: usize = 256;
pub const IMAGE_HEIGHT: usize = 288;

/// Command op-codes (spec §6).
pub mod opcode {
    pub const VERIFY_PASSWORD: u8 = 0x13;
    pub const SET_PASSWORD: u8 = 0x12;
    pub const SET_ADDRESS: u8 = 0x15;
    pub const SET_SYSTEM_PARAMETER: u8 = 0x0E;
    pub const GET_SYSTEM_PARAMETERS: u8 = 0x0F;
    pub const READ_IMAGE: u8 = 0x01;
    pub const CONVERT_IMAGE: u8 = 0x02;
    pub const CREATE_TEMPLATE: u8 = 0x05;
    pub const STORE_TEMPLATE: u8 = 0x06;
    pub const SEARCH_TEMPLATE: u8 = 0x04;
    pub const LOAD_TEMPLATE: u8 = 0x07;
    pub const DELETE_TEMPLATE: u8 = 0x0C;
    pub const CLEAR_DATABASE: u8 = 0x0D;
    pub const TEMPLATE_COUNT: u8 = 0x1D;
    pub const TEMPLATE_INDEX: u8 = 0x1F;
    pub const COMPARE_CHARACTERISTICS: u8 = 0x03;
    pub const DOWNLOAD_CHARACTERISTICS: u8 = 0x08;
    pub const UPLOAD_CHARACTERISTICS: u8 = 0x09;
    pub const DOWNLOAD_IMAGE: u8 = 0x0A;
    pub const GENERATE_RANDOM_NUMBER: u8 = 0x14;

    /// Not listed in the primary op-code table but present in the original
    /// sensor family's datasheet and exercised by `examples/example_ledcontrol.py`
    /// in the upstream project this crate's protocol is derived from.
    pub const LED_CONTROL: u8 = 0x35;
}

/// Sub-parameter numbers for `SET_SYSTEM_PARAMETER` (spec §4.3).
pub mod sub_param {
    pub const BAUD: u8 = 4;
    pub const SECURITY_LEVEL: u8 = 5;
    pub const PACKET_SIZE: u8 = 6;
}

/// Sensor status codes, the first byte of every ACK payload (spec §6).
pub mod status {
    pub const OK: u8 = 0x00;
    pub const ERROR_COMMUNICATION: u8 = 0x01;
    pub const ERROR_NO_FINGER: u8 = 0x02;
    pub const ERROR_READ_IMAGE: u8 = 0x03;
    pub const ERROR_MESSY_IMAGE: u8 = 0x06;
    pub const ERROR_FEW_FEATURE_POINTS: u8 = 0x07;
    pub const ERROR_NO_TMATCHING: u8 = 0x08;
    pub const ERROR_NO_TEMPLATE_FOUND: u8 = 0x09;
    pub const ERROR_CHARACTERISTICS_MISMATCH: u8 = 0x0A;
    pub const ERROR_INVALID_POSITION: u8 = 0x0B;
    pub const ERROR_LOAD_TEMPLATE: u8 = 0x0C;
    pub const ERROR_DOWNLOAD_CHARACTERISTICS: u8 = 0x0D;
    pub const ERROR_DOWNLOAD_IMAGE: u8 = 0x0F;
    pub const ERROR_DELETE_TEMPLATE: u8 = 0x10;
    pub const ERROR_CLEAR_DATABASE: u8 = 0x11;
    pub const ERROR_WRONG_PASSWORD: u8 = 0x13;
    pub const ERROR_INVALID_IMAGE: u8 = 0x15;
    pub const ERROR_FLASH: u8 = 0x18;
    pub const ERROR_INVALID_REGISTER: u8 = 0x1A;
    pub const ADDR_CODE: u8 = 0x20;
    pub const PACKET_RESPONSE_FAIL: u8 = 0x0E;
}

/// Valid `max_packet_payload` sizes and their wire-level parameter index
/// (spec §3, §4.3 `set_max_packet_size`).
pub const PACKET_SIZES: [u16; 4] = [32, 64, 128, 256];
