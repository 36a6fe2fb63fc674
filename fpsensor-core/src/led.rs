//! LED control presets (spec §2: "enumerated but not central"; §4 supplement).
//!
//! Not part of the primary op-code table in spec §6, but present in the
//! sensor family this protocol derives from (see `example_ledcontrol.py` in
//! `examples/original_source`) and accepted by compatible hardware via
//! op-code [`crate::constants::opcode::LED_CONTROL`].

use num_enum::IntoPrimitive;

/// Preset LED colors, named after the upstream `FINGERPRINT_LEDCONTROL_COLOR*`
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum LedColor {
    Red = 1,
    Blue = 2,
    Purple = 3,
    Yellow = 4,
    Cyan = 5,
    ColdWhite = 6,
    WarmWhite = 7,
}

/// LED control mode, named after `FINGERPRINT_LEDCONTROL_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum LedMode {
    Breathing = 1,
    Flashing = 2,
    AlwaysOn = 3,
    AlwaysOff = 4,
}

/// Builds the 4-byte argument list for `LED_CONTROL`: `[mode, speed, color, cycles]`.
pub fn encode_args(color: LedColor, mode: LedMode, speed: u8, cycles: u8) -> [u8; 4] {
    [mode.into(), speed, color.into(), cycles]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_mode_speed_color_cycles_order() {
        let args = encode_args(LedColor::Cyan, LedMode::Flashing, 5, 50);
        assert_eq!(args, [LedMode::Flashing as u8, 5, LedColor::Cyan as u8, 50]);
    }
}
