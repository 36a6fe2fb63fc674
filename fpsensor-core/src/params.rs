//! Cached system parameters (spec §3, §5.7).

use crate::constants::PACKET_SIZES;
use crate::error::SensorError;
use serde::{Deserialize, Serialize};

/// Decoded payload of `GET_SYSTEM_PARAMETERS`, field order matching the
/// sensor's 16-byte response (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemParameters {
    pub status_register: u16,
    pub system_id: u16,
    pub storage_capacity: u16,
    pub security_level: u16,
    pub device_address: u32,
    /// Index into [`PACKET_SIZES`] (0..=3), not the payload size itself.
    pub packet_length_index: u16,
    /// Actual baud rate in bps is `baud_divisor * 9600`.
    pub baud_divisor: u16,
}

impl SystemParameters {
    /// Decodes the 16 payload bytes following the ACK status byte.
    pub fn decode(bytes: &[u8]) -> Result<Self, SensorError> {
        if bytes.len() < 16 {
            return Err(SensorError::UnexpectedPacketType);
        }
        let params = SystemParameters {
            status_register: u16::from_be_bytes([bytes[0], bytes[1]]),
            system_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            storage_capacity: u16::from_be_bytes([bytes[4], bytes[5]]),
            security_level: u16::from_be_bytes([bytes[6], bytes[7]]),
            device_address: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            packet_length_index: u16::from_be_bytes([bytes[12], bytes[13]]),
            baud_divisor: u16::from_be_bytes([bytes[14], bytes[15]]),
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), SensorError> {
        if !(1..=12).contains(&self.baud_divisor) {
            return Err(SensorError::InvalidRange("baud divisor out of range [1,12]"));
        }
        if !(1..=5).contains(&self.security_level) {
            return Err(SensorError::InvalidRange("security level out of range [1,5]"));
        }
        Ok(())
    }

    /// Maximum payload bytes negotiable per packet, per spec §3's
    /// `packetLength` index mapping.
    pub fn max_packet_payload(&self) -> usize {
        PACKET_SIZES[self.packet_length_index as usize % PACKET_SIZES.len()] as usize
    }

    /// Actual UART baud rate in bits per second.
    pub fn baud_bps(&self) -> u32 {
        self.baud_divisor as u32 * 9600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario S3 from spec §8.
    #[test]
    fn decodes_s3_scenario() {
        let bytes = [
            0x00, 0x00, // statusRegister
            0x00, 0x00, // systemID
            0x00, 0xC0, // storageCapacity = 192
            0x00, 0x03, // securityLevel = 3
            0xFF, 0xFF, 0xFF, 0xFF, // address
            0x00, 0x02, // packetLength index = 2 -> 128
            0x00, 0x06, // baud divisor = 6 -> 57600
        ];
        let params = SystemParameters::decode(&bytes).unwrap();
        assert_eq!(params.storage_capacity, 192);
        assert_eq!(params.security_level, 3);
        assert_eq!(params.device_address, 0xFFFF_FFFF);
        assert_eq!(params.max_packet_payload(), 128);
        assert_eq!(params.baud_bps(), 57600);
    }
}
