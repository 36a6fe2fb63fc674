//! Frame codec: encodes and decodes the wire format described in spec §4.1.
//!
//! ```text
//! offset  size  field
//! 0       2     start code (0xEF01)
//! 2       4     device address
//! 6       1     packet type
//! 7       2     length = payload size + 2
//! 9       N     payload
//! 9+N     2     checksum
//! ```

use crate::constants::{CHECKSUM_SIZE, HEADER_SIZE, START_CODE};
use crate::error::SensorError;
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};

/// Packet type, the single byte at wire offset 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum PacketType {
    Command = 0x01,
    Data = 0x02,
    Ack = 0x07,
    EndData = 0x08,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// A decoded frame: type plus payload, with address/checksum validated away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: PacketType,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(packet_type: PacketType, payload: Bytes) -> Self {
        Self {
            packet_type,
            payload,
        }
    }

    /// Encodes this packet for `address`, enforcing spec §4.1's
    /// `PayloadTooLarge` contract against `max_packet_payload`.
    pub fn encode(&self, address: u32, max_packet_payload: usize) -> Result<Bytes, SensorError> {
        if self.payload.len() > max_packet_payload {
            return Err(SensorError::PayloadTooLarge {
                len: self.payload.len(),
                max: max_packet_payload,
            });
        }

        let packet_type_byte: u8 = self.packet_type.into();
        let length = (self.payload.len() + CHECKSUM_SIZE) as u16;

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE);
        buf.put_u16(START_CODE);
        buf.put_u32(address);
        buf.put_u8(packet_type_byte);
        buf.put_u16(length);
        buf.put_slice(&self.payload);

        let mut checksum: u16 = packet_type_byte as u16;
        checksum = checksum.wrapping_add((length >> 8) as u16);
        checksum = checksum.wrapping_add((length & 0xFF) as u16);
        for &b in self.payload.as_ref() {
            checksum = checksum.wrapping_add(b as u16);
        }
        buf.put_u16(checksum);

        Ok(buf.freeze())
    }

    /// Decodes a complete frame buffer against the session's expected
    /// `address`. Never partially consumes caller state: on any error the
    /// caller must reset the input buffer before retrying (spec §4.1).
    pub fn decode(frame: &[u8], address: u32) -> Result<Self, SensorError> {
        if frame.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(SensorError::BadLength);
        }

        let start = u16::from_be_bytes([frame[0], frame[1]]);
        if start != START_CODE {
            return Err(SensorError::BadStartCode);
        }

        let frame_address = u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]]);
        if frame_address != address {
            return Err(SensorError::AddressMismatch);
        }

        let packet_type_byte = frame[6];
        let length = u16::from_be_bytes([frame[7], frame[8]]);
        if length < 2 {
            return Err(SensorError::BadLength);
        }

        let total_len = HEADER_SIZE + length as usize;
        if frame.len() != total_len {
            return Err(SensorError::BadLength);
        }

        let payload_len = length as usize - CHECKSUM_SIZE;
        let payload = &frame[HEADER_SIZE..HEADER_SIZE + payload_len];
        let checksum_bytes = &frame[HEADER_SIZE + payload_len..total_len];
        let received_checksum = u16::from_be_bytes([checksum_bytes[0], checksum_bytes[1]]);

        let mut computed: u16 = packet_type_byte as u16;
        computed = computed.wrapping_add((length >> 8) as u16);
        computed = computed.wrapping_add((length & 0xFF) as u16);
        for &b in payload {
            computed = computed.wrapping_add(b as u16);
        }

        if computed != received_checksum {
            return Err(SensorError::BadChecksum);
        }

        Ok(Packet {
            packet_type: PacketType::from(packet_type_byte),
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let packet = Packet::new(PacketType::Command, Bytes::from_static(&[0x13, 1, 2, 3, 4]));
        let wire = packet.encode(0xFFFF_FFFF, 256).unwrap();
        let decoded = Packet::decode(&wire, 0xFFFF_FFFF).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_wrong_start_code() {
        let packet = Packet::new(PacketType::Ack, Bytes::from_static(&[0x00]));
        let mut wire = packet.encode(0xFFFF_FFFF, 256).unwrap().to_vec();
        wire[0] = 0xEE;
        assert!(matches!(
            Packet::decode(&wire, 0xFFFF_FFFF),
            Err(SensorError::BadStartCode)
        ));
    }

    #[test]
    fn rejects_address_mismatch() {
        let packet = Packet::new(PacketType::Ack, Bytes::from_static(&[0x00]));
        let wire = packet.encode(0xFFFF_FFFF, 256).unwrap();
        assert!(matches!(
            Packet::decode(&wire, 0x0000_0001),
            Err(SensorError::AddressMismatch)
        ));
    }

    #[test]
    fn rejects_bad_checksum() {
        let packet = Packet::new(PacketType::Ack, Bytes::from_static(&[0x00]));
        let mut wire = packet.encode(0xFFFF_FFFF, 256).unwrap().to_vec();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        assert!(matches!(
            Packet::decode(&wire, 0xFFFF_FFFF),
            Err(SensorError::BadChecksum)
        ));
    }

    #[test]
    fn payload_too_large_rejected_before_transmission() {
        let packet = Packet::new(PacketType::Data, Bytes::from(vec![0u8; 300]));
        assert!(matches!(
            packet.encode(0xFFFF_FFFF, 256),
            Err(SensorError::PayloadTooLarge { len: 300, max: 256 })
        ));
    }
}
