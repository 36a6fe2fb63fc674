//! Property tests for the frame codec (round-trip, corruption detection).

use bytes::Bytes;
use fpsensor_core::{Packet, PacketType, SensorError};
use proptest::prelude::*;

fn arb_packet_type() -> impl Strategy<Value = PacketType> {
    prop_oneof![
        Just(PacketType::Command),
        Just(PacketType::Data),
        Just(PacketType::Ack),
        Just(PacketType::EndData),
    ]
}

proptest! {
    /// decode(encode(type, payload, addr), addr) == (type, payload)
    #[test]
    fn round_trip(
        packet_type in arb_packet_type(),
        payload in prop::collection::vec(any::<u8>(), 0..=256),
        address in any::<u32>(),
    ) {
        let packet = Packet::new(packet_type, Bytes::from(payload.clone()));
        let wire = packet.encode(address, 256).unwrap();
        let decoded = Packet::decode(&wire, address).unwrap();
        prop_assert_eq!(decoded.packet_type, packet_type);
        prop_assert_eq!(decoded.payload.as_ref(), payload.as_slice());
    }

    /// Any single-bit flip in an encoded frame is caught as a framing error,
    /// never silently accepted with different content.
    #[test]
    fn bit_flip_never_silently_accepted(
        payload in prop::collection::vec(any::<u8>(), 0..=16),
        bit_index in 0usize..8,
    ) {
        let address = 0xFFFF_FFFFu32;
        let packet = Packet::new(PacketType::Command, Bytes::from(payload.clone()));
        let wire = packet.encode(address, 256).unwrap().to_vec();

        for byte_index in 0..wire.len() {
            let mut corrupted = wire.clone();
            corrupted[byte_index] ^= 1 << bit_index;

            match Packet::decode(&corrupted, address) {
                Err(SensorError::BadStartCode)
                | Err(SensorError::BadLength)
                | Err(SensorError::AddressMismatch)
                | Err(SensorError::BadChecksum) => {}
                Ok(decoded) => {
                    prop_assert_eq!(decoded.packet_type, PacketType::Command);
                    prop_assert_eq!(decoded.payload.as_ref(), payload.as_slice());
                }
                Err(other) => prop_assert!(false, "unexpected error variant: {other:?}"),
            }
        }
    }
}
