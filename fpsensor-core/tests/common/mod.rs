//! Shared test utilities for the integration suite.

#![allow(dead_code)]

use bytes::Bytes;
use fpsensor_core::{Packet, PacketType};

/// Encodes a frame for `address`, panicking on failure (tests only).
pub fn frame(packet_type: PacketType, payload: &[u8], address: u32) -> Vec<u8> {
    Packet::new(packet_type, Bytes::copy_from_slice(payload))
        .encode(address, 256)
        .expect("test payload should fit in one frame")
        .to_vec()
}

/// Encodes an ACK frame with `status` as the first payload byte, followed
/// by `rest`.
pub fn ack(status: u8, rest: &[u8], address: u32) -> Vec<u8> {
    let mut payload = vec![status];
    payload.extend_from_slice(rest);
    frame(PacketType::Ack, &payload, address)
}
