//! Multi-packet transfer (spec §4.4): the DATA/END_DATA streaming used by
//! image download and characteristics up/download.

use bytes::Bytes;

use crate::channel::ByteChannel;
use crate::engine::SensorEngine;
use crate::error::SensorError;
use crate::packet::PacketType;

/// Reads DATA packets until an END_DATA packet arrives, concatenating
/// payloads in receive order. The sender is authoritative about total
/// length — there is no length prefix to check against.
pub(crate) async fn download<C: ByteChannel>(engine: &mut SensorEngine<C>) -> Result<Vec<u8>, SensorError> {
    let mut data = Vec::new();
    loop {
        let frame = engine.read_frame().await?;
        match frame.packet_type {
            PacketType::Data => data.extend_from_slice(&frame.payload),
            PacketType::EndData => {
                data.extend_from_slice(&frame.payload);
                return Ok(data);
            }
            _ => return Err(SensorError::UnexpectedPacketType),
        }
    }
}

/// Chunks `data` into windows of `max_packet_payload`, sending all but the
/// last chunk as DATA and the final chunk (or the whole payload, if it fits
/// in one packet) as END_DATA. No ACK between data packets.
pub(crate) async fn upload<C: ByteChannel>(
    engine: &mut SensorEngine<C>,
    data: &[u8],
    max_packet_payload: usize,
) -> Result<(), SensorError> {
    if data.is_empty() {
        engine.write_frame(PacketType::EndData, Bytes::new()).await?;
        return Ok(());
    }

    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + max_packet_payload).min(data.len());
        let chunk = Bytes::copy_from_slice(&data[offset..end]);
        let is_last = end == data.len();
        let packet_type = if is_last { PacketType::EndData } else { PacketType::Data };
        engine.write_frame(packet_type, chunk).await?;
        offset = end;
    }

    Ok(())
}
