//! Command engine and sensor API (spec §4.2, §4.3).

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use crate::channel::ByteChannel;
use crate::constants::{opcode, status, sub_param, BUFFER1, BUFFER2, DEFAULT_ADDRESS, DEFAULT_PASSWORD};
use crate::error::{SensorError, SensorStatusError};
use crate::led::{self, LedColor, LedMode};
use crate::packet::{Packet, PacketType};
use crate::params::SystemParameters;
use crate::status::map_status_error;
use crate::transfer;
use crate::types::SearchResult;

/// Per-session configuration, mirroring the teacher's `DeviceConfig` builder
/// (`km003c-lib::device::DeviceConfig`) adapted to this protocol's
/// address/password handshake instead of a USB interface choice.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub address: u32,
    pub password: u32,
    pub frame_timeout: Duration,
}

impl SessionConfig {
    pub fn new(address: u32, password: u32) -> Self {
        Self {
            address,
            password,
            frame_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS, DEFAULT_PASSWORD)
    }
}

/// Returned when a call changes the byte channel's required baud rate.
/// The engine does not own the transport, so it cannot reconfigure it
/// itself (spec §5 "Cached state"); callers must act on this hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudChangeHint {
    pub new_bps: u32,
}

/// Owns the byte channel plus address/password/cached parameters for one
/// sensor session. Single-owner, not re-entrant (spec §5) — does not
/// implement `Clone` or `Sync`; wrap in a mutex yourself if sharing across
/// tasks.
pub struct SensorEngine<C: ByteChannel> {
    channel: C,
    address: u32,
    password: u32,
    max_packet_payload: usize,
    cached_params: Option<SystemParameters>,
    config: SessionConfig,
}

impl<C: ByteChannel> SensorEngine<C> {
    /// Wraps a channel without touching the wire. Use [`Self::connect`] to
    /// additionally verify the password and cache system parameters.
    pub fn new(channel: C, config: SessionConfig) -> Self {
        Self {
            channel,
            address: config.address,
            password: config.password,
            max_packet_payload: 32,
            cached_params: None,
            config,
        }
    }

    /// Verifies the password and caches system parameters, transitioning
    /// the session to Ready (spec §3 "Lifecycle").
    pub async fn connect(channel: C, config: SessionConfig) -> Result<Self, SensorError> {
        let mut engine = Self::new(channel, config);
        if !engine.verify_password().await? {
            return Err(SensorError::Sensor(SensorStatusError::WrongPassword));
        }
        engine.get_system_parameters().await?;
        Ok(engine)
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn max_packet_payload(&self) -> usize {
        self.max_packet_payload
    }

    pub(crate) fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    // ---- frame-level primitives -------------------------------------

    pub(crate) async fn write_frame(&mut self, packet_type: PacketType, payload: Bytes) -> Result<(), SensorError> {
        let packet = Packet::new(packet_type, payload);
        let wire = packet.encode(self.address, self.max_packet_payload)?;
        trace!(bytes = wire.len(), "writing frame");
        self.channel.write_all(&wire).await?;
        self.channel.flush().await?;
        Ok(())
    }

    pub(crate) async fn read_frame(&mut self) -> Result<Packet, SensorError> {
        let deadline = tokio::time::Instant::now() + self.config.frame_timeout;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                warn!("timed out waiting for a frame; caller must reset input");
                return Err(SensorError::Timeout);
            }
            let slice = remaining.min(Duration::from_millis(50));
            match self.channel.read_byte(slice).await? {
                Some(byte) => {
                    buf.push(byte);
                    if buf.len() >= 9 {
                        let length = u16::from_be_bytes([buf[7], buf[8]]) as usize;
                        let total = 9 + length;
                        if buf.len() >= total {
                            buf.truncate(total);
                            let frame = Packet::decode(&buf, self.address)?;
                            trace!(?frame, "read frame");
                            return Ok(frame);
                        }
                    }
                }
                None => {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
            }
        }
    }

    /// Writes a COMMAND frame `[opcode, args...]` and reads the matching
    /// ACK, dispatching on the status byte (spec §4.2). Returns the payload
    /// bytes after the status byte on `OK`.
    pub(crate) async fn command(&mut self, opcode: u8, args: &[u8]) -> Result<Vec<u8>, SensorError> {
        let mut payload = Vec::with_capacity(1 + args.len());
        payload.push(opcode);
        payload.extend_from_slice(args);
        self.write_frame(PacketType::Command, Bytes::from(payload)).await?;

        let ack = self.read_frame().await?;
        if ack.packet_type != PacketType::Ack {
            return Err(SensorError::UnexpectedPacketType);
        }
        if ack.payload.is_empty() {
            return Err(SensorError::UnexpectedPacketType);
        }

        let code = ack.payload[0];
        match code {
            s if s == status::OK => Ok(ack.payload[1..].to_vec()),
            s if s == status::ERROR_COMMUNICATION => Err(SensorError::CommError),
            other => match map_status_error(other) {
                Some(e) => Err(SensorError::Sensor(e)),
                None => Err(SensorError::UnknownStatus(other)),
            },
        }
    }

    /// Like [`Self::command`], but treats the ACK as "sensor will now stream
    /// DATA packets" instead of a final result (spec §4.2).
    pub(crate) async fn command_expect_stream(&mut self, opcode: u8, args: &[u8]) -> Result<(), SensorError> {
        self.command(opcode, args).await.map(|_| ())
    }

    async fn resync(&mut self) {
        if let Err(e) = self.channel.reset_input().await {
            warn!(error = %e, "failed to reset input buffer after error");
        }
    }

    // ---- sensor API ---------------------------------------------------

    pub async fn verify_password(&mut self) -> Result<bool, SensorError> {
        let mut args = [0u8; 4];
        args.copy_from_slice(&self.password.to_be_bytes());
        match self.command(opcode::VERIFY_PASSWORD, &args).await {
            Ok(_) => {
                info!("password verified");
                Ok(true)
            }
            Err(SensorError::Sensor(SensorStatusError::WrongPassword)) => Ok(false),
            Err(e) => {
                self.resync().await;
                Err(e)
            }
        }
    }

    pub async fn set_password(&mut self, new_password: u32) -> Result<(), SensorError> {
        let args = new_password.to_be_bytes();
        self.command(opcode::SET_PASSWORD, &args).await?;
        self.password = new_password;
        info!("password updated");
        Ok(())
    }

    /// After success, subsequent frames (including this call's own ACK) use
    /// `new_address` (spec §4.3 `set_address`).
    pub async fn set_address(&mut self, new_address: u32) -> Result<(), SensorError> {
        let args = new_address.to_be_bytes();
        self.address = new_address;
        self.command(opcode::SET_ADDRESS, &args).await?;
        info!(address = format!("{:#010x}", new_address), "address updated");
        Ok(())
    }

    /// Accepts only multiples of 9600 in `[9600, 115200]`. Returns a hint
    /// the caller must act on to reconfigure the byte channel's baud rate
    /// before issuing the next command (spec §5 "Cached state").
    pub async fn set_baud(&mut self, bps: u32) -> Result<BaudChangeHint, SensorError> {
        if bps < 9600 || bps > 115_200 || bps % 9600 != 0 {
            return Err(SensorError::InvalidRange("baud must be a multiple of 9600 in [9600, 115200]"));
        }
        let divisor = (bps / 9600) as u8;
        self.command(opcode::SET_SYSTEM_PARAMETER, &[sub_param::BAUD, divisor]).await?;
        self.cached_params = None;
        info!(bps, "baud rate updated");
        Ok(BaudChangeHint { new_bps: bps })
    }

    pub async fn set_security_level(&mut self, level: u16) -> Result<(), SensorError> {
        if !(1..=5).contains(&level) {
            return Err(SensorError::InvalidRange("security level must be in [1,5]"));
        }
        self.command(opcode::SET_SYSTEM_PARAMETER, &[sub_param::SECURITY_LEVEL, level as u8]).await?;
        self.cached_params = None;
        Ok(())
    }

    pub async fn set_max_packet_size(&mut self, bytes: u16) -> Result<(), SensorError> {
        let index = crate::constants::PACKET_SIZES
            .iter()
            .position(|&sz| sz == bytes)
            .ok_or(SensorError::InvalidRange("packet size must be one of {32,64,128,256}"))?;
        self.command(opcode::SET_SYSTEM_PARAMETER, &[sub_param::PACKET_SIZE, index as u8]).await?;
        self.cached_params = None;
        self.max_packet_payload = bytes as usize;
        Ok(())
    }

    pub async fn get_system_parameters(&mut self) -> Result<SystemParameters, SensorError> {
        if let Some(params) = self.cached_params {
            return Ok(params);
        }
        let payload = self.command(opcode::GET_SYSTEM_PARAMETERS, &[]).await?;
        let params = SystemParameters::decode(&payload)?;
        self.max_packet_payload = params.max_packet_payload();
        self.cached_params = Some(params);
        debug!(?params, "fetched system parameters");
        Ok(params)
    }

    pub async fn template_count(&mut self) -> Result<u16, SensorError> {
        let payload = self.command(opcode::TEMPLATE_COUNT, &[]).await?;
        if payload.len() < 2 {
            return Err(SensorError::UnexpectedPacketType);
        }
        Ok(u16::from_be_bytes([payload[0], payload[1]]))
    }

    /// `page` in `[0,3]`; returns occupancy bits LSB-first within each byte
    /// (spec §4.3).
    pub async fn template_index(&mut self, page: u8) -> Result<Vec<bool>, SensorError> {
        if page > 3 {
            return Err(SensorError::InvalidRange("template index page must be in [0,3]"));
        }
        let payload = self.command(opcode::TEMPLATE_INDEX, &[page]).await?;
        let mut bits = Vec::with_capacity(payload.len() * 8);
        for byte in payload {
            for bit in 0..8 {
                bits.push((byte >> bit) & 1 == 1);
            }
        }
        Ok(bits)
    }

    pub async fn read_image(&mut self) -> Result<bool, SensorError> {
        match self.command(opcode::READ_IMAGE, &[]).await {
            Ok(_) => Ok(true),
            Err(SensorError::Sensor(SensorStatusError::NoFinger)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn check_buffer(buffer: u8) -> Result<(), SensorError> {
        if buffer != BUFFER1 && buffer != BUFFER2 {
            return Err(SensorError::InvalidRange("char buffer must be BUFFER1 or BUFFER2"));
        }
        Ok(())
    }

    pub async fn convert_image(&mut self, buffer: u8) -> Result<(), SensorError> {
        Self::check_buffer(buffer)?;
        self.command(opcode::CONVERT_IMAGE, &[buffer]).await?;
        Ok(())
    }

    pub async fn create_template(&mut self) -> Result<bool, SensorError> {
        match self.command(opcode::CREATE_TEMPLATE, &[]).await {
            Ok(_) => Ok(true),
            Err(SensorError::Sensor(SensorStatusError::Mismatch)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn store_template(&mut self, position: u16, buffer: u8) -> Result<(), SensorError> {
        Self::check_buffer(buffer)?;
        let args = [buffer, (position >> 8) as u8, (position & 0xFF) as u8];
        self.command(opcode::STORE_TEMPLATE, &args).await?;
        Ok(())
    }

    pub async fn load_template(&mut self, position: u16, buffer: u8) -> Result<(), SensorError> {
        Self::check_buffer(buffer)?;
        let args = [buffer, (position >> 8) as u8, (position & 0xFF) as u8];
        self.command(opcode::LOAD_TEMPLATE, &args).await?;
        Ok(())
    }

    pub async fn delete_template(&mut self, position: u16, count: u16) -> Result<bool, SensorError> {
        let args = [
            (position >> 8) as u8,
            (position & 0xFF) as u8,
            (count >> 8) as u8,
            (count & 0xFF) as u8,
        ];
        match self.command(opcode::DELETE_TEMPLATE, &args).await {
            Ok(_) => Ok(true),
            Err(SensorError::Sensor(SensorStatusError::DeleteTemplate)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn clear_database(&mut self) -> Result<bool, SensorError> {
        match self.command(opcode::CLEAR_DATABASE, &[]).await {
            Ok(_) => Ok(true),
            Err(SensorError::Sensor(SensorStatusError::ClearDatabase)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn search_template(&mut self, buffer: u8, start: u16, count: u16) -> Result<SearchResult, SensorError> {
        Self::check_buffer(buffer)?;
        let args = [
            buffer,
            (start >> 8) as u8,
            (start & 0xFF) as u8,
            (count >> 8) as u8,
            (count & 0xFF) as u8,
        ];
        match self.command(opcode::SEARCH_TEMPLATE, &args).await {
            Ok(payload) if payload.len() >= 4 => {
                let position = u16::from_be_bytes([payload[0], payload[1]]);
                let accuracy = u16::from_be_bytes([payload[2], payload[3]]);
                Ok(SearchResult::found(position, accuracy))
            }
            Ok(_) => Err(SensorError::UnexpectedPacketType),
            Err(SensorError::Sensor(SensorStatusError::NoTemplateFound)) => Ok(SearchResult::not_found()),
            Err(e) => Err(e),
        }
    }

    pub async fn compare_characteristics(&mut self) -> Result<u16, SensorError> {
        match self.command(opcode::COMPARE_CHARACTERISTICS, &[]).await {
            Ok(payload) if payload.len() >= 2 => Ok(u16::from_be_bytes([payload[0], payload[1]])),
            Ok(_) => Err(SensorError::UnexpectedPacketType),
            Err(SensorError::Sensor(SensorStatusError::NoMatch)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub async fn generate_random_number(&mut self) -> Result<u32, SensorError> {
        let payload = self.command(opcode::GENERATE_RANDOM_NUMBER, &[]).await?;
        if payload.len() < 4 {
            return Err(SensorError::UnexpectedPacketType);
        }
        Ok(u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]))
    }

    pub async fn led_control(&mut self, color: LedColor, mode: LedMode, speed: u8, cycles: u8) -> Result<(), SensorError> {
        let args = led::encode_args(color, mode, speed, cycles);
        self.command(opcode::LED_CONTROL, &args).await?;
        Ok(())
    }

    /// Multi-packet image download (spec §4.3, §4.4, §4.6).
    pub async fn download_image(&mut self) -> Result<crate::image::Raster, SensorError> {
        match self.command_expect_stream(opcode::DOWNLOAD_IMAGE, &[]).await {
            Ok(()) => {}
            Err(e) => {
                self.resync().await;
                return Err(e);
            }
        }
        let data = match transfer::download(self).await {
            Ok(data) => data,
            Err(e) => {
                self.resync().await;
                return Err(e);
            }
        };
        crate::image::Raster::from_packed(&data)
    }

    pub async fn download_characteristics(&mut self, buffer: u8) -> Result<Vec<u8>, SensorError> {
        Self::check_buffer(buffer)?;
        match self.command(opcode::DOWNLOAD_CHARACTERISTICS, &[buffer]).await {
            Ok(_) => {}
            Err(e) => {
                self.resync().await;
                return Err(e);
            }
        }
        match transfer::download(self).await {
            Ok(data) => Ok(data),
            Err(e) => {
                self.resync().await;
                Err(e)
            }
        }
    }

    /// Uploads `data` into `buffer`, then reads it back and compares for
    /// equality as the success criterion (spec §4.3 "no documented
    /// acknowledgement of upload correctness").
    pub async fn upload_characteristics(&mut self, buffer: u8, data: &[u8]) -> Result<(), SensorError> {
        Self::check_buffer(buffer)?;
        self.command_expect_stream(opcode::UPLOAD_CHARACTERISTICS, &[buffer]).await?;
        let max = self.max_packet_payload;
        if let Err(e) = transfer::upload(self, data, max).await {
            self.resync().await;
            return Err(e);
        }
        let readback = self.download_characteristics(buffer).await?;
        if readback != data {
            return Err(SensorError::UnexpectedPacketType);
        }
        Ok(())
    }
}
