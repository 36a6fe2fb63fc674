use std::io;
use thiserror::Error;

/// The primary error type for `fpsensor-core`.
///
/// Covers the taxonomy from spec §7 in one flat enum: framing, sensor,
/// protocol-level, engine, and argument errors. Sensor-expected negative
/// outcomes (no finger, wrong password, no match) are *not* represented
/// here — those surface as `bool`/`Option` results, never as errors.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("frame did not start with the expected start code")]
    BadStartCode,

    #[error("frame address did not match the session's expected address")]
    AddressMismatch,

    #[error("frame length field is invalid (must be >= 2)")]
    BadLength,

    #[error("frame checksum does not match computed checksum")]
    BadChecksum,

    #[error("expected an ACK packet, got a different packet type")]
    UnexpectedPacketType,

    #[error("payload of {len} bytes exceeds the negotiated max packet payload of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("no free template slot available")]
    DatabaseFull,

    #[error("I/O error on the byte channel: {0}")]
    Io(#[from] io::Error),

    #[error("timed out waiting for a frame")]
    Timeout,

    #[error("operation canceled")]
    Canceled,

    #[error("communication error reported by sensor (status 0x01)")]
    CommError,

    #[error("sensor returned unrecognized status code {0:#04x}")]
    UnknownStatus(u8),

    #[error("invalid argument: {0}")]
    InvalidRange(&'static str),

    /// Sensor error statuses mapped one-to-one from the protocol (spec §7).
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorStatusError),
}

/// Named sensor-side error statuses, distinct from [`SensorError`] so that
/// commands which expect specific error statuses can match on them without
/// pulling in framing/engine variants.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatusError {
    #[error("wrong password")]
    WrongPassword,
    #[error("no finger detected")]
    NoFinger,
    #[error("image too messy to process")]
    MessyImage,
    #[error("too few feature points in image")]
    FewFeaturePoints,
    #[error("no matching template")]
    NoMatch,
    #[error("no template found")]
    NoTemplateFound,
    #[error("characteristics mismatch")]
    Mismatch,
    #[error("invalid template position")]
    InvalidPosition,
    #[error("failed to load template")]
    LoadTemplate,
    #[error("failed to download characteristics")]
    DownloadCharacteristics,
    #[error("failed to download image")]
    DownloadImage,
    #[error("failed to delete template")]
    DeleteTemplate,
    #[error("failed to clear database")]
    ClearDatabase,
    #[error("invalid image")]
    InvalidImage,
    #[error("flash write error")]
    FlashWrite,
    #[error("invalid register number")]
    InvalidRegister,
    #[error("address mismatch")]
    AddressWrong,
    #[error("packet response failure")]
    ResponseFail,
}
