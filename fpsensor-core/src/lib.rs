pub mod channel;
pub mod constants;
pub mod engine;
pub mod error;
pub mod image;
pub mod led;
pub mod packet;
pub mod params;
pub mod status;
pub mod transfer;
pub mod types;
pub mod workflows;

// Re-export commonly used types
pub use channel::ByteChannel;
pub use engine::{BaudChangeHint, SensorEngine, SessionConfig};
pub use error::{SensorError, SensorStatusError};
pub use image::Raster;
pub use led::{LedColor, LedMode};
pub use packet::{Packet, PacketType};
pub use params::SystemParameters;
pub use types::{Record, SearchResult};
