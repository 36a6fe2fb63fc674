//! Higher-level workflows built from the sensor API (spec §4.5): free-slot
//! allocation, database export/import, and the scan-and-identify loop.
//!
//! Grounded on `PyFingerPrint.py`'s `UploadDataBase` / `DownloadDataBase` /
//! `ScanFinger` / `ScanFingerVerify`, which this module keeps as a single
//! generic entry point (`scan` with a caller-supplied minimum accuracy,
//! folding `ScanFingerVerify`'s "any match succeeds" behavior into
//! `min_accuracy = 0`) rather than reproducing both original names.

use std::time::Duration;

use tracing::{debug, warn};

use crate::channel::ByteChannel;
use crate::constants::BUFFER1;
use crate::engine::SensorEngine;
use crate::error::SensorError;
use crate::types::{Record, SearchResult};

/// Finds the numerically smallest unoccupied template position by scanning
/// the four index pages (spec §4.5).
pub async fn allocate_free_slot<C: ByteChannel>(
    engine: &mut SensorEngine<C>,
    storage_capacity: u16,
) -> Result<u16, SensorError> {
    let bits_per_page = storage_capacity as usize / 4;
    for page in 0..4u8 {
        let bits = engine.template_index(page).await?;
        for (bit_index, used) in bits.into_iter().enumerate() {
            let position = page as usize * bits_per_page + bit_index;
            if position >= storage_capacity as usize {
                break;
            }
            if !used {
                return Ok(position as u16);
            }
        }
    }
    Err(SensorError::DatabaseFull)
}

/// `store_template` with automatic slot selection: allocates the first free
/// position and stores into it.
pub async fn store_template_auto<C: ByteChannel>(engine: &mut SensorEngine<C>, buffer: u8) -> Result<u16, SensorError> {
    let capacity = engine.get_system_parameters().await?.storage_capacity;
    let position = allocate_free_slot(engine, capacity).await?;
    engine.store_template(position, buffer).await?;
    debug!(position, "stored template in auto-allocated slot");
    Ok(position)
}

/// Exports every occupied template slot as a [`Record`] (spec §4.5).
pub async fn export_database<C: ByteChannel>(engine: &mut SensorEngine<C>) -> Result<Vec<Record>, SensorError> {
    let capacity = engine.get_system_parameters().await?.storage_capacity;
    let mut occupied = Vec::new();
    for page in 0..4u8 {
        let bits = engine.template_index(page).await?;
        let bits_per_page = capacity as usize / 4;
        for (bit_index, used) in bits.into_iter().enumerate() {
            let position = page as usize * bits_per_page + bit_index;
            if position >= capacity as usize {
                break;
            }
            if used {
                occupied.push(position as u16);
            }
        }
    }

    let mut records = Vec::with_capacity(occupied.len());
    for position in occupied {
        engine.load_template(position, BUFFER1).await?;
        let characteristics = engine.download_characteristics(BUFFER1).await?;
        records.push(Record::new(position, characteristics));
    }
    Ok(records)
}

/// Clears the database and re-stores `db` starting at slot 0 (spec §4.5).
///
/// Not atomic: a failure at slot `k` leaves slots `[0, k)` populated. The
/// caller can inspect `template_count()` / `template_index()` afterward to
/// determine `k` and retry the remaining suffix of `db`.
pub async fn import_database<C: ByteChannel>(engine: &mut SensorEngine<C>, db: &[Vec<u8>]) -> Result<(), SensorError> {
    let capacity = engine.get_system_parameters().await?.storage_capacity;
    if db.len() > capacity as usize {
        return Err(SensorError::InvalidRange("database length exceeds storage capacity"));
    }

    engine.clear_database().await?;
    for (position, characteristics) in db.iter().enumerate() {
        engine.upload_characteristics(BUFFER1, characteristics).await?;
        engine.store_template(position as u16, BUFFER1).await?;
    }
    Ok(())
}

/// Repeatedly polls `read_image` until it succeeds, `deadline` elapses, or
/// `canceled` reports true, then converts and searches (spec §4.5).
/// Cancellation is checked only between polls — an in-flight frame read is
/// never preempted.
pub async fn scan<C: ByteChannel>(
    engine: &mut SensorEngine<C>,
    deadline: Duration,
    min_accuracy: i32,
    mut canceled: impl FnMut() -> bool,
) -> Result<SearchResult, SensorError> {
    let start = tokio::time::Instant::now();
    loop {
        if canceled() {
            return Err(SensorError::Canceled);
        }
        if start.elapsed() >= deadline {
            warn!("scan deadline elapsed before a finger was read");
            return Err(SensorError::Timeout);
        }
        if engine.read_image().await? {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    engine.convert_image(BUFFER1).await?;
    let result = engine.search_template(BUFFER1, 0, u16::MAX).await?;

    if min_accuracy > 0 && result.found && result.accuracy < min_accuracy {
        return Ok(SearchResult::not_found());
    }
    Ok(result)
}
