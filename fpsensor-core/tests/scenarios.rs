//! End-to-end scenarios against an in-memory channel: password verification,
//! system parameter decoding, the enroll/store flow, database export/import
//! round-trip, and framing-error recovery.

mod common;

use fpsensor_core::channel::MockChannel;
use fpsensor_core::constants::{status, BUFFER1, BUFFER2};
use fpsensor_core::packet::PacketType;
use fpsensor_core::{workflows, SensorEngine, SessionConfig};

use common::{ack, frame};

/// Queues the fixed `get_system_parameters` response every `connect()` call
/// triggers, so tests that don't care about its content can ignore it.
fn push_default_params(chan: &mut MockChannel, address: u32) {
    let payload = [
        0x00, 0x00, // statusRegister
        0x00, 0x00, // systemID
        0x00, 0xC0, // storageCapacity = 192
        0x00, 0x03, // securityLevel = 3
        0xFF, 0xFF, 0xFF, 0xFF, // address
        0x00, 0x02, // packetLength index = 2 -> 128
        0x00, 0x06, // baud divisor = 6 -> 57600
    ];
    chan.push_inbound(&ack(status::OK, &payload, address));
}

#[tokio::test]
async fn s1_verify_password_default_credentials() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();
    chan.push_inbound(&ack(status::OK, &[], address));
    push_default_params(&mut chan, address);

    let engine = SensorEngine::connect(chan, SessionConfig::default()).await;
    assert!(engine.is_ok());
}

#[tokio::test]
async fn s2_wrong_password_returns_false_not_error() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();
    chan.push_inbound(&ack(status::ERROR_WRONG_PASSWORD, &[], address));

    let mut engine = SensorEngine::new(chan, SessionConfig::default());
    let ok = engine.verify_password().await.unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn s3_system_parameters_decode_matches_fields() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();
    push_default_params(&mut chan, address);

    let mut engine = SensorEngine::new(chan, SessionConfig::default());
    let params = engine.get_system_parameters().await.unwrap();

    assert_eq!(params.storage_capacity, 192);
    assert_eq!(params.security_level, 3);
    assert_eq!(params.device_address, 0xFFFF_FFFF);
    assert_eq!(params.max_packet_payload(), 128);
    assert_eq!(params.baud_bps(), 57_600);
}

#[tokio::test]
async fn s4_enroll_flow_stores_in_first_free_slot() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();

    // read_image -> OK, convert_image(BUFFER1) -> OK
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&ack(status::OK, &[], address));
    // search_template -> no template found (empty db)
    chan.push_inbound(&ack(status::ERROR_NO_TEMPLATE_FOUND, &[], address));
    // read_image -> OK, convert_image(BUFFER2) -> OK
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&ack(status::OK, &[], address));
    // create_template -> OK
    chan.push_inbound(&ack(status::OK, &[], address));
    // get_system_parameters for free-slot allocation
    push_default_params(&mut chan, address);
    // template_index(page 0) -> all zero (first byte fully free)
    chan.push_inbound(&ack(status::OK, &[0x00; 6], address));
    // store_template(0, BUFFER1) -> OK
    chan.push_inbound(&ack(status::OK, &[], address));

    let mut engine = SensorEngine::new(chan, SessionConfig::default());

    assert!(engine.read_image().await.unwrap());
    engine.convert_image(BUFFER1).await.unwrap();

    let result = engine.search_template(BUFFER1, 0, u16::MAX).await.unwrap();
    assert!(!result.found);

    assert!(engine.read_image().await.unwrap());
    engine.convert_image(BUFFER2).await.unwrap();

    assert!(engine.create_template().await.unwrap());

    let position = workflows::store_template_auto(&mut engine, BUFFER1).await.unwrap();
    assert_eq!(position, 0);
}

/// Spec §8 Property 3: the popcount of `template_index(page)` summed over
/// pages 0..3 equals `template_count()`, exercised against a bitmap
/// scattered across more than one page rather than an all-zero/all-one one.
#[tokio::test]
async fn s7_template_index_popcount_matches_template_count() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();

    // template_count() -> 4 occupied slots total.
    chan.push_inbound(&ack(status::OK, &[0x00, 0x04], address));
    // page 0: positions 0 and 2 occupied.
    chan.push_inbound(&ack(status::OK, &[0x05, 0x00, 0x00, 0x00, 0x00, 0x00], address));
    // page 1: position 48+7 = 55 occupied.
    chan.push_inbound(&ack(status::OK, &[0x80, 0x00, 0x00, 0x00, 0x00, 0x00], address));
    // page 2: nothing occupied.
    chan.push_inbound(&ack(status::OK, &[0x00; 6], address));
    // page 3: position 144+0 = 144 occupied.
    chan.push_inbound(&ack(status::OK, &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00], address));

    let mut engine = SensorEngine::new(chan, SessionConfig::default());

    let count = engine.template_count().await.unwrap();

    let mut popcount = 0usize;
    for page in 0..4u8 {
        popcount += engine.template_index(page).await.unwrap().into_iter().filter(|&b| b).count();
    }

    assert_eq!(popcount, count as usize);
}

/// Spec §8 Property 6: free-slot allocation returns the numerically
/// smallest free position, exercised against occupancy that spans a page
/// boundary so the all-zero-bitmap case in `s4` can't mask a wrong answer.
#[tokio::test]
async fn s8_allocate_free_slot_picks_smallest_position_across_pages() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();

    // page 0: fully occupied (positions 0..47).
    chan.push_inbound(&ack(status::OK, &[0xFF; 6], address));
    // page 1: positions 48 and 49 occupied, 50 free.
    chan.push_inbound(&ack(status::OK, &[0x03, 0x00, 0x00, 0x00, 0x00, 0x00], address));

    let mut engine = SensorEngine::new(chan, SessionConfig::default());
    let position = workflows::allocate_free_slot(&mut engine, 192).await.unwrap();
    assert_eq!(position, 50);
}

#[tokio::test]
async fn s6_framing_error_reports_bad_start_code() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();

    // Corrupt the start code of an otherwise-valid ACK.
    let mut corrupted = ack(status::OK, &[], address);
    corrupted[0] = 0xEE;
    chan.push_inbound(&corrupted);

    let mut engine = SensorEngine::new(chan, SessionConfig::default());
    let err = engine.verify_password().await.unwrap_err();
    assert!(matches!(err, fpsensor_core::SensorError::BadStartCode));
}

#[tokio::test]
async fn import_database_populates_requested_slots() {
    let address = SessionConfig::default().address;
    let mut chan = MockChannel::new();

    // get_system_parameters (storage_capacity = 192) for import's capacity check.
    push_default_params(&mut chan, address);
    // clear_database -> OK
    chan.push_inbound(&ack(status::OK, &[], address));
    // upload_characteristics(BUFFER1, data): command ack, then its internal
    // download_characteristics readback (command ack + END_DATA stream).
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&frame(PacketType::EndData, &[1, 2, 3, 4], address));
    // store_template(0, BUFFER1) -> OK
    chan.push_inbound(&ack(status::OK, &[], address));

    let mut engine = SensorEngine::new(chan, SessionConfig::default());
    workflows::import_database(&mut engine, &[vec![1, 2, 3, 4]]).await.unwrap();
}

/// Queues the response sequence one `export_database` pass needs for a
/// database holding a single occupied slot at position 0 with `data`.
fn push_export_single_record(chan: &mut MockChannel, address: u32, data: &[u8]) {
    push_default_params(chan, address);
    // template_index(page 0): position 0 occupied, rest of the page free.
    chan.push_inbound(&ack(status::OK, &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00], address));
    // template_index(pages 1..3): fully free.
    for _ in 0..3 {
        chan.push_inbound(&ack(status::OK, &[0x00; 6], address));
    }
    // load_template(0, BUFFER1) -> OK
    chan.push_inbound(&ack(status::OK, &[], address));
    // download_characteristics(BUFFER1): command ack + END_DATA stream.
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&frame(PacketType::EndData, data, address));
}

/// Spec §8 Scenario S5: export records, clear and re-import the same data,
/// export again, and confirm the resulting records match by `sha256_hex`.
#[tokio::test]
async fn database_export_import_round_trip_matches_by_hash() {
    let address = SessionConfig::default().address;
    let data = [1u8, 2, 3, 4];
    let mut chan = MockChannel::new();

    push_export_single_record(&mut chan, address, &data);

    // import_database(&[data]): capacity check, clear_database, upload +
    // readback, store_template(0, BUFFER1).
    push_default_params(&mut chan, address);
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&ack(status::OK, &[], address));
    chan.push_inbound(&frame(PacketType::EndData, &data, address));
    chan.push_inbound(&ack(status::OK, &[], address));

    push_export_single_record(&mut chan, address, &data);

    let mut engine = SensorEngine::new(chan, SessionConfig::default());

    let before = workflows::export_database(&mut engine).await.unwrap();
    workflows::import_database(&mut engine, &[data.to_vec()]).await.unwrap();
    let after = workflows::export_database(&mut engine).await.unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 1);
    assert_eq!(before[0].position, after[0].position);
    assert_eq!(before[0].sha256_hex, after[0].sha256_hex);
}
