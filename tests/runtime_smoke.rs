mod common;

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use chrono::NaiveDate;

use common::DownStore;
use skidlog::{
    core::{
        serial::{FixedClock, MAX_UNIQUE_ID, SerialError},
        store::MemoryRecordStore,
    },
    intake::{IntakeError, IntakeRequest, ScanOutcome},
    persist::{PersistError, RecordStore, sqlite::SqliteRecordStore},
    runtime::{
        events::SkidEvent,
        handle::{RuntimeConfig, RuntimeError, SkidLogHandle, spawn_skidlog},
    },
    skid::RecordFilter,
    types::{SkidStatus, SortOrder},
    vendor::{Vendor, VendorDirectory},
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

fn directory() -> VendorDirectory {
    VendorDirectory::new([
        Vendor {
            vendor_code: "V0".to_string(),
            vendor_name: "Seed Co".to_string(),
        },
        Vendor {
            vendor_code: "V1".to_string(),
            vendor_name: "Acme".to_string(),
        },
    ])
}

fn request(vendor: &str, skids: u32, invoice: &str) -> IntakeRequest {
    IntakeRequest {
        vendor_code: vendor.to_string(),
        total_skids: skids,
        invoice_no: invoice.to_string(),
    }
}

fn spawn(store: Box<dyn RecordStore>, config: RuntimeConfig) -> SkidLogHandle {
    spawn_skidlog(store, directory(), Arc::new(FixedClock(today())), config)
}

#[tokio::test]
async fn intake_after_ten_existing_skids_numbers_from_eleven() {
    let handle = spawn(Box::new(MemoryRecordStore::new()), RuntimeConfig::default());
    handle.intake(request("V0", 10, "SEED")).await.expect("seed");
    assert_eq!(handle.max_sn().await.unwrap(), 10);

    let receipt = handle.intake(request("V1", 3, "INV-1")).await.expect("intake");
    let sns: Vec<u64> = receipt.records.iter().map(|r| r.sn).collect();
    let positions: Vec<u32> = receipt.records.iter().map(|r| r.current_skid).collect();
    assert_eq!(sns, vec![11, 12, 13]);
    assert_eq!(positions, vec![1, 2, 3]);

    let serials: BTreeSet<&str> = receipt.records.iter().map(|r| r.serial_no.as_str()).collect();
    assert_eq!(serials.len(), 3);
    for rec in &receipt.records {
        assert_eq!(rec.status, SkidStatus::Open);
        assert_eq!(rec.vendor_name, "Acme");
        assert_eq!(rec.invoice_no, "INV-1");
        assert_eq!(rec.total_skids, 3);
        assert_eq!(rec.serial_no.len(), 20);
        assert!(rec.serial_no.starts_with("0401"));
    }

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn scanning_a_serial_completes_it_once_and_updates_summary() {
    let handle = spawn(Box::new(MemoryRecordStore::new()), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let receipt = handle.intake(request("V1", 2, "INV-9")).await.expect("intake");
    let serial = receipt.records[0].serial_no.clone();

    let first = handle.scan(format!("  {serial} ")).await.expect("scan");
    assert!(matches!(&first, ScanOutcome::Completed { record } if record.status == SkidStatus::Done));

    let second = handle.scan(serial.clone()).await.expect("rescan");
    assert_eq!(second, ScanOutcome::AlreadyDone { serial_no: serial.clone() });
    assert!(!handle.mark_done(serial.clone()).await.unwrap());

    let summary = handle.daily_summary(None).await.expect("summary");
    let acme = summary.vendor("V1").expect("vendor row");
    assert_eq!(acme.finished_tasks, 1);
    assert_eq!(acme.total_tasks, 2);

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        seen.push(evt);
    }
    assert!(matches!(&seen[0], SkidEvent::BatchCommitted { first_sn: 1, last_sn: 2, .. }));
    assert_eq!(seen[1], SkidEvent::SkidCompleted { sn: 1, serial_no: serial });

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn non_serial_scans_route_to_vendor_lookup() {
    let handle = spawn(Box::new(MemoryRecordStore::new()), RuntimeConfig::default());

    let found = handle.scan("V1").await.unwrap();
    assert!(matches!(found, ScanOutcome::VendorFound { vendor } if vendor.vendor_name == "Acme"));

    let missing = handle.scan("ZZZ").await.unwrap();
    assert_eq!(missing, ScanOutcome::UnknownVendor { code: "ZZZ".to_string() });

    let unknown = handle.scan("04012025015000000999").await.unwrap();
    assert!(matches!(unknown, ScanOutcome::UnknownSerial { .. }));
}

#[tokio::test]
async fn checksum_verification_rejects_misscans_when_enabled() {
    let config = RuntimeConfig {
        verify_scan_checksum: true,
        ..RuntimeConfig::default()
    };
    let handle = spawn(Box::new(MemoryRecordStore::new()), config);
    let receipt = handle.intake(request("V1", 1, "INV")).await.unwrap();
    let serial = receipt.records[0].serial_no.clone();

    let mut misscan = serial.clone();
    let last = misscan.pop().unwrap();
    misscan.push(if last == '0' { '1' } else { '0' });

    assert_eq!(
        handle.scan(misscan.clone()).await.unwrap(),
        ScanOutcome::Rejected { code: misscan }
    );
    assert!(matches!(handle.scan(serial).await.unwrap(), ScanOutcome::Completed { .. }));
}

#[tokio::test]
async fn unknown_vendor_creates_no_records() {
    let handle = spawn(Box::new(MemoryRecordStore::new()), RuntimeConfig::default());
    let err = handle.intake(request("ZZZ", 3, "INV-1")).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Intake(IntakeError::UnknownVendor(ref c)) if c == "ZZZ"));
    assert_eq!(handle.count(RecordFilter::all(), None).await.unwrap(), 0);

    let err = handle.intake(request("V1", 0, "INV-1")).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Intake(IntakeError::InvalidBatch { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_intakes_never_collide() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    let store = SqliteRecordStore::open(tmp.path().join("skids.db")).expect("open");
    let handle = spawn(Box::new(store), RuntimeConfig::default());

    let mut tasks = Vec::new();
    for i in 0..16u32 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle
                .intake(request("V1", 1 + i % 4, &format!("INV-{i}")))
                .await
                .expect("intake")
        }));
    }

    let mut expected_total = 0u64;
    for task in tasks {
        let receipt = task.await.expect("join");
        let first = receipt.first_sn().unwrap();
        for (offset, rec) in receipt.records.iter().enumerate() {
            assert_eq!(rec.sn, first + offset as u64);
            assert_eq!(rec.current_skid as usize, offset + 1);
        }
        expected_total += receipt.records.len() as u64;
    }

    let all = handle
        .query(RecordFilter::all(), SortOrder::Ascending)
        .await
        .unwrap();
    let sns: Vec<u64> = all.iter().map(|r| r.sn).collect();
    assert_eq!(sns, (1..=expected_total).collect::<Vec<_>>());
    let serials: BTreeSet<&str> = all.iter().map(|r| r.serial_no.as_str()).collect();
    assert_eq!(serials.len() as u64, expected_total);

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(handle.max_sn().await, Err(RuntimeError::ChannelClosed)));
}

#[tokio::test]
async fn unreachable_store_fails_closed() {
    let handle = spawn(Box::new(DownStore), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let err = handle.intake(request("V1", 2, "INV-1")).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Intake(IntakeError::Persist(PersistError::Unavailable(_)))));

    let err = handle.scan("04012025015000000019").await.unwrap_err();
    assert!(matches!(err, RuntimeError::Persist(PersistError::Unavailable(_))));

    let err = handle.daily_summary(None).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Persist(PersistError::Unavailable(_))));

    // Vendor-code scans never touch the store.
    assert!(matches!(handle.scan("V1").await.unwrap(), ScanOutcome::VendorFound { .. }));

    assert!(
        tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn counter_overflow_surfaces_and_writes_nothing() {
    let store = MemoryRecordStore::with_counter(MAX_UNIQUE_ID - 1);
    let handle = spawn(Box::new(store), RuntimeConfig::default());

    let err = handle.intake(request("V1", 3, "INV-1")).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Intake(IntakeError::Serial(SerialError::CounterOverflow { .. }))
    ));
    assert_eq!(handle.max_sn().await.unwrap(), 0);
    assert_eq!(handle.count(RecordFilter::all(), None).await.unwrap(), 0);
}
