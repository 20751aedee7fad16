use std::collections::BTreeSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use skidlog::{
    core::{
        checksum::{luhn_check_digit, luhn_is_valid},
        store::MemoryRecordStore,
    },
    intake::{IntakeRequest, run_intake},
    persist::RecordStore,
    skid::RecordFilter,
    types::{SkidStatus, SortOrder},
    vendor::{Vendor, VendorDirectory},
};

fn directory() -> VendorDirectory {
    VendorDirectory::new((0..4).map(|i| Vendor {
        vendor_code: format!("V{i}"),
        vendor_name: format!("Vendor {i}"),
    }))
}

#[derive(Debug, Clone)]
enum Action {
    Intake { vendor: u8, skids: u8 },
    Scan { target: u16 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..6, 0u8..12).prop_map(|(vendor, skids)| Action::Intake { vendor, skids }),
        any::<u16>().prop_map(|target| Action::Scan { target }),
    ]
}

proptest! {
    #[test]
    fn appended_check_digit_always_validates(digits in "[0-9]{1,40}") {
        let d = luhn_check_digit(&digits).unwrap();
        prop_assert!(d <= 9);
        let full = format!("{digits}{d}");
        prop_assert!(luhn_is_valid(&full));
    }

    #[test]
    fn single_digit_substitution_is_detected(digits in "[0-9]{19}", pos in 0usize..19, delta in 1u8..10) {
        let d = luhn_check_digit(&digits).unwrap();
        let mut bytes = format!("{digits}{d}").into_bytes();
        bytes[pos] = b'0' + (bytes[pos] - b'0' + delta) % 10;
        let tampered = String::from_utf8(bytes).unwrap();
        prop_assert!(!luhn_is_valid(&tampered));
    }

    #[test]
    fn random_intakes_and_scans_keep_sn_and_serial_invariants(actions in prop::collection::vec(action_strategy(), 1..60)) {
        let dir = directory();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let mut store = MemoryRecordStore::new();
        let mut done = BTreeSet::new();

        for action in actions {
            match action {
                Action::Intake { vendor, skids } => {
                    let before = store.max_sn().unwrap();
                    let req = IntakeRequest {
                        vendor_code: format!("V{vendor}"),
                        total_skids: u32::from(skids),
                        invoice_no: format!("INV-{before}"),
                    };
                    let res = run_intake(&mut store, &dir, date, &req, 10);
                    match res {
                        Ok(receipt) => {
                            let sns: Vec<u64> = receipt.records.iter().map(|r| r.sn).collect();
                            let expected: Vec<u64> = (before + 1..=before + u64::from(skids)).collect();
                            prop_assert_eq!(sns, expected);
                            let positions: Vec<u32> = receipt.records.iter().map(|r| r.current_skid).collect();
                            prop_assert_eq!(positions, (1..=u32::from(skids)).collect::<Vec<_>>());
                        }
                        Err(_) => prop_assert_eq!(store.max_sn().unwrap(), before),
                    }
                }
                Action::Scan { target } => {
                    let all = store.query(&RecordFilter::all(), SortOrder::Ascending).unwrap();
                    if all.is_empty() {
                        continue;
                    }
                    let serial = all[usize::from(target) % all.len()].serial_no.clone();
                    let changed = store.set_status_done(&serial).unwrap();
                    prop_assert_eq!(changed, done.insert(serial));
                }
            }
        }

        let all = store.query(&RecordFilter::all(), SortOrder::Ascending).unwrap();
        let sns: Vec<u64> = all.iter().map(|r| r.sn).collect();
        prop_assert_eq!(sns, (1..=all.len() as u64).collect::<Vec<_>>());

        let serials: BTreeSet<&str> = all.iter().map(|r| r.serial_no.as_str()).collect();
        prop_assert_eq!(serials.len(), all.len());
        prop_assert!(all.iter().all(|r| luhn_is_valid(&r.serial_no)));

        let done_count = store.count(&RecordFilter::all(), Some(SkidStatus::Done)).unwrap();
        prop_assert_eq!(done_count, done.len() as u64);
    }
}
