/// Workbook storage tests
/// Covers header creation, idempotent initialization, round-trips and concurrent appends
use solar_lead_api::models::{Lead, LEAD_COLUMNS};
use solar_lead_api::spreadsheet::{self, LeadSheet, SHEET_NAME};
use std::path::Path;
use std::time::Duration;

fn sample_lead(name: &str) -> Lead {
    Lead {
        received_at: "2026-10-19T08:15:02.123456".to_string(),
        name: name.to_string(),
        phone: "+92 300 1234567".to_string(),
        email: "ali@example.com".to_string(),
        city: "Lahore".to_string(),
        lead_type: "Residential".to_string(),
        monthly_bill: "20000".to_string(),
        estimated_kw: "10".to_string(),
        notes: "Roof faces south".to_string(),
    }
}

/// Writes `count` leads in one save so later appends have real work to do.
fn seed_workbook(path: &Path, count: u32) {
    spreadsheet::ensure(path).unwrap();
    let mut book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
    let sheet = book.get_sheet_by_name_mut(SHEET_NAME).unwrap();
    for row in 2..count + 2 {
        let lead = sample_lead(&format!("Seed {}", row));
        for (index, value) in lead.row().iter().enumerate() {
            sheet
                .get_cell_mut((index as u32 + 1, row))
                .set_value_string(*value);
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

#[test]
fn test_ensure_twice_keeps_single_header_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.xlsx");

    spreadsheet::ensure(&path).unwrap();
    spreadsheet::ensure(&path).unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name(SHEET_NAME).unwrap();
    assert_eq!(sheet.get_highest_row(), 1);
    assert_eq!(sheet.get_value((1, 1)), "received_at");
    assert_eq!(sheet.get_value((9, 1)), "notes");
}

#[test]
fn test_ensure_leaves_existing_rows_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.xlsx");

    spreadsheet::append(&path, &sample_lead("Ali")).unwrap();
    spreadsheet::ensure(&path).unwrap();

    assert_eq!(spreadsheet::read_leads(&path).unwrap().len(), 1);
}

#[test]
fn test_appended_lead_round_trips_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.xlsx");
    let first = sample_lead("Ali");
    let second = Lead {
        name: "Sara".to_string(),
        ..Lead::default()
    };

    spreadsheet::append(&path, &first).unwrap();
    spreadsheet::append(&path, &second).unwrap();

    let leads = spreadsheet::read_leads(&path).unwrap();
    assert_eq!(leads, vec![first, second]);
}

#[test]
fn test_every_column_is_written_for_sparse_leads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.xlsx");
    let lead = Lead {
        received_at: "2026-10-19T08:15:02.123456".to_string(),
        city: "Karachi".to_string(),
        ..Lead::default()
    };

    spreadsheet::append(&path, &lead).unwrap();

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name(SHEET_NAME).unwrap();
    assert_eq!(sheet.get_highest_row(), 2);
    let row: Vec<String> = (1..=LEAD_COLUMNS.len() as u32)
        .map(|col| sheet.get_value((col, 2)))
        .collect();
    assert_eq!(
        row,
        vec!["2026-10-19T08:15:02.123456", "", "", "", "Karachi", "", "", "", ""]
    );
}

#[tokio::test]
async fn test_concurrent_appends_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = LeadSheet::new(dir.path().join("leads.xlsx"));

    let mut handles = vec![];
    for i in 0..8 {
        let sheet = sheet.clone();
        handles.push(tokio::spawn(async move {
            sheet.append(sample_lead(&format!("Lead {}", i))).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut names: Vec<String> = sheet
        .read_leads()
        .await
        .unwrap()
        .into_iter()
        .map(|lead| lead.name)
        .collect();
    names.sort();

    let mut expected: Vec<String> = (0..8).map(|i| format!("Lead {}", i)).collect();
    expected.sort();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_dropped_append_does_not_race_next_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.xlsx");
    seed_workbook(&path, 300);
    let sheet = LeadSheet::new(&path);

    for round in 0..5 {
        let before = sheet.read_leads().await.unwrap().len();

        // The caller gives up while the save is still running on the blocking pool
        let dropped = format!("Dropped {}", round);
        let _ = tokio::time::timeout(
            Duration::from_millis(1),
            sheet.append(sample_lead(&dropped)),
        )
        .await;

        let next = format!("Next {}", round);
        sheet.append(sample_lead(&next)).await.unwrap();

        let leads = sheet.read_leads().await.unwrap();
        assert_eq!(leads.len(), before + 2, "round {}", round);
        assert!(leads.iter().any(|lead| lead.name == dropped));
        assert!(leads.iter().any(|lead| lead.name == next));
    }
}
