mod common;

use aircraftdb::records::EntityKind;
use common::*;
use rust_xlsxwriter::Workbook;
use serde_json::json;

#[test]
fn test_last_row_for_a_code_wins() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_acftref(
        data.path(),
        &[
            &acftref_row("X1", "ACME", "Z", "4", 2),
            &acftref_row("X1", "ACME", "Z2", "4", 2),
        ],
    );

    let summary = test_store.ingestor().ingest_directory(data.path()).unwrap();

    let model = test_store.store().get_model("X1").unwrap().unwrap();
    assert_eq!(model.model.as_deref(), Some("Z2"));
    assert_eq!(summary.store_stats.count(EntityKind::AircraftModel), 1);
    assert_eq!(summary.errors, 0);
}

#[test]
fn test_reingesting_a_directory_is_idempotent() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_acftref(
        data.path(),
        &[
            &acftref_row("2072738", "CESSNA", "172S", "4", 4),
            &acftref_row("7100510", "PIPER", "PA-28-181", "4", 4),
        ],
    );
    write_engine(data.path(), &["41514,LYCOMING,IO-360-L2A,1,180,0,"]);
    write_master(
        data.path(),
        &[
            &master_row("739HB", "2072738", "41514", "2001", "SMITH JOHN", "WICHITA", "KS", "A9D1F4"),
            &master_row("12345", "7100510", "", "1978", "DOE JANE", "TOPEKA", "KS", "A0D1AE"),
            &master_row("", "7100510", "", "1978", "NO KEY", "TOPEKA", "KS", ""),
        ],
    );

    let first = test_store.ingestor().ingest_directory(data.path()).unwrap();
    let second = test_store.ingestor().ingest_directory(data.path()).unwrap();

    assert_eq!(first.store_stats, second.store_stats);
    assert_eq!(second.store_stats.count(EntityKind::Registration), 2);
    assert_eq!(second.store_stats.count(EntityKind::AircraftModel), 2);
    assert_eq!(second.store_stats.count(EntityKind::Engine), 1);
    assert_eq!(second.errors, 0);

    let master = second.file("MASTER.txt").unwrap();
    assert_eq!(master.records_written, 2);
    assert_eq!(master.records_dropped, 1);

    // Registry is processed after the reference files
    let order: Vec<&str> = second
        .files_processed
        .iter()
        .map(|f| f.file.as_str())
        .collect();
    assert_eq!(order, vec!["ACFTREF.txt", "ENGINE.txt", "MASTER.txt"]);
}

#[test]
fn test_raw_keeps_unmapped_columns() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_master(
        data.path(),
        &[&master_row("739HB", "2072738", "41514", "2001", "SMITH JOHN", "WICHITA", "KS", "a9d1f4")],
    );

    test_store.ingestor().ingest_directory(data.path()).unwrap();

    let entry = test_store.store().get_registration("N739HB").unwrap().unwrap();
    assert_eq!(entry.mode_s_hex.as_deref(), Some("A9D1F4"));
    assert_eq!(entry.year_mfr, Some(2001));
    assert!(entry.raw.contains_key("OTHER NAMES(1)"));
    assert_eq!(entry.raw.get("ZIP CODE").map(String::as_str), Some("67202"));
    assert_eq!(entry.raw.len(), 30);
}

#[test]
fn test_joined_lookup_after_ingest() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_acftref(data.path(), &[&acftref_row("2072738", "CESSNA", "172S", "4", 4)]);
    write_engine(data.path(), &["41514,LYCOMING,IO-360-L2A,1,180,0,"]);
    write_master(
        data.path(),
        &[&master_row("739HB", "2072738", "41514", "2001", "SMITH JOHN", "WICHITA", "KS", "A9D1F4")],
    );

    test_store.ingestor().ingest_directory(data.path()).unwrap();

    let details = test_store.store().get_with_joins("a9d1f4").unwrap().unwrap();
    assert_eq!(details.registration.n_number, "739HB");
    assert_eq!(details.model_manufacturer.as_deref(), Some("CESSNA"));
    assert_eq!(details.engine_model.as_deref(), Some("IO-360-L2A"));
    assert_eq!(details.engine_horsepower, Some(180));
}

#[test]
fn test_dealer_and_deregistration_files() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_dealer(
        data.path(),
        &["AA001,1,20200101,20250101,Y,2,ACME AIRCRAFT SALES,1 HANGAR RD,,WICHITA,KS,67202,"],
    );
    write_dereg(
        data.path(),
        &[
            "12345,SN1,2072738,A,PREVIOUS OWNER,A0D1AE,20150301,",
            "12345,SN1,2072738,A,OTHER OWNER,A0D1AE,20190701,",
            "12345,SN1,2072738,A,UNKNOWN DATE,A0D1AE,,",
        ],
    );

    let summary = test_store.ingestor().ingest_directory(data.path()).unwrap();
    assert_eq!(summary.store_stats.count(EntityKind::Dealer), 1);
    assert_eq!(summary.store_stats.count(EntityKind::Deregistered), 3);

    let dealer = test_store.store().get_dealer("AA001").unwrap().unwrap();
    assert_eq!(dealer.name.as_deref(), Some("ACME AIRCRAFT SALES"));
    assert_eq!(dealer.state.as_deref(), Some("KS"));

    let history = test_store.store().deregistration_history("N12345").unwrap();
    let dates: Vec<&str> = history.iter().map(|d| d.cancel_date.as_str()).collect();
    assert_eq!(dates, vec!["20190701", "20150301", ""]);

    // A missing cancel date still upserts in place on a second run
    test_store.ingestor().ingest_directory(data.path()).unwrap();
    let stats = test_store.store().stats().unwrap();
    assert_eq!(stats.count(EntityKind::Deregistered), 3);
}

#[test]
fn test_corrupt_secondary_file_is_isolated() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_acftref(data.path(), &[&acftref_row("X1", "ACME", "Z", "4", 2)]);
    write_engine(data.path(), &["E1,ACME,V8,1,300,0,"]);
    write_file(data.path(), "broken.json", b"{\"tail\": \"N1\",");

    let summary = test_store.ingestor().ingest_directory(data.path()).unwrap();

    assert_eq!(summary.files_processed.len(), 2);
    assert_eq!(summary.store_stats.count(EntityKind::AircraftModel), 1);
    assert_eq!(summary.store_stats.count(EntityKind::Engine), 1);
    let skipped = summary.skipped("broken.json").unwrap();
    assert!(skipped.is_error());
}

#[test]
fn test_windows_1252_file_ingests() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    let mut contents = ACFTREF_HEADER.as_bytes().to_vec();
    contents.extend_from_slice(b"\r\nAS350,A\xC9ROSPATIALE,AS 350 B2,6,3,1,0,1,6,CLASS 2,0,,,\r\n");
    write_file(data.path(), "ACFTREF.txt", &contents);

    let summary = test_store.ingestor().ingest_directory(data.path()).unwrap();
    assert_eq!(summary.errors, 0);

    let model = test_store.store().get_model("AS350").unwrap().unwrap();
    assert_eq!(model.manufacturer.as_deref(), Some("A\u{c9}ROSPATIALE"));
    assert_eq!(model.num_seats, Some(6));
}

#[test]
fn test_unsupported_and_hidden_files() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_file(data.path(), "README.pdf", b"%PDF-1.4");
    write_file(data.path(), "notes.txt", b"not an authority file");
    write_file(data.path(), ".DS_Store", b"\0\0\0\x01Bud1");
    std::fs::create_dir(data.path().join("archive")).unwrap();
    write_acftref(&data.path().join("archive"), &[&acftref_row("X1", "ACME", "Z", "4", 2)]);

    let summary = test_store.ingestor().ingest_directory(data.path()).unwrap();

    assert!(summary.files_processed.is_empty());
    assert_eq!(summary.files_skipped.len(), 2);
    assert!(!summary.skipped("README.pdf").unwrap().is_error());
    assert!(!summary.skipped("notes.txt").unwrap().is_error());
    assert!(summary.skipped(".DS_Store").is_none());
    assert_eq!(summary.store_stats.total(), 0);
}

#[test]
fn test_missing_directory_fails() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    let missing = data.path().join("nope");

    let err = test_store.ingestor().ingest_directory(&missing).unwrap_err();
    assert!(err.to_string().contains("Directory not found"));
}

#[test]
fn test_secondary_formats_become_custom_records() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    write_file(
        data.path(),
        "fleet.csv",
        b"Tail Number,Year,Notes\nN1,1998,\nN2,2004,leased\n,,\n",
    );
    write_file(
        data.path(),
        "owners.json",
        br#"[{"name": "ACME", "planes": 3}, {"name": "BETA", "active": true}]"#,
    );
    write_file(data.path(), "events.jsonl", b"{\"tail\": \"N1\"}\n\n{\"tail\": \"N2\"}\n");

    let xlsx = data.path().join("hangars.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Hangars").unwrap();
    sheet.write_string(0, 0, "Hangar ID").unwrap();
    sheet.write_string(0, 1, "Capacity").unwrap();
    sheet.write_string(1, 0, "H1").unwrap();
    sheet.write_number(1, 1, 4.0).unwrap();
    sheet.write_string(2, 0, "H2").unwrap();
    sheet.write_number(2, 1, 2.0).unwrap();
    workbook.save(&xlsx).unwrap();

    let summary = test_store.ingestor().ingest_directory(data.path()).unwrap();
    let store = test_store.store();

    assert_eq!(summary.errors, 0);
    assert!(summary.files_skipped.is_empty());
    assert_eq!(summary.records_by_table.get("fleet"), Some(&2));
    assert_eq!(summary.records_by_table.get("Hangars"), Some(&2));
    assert_eq!(summary.records_by_table.get("data"), Some(&4));
    assert_eq!(summary.store_stats.count(EntityKind::Custom), 8);

    let fleet = store.custom_records("fleet", None).unwrap();
    assert_eq!(fleet[0].data["tail_number"], json!("N1"));
    assert_eq!(fleet[0].data["year"], json!(1998));
    assert!(!fleet[0].data.contains_key("notes"));
    assert_eq!(fleet[1].data["notes"], json!("leased"));

    let hangars = store.custom_records("Hangars", None).unwrap();
    assert_eq!(hangars[0].data["hangar_id"], json!("H1"));
    assert_eq!(hangars[0].data["capacity"], json!(4));
}

#[test]
fn test_ingest_single_file() {
    let test_store = TestStore::new().unwrap();
    let data = data_dir();
    let path = write_engine(data.path(), &["41514,LYCOMING,IO-360-L2A,1,180,0,", ",NO CODE,,,,,"]);

    let summary = test_store.ingestor().ingest_file(&path).unwrap();

    let engine = summary.file("ENGINE.txt").unwrap();
    assert_eq!(engine.records_written, 1);
    assert_eq!(engine.records_dropped, 1);
    assert_eq!(summary.store_stats.count(EntityKind::Engine), 1);

    let missing = data.path().join("MASTER.txt");
    assert!(test_store.ingestor().ingest_file(&missing).is_err());
}
