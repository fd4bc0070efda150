use rusqlite::{Connection, params};

use super::*;
use crate::classify::EpochTransitions;

fn seeded_source() -> SqliteRunSource {
    let connection = Connection::open_in_memory().expect("in-memory sqlite");
    ensure_schema(&connection).expect("schema");

    let runs = [
        ("64080", "2012-09-01 03:15:00", 15, "observing"),
        ("45001", "2009-03-02 05:00:00", 7, "obsFilter"),
        ("45002", "2009-03-03 05:00:00", 7, "observing"),
        ("70123", "2013-12-02 07:30:00", 14, "obsLowHV"),
        ("99999", "2013-12-02 07:30:00", 31, "observing"),
    ];
    for (run_id, start, config_mask, run_type) in runs {
        connection
            .execute(
                "INSERT INTO tblRun_Info(run_id, data_start_time, config_mask, run_type) VALUES(?1, ?2, ?3, ?4)",
                params![run_id, start, config_mask, run_type],
            )
            .expect("insert run");
    }

    connection
        .execute(
            "INSERT INTO tblRun_Analysis_Comments(run_id, tel_cut_mask) VALUES('45001', 'NULL')",
            [],
        )
        .expect("insert comment");
    connection
        .execute(
            "INSERT INTO tblRun_Analysis_Comments(run_id, tel_cut_mask) VALUES('45002', 0)",
            [],
        )
        .expect("insert comment");
    connection
        .execute(
            "INSERT INTO tblRun_Analysis_Comments(run_id, tel_cut_mask) VALUES('70123', 1)",
            [],
        )
        .expect("insert comment");

    SqliteRunSource::from_connection(connection, EpochTransitions::default())
}

#[test]
fn lookup_computes_day_differences_against_epoch_dates() {
    let source = seeded_source();
    let record = source.lookup("64080").expect("lookup").expect("row");

    assert_eq!(record.config_mask, 15);
    assert_eq!(record.days_since_upgrade, 0);
    assert_eq!(record.days_since_t1_move, 1096);
    assert_eq!(record.tel_cut_mask, None);
    assert_eq!(record.run_type, "observing");
}

#[test]
fn lookup_normalizes_null_literal_cut_mask() {
    let source = seeded_source();
    let record = source.lookup("45001").expect("lookup").expect("row");

    assert_eq!(record.tel_cut_mask, None);
    assert!(record.days_since_t1_move < 0);
}

#[test]
fn lookup_treats_zero_cut_mask_as_no_dqm_report() {
    let source = seeded_source();
    let record = source.lookup("45002").expect("lookup").expect("row");

    assert_eq!(record.tel_cut_mask, None);
    assert_eq!(record.config_mask, 7);
}

#[test]
fn lookup_reads_integer_cut_mask_as_text() {
    let source = seeded_source();
    let record = source.lookup("70123").expect("lookup").expect("row");

    assert_eq!(record.tel_cut_mask.as_deref(), Some("1"));
}

#[test]
fn lookup_returns_none_for_unknown_run() {
    let source = seeded_source();
    assert!(source.lookup("00000").expect("lookup").is_none());
}

#[test]
fn lookup_rejects_out_of_range_config_mask() {
    let source = seeded_source();
    let err = source.lookup("99999").expect_err("mask 31 must fail");
    assert!(err.to_string().contains("outside 0..=15"));
}

#[test]
fn run_path_parser_extracts_fixed_width_run_id() {
    let parser = RunPathParser::new().expect("parser");

    let entry = parser
        .parse_line("/data/stage5/64080.stage5.root\n")
        .expect("non-empty line")
        .expect("valid path");
    assert_eq!(entry.run_id, "64080");
    assert_eq!(entry.path, "/data/stage5/64080.stage5.root");

    let bare = parser
        .parse_line("45001.stage5.root")
        .expect("non-empty line")
        .expect("valid path");
    assert_eq!(bare.run_id, "45001");
}

#[test]
fn run_path_parser_skips_blank_and_comment_lines() {
    let parser = RunPathParser::new().expect("parser");
    assert!(parser.parse_line("   ").is_none());
    assert!(parser.parse_line("# winter runs").is_none());
}

#[test]
fn run_path_parser_reports_short_paths() {
    let parser = RunPathParser::new().expect("parser");

    let err = parser
        .parse_line("/data/123.stage5.root")
        .expect("non-empty line")
        .expect_err("too short");
    assert_eq!(
        err,
        ClassifyError::MalformedRunPath("/data/123.stage5.root".to_string())
    );

    assert!(
        parser
            .parse_line("/data/64080.stage4.root")
            .expect("non-empty line")
            .is_err()
    );
}
