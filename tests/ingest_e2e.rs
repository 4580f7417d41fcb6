use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use rusqlite::Connection;
use spot_price_history::{
    config::IngestConfig,
    db::{pricing, Db},
    ingest::{FileState, IngestDriver},
};

const SAMPLE: &str = r#"
about:
  timestamp: 1700000000
compute:
  instance:
    n1-standard-1:
      cost:
        us-central1:
          hour: 0.05
          hour_spot: 0.015
"#;

fn snapshot(ts: i64, spot: f64) -> String {
    format!(
        r#"
about:
  timestamp: {ts}
compute:
  instance:
    e2-standard-2:
      cpu: 2
      ram: 8
      cost:
        us-east1: {{hour: 0.067, hour_spot: {spot}}}
        asia-east1: {{hour: 0.078, hour_spot: {spot}}}
    n1-standard-1:
      cost:
        us-east1: {{hour: 0.0475, hour_spot: 0.01}}
"#
    )
}

fn config(root: &Path, batch: usize) -> IngestConfig {
    IngestConfig {
        db_path: root.join("db.sqlite3"),
        data_dir: root.join("data"),
        batch_size: NonZeroUsize::new(batch).unwrap(),
    }
}

fn row_count(path: &Path) -> i64 {
    let conn = Connection::open(path).unwrap();
    pricing::total_records(&conn).unwrap()
}

#[test]
fn sample_snapshot_yields_one_record() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path(), 2000);
    fs::create_dir(&cfg.data_dir).unwrap();
    fs::write(cfg.data_dir.join("sample.yml"), SAMPLE).unwrap();

    let mut db = Db::open(&cfg.db_path).unwrap();
    let report = IngestDriver::new(cfg.clone()).run(&mut db).unwrap();
    assert_eq!(report.succeeded().count(), 1);
    drop(db);

    let conn = Connection::open(&cfg.db_path).unwrap();
    let row: (String, String, f64, f64, i64, String) = conn
        .query_row(
            "SELECT machine_type, region_name, hour_price, spot_hour_price, updated_ts, updated FROM pricing_history",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )
        .unwrap();
    assert_eq!(
        row,
        (
            "n1-standard-1".to_string(),
            "us-central1".to_string(),
            0.05,
            0.015,
            1_700_000_000,
            "2023-11-14T22:13:20Z".to_string(),
        )
    );
}

#[test]
fn unparsable_file_does_not_stop_the_run() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path(), 2);
    fs::create_dir(&cfg.data_dir).unwrap();
    fs::write(cfg.data_dir.join("01.yml"), snapshot(1_700_000_000, 0.02)).unwrap();
    fs::write(cfg.data_dir.join("02.yml"), "about: [unclosed\n").unwrap();
    fs::write(cfg.data_dir.join("03.yml"), snapshot(1_700_003_600, 0.03)).unwrap();

    let mut db = Db::open(&cfg.db_path).unwrap();
    let report = IngestDriver::new(cfg.clone()).run(&mut db).unwrap();

    let states: Vec<(&str, FileState)> = report
        .files
        .iter()
        .map(|f| (f.file_name.as_str(), f.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("01.yml", FileState::Done),
            ("02.yml", FileState::Failed),
            ("03.yml", FileState::Done),
        ]
    );
    assert_eq!(report.files[1].failed_stage, Some(FileState::Parsing));
    assert_eq!(report.rows_inserted(), 6);
    drop(db);

    assert_eq!(row_count(&cfg.db_path), 6);
}

#[test]
fn rerun_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path(), 1);
    fs::create_dir(&cfg.data_dir).unwrap();
    fs::write(cfg.data_dir.join("a.yml"), snapshot(1_700_000_000, 0.02)).unwrap();

    let driver = IngestDriver::new(cfg.clone());
    let mut db = Db::open(&cfg.db_path).unwrap();
    let first = driver.run(&mut db).unwrap();
    drop(db);

    let mut db = Db::open(&cfg.db_path).unwrap();
    let second = driver.run(&mut db).unwrap();
    drop(db);

    assert_eq!(first.rows_inserted(), 3);
    assert_eq!(second.rows_inserted(), 0);
    assert_eq!(second.files[0].load.ignored, 3);
    assert_eq!(row_count(&cfg.db_path), 3);
}

#[test]
fn catalog_records_each_machine_once() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path(), 2000);
    fs::create_dir(&cfg.data_dir).unwrap();
    fs::write(cfg.data_dir.join("a.yml"), snapshot(1_700_000_000, 0.02)).unwrap();
    fs::write(cfg.data_dir.join("b.yml"), snapshot(1_700_003_600, 0.03)).unwrap();

    let mut db = Db::open(&cfg.db_path).unwrap();
    IngestDriver::new(cfg.clone()).run(&mut db).unwrap();

    let mut stmt = db
        .conn
        .prepare("SELECT family, machine_type, cpu_cores, memory_gb FROM machine_type ORDER BY machine_type")
        .unwrap();
    let rows: Vec<(String, String, Option<i64>, Option<f64>)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            ("e2".to_string(), "e2-standard-2".to_string(), Some(2), Some(8.0)),
            ("n1".to_string(), "n1-standard-1".to_string(), None, None),
        ]
    );
}

#[test]
fn read_queries_see_imported_history() {
    let root = tempfile::tempdir().unwrap();
    let cfg = config(root.path(), 2000);
    fs::create_dir(&cfg.data_dir).unwrap();
    fs::write(cfg.data_dir.join("a.yml"), snapshot(1_700_000_000, 0.02)).unwrap();
    fs::write(cfg.data_dir.join("b.yml"), snapshot(1_700_003_600, 0.005)).unwrap();

    let mut db = Db::open(&cfg.db_path).unwrap();
    IngestDriver::new(cfg.clone()).run(&mut db).unwrap();
    drop(db);

    let conn = Db::open_read_only(&cfg.db_path).unwrap();
    assert_eq!(
        pricing::all_regions(&conn).unwrap(),
        vec!["asia-east1".to_string(), "us-east1".to_string()]
    );

    let detail = pricing::machine_detail(&conn, "us-east1", "e2-standard-2")
        .unwrap()
        .unwrap();
    assert_eq!(detail.min_hour_spot_price, 0.005);
    assert_eq!(detail.max_hour_spot_price, 0.02);
    assert_eq!(detail.hour_spot_price, 0.005);
    assert_eq!(detail.spot_hour_price_history.len(), 2);
}
