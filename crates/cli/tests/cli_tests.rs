// Integration tests for the `prodmatch` binary: outputs and the exit-code contract.
//
// Run with: cargo test -p prodmatch-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use prodmatch_io::xlsx;
use prodmatch_matcher::{CollectionKind, Value};
use tempfile::{tempdir, TempDir};

fn prodmatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prodmatch"));
    cmd.env_remove("PRODMATCH_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    prodmatch()
        .current_dir(dir)
        .args(args)
        .output()
        .expect("spawn prodmatch")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// Basket + master CSVs for the Blue Pen / Red Pen scenario.
fn pens() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("basket.csv"),
        "Product Description,Qty\nBlue Pen,10\nStapler,1\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("master.csv"),
        "Product Description,Price\nBlue Pen,1.50\nRed Pen,1.20\n",
    )
    .unwrap();
    dir
}

// ===========================================================================
// prodmatch run
// ===========================================================================

#[test]
fn run_json_merges_matched_rows() {
    let dir = pens();
    let out = run_in(dir.path(), &["run", "-b", "basket.csv", "-m", "master.csv", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let rows: serde_json::Value = serde_json::from_str(stdout.trim()).expect("stdout is one JSON value");
    assert_eq!(
        rows,
        serde_json::json!([
            {"Product Description": "Blue Pen", "Qty": 10, "Price": 1.5},
            {"Product Description": "Stapler", "Qty": 1, "Price": null},
        ])
    );

    // Summary goes to stderr, never stdout
    assert!(stderr(&out).contains("1 of 2 basket row(s) matched"), "stderr: {}", stderr(&out));
}

#[test]
fn run_threshold_above_100_leaves_basket_unchanged() {
    let dir = pens();
    let out = run_in(
        dir.path(),
        &["run", "-b", "basket.csv", "-m", "master.csv", "--threshold", "101", "--json"],
    );
    assert!(out.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows[0], serde_json::json!({"Product Description": "Blue Pen", "Qty": 10}));
}

#[test]
fn run_from_config_writes_workbook() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();

    // Basket on a named sheet
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Week 12").unwrap();
    sheet.write_string(0, 0, "Product Description").unwrap();
    sheet.write_string(0, 1, "Qty").unwrap();
    sheet.write_string(1, 0, "Café Crème").unwrap();
    sheet.write_number(1, 1, 2.0).unwrap();
    sheet.write_string(2, 0, "Smith Stapler").unwrap();
    sheet.write_number(2, 1, 1.0).unwrap();
    workbook.save(data.join("basket.xlsx")).unwrap();

    // Latin-1 master with semicolons
    let mut master = b"Product Description;Price\nCaf".to_vec();
    master.extend_from_slice(&[0xE9, b' ', b'C', b'r', 0xE8, b'm', b'e']);
    master.extend_from_slice(b";2,50\nSmyth Stapler;7,99\n");
    fs::write(data.join("contracts.csv"), master).unwrap();

    fs::write(
        dir.path().join("weekly.toml"),
        r#"
name = "Weekly"
threshold = 90

[basket]
file = "data/basket.xlsx"
sheet = "Week 12"

[master]
file = "data/contracts.csv"
encoding = "latin-1"

[output]
file = "out"
"#,
    )
    .unwrap();
    fs::create_dir(dir.path().join("out")).unwrap();

    // Run from elsewhere: paths resolve against the config's directory
    let elsewhere = tempdir().unwrap();
    let config = dir.path().join("weekly.toml");
    let out = run_in(elsewhere.path(), &["run", config.to_str().unwrap(), "--preview", "5"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let written = dir.path().join("out").join("Weekly.xlsx");
    assert!(stderr(&out).contains("wrote"));
    let c = xlsx::import(&written, Some("Matched Output"), CollectionKind::Basket).unwrap();
    assert_eq!(c.schema().columns(), &["Product Description", "Qty", "Price"]);
    assert_eq!(c.record(0).unwrap().get("Price"), Some(&Value::from("2,50")));
    // Phonetic key carries the misspelt row
    assert_eq!(c.record(1).unwrap().get("Price"), Some(&Value::from("7,99")));
    assert_eq!(c.record(1).unwrap().get("Product Description"), Some(&Value::from("Smyth Stapler")));
}

#[test]
fn run_parallel_matches_sequential() {
    let dir = pens();
    let base = ["run", "-b", "basket.csv", "-m", "master.csv", "--json", "--threshold", "50"];
    let seq = run_in(dir.path(), &base);
    let mut par_args = base.to_vec();
    par_args.push("--parallel");
    let par = run_in(dir.path(), &par_args);

    assert!(seq.status.success() && par.status.success());
    assert_eq!(seq.stdout, par.stdout);
}

// ===========================================================================
// Exit codes
// ===========================================================================

#[test]
fn exit_usage_without_inputs() {
    let dir = tempdir().unwrap();
    let out = run_in(dir.path(), &["run", "--basket", "basket.csv"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("hint:"));
}

#[test]
fn exit_usage_for_unwritable_format() {
    let dir = pens();
    let out = run_in(dir.path(), &["run", "-b", "basket.csv", "-m", "master.csv", "-o", "out.pdf"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn exit_config_invalid() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.toml"), "[basket]\nfile = \"b.csv\"\n").unwrap();

    let out = run_in(dir.path(), &["run", "bad.toml"]);
    assert_eq!(out.status.code(), Some(3));

    let out = run_in(dir.path(), &["validate", "bad.toml"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn exit_input_for_missing_sheet() {
    let dir = pens();
    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook.add_worksheet().set_name("Sheet1").unwrap().write_string(0, 0, "Product Description").unwrap();
    workbook.save(dir.path().join("basket.xlsx")).unwrap();

    let out = run_in(
        dir.path(),
        &["run", "-b", "basket.xlsx", "--sheet", "Week 99", "-m", "master.csv"],
    );
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("available sheets: Sheet1"), "stderr: {}", stderr(&out));
}

#[test]
fn exit_input_for_missing_file() {
    let dir = pens();
    let out = run_in(dir.path(), &["run", "-b", "nope.csv", "-m", "master.csv"]);
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn exit_match_for_missing_description_column() {
    let dir = pens();
    fs::write(dir.path().join("other.csv"), "Description,Price\nBlue Pen,1.50\n").unwrap();

    let out = run_in(dir.path(), &["run", "-b", "basket.csv", "-m", "other.csv"]);
    assert_eq!(out.status.code(), Some(5));
    let err = stderr(&out);
    assert!(err.contains("master row 0: missing field 'Product Description'"), "stderr: {err}");
    assert!(err.contains("master columns: Description, Price"), "stderr: {err}");
}

#[test]
fn exit_write_for_missing_directory() {
    let dir = pens();
    let out = run_in(
        dir.path(),
        &["run", "-b", "basket.csv", "-m", "master.csv", "-o", "no/such/dir/out.csv"],
    );
    assert_eq!(out.status.code(), Some(6));
}

// ===========================================================================
// prodmatch validate / score
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("job.toml"),
        "[basket]\nfile = \"b.xlsx\"\n[master]\nfile = \"m.csv\"\n",
    )
    .unwrap();
    let out = run_in(dir.path(), &["validate", "job.toml"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("threshold 80"));
}

#[test]
fn score_json_reports_phonetic_path() {
    let dir = tempdir().unwrap();
    let out = run_in(dir.path(), &["score", "Smith", "Smyth", "--json"]);
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["phonetic_keys"], serde_json::json!(["SM0", "SM0"]));
    assert_eq!(v["phonetic"], serde_json::json!(100.0));
    assert_eq!(v["score"], serde_json::json!(100.0));
}
