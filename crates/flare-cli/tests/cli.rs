//! End-to-end binary tests: synthesize an event pair, analyze it, and
//! check the error surfaces.

use assert_cmd::Command;
use predicates::prelude::*;

fn flare() -> Command {
    Command::cargo_bin("flare").expect("flare binary")
}

#[test]
fn synth_then_analyze_reports_ag_fault() {
    let dir = tempfile::tempdir().unwrap();

    flare()
        .arg("synth")
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("fault_AG_69kV.cfg"));

    flare()
        .arg("analyze")
        .arg(dir.path().join("fault_AG_69kV.cfg"))
        .arg(dir.path().join("fault_AG_69kV.dat"))
        .args([
            "--ct-ratio",
            "400",
            "--vt-ratio",
            "600",
            "--line-type",
            "69kv",
            "--line-length",
            "50",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fault type AG"))
        .stdout(predicate::str::contains("Takagi"));
}

#[test]
fn analyze_emits_json() {
    let dir = tempfile::tempdir().unwrap();

    flare().arg("synth").arg("--out-dir").arg(dir.path()).assert().success();

    let output = flare()
        .arg("analyze")
        .arg(dir.path().join("fault_AG_69kV.cfg"))
        .arg(dir.path().join("fault_AG_69kV.dat"))
        .args([
            "--ct-ratio",
            "400",
            "--vt-ratio",
            "600",
            "--line-type",
            "69kv",
            "--line-length",
            "50",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["classification"]["fault_type"], "AG");
    let takagi_km = json["locations"]["takagi"]["distance_km"].as_f64().unwrap();
    assert!((takagi_km - 30.0).abs() <= 3.0, "takagi at {takagi_km} km");
}

#[test]
fn unknown_line_type_is_a_distinct_failure() {
    flare()
        .arg("analyze")
        .arg("missing.cfg")
        .arg("missing.dat")
        .args([
            "--line-type",
            "230kV bogus",
            "--line-length",
            "50",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported line type"));
}

#[test]
fn lines_lists_builtin_table() {
    flare()
        .arg("lines")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACSR HAWK 477"))
        .stdout(predicate::str::contains("0.0839+j0.3927"));
}

#[test]
fn inspect_prints_channel_table() {
    let dir = tempfile::tempdir().unwrap();
    flare().arg("synth").arg("--out-dir").arg(dir.path()).assert().success();

    flare()
        .arg("inspect")
        .arg(dir.path().join("fault_AG_69kV.cfg"))
        .assert()
        .success()
        .stdout(predicate::str::contains("6 analog / 0 digital"))
        .stdout(predicate::str::contains("Va"));
}
