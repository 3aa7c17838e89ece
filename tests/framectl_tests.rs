//! End-to-end tests for the framectl binary

use std::fs;
use std::process::Command;

use chrono::DateTime;
use tempfile::tempdir;
use tsframe::codec::json::FrameInclude;
use tsframe::codec::{arrow, json};
use tsframe::frame::TimeSeriesKind;
use tsframe::{Field, Frame, Labels};

fn framectl() -> Command {
    Command::new(env!("CARGO_BIN_EXE_framectl"))
}

fn long_frame() -> Frame {
    let t = |s| DateTime::from_timestamp(s, 0).unwrap();
    Frame::new(
        "animals",
        vec![
            Field::new("time", Labels::new(), vec![t(0), t(0), t(1)]),
            Field::new(
                "factor",
                Labels::new(),
                vec!["cat".to_string(), "sloth".to_string(), "cat".to_string()],
            ),
            Field::new("value", Labels::new(), vec![1.0f64, 2.0, 3.0]),
        ],
    )
}

#[test]
fn test_convert_json_to_arrow_and_back() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.json");
    let arrow_path = dir.path().join("frame.arrow");
    let output = dir.path().join("out.json");
    fs::write(&input, json::encode(&long_frame(), FrameInclude::All).unwrap()).unwrap();

    let status = framectl()
        .args(["convert", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&arrow_path)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(arrow::decode(&fs::read(&arrow_path).unwrap()).unwrap(), long_frame());

    let status = framectl()
        .args(["convert", "--input"])
        .arg(&arrow_path)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(json::decode(&fs::read(&output).unwrap()).unwrap(), long_frame());
}

#[test]
fn test_pivot_with_fill() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("long.arrow");
    let output = dir.path().join("wide.json");
    fs::write(&input, arrow::encode(&long_frame()).unwrap()).unwrap();

    let status = framectl()
        .args(["pivot", "--direction", "long-to-wide", "--fill", "null", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let wide = json::decode(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(wide.time_series_schema().kind, TimeSeriesKind::Wide);
    assert_eq!(wide.fields.len(), 3);
    assert_eq!(
        wide.fields[2].typed::<Option<f64>>().unwrap().as_slice(),
        &[Some(2.0), None]
    );
}

#[test]
fn test_inspect_and_csv_to_stdout() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("frame.json");
    fs::write(&input, json::encode(&long_frame(), FrameInclude::All).unwrap()).unwrap();

    let out = framectl().args(["inspect", "--input"]).arg(&input).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("frame 'animals'"));
    assert!(text.contains("3 rows"));
    assert!(text.contains("Long"));

    let out = framectl()
        .args(["convert", "--to", "csv", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let csv = String::from_utf8(out.stdout).unwrap();
    assert_eq!(csv.lines().next(), Some("time,factor,value"));
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn test_bad_input_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, b"{\"data\": 12").unwrap();

    let out = framectl()
        .args(["convert", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("x.arrow"))
        .output()
        .unwrap();
    assert!(!out.status.success());
}
