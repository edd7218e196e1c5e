// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn deepzoom() -> Command {
    Command::cargo_bin("deepzoom").unwrap()
}

#[test]
fn unknown_format_is_rejected() {
    deepzoom()
        .args(&["gif", "out.gif", "-l"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized format 'gif'"));
}

#[test]
fn video_needs_an_end_zoom() {
    deepzoom()
        .args(&["video", "-", "-f", "10", "-F", "30", "-l"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--ezoom"));
}

#[test]
fn video_needs_a_frame_count() {
    deepzoom()
        .args(&["video", "-", "-Z", "100", "-F", "30", "-l"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--frames"));
}

#[test]
fn zooming_out_is_rejected() {
    deepzoom()
        .args(&["video", "-", "-z", "10", "-Z", "2", "-f", "5", "-F", "30", "-l"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zooming out"));
}

#[test]
fn bad_center_is_a_parse_error() {
    deepzoom()
        .args(&["image", "-", "-x", "minus-one", "-l"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minus-one"));
}

#[test]
fn image_is_written_to_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("still.ppm");
    deepzoom()
        .args(&["image", path.to_str().unwrap(), "-w", "32", "-h", "24", "-i", "50", "-t", "2", "-l"])
        .assert()
        .success();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], b"P6");
    assert!(bytes.len() > 32 * 24 * 3);
}

#[test]
fn video_streams_to_stdout() {
    let output = deepzoom()
        .args(&[
            "video", "-", "-w", "16", "-h", "8", "-i", "50", "-x", "-1.25066", "-y", "0.02012",
            "-Z", "8", "-f", "6", "-F", "10", "-l",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stream = output.stdout;
    assert_eq!(stream.len() % 6, 0);
    let frame = stream.len() / 6;
    assert!(frame > 16 * 8 * 3);
    for i in 0..6 {
        assert_eq!(&stream[i * frame..i * frame + 2], b"P6");
    }
}

#[test]
fn unwritable_output_is_a_sink_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("still.ppm");
    deepzoom()
        .args(&["image", path.to_str().unwrap(), "-w", "8", "-h", "8", "-l"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed opening pixel sink"));
}
