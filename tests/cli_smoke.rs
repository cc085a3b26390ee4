//! End-to-end smoke tests for the `vignette` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use vignette::dispatch::process::WorkerReport;
use vignette::foundation::fs;
use vignette::{Scene, read_header};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_vignette")
}

fn smoke_dir(name: &str) -> PathBuf {
    let dir = Path::new("target").join("cli-smoke").join(name);
    fs::fresh_dir(&dir).unwrap();
    dir
}

#[test]
fn render_writes_a_multi_frame_container() {
    let dir = smoke_dir("render");
    let out = dir.join("reveal.vgc");

    let status = Command::new(bin())
        .arg("render")
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    let header = read_header(&out).unwrap();
    assert!(header.frame_count > 1);
}

#[test]
fn render_accepts_a_scene_json() {
    let dir = smoke_dir("scene-json");
    let scene_path = dir.join("scene.json");
    let out = dir.join("out.vgc");

    let spec = Scene::circle_reveal().spec().clone();
    let f = std::fs::File::create(&scene_path).unwrap();
    serde_json::to_writer_pretty(f, &spec).unwrap();

    let status = Command::new(bin())
        .arg("render")
        .arg("--scene")
        .arg(&scene_path)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(read_header(&out).unwrap().canvas, spec.canvas);
}

#[test]
fn worker_mode_emits_a_parseable_report() {
    let dir = smoke_dir("worker-report");
    let out = dir.join("task.vgc");

    let output = Command::new(bin())
        .args(["render", "--process-name", "NotMainThread", "--report-json"])
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success());
    let line = String::from_utf8_lossy(&output.stdout);
    let report: WorkerReport = serde_json::from_str(line.trim()).unwrap();
    let artifact = report.into_outcome().unwrap();
    assert_eq!(artifact.path, out);
    assert!(artifact.plays > 0);
}

#[test]
fn render_fails_cleanly_on_a_missing_output_directory() {
    let dir = smoke_dir("missing-dir");
    let out = dir.join("not-created").join("task.vgc");

    let output = Command::new(bin())
        .arg("render")
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration error"), "stderr: {stderr}");
    assert!(!out.exists());
}

#[test]
fn frame_writes_a_png_still() {
    let dir = smoke_dir("frame");
    let out = dir.join("still.png");

    let status = Command::new(bin())
        .args(["frame", "--frame", "8"])
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[1..4], &b"PNG"[..]);
}
