use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join("barchart").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

#[test]
fn cli_renders_svg_to_stdout() {
    let exe = assert_cmd::cargo_bin!("barchart-cli");
    let output = Command::new(exe)
        .args([
            "render",
            "--config",
            fixture("target.config.json").to_string_lossy().as_ref(),
            "--id",
            "sales panel",
            fixture("basic.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let svg = String::from_utf8(output.stdout).expect("utf8");
    assert!(svg.starts_with(r#"<svg id="sales-panel""#));
    assert!(svg.contains(r#"viewBox="0 0 640 400""#));
    assert_eq!(svg.matches(r#"class="barplot""#).count(), 3);
    assert!(svg.contains(">+2.0<"));
}

#[test]
fn cli_prints_layout_json() {
    let exe = assert_cmd::cargo_bin!("barchart-cli");
    let output = Command::new(exe)
        .args([
            "layout",
            "--width",
            "300",
            "--height",
            "200",
            "--config",
            fixture("horizontal.config.json").to_string_lossy().as_ref(),
            fixture("basic.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(v["orientation"], "horizontal");
    assert_eq!(v["size"]["width"], 300.0);
    assert_eq!(v["bars"][0]["category"], "Target");
    assert_eq!(v["bars"].as_array().map(Vec::len), Some(3));
}

#[test]
fn cli_renders_png_smoke() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.png");

    let exe = assert_cmd::cargo_bin!("barchart-cli");
    Command::new(exe)
        .args([
            "render",
            "--format",
            "png",
            "--background",
            "white",
            "--out",
            out.to_string_lossy().as_ref(),
            fixture("basic.json").to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&out).expect("read png");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "output is not a PNG"
    );
}

#[test]
fn cli_writes_pdf_next_to_the_data_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let data = tmp.path().join("sales.json");
    fs::copy(fixture("basic.json"), &data).expect("copy fixture");

    let exe = assert_cmd::cargo_bin!("barchart-cli");
    Command::new(exe)
        .args(["render", "--format", "pdf", data.to_string_lossy().as_ref()])
        .assert()
        .success();

    let bytes = fs::read(data.with_extension("pdf")).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF-"), "output is not a PDF");
}

#[test]
fn cli_rejects_bad_arguments() {
    let exe = assert_cmd::cargo_bin!("barchart-cli");
    Command::new(exe)
        .args(["render", "--width", "-5"])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("barchart-cli");
    Command::new(exe)
        .args(["render", "--format", "gif"])
        .assert()
        .code(2);
}

#[test]
fn cli_reports_malformed_data() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let data = tmp.path().join("broken.json");
    fs::write(&data, r#"{"name": "A"}"#).expect("write");

    let exe = assert_cmd::cargo_bin!("barchart-cli");
    Command::new(exe)
        .arg(data.to_string_lossy().as_ref())
        .assert()
        .code(1);
}

#[test]
fn cli_png_honors_size_and_scale() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("scaled.png");

    let exe = assert_cmd::cargo_bin!("barchart-cli");
    Command::new(exe)
        .args([
            "render",
            "--format",
            "png",
            "--width",
            "200",
            "--height",
            "120",
            "--scale",
            "2",
            "--out",
            out.to_string_lossy().as_ref(),
            fixture("basic.json").to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let file = fs::File::open(&out).expect("open png");
    let reader = png::Decoder::new(file).read_info().expect("png header");
    assert_eq!((reader.info().width, reader.info().height), (400, 240));
}
