#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use eftkit_record::FieldTag;
use eftkit_transaction::{generate, CompressionLabel, FieldMap, ImageSegment, Mode, Transaction};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "eftkit-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn tag(s: &str) -> FieldTag {
    s.parse().expect("valid tag")
}

const RIGHT_SLAP: &[u8] = b"\xFF\xA0\x1C\x1D14.999:\x1C\x00WSQ";
const LEFT_SLAP: &[u8] = b"\xFF\x4F\xFF\x51JP2";

fn write_sample(dir: &Path) -> PathBuf {
    let mut fields = FieldMap::new();
    fields.insert(tag("2.018"), "SMITH, JOHN".to_string());
    fields.insert(tag("2.022"), "19800101".to_string());
    let segments = [
        ImageSegment::new(RIGHT_SLAP, 1600, 1500, CompressionLabel::Wsq, 13u16),
        ImageSegment::new(LEFT_SLAP, 1600, 1500, CompressionLabel::Jpeg2000, 14u16),
    ];
    let bytes = generate(&fields, &segments, Mode::Flat).expect("sample should generate");
    let path = dir.join("sample.eft");
    std::fs::write(&path, &bytes).expect("sample should be writable");
    path
}

fn eftkit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_eftkit"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("eftkit should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn inspect_reports_fields_and_images() {
    let dir = unique_temp_dir("inspect");
    let sample = write_sample(&dir);

    let output = eftkit(&["--format", "json", "inspect", path_str(&sample)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"2.018\":\"SMITH, JOHN\""));
    assert!(stdout.contains("\"file_name\":\"fp_13.wsq\""));
    assert!(stdout.contains("\"file_name\":\"fp_14.jp2\""));
    assert!(stdout.contains("\"diagnostics\":[]"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn edit_then_extract_keeps_images_intact() {
    let dir = unique_temp_dir("edit");
    let sample = write_sample(&dir);
    let edited = dir.join("edited.eft");

    let output = eftkit(&[
        "--format",
        "json",
        "edit",
        path_str(&sample),
        "--out",
        path_str(&edited),
        "--set",
        "2.018=DOE, JANE",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"before\":\"SMITH, JOHN\""));

    let transaction = Transaction::open(&edited).expect("edited file should parse");
    assert!(transaction.diagnostics().is_empty());
    assert_eq!(
        transaction.descriptive_fields().get(&tag("2.018")).map(String::as_str),
        Some("DOE, JANE")
    );

    let images = dir.join("images");
    let output = eftkit(&[
        "--format",
        "raw",
        "extract",
        path_str(&edited),
        "--out",
        path_str(&images),
    ]);
    assert!(output.status.success());
    assert_eq!(std::fs::read(images.join("fp_13.wsq")).unwrap(), RIGHT_SLAP);
    assert_eq!(std::fs::read(images.join("fp_14.jp2")).unwrap(), LEFT_SLAP);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn edit_applies_patch_file() {
    let dir = unique_temp_dir("patch");
    let sample = write_sample(&dir);
    let patch = dir.join("patch.json");
    std::fs::write(&patch, r#"{"2.018": "ROE, RICHARD", "2.030": "NEW"}"#).unwrap();
    let edited = dir.join("edited.eft");

    let output = eftkit(&[
        "edit",
        path_str(&sample),
        "--out",
        path_str(&edited),
        "--patch",
        path_str(&patch),
        "--set",
        "2.030=OVERRIDE",
    ]);
    assert!(output.status.success());

    let fields = Transaction::open(&edited).unwrap().descriptive_fields();
    assert_eq!(fields.get(&tag("2.018")).map(String::as_str), Some("ROE, RICHARD"));
    assert_eq!(fields.get(&tag("2.030")).map(String::as_str), Some("OVERRIDE"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn edit_rejects_foreign_fields() {
    let dir = unique_temp_dir("foreign");
    let sample = write_sample(&dir);
    let edited = dir.join("edited.eft");

    let output = eftkit(&[
        "edit",
        path_str(&sample),
        "--out",
        path_str(&edited),
        "--set",
        "14.013=2",
    ]);
    assert_eq!(output.status.code(), Some(64));
    assert!(!edited.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_input_returns_file_absent() {
    let dir = unique_temp_dir("missing");
    let output = eftkit(&["inspect", path_str(&dir.join("nope.eft"))]);
    assert_eq!(output.status.code(), Some(2));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dump_lists_records() {
    let dir = unique_temp_dir("dump");
    let sample = write_sample(&dir);

    let output = eftkit(&["--format", "raw", "dump", path_str(&sample)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Record 1\n1.001 : "));
    assert!(stdout.contains("2.018 : SMITH, JOHN"));
    assert!(stdout.contains(&format!("14.999 : <Binary Data: {} bytes>", RIGHT_SLAP.len())));
    assert_eq!(stdout.matches("--------------------").count(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

fn write_manifest(dir: &Path, segment_path: &str) -> PathBuf {
    let manifest = dir.join("manifest.json");
    std::fs::write(
        &manifest,
        format!(
            r#"{{
                "fields": {{"2.018": "DOE, JANE"}},
                "header": {{"date": "20240301"}},
                "segments": [
                    {{"path": "{segment_path}", "width": 800, "height": 750,
                      "compression": "WSQ20", "position": 13}}
                ]
            }}"#
        ),
    )
    .unwrap();
    manifest
}

#[test]
fn generate_climbs_the_ratio_ladder() {
    let dir = unique_temp_dir("generate");
    for (ratio, size) in [(10, 5000), (15, 4000), (20, 100), (30, 50)] {
        std::fs::write(dir.join(format!("right-{ratio}.wsq")), vec![0xA5u8; size]).unwrap();
    }
    let manifest = write_manifest(&dir, "right-{ratio}.wsq");
    let out = dir.join("out.eft");

    let output = Command::new(env!("CARGO_BIN_EXE_eftkit"))
        .env("EFTKIT_MAX_BYTES", "2000")
        .env("EFTKIT_ORI", "WA0000000")
        .args(["--log-level", "error", "--format", "json", "generate"])
        .arg("--manifest")
        .arg(&manifest)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("eftkit should run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"attempts\":3"));
    assert!(stdout.contains("\"ratio\":20"));

    let transaction = Transaction::open(&out).unwrap();
    assert!(transaction.diagnostics().is_empty());
    assert!(transaction.source().len() <= 2000);
    let header = transaction.header().unwrap();
    assert_eq!(header.fields.text(&tag("1.008")), Some("WA0000000"));
    let images = transaction.image_records();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data.len(), 100);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_over_budget_returns_70() {
    let dir = unique_temp_dir("budget");
    std::fs::write(dir.join("right.wsq"), vec![0xA5u8; 5000]).unwrap();
    let manifest = write_manifest(&dir, "right.wsq");
    let out = dir.join("out.eft");

    let output = eftkit(&[
        "generate",
        "--manifest",
        path_str(&manifest),
        "--out",
        path_str(&out),
        "--max-bytes",
        "2000",
    ]);
    assert_eq!(output.status.code(), Some(70));
    assert!(!out.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("after 4 attempts"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_missing_segment_returns_file_absent() {
    let dir = unique_temp_dir("nosegment");
    let manifest = write_manifest(&dir, "absent.wsq");

    let output = eftkit(&[
        "generate",
        "--manifest",
        path_str(&manifest),
        "--out",
        path_str(&dir.join("out.eft")),
    ]);
    assert_eq!(output.status.code(), Some(2));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = eftkit(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("eftkit {}", env!("CARGO_PKG_VERSION")));
}
