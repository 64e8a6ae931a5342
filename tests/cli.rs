use image::{ImageBuffer, Rgb};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn histdup(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_histdup"))
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run histdup")
}

fn gradient(path: &Path) {
    let img = ImageBuffer::from_fn(40, 40, |x, y| {
        let v = ((x + y) * 3 % 256) as u8;
        Rgb([v, v, v])
    });
    img.save(path).unwrap();
}

#[test]
fn missing_folder_argument_exits_with_one() {
    let output = histdup(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
}

#[test]
fn help_exits_cleanly() {
    let output = histdup(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn empty_directory_reports_no_images() {
    let temp_dir = TempDir::new().unwrap();
    let output = histdup(&[temp_dir.path().to_str().unwrap(), "-q"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No images found"));
}

#[test]
fn single_image_reports_insufficient() {
    let temp_dir = TempDir::new().unwrap();
    gradient(&temp_dir.path().join("one.png"));

    let output = histdup(&[temp_dir.path().to_str().unwrap(), "-q"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Not enough images"));
}

#[test]
fn unreadable_directory_is_reported_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist");

    let output = histdup(&[missing.to_str().unwrap(), "-q"]);

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to scan"));
}

#[test]
fn dry_run_json_lists_duplicates_without_touching_files() {
    let temp_dir = TempDir::new().unwrap();
    gradient(&temp_dir.path().join("a.png"));
    gradient(&temp_dir.path().join("b.png"));

    let output = histdup(&[temp_dir.path().to_str().unwrap(), "--dry-run", "--json", "-q"]);

    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "completed");
    assert_eq!(report["comparisons"], 1);
    assert_eq!(report["duplicates"][0]["first"], "a.png");
    assert_eq!(report["duplicates"][0]["second"], "b.png");
    assert_eq!(report["duplicates"][0]["outcome"]["outcome"], "reported");
    assert!(temp_dir.path().join("a.png").exists());
    assert!(temp_dir.path().join("b.png").exists());
}

#[test]
fn closed_stdin_skips_without_mutation() {
    let temp_dir = TempDir::new().unwrap();
    gradient(&temp_dir.path().join("a.png"));
    gradient(&temp_dir.path().join("b.png"));

    let output = histdup(&[temp_dir.path().to_str().unwrap(), "-q"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(temp_dir.path().join("a.png").exists());
    assert!(temp_dir.path().join("b.png").exists());
}

#[test]
fn out_of_range_threshold_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let output = histdup(&[
        temp_dir.path().to_str().unwrap(),
        "--metric",
        "intersection",
        "--threshold",
        "3",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid settings"));
}

#[test]
fn piped_answers_drive_resolution() {
    use std::io::Write;

    let temp_dir = TempDir::new().unwrap();
    gradient(&temp_dir.path().join("a.png"));
    gradient(&temp_dir.path().join("b.png"));

    let mut child = Command::new(env!("CARGO_BIN_EXE_histdup"))
        .args([temp_dir.path().to_str().unwrap(), "-q"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"4\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(temp_dir.path().join("a.png").exists());
    assert!(!temp_dir.path().join("b.png").exists());
    assert!(temp_dir.path().join("b.png.zip").exists());
}

#[test]
fn interactive_json_keeps_stdout_parseable() {
    use std::io::Write;

    let temp_dir = TempDir::new().unwrap();
    gradient(&temp_dir.path().join("a.png"));
    gradient(&temp_dir.path().join("b.png"));

    let mut child = Command::new(env!("CARGO_BIN_EXE_histdup"))
        .args([temp_dir.path().to_str().unwrap(), "--json", "-q"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"5\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["duplicates"][0]["outcome"]["outcome"], "skipped");
    assert_eq!(report["duplicates"][0]["outcome"]["reason"]["kind"], "operator");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Images a.png and b.png are similar"));
    assert!(temp_dir.path().join("a.png").exists());
    assert!(temp_dir.path().join("b.png").exists());
}
