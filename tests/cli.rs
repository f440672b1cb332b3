use std::{fs, path::PathBuf, process::Command};

struct Run {
    success: bool,
    stdout: String,
    stderr: String,
}

fn run_bin(args: &[&str]) -> Run {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_spl-monitor"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    Run {
        success: output.status.success(),
        stdout: String::from_utf8(output.stdout).expect("failed to convert stdout to string"),
        stderr: String::from_utf8(output.stderr).expect("failed to convert stderr to string"),
    }
}

fn fixture(name: &str, contents: &str) -> String {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("cli");
    fs::create_dir_all(&test_dir).expect("failed to create test directory");
    let path = test_dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path.to_str()
        .expect("failed to convert fixture path to string")
        .to_string()
}

const THREE_READINGS: &str = r#"[
    {"_id": 1, "timestamp": "2024-05-01T10:00:00Z", "Value": 60.0},
    {"_id": 2, "timestamp": "2024-05-01T10:02:00Z", "Value": 80.0},
    {"_id": 3, "timestamp": "2024-05-01T10:01:00Z", "Value": 70.0},
    {"_id": 4, "timestamp": "2024-05-01T10:03:00Z"}
]"#;

#[test]
fn summary_over_full_series() {
    let file = fixture("three.json", THREE_READINGS);
    let run = run_bin(&["--file", &file, "summary"]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("Records: 4 fetched, 3 kept, 1 dropped"), "{}", run.stdout);
    assert!(run.stdout.contains("Min dB(A): 60.0"), "{}", run.stdout);
    assert!(run.stdout.contains("Max dB(A): 80.0"), "{}", run.stdout);
    assert!(run.stdout.contains("Avg dB(A): 70.0"), "{}", run.stdout);
}

#[test]
fn summary_over_window() {
    let file = fixture("three_window.json", THREE_READINGS);
    let run = run_bin(&[
        "--file",
        &file,
        "summary",
        "--from",
        "2024-05-01T10:01:00Z",
        "--to",
        "2024-05-01 10:02:00",
    ]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("Samples: 2"), "{}", run.stdout);
    assert!(run.stdout.contains("Avg dB(A): 75.0"), "{}", run.stdout);
}

#[test]
fn window_after_span_is_reported_not_failed() {
    let file = fixture("three_after.json", THREE_READINGS);
    let run = run_bin(&[
        "--file",
        &file,
        "summary",
        "--from",
        "2024-06-01",
        "--to",
        "2024-06-02",
    ]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("No SPL data in the selected range."), "{}", run.stdout);
}

#[test]
fn open_ended_window_after_span_is_reported_not_failed() {
    let file = fixture("three_from_only.json", THREE_READINGS);
    let run = run_bin(&["--file", &file, "summary", "--from", "2024-06-01"]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("No SPL data in the selected range."), "{}", run.stdout);
}

#[test]
fn open_ended_window_before_span_is_reported_not_failed() {
    let file = fixture("three_to_only.json", THREE_READINGS);
    let run = run_bin(&["--file", &file, "summary", "--to", "2024-04-01"]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("No SPL data in the selected range."), "{}", run.stdout);
}

#[test]
fn open_ended_window_inside_span() {
    let file = fixture("three_from_inside.json", THREE_READINGS);
    let run = run_bin(&["--file", &file, "summary", "--from", "2024-05-01T10:01:00Z"]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("Samples: 2"), "{}", run.stdout);
    assert!(run.stdout.contains("Avg dB(A): 75.0"), "{}", run.stdout);
}

#[test]
fn inverted_window_fails() {
    let file = fixture("three_inverted.json", THREE_READINGS);
    let run = run_bin(&[
        "--file",
        &file,
        "summary",
        "--from",
        "2024-05-01T10:02:00Z",
        "--to",
        "2024-05-01T10:00:00Z",
    ]);

    assert!(!run.success);
    assert!(run.stderr.contains("after range end"), "{}", run.stderr);
}

#[test]
fn empty_collection_is_no_data() {
    let file = fixture("empty.json", "[]");
    let run = run_bin(&["--file", &file, "summary"]);

    assert!(run.success, "stderr:\n{}", run.stderr);
    assert!(run.stdout.contains("No SPL data found."), "{}", run.stdout);
}

#[test]
fn unreachable_source_fails() {
    let run = run_bin(&["--file", "/nonexistent/spl.json", "summary"]);

    assert!(!run.success);
    assert!(run.stderr.contains("cannot retrieve data"), "{}", run.stderr);
}
