// End-to-end tests for the `tracecheck` binary.
// Run with: cargo test -p tracecheck-cli --test cli_tests

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

// 2024-06-06T00:00:00Z - 8h
const DAY2_BASE: i64 = 1_717_632_000 - 28_800;

fn tracecheck(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tracecheck"));
    cmd.current_dir(cwd);
    cmd.env_remove("TRACECHECK_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// Day 2 channel identifiers under the default patterns.
fn day2_channels() -> Vec<String> {
    let mut channels: Vec<String> = (1..=10).map(|i| format!("{i}-AMPerson{i}D2")).collect();
    channels.extend((1..=10).map(|i| format!("{i}-PMPerson{i}D2")));
    channels
}

struct Session {
    dir: TempDir,
}

impl Session {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data_person")).unwrap();
        fs::create_dir(dir.path().join("data_metric")).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn person(&self, name: &str, rows: &[(i64, &str, &str)]) {
        let mut body = String::from("exported by wristband,,\nTimestamp,PM.HR.Min,PM.HR.Max\n");
        for (ts, min, max) in rows {
            body.push_str(&format!("{ts}.0,{min},{max}\n"));
        }
        fs::write(self.root().join("data_person").join(name), body).unwrap();
    }

    /// One sample per entry: relative timestamp and `(channel index, value)` cells.
    fn metric(&self, name: &str, samples: &[(&str, &[(usize, &str)])]) {
        let channels = day2_channels();
        let mut rows: Vec<Vec<String>> = Vec::new();

        let mut header = vec!["Group".to_string(), "Name".to_string()];
        header.extend((0..19).map(|i| format!("attr{i}")));
        header.extend((0..samples.len()).map(|i| format!("s{i}")));
        rows.push(header);

        for (label, n) in [("Online/Live", 0), ("Min/Max", 1), ("Timestamp", 2)] {
            let mut row = vec![label.to_string(), label.to_string()];
            row.extend((0..19).map(|_| String::new()));
            row.extend(samples.iter().map(|(ts, _)| match n {
                0 => "Live".to_string(),
                1 => "Min".to_string(),
                _ => ts.to_string(),
            }));
            rows.push(row);
        }

        for (c, channel) in channels.iter().enumerate() {
            let mut row = vec!["Team".to_string(), channel.clone()];
            row.extend((0..19).map(|i| format!("a{i}")));
            row.extend(samples.iter().map(|(_, cells)| {
                cells
                    .iter()
                    .find(|(i, _)| *i == c)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| "-".to_string())
            }));
            rows.push(row);
        }

        let body: String = rows.iter().map(|r| r.join(",") + "\n").collect();
        fs::write(self.root().join("data_metric").join(name), body).unwrap();
    }

    fn report(&self, metric_file: &str) -> PathBuf {
        self.root().join("data_text").join(format!("{metric_file}.txt"))
    }

    fn run(&self, args: &[&str]) -> Output {
        tracecheck(self.root()).arg("run").args(args).output().unwrap()
    }
}

fn matched_session() -> Session {
    let s = Session::new();
    s.person("P01_D2.csv", &[(DAY2_BASE + 10, "60.04", "72.0")]);
    s.metric("Day 2 - HR.csv", &[("0:00:10", &[(0, "60.0"), (11, "72.01")])]);
    s
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run_fully_matched_writes_report_and_exits_zero() {
    let s = matched_session();
    let out = s.run(&["Day 2 - HR.csv"]);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let report = fs::read_to_string(s.report("Day 2 - HR.csv")).unwrap();
    assert_eq!(report, "Everything is matched.\n");
    assert!(stderr(&out).contains("0 person-only, 0 metric-only"), "{}", stderr(&out));
}

#[test]
fn run_with_discrepancies_exits_one() {
    let s = Session::new();
    s.person("P01_D2.csv", &[(DAY2_BASE + 10, "60.0", "72.0")]);
    s.metric("Day 2 - HR.csv", &[("0:00:10", &[(0, "60.0"), (1, "73.0")])]);

    let out = s.run(&["Day 2 - HR.csv"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!stderr(&out).contains("error:"));

    let ts = DAY2_BASE + 10;
    let report = fs::read_to_string(s.report("Day 2 - HR.csv")).unwrap();
    assert_eq!(
        report,
        format!(
            "No matching value found for person item ({ts}, 72).\n\
             No matching value found for metric item ({ts}, 73).\n"
        )
    );
}

#[test]
fn run_stdout_prints_report() {
    let s = matched_session();
    let out = s.run(&["Day 2 - HR.csv", "--stdout"]);

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "Everything is matched.\n");
    assert!(!s.report("Day 2 - HR.csv").exists());
}

#[test]
fn run_json_prints_structured_report() {
    let s = matched_session();
    let json_file = s.root().join("report.json");
    let out = s.run(&["Day 2 - HR.csv", "--json", "--output", json_file.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["meta"]["day"], 2);
    assert_eq!(value["meta"]["metric"], "HR");
    assert_eq!(value["report"]["fully_matched"], true);
    assert_eq!(value["report"]["summary"]["left_total"], 2);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_file).unwrap()).unwrap();
    assert_eq!(written["report"], value["report"]);
}

#[test]
fn run_prompts_for_metric_file() {
    let s = matched_session();
    let mut child = tracecheck(s.root())
        .args(["run", "--stdout"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"Day 2 - HR.csv\n").unwrap();
    let out = child.wait_with_output().unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "Enter the metric filename: Everything is matched.\n");
}

#[test]
fn run_empty_prompt_is_usage_error() {
    let s = matched_session();
    let mut child = tracecheck(s.root())
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"\n").unwrap();
    let out = child.wait_with_output().unwrap();

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("error: no metric filename given"));
}

#[test]
fn run_without_person_files_is_input_error() {
    let s = Session::new();
    s.metric("Day 2 - HR.csv", &[("0:00:10", &[(0, "60.0")])]);

    let out = s.run(&["Day 2 - HR.csv"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("error:"));
    assert!(stderr(&out).contains("hint:"));
    assert!(!s.report("Day 2 - HR.csv").exists());
}

#[test]
fn run_unknown_day_is_input_error() {
    let s = matched_session();
    let out = s.run(&["Day 9 - HR.csv"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("'Day 1 - <Metric>'"), "{}", stderr(&out));
}

#[test]
fn run_honors_directory_overrides() {
    let s = matched_session();
    let elsewhere = TempDir::new().unwrap();
    let out = tracecheck(elsewhere.path())
        .arg("run")
        .arg("Day 2 - HR.csv")
        .arg("--person-dir")
        .arg(s.root().join("data_person"))
        .arg("--metric-dir")
        .arg(s.root().join("data_metric"))
        .arg("--output-dir")
        .arg(elsewhere.path().join("reports"))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(elsewhere.path().join("reports/Day 2 - HR.csv.txt").exists());
}

#[test]
fn stdout_and_json_conflict() {
    let s = matched_session();
    let out = s.run(&["Day 2 - HR.csv", "--stdout", "--json"]);
    assert_eq!(out.status.code(), Some(2));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn config_file_in_working_directory_is_used() {
    let s = matched_session();
    fs::write(
        s.root().join("tracecheck.toml"),
        "[paths]\noutput_dir = \"reports\"\n",
    )
    .unwrap();

    let out = s.run(&["Day 2 - HR.csv"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(s.root().join("reports/Day 2 - HR.csv.txt").exists());
}

#[test]
fn invalid_config_exits_three() {
    let s = matched_session();
    let cfg = s.root().join("bad.toml");
    fs::write(&cfg, "[match]\ndecimals = 99\n").unwrap();

    let out = tracecheck(s.root())
        .args(["--config", cfg.to_str().unwrap(), "validate"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).starts_with("error:"));
}

#[test]
fn validate_prints_day_table() {
    let s = Session::new();
    let out = tracecheck(s.root()).arg("validate").output().unwrap();

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("day 1: tag 'Day 1', token 'D1', anchor 2024-06-05"), "{text}");
    assert!(text.contains("day 3: tag 'Day 3', token 'D3', anchor 2024-06-07"), "{text}");
}

// ============================================================================
// channels
// ============================================================================

#[test]
fn channels_lists_day_identifiers() {
    let s = Session::new();
    let out = tracecheck(s.root()).args(["channels", "Day 2 - HR.csv"]).output().unwrap();

    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].contains("PM.HR.Min / PM.HR.Max"), "{}", lines[0]);
    assert_eq!(&lines[1..], day2_channels().iter().map(String::as_str).collect::<Vec<_>>().as_slice());
}
