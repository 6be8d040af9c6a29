use gaitforge::history::HistoryLog;
use gaitforge::scheduler::Phase;
use regex::Regex;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SMALL_RUN: &[&str] = &[
    "--population-size",
    "4",
    "--seq-len",
    "3",
    "--max-generations",
    "2",
    "--max-seq-repetitions",
    "1",
    "--motor-exec-ticks",
    "1",
    "--max-cycles",
    "2",
    "--limb-count",
    "2",
    "--seed",
    "7",
];

fn gaitforge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gaitforge"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

fn run_small(dir: &Path) -> (Output, String) {
    run_with(dir, SMALL_RUN.to_vec())
}

fn run_with(dir: &Path, run_args: Vec<&str>) -> (Output, String) {
    let json = dir.join("history.json");
    let csv = dir.join("history.csv");
    let mut args = vec!["run"];
    args.extend(run_args);
    args.extend_from_slice(&[
        "--history-json",
        json.to_str().unwrap(),
        "--history-csv",
        csv.to_str().unwrap(),
    ]);
    let output = gaitforge(&args);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (output, stdout)
}

#[test]
fn test_cli_run_writes_history() {
    let dir = TempDir::new().unwrap();
    let (output, stdout) = run_small(dir.path());
    assert!(output.status.success(), "stdout:\n{}", stdout);

    let log = HistoryLog::load_json(dir.path().join("history.json")).unwrap();
    assert_eq!(log.len(), 6);
    assert_eq!(
        log.trials.iter().filter(|t| t.phase == Phase::RealGeneration).count(),
        2
    );

    let csv = std::fs::read_to_string(dir.path().join("history.csv")).unwrap();
    assert_eq!(csv.lines().count(), 7);

    let status = Regex::new(r"Status\s*\|\s*(\w+)").unwrap();
    let caps = status.captures(&stdout).expect("summary table printed");
    assert_eq!(&caps[1], "Exhausted");
}

#[test]
fn test_cli_replay_reports_fitness() {
    let dir = TempDir::new().unwrap();
    let (output, _) = run_small(dir.path());
    assert!(output.status.success());

    let history = dir.path().join("history.json");
    let output = gaitforge(&[
        "replay",
        "--history",
        history.to_str().unwrap(),
        "--limb-count",
        "2",
        "--max-seq-repetitions",
        "1",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{}", stdout);

    let fitness = Regex::new(r"Replayed fitness (\d+\.\d{2})").unwrap();
    let caps = fitness.captures(&stdout).expect("fitness line printed");
    assert!(caps[1].parse::<f32>().unwrap() >= 0.0);
}

/// SMALL_RUN with six steps per limb, so a 2x6 genome also splits as 4x3.
fn six_step_run() -> Vec<&'static str> {
    let mut args = SMALL_RUN.to_vec();
    let pos = args.iter().position(|a| *a == "--seq-len").unwrap();
    args[pos + 1] = "6";
    args
}

#[test]
fn test_cli_replay_uses_recorded_shape() {
    let dir = TempDir::new().unwrap();
    let (output, stdout) = run_with(dir.path(), six_step_run());
    assert!(output.status.success(), "stdout:\n{}", stdout);

    let history = dir.path().join("history.json");
    let log = HistoryLog::load_json(&history).unwrap();
    let shape = log.shape.expect("run records its shape");
    assert_eq!((shape.limb_count, shape.seq_len), (2, 6));

    let output = gaitforge(&["replay", "--history", history.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{}", stdout);

    let limb_rows = Regex::new(r"(?m)^\|\s*#\d+\s*\|").unwrap();
    assert_eq!(limb_rows.find_iter(&stdout).count(), 2, "stdout:\n{}", stdout);
    assert!(stdout.contains("t5"));
    assert!(Regex::new(r"Replayed fitness \d+\.\d{2}").unwrap().is_match(&stdout));
}

#[test]
fn test_cli_replay_rejects_conflicting_shape_flags() {
    let dir = TempDir::new().unwrap();
    let (output, _) = run_with(dir.path(), six_step_run());
    assert!(output.status.success());

    let history = dir.path().join("history.json");
    let output = gaitforge(&[
        "replay",
        "--history",
        history.to_str().unwrap(),
        "--limb-count",
        "4",
    ]);
    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Replayed fitness"));
}

#[test]
fn test_cli_rejects_tiny_population() {
    let output = gaitforge(&["run", "--population-size", "3"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_config_file_merges_with_flags() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{ "evolution": { "population_size": 4 },
             "schedule": { "seq_len": 2, "max_generations": 1, "max_seq_repetitions": 1,
                           "motor_exec_ticks": 1, "max_cycles": 5, "seed": 3 },
             "world": { "limb_count": 2 } }"#,
    )
    .unwrap();
    let json = dir.path().join("h.json");

    let output = gaitforge(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--max-cycles",
        "1",
        "--history-json",
        json.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let log = HistoryLog::load_json(&json).unwrap();
    // one imaginary generation and one real generation
    assert_eq!(log.len(), 2);
    assert!(log.trials.iter().all(|t| t.genome.len() == 4));
}
