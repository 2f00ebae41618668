//! Concurrency tests for the firstbites binary.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the journal simultaneously (file locking)
//! - Record awards without double-awarding
//! - Perform rollup operations without corruption

use assert_cmd::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("firstbites").expect("Failed to find firstbites binary")
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_concurrent_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let foods = ["apple", "banana", "carrot", "salmon", "egg"];

    // Log from several threads with slight delays (more realistic than a
    // thundering herd)
    let handles: Vec<_> = foods
        .iter()
        .enumerate()
        .map(|(i, food)| {
            let data_dir = data_dir.clone();
            let food = food.to_string();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(i as u64 * 5));
                cli()
                    .arg("log")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .arg("--subject")
                    .arg("ada")
                    .arg("--food")
                    .arg(&food)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    // Verify all events were journaled
    let journal_path = data_dir.join("journal/feeding_events.jsonl");
    let journal_content = std::fs::read_to_string(&journal_path).expect("Failed to read journal");
    let event_count = journal_content.lines().count();
    assert_eq!(event_count, 5, "Expected 5 events, got {}", event_count);
}

#[test]
fn test_concurrent_logging_awards_once() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // Several concurrent first logs; exactly one may win the first badge
    let handles: Vec<_> = ["apple", "banana", "carrot"]
        .iter()
        .map(|food| {
            let data_dir = data_dir.clone();
            let food = food.to_string();
            thread::spawn(move || {
                cli()
                    .arg("log")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .arg("--subject")
                    .arg("ada")
                    .arg("--food")
                    .arg(&food)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let ledger_content = std::fs::read_to_string(data_dir.join("awards.json"))
        .expect("Failed to read award ledger");
    let ledger: serde_json::Value =
        serde_json::from_str(&ledger_content).expect("Ledger is not valid JSON");
    let first_bite_awards = ledger["awards"]
        .as_array()
        .expect("awards array")
        .iter()
        .filter(|a| a["badge_id"] == "first_bite")
        .count();
    assert_eq!(first_bite_awards, 1);
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--subject")
        .arg("ada")
        .arg("--food")
        .arg("apple")
        .assert()
        .success();

    // Writers keep appending while readers query progress
    let writer_dir = data_dir.clone();
    let writer = thread::spawn(move || {
        for food in ["banana", "carrot", "salmon"] {
            thread::sleep(Duration::from_millis(10));
            cli()
                .arg("log")
                .arg("--data-dir")
                .arg(&writer_dir)
                .arg("--subject")
                .arg("ada")
                .arg("--food")
                .arg(food)
                .assert()
                .success();
        }
    });

    for _ in 0..3 {
        cli()
            .arg("progress")
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--subject")
            .arg("ada")
            .assert()
            .success();
        thread::sleep(Duration::from_millis(10));
    }

    writer.join().expect("writer thread panicked");

    let journal_path = data_dir.join("journal/feeding_events.jsonl");
    let journal_content = std::fs::read_to_string(&journal_path).expect("Failed to read journal");
    assert_eq!(journal_content.lines().count(), 4);
}

#[test]
fn test_rollup_while_writing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    for food in ["apple", "banana", "carrot"] {
        cli()
            .arg("log")
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--subject")
            .arg("ada")
            .arg("--food")
            .arg(food)
            .assert()
            .success();
    }

    // Start rollup in the background
    let rollup_dir = data_dir.clone();
    let rollup_handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        cli()
            .arg("rollup")
            .arg("--data-dir")
            .arg(&rollup_dir)
            .assert()
            .success();
    });

    // Keep logging while rollup runs
    for food in ["salmon", "egg"] {
        cli()
            .arg("log")
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--subject")
            .arg("ada")
            .arg("--food")
            .arg(food)
            .assert()
            .success();
        thread::sleep(Duration::from_millis(5));
    }

    rollup_handle.join().expect("rollup thread panicked");

    // Every event is visible through the merged history, whichever side of
    // the rollup it landed on
    cli()
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--subject")
        .arg("ada")
        .arg("--food")
        .arg("apple")
        .assert()
        .success();

    cli()
        .arg("streak")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--subject")
        .arg("ada")
        .assert()
        .success();

    assert!(data_dir.join("events.csv").exists());
}
