// Integration tests for linkdeck
// Run with: cargo test --test integration_test

use std::io::Write;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use linkdeck::events::{ChangeEvent, ControllerInput};
use linkdeck::remote::{FetchOrder, Operation, Request};
use linkdeck::{Bookmark, MemoryStore, SyncController, SyncError, User};
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::mpsc;

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_linkdeck"))
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.success(), stdout, stderr)
}

fn row(id: &str, url: &str, visits: u64, created: &str, visited: Option<&str>) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        user_id: "u1".to_string(),
        title: format!("Bookmark {}", id),
        url: url.to_string(),
        created_at: created.parse().unwrap(),
        visit_count: visits,
        last_visited_at: visited.map(|v| v.parse().unwrap()),
    }
}

fn scenario_rows() -> Vec<Bookmark> {
    vec![
        row("1", "https://github.com/a", 3, "2024-01-01T00:00:00Z", None),
        row("2", "https://www.youtube.com/b", 5, "2024-01-01T00:00:00Z", Some("2024-02-01T00:00:00Z")),
        row("3", "https://example.org/c", 5, "2024-01-01T00:00:00Z", Some("2024-03-01T00:00:00Z")),
    ]
}

fn write_json<T: serde::Serialize>(value: &T) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(value).unwrap().as_bytes()).unwrap();
    file
}

fn user() -> User {
    User {
        id: "u1".to_string(),
        email: "u1@example.com".to_string(),
    }
}

fn ids(bookmarks: &[Bookmark]) -> Vec<String> {
    bookmarks.iter().map(|b| b.id.clone()).collect()
}

#[tokio::test]
async fn test_session_lifecycle_through_channel() {
    let store = Arc::new(MemoryStore::with_rows("u1", scenario_rows()));
    store.drop_column("visit_count");

    let controller = SyncController::new(Arc::clone(&store));
    let mut snapshots = controller.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let task = tokio::spawn(controller.run(rx));

    tx.send(ControllerInput::Identity(Some(user()))).await.unwrap();
    let loaded = tokio::time::timeout(Duration::from_secs(5), snapshots.wait_for(|s| s.len() == 3))
        .await
        .unwrap()
        .unwrap()
        .clone();
    // populated through the newest-first fallback, ranked locally
    assert_eq!(ids(&loaded), vec!["3", "2", "1"]);
    assert_eq!(
        store.requests(),
        vec![Request::Select(FetchOrder::Ranked), Request::Select(FetchOrder::Newest)]
    );

    tx.send(ControllerInput::Change(ChangeEvent::Delete { id: "unknown".to_string() }))
        .await
        .unwrap();
    tx.send(ControllerInput::Change(ChangeEvent::Delete { id: "1".to_string() }))
        .await
        .unwrap();
    tx.send(ControllerInput::Shutdown).await.unwrap();

    let controller = task.await.unwrap();
    assert_eq!(ids(&controller.ranked()), vec!["3", "2"]);
    assert_eq!(controller.recommendation().unwrap().id, "3");
    assert_eq!(controller.categories(), vec!["All", "Entertainment", "General"]);
}

#[tokio::test]
async fn test_failed_writes_surface_and_visits_stick() {
    let store = Arc::new(MemoryStore::with_rows("u1", scenario_rows()));
    let mut controller = SyncController::new(Arc::clone(&store));
    controller.set_identity(Some(user()));
    controller.refetch(linkdeck::RefetchTrigger::InitialLoad).await;

    store.set_failing(Operation::Insert, true);
    store.set_failing(Operation::Update, true);

    let err = controller.add("x", "https://www.example.com").await.unwrap_err();
    assert!(matches!(err, SyncError::Remote(_)));
    assert_eq!(controller.bookmarks().len(), 3);

    controller.record_visit("1").unwrap().await.unwrap();
    let local = controller.bookmarks().iter().find(|b| b.id == "1").unwrap();
    assert_eq!(local.visit_count, 4);
}

#[test]
fn test_rank_command() {
    let file = write_json(&scenario_rows());
    let (success, stdout, stderr) = run_cli(&["rank", "--file", file.path().to_str().unwrap()]);

    assert!(success, "rank failed: {}", stderr);
    let first = stdout.find("Bookmark 3").unwrap();
    let second = stdout.find("Bookmark 2").unwrap();
    let third = stdout.find("Bookmark 1").unwrap();
    assert!(first < second && second < third, "unexpected order:\n{}", stdout);
    assert!(stdout.contains("Recommended: Bookmark 3"));
}

#[test]
fn test_rank_command_with_filter() {
    let file = write_json(&scenario_rows());
    let (success, stdout, _) = run_cli(&[
        "rank",
        "--file",
        file.path().to_str().unwrap(),
        "--filter",
        "Dev Tools",
    ]);

    assert!(success);
    assert!(stdout.contains("Bookmark 1"));
    assert!(!stdout.contains("https://www.youtube.com/b"));
}

#[test]
fn test_classify_command() {
    let (success, stdout, _) = run_cli(&[
        "classify",
        "https://stackoverflow.com/q/1",
        "https://slack.com/app",
        "https://www.netflix.com",
        "https://example.org",
    ]);

    assert!(success);
    let labels: Vec<&str> = stdout.lines().map(|l| l.split('\t').next().unwrap()).collect();
    assert_eq!(labels, vec!["Dev Tools", "Productivity", "Entertainment", "General"]);
}

#[test]
fn test_categories_command() {
    let file = write_json(&scenario_rows());
    let (success, stdout, _) = run_cli(&["categories", "--file", file.path().to_str().unwrap()]);

    assert!(success);
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["All", "Dev Tools", "Entertainment", "General"]
    );
}

#[test]
fn test_replay_command() {
    let snapshot = write_json(&scenario_rows());
    let mut events = NamedTempFile::new().unwrap();
    let mut promoted = row("1", "https://github.com/a", 9, "2024-01-01T00:00:00Z", None);
    promoted.title = "Promoted".to_string();
    for event in [
        ChangeEvent::Insert { row: row("3", "https://example.org/c", 0, "2024-01-01T00:00:00Z", None) },
        ChangeEvent::Update { row: promoted },
        ChangeEvent::Delete { id: "2".to_string() },
    ] {
        writeln!(events, "{}", serde_json::to_string(&event).unwrap()).unwrap();
    }

    let (success, stdout, stderr) = run_cli(&[
        "replay",
        "--snapshot",
        snapshot.path().to_str().unwrap(),
        "--events",
        events.path().to_str().unwrap(),
        "--user",
        "u1",
    ]);

    assert!(success, "replay failed: {}", stderr);
    assert!(stdout.contains("Recommended: Promoted"));
    assert!(!stdout.contains("Bookmark 2"));
    // the duplicate insert did not replace the stored row
    assert!(stdout.contains("5 visits  Bookmark 3"));
}

#[test]
fn test_theme_command_toggles_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prefs.json");
    let path = path.to_str().unwrap();

    let (_, stdout, _) = run_cli(&["theme", "--file", path]);
    assert!(stdout.contains("dark_mode: false"));

    let (success, stdout, _) = run_cli(&["theme", "--file", path, "--toggle"]);
    assert!(success);
    assert!(stdout.contains("dark_mode: true"));

    let (_, stdout, _) = run_cli(&["theme", "--file", path]);
    assert!(stdout.contains("dark_mode: true"));
}

#[test]
fn test_help_commands() {
    let (_, stdout, stderr) = run_cli(&["--help"]);
    let combined = format!("{}{}", stdout, stderr);
    assert!(combined.contains("rank") && combined.contains("replay"),
        "Help should list available commands");
}
