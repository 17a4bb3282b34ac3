//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const DEMO_CURRICULUM: &str = "../../demos/curriculum.json";

fn tutor(db: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("science-tutor").unwrap();
    cmd.env_remove("SCIENCE_DB_URL")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db);
    cmd
}

fn seeded_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("tutor.sqlite3");
    tutor(&db)
        .arg("seed")
        .arg(DEMO_CURRICULUM)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"topics\": 6"));
    (dir, db)
}

fn json_out(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn topics_are_listed_in_catalog_order() {
    let (_dir, db) = seeded_db();

    let all = json_out(tutor(&db).arg("topics"));
    assert_eq!(ids(&all), ["1", "2", "3", "6", "8", "13"]);
    assert_eq!(all[0]["lessonCount"], 3);
    assert_eq!(all[5]["level"], "a-level");

    let physics = json_out(tutor(&db).args(["topics", "--subject", "physics"]));
    assert_eq!(ids(&physics), ["3", "8", "13"]);

    let gcse = json_out(tutor(&db).args(["topics", "--level", "gcse"]));
    assert_eq!(ids(&gcse), ["6", "8"]);
}

#[test]
fn unknown_subject_is_invalid_input() {
    let (_dir, db) = seeded_db();
    tutor(&db)
        .args(["topics", "--subject", "geology"])
        .assert()
        .code(4);
}

#[test]
fn lessons_and_exercises_keep_their_order() {
    let (_dir, db) = seeded_db();

    let lessons = json_out(tutor(&db).args(["lessons", "1"]));
    assert_eq!(ids(&lessons), ["l1", "l2", "l3"]);
    assert_eq!(lessons[2]["hasExercises"], false);

    let exercises = json_out(tutor(&db).args(["exercises", "l1"]));
    assert_eq!(ids(&exercises), ["e1", "e2", "e3"]);
    assert_eq!(exercises[0]["type"], "multiple-choice");
    assert_eq!(exercises[0]["options"].as_array().unwrap().len(), 4);
    assert_eq!(exercises[1]["order"], 1);

    let lesson = json_out(tutor(&db).args(["lesson", "l6"]));
    assert!(lesson["content"].as_str().unwrap().contains("6CO₂"));
}

#[test]
fn missing_entities_exit_with_not_found() {
    let (_dir, db) = seeded_db();

    tutor(&db)
        .args(["topic", "99"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("topic not found"));
    tutor(&db).args(["lesson", "l99"]).assert().code(3);

    // Lists under an unknown parent are simply empty.
    let lessons = json_out(tutor(&db).args(["lessons", "99"]));
    assert_eq!(lessons, Value::Array(Vec::new()));
}

#[test]
fn submitting_answers_grades_and_records() {
    let (_dir, db) = seeded_db();

    let right = json_out(tutor(&db).args(["submit", "e3", "Mitochondria!"]));
    assert_eq!(right["isCorrect"], true);
    assert_eq!(right["correctAnswer"], "mitochondria");

    let wrong = json_out(tutor(&db).args(["submit", "e2", "true"]));
    assert_eq!(wrong["isCorrect"], false);
    assert!(
        wrong["explanation"]
            .as_str()
            .unwrap()
            .contains("do not have a nucleus")
    );

    tutor(&db).args(["submit", "e3", "   "]).assert().code(4);
    tutor(&db).args(["submit", "e404", "anything"]).assert().code(3);
    tutor(&db).args(["submit", "e404", "   "]).assert().code(3);

    let progress = json_out(tutor(&db).args(["progress", "1"]));
    assert_eq!(progress["exercisesCompleted"], 2);
    assert_eq!(progress["totalExercises"], 5);
    assert_eq!(progress["averageScore"], 50.0);
}

#[test]
fn completing_lessons_updates_status_and_progress() {
    let (_dir, db) = seeded_db();

    tutor(&db)
        .args(["status", "l1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"completed\": false"));

    for _ in 0..2 {
        let done = json_out(tutor(&db).args(["complete", "l1", "1"]));
        assert_eq!(done, serde_json::json!({ "success": true }));
    }

    let status = json_out(tutor(&db).args(["status", "l1"]));
    assert_eq!(status["completed"], true);

    let all = json_out(tutor(&db).arg("progress"));
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["lessonId"], "l1");

    let summary = json_out(tutor(&db).args(["progress", "1"]));
    assert_eq!(summary["completedLessons"], 1);
    assert_eq!(summary["totalLessons"], 3);
    assert!(summary.get("averageScore").is_none());

    let padded = json_out(tutor(&db).args(["complete", " l2 ", "1"]));
    assert_eq!(padded["success"], true);
    let status = json_out(tutor(&db).args(["status", "l2"]));
    assert_eq!(status["completed"], true);

    tutor(&db).args(["complete", "l6", "1"]).assert().code(4);
    tutor(&db).args(["complete", "  ", "1"]).assert().code(4);
    tutor(&db).args(["complete", "l99", "1"]).assert().code(3);
}

#[test]
fn reseeding_is_repeatable() {
    let (_dir, db) = seeded_db();
    tutor(&db).arg("seed").arg(DEMO_CURRICULUM).assert().success();
    let all = json_out(tutor(&db).arg("topics"));
    assert_eq!(all.as_array().unwrap().len(), 6);
}

#[test]
fn invalid_curriculum_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("tutor.sqlite3");
    let bad = dir.path().join("bad.json");
    std::fs::write(
        &bad,
        r#"{ "lessons": [ { "id": "l1", "topicId": "nope", "title": "Orphan", "order": 0 } ] }"#,
    )
    .unwrap();

    tutor(&db)
        .arg("seed")
        .arg(&bad)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unknown topic"));

    let topics = json_out(tutor(&db).arg("topics"));
    assert_eq!(topics, Value::Array(Vec::new()));
}

#[test]
fn missing_seed_file_fails() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("tutor.sqlite3");
    tutor(&db)
        .arg("seed")
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn database_url_can_come_from_the_environment() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("nested").join("env.sqlite3");

    #[allow(deprecated)]
    let mut seed = Command::cargo_bin("science-tutor").unwrap();
    seed.env("SCIENCE_DB_URL", format!("sqlite:{}", db.display()))
        .arg("seed")
        .arg(DEMO_CURRICULUM)
        .assert()
        .success();

    assert!(db.exists());
    let topics = json_out(tutor(&db).arg("topics"));
    assert_eq!(topics.as_array().unwrap().len(), 6);
}

#[test]
fn shared_memory_uri_leaves_no_file_behind() {
    let dir = TempDir::new().unwrap();
    let curriculum = std::fs::canonicalize(DEMO_CURRICULUM).unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("science-tutor").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("SCIENCE_DB_URL")
        .args(["--db", "sqlite:file:cli_scratch?mode=memory&cache=shared", "seed"])
        .arg(curriculum)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"topics\": 6"));

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
