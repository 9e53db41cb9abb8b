//! Command behavior tests against an isolated HOME

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_init_writes_default_config() {
    let env = TestEnv::default();

    env.command()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Scout initialized"));

    let config_path = env.data_file("config.json");
    assert!(config_path.exists());

    let config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(config_path).unwrap()).unwrap();
    assert_eq!(config["agent"]["max_iterations"], 15);
    assert_eq!(config["provider"]["kind"], "ollama");
    assert_eq!(config["server"]["port"], 8000);
    assert!(env.data_file("output").is_dir());
}

#[test]
fn test_init_keeps_existing_config() {
    let env = TestEnv::default();
    env.write_config(r#"{"agent": {"model": "qwen2.5:7b"}}"#).unwrap();

    env.command().arg("init").assert().success();

    let content = std::fs::read_to_string(env.data_file("config.json")).unwrap();
    assert!(content.contains("qwen2.5:7b"));
}

#[test]
fn test_status_without_config() {
    let env = TestEnv::default();
    env.command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Scout System Status"))
        .stdout(predicate::str::contains("[Missing]"))
        .stdout(predicate::str::contains("SimplifyJobs, Pitt-CSC, SpeedyApply"));
}

#[test]
fn test_status_reads_config() {
    let env = TestEnv::default();
    env.write_config(r#"{"agent": {"model": "qwen2.5:7b"}, "notify": {"telegram": {"enabled": true}}}"#)
        .unwrap();

    env.command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK]"))
        .stdout(predicate::str::contains("qwen2.5:7b"))
        .stdout(predicate::str::contains("[Enabled]"));
}

#[test]
fn test_status_rejects_invalid_config() {
    let env = TestEnv::default();
    env.write_config("{ not json").unwrap();

    env.command().arg("status").assert().failure();
}

#[test]
fn test_listings_empty_store() {
    let env = TestEnv::default();
    env.command()
        .arg("listings")
        .assert()
        .success()
        .stdout(predicate::str::contains("No listings found"));
}

#[test]
fn test_listings_recent_and_search() {
    let env = TestEnv::default();
    env.write_store().unwrap();

    env.command()
        .arg("listings")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 listings"))
        .stdout(predicate::str::contains("Backend Intern @ Acme"))
        .stdout(predicate::str::contains("72.5"));

    env.command()
        .args(["listings", "--action", "search", "--query", "globex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 listings"))
        .stdout(predicate::str::contains("Data Intern @ Globex"))
        .stdout(predicate::str::contains("Acme").not());
}

#[test]
fn test_listings_unknown_action() {
    let env = TestEnv::default();
    env.command()
        .args(["listings", "--action", "delete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("delete"));
}

#[test]
fn test_workflow_unknown_type() {
    let env = TestEnv::default();
    env.command()
        .args(["workflow", "--type", "weekly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown workflow type: weekly"));
}

#[test]
fn test_run_without_openrouter_key() {
    let env = TestEnv::default();
    env.write_config(r#"{"provider": {"kind": "openrouter"}}"#).unwrap();

    env.command()
        .args(["run", "--goal", "find internships"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No OpenRouter API key"));
}
