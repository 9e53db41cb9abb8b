//! Tests for path utilities

use scout_config::paths::{config_path, data_dir, ensure_dir, expand_home};
use std::path::PathBuf;

#[test]
fn test_config_lives_in_data_dir() {
    assert!(data_dir().ends_with(".scout"));
    assert_eq!(config_path(), data_dir().join("config.json"));
}

#[test]
fn test_expand_home() {
    assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    assert_eq!(expand_home("relative"), PathBuf::from("relative"));

    if let Some(home) = dirs::home_dir() {
        assert_eq!(expand_home("~/x/y"), home.join("x/y"));
        assert_eq!(expand_home("~"), home);
    }
}

#[tokio::test]
async fn test_ensure_dir_nested() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b").join("c");

    ensure_dir(&nested).await.expect("Failed to create");
    assert!(nested.is_dir());

    // idempotent
    ensure_dir(&nested).await.expect("Second call failed");
}
