//! Common test utilities for Scout integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated HOME so config and store land in a temp dir
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".scout");

        Ok(Self { temp_dir, data_dir })
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Command with HOME pointed at the temp dir and secrets cleared
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_scout"));
        cmd.env("HOME", self.temp_dir.path());
        for key in [
            "OPENROUTER_API_KEY",
            "BRAVE_API_KEY",
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    pub fn write_config(&self, json: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.data_file("config.json"), json)?;
        Ok(())
    }

    /// Store file with two listings, one scored
    pub fn write_store(&self) -> anyhow::Result<()> {
        let store = r#"{
  "next_id": 2,
  "listings": [
    {
      "id": 1,
      "agent_job_id": "seed",
      "title": "Backend Intern",
      "company": "Acme",
      "url": "https://acme.com/jobs/1",
      "source": "SimplifyJobs",
      "discovered_at": "2026-01-05T10:00:00Z",
      "relevance_score": 72.5
    },
    {
      "id": 2,
      "agent_job_id": "seed",
      "title": "Data Intern",
      "company": "Globex",
      "source": "GitHub",
      "discovered_at": "2026-01-06T10:00:00Z"
    }
  ]
}"#;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.data_file("listings.json"), store)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
