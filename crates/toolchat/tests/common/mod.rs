//! Shared helpers for CLI integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const ENV_VARS: &[&str] = &[
    "TOOLCHAT_API_KEY",
    "OPENAI_API_KEY",
    "TOOLCHAT_API_BASE",
    "TOOLCHAT_MODEL",
    "TOOLCHAT_MAX_ROUNDS",
    "TOOLCHAT_TOOL_TIMEOUT_SECS",
    "TOOLCHAT_HOST",
    "TOOLCHAT_PORT",
    "TOOLCHAT_ALLOWED_ORIGINS",
];

/// Isolated home directory so tests never read the real config
pub struct TestEnv {
    pub home: TempDir,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { home: tempdir()? })
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.path().join(".toolchat").join("config.json")
    }

    /// A `toolchat` command with HOME pointed at the temp dir and a clean env
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_toolchat"));
        cmd.env("HOME", self.home.path());
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}
