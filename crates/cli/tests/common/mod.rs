// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch directory holding the files a test passes to the binary
pub struct Workdir {
    dir: TempDir,
}

impl Workdir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `content` to `name` inside the workdir and return its path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Write one JSON document per line
    pub fn write_lines(&self, name: &str, lines: &[serde_json::Value]) -> PathBuf {
        let content: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        self.write(name, &content.join("\n"))
    }
}

/// The busline binary with logging kept quiet
pub fn busline() -> Command {
    let mut cmd = Command::cargo_bin("busline").expect("busline binary");
    cmd.env("RUST_LOG", "warn");
    cmd
}
