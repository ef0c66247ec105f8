// Shared helpers for the local chain integration tests.
//
// Nodes are stand-in shell scripts written to a temp directory, so the harness can be driven
// end to end without a real chain.
#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use localnet_harness::HarnessConfig;
use tempfile::TempDir;

/// An executable script standing in for the node launcher.
#[derive(Debug)]
pub struct ScriptNode {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl ScriptNode {
    /// Writes `body` as a `/bin/sh` script into a fresh temp directory.
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_script(dir.path(), "localnet.sh", body);
        Self { dir, path }
    }

    /// A file inside the script's directory, handy for pid files.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self) -> HarnessConfig {
        config_for(&self.path)
    }
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body.trim())).expect("Failed to write node script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("Failed to make node script executable");
    path
}

/// Harness configuration for a script node with a short grace period.
pub fn config_for(script: &Path) -> HarnessConfig {
    HarnessConfig {
        sh_path: Some(script.to_path_buf()),
        ready_timeout_secs: 30,
        grace_period_ms: 200,
        ..HarnessConfig::default()
    }
}

/// Processes in `pgid` that are still running. Zombies waiting for a reaper do not count.
pub fn live_group_members(pgid: i32) -> Vec<i32> {
    let Ok(entries) = fs::read_dir("/proc") else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse::<i32>().ok())
        .filter(|pid| {
            let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
                return false;
            };
            // Fields after the parenthesised command name: state, ppid, pgrp, ...
            let Some((_, rest)) = stat.rsplit_once(')') else {
                return false;
            };
            let fields: Vec<&str> = rest.split_whitespace().collect();
            fields.len() > 2 && fields[0] != "Z" && fields[0] != "X" && fields[2] == pgid.to_string()
        })
        .collect()
}

/// Polls until no member of `pgid` is running, for at most `timeout`.
pub fn group_gone_within(pgid: i32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if live_group_members(pgid).is_empty() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(50));
    }
}

/// Reads a pid written by a script with `echo $$ > file`.
pub fn read_pid(path: &Path) -> i32 {
    fs::read_to_string(path)
        .expect("Node script did not write its pid")
        .trim()
        .parse()
        .expect("Pid file is not a number")
}
