//! Common test utilities and helpers
//!
//! Shared by the library scenario tests and the CLI tests: a builder around
//! the `cmdroute` binary, a temporary environment holding a schema and a
//! config file, and a recording action for inspecting dispatched arguments.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use cmdroute::command::{action_fn, CommandAction};
use cmdroute::process::Arguments;
use predicates::prelude::*;
use tempfile::TempDir;

/// Schema used by the CLI tests
pub const SAMPLE_SCHEMA: &str = r#"
[[category]]
name = "admin"
description = "Administration"
permission = "admin"

[[command]]
path = "set"
aliases = ["assign"]
description = "Assign a value"

[[command.param]]
name = "name"

[[command.param]]
name = "value"
type = "number"
default = 0

[[command]]
path = "admin ban"
description = "Ban a player"

[[command.param]]
name = "target"
min_length = 3

[[command.param]]
name = "silent"
switch = true

[[command.param]]
name = "mode"
choices = ["Soft", "Hard"]
flag = true
optional = true
"#;

/// Test command builder for the cmdroute CLI
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    pub fn new() -> Self {
        let cmd = Command::cargo_bin("cmdroute").expect("Failed to find cmdroute binary");
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg.as_ref());
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    pub fn env_remove<K: AsRef<str>>(mut self, key: K) -> Self {
        self.cmd.env_remove(key.as_ref());
        self
    }

    /// Execute and expect success
    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    /// Execute and expect a non-zero exit
    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self.assert.stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self { assert: self.assert }
    }

    pub fn stdout_lacks<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self
            .assert
            .stdout(predicate::str::contains(text.as_ref()).not());
        Self { assert }
    }

    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Finish the assertion
    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// A temporary directory holding a schema and a config path
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
    pub schema_path: PathBuf,
}

impl TestEnvironment {
    /// Create an environment with [`SAMPLE_SCHEMA`] written out
    pub fn new() -> Self {
        Self::with_schema(SAMPLE_SCHEMA)
    }

    pub fn with_schema(schema: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config/config.toml");
        let schema_path = temp_dir.path().join("commands.toml");
        std::fs::write(&schema_path, schema).expect("Failed to write schema");

        Self {
            temp_dir,
            config_path,
            schema_path,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A command pointed at this environment's config file only
    pub fn bare_command(&self) -> TestCommand {
        TestCommand::new()
            .arg("--config")
            .arg(self.config_path.to_string_lossy().as_ref())
    }

    /// A command pointed at this environment's config and schema
    pub fn command(&self) -> TestCommand {
        self.bare_command()
            .arg("--schema")
            .arg(self.schema_path.to_string_lossy().as_ref())
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments of every invocation seen by a [`recording_action`]
pub type Calls = Arc<Mutex<Vec<Arguments>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

/// An action that records the arguments it was invoked with
pub fn recording_action(calls: &Calls) -> CommandAction {
    let calls = Arc::clone(calls);
    action_fn(move |invocation| {
        calls.lock().unwrap().push(invocation.arguments.clone());
        Ok(())
    })
}

pub fn call_count(calls: &Calls) -> usize {
    calls.lock().unwrap().len()
}

pub fn last_call(calls: &Calls) -> Arguments {
    calls
        .lock()
        .unwrap()
        .last()
        .cloned()
        .expect("action was never invoked")
}

/// Assertion helpers for common patterns
pub mod assertions {
    pub fn assert_path_exists<P: AsRef<std::path::Path>>(path: P) {
        assert!(
            path.as_ref().exists(),
            "Path should exist: {}",
            path.as_ref().display()
        );
    }
}
