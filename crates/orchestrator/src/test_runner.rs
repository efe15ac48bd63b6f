// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs the project's configured test command for the `run_tests` verb.
//! Grounded on the same spawn-and-bound-with-timeout shape as the reviewer
//! adapter: a crashed or timed-out run is a failed test run, not a
//! dispatch-level error, so this never returns anything but a `Response`.

use std::process::Stdio;
use std::time::Duration;

use warden_store::ProjectPaths;
use warden_wire::Response;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Run `test_command` (split on whitespace into program + base args) with
/// `files` appended as extra arguments, from the project root. The command
/// is never passed through a shell, so `files` can't smuggle in extra
/// arguments or shell metacharacters.
pub async fn run_tests(paths: &ProjectPaths, test_command: &str, files: &[String], timeout_secs: Option<u64>) -> Response {
    let mut parts = test_command.split_whitespace();
    let Some(program) = parts.next() else {
        return Response::test_run(false, "no test_command configured");
    };

    let mut command = tokio::process::Command::new(program);
    command.args(parts).args(files);
    if let Some(project_root) = paths.root().parent() {
        command.current_dir(project_root);
    }
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return Response::test_run(false, &format!("failed to spawn test command: {e}")),
    };

    let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let passed = output.status.success();
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            Response::test_run(passed, &combined)
        }
        Ok(Err(e)) => Response::test_run(false, &format!("test command failed to run: {e}")),
        Err(_) => Response::test_run(false, "test command timed out"),
    }
}

#[cfg(test)]
#[path = "test_runner_tests.rs"]
mod tests;
