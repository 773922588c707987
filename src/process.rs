// src/process.rs
//! Running external scanners
//!
//! Failures are logged and turned into `None`; nothing here returns an
//! error to the caller.

use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

/// Check that `command` is on the PATH, quietly
pub async fn try_command(command: &str) -> bool {
    let status = Command::new("which")
        .arg(command)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!("No command found: {} (which exited with {})", command, status);
            false
        }
        Err(e) => {
            warn!("Couldn't look for command {}: {}", command, e);
            false
        }
    }
}

/// Options for [`scan`]
#[derive(Debug, Clone, Default)]
pub struct ScanCommand<'a> {
    /// Replaces the inherited environment when set
    pub env: Option<&'a HashMap<String, String>>,
    /// Non-zero exit codes whose output is still wanted
    pub allowed_return_codes: &'a [i32],
    pub timeout: Option<Duration>,
}

/// stdout followed by stderr, as one string
fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

async fn run_with_timeout(mut cmd: Command, timeout: Option<Duration>) -> std::io::Result<Output> {
    cmd.kill_on_drop(true);
    let output = cmd.output();
    match timeout {
        Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("timed out after {:?}", limit),
            )
        })?,
        None => output.await,
    }
}

/// Run a scanner without a shell and return its combined output.
///
/// A non-zero exit is only accepted when listed in `allowed_return_codes`.
pub async fn scan<S: AsRef<str>>(command: &[S], opts: ScanCommand<'_>) -> Option<String> {
    let (program, args) = command.split_first()?;
    let cmdline = command.iter().map(|a| a.as_ref()).collect::<Vec<_>>().join(" ");

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args.iter().map(|a| a.as_ref())).stdin(Stdio::null());
    if let Some(env) = opts.env {
        cmd.env_clear().envs(env);
    }

    let output = match run_with_timeout(cmd, opts.timeout).await {
        Ok(output) => output,
        Err(e) => {
            warn!("Error running {}: {}", cmdline, e);
            return None;
        }
    };

    if output.status.success() {
        return Some(combined_output(&output));
    }

    match output.status.code() {
        Some(code) if opts.allowed_return_codes.contains(&code) => Some(combined_output(&output)),
        code => {
            warn!("Error running {} (exit code {:?}).", cmdline, code);
            warn!("Error running {}.", combined_output(&output).trim_end());
            None
        }
    }
}

/// Run `command` through `sh -c`, for when a shell is unavoidable
pub async fn unsafe_execute(command: &str) -> Option<String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            warn!("Error running {} ({}).", command, output.status);
            None
        }
        Err(e) => {
            warn!("Error running {}: {}", command, e);
            None
        }
    }
}
