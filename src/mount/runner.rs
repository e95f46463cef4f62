//! Bounded-timeout subprocess runner
//!
//! Every external tool invocation goes through here: spawn with piped stdio,
//! capture both streams on background threads, and poll the child against a
//! deadline. On timeout the child is killed and reaped so no zombie survives
//! the call.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

/// Output from a finished (or killed) tool invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output lines
    pub stdout: Vec<String>,
    /// Standard error lines
    pub stderr: Vec<String>,
    /// Exit status code, -1 if killed by signal
    pub status: i32,
    /// Whether the process was killed due to timeout
    pub timed_out: bool,
}

impl CommandOutput {
    /// Check if the invocation succeeded
    pub fn success(&self) -> bool {
        self.status == 0 && !self.timed_out
    }

    /// Get stdout as a single string
    pub fn stdout_string(&self) -> String {
        self.stdout.join("\n")
    }

    /// Get stderr as a single string
    pub fn stderr_string(&self) -> String {
        self.stderr.join("\n")
    }

    /// Best available diagnostic text: stderr, else stdout, else a fixed
    /// fallback. Tools report errors inconsistently across the two streams.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr_string().trim().to_string();
        if !stderr.is_empty() {
            return stderr;
        }
        let stdout = self.stdout_string().trim().to_string();
        if !stdout.is_empty() {
            return stdout;
        }
        "Unknown error".to_string()
    }
}

/// Run `program` with `args`, capturing output, bounded by `timeout`.
///
/// A spawn failure (missing tool, permission error) is an `Err`; a timeout is
/// a normal `CommandOutput` with `timed_out` set, so callers can tell the two
/// apart without parsing messages.
pub fn run_command(program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    let stdout = child.stdout.take().expect("stdout piped");
    let stderr = child.stderr.take().expect("stderr piped");

    let (stdout_tx, stdout_rx) = mpsc::channel();
    let (stderr_tx, stderr_rx) = mpsc::channel();

    let stdout_thread = thread::spawn(move || capture_output(stdout, stdout_tx));
    let stderr_thread = thread::spawn(move || capture_output(stderr, stderr_tx));

    let (status, timed_out) = wait_with_timeout(&mut child, timeout)?;

    stdout_thread.join().expect("stdout thread panicked");
    stderr_thread.join().expect("stderr thread panicked");

    let stdout: Vec<String> = stdout_rx.try_iter().collect();
    let stderr: Vec<String> = stderr_rx.try_iter().collect();

    Ok(CommandOutput {
        stdout,
        stderr,
        status: status.code().unwrap_or(-1),
        timed_out,
    })
}

/// Capture output from a reader and send it through a channel
fn capture_output<R: std::io::Read>(reader: R, tx: Sender<String>) {
    let reader = BufReader::new(reader);
    for line in reader.lines() {
        if let Ok(line) = line {
            let _ = tx.send(line);
        }
    }
}

/// Wait for a child process, killing and reaping it once `timeout` elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool)> {
    let start = std::time::Instant::now();
    loop {
        match child.try_wait()? {
            Some(status) => return Ok((status, false)),
            None => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let status = child.wait()?;
                    return Ok((status, true));
                }
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_spawn_failure_is_error() {
        let result = run_command(
            "definitely-not-a-real-tool-xyz",
            &[],
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_captures_exit_code_and_streams() {
        let output = run_command(
            "sh",
            &args(&["-c", "echo out; echo err >&2; exit 3"]),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(!output.success());
        assert!(!output.timed_out);
        assert_eq!(output.status, 3);
        assert_eq!(output.stdout_string(), "out");
        assert_eq!(output.stderr_string(), "err");
    }

    #[test]
    #[cfg(unix)]
    fn test_timeout_kills_child() {
        let start = std::time::Instant::now();
        let output = run_command(
            "sh",
            &args(&["-c", "sleep 30"]),
            Duration::from_millis(200),
        )
        .unwrap();

        assert!(output.timed_out);
        assert!(!output.success());
        // The child was killed, not waited out.
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    #[cfg(unix)]
    fn test_diagnostic_fallback_chain() {
        let both = CommandOutput {
            stdout: vec!["from stdout".to_string()],
            stderr: vec!["from stderr".to_string()],
            status: 1,
            timed_out: false,
        };
        assert_eq!(both.diagnostic(), "from stderr");

        let stdout_only = CommandOutput {
            stdout: vec!["from stdout".to_string()],
            stderr: vec![],
            status: 1,
            timed_out: false,
        };
        assert_eq!(stdout_only.diagnostic(), "from stdout");

        let silent = CommandOutput {
            stdout: vec![],
            stderr: vec![],
            status: 1,
            timed_out: false,
        };
        assert_eq!(silent.diagnostic(), "Unknown error");
    }
}
