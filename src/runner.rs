//! External command execution.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

/// Runs one catalog command and hands back its stdout.
///
/// Implementations never fail: a command that cannot be started, exits
/// non-zero or times out produces an empty string, which every parser reads
/// as "no data".
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> impl Future<Output = String> + Send;
}

/// Runs commands through `sh -c` so catalog templates may use pipes.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> String {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).to_string()
            }
            Ok(Ok(output)) => {
                debug!(
                    command,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "command failed"
                );
                String::new()
            }
            Ok(Err(e)) => {
                debug!(command, error = %e, "command could not be started");
                String::new()
            }
            Err(_) => {
                warn!(
                    command,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "command timed out"
                );
                String::new()
            }
        }
    }
}
