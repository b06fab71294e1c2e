//! Execution sandbox
//!
//! Runs one job's code as an isolated child process under a hard deadline:
//! - Stages the code to a fresh, uniquely-named script
//! - Spawns the interpreter in its own process group with no stdin
//! - Captures stdout and stderr fully, concurrently with the wait
//! - Kills the whole process tree when the deadline expires
//! - Removes the staged script on every exit path
//!
//! `execute` never returns an error: anything that goes wrong becomes an
//! outcome with the `-1` sentinel exit code for the caller to report.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use crucible_core::domain::ExecutionOutcome;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};
use uuid::Uuid;

/// Deadline-bounded subprocess executor.
pub struct Sandbox {
    interpreter: String,
    scratch_dir: PathBuf,
}

impl Sandbox {
    /// Creates a sandbox that runs scripts with `interpreter`, staging them
    /// under `scratch_dir`.
    pub fn new(interpreter: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Executes `code` and returns the captured outcome.
    ///
    /// The script name is never reused across invocations, so concurrent
    /// jobs cannot contaminate each other through the filesystem.
    pub async fn execute(&self, code: &str, deadline: Duration) -> ExecutionOutcome {
        let script = self.scratch_dir.join(format!("job-{}.py", Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&script, code).await {
            return ExecutionOutcome::failed(format!(
                "failed to stage script {}: {e}",
                script.display()
            ));
        }

        let outcome = self.run_script(&script, deadline).await;

        // Single removal point all outcome paths funnel through.
        if let Err(e) = tokio::fs::remove_file(&script).await {
            warn!("Failed to remove staged script {}: {}", script.display(), e);
        }

        outcome
    }

    async fn run_script(&self, script: &Path, deadline: Duration) -> ExecutionOutcome {
        let mut command = Command::new(&self.interpreter);
        command
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so the deadline can reap descendants and not
        // just the direct child.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionOutcome::failed(format!(
                    "failed to launch {}: {e}",
                    self.interpreter
                ));
            }
        };

        // Drain both pipes concurrently with the wait. A child filling one
        // pipe to capacity must never deadlock against us reading the other.
        let stdout_task = drain(child.stdout.take());
        let stderr_task = drain(child.stderr.take());

        match time::timeout(deadline, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                // Signal deaths carry no exit code; fold them into the
                // failure sentinel.
                let exit_code = status.code().unwrap_or(-1);
                ExecutionOutcome {
                    stdout,
                    stderr,
                    exit_code,
                }
            }
            Ok(Err(e)) => {
                kill_process_tree(&mut child).await;
                let stdout = stdout_task.await.unwrap_or_default();
                let _ = stderr_task.await;
                ExecutionOutcome {
                    stdout,
                    stderr: format!("failed waiting for child process: {e}"),
                    exit_code: -1,
                }
            }
            Err(_) => {
                debug!("Deadline of {:?} expired, killing process tree", deadline);
                kill_process_tree(&mut child).await;
                // The kill closes the pipes, so the drains finish with
                // whatever partial output the child managed to write.
                let stdout = stdout_task.await.unwrap_or_default();
                let _ = stderr_task.await;
                ExecutionOutcome {
                    stdout,
                    stderr: format!("Execution timed out ({} seconds)", deadline.as_secs()),
                    exit_code: -1,
                }
            }
        }
    }
}

/// Reads a captured pipe to completion off-task.
fn drain<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return String::new();
        };
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Forcibly terminates the child and every descendant in its process group,
/// then reaps the child.
async fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The child leads its own group (process_group(0) at spawn), so a
        // signal to the negative pgid reaches the whole tree.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }

    if let Err(e) = child.kill().await {
        warn!("Failed to kill child process: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The tests run scripts through `sh` so they do not depend on a python
    // install; the sandbox itself never inspects the interpreter.
    fn sh_sandbox() -> (Sandbox, PathBuf) {
        let dir = std::env::temp_dir().join(format!("crucible-sandbox-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        (Sandbox::new("sh", dir.clone()), dir)
    }

    fn scratch_file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn captures_stdout_of_successful_run() {
        let (sandbox, dir) = sh_sandbox();

        let outcome = sandbox.execute("echo hello", Duration::from_secs(60)).await;

        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(scratch_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn preserves_stderr_and_exit_code_of_failing_run() {
        let (sandbox, dir) = sh_sandbox();

        let outcome = sandbox
            .execute("echo oops >&2\nexit 3", Duration::from_secs(60))
            .await;

        assert_eq!(outcome.exit_code, 3);
        assert!(outcome.stderr.contains("oops"));
        assert_eq!(scratch_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn deadline_expiry_kills_the_child_and_reports_timeout() {
        let (sandbox, dir) = sh_sandbox();

        let started = std::time::Instant::now();
        let outcome = sandbox.execute("sleep 30", Duration::from_secs(1)).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.exit_code, -1);
        assert!(outcome.stderr.contains("Execution timed out"));
        assert_eq!(scratch_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn partial_stdout_survives_a_timeout() {
        let (sandbox, dir) = sh_sandbox();

        let outcome = sandbox
            .execute("echo partial\nsleep 30", Duration::from_secs(1))
            .await;

        assert_eq!(outcome.exit_code, -1);
        assert!(outcome.stdout.contains("partial"));
        assert!(outcome.stderr.contains("Execution timed out"));
        assert_eq!(scratch_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_launch_failure_outcome() {
        let dir = std::env::temp_dir().join(format!("crucible-sandbox-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let sandbox = Sandbox::new("definitely-not-an-interpreter", dir.clone());

        let outcome = sandbox.execute("echo hi", Duration::from_secs(60)).await;

        assert_eq!(outcome.exit_code, -1);
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.contains("failed to launch"));
        // The staged script is removed even when the spawn never happened.
        assert_eq!(scratch_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn large_output_does_not_stall_the_child() {
        let (sandbox, dir) = sh_sandbox();

        // Well past the 64 KiB pipe buffer.
        let outcome = sandbox
            .execute(
                "i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done",
                Duration::from_secs(30),
            )
            .await;

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout.len(), 20000 * 11);
        assert_eq!(scratch_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn concurrent_executions_use_distinct_scripts() {
        let (sandbox, dir) = sh_sandbox();
        let sandbox = std::sync::Arc::new(sandbox);

        let mut handles = Vec::new();
        for i in 0..4 {
            let sandbox = std::sync::Arc::clone(&sandbox);
            handles.push(tokio::spawn(async move {
                sandbox
                    .execute(&format!("echo job-{i}"), Duration::from_secs(60))
                    .await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.stdout, format!("job-{i}\n"));
        }
        assert_eq!(scratch_file_count(&dir), 0);
    }
}
