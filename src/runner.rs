use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Why an external command produced no usable output. Callers branch on this
/// to print a single user-facing message instead of crashing the task.
#[derive(Debug)]
pub enum RunError {
    /// The binary was missing or could not be started.
    Launch(std::io::Error),
    /// The command ran but exited non-zero (code, if any).
    Status(Option<i32>),
    /// The command did not finish within the deadline and was killed.
    Timeout(u64),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Launch(e) => write!(f, "failed to launch: {}", e),
            RunError::Status(Some(code)) => write!(f, "exited with status {}", code),
            RunError::Status(None) => write!(f, "terminated by signal"),
            RunError::Timeout(secs) => write!(f, "timed out after {}s", secs),
        }
    }
}

impl std::error::Error for RunError {}

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run an external command, capture stdout as text, and enforce a deadline.
/// Stdout is drained on a helper thread so a chatty child cannot deadlock on
/// a full pipe while we poll for exit. The helper is never joined: a
/// grandchild that inherited the pipe's write end would keep `read_to_end`
/// blocked past the child's own exit, so every path out of here is bounded
/// by the deadline and the drain thread is left to finish on its own.
pub fn run(program: &str, args: &[&str], timeout: Duration) -> Result<String, RunError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(RunError::Launch)?;
    let stdout = child.stdout.take();
    let (tx, rx) = std::sync::mpsc::channel::<String>();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout {
            let _ = out.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return Err(RunError::Status(status.code()));
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                return match rx.recv_timeout(remaining) {
                    Ok(text) => Ok(text),
                    // pipe still held open by a grandchild
                    Err(_) => Err(RunError::Timeout(timeout.as_secs())),
                };
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunError::Timeout(timeout.as_secs()));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::Launch(e));
            }
        }
    }
}

/// Mutating action variant (e.g. `sc start <name>`): output is discarded,
/// only the success/failure branch matters.
pub fn run_action(program: &str, args: &[&str], timeout: Duration) -> Result<(), RunError> {
    run(program, args, timeout).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn captures_stdout_on_success() {
        let out = run("sh", &["-c", "printf 'KEY: value\\n'"], Duration::from_secs(10)).unwrap();
        assert_eq!(out, "KEY: value\n");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_status_error() {
        match run("sh", &["-c", "exit 3"], Duration::from_secs(10)) {
            Err(RunError::Status(Some(3))) => {}
            other => panic!("expected Status(3), got {:?}", other),
        }
    }

    #[test]
    fn missing_binary_is_launch_error() {
        match run("winaudit-definitely-not-a-binary", &[], Duration::from_secs(1)) {
            Err(RunError::Launch(_)) => {}
            other => panic!("expected Launch, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stalled_command_is_killed_on_timeout() {
        let start = Instant::now();
        match run("sh", &["-c", "sleep 30"], Duration::from_millis(300)) {
            Err(RunError::Timeout(_)) => {}
            other => panic!("expected Timeout, got {:?}", other),
        }
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn background_grandchild_cannot_hold_the_pipe_open() {
        // the shell exits at once but `sleep` inherits the stdout write end;
        // the drain must give up at the deadline instead of waiting 30s
        let start = Instant::now();
        let res = run("sh", &["-c", "sleep 30 & echo ready"], Duration::from_millis(400));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(matches!(res, Err(RunError::Timeout(_))));
    }

    #[cfg(unix)]
    #[test]
    fn action_discards_output() {
        assert!(run_action("sh", &["-c", "echo started"], Duration::from_secs(10)).is_ok());
        assert!(run_action("sh", &["-c", "exit 1"], Duration::from_secs(10)).is_err());
    }
}
