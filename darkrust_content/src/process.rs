use std::{
    io::{self, Read},
    process::{Child, Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use darkrust_shared::log::{trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Exited(i32),
    /// Terminated by a signal
    Terminated,
    /// Killed because it ran longer than the timeout
    TimedOut(Duration),
}

impl ProcessStatus {
    pub fn success(&self) -> bool {
        *self == ProcessStatus::Exited(0)
    }
}

impl From<ExitStatus> for ProcessStatus {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ProcessStatus::Exited(code),
            None => ProcessStatus::Terminated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the `command` to completion and captures stdout and stderr.
///
/// When a `timeout` is given, the process is killed after it elapsed and the status is
/// [`ProcessStatus::TimedOut`]. Without a timeout this blocks until the process exits.
/// An error is only returned when the process can't be spawned or waited on.
pub fn run_process(command: &mut Command, timeout: Option<Duration>) -> io::Result<ProcessOutput> {
    trace!("Running command: {command:?}");
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Both pipes are drained on their own threads because a child that fills one of the
    // pipe buffers blocks until somebody reads from it.
    let readers = spawn_reader("stdout", child.stdout.take())
        .and_then(|stdout_reader| Ok((stdout_reader, spawn_reader("stderr", child.stderr.take())?)));
    let (stdout_reader, stderr_reader) = match readers {
        Ok(readers) => readers,
        Err(err) => {
            kill_and_reap(&mut child);
            return Err(err);
        }
    };

    let status = match timeout {
        Some(timeout) => wait_with_timeout(&mut child, timeout)?,
        None => child.wait()?.into(),
    };

    // Grandchildren of a killed process can keep the pipes open, so the readers are
    // detached instead of joined.
    if let ProcessStatus::TimedOut(_) = status {
        return Ok(ProcessOutput {
            status,
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    Ok(ProcessOutput {
        status,
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    })
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<ProcessStatus> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.into());
        }
        if start.elapsed() >= timeout {
            warn!("Process {} exceeded the timeout of {timeout:?} and will be killed", child.id());
            kill_and_reap(child);
            return Ok(ProcessStatus::TimedOut(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills the `child` and waits for it so that it doesn't outlive a failed run.
fn kill_and_reap(child: &mut Child) {
    // The process might have exited already.
    if let Err(err) = child.kill() {
        trace!("Failed to kill process {}: {err}", child.id());
    }
    if let Err(err) = child.wait() {
        warn!("Failed to wait for process {}: {err}", child.id());
    }
}

fn spawn_reader<R>(name: &str, pipe: Option<R>) -> io::Result<Option<JoinHandle<String>>>
where
    R: Read + Send + 'static,
{
    let Some(mut pipe) = pipe else {
        return Ok(None);
    };
    let handle = thread::Builder::new().name(format!("process {name} reader")).spawn(move || {
        let mut buffer = Vec::new();
        if let Err(err) = pipe.read_to_end(&mut buffer) {
            warn!("Failed to read from pipe: {err}");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })?;
    Ok(Some(handle))
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[test]
    fn captures_exit_code_and_stderr() {
        let output = run_process(&mut sh("echo out; echo broken >&2; exit 2"), None).unwrap();
        assert_eq!(output.status, ProcessStatus::Exited(2));
        assert!(!output.status.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "broken");
    }

    #[test]
    fn success() {
        let output = run_process(&mut sh("exit 0"), Some(Duration::from_secs(10))).unwrap();
        assert!(output.status.success());
    }

    #[test]
    fn timeout_kills_the_process() {
        let start = Instant::now();
        let output = run_process(&mut sh("exec sleep 5"), Some(Duration::from_millis(100))).unwrap();
        assert_eq!(output.status, ProcessStatus::TimedOut(Duration::from_millis(100)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn kill_and_reap_leaves_no_running_child() {
        let mut child = sh("exec sleep 5").spawn().unwrap();
        kill_and_reap(&mut child);
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn terminated_by_signal() {
        let output = run_process(&mut sh("kill -9 $$"), None).unwrap();
        assert_eq!(output.status, ProcessStatus::Terminated);
    }

    #[test]
    fn missing_executable() {
        let result = run_process(&mut Command::new("darkrust-this-program-does-not-exist"), None);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
