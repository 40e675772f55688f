//! Source-control probe: ask git for the nearest tag.
//!
//! The probe runs `git describe --tags` (all tags, including lightweight
//! ones) inside the project root and reads one line from stdout. It never
//! fails the build: every way the probe can go wrong is folded into
//! [`DescribeOutcome::Unavailable`] with a reason that says which way.
//!
//! The subprocess is waited on with a deadline. A hung `git` (credential
//! prompt, slow network filesystem) is killed when the deadline passes.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default deadline for the describe subprocess.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of probing source control for a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescribeOutcome {
    /// A non-empty, trimmed descriptor such as `v1.2.3-5-gabc1234`.
    Found(String),
    Unavailable(Unavailable),
}

impl DescribeOutcome {
    pub fn descriptor(&self) -> Option<&str> {
        match self {
            DescribeOutcome::Found(d) => Some(d),
            DescribeOutcome::Unavailable(_) => None,
        }
    }
}

/// Why no descriptor was obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    #[error("no source-control metadata directory")]
    NoMetadataDir,
    #[error("`{program}` not found")]
    ToolNotFound { program: String },
    #[error("could not run `{program}`: {message}")]
    Spawn { program: String, message: String },
    #[error("`{program}` exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("`{program}` output is not valid UTF-8")]
    Decode { program: String },
    #[error("`{program}` printed nothing")]
    Empty { program: String },
    #[error("`{program}` did not finish within {}s", .timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },
}

/// Anything that can produce a descriptor for a project root.
///
/// [`GitDescribe`] is the real implementation; tests substitute a scripted one.
pub trait Describe {
    fn describe(&self, root: &Path) -> DescribeOutcome;
}

/// Runs an external describe command (by default `git describe --tags`).
#[derive(Debug, Clone)]
pub struct GitDescribe {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for GitDescribe {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            args: vec!["describe".to_string(), "--tags".to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Describe for GitDescribe {
    fn describe(&self, root: &Path) -> DescribeOutcome {
        let program = self.program.clone();
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return DescribeOutcome::Unavailable(Unavailable::ToolNotFound { program });
            }
            Err(e) => {
                return DescribeOutcome::Unavailable(Unavailable::Spawn {
                    program,
                    message: e.to_string(),
                });
            }
        };

        // Drain both pipes concurrently so a chatty child can't block on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let deadline = Instant::now() + self.timeout;

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                child.kill().ok();
                child.wait().ok();
                return timed_out(program, self.timeout);
            }
            Err(e) => {
                child.kill().ok();
                child.wait().ok();
                return DescribeOutcome::Unavailable(Unavailable::Spawn {
                    program,
                    message: e.to_string(),
                });
            }
        };

        // A background grandchild can hold the pipes open after the child exits.
        let (Some(stdout), Some(stderr)) = (collect(&stdout, deadline), collect(&stderr, deadline))
        else {
            return timed_out(program, self.timeout);
        };
        classify(program, status, stdout, &stderr)
    }
}

fn timed_out(program: String, timeout: Duration) -> DescribeOutcome {
    DescribeOutcome::Unavailable(Unavailable::TimedOut { program, timeout })
}

/// Map a finished process to an outcome.
fn classify(program: String, status: ExitStatus, stdout: Vec<u8>, stderr: &[u8]) -> DescribeOutcome {
    if !status.success() {
        return DescribeOutcome::Unavailable(Unavailable::NonZeroExit {
            program,
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        });
    }
    let text = match String::from_utf8(stdout) {
        Ok(t) => t,
        Err(_) => return DescribeOutcome::Unavailable(Unavailable::Decode { program }),
    };
    let descriptor = text.trim();
    if descriptor.is_empty() {
        DescribeOutcome::Unavailable(Unavailable::Empty { program })
    } else {
        DescribeOutcome::Found(descriptor.to_string())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        tx.send(buf).ok();
    });
    rx
}

/// Wait for a drained pipe until `deadline`. `None` means it is still open.
fn collect(rx: &Receiver<Vec<u8>>, deadline: Instant) -> Option<Vec<u8>> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Poll the child until it exits or `deadline` passes (`Ok(None)`).
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(program: &str, args: &[&str]) -> GitDescribe {
        GitDescribe {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn default_runs_git_describe_tags() {
        let g = GitDescribe::default();
        assert_eq!(g.program, "git");
        assert_eq!(g.args, vec!["describe", "--tags"]);
        assert_eq!(g.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn missing_program_is_tool_not_found() {
        let tmp = TempDir::new().unwrap();
        let outcome = command("tagver-no-such-program-xyz", &[]).describe(tmp.path());
        assert_eq!(
            outcome,
            DescribeOutcome::Unavailable(Unavailable::ToolNotFound {
                program: "tagver-no-such-program-xyz".into()
            })
        );
    }

    #[test]
    fn descriptor_helper() {
        assert_eq!(DescribeOutcome::Found("v1".into()).descriptor(), Some("v1"));
        assert_eq!(
            DescribeOutcome::Unavailable(Unavailable::NoMetadataDir).descriptor(),
            None
        );
    }

    #[test]
    fn unavailable_messages_are_distinct() {
        let program = "git".to_string();
        let reasons = [
            Unavailable::NoMetadataDir.to_string(),
            Unavailable::ToolNotFound { program: program.clone() }.to_string(),
            Unavailable::Decode { program: program.clone() }.to_string(),
            Unavailable::Empty { program: program.clone() }.to_string(),
            Unavailable::TimedOut {
                program,
                timeout: Duration::from_secs(10),
            }
            .to_string(),
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in &reasons[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(reasons[4], "`git` did not finish within 10s");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        #[test]
        fn stdout_is_trimmed() {
            let tmp = TempDir::new().unwrap();
            let outcome = command("sh", &["-c", "printf '  v1.2.3-5-gabc1234\\n\\n'"])
                .describe(tmp.path());
            assert_eq!(outcome, DescribeOutcome::Found("v1.2.3-5-gabc1234".into()));
        }

        #[test]
        fn runs_in_project_root() {
            let tmp = TempDir::new().unwrap();
            std::fs::write(tmp.path().join("marker"), "v9.9.9").unwrap();
            let outcome = command("sh", &["-c", "cat marker"]).describe(tmp.path());
            assert_eq!(outcome, DescribeOutcome::Found("v9.9.9".into()));
        }

        #[test]
        fn non_zero_exit_captures_stderr() {
            let tmp = TempDir::new().unwrap();
            let outcome = command(
                "sh",
                &["-c", "echo 'fatal: No names found' >&2; exit 128"],
            )
            .describe(tmp.path());
            match outcome {
                DescribeOutcome::Unavailable(Unavailable::NonZeroExit { stderr, .. }) => {
                    assert_eq!(stderr, "fatal: No names found");
                }
                other => panic!("expected NonZeroExit, got {other:?}"),
            }
        }

        #[test]
        fn blank_output_is_empty() {
            let tmp = TempDir::new().unwrap();
            let outcome = command("sh", &["-c", "echo '   '"]).describe(tmp.path());
            assert!(matches!(
                outcome,
                DescribeOutcome::Unavailable(Unavailable::Empty { .. })
            ));
        }

        #[test]
        fn invalid_utf8_is_decode_error() {
            let tmp = TempDir::new().unwrap();
            let outcome = command("sh", &["-c", "printf '\\377\\376'"]).describe(tmp.path());
            assert!(matches!(
                outcome,
                DescribeOutcome::Unavailable(Unavailable::Decode { .. })
            ));
        }

        #[test]
        fn slow_child_times_out() {
            let tmp = TempDir::new().unwrap();
            let mut slow = command("sh", &["-c", "exec sleep 5"]);
            slow.timeout = Duration::from_millis(100);
            let start = Instant::now();
            let outcome = slow.describe(tmp.path());
            assert!(matches!(
                outcome,
                DescribeOutcome::Unavailable(Unavailable::TimedOut { .. })
            ));
            assert!(start.elapsed() < Duration::from_secs(4));
        }

        #[test]
        fn grandchild_holding_stdout_times_out() {
            let tmp = TempDir::new().unwrap();
            // The shell exits at once, but the backgrounded sleep keeps stdout open.
            let mut lingering = command("sh", &["-c", "sleep 5 & echo v1.0.0"]);
            lingering.timeout = Duration::from_millis(200);
            let start = Instant::now();
            let outcome = lingering.describe(tmp.path());
            assert!(matches!(
                outcome,
                DescribeOutcome::Unavailable(Unavailable::TimedOut { .. })
            ));
            assert!(start.elapsed() < Duration::from_secs(4));
        }
    }
}
