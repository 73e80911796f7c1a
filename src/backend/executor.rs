//! Executor: child-process supervision
//!
//! Runs a program with piped output, interleaves stdout and stderr line by line in arrival order, and enforces a
//! wall-clock timeout. On timeout the child is killed and no exit code is recorded. The same routine runs the
//! compiler and the compiled drivers.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Errors that prevent a process from being run or observed at all.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to capture output of `{program}`: {source}")]
    Capture {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// What happened when a program ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Combined stdout and stderr, one line per line, in arrival order.
    pub output: String,
    /// `None` on timeout or signal death.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub timed_out: bool,
}

impl ExecutionRecord {
    /// Exited by itself with status 0.
    pub fn is_clean_exit(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Exit code to report for an abnormal termination.
    pub fn crash_code(&self) -> Option<i32> {
        if self.timed_out { None } else { self.exit_code }
    }
}

/// A process to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Render the command line for logs and diagnostics.
    pub fn display(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run `spec` to completion or timeout.
#[tracing::instrument(skip_all, fields(program = %spec.program.display(), timeout_s = spec.timeout.as_secs()))]
pub async fn run_process(spec: &ProcessSpec) -> Result<ExecutionRecord, ProcessError> {
    let program = spec.program.to_string_lossy().into_owned();
    tracing::debug!(command = %spec.display(), "spawning");

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // gfortran buffers preconnected units when writing to a pipe; output before a crash would be lost.
        .env("GFORTRAN_UNBUFFERED_PRECONNECTED", "y")
        .kill_on_drop(true);
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    let capture_error = |what: &str| ProcessError::Capture {
        program: program.clone(),
        source: io::Error::other(format!("{what} was not piped")),
    };
    let mut stdout = BufReader::new(child.stdout.take().ok_or_else(|| capture_error("stdout"))?);
    let mut stderr = BufReader::new(child.stderr.take().ok_or_else(|| capture_error("stderr"))?);

    let mut lines: Vec<String> = Vec::new();
    let outcome = tokio::time::timeout(spec.timeout, async {
        collect_lines(&mut stdout, &mut stderr, &mut lines).await?;
        child.wait().await
    })
    .await;

    let (exit_code, timed_out) = match outcome {
        Ok(Ok(status)) => (status.code(), false),
        Ok(Err(source)) => return Err(ProcessError::Capture { program, source }),
        Err(_elapsed) => {
            tracing::warn!(program = %program, timeout_s = spec.timeout.as_secs(), "timed out; killing");
            let _ = child.start_kill();
            let _ = child.wait().await;
            (None, true)
        }
    };

    let record = ExecutionRecord {
        output: lines.join("\n"),
        exit_code,
        duration: started.elapsed(),
        timed_out,
    };
    tracing::debug!(exit_code = ?record.exit_code, timed_out, elapsed_ms = record.duration.as_millis() as u64, "finished");
    Ok(record)
}

/// Drain both streams, keeping lines in the order they arrive.
async fn collect_lines<A, B>(stdout: &mut A, stderr: &mut B, lines: &mut Vec<String>) -> io::Result<()>
where
    A: AsyncBufRead + Unpin,
    B: AsyncBufRead + Unpin,
{
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            line = next_line(stdout, &mut out_buf), if out_open => match line? {
                Some(line) => lines.push(line),
                None => out_open = false,
            },
            line = next_line(stderr, &mut err_buf), if err_open => match line? {
                Some(line) => lines.push(line),
                None => err_open = false,
            },
        }
    }
    Ok(())
}

/// Read one line, lossily decoded. `buf` must persist across calls: partial reads from a cancelled call stay in
/// it and are completed by the next one.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let read = reader.read_until(b'\n', buf).await?;
    if read == 0 && buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf).trim_end_matches(['\n', '\r']).to_string();
    buf.clear();
    Ok(Some(line))
}
