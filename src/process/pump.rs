//! Process spawning with a drained, merged output stream.
//!
//! [`ProcessPump`] spawns a program with its stderr merged into stdout and
//! attaches a line-mode [`StreamReader`] to the combined stream, so the
//! child never stalls on a full pipe. The caller gets the process back
//! right away and owns its lifetime; the reader ends when the output does.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use super::error::LaunchError;
use crate::reader::{Listener, ReadMode, ReaderHandle, StreamReader};

#[cfg(unix)]
type MergedOutput = tokio::net::unix::pipe::Receiver;

#[cfg(not(unix))]
type MergedOutput = tokio::io::DuplexStream;

/// Builder for a process whose merged output is pumped to a listener.
#[derive(Debug, Clone, Default)]
pub struct ProcessPump {
    argv: Vec<OsString>,
    working_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl ProcessPump {
    /// Create a pump for `argv`: the program followed by its arguments.
    /// No shell is involved.
    #[must_use]
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the working directory for the process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for the process.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    #[must_use]
    pub fn program(&self) -> Option<&OsStr> {
        self.argv.first().map(OsString::as_os_str)
    }

    /// The argument vector rendered as a shell-quoted string, for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.argv
            .iter()
            .map(|arg| shell_escape::escape(arg.to_string_lossy()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Launch the process, returning `None` if it could not be spawned.
    ///
    /// The listener is never started when the spawn fails.
    pub fn launch<L: Listener>(&self, listener: L) -> Option<PumpedProcess> {
        match self.try_launch(listener) {
            Ok(process) => Some(process),
            Err(e) => {
                tracing::warn!(command = %self.command_line(), error = %e, "Launch failed");
                None
            }
        }
    }

    /// Launch the process and start draining its merged output.
    ///
    /// Must be called from within a tokio runtime. Returns as soon as the
    /// process is spawned; neither the process nor the reader is awaited.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the argument vector is empty or the process
    /// fails to spawn.
    pub fn try_launch<L: Listener>(&self, listener: L) -> Result<PumpedProcess, LaunchError> {
        let (program, args) = self.argv.split_first().ok_or(LaunchError::EmptyCommand)?;
        let program_name = program.to_string_lossy().into_owned();

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let (child, output) =
            spawn_merged(cmd).map_err(|e| LaunchError::from_io(e, &program_name))?;

        let reader = StreamReader::new(output, Some(listener), ReadMode::Line).start();

        tracing::info!(
            command = %self.command_line(),
            pid = ?child.id(),
            reader_id = %reader.id(),
            "Launched process"
        );

        Ok(PumpedProcess {
            child,
            program: program_name,
            reader: Some(reader),
        })
    }
}

/// Launch `argv` and pump its merged output to `listener`.
///
/// Returns `None` on any spawn failure.
pub fn launch<I, S, L>(argv: I, listener: L) -> Option<PumpedProcess>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    L: Listener,
{
    ProcessPump::new(argv).launch(listener)
}

/// Like [`launch`], but reports why the spawn failed.
///
/// # Errors
///
/// Returns `LaunchError` if the process fails to spawn.
pub fn try_launch<I, S, L>(argv: I, listener: L) -> Result<PumpedProcess, LaunchError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    L: Listener,
{
    ProcessPump::new(argv).try_launch(listener)
}

/// Spawn `cmd` with stdout and stderr sharing one pipe.
#[cfg(unix)]
fn spawn_merged(mut cmd: Command) -> io::Result<(Child, MergedOutput)> {
    use std::os::fd::OwnedFd;

    let (read_end, write_end) = io::pipe()?;
    let stderr_end = write_end.try_clone()?;
    let output = tokio::net::unix::pipe::Receiver::from_owned_fd(OwnedFd::from(read_end))?;

    cmd.stdout(Stdio::from(write_end))
        .stderr(Stdio::from(stderr_end));
    let child = cmd.spawn()?;
    // The parent's write ends must close, or the reader never sees EOF.
    drop(cmd);

    Ok((child, output))
}

/// Spawn `cmd` with stdout and stderr forwarded into one in-memory stream.
#[cfg(not(unix))]
fn spawn_merged(mut cmd: Command) -> io::Result<(Child, MergedOutput)> {
    use std::sync::Arc;
    use tokio::sync::Mutex;

    use crate::reader::READ_BUFFER_SIZE;

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn()?;

    let (output, input) = tokio::io::duplex(READ_BUFFER_SIZE);
    let input = Arc::new(Mutex::new(input));
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward(stdout, Arc::clone(&input)));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward(stderr, input));
    }

    Ok((child, output))
}

#[cfg(not(unix))]
async fn forward<R>(mut from: R, to: std::sync::Arc<tokio::sync::Mutex<tokio::io::DuplexStream>>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut buf = [0u8; crate::reader::READ_BUFFER_SIZE];
    loop {
        match from.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if to.lock().await.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// A process launched by [`ProcessPump`].
///
/// Owned by the caller, who decides when to wait for or terminate it.
#[derive(Debug)]
pub struct PumpedProcess {
    child: Child,
    program: String,
    reader: Option<ReaderHandle>,
}

impl PumpedProcess {
    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The reader draining the merged output, unless already taken.
    #[must_use]
    pub fn reader(&self) -> Option<&ReaderHandle> {
        self.reader.as_ref()
    }

    /// Take ownership of the reader handle, e.g. to join it.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_reader(&mut self) -> Option<ReaderHandle> {
        self.reader.take()
    }

    /// Exit status of the child if it has already exited.
    ///
    /// The reader may still be delivering buffered lines after this returns
    /// `Some`; join it for the complete output.
    ///
    /// # Errors
    ///
    /// Propagates the OS error from polling the child.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Wait for the child to exit. The output reader is left running.
    ///
    /// # Errors
    ///
    /// Propagates the OS error from waiting on the child.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Kill the child and reap it.
    ///
    /// Closing the last write end of the merged pipe ends the reader with
    /// end-of-stream.
    ///
    /// # Errors
    ///
    /// Propagates the OS error from signalling the child.
    pub async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }

    /// Ask the child to stop, then kill it if it outlives `timeout`.
    ///
    /// Unix sends SIGTERM first. Other targets kill straight away.
    ///
    /// # Errors
    ///
    /// Propagates the OS error from waiting on or killing the child.
    pub async fn graceful_terminate(&mut self, timeout: Duration) -> io::Result<()> {
        let Some(pid) = self.id() else {
            return Ok(());
        };
        if !request_stop(pid) {
            return self.child.kill().await;
        }

        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(status) => status.map(drop),
            Err(_) => {
                tracing::debug!(pid, program = %self.program, "Child ignored SIGTERM, killing");
                self.child.kill().await
            }
        }
    }
}

/// Send SIGTERM. Returns `false` when the caller should kill outright.
#[cfg(unix)]
fn request_stop(pid: u32) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(pid, error = %e, "SIGTERM failed");
            false
        }
    }
}

#[cfg(not(unix))]
fn request_stop(_pid: u32) -> bool {
    false
}
