//! Collector process handoff

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::watch;

/// Configuration for spawning the target process
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Process name (for logging)
    pub name: String,
    /// Absolute executable path
    pub executable: PathBuf,
    /// Command line arguments
    pub args: Vec<String>,
    /// Variables added to the inherited environment
    pub env: IndexMap<String, String>,
    /// Grace period between SIGTERM and SIGKILL on shutdown
    pub shutdown_timeout: Duration,
}

/// Resolve `path` against the working directory and check that it exists
pub fn resolve_executable(path: &Path) -> Result<PathBuf, ProcessError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| ProcessError::Resolve {
                path: path.display().to_string(),
                source: e,
            })?
            .join(path)
    };

    std::fs::metadata(&absolute).map_err(|e| ProcessError::NotFound {
        path: absolute.display().to_string(),
        source: e,
    })?;

    Ok(absolute)
}

/// A child process sharing this process's stdio
pub struct ManagedProcess {
    config: ProcessConfig,
    child: Child,
    pid: Option<u32>,
}

impl ManagedProcess {
    /// Spawn the process with inherited stdin, stdout and stderr. The child
    /// sees this process's environment overlaid with `config.env`.
    pub fn start(config: ProcessConfig) -> Result<Self, ProcessError> {
        log::info!(
            "[{}] Starting: {} {}",
            config.name,
            config.executable.display(),
            config.args.join(" ")
        );

        let child = Command::new(&config.executable)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed {
                path: config.executable.display().to_string(),
                source: e,
            })?;

        let pid = child.id();
        log::debug!("[{}] Process started with PID: {:?}", config.name, pid);

        Ok(Self { config, child, pid })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the process to exit.
    ///
    /// A shutdown notification forwards SIGTERM to the child and waits up to
    /// the shutdown timeout before killing it.
    pub async fn wait(
        mut self,
        mut shutdown_rx: watch::Receiver<()>,
    ) -> Result<ExitStatus, ProcessError> {
        tokio::select! {
            status = self.child.wait() => {
                return self.exited(status);
            }
            _ = shutdown_requested(&mut shutdown_rx) => {}
        }

        log::info!("[{}] Forwarding shutdown to process", self.config.name);
        self.terminate();

        match tokio::time::timeout(self.config.shutdown_timeout, self.child.wait()).await {
            Ok(status) => self.exited(status),
            Err(_) => {
                log::warn!(
                    "[{}] Process did not exit gracefully, forcing kill",
                    self.config.name
                );
                let _ = self.child.start_kill();
                let status = self.child.wait().await;
                self.exited(status)
            }
        }
    }

    fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.pid {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }
    }

    fn exited(&self, status: std::io::Result<ExitStatus>) -> Result<ExitStatus, ProcessError> {
        let status = status.map_err(|e| ProcessError::WaitFailed {
            name: self.config.name.clone(),
            source: e,
        })?;
        log::info!("[{}] Process exited with code: {:?}", self.config.name, status.code());
        Ok(status)
    }
}

/// Resolves when a shutdown is signalled; never if the sender is gone
pub(crate) async fn shutdown_requested(rx: &mut watch::Receiver<()>) {
    if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Exit code to report for a finished child: its own code, or 128 + signal
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Errors that can occur with the target process
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to resolve path '{path}': {source}")]
    Resolve {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("executable not found at {path}: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{path}': {source}")]
    SpawnFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for process '{name}': {source}")]
    WaitFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
