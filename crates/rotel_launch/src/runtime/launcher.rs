//! Launch sequence: parse, synthesize, stage, hand off

use crate::config::{ConfigError, FluentBitConfig};
use crate::environment::{
    synthesize, vars, EnvError, EnvStore, MemoryEnv, EXPORTER_FALLBACK_WARNING,
};
use crate::runtime::process::{
    resolve_executable, shutdown_requested, ManagedProcess, ProcessConfig, ProcessError,
};
use crate::staging::s3::S3Client;
use crate::staging::{
    ObjectStore, ObjectStoreError, ReferenceError, ResourceStager, StageError, StagedPath,
    DEFAULT_STAGING_DIR,
};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::sync::watch;

/// Launcher configuration
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Fluent Bit configuration file
    pub fluent_bit_config: PathBuf,
    /// Rotel executable
    pub rotel_path: PathBuf,
    /// Arguments passed to Rotel
    pub rotel_args: Vec<String>,
    /// Directory log processors are downloaded into
    pub staging_dir: PathBuf,
    /// Grace period for Rotel to exit after a forwarded shutdown
    pub shutdown_timeout: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            fluent_bit_config: PathBuf::new(),
            rotel_path: PathBuf::new(),
            rotel_args: vec!["start".to_string()],
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl LauncherConfig {
    pub fn new(fluent_bit_config: impl Into<PathBuf>, rotel_path: impl Into<PathBuf>) -> Self {
        Self {
            fluent_bit_config: fluent_bit_config.into(),
            rotel_path: rotel_path.into(),
            ..Default::default()
        }
    }
}

/// Launch plan for dry-run mode
#[derive(Debug)]
pub struct LaunchPlan {
    /// Rotel executable as given
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Variables the launcher would set, in write order
    pub env: IndexMap<String, String>,
    /// Log processors that would be downloaded
    pub staging: Vec<StagedPath>,
}

/// Runs the launch sequence
#[derive(Debug, Clone)]
pub struct Launcher {
    config: LauncherConfig,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Parse the Fluent Bit config, write the Rotel environment into `env` and
    /// stage the log processors listed in `S3_OTLP_LOG_PROCESSORS`.
    ///
    /// `connect` is only called when there is something to download.
    pub async fn prepare<E, S, F>(&self, env: &mut E, connect: F) -> Result<(), LaunchError>
    where
        E: EnvStore + ?Sized,
        S: ObjectStore,
        F: FnOnce() -> Result<S, ObjectStoreError>,
    {
        log::info!(
            "Parsing Fluent Bit config: {}",
            self.config.fluent_bit_config.display()
        );
        let fluent_bit = FluentBitConfig::from_file(&self.config.fluent_bit_config)?;
        log::debug!("Parsed Fluent Bit config: {:?}", fluent_bit);

        let synthesis = synthesize(&fluent_bit, env)?;
        if synthesis.exporter_fallback {
            // Shown at every log level
            println!("WARN: {}", EXPORTER_FALLBACK_WARNING);
        }

        let references = env.get(vars::S3_OTLP_LOG_PROCESSORS).unwrap_or_default();
        let stager = ResourceStager::new(&self.config.staging_dir);
        let staged = stager.stage(&references, connect).await?;

        if !staged.is_empty() {
            let paths = staged
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            env.set(vars::OTLP_WITH_LOGS_PROCESSOR, &paths)?;
            log::info!("Set {}={}", vars::OTLP_WITH_LOGS_PROCESSOR, paths);
        }

        Ok(())
    }

    /// Launch Rotel against the current process environment and S3.
    ///
    /// The process environment is only read; Rotel receives the synthesized
    /// variables on top of it.
    pub async fn run(&self, shutdown_rx: watch::Receiver<()>) -> Result<ExitStatus, LaunchError> {
        let ambient = MemoryEnv::from_process();
        self.launch(
            ambient.clone(),
            || S3Client::from_env_store(&ambient),
            shutdown_rx,
        )
        .await
    }

    /// Prepare `env`, then run Rotel with every assignment made to it until
    /// Rotel exits.
    ///
    /// A notification on `shutdown_rx` before Rotel is spawned aborts with
    /// [`LaunchError::Interrupted`]. Afterwards it is forwarded to Rotel.
    pub async fn launch<S, F>(
        &self,
        mut env: MemoryEnv,
        connect: F,
        mut shutdown_rx: watch::Receiver<()>,
    ) -> Result<ExitStatus, LaunchError>
    where
        S: ObjectStore,
        F: FnOnce() -> Result<S, ObjectStoreError>,
    {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown_rx) => {
                log::info!("Shutdown requested before rotel started");
                return Err(LaunchError::Interrupted);
            }
            prepared = self.prepare(&mut env, connect) => prepared?,
        }

        let executable = resolve_executable(&self.config.rotel_path)?;
        if shutdown_rx.has_changed().unwrap_or(false) {
            return Err(LaunchError::Interrupted);
        }

        let process = ManagedProcess::start(ProcessConfig {
            name: "rotel".to_string(),
            executable,
            args: self.config.rotel_args.clone(),
            env: env.assignments().clone(),
            shutdown_timeout: self.config.shutdown_timeout,
        })?;

        Ok(process.wait(shutdown_rx).await?)
    }

    /// Work out what [`Launcher::run`] would do without writing, downloading
    /// or spawning anything.
    pub fn plan(&self) -> Result<LaunchPlan, LaunchError> {
        let fluent_bit = FluentBitConfig::from_file(&self.config.fluent_bit_config)?;

        let mut env = MemoryEnv::from_process();
        synthesize(&fluent_bit, &mut env)?;

        let references = env.get(vars::S3_OTLP_LOG_PROCESSORS).unwrap_or_default();
        let staging = ResourceStager::new(&self.config.staging_dir).plan(&references)?;

        if !staging.is_empty() {
            let paths = staging
                .iter()
                .map(|s| s.destination.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            env.set(vars::OTLP_WITH_LOGS_PROCESSOR, &paths)?;
        }

        Ok(LaunchPlan {
            executable: self.config.rotel_path.clone(),
            args: self.config.rotel_args.clone(),
            env: env.assignments().clone(),
            staging,
        })
    }
}

/// Errors that can occur during launch
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to parse Fluent Bit config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to set environment variables: {0}")]
    Environment(#[from] EnvError),

    #[error("failed to download S3 log processors: {0}")]
    Staging(#[from] StageError),

    #[error("invalid S3 log processor list: {0}")]
    Plan(#[from] ReferenceError),

    #[error("failed to execute rotel: {0}")]
    Process(#[from] ProcessError),

    #[error("shutdown requested before rotel started")]
    Interrupted,
}

/// Display the launch plan in a human-readable format
impl std::fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Launch Plan")?;
        writeln!(f, "===========")?;
        writeln!(f)?;
        writeln!(
            f,
            "Command: {} {}",
            self.executable.display(),
            self.args.join(" ")
        )?;

        if !self.env.is_empty() {
            writeln!(f)?;
            writeln!(f, "Environment:")?;
            for (key, value) in &self.env {
                writeln!(f, "  {}={}", key, value)?;
            }
        }

        if !self.staging.is_empty() {
            writeln!(f)?;
            writeln!(f, "Log processors:")?;
            for staged in &self.staging {
                writeln!(
                    f,
                    "  {}. {} -> {}",
                    staged.position,
                    staged.reference,
                    staged.destination.display()
                )?;
            }
        }

        Ok(())
    }
}
