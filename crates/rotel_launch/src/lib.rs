//! Rotel Launch
//!
//! Bridges a Fluent Bit (FireLens) configuration to Rotel's environment
//! variable configuration, then runs Rotel.
//!
//! # Overview
//!
//! The launcher:
//! - Parses the Fluent Bit `forward` input and `record_modifier` filter
//! - Sets the matching `ROTEL_*` environment variables
//! - Downloads log processors listed in `S3_OTLP_LOG_PROCESSORS`
//! - Runs `rotel start`, forwarding shutdown signals
//!
//! # Example
//!
//! ```text
//! [INPUT]
//!     Name   forward
//!     Listen 127.0.0.1
//!     Port   24224
//!
//! [FILTER]
//!     Name   record_modifier
//!     Match  *
//!     Record ecs_cluster my-cluster
//! ```
//!
//! yields `ROTEL_FLUENT_RECEIVER_ENDPOINT=127.0.0.1:24224`,
//! `ROTEL_OTEL_RESOURCE_ATTRIBUTES=ecs_cluster=my-cluster` and
//! `ROTEL_RECEIVERS=fluent,otlp`.

pub mod cli;
pub mod config;
pub mod environment;
pub mod runtime;
pub mod staging;

pub use cli::LaunchArgs;
pub use config::{ConfigError, FluentBitConfig};
pub use environment::{synthesize, EnvError, EnvStore, MemoryEnv, Synthesis};
pub use runtime::{
    exit_code, LaunchError, LaunchPlan, Launcher, LauncherConfig, ManagedProcess, ProcessConfig,
    ProcessError,
};
pub use staging::{
    MemoryObjectStore, ObjectStore, ObjectStoreError, ReferenceError, ResourceStager,
    S3Reference, StageError,
};
