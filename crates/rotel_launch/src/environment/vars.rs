//! Environment variable names read or written by the launcher

/// Fluent receiver TCP endpoint (`host:port`)
pub const FLUENT_RECEIVER_ENDPOINT: &str = "ROTEL_FLUENT_RECEIVER_ENDPOINT";
/// Fluent receiver unix socket path
pub const FLUENT_RECEIVER_SOCKET: &str = "ROTEL_FLUENT_RECEIVER_SOCKET";
/// OpenTelemetry resource attributes (`k=v,k=v`)
pub const RESOURCE_ATTRIBUTES: &str = "ROTEL_OTEL_RESOURCE_ATTRIBUTES";
/// Enabled receivers list
pub const RECEIVERS: &str = "ROTEL_RECEIVERS";
/// Single exporter selection
pub const EXPORTER: &str = "ROTEL_EXPORTER";
/// Multiple exporter selection
pub const EXPORTERS: &str = "ROTEL_EXPORTERS";
/// OTLP exporter endpoint
pub const OTLP_EXPORTER_ENDPOINT: &str = "ROTEL_OTLP_EXPORTER_ENDPOINT";
/// Local log processor files handed to the OTLP pipeline
pub const OTLP_WITH_LOGS_PROCESSOR: &str = "ROTEL_OTLP_WITH_LOGS_PROCESSOR";
/// Comma-separated `s3://bucket/key` references to stage
pub const S3_OTLP_LOG_PROCESSORS: &str = "S3_OTLP_LOG_PROCESSORS";

/// Receivers Rotel runs when launched from a Fluent Bit configuration
pub const RECEIVERS_VALUE: &str = "fluent,otlp";
/// Exporter used when nothing else is configured
pub const FALLBACK_EXPORTER: &str = "blackhole";
