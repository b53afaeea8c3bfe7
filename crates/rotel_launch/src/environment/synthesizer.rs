//! Translate a parsed Fluent Bit configuration into Rotel settings

use crate::config::FluentBitConfig;
use crate::environment::store::{EnvError, EnvStore};
use crate::environment::vars;

/// Printed when no exporter is configured
pub const EXPORTER_FALLBACK_WARNING: &str =
    "Rotel exporters have not been configured, defaulting to blackhole";

/// Outcome of [`synthesize`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// `ROTEL_EXPORTER` was set to the blackhole exporter
    pub exporter_fallback: bool,
}

/// Write the Rotel environment derived from `config` into `env`.
///
/// Existing resource attributes are appended after the parsed ones so they
/// keep precedence in Rotel. When no exporter is configured at all, the
/// blackhole exporter is selected so Rotel does not exit on startup; the
/// caller is expected to surface [`EXPORTER_FALLBACK_WARNING`] in that case.
pub fn synthesize<E: EnvStore + ?Sized>(
    config: &FluentBitConfig,
    env: &mut E,
) -> Result<Synthesis, EnvError> {
    if !config.receiver_endpoint.is_empty() {
        env.set(vars::FLUENT_RECEIVER_ENDPOINT, &config.receiver_endpoint)?;
    }

    if !config.receiver_socket.is_empty() {
        env.set(vars::FLUENT_RECEIVER_SOCKET, &config.receiver_socket)?;
    }

    if !config.resource_attributes.is_empty() {
        let value = match env.get_non_empty(vars::RESOURCE_ATTRIBUTES) {
            Some(existing) => format!("{},{}", config.resource_attributes, existing),
            None => config.resource_attributes.clone(),
        };
        env.set(vars::RESOURCE_ATTRIBUTES, &value)?;
    }

    env.set(vars::RECEIVERS, vars::RECEIVERS_VALUE)?;

    let exporter_configured = env.get_non_empty(vars::EXPORTER).is_some()
        || env.get_non_empty(vars::EXPORTERS).is_some()
        || env.get_non_empty(vars::OTLP_EXPORTER_ENDPOINT).is_some();
    if !exporter_configured {
        env.set(vars::EXPORTER, vars::FALLBACK_EXPORTER)?;
    }

    Ok(Synthesis {
        exporter_fallback: !exporter_configured,
    })
}
