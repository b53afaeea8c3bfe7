//! Fluent Bit classic-format configuration scanning
//!
//! Only the directives that map onto Rotel receiver settings are extracted:
//!
//! ```text
//! [INPUT]
//!     Name      forward
//!     Listen    127.0.0.1
//!     Port      24224
//!     unix_path /var/run/fluent.sock
//!
//! [FILTER]
//!     Name   record_modifier
//!     Record ecs_cluster my-cluster
//! ```
//!
//! Everything else is scanned over and ignored.

use std::path::Path;

const INPUT_FORWARD: &str = "forward";
const FILTER_RECORD_MODIFIER: &str = "record_modifier";

/// Receiver settings extracted from a Fluent Bit configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FluentBitConfig {
    /// `<listen>:<port>` of the last complete forward input
    pub receiver_endpoint: String,
    /// `unix_path` of the last forward input declaring one
    pub receiver_socket: String,
    /// Comma-joined `key=value` pairs from record_modifier filters
    pub resource_attributes: String,
}

/// Section kind taken from a `[LABEL]` header
#[derive(Debug, Clone, PartialEq, Eq)]
enum SectionKind {
    Input,
    Filter,
    Output,
    Other,
}

impl SectionKind {
    fn from_label(label: &str) -> Self {
        match label.to_uppercase().as_str() {
            "INPUT" => SectionKind::Input,
            "FILTER" => SectionKind::Filter,
            "OUTPUT" => SectionKind::Output,
            _ => SectionKind::Other,
        }
    }
}

/// The currently open section. Listen/port stay buffered here until the
/// section is closed.
#[derive(Debug)]
struct Section {
    kind: SectionKind,
    name: String,
    listen: String,
    port: String,
}

impl Section {
    fn open(kind: SectionKind) -> Self {
        Self {
            kind,
            name: String::new(),
            listen: String::new(),
            port: String::new(),
        }
    }

    fn is(&self, kind: &SectionKind, name: &str) -> bool {
        &self.kind == kind && self.name == name
    }
}

/// Accumulates parser output across sections
#[derive(Debug, Default)]
struct Scanner {
    config: FluentBitConfig,
    section: Option<Section>,
    attributes: Vec<String>,
}

impl Scanner {
    fn line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        if let Some(label) = section_label(line) {
            self.close_section();
            self.section = Some(Section::open(SectionKind::from_label(label)));
            return;
        }

        let Some((key, value)) = split_directive(line) else {
            return;
        };
        let key = key.to_lowercase();

        // Directives before the first header have nowhere to go
        let Some(section) = self.section.as_mut() else {
            return;
        };

        if key == "name" {
            section.name = value.to_string();
            return;
        }

        if section.is(&SectionKind::Input, INPUT_FORWARD) {
            match key.as_str() {
                "listen" => section.listen = value.to_string(),
                "port" => section.port = value.to_string(),
                "unix_path" => self.config.receiver_socket = value.to_string(),
                _ => {}
            }
        } else if section.is(&SectionKind::Filter, FILTER_RECORD_MODIFIER) && key == "record" {
            if let Some((record_key, record_value)) = split_directive(value) {
                self.attributes
                    .push(format!("{}={}", record_key, record_value));
            }
        }
    }

    fn close_section(&mut self) {
        if let Some(section) = self.section.take() {
            if section.is(&SectionKind::Input, INPUT_FORWARD)
                && !section.listen.is_empty()
                && !section.port.is_empty()
            {
                self.config.receiver_endpoint = format!("{}:{}", section.listen, section.port);
            }
        }
    }

    fn finish(mut self) -> FluentBitConfig {
        self.close_section();
        self.config.resource_attributes = self.attributes.join(",");
        self.config
    }
}

/// Returns the trimmed label of a `[label]` header line
fn section_label(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Split at the first whitespace run into a key and a non-empty trimmed value
fn split_directive(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(char::is_whitespace)?;
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

impl FluentBitConfig {
    /// Load and scan a Fluent Bit configuration file.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Scan configuration text. Never fails: unknown sections and directives
    /// are skipped.
    pub fn parse(content: &str) -> Self {
        let mut scanner = Scanner::default();
        for line in content.lines() {
            scanner.line(line);
        }
        scanner.finish()
    }
}

/// Errors that can occur when loading a Fluent Bit configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
