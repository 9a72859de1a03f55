use serde::Serialize;

use crate::error::Result;

#[derive(Clone, Copy, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text format (OpenSSL-like)
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Serializes `value` as JSON or YAML. Text is handled by the caller.
pub(crate) fn to_structured<T: Serialize>(
    value: &T,
    format: OutputFormat,
) -> Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
        OutputFormat::Yaml => Ok(Some(serde_yml::to_string(value)?)),
    }
}
