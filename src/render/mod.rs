//! Playbook output rendering.

use crate::Result;
use crate::task::Playbook;
use anyhow::Context;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Block-style YAML.
    #[default]
    Yaml,
    /// Pretty-printed JSON (also valid YAML).
    Json,
}

/// Render the whole playbook in memory, so a failure never leaves partial output.
pub fn render_playbook(playbook: &Playbook, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(playbook).context("serialize playbook as YAML"),
        OutputFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(playbook).context("serialize playbook as JSON")?;
            out.push('\n');
            Ok(out)
        }
    }
}
