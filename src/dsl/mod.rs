//! DSL layer: YAML input shapes + validated in-memory structures.
//!
//! Kept separate from translation and rendering. It owns:
//! - raw serde shapes for each section
//! - the validation pass producing `DslConfig`
//! - `SchemaError`, naming the section/key of a malformed entry

pub mod error;
pub mod raw;
pub mod validate;

pub use error::SchemaError;
pub use raw::{Port, RawDocument};
pub use validate::DslConfig;

use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Parse DSL text. An empty (or `null`) document has no sections.
///
/// Each known section is deserialized on its own so that a shape error is
/// reported under the section name.
pub fn parse_document(text: &str) -> Result<RawDocument> {
    if text.trim().is_empty() {
        return Ok(RawDocument::default());
    }

    let root: Value = serde_yaml::from_str(text)?;
    let sections = match root {
        Value::Null => return Ok(RawDocument::default()),
        Value::Mapping(sections) => sections,
        other => {
            return Err(SchemaError::NotAMapping {
                found: value_kind(&other),
            }
            .into());
        }
    };

    let mut doc = RawDocument::default();
    for (key, value) in sections {
        let Some(name) = key.as_str() else {
            return Err(SchemaError::InvalidSectionName {
                found: value_kind(&key),
            }
            .into());
        };
        match name {
            "install" => doc.install = section(name, value)?,
            "configure" => doc.configure = section(name, value)?,
            "firewall" => doc.firewall = section(name, value)?,
            "helm" => doc.helm = section(name, value)?,
            "cilium" => doc.cilium = section(name, value)?,
            "monitoring" => doc.monitoring = section(name, value)?,
            "verify" => doc.verify = section(name, value)?,
            _ => doc.unknown.push(name.to_string()),
        }
    }
    Ok(doc)
}

fn section<T: DeserializeOwned>(name: &str, value: Value) -> std::result::Result<Option<T>, SchemaError> {
    serde_yaml::from_value(value).map_err(|e| SchemaError::Malformed {
        location: name.to_string(),
        reason: e.to_string(),
    })
}

/// Read, parse and validate a DSL file.
pub fn load_config(path: &Path) -> Result<DslConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read DSL file {}", path.display()))?;

    let raw = parse_document(&text)
        .inspect_err(|e| tracing::debug!(error = %e, "DSL parse failed"))
        .with_context(|| format!("parse DSL file {}", path.display()))?;

    let config = raw
        .validate()
        .inspect_err(|e| {
            tracing::debug!(section = e.section().unwrap_or("<root>"), "DSL validation failed")
        })
        .with_context(|| format!("invalid DSL file {}", path.display()))?;
    Ok(config)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn blank_text_is_empty_document() {
        let doc = parse_document("  \n").unwrap();
        assert_eq!(doc.validate().unwrap(), DslConfig::default());
    }

    #[test]
    fn null_document_is_empty() {
        let doc = parse_document("~\n").unwrap();
        assert_eq!(doc.validate().unwrap(), DslConfig::default());
    }

    #[test]
    fn sequence_root_is_rejected() {
        let err = parse_document("- install\n- verify\n").unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().unwrap();
        assert_eq!(schema, &SchemaError::NotAMapping { found: "a sequence" });
    }

    fn malformed(text: &str) -> SchemaError {
        let err = parse_document(text).unwrap_err();
        err.downcast_ref::<SchemaError>().unwrap().clone()
    }

    #[test]
    fn install_entry_without_command_names_section() {
        let err = malformed("install:\n  - nginx\n");
        assert_eq!(err.section(), Some("install"));
        assert!(err.to_string().starts_with("install: "));
    }

    #[test]
    fn negative_port_names_section_and_field() {
        let err = malformed("firewall:\n  allow:\n    - { port: -1, proto: tcp }\n");
        assert_eq!(err.section(), Some("firewall"));
        let msg = err.to_string();
        assert!(msg.starts_with("firewall: "));
        assert!(msg.contains("-1"));
        assert!(msg.contains("port"));
    }

    #[test]
    fn scalar_section_names_section() {
        let err = malformed("monitoring: https://x\n");
        assert!(matches!(err, SchemaError::Malformed { ref location, .. } if location == "monitoring"));
    }

    #[test]
    fn non_string_section_name_is_rejected() {
        let err = malformed("1: install\n");
        assert_eq!(err, SchemaError::InvalidSectionName { found: "a number" });
    }

    #[test]
    fn unknown_sections_are_recorded_in_order() {
        let doc = parse_document("packages:\n  - vim\nverify:\n  disk: df -h\nextra: 1\n").unwrap();
        assert_eq!(doc.unknown, vec!["packages".to_string(), "extra".to_string()]);
        assert_eq!(doc.validate().unwrap().verify.len(), 1);
    }

    #[test]
    fn syntax_error_surfaces() {
        assert!(parse_document("install: [unterminated\n").is_err());
    }

    #[test]
    fn load_config_reports_path_on_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("read DSL file /definitely/not/here.yaml"));
    }

    #[test]
    fn load_config_wraps_schema_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "configure:\n  java_home:\n    path: /etc/environment\n").unwrap();

        let err = load_config(file.path()).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("invalid DSL file"));
        assert!(chain.contains("configure.java_home: missing field `export`"));
    }
}
