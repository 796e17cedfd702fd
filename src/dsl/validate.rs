//! Validated DSL: every section resolved into typed, ordered entries.
//!
//! Validation is a single fail-fast pass. Nothing is emitted for a document
//! that fails here, so translation can assume every field it reads exists.

use crate::dsl::SchemaError;
use crate::dsl::raw::{
    Port, RawCilium, RawConfigure, RawDocument, RawFirewall, RawFirewallRule, RawHelm,
};
use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

/// Protocols accepted by the ufw module's `proto` parameter.
pub const UFW_PROTOCOLS: &[&str] = &["any", "tcp", "udp", "ipv6", "esp", "ah", "gre", "igmp"];

/// Names that must survive as shell (`export KEY=`) or Ansible (`key_status`)
/// variable names.
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DslConfig {
    pub install: Vec<Package>,
    pub configure: Vec<EnvExport>,
    pub firewall: Vec<FirewallRule>,
    pub helm: Option<HelmBootstrap>,
    pub cilium: Option<CiliumBootstrap>,
    pub monitoring: Vec<Manifest>,
    pub verify: Vec<VerifyCheck>,
}

/// `install` entry: package label plus the shell command that installs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub command: String,
}

/// `configure` entry: `export {variable}={value}` kept in `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvExport {
    pub key: String,
    pub variable: String,
    pub path: String,
    pub value: String,
}

impl EnvExport {
    pub fn line(&self) -> String {
        format!("export {}={}", self.variable, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRule {
    pub port: Port,
    pub proto: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmBootstrap {
    pub check: String,
    pub install: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CiliumBootstrap {
    pub repo: String,
    pub values: Value,
    pub wait: String,
    pub test: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub tool: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCheck {
    pub key: String,
    pub command: String,
}

impl VerifyCheck {
    /// Ansible variable the command result is registered under.
    pub fn register(&self) -> String {
        format!("{}_status", self.key)
    }
}

impl RawDocument {
    /// Resolve every present section, failing on the first malformed entry.
    pub fn validate(&self) -> Result<DslConfig, SchemaError> {
        for key in &self.unknown {
            tracing::warn!(section = %key, "ignoring unknown DSL section");
        }

        Ok(DslConfig {
            install: match &self.install {
                Some(items) => validate_install(items)?,
                None => Vec::new(),
            },
            configure: match &self.configure {
                Some(entries) => validate_configure(entries)?,
                None => Vec::new(),
            },
            firewall: match &self.firewall {
                Some(fw) => validate_firewall(fw)?,
                None => Vec::new(),
            },
            helm: self.helm.as_ref().map(validate_helm).transpose()?,
            cilium: self.cilium.as_ref().map(validate_cilium).transpose()?,
            monitoring: match &self.monitoring {
                Some(entries) => validate_monitoring(entries)?,
                None => Vec::new(),
            },
            verify: match &self.verify {
                Some(entries) => validate_verify(entries)?,
                None => Vec::new(),
            },
        })
    }
}

fn validate_install(items: &[IndexMap<String, String>]) -> Result<Vec<Package>, SchemaError> {
    let mut out = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let location = format!("install[{}]", idx);
        // Normally a single key; several keys each become their own task.
        for (name, command) in item {
            require_non_empty_key(&location, name)?;
            let command = require_command(&format!("{}.{}", location, name), "command", command)?;
            out.push(Package {
                name: name.clone(),
                command,
            });
        }
    }
    Ok(out)
}

fn validate_configure(
    entries: &IndexMap<String, RawConfigure>,
) -> Result<Vec<EnvExport>, SchemaError> {
    let mut out = Vec::with_capacity(entries.len());
    for (key, raw) in entries {
        require_identifier("configure", key, "must be usable as a shell variable name")?;
        let location = format!("configure.{}", key);

        let path = raw
            .path
            .as_deref()
            .ok_or_else(|| SchemaError::missing(&location, "path"))?;
        if path.trim().is_empty() {
            return Err(SchemaError::invalid(&location, "path", "must not be empty"));
        }

        let export = raw
            .export
            .as_ref()
            .ok_or_else(|| SchemaError::missing(&location, "export"))?;
        let value = scalar_to_string(export).ok_or_else(|| {
            SchemaError::invalid(&location, "export", "expected a scalar value")
        })?;

        out.push(EnvExport {
            key: key.clone(),
            variable: key.to_uppercase(),
            path: path.to_string(),
            value,
        });
    }
    Ok(out)
}

fn validate_firewall(fw: &RawFirewall) -> Result<Vec<FirewallRule>, SchemaError> {
    let rules = fw
        .allow
        .as_ref()
        .ok_or_else(|| SchemaError::missing("firewall", "allow"))?;

    rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| validate_firewall_rule(idx, rule))
        .collect()
}

fn validate_firewall_rule(idx: usize, rule: &RawFirewallRule) -> Result<FirewallRule, SchemaError> {
    let location = format!("firewall.allow[{}]", idx);

    let port = rule
        .port
        .clone()
        .ok_or_else(|| SchemaError::missing(&location, "port"))?;
    match &port {
        Port::Number(n) if !(1..=65535).contains(n) => {
            return Err(SchemaError::invalid(
                &location,
                "port",
                format!("{} is outside 1-65535", n),
            ));
        }
        Port::Named(s) if s.trim().is_empty() => {
            return Err(SchemaError::invalid(&location, "port", "must not be empty"));
        }
        _ => {}
    }

    let proto = rule
        .proto
        .as_deref()
        .ok_or_else(|| SchemaError::missing(&location, "proto"))?;
    if !UFW_PROTOCOLS.contains(&proto) {
        return Err(SchemaError::invalid(
            &location,
            "proto",
            format!("'{}' is not one of {}", proto, UFW_PROTOCOLS.join(", ")),
        ));
    }

    Ok(FirewallRule {
        port,
        proto: proto.to_string(),
    })
}

fn validate_helm(raw: &RawHelm) -> Result<HelmBootstrap, SchemaError> {
    Ok(HelmBootstrap {
        check: required_command("helm", "check", raw.check.as_deref())?,
        install: required_command("helm", "install", raw.install.as_deref())?,
    })
}

fn validate_cilium(raw: &RawCilium) -> Result<CiliumBootstrap, SchemaError> {
    let helm = raw
        .helm
        .as_ref()
        .ok_or_else(|| SchemaError::missing("cilium", "helm"))?;
    let repo = required_command("cilium.helm", "repo", helm.repo.as_deref())?;

    let install = helm
        .install
        .as_ref()
        .ok_or_else(|| SchemaError::missing("cilium.helm", "install"))?;
    let values = install
        .values
        .clone()
        .ok_or_else(|| SchemaError::missing("cilium.helm.install", "values"))?;
    if !values.is_mapping() {
        return Err(SchemaError::invalid(
            "cilium.helm.install",
            "values",
            "expected a mapping of chart values",
        ));
    }

    Ok(CiliumBootstrap {
        repo,
        values,
        wait: required_command("cilium", "wait", raw.wait.as_deref())?,
        test: required_command("cilium", "test", raw.test.as_deref())?,
    })
}

fn validate_monitoring(entries: &IndexMap<String, String>) -> Result<Vec<Manifest>, SchemaError> {
    let mut out = Vec::with_capacity(entries.len());
    for (tool, src) in entries {
        require_non_empty_key("monitoring", tool)?;
        let src = require_command(&format!("monitoring.{}", tool), "src", src)?;
        out.push(Manifest {
            tool: tool.clone(),
            src,
        });
    }
    Ok(out)
}

fn validate_verify(entries: &IndexMap<String, String>) -> Result<Vec<VerifyCheck>, SchemaError> {
    let mut out = Vec::with_capacity(entries.len());
    for (key, command) in entries {
        require_identifier("verify", key, "must be usable as an Ansible variable name")?;
        let command = require_command(&format!("verify.{}", key), "command", command)?;
        out.push(VerifyCheck {
            key: key.clone(),
            command,
        });
    }
    Ok(out)
}

fn required_command(
    location: &str,
    field: &'static str,
    value: Option<&str>,
) -> Result<String, SchemaError> {
    let value = value.ok_or_else(|| SchemaError::missing(location, field))?;
    require_command(location, field, value)
}

fn require_command(location: &str, field: &'static str, value: &str) -> Result<String, SchemaError> {
    if value.trim().is_empty() {
        return Err(SchemaError::invalid(location, field, "must not be empty"));
    }
    Ok(value.to_string())
}

fn require_non_empty_key(location: &str, key: &str) -> Result<(), SchemaError> {
    if key.trim().is_empty() {
        return Err(SchemaError::InvalidKey {
            location: location.to_string(),
            key: key.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn require_identifier(location: &str, key: &str, reason: &str) -> Result<(), SchemaError> {
    if !IDENTIFIER_RE.is_match(key) {
        return Err(SchemaError::InvalidKey {
            location: location.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
