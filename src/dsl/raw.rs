//! Raw DSL shapes as they appear in the input YAML.
//!
//! Example document:
//! ```yaml
//! install:
//!   - nginx: apt install -y nginx
//! configure:
//!   java_home:
//!     path: /etc/environment
//!     export: /usr/lib/jvm/java-11
//! firewall:
//!   allow:
//!     - { port: 22, proto: tcp }
//! helm:
//!   check: helm version
//!   install: curl -fsSL https://get.helm.sh | bash
//! cilium:
//!   helm:
//!     repo: https://helm.cilium.io/
//!     install:
//!       values: { kubeProxyReplacement: true }
//!   wait: kubectl -n kube-system rollout status ds/cilium
//!   test: cilium connectivity test
//! monitoring:
//!   prometheus: https://example.org/prometheus.yaml
//! verify:
//!   disk: df -h
//! ```
//!
//! Every nested field is optional here; `validate` turns absences into
//! `SchemaError`s that name the section and key.

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

/// Top-level DSL document, one optional field per known section.
///
/// Built section by section in `parse_document`, so a malformed section is
/// reported under its own name.
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub install: Option<Vec<IndexMap<String, String>>>,
    pub configure: Option<IndexMap<String, RawConfigure>>,
    pub firewall: Option<RawFirewall>,
    pub helm: Option<RawHelm>,
    pub cilium: Option<RawCilium>,
    pub monitoring: Option<IndexMap<String, String>>,
    pub verify: Option<IndexMap<String, String>>,

    /// Top-level keys that are not sections, in document order.
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigure {
    #[serde(default)]
    pub path: Option<String>,

    /// Any scalar; rendered textually into the export line.
    #[serde(default)]
    pub export: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFirewall {
    #[serde(default)]
    pub allow: Option<Vec<RawFirewallRule>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFirewallRule {
    #[serde(default)]
    pub port: Option<Port>,

    #[serde(default)]
    pub proto: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHelm {
    #[serde(default)]
    pub check: Option<String>,

    #[serde(default)]
    pub install: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCilium {
    #[serde(default)]
    pub helm: Option<RawCiliumHelm>,

    #[serde(default)]
    pub wait: Option<String>,

    #[serde(default)]
    pub test: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCiliumHelm {
    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default)]
    pub install: Option<RawCiliumInstall>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCiliumInstall {
    #[serde(default)]
    pub values: Option<Value>,
}

/// A ufw port: a number, or a string such as a range (`6000:6007`) or a
/// service name. Emitted back with the same YAML type it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Port {
    Number(u64),
    Named(String),
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PortVisitor;

        impl Visitor<'_> for PortVisitor {
            type Value = Port;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a port number or a port range/service name")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Port, E> {
                Ok(Port::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Port, E> {
                u64::try_from(v)
                    .map(Port::Number)
                    .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Port, E> {
                Ok(Port::Named(v.to_string()))
            }
        }

        deserializer.deserialize_any(PortVisitor)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Number(n) => write!(f, "{}", n),
            Port::Named(s) => write!(f, "{}", s),
        }
    }
}
