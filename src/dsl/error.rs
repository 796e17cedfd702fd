use thiserror::Error;

/// A DSL document that parsed as YAML but does not have the expected shape.
///
/// `location` is a dotted path into the document, e.g. `configure.java_home`,
/// `firewall.allow[1]` or `cilium.helm.install`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("DSL document must be a mapping of sections, found {found}")]
    NotAMapping { found: &'static str },

    #[error("section names must be strings, found {found}")]
    InvalidSectionName { found: &'static str },

    /// The section (or an entry in it) has the wrong YAML shape.
    #[error("{location}: {reason}")]
    Malformed { location: String, reason: String },

    #[error("{location}: missing field `{field}`")]
    MissingField {
        location: String,
        field: &'static str,
    },

    #[error("{location}: invalid field `{field}`: {reason}")]
    InvalidField {
        location: String,
        field: &'static str,
        reason: String,
    },

    #[error("{location}: invalid key `{key}`: {reason}")]
    InvalidKey {
        location: String,
        key: String,
        reason: String,
    },
}

impl SchemaError {
    pub fn missing(location: impl Into<String>, field: &'static str) -> Self {
        SchemaError::MissingField {
            location: location.into(),
            field,
        }
    }

    pub fn invalid(
        location: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidField {
            location: location.into(),
            field,
            reason: reason.into(),
        }
    }

    /// Top-level section the error belongs to, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            SchemaError::NotAMapping { .. } | SchemaError::InvalidSectionName { .. } => None,
            SchemaError::Malformed { location, .. }
            | SchemaError::MissingField { location, .. }
            | SchemaError::InvalidField { location, .. }
            | SchemaError::InvalidKey { location, .. } => location
                .split(['.', '['])
                .next()
                .filter(|s| !s.is_empty()),
        }
    }
}
