//! Playbook model: a play plus its ordered tasks.
//!
//! Tasks are a closed set of action variants, each carrying only the fields
//! it needs. The Ansible shape (module key, parameters, modifiers) is produced
//! only when serializing.

mod serialize;

use crate::dsl::Port;
use serde::Serialize;
use serde_yaml::Value;

/// The generated document: a sequence holding one play.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Playbook {
    pub plays: Vec<Play>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Play {
    pub name: String,
    pub hosts: String,
    #[serde(rename = "become")]
    pub become_root: bool,
    pub tasks: Vec<Task>,
}

impl Playbook {
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.plays.iter().flat_map(|p| p.tasks.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub action: Action,
}

impl Task {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `shell` through an explicit executable.
    Shell { command: String, executable: String },

    /// `lineinfile`: ensure `line` is present in `path`, creating the file.
    LineInFile { path: String, line: String },

    /// `community.general.ufw` allow rule.
    FirewallAllow { port: Port, proto: String },

    /// `command`, optionally registered and guarded.
    Command(Command),

    /// `kubernetes.core.helm_repository`.
    HelmRepository { name: String, repo_url: String },

    /// `kubernetes.core.helm`.
    HelmChart(HelmChart),

    /// `kubernetes.core.k8s` with `state: present`.
    ApplyManifest { src: String },

    /// `debug` printing a message.
    Debug { msg: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub command: String,
    pub register: Option<String>,
    pub guard: Guard,
}

/// Execution policy attached to a `command` task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Run once; a non-zero exit fails the play.
    Once,

    /// Inspection only: never "changed", failure tolerated.
    Probe,

    /// Run only when the registered `probe` result exited non-zero.
    UnlessSucceeded { probe: String },

    /// Re-run until this task's own registered result exits zero.
    RetryUntilSuccess { retries: u32, delay: u32 },

    /// Fail the task when its registered result exits non-zero.
    FailUnlessSuccess,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            register: None,
            guard: Guard::Once,
        }
    }

    pub fn register(mut self, var: impl Into<String>) -> Self {
        self.register = Some(var.into());
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HelmChart {
    pub release: String,
    pub chart_ref: String,
    pub namespace: String,
    pub create_namespace: bool,
    pub values: Value,
    /// Exported as `KUBECONFIG` in the task environment.
    pub kubeconfig: Option<String>,
}
