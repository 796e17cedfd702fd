//! Boundary serialization: each `Action` becomes one Ansible task mapping.
//!
//! Key order inside a task: `name`, module key, module side keys
//! (`args`, `environment`), then modifiers.

use super::{Action, Command, Guard, HelmChart, Task};
use crate::dsl::Port;
use serde::Serialize;
use serde::ser::{Error, SerializeMap, Serializer};
use serde_yaml::Value;

#[derive(Serialize)]
struct ShellArgs<'a> {
    executable: &'a str,
}

#[derive(Serialize)]
struct LineInFileParams<'a> {
    path: &'a str,
    line: &'a str,
    create: bool,
    state: &'static str,
}

#[derive(Serialize)]
struct UfwParams<'a> {
    rule: &'static str,
    port: &'a Port,
    proto: &'a str,
}

#[derive(Serialize)]
struct HelmRepositoryParams<'a> {
    name: &'a str,
    repo_url: &'a str,
}

#[derive(Serialize)]
struct HelmParams<'a> {
    name: &'a str,
    chart_ref: &'a str,
    release_namespace: &'a str,
    create_namespace: bool,
    values: &'a Value,
}

#[derive(Serialize)]
struct KubeEnvironment<'a> {
    #[serde(rename = "KUBECONFIG")]
    kubeconfig: &'a str,
}

#[derive(Serialize)]
struct K8sParams<'a> {
    state: &'static str,
    src: &'a str,
}

#[derive(Serialize)]
struct DebugParams<'a> {
    msg: &'a str,
}

impl Serialize for Task {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;

        match &self.action {
            Action::Shell {
                command,
                executable,
            } => {
                map.serialize_entry("shell", command)?;
                map.serialize_entry("args", &ShellArgs { executable })?;
            }
            Action::LineInFile { path, line } => {
                map.serialize_entry(
                    "lineinfile",
                    &LineInFileParams {
                        path,
                        line,
                        create: true,
                        state: "present",
                    },
                )?;
            }
            Action::FirewallAllow { port, proto } => {
                map.serialize_entry(
                    "community.general.ufw",
                    &UfwParams {
                        rule: "allow",
                        port,
                        proto,
                    },
                )?;
            }
            Action::Command(cmd) => serialize_command(&mut map, cmd)?,
            Action::HelmRepository { name, repo_url } => {
                map.serialize_entry(
                    "kubernetes.core.helm_repository",
                    &HelmRepositoryParams { name, repo_url },
                )?;
            }
            Action::HelmChart(chart) => serialize_helm_chart(&mut map, chart)?,
            Action::ApplyManifest { src } => {
                map.serialize_entry(
                    "kubernetes.core.k8s",
                    &K8sParams {
                        state: "present",
                        src,
                    },
                )?;
            }
            Action::Debug { msg } => {
                map.serialize_entry("debug", &DebugParams { msg })?;
            }
        }

        map.end()
    }
}

fn serialize_command<M: SerializeMap>(map: &mut M, cmd: &Command) -> Result<(), M::Error> {
    map.serialize_entry("command", &cmd.command)?;
    if let Some(var) = &cmd.register {
        map.serialize_entry("register", var)?;
    }

    match &cmd.guard {
        Guard::Once => {}
        Guard::Probe => {
            map.serialize_entry("ignore_errors", &true)?;
            map.serialize_entry("changed_when", &false)?;
        }
        Guard::UnlessSucceeded { probe } => {
            map.serialize_entry("when", &format!("{}.rc != 0", probe))?;
        }
        Guard::RetryUntilSuccess { retries, delay } => {
            let var = registered::<M::Error>(cmd)?;
            map.serialize_entry("until", &format!("{}.rc == 0", var))?;
            map.serialize_entry("retries", retries)?;
            map.serialize_entry("delay", delay)?;
        }
        Guard::FailUnlessSuccess => {
            let var = registered::<M::Error>(cmd)?;
            map.serialize_entry("failed_when", &format!("{}.rc != 0", var))?;
        }
    }
    Ok(())
}

fn serialize_helm_chart<M: SerializeMap>(map: &mut M, chart: &HelmChart) -> Result<(), M::Error> {
    map.serialize_entry(
        "kubernetes.core.helm",
        &HelmParams {
            name: &chart.release,
            chart_ref: &chart.chart_ref,
            release_namespace: &chart.namespace,
            create_namespace: chart.create_namespace,
            values: &chart.values,
        },
    )?;
    if let Some(kubeconfig) = &chart.kubeconfig {
        map.serialize_entry("environment", &KubeEnvironment { kubeconfig })?;
    }
    Ok(())
}

/// Guards that inspect `.rc` need the task's own registered result.
fn registered<E: Error>(cmd: &Command) -> Result<&str, E> {
    cmd.register.as_deref().ok_or_else(|| {
        E::custom(format!(
            "command `{}` has a guard that needs a registered result",
            cmd.command
        ))
    })
}
