//! DSL → playbook translation.
//!
//! Each section has its own emitter appending fixed-shape tasks. Emitters run
//! in `Section::ORDER`, independent of the key order in the input document.

use crate::config::PlaybookOptions;
use crate::dsl::DslConfig;
use crate::task::{Action, Command, Guard, HelmChart, Play, Playbook, Task};
use std::fmt;

const HELM_CHECK_VAR: &str = "helm_check";
const CILIUM_PODS_VAR: &str = "cilium_pod_status";
const CILIUM_TEST_VAR: &str = "connectivity_test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Install,
    Configure,
    Firewall,
    Helm,
    Cilium,
    Monitoring,
    Verify,
}

impl Section {
    pub const ORDER: [Section; 7] = [
        Section::Install,
        Section::Configure,
        Section::Firewall,
        Section::Helm,
        Section::Cilium,
        Section::Monitoring,
        Section::Verify,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::Install => "install",
            Section::Configure => "configure",
            Section::Firewall => "firewall",
            Section::Helm => "helm",
            Section::Cilium => "cilium",
            Section::Monitoring => "monitoring",
            Section::Verify => "verify",
        }
    }

    fn emit(self, config: &DslConfig, options: &PlaybookOptions, tasks: &mut Vec<Task>) {
        match self {
            Section::Install => emit_install(config, options, tasks),
            Section::Configure => emit_configure(config, tasks),
            Section::Firewall => emit_firewall(config, tasks),
            Section::Helm => emit_helm(config, tasks),
            Section::Cilium => emit_cilium(config, options, tasks),
            Section::Monitoring => emit_monitoring(config, tasks),
            Section::Verify => emit_verify(config, tasks),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Build the one-play playbook for a validated DSL document.
pub fn translate(config: &DslConfig, options: &PlaybookOptions) -> Playbook {
    let mut tasks = Vec::new();
    for section in Section::ORDER {
        let before = tasks.len();
        section.emit(config, options, &mut tasks);
        let emitted = tasks.len() - before;
        if emitted > 0 {
            tracing::info!(%section, tasks = emitted, "translated section");
        }
    }

    Playbook {
        plays: vec![Play {
            name: options.play_name.clone(),
            hosts: options.hosts.clone(),
            become_root: options.become_root,
            tasks,
        }],
    }
}

fn emit_install(config: &DslConfig, options: &PlaybookOptions, tasks: &mut Vec<Task>) {
    for pkg in &config.install {
        tasks.push(Task::new(
            format!("Install {}", pkg.name),
            Action::Shell {
                command: pkg.command.clone(),
                executable: options.shell.clone(),
            },
        ));
    }
}

fn emit_configure(config: &DslConfig, tasks: &mut Vec<Task>) {
    for export in &config.configure {
        tasks.push(Task::new(
            format!("Configure {}", export.key),
            Action::LineInFile {
                path: export.path.clone(),
                line: export.line(),
            },
        ));
    }
}

fn emit_firewall(config: &DslConfig, tasks: &mut Vec<Task>) {
    for rule in &config.firewall {
        tasks.push(Task::new(
            format!("Allow Firewall Port {}/{}", rule.port, rule.proto),
            Action::FirewallAllow {
                port: rule.port.clone(),
                proto: rule.proto.clone(),
            },
        ));
    }
}

fn emit_helm(config: &DslConfig, tasks: &mut Vec<Task>) {
    let Some(helm) = &config.helm else {
        return;
    };

    tasks.push(Task::new(
        "Check if Helm is installed",
        Action::Command(
            Command::new(&helm.check)
                .register(HELM_CHECK_VAR)
                .guard(Guard::Probe),
        ),
    ));
    tasks.push(Task::new(
        "Install Helm",
        Action::Command(Command::new(&helm.install).guard(Guard::UnlessSucceeded {
            probe: HELM_CHECK_VAR.to_string(),
        })),
    ));
}

fn emit_cilium(config: &DslConfig, options: &PlaybookOptions, tasks: &mut Vec<Task>) {
    let Some(cilium) = &config.cilium else {
        return;
    };

    tasks.push(Task::new(
        "Add Cilium Helm Repository",
        Action::HelmRepository {
            name: "cilium".to_string(),
            repo_url: cilium.repo.clone(),
        },
    ));
    tasks.push(Task::new(
        "Install Cilium",
        Action::HelmChart(HelmChart {
            release: "cilium".to_string(),
            chart_ref: "cilium/cilium".to_string(),
            namespace: "kube-system".to_string(),
            create_namespace: true,
            values: cilium.values.clone(),
            kubeconfig: Some(options.kubeconfig.clone()),
        }),
    ));
    tasks.push(Task::new(
        "Wait for Cilium Pods",
        Action::Command(
            Command::new(&cilium.wait)
                .register(CILIUM_PODS_VAR)
                .guard(Guard::RetryUntilSuccess {
                    retries: options.cilium_wait.retries,
                    delay: options.cilium_wait.delay,
                }),
        ),
    ));
    tasks.push(Task::new(
        "Run Cilium Connectivity Test",
        Action::Command(
            Command::new(&cilium.test)
                .register(CILIUM_TEST_VAR)
                .guard(Guard::FailUnlessSuccess),
        ),
    ));
}

fn emit_monitoring(config: &DslConfig, tasks: &mut Vec<Task>) {
    for manifest in &config.monitoring {
        tasks.push(Task::new(
            format!("Install {}", manifest.tool),
            Action::ApplyManifest {
                src: manifest.src.clone(),
            },
        ));
    }
}

fn emit_verify(config: &DslConfig, tasks: &mut Vec<Task>) {
    for check in &config.verify {
        let register = check.register();
        tasks.push(Task::new(
            format!("Verify {}", check.key),
            Action::Command(Command::new(&check.command).register(&register)),
        ));
        tasks.push(Task::new(
            format!("Display {} Status", check.key),
            Action::Debug {
                msg: format!("{{{{ {}.stdout }}}}", register),
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Port, parse_document};
    use pretty_assertions::assert_eq;

    fn translate_yaml(yaml: &str) -> Playbook {
        let config = parse_document(yaml).unwrap().validate().unwrap();
        translate(&config, &PlaybookOptions::default())
    }

    fn task_names(playbook: &Playbook) -> Vec<&str> {
        playbook.tasks().map(|t| t.name.as_str()).collect()
    }

    const FULL: &str = r#"
verify:
  disk: df -h
  nodes: kubectl get nodes
monitoring:
  prometheus: https://example.org/prometheus.yaml
cilium:
  helm:
    repo: https://helm.cilium.io/
    install:
      values:
        kubeProxyReplacement: true
  wait: kubectl -n kube-system rollout status ds/cilium
  test: cilium connectivity test
helm:
  check: helm version
  install: curl -fsSL https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3 | bash
firewall:
  allow:
    - port: 22
      proto: tcp
configure:
  java_home:
    path: /etc/environment
    export: /usr/lib/jvm/java-11
install:
  - nginx: apt install -y nginx
"#;

    #[test]
    fn no_sections_no_tasks() {
        let playbook = translate_yaml("unrelated: true\n");
        assert_eq!(playbook.plays.len(), 1);
        assert!(playbook.plays[0].tasks.is_empty());
    }

    #[test]
    fn play_header_defaults() {
        let playbook = translate_yaml("{}");
        let play = &playbook.plays[0];
        assert_eq!(play.name, "Generated Ansible Playbook from DSL");
        assert_eq!(play.hosts, "localhost");
        assert!(play.become_root);
    }

    #[test]
    fn install_emits_shell_task() {
        let playbook = translate_yaml("install:\n  - nginx: apt install -y nginx\n");
        let tasks = &playbook.plays[0].tasks;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Install nginx");
        assert_eq!(
            tasks[0].action,
            Action::Shell {
                command: "apt install -y nginx".to_string(),
                executable: "/bin/bash".to_string(),
            }
        );
    }

    #[test]
    fn configure_emits_export_line() {
        let playbook = translate_yaml(
            "configure:\n  java_home:\n    path: /etc/environment\n    export: /usr/lib/jvm/java-11\n",
        );
        let tasks = &playbook.plays[0].tasks;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Configure java_home");
        assert_eq!(
            tasks[0].action,
            Action::LineInFile {
                path: "/etc/environment".to_string(),
                line: "export JAVA_HOME=/usr/lib/jvm/java-11".to_string(),
            }
        );
    }

    #[test]
    fn firewall_task_name() {
        let playbook = translate_yaml("firewall:\n  allow:\n    - { port: 22, proto: tcp }\n");
        let tasks = &playbook.plays[0].tasks;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Allow Firewall Port 22/tcp");
        assert_eq!(
            tasks[0].action,
            Action::FirewallAllow {
                port: Port::Number(22),
                proto: "tcp".to_string(),
            }
        );
    }

    #[test]
    fn helm_probe_then_conditional_install() {
        let playbook = translate_yaml("helm:\n  check: helm version\n  install: get-helm\n");
        let tasks = &playbook.plays[0].tasks;
        assert_eq!(task_names(&playbook), vec!["Check if Helm is installed", "Install Helm"]);
        assert_eq!(
            tasks[0].action,
            Action::Command(
                Command::new("helm version")
                    .register("helm_check")
                    .guard(Guard::Probe)
            )
        );
        assert_eq!(
            tasks[1].action,
            Action::Command(Command::new("get-helm").guard(Guard::UnlessSucceeded {
                probe: "helm_check".to_string()
            }))
        );
    }

    #[test]
    fn cilium_emits_four_tasks() {
        let playbook = translate_yaml(FULL);
        let names: Vec<&str> = task_names(&playbook)
            .into_iter()
            .filter(|n| n.contains("Cilium"))
            .collect();
        assert_eq!(
            names,
            vec![
                "Add Cilium Helm Repository",
                "Install Cilium",
                "Wait for Cilium Pods",
                "Run Cilium Connectivity Test",
            ]
        );

        let wait = playbook
            .tasks()
            .find(|t| t.name == "Wait for Cilium Pods")
            .unwrap();
        assert_eq!(
            wait.action,
            Action::Command(
                Command::new("kubectl -n kube-system rollout status ds/cilium")
                    .register("cilium_pod_status")
                    .guard(Guard::RetryUntilSuccess {
                        retries: 10,
                        delay: 10
                    })
            )
        );
    }

    #[test]
    fn cilium_chart_uses_kubeconfig_option() {
        let config = parse_document(FULL).unwrap().validate().unwrap();
        let options = PlaybookOptions::default().with_kubeconfig("/root/.kube/config");
        let playbook = translate(&config, &options);

        let chart = playbook
            .tasks()
            .find_map(|t| match &t.action {
                Action::HelmChart(chart) => Some(chart.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(chart.kubeconfig.as_deref(), Some("/root/.kube/config"));
        assert_eq!(chart.chart_ref, "cilium/cilium");
        assert_eq!(chart.namespace, "kube-system");
    }

    #[test]
    fn verify_emits_register_then_display() {
        let playbook = translate_yaml("verify:\n  disk: df -h\n");
        let tasks = &playbook.plays[0].tasks;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "Verify disk");
        assert_eq!(
            tasks[0].action,
            Action::Command(Command::new("df -h").register("disk_status"))
        );
        assert_eq!(tasks[1].name, "Display disk Status");
        assert_eq!(
            tasks[1].action,
            Action::Debug {
                msg: "{{ disk_status.stdout }}".to_string()
            }
        );
    }

    #[test]
    fn section_order_ignores_input_order() {
        let playbook = translate_yaml(FULL);
        assert_eq!(
            task_names(&playbook),
            vec![
                "Install nginx",
                "Configure java_home",
                "Allow Firewall Port 22/tcp",
                "Check if Helm is installed",
                "Install Helm",
                "Add Cilium Helm Repository",
                "Install Cilium",
                "Wait for Cilium Pods",
                "Run Cilium Connectivity Test",
                "Install prometheus",
                "Verify disk",
                "Display disk Status",
                "Verify nodes",
                "Display nodes Status",
            ]
        );
    }

    #[test]
    fn hosts_and_shell_overrides() {
        let config = parse_document("install:\n  - vim: apt install -y vim\n")
            .unwrap()
            .validate()
            .unwrap();
        let options = PlaybookOptions::default()
            .with_hosts("webservers")
            .with_shell("/bin/sh");
        let playbook = translate(&config, &options);

        assert_eq!(playbook.plays[0].hosts, "webservers");
        assert_eq!(
            playbook.plays[0].tasks[0].action,
            Action::Shell {
                command: "apt install -y vim".to_string(),
                executable: "/bin/sh".to_string(),
            }
        );
    }
}
