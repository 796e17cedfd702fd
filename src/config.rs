//! Playbook-level settings that are not part of the DSL document itself.
//!
//! The defaults reproduce the fixed values every generated playbook has always
//! carried; the CLI can override a few of them for other targets.

pub const DEFAULT_PLAY_NAME: &str = "Generated Ansible Playbook from DSL";
pub const DEFAULT_HOSTS: &str = "localhost";
pub const DEFAULT_SHELL: &str = "/bin/bash";
pub const DEFAULT_KUBECONFIG: &str = "/etc/rancher/k3s/k3s.yaml";

/// How long to wait for Cilium pods before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    /// Seconds between attempts.
    pub delay: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 10,
            delay: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookOptions {
    pub play_name: String,
    pub hosts: String,
    pub become_root: bool,
    /// Executable passed to every `shell` task.
    pub shell: String,
    /// KUBECONFIG exported to the Helm chart install.
    pub kubeconfig: String,
    pub cilium_wait: RetryPolicy,
}

impl Default for PlaybookOptions {
    fn default() -> Self {
        Self {
            play_name: DEFAULT_PLAY_NAME.to_string(),
            hosts: DEFAULT_HOSTS.to_string(),
            become_root: true,
            shell: DEFAULT_SHELL.to_string(),
            kubeconfig: DEFAULT_KUBECONFIG.to_string(),
            cilium_wait: RetryPolicy::default(),
        }
    }
}

impl PlaybookOptions {
    pub fn with_hosts(mut self, hosts: impl Into<String>) -> Self {
        self.hosts = hosts.into();
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: impl Into<String>) -> Self {
        self.kubeconfig = kubeconfig.into();
        self
    }
}
