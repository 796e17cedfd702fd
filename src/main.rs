use anyhow::Context;
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod diagnostics;
mod dsl;
mod render;
mod task;
mod translate;

use config::{DEFAULT_HOSTS, DEFAULT_KUBECONFIG, DEFAULT_SHELL, PlaybookOptions};
use render::OutputFormat;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "dsl2ansible")]
#[command(about = "Translate a host/cluster state DSL into an Ansible playbook", long_about = None)]
struct Cli {
    /// DSL file describing the desired state.
    dsl_file: PathBuf,

    /// Write the playbook here instead of stdout.
    #[arg(short = 'o', long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,

    /// Host pattern for the generated play.
    #[arg(long, env = "DSL2ANSIBLE_HOSTS", default_value = DEFAULT_HOSTS)]
    hosts: String,

    /// KUBECONFIG used by the Cilium chart install.
    #[arg(long, env = "DSL2ANSIBLE_KUBECONFIG", default_value = DEFAULT_KUBECONFIG)]
    kubeconfig: String,

    /// Executable for `install` shell tasks.
    #[arg(long, env = "DSL2ANSIBLE_SHELL", default_value = DEFAULT_SHELL)]
    shell: String,
}

impl Cli {
    fn playbook_options(&self) -> PlaybookOptions {
        PlaybookOptions::default()
            .with_hosts(&self.hosts)
            .with_kubeconfig(&self.kubeconfig)
            .with_shell(&self.shell)
    }
}

fn main() -> ExitCode {
    diagnostics::init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", diagnostics::error_message(format!("{:#}", err)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // 1) Parse + validate the DSL document.
    tracing::info!(path = %cli.dsl_file.display(), "loading DSL file");
    let config = dsl::load_config(&cli.dsl_file)?;

    // 2) Translate.
    let playbook = translate::translate(&config, &cli.playbook_options());
    tracing::info!(tasks = playbook.tasks().count(), "translated DSL");

    // 3) Render fully before writing anything.
    let rendered = render::render_playbook(&playbook, cli.format)?;

    match &cli.out {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("write playbook {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote playbook");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .context("write playbook to stdout")?;
        }
    }

    Ok(())
}
