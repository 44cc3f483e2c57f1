use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "esg-survey", version, about = "Guided ESG headline survey")]
pub struct Cli {
    #[arg(long, global = true, help = "Path to config.json (default: ~/.esg-survey/config.json)")]
    pub config: Option<PathBuf>,
    #[arg(long, short, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run an interactive survey session in the terminal
    Run {
        #[arg(long, help = "Echo user turns back with the 🧑 prefix")]
        echo: bool,
    },
    /// List the headlines in presentation order
    Topics,
    /// Check that the configured LLM provider is reachable
    Check,
    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    /// Subcommand to execute; `run` when none is given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run { echo: false })
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "esg_survey=debug,esg_survey_llm=debug,warn"
        } else {
            "warn"
        }
    }
}
