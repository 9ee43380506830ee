//! lambda-pack - deployment archive builder for pipenv-managed lambdas.
//!
//! Rebuilds the project's virtualenv from its lock file, packages the
//! installed libraries plus the router module and config file into a zip,
//! and strips packaging metadata to keep the artifact small.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lambda_pack::commands;
use lambda_pack::config::PackConfig;

#[derive(Parser)]
#[command(name = "lambda-pack")]
#[command(about = "Lambda deployment archive builder")]
#[command(
    after_help = "QUICK START:\n  lambda-pack preflight  Check tools and project files\n  lambda-pack package    Build the deployment zip\n  lambda-pack show config  Print effective configuration\n  lambda-pack clean      Remove packaging outputs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the deployment archive in the current directory
    Package {
        /// Skip post-build archive verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Run preflight checks (tools on PATH, project files present)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },

    /// Clean packaging outputs (default: archive + sidecars)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Remove the archive and its sidecars
    Archive,
    /// Remove the project's virtualenv
    Env,
    /// Remove everything (archive + virtualenv)
    All,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show effective configuration
    Config,
    /// List the built archive's contents
    Archive,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = std::env::current_dir().context("Failed to resolve working directory")?;

    // Load .env from the project directory if present.
    dotenvy::from_path(project_dir.join(".env")).ok();
    let config = PackConfig::load();

    match cli.command {
        Commands::Package { no_verify } => {
            commands::cmd_package(&project_dir, &config, !no_verify)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&project_dir, &config, strict)?;
        }

        Commands::Clean { what } => {
            let target = match what {
                None | Some(CleanTarget::Archive) => commands::CleanTarget::Archive,
                Some(CleanTarget::Env) => commands::CleanTarget::Environment,
                Some(CleanTarget::All) => commands::CleanTarget::All,
            };
            commands::cmd_clean(&project_dir, &config, target)?;
        }

        Commands::Show { what } => {
            let target = match what {
                ShowTarget::Config => commands::ShowTarget::Config,
                ShowTarget::Archive => commands::ShowTarget::Archive,
            };
            commands::cmd_show(&project_dir, &config, target)?;
        }
    }

    Ok(())
}
