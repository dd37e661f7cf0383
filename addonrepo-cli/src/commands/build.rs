//! Build command - full repository build with optional commit and push.

use clap::Args;
use console::style;
use dialoguer::Confirm;
use tracing::warn;

use addonrepo::config::RepoConfig;
use addonrepo::publisher::{PublishError, PublishReport, Publisher, RunOptions};

use super::output;
use crate::error::CliError;

/// Arguments for the build command.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Pull the repository and its submodules before building
    #[arg(long)]
    pub pull: bool,

    /// Commit the catalog, checksum and addon output directories
    #[arg(long)]
    pub commit: bool,

    /// Push after committing (implies --commit)
    #[arg(long)]
    pub push: bool,

    /// Push without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Commit message [default: from config]
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Run the build command.
pub fn run(config: RepoConfig, args: BuildArgs) -> Result<(), CliError> {
    let message = args
        .message
        .clone()
        .unwrap_or_else(|| config.git.commit_message.clone());
    let publisher = Publisher::from_config(config);

    let mut report = publisher.run(&RunOptions::default().with_pull(args.pull))?;
    output::print_report(&report);

    if !(args.commit || args.push) {
        return Ok(());
    }

    println!();
    match publisher.commit(&mut report, &message) {
        Ok(outcome) => output::print_commit(&outcome),
        Err(e) => return recover(e, "Commit failed"),
    }

    if args.push {
        push(&publisher, &mut report, args.yes)?;
    }

    Ok(())
}

fn push(publisher: &Publisher, report: &mut PublishReport, yes: bool) -> Result<(), CliError> {
    let git = &publisher.config().git;
    if !yes && !confirm_push(&git.remote, &git.branch)? {
        println!("Push cancelled.");
        return Ok(());
    }

    match publisher.push(report) {
        Ok(()) => {
            println!(
                "{} Pushed {} to {}",
                style("✓").green(),
                git.branch,
                git.remote
            );
            Ok(())
        }
        Err(e) => recover(e, "Push failed"),
    }
}

/// Ask before publishing to the remote.
fn confirm_push(remote: &str, branch: &str) -> Result<bool, CliError> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Push {} to {}?", branch, remote))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Fatal errors end the command; anything else is reported and the build
/// still counts as done.
fn recover(error: PublishError, context: &str) -> Result<(), CliError> {
    if error.is_fatal() {
        return Err(error.into());
    }
    warn!("{}: {}", context, error);
    println!("{} {}: {}", style("Error:").red().bold(), context, error);
    Ok(())
}
