//! quaykit - Quay organization management and Alertmanager config checks.
//!
//! CLI entry point.

use clap::Parser;
use quaykit::output::ConsoleOutput;
use quaykit::{Commands, Config, ConfigChecker, QuayClient, Result};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("quaykit=debug,info")
    } else {
        EnvFilter::new("quaykit=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let console = ConsoleOutput::new(config.json);

    match config.command.clone() {
        Commands::CheckConfig { file, tool } => run_check_config(&file, &tool, &console).await,
        command => {
            let client = match config.quay_client() {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to create Quay client: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            debug!("Using {} for org {}", client.api_url(), client.organization());

            match run_registry(command, &client, &console).await {
                Ok(code) => code,
                Err(e) => {
                    console.print_error(&e.to_string());
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run_check_config(file: &std::path::Path, tool: &str, console: &ConsoleOutput) -> ExitCode {
    let text = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to read {:?}: {}", file, e);
            return ExitCode::FAILURE;
        }
    };

    let result = ConfigChecker::new(tool).check_config(&text).await;
    console.print_validation(&result);

    if result.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_registry(command: Commands, client: &QuayClient, console: &ConsoleOutput) -> Result<ExitCode> {
    match command {
        Commands::CheckConfig { .. } => unreachable!("check-config is dispatched in main"),
        Commands::Members { team, cached } => {
            let members = client.list_team_members(&team, cached).await?;
            console.print_members(&team, &members);
        }
        Commands::UserExists { user } => {
            let exists = client.user_exists(&user).await?;
            console.print_user_exists(&user, exists);
            if !exists {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::AddUser { user, team } => {
            client.add_user_to_team(&user, &team).await?;
            console.print_ok(&format!("{} is a member of {}", user, team));
        }
        Commands::RemoveUser { user, team } => {
            client.remove_user_from_team(&user, &team).await?;
            console.print_ok(&format!(
                "{} removed from {} and {}",
                user,
                team,
                client.organization()
            ));
        }
        Commands::ListRepos => {
            let repositories = client.list_images().await?;
            console.print_repositories(&repositories);
        }
        Commands::CreateRepo {
            name,
            description,
            public,
        } => {
            client.create_repo(&name, &description, public).await?;
            console.print_ok(&format!("created {}/{}", client.organization(), name));
        }
        Commands::DeleteRepo { name } => {
            client.delete_repo(&name).await?;
            console.print_ok(&format!("deleted {}/{}", client.organization(), name));
        }
        Commands::DescribeRepo { name, description } => {
            client.update_repo_description(&name, &description).await?;
            console.print_ok(&format!("updated description of {}", name));
        }
        Commands::MakePublic { name } => {
            client.make_public(&name).await?;
            console.print_ok(&format!("{} is now public", name));
        }
        Commands::MakePrivate { name } => {
            client.make_private(&name).await?;
            console.print_ok(&format!("{} is now private", name));
        }
        Commands::GetPermission { repo, team } => {
            let role = client.get_repo_team_permission(&repo, &team).await?;
            console.print_permission(&repo, &team, role.as_deref());
        }
        Commands::SetPermission { repo, team, role } => {
            client.set_repo_team_permission(&repo, &team, &role).await?;
            console.print_ok(&format!("team {} has {} on {}", team, role, repo));
        }
    }

    Ok(ExitCode::SUCCESS)
}
