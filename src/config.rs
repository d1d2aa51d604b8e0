//! Command-line configuration.

use crate::registry::quay::DEFAULT_TIMEOUT_SECS;
use crate::registry::QuayClient;
use crate::types::{QuayError, Result};
use crate::validate::amtool::DEFAULT_TOOL;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quay organization management and Alertmanager config checks.
#[derive(Parser, Debug, Clone)]
#[command(name = "quaykit")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quay API bearer token
    #[arg(long, env = "QUAY_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Organization to manage
    #[arg(long, env = "QUAY_ORG", global = true)]
    pub org: Option<String>,

    /// Registry host (defaults to quay.io)
    #[arg(long, env = "QUAY_HOST", global = true)]
    pub host: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Validate an Alertmanager config file with amtool
    CheckConfig {
        /// Config file to validate
        file: PathBuf,

        /// Validator binary
        #[arg(long, default_value = DEFAULT_TOOL)]
        tool: String,
    },
    /// List the members of a team
    Members {
        team: String,

        /// Reuse a cached member list when one exists
        #[arg(long)]
        cached: bool,
    },
    /// Check whether a user account exists
    UserExists { user: String },
    /// Add a user to a team
    AddUser { user: String, team: String },
    /// Remove a user from a team and from the organization
    RemoveUser { user: String, team: String },
    /// List all repositories of the organization
    ListRepos,
    /// Create an image repository
    CreateRepo {
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Make the repository public
        #[arg(long)]
        public: bool,
    },
    /// Delete a repository
    DeleteRepo { name: String },
    /// Replace a repository description
    DescribeRepo { name: String, description: String },
    /// Make a repository public
    MakePublic { name: String },
    /// Make a repository private
    MakePrivate { name: String },
    /// Show the role a team has on a repository
    GetPermission { repo: String, team: String },
    /// Grant a role on a repository to a team
    SetPermission {
        repo: String,
        team: String,
        role: String,
    },
}

impl Config {
    /// Build a registry client from the global options.
    pub fn quay_client(&self) -> Result<QuayClient> {
        let token = self.token.as_deref().ok_or_else(|| {
            QuayError::ConfigError("no token given (use --token or QUAY_TOKEN)".to_string())
        })?;
        let org = self.org.as_deref().ok_or_else(|| {
            QuayError::ConfigError("no organization given (use --org or QUAY_ORG)".to_string())
        })?;

        QuayClient::new(token, org, self.host.as_deref())?.with_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_config() {
        let config = Config::parse_from(["quaykit", "check-config", "alertmanager.yml"]);
        match config.command {
            Commands::CheckConfig { file, tool } => {
                assert_eq!(file, PathBuf::from("alertmanager.yml"));
                assert_eq!(tool, "amtool");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_options_after_subcommand() {
        let config = Config::parse_from([
            "quaykit",
            "set-permission",
            "api",
            "blue",
            "write",
            "--token",
            "secret",
            "--org",
            "acme",
            "--host",
            "quay.example.com",
        ]);

        assert_eq!(config.org.as_deref(), Some("acme"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        let client = config.quay_client().unwrap();
        assert_eq!(client.api_url(), "https://quay.example.com/api/v1");
        assert!(matches!(
            config.command,
            Commands::SetPermission { ref role, .. } if role == "write"
        ));
    }

    #[test]
    fn test_quay_client_requires_token() {
        let mut config = Config::parse_from(["quaykit", "list-repos", "--org", "acme"]);
        config.token = None;
        assert!(matches!(
            config.quay_client(),
            Err(QuayError::ConfigError(_))
        ));
    }
}
