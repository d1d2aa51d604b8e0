//! quaykit - Quay organization management and Alertmanager config checks.
//!
//! This library provides two independent helpers:
//! - A client for the Quay API managing team and organization membership,
//!   repositories, visibility and team permissions
//! - A checker that validates Alertmanager configuration text with `amtool`
//!
//! # Example
//!
//! ```no_run
//! use quaykit::QuayClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = QuayClient::new("token", "acme", None).unwrap();
//!     let members = client.list_team_members("owners", false).await.unwrap();
//!     println!("owners: {:?}", members);
//!
//!     let result = quaykit::validate::check_config("route:\n  receiver: x\n").await;
//!     println!("config valid: {}", result.succeeded());
//! }
//! ```

pub mod config;
pub mod output;
pub mod registry;
pub mod types;
pub mod validate;

pub use config::{Commands, Config};
pub use registry::{MemberCache, QuayClient};
pub use types::{ProcessError, QuayError, Repository, Result, Role, ValidationResult, Visibility};
pub use validate::ConfigChecker;
