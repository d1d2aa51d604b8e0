//! Colored console output for command results.

use crate::types::{Repository, ValidationResult};
use colored::Colorize;
use serde::Serialize;

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    json_mode: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(json_mode: bool) -> Self {
        Self { json_mode }
    }

    /// Print a value as pretty JSON.
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        let json = serde_json::to_string_pretty(value).unwrap_or_default();
        println!("{}", json);
    }

    /// Print a success message.
    pub fn print_ok(&self, message: &str) {
        if self.json_mode {
            self.print_json(&serde_json::json!({ "ok": true, "message": message }));
            return;
        }

        println!("{} {}", "[+]".bright_green(), message);
    }

    /// Print an error message to stderr.
    pub fn print_error(&self, message: &str) {
        if self.json_mode {
            self.print_json(&serde_json::json!({ "ok": false, "error": message }));
            return;
        }

        eprintln!("{} {}", "[!]".bright_red(), message);
    }

    pub fn print_validation(&self, result: &ValidationResult) {
        if self.json_mode {
            self.print_json(result);
            return;
        }

        if result.succeeded() {
            println!("{} config is valid", "[+]".bright_green());
            let output = result.output().trim_end();
            if !output.is_empty() {
                println!("{}", output.dimmed());
            }
        } else {
            println!("{} {}", "[-]".bright_red(), result.output().trim_end().red());
        }
    }

    pub fn print_members(&self, team: &str, members: &[String]) {
        if self.json_mode {
            self.print_json(members);
            return;
        }

        println!(
            "{} Team {} ({} members)",
            "[*]".bright_blue(),
            team.bright_white().bold(),
            members.len()
        );
        let mut sorted: Vec<&String> = members.iter().collect();
        sorted.sort();
        for member in sorted {
            println!("    {}", member);
        }
    }

    pub fn print_user_exists(&self, user: &str, exists: bool) {
        if self.json_mode {
            self.print_json(&serde_json::json!({ "user": user, "exists": exists }));
            return;
        }

        if exists {
            println!("{} {} exists", "[+]".bright_green(), user.bright_white());
        } else {
            println!("{} {} not found", "[-]".bright_red(), user.bright_white());
        }
    }

    pub fn print_repositories(&self, repositories: &[Repository]) {
        if self.json_mode {
            self.print_json(repositories);
            return;
        }

        println!(
            "{} {} repositories",
            "[*]".bright_blue(),
            repositories.len()
        );
        for repo in repositories {
            println!(
                "    {} {} {}",
                repo.name.as_deref().unwrap_or("?").bright_white(),
                format_visibility(repo.is_public),
                repo.description.as_deref().unwrap_or("").dimmed()
            );
        }
    }

    pub fn print_permission(&self, repo: &str, team: &str, role: Option<&str>) {
        if self.json_mode {
            self.print_json(&serde_json::json!({ "repository": repo, "team": team, "role": role }));
            return;
        }

        match role {
            Some(role) => println!(
                "{} team {} has {} on {}",
                "[*]".bright_blue(),
                team.bright_white(),
                role.bright_yellow().bold(),
                repo
            ),
            None => println!(
                "{} team {} has no permission on {}",
                "[*]".bright_blue(),
                team.bright_white(),
                repo
            ),
        }
    }
}

/// Format repository visibility with color.
fn format_visibility(is_public: Option<bool>) -> colored::ColoredString {
    match is_public {
        Some(true) => "public".yellow(),
        Some(false) => "private".green(),
        None => "unknown".dimmed(),
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_output_creation() {
        let output = ConsoleOutput::new(true);
        assert!(output.json_mode);
        assert!(!ConsoleOutput::default().json_mode);
    }

    #[test]
    fn test_format_visibility() {
        assert!(format_visibility(Some(true)).to_string().contains("public"));
        assert!(format_visibility(Some(false)).to_string().contains("private"));
        assert!(format_visibility(None).to_string().contains("unknown"));
    }
}
