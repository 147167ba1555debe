//! CLI argument definitions using clap
//!
//! Commands:
//! - registrar init
//! - registrar students <list|get|create|edit|delete>
//! - registrar teachers <list|get|create|edit|delete>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// registrar - student and teacher records console
#[derive(Parser, Debug)]
#[command(name = "registrar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./registrar.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the data directory and empty collections
    Init,

    /// Administer student records
    Students {
        #[command(subcommand)]
        action: EntityAction,
    },

    /// Administer teacher records
    Teachers {
        #[command(subcommand)]
        action: EntityAction,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Students { .. } => "students",
            Command::Teachers { .. } => "teachers",
        }
    }
}

/// Operations available on every collection
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum EntityAction {
    /// Print every row
    List,

    /// Print one row, or null if it does not exist
    Get { id: String },

    /// Create a row from a JSON object read on stdin
    Create,

    /// Replace a row's fields; stdin fields overlay the stored ones
    Edit { id: String },

    /// Delete a row
    Delete {
        id: String,

        /// Confirm the delete; without it nothing is removed
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete_with_confirmation() {
        let cli = Cli::try_parse_from([
            "registrar",
            "teachers",
            "delete",
            "4b8f2c3e-0c6c-4f55-9d55-1c2a1b7e9a10",
            "--yes",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("./registrar.json"));
        assert_eq!(
            cli.command,
            Command::Teachers {
                action: EntityAction::Delete {
                    id: "4b8f2c3e-0c6c-4f55-9d55-1c2a1b7e9a10".into(),
                    yes: true,
                }
            }
        );
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["registrar", "students", "list", "--config", "/tmp/r.json"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/r.json"));
        assert_eq!(cli.command.name(), "students");
    }

    #[test]
    fn test_edit_requires_id() {
        assert!(Cli::try_parse_from(["registrar", "students", "edit"]).is_err());
    }
}
