use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::{Engine, SnapshotSource};
use crate::error::DocweaverError;

/// Process exit status for requests the caller has to fix
pub const EXIT_CLIENT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "docweaver")]
#[command(about = "Chunked, context-carrying documentation generation for whole repositories")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Session user id (defaults to $USER)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Generate documentation for a repository
    #[command(group(ArgGroup::new("input").required(true).args(["source", "snapshot"])))]
    Generate {
        /// Local repository directory to walk
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Serialized repository snapshot (JSON)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Repository name for the session (defaults to the source name)
        #[arg(short, long)]
        repo: Option<String>,

        /// Write documentation here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the refinement pass
        #[arg(long)]
        no_refine: bool,
    },

    /// Continue the stored documentation from where it left off
    Continue {
        /// Repository name of the session
        #[arg(short, long)]
        repo: String,

        /// Write documentation here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a change request to the stored documentation
    Modify {
        /// Repository name of the session
        #[arg(short, long)]
        repo: String,

        /// The requested change
        #[arg(short, long)]
        instruction: String,

        /// Write documentation here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Route free-form input: content to document, `continue`, or a change request
    Ask {
        /// Repository name of the session
        #[arg(short, long)]
        repo: String,

        /// Read the request from this file (`-` or omitted reads stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write documentation here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Forget the stored documentation for a repository
    Reset {
        /// Repository name of the session
        #[arg(short, long)]
        repo: String,
    },

    /// Show the chunk plan without calling the generation service
    #[command(group(ArgGroup::new("input").required(true).args(["source", "snapshot"])))]
    Plan {
        /// Local repository directory to walk
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Serialized repository snapshot (JSON)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

impl Cli {
    /// Session user: `--user`, then `$USER`, then `local`
    pub fn user_id(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "local".to_string())
    }

    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path } => {
                engine.init(path).await
            }
            Commands::Generate { source, snapshot, repo, output, no_refine } => {
                let source = SnapshotSource::from_args(source, snapshot)?;
                engine.generate(source, repo, output, no_refine).await
            }
            Commands::Continue { repo, output } => {
                engine.continue_docs(repo, output).await
            }
            Commands::Modify { repo, instruction, output } => {
                engine.modify(repo, instruction, output).await
            }
            Commands::Ask { repo, input, output } => {
                engine.ask(repo, input, output).await
            }
            Commands::Reset { repo } => {
                engine.reset(repo).await
            }
            Commands::Plan { source, snapshot } => {
                let source = SnapshotSource::from_args(source, snapshot)?;
                engine.plan(source).await
            }
        }
    }
}

/// Exit status for a failed command: caller-fixable errors get their own code
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DocweaverError>() {
        Some(e) if e.is_client_error() => EXIT_CLIENT_ERROR,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_requires_an_input() {
        assert!(Cli::try_parse_from(["docweaver", "generate"]).is_err());
        assert!(Cli::try_parse_from(["docweaver", "generate", "--source", "a", "--snapshot", "b"]).is_err());
        assert!(Cli::try_parse_from(["docweaver", "generate", "--snapshot", "dump.json"]).is_ok());
    }

    #[test]
    fn test_explicit_user_wins() {
        let cli = Cli::try_parse_from(["docweaver", "--user", "alice", "continue", "--repo", "shop"]).unwrap();
        assert_eq!(cli.user_id(), "alice");
        assert!(matches!(cli.command, Commands::Continue { ref repo, .. } if repo == "shop"));
    }

    #[test]
    fn test_modify_arguments() {
        let cli = Cli::try_parse_from([
            "docweaver", "modify", "--repo", "shop", "--instruction", "Add a FAQ", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Modify { ref instruction, .. } if instruction == "Add a FAQ"));
    }

    #[test]
    fn test_ask_reads_stdin_by_default() {
        let cli = Cli::try_parse_from(["docweaver", "ask", "--repo", "shop"]).unwrap();
        assert!(matches!(cli.command, Commands::Ask { input: None, output: None, .. }));

        let cli = Cli::try_parse_from(["docweaver", "ask", "-r", "shop", "-i", "-"]).unwrap();
        assert!(matches!(cli.command, Commands::Ask { input: Some(ref p), .. } if p.as_os_str() == "-"));
    }

    #[test]
    fn test_reset_requires_repo() {
        assert!(Cli::try_parse_from(["docweaver", "reset"]).is_err());
        let cli = Cli::try_parse_from(["docweaver", "reset", "--repo", "shop"]).unwrap();
        assert!(matches!(cli.command, Commands::Reset { ref repo } if repo == "shop"));
    }

    #[test]
    fn test_client_errors_get_distinct_exit_code() {
        let missing = anyhow::Error::new(DocweaverError::MissingPriorDocument {
            session: "alice/shop".to_string(),
        });
        assert_eq!(exit_code(&missing), EXIT_CLIENT_ERROR);

        let invalid = anyhow::Error::new(DocweaverError::InvalidInput("empty request".to_string()))
            .context("ask failed");
        assert_eq!(exit_code(&invalid), EXIT_CLIENT_ERROR);

        let upstream = anyhow::Error::new(DocweaverError::Generation("503".to_string()));
        assert_eq!(exit_code(&upstream), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("io")), 1);
    }
}
