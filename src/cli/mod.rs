//! CLI definitions and entry point.

use crate::model::IssueType;
use crate::util::id::Id;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Error tracker core: ids, issue search, webhook delivery
#[derive(Parser, Debug)]
#[command(name = "errorly", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./errorly.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Base URL for links in webhook messages
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Id generator shard (0-8191)
    ///
    /// Every process starts its id sequence at 0, so errorly processes that
    /// write to the same database at the same time need distinct shards.
    #[arg(long, global = true)]
    pub shard: Option<u16>,

    /// Acting user id (0 = anonymous)
    #[arg(long = "as", global = true, env = "ERRORLY_USER", default_value = "0")]
    pub as_user: Id,

    /// Acting user display name, shown in webhook messages
    #[arg(long, global = true, default_value = "errorly")]
    pub user_name: String,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the database
    Init,

    /// Generate and inspect ids
    Id {
        #[command(subcommand)]
        command: IdCommands,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Report issues and act on them
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },

    /// Search a project's issues
    Search(SearchArgs),

    /// Manage webhooks
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum IdCommands {
    /// Issue new ids
    Next {
        /// How many ids to issue
        #[arg(long, short = 'n', default_value_t = 1)]
        count: usize,
    },
    /// Split an id into time, shard and sequence
    Decode {
        id: Id,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project owned by the acting user
    Create(ProjectCreateArgs),
    /// Show a project and its counters
    Show {
        id: Id,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectCreateArgs {
    /// Display name
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Project homepage
    #[arg(long, default_value = "")]
    pub url: String,

    /// Contributor user ids (can be repeated)
    #[arg(long = "contributor")]
    pub contributors: Vec<Id>,
}

/// Selects one issue of a project.
#[derive(Args, Debug, Clone)]
pub struct IssueRef {
    pub project: Id,
    pub issue: Id,
}

#[derive(Subcommand, Debug)]
pub enum IssueCommands {
    /// Report an error occurrence (creates or increments an issue)
    Report(ReportArgs),
    /// Star an issue
    Star(IssueRef),
    /// Remove the star from an issue
    Unstar(IssueRef),
    /// Lock comments on an issue
    Lock(IssueRef),
    /// Unlock comments on an issue
    Unlock(IssueRef),
    /// Assign an issue, or clear the assignee without --to
    Assign(AssignArgs),
    /// Change an issue's type
    Mark {
        #[command(flatten)]
        target: IssueRef,
        /// active, open, invalid or resolved
        issue_type: IssueType,
    },
    /// Comment on an issue
    Comment {
        #[command(flatten)]
        target: IssueRef,
        text: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long)]
    pub project: Id,

    /// Error message, e.g. "KeyError: 'guild'"
    #[arg(long)]
    pub error: String,

    /// Function the error was raised in
    #[arg(long)]
    pub function: String,

    #[arg(long, default_value = "")]
    pub checkpoint: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub traceback: String,

    /// Suggested assignee (kept only if a contributor)
    #[arg(long)]
    pub assign: Option<Id>,

    /// Lock comments on the issue
    #[arg(long)]
    pub lock: Option<bool>,
}

#[derive(Args, Debug, Clone)]
pub struct AssignArgs {
    #[command(flatten)]
    pub target: IssueRef,

    /// Assignee user id
    #[arg(long)]
    pub to: Option<Id>,

    /// Assignee display name
    #[arg(long, default_value = "")]
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long)]
    pub project: Id,

    /// Query, e.g. "is:open assignee:@me sort:occurrences-desc"
    #[arg(default_value = "")]
    pub query: String,

    /// Zero-based page
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub page: i64,
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Register a webhook
    Add(WebhookAddArgs),
    /// List a project's webhooks
    List {
        #[arg(long)]
        project: Id,
    },
    /// Re-activate a webhook disabled by failures
    Enable {
        id: Id,
    },
    /// Send a test event to every active webhook of a project
    Test {
        #[arg(long)]
        project: Id,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WebhookAddArgs {
    #[arg(long)]
    pub project: Id,

    #[arg(long)]
    pub url: String,

    /// HMAC secret signing each body
    #[arg(long, default_value = "")]
    pub secret: String,

    /// Send chat-platform formatted messages instead of the event envelope
    #[arg(long)]
    pub platform: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_shard_help_warns_about_concurrent_processes() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("distinct shards"));
    }

    #[test]
    fn test_parse_mark() {
        let cli = Cli::try_parse_from(["errorly", "issue", "mark", "1", "2", "resolved"]).unwrap();
        match cli.command {
            Commands::Issue {
                command: IssueCommands::Mark { target, issue_type },
            } => {
                assert_eq!(target.project, Id(1));
                assert_eq!(target.issue, Id(2));
                assert_eq!(issue_type, IssueType::Resolved);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_with_global_flags() {
        let cli = Cli::try_parse_from([
            "errorly", "search", "--project", "5", "is:open", "--page", "2", "--as", "100",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.as_user, Id(100));
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, "is:open");
        assert_eq!(args.page, 2);
    }
}
