use clap::Parser;
use errorly::cli::commands::{self, CommandContext};
use errorly::cli::{Cli, Commands};
use errorly::config::{self, CliOverrides};
use errorly::logging::init_logging;
use errorly::model::User;
use errorly::ErrorlyError;
use serde_json::json;

fn main() {
    let cli = Cli::parse();

    let overrides = build_cli_overrides(&cli);
    let config = match config::load_config(&overrides) {
        Ok(config) => config,
        Err(e) => handle_error(&e, cli.json),
    };

    if let Err(e) = init_logging(
        cli.verbose,
        cli.quiet,
        config.logging.json,
        &config.logging.level,
    ) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let actor = User::new(cli.as_user, cli.user_name.clone());
    let ctx = CommandContext::new(config, cli.json, actor);

    let result = match &cli.command {
        Commands::Init => commands::init::execute(&ctx),
        Commands::Id { command } => commands::id::execute(command, &ctx),
        Commands::Project { command } => commands::project::execute(command, &ctx),
        Commands::Issue { command } => commands::issue::execute(command, &ctx),
        Commands::Search(args) => commands::search::execute(args, &ctx),
        Commands::Webhook { command } => commands::webhook::execute(command, &ctx),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Print the error to stderr, as JSON with `--json`, and exit.
fn handle_error(err: &ErrorlyError, json_mode: bool) -> ! {
    if json_mode {
        let body = json!({
            "error": err.to_string(),
            "suggestion": err.suggestion(),
            "recoverable": err.is_user_recoverable(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        );
    } else {
        eprintln!("Error: {err}");
        if let Some(hint) = err.suggestion() {
            eprintln!("Hint: {hint}");
        }
    }

    std::process::exit(err.exit_code());
}

fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        config: cli.config.clone(),
        db: cli.db.clone(),
        url: cli.url.clone(),
        shard: cli.shard,
    }
}
