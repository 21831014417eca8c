use crate::cli::commands::{CommandContext, delivery_summary, require_project};
use crate::cli::{WebhookAddArgs, WebhookCommands};
use crate::error::{ErrorlyError, Result};
use crate::model::{PayloadKind, Webhook};
use crate::storage::{SqliteStorage, WebhookStore};
use crate::webhook::WebhookEvent;
use tracing::info;

/// Execute the webhook command.
///
/// # Errors
///
/// Returns an error if the project or webhook is missing, the URL is not
/// http(s), or the database fails.
pub fn execute(command: &WebhookCommands, ctx: &CommandContext) -> Result<()> {
    let storage = ctx.open_storage()?;

    match command {
        WebhookCommands::Add(args) => add(ctx, &storage, args),
        WebhookCommands::List { project } => {
            require_project(&storage, *project)?;
            let hooks = storage.webhooks_for_project(*project)?;
            ctx.emit(&hooks, || {
                if hooks.is_empty() {
                    return "No webhooks".to_string();
                }
                hooks.iter().map(render_row).collect::<Vec<_>>().join("\n")
            })
        }
        WebhookCommands::Enable { id } => {
            let mut hook = storage
                .find_webhook(*id)?
                .ok_or(ErrorlyError::WebhookNotFound { id: *id })?;
            // Failures are kept so a still-broken endpoint trips again on the next failure.
            hook.active = true;
            storage.update_webhook(&hook)?;
            info!(webhook_id = %hook.id, "Re-enabled webhook");
            ctx.emit(&hook, || format!("Enabled webhook {}", hook.id))
        }
        WebhookCommands::Test { project } => {
            let project = require_project(&storage, *project)?;
            let report = ctx.notify(&storage, &project, &WebhookEvent::TestWebhook)?;
            ctx.emit(&report, || delivery_summary(&report))
        }
    }
}

fn add(ctx: &CommandContext, storage: &SqliteStorage, args: &WebhookAddArgs) -> Result<()> {
    require_project(storage, args.project)?;
    let url = args.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ErrorlyError::validation("url", "must start with http:// or https://"));
    }

    let kind = if args.platform {
        PayloadKind::PlatformFormatted
    } else {
        PayloadKind::Generic
    };
    let generator = ctx.config.id_generator()?;
    let mut hook = Webhook::new(generator.next(), args.project, url, kind);
    hook.secret.clone_from(&args.secret);
    hook.created_by_id = ctx.actor.id;
    storage.insert_webhook(&hook)?;
    info!(webhook_id = %hook.id, project_id = %hook.project_id, "Added webhook");

    ctx.emit(&hook, || format!("Added webhook {} -> {}", hook.id, hook.url))
}

fn render_row(hook: &Webhook) -> String {
    let state = if hook.active { "active" } else { "disabled" };
    let kind = match hook.payload_kind {
        PayloadKind::Generic => "generic",
        PayloadKind::PlatformFormatted => "platform",
    };
    let signed = if hook.secret.is_empty() { "" } else { " signed" };
    format!(
        "{} {:<8} {:<8} failures={}{} {}",
        hook.id, state, kind, hook.failure_count, signed, hook.url
    )
}
