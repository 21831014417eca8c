use crate::cli::commands::{CommandContext, delivery_summary, require_project};
use crate::cli::{IssueCommands, IssueRef, ReportArgs};
use crate::error::Result;
use crate::model::{Issue, Project, User};
use crate::service::{IssueService, ReportRequest};
use crate::storage::SqliteStorage;
use crate::webhook::{DeliveryReport, WebhookEvent};
use serde::Serialize;

#[derive(Serialize)]
struct ActionOutput<'a> {
    issue: &'a Issue,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhooks: Option<DeliveryReport>,
}

/// Execute an issue subcommand.
///
/// # Errors
///
/// Returns an error if the project or issue is missing, the action is
/// rejected, or the database fails.
pub fn execute(command: &IssueCommands, ctx: &CommandContext) -> Result<()> {
    let storage = ctx.open_storage()?;
    let ids = ctx.config.id_generator()?;
    let service = IssueService::new(&storage, &ids);
    let actor = &ctx.actor;

    match command {
        IssueCommands::Report(args) => report(ctx, &storage, &service, args),
        IssueCommands::Star(target) | IssueCommands::Unstar(target) => {
            let starred = matches!(command, IssueCommands::Star(_));
            let (mut project, mut issue) = load(&service, target)?;
            let event = service.star(&mut project, &mut issue, starred, actor)?;
            let verb = if starred { "Starred" } else { "Unstarred" };
            finish(ctx, &storage, &project, &issue, &event, verb)
        }
        IssueCommands::Lock(target) | IssueCommands::Unlock(target) => {
            let locked = matches!(command, IssueCommands::Lock(_));
            let (project, mut issue) = load(&service, target)?;
            let event = service.lock_comments(&mut issue, locked, actor)?;
            let verb = if locked {
                "Locked comments on"
            } else {
                "Unlocked comments on"
            };
            finish(ctx, &storage, &project, &issue, &event, verb)
        }
        IssueCommands::Assign(args) => {
            let (project, mut issue) = load(&service, &args.target)?;
            let assignee = args.to.map(|id| User::new(id, args.name.clone()));
            let event = service.assign(&mut issue, assignee, actor)?;
            let verb = if issue.assignee_id.is_none() {
                "Cleared assignee of".to_string()
            } else {
                format!("Assigned {} to", issue.assignee_id)
            };
            finish(ctx, &storage, &project, &issue, &event, &verb)
        }
        IssueCommands::Mark { target, issue_type } => {
            let (mut project, mut issue) = load(&service, target)?;
            let event = service.mark_status(&mut project, &mut issue, *issue_type, actor)?;
            let verb = format!("Marked {issue_type}:");
            finish(ctx, &storage, &project, &issue, &event, &verb)
        }
        IssueCommands::Comment { target, text } => {
            let (project, mut issue) = load(&service, target)?;
            let (_, event) = service.comment(&project, &mut issue, text, actor)?;
            finish(ctx, &storage, &project, &issue, &event, "Commented on")
        }
    }
}

fn load(service: &IssueService<'_, SqliteStorage>, target: &IssueRef) -> Result<(Project, Issue)> {
    service.load(target.project, target.issue)
}

fn report(
    ctx: &CommandContext,
    storage: &SqliteStorage,
    service: &IssueService<'_, SqliteStorage>,
    args: &ReportArgs,
) -> Result<()> {
    let mut project = require_project(storage, args.project)?;
    let request = ReportRequest {
        error: args.error.clone(),
        function: args.function.clone(),
        checkpoint: args.checkpoint.clone(),
        description: args.description.clone(),
        traceback: args.traceback.clone(),
        assignee_id: args.assign.unwrap_or_default(),
        lock_comments: args.lock,
    };
    let outcome = service.report(&mut project, request, &ctx.actor)?;

    let webhooks = match &outcome.event {
        Some(event) => Some(ctx.notify(storage, &project, event)?),
        None => None,
    };

    let output = ActionOutput {
        issue: &outcome.issue,
        created: Some(outcome.created),
        webhooks,
    };
    ctx.emit(&output, || {
        let issue = &outcome.issue;
        let mut text = if outcome.created {
            format!("Opened issue {}: {}", issue.id, issue.error)
        } else {
            format!(
                "Issue {} now has {} occurrences",
                issue.id, issue.occurrences
            )
        };
        if let Some(report) = &webhooks {
            text.push('\n');
            text.push_str(&delivery_summary(report));
        }
        text
    })
}

fn finish(
    ctx: &CommandContext,
    storage: &SqliteStorage,
    project: &Project,
    issue: &Issue,
    event: &WebhookEvent,
    verb: &str,
) -> Result<()> {
    let report = ctx.notify(storage, project, event)?;
    let output = ActionOutput {
        issue,
        created: None,
        webhooks: Some(report),
    };
    ctx.emit(&output, || {
        format!(
            "{verb} issue {}\n{}",
            issue.id,
            delivery_summary(&report)
        )
    })
}
