use crate::cli::SearchArgs;
use crate::cli::commands::{CommandContext, require_project};
use crate::error::Result;
use crate::model::Issue;
use crate::search::{IssueSearchEngine, SearchPage};
use crate::util::truncate_chars;

const ERROR_COLUMN_CHARS: usize = 60;

/// Execute the search command.
///
/// # Errors
///
/// Returns an error if the project does not exist or the query fails.
pub fn execute(args: &SearchArgs, ctx: &CommandContext) -> Result<()> {
    let storage = ctx.open_storage()?;
    require_project(&storage, args.project)?;

    let page = IssueSearchEngine::new(&storage).search(
        args.project,
        &args.query,
        args.page,
        ctx.actor.id,
    )?;
    ctx.emit(&page, || render_page(&page))
}

fn render_page(page: &SearchPage) -> String {
    if page.issues.is_empty() {
        return format!("No issues found ({} total)", page.total);
    }

    let mut lines: Vec<String> = page.issues.iter().map(render_row).collect();
    let shown_from = usize::try_from(page.page.max(0))
        .unwrap_or(usize::MAX)
        .saturating_mul(page.page_size);
    lines.push(format!(
        "{}-{} of {}{}",
        shown_from.saturating_add(1),
        shown_from.saturating_add(page.issues.len()),
        page.total,
        if page.is_last_page() { "" } else { " (more: --page)" }
    ));
    lines.join("\n")
}

fn render_row(issue: &Issue) -> String {
    let star = if issue.starred { "*" } else { " " };
    format!(
        "{star} {:<20} {:<8} x{:<5} {} in {}",
        issue.id,
        issue.issue_type.as_str(),
        issue.occurrences,
        truncate_chars(&issue.error, ERROR_COLUMN_CHARS),
        issue.function
    )
}
