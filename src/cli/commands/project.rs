use crate::cli::commands::{CommandContext, require_project};
use crate::cli::{ProjectCommands, ProjectCreateArgs};
use crate::error::{ErrorlyError, Result};
use crate::model::Project;
use crate::storage::ProjectStore;
use tracing::info;

/// Execute the project command.
///
/// # Errors
///
/// Returns an error if the name is blank, the project does not exist, or
/// the database fails.
pub fn execute(command: &ProjectCommands, ctx: &CommandContext) -> Result<()> {
    let storage = ctx.open_storage()?;

    match command {
        ProjectCommands::Create(args) => {
            let project = create(ctx, args)?;
            storage.insert_project(&project)?;
            info!(project_id = %project.id, "Created project");
            ctx.emit(&project, || {
                format!("Created project {}: {}", project.id, project.settings.display_name)
            })
        }
        ProjectCommands::Show { id } => {
            let project = require_project(&storage, *id)?;
            ctx.emit(&project, || render_project(&project))
        }
    }
}

fn create(ctx: &CommandContext, args: &ProjectCreateArgs) -> Result<Project> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(ErrorlyError::validation("name", "cannot be empty"));
    }

    let generator = ctx.config.id_generator()?;
    let mut project = Project::new(generator.next(), name, ctx.actor.id);
    project.settings.description.clone_from(&args.description);
    project.settings.url.clone_from(&args.url);
    project.settings.contributor_ids.clone_from(&args.contributors);
    Ok(project)
}

fn render_project(project: &Project) -> String {
    let settings = &project.settings;
    let mut out = format!("{} ({})\n", settings.display_name, project.id);
    if !settings.description.is_empty() {
        out.push_str(&format!("  {}\n", settings.description));
    }
    if settings.archived {
        out.push_str("  archived\n");
    }
    out.push_str(&format!(
        "  active: {}  open: {}  resolved: {}  starred: {}",
        project.active_issues, project.open_issues, project.resolved_issues, project.starred_issues
    ));
    out
}
