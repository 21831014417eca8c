use crate::cli::commands::CommandContext;
use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use serde_json::json;
use std::fs;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the parent directory or database cannot be created.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let path = &ctx.config.database;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    // Opening applies the schema
    ctx.open_storage()?;

    ctx.emit(
        &json!({
            "database": path.display().to_string(),
            "schema_version": CURRENT_SCHEMA_VERSION,
        }),
        || format!("Initialized database at {}", path.display()),
    )
}
