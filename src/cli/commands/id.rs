use crate::cli::IdCommands;
use crate::cli::commands::CommandContext;
use crate::error::Result;
use crate::util::id::{Id, IdGenerator, decode};
use crate::util::time::format_timestamp;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct DecodedId {
    id: Id,
    timestamp_ms: i64,
    shard_id: u16,
    sequence: u16,
    created_at: Option<String>,
}

impl DecodedId {
    fn new(generator: &IdGenerator, id: Id) -> Self {
        let parts = decode(id);
        Self {
            id,
            timestamp_ms: parts.timestamp_ms,
            shard_id: parts.shard_id,
            sequence: parts.sequence,
            created_at: generator.created_at(id).map(|dt| format_timestamp(&dt)),
        }
    }
}

/// Execute the id command.
///
/// # Errors
///
/// Returns an error if the configured shard is invalid.
pub fn execute(command: &IdCommands, ctx: &CommandContext) -> Result<()> {
    let generator = ctx.config.id_generator()?;

    match command {
        IdCommands::Next { count } => {
            let ids: Vec<Id> = (0..*count).map(|_| generator.next()).collect();
            let decoded: Vec<DecodedId> =
                ids.iter().map(|id| DecodedId::new(&generator, *id)).collect();
            ctx.emit(&decoded, || {
                ids.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        IdCommands::Decode { id } => {
            let decoded = DecodedId::new(&generator, *id);
            ctx.emit(&decoded, || {
                format!(
                    "id:        {}\ncreated:   {}\ntimestamp: {} ms since epoch\nshard:     {}\nsequence:  {}",
                    decoded.id,
                    decoded.created_at.as_deref().unwrap_or("-"),
                    decoded.timestamp_ms,
                    decoded.shard_id,
                    decoded.sequence
                )
            })
        }
    }
}
