//! Subcommand dispatch against a table accessor.

use anyhow::{Context, Result};
use clap::Subcommand;
use salon_core::{
  Accessor, Record, RecordId, actor::ActorProvider, local::LocalStore, remote::RemoteStore,
  valid_table_name,
};
use serde_json::Value;

// ─── Commands ─────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Print every record of a table, newest first.
  List { table: String },

  /// Insert a record given as a JSON object.
  Insert { table: String, json: String },

  /// Merge the fields of a JSON object into an existing record.
  Update { table: String, id: String, json: String },

  /// Delete a record.
  Remove { table: String, id: String },

  /// Load a table and report whether it is served remotely or on-device.
  Status { table: String },

  /// List tables that have an on-device copy.
  Tables,
}

impl Command {
  fn table(&self) -> Option<&str> {
    match self {
      Self::List { table }
      | Self::Insert { table, .. }
      | Self::Update { table, .. }
      | Self::Remove { table, .. }
      | Self::Status { table } => Some(table),
      Self::Tables => None,
    }
  }
}

fn parse_fields(json: &str) -> Result<Record> {
  serde_json::from_str(json).with_context(|| format!("expected a JSON object, got {json:?}"))
}

/// Run one table command and return its JSON output.
///
/// `Command::Tables` reads the on-device store directly and is handled by
/// the caller.
pub async fn run<R, L, A>(accessor: &Accessor<R, L, A>, command: Command) -> Result<Value>
where
  R: RemoteStore,
  L: LocalStore,
  A: ActorProvider,
{
  if let Some(table) = command.table()
    && !valid_table_name(table)
  {
    anyhow::bail!("invalid table name {table:?}: use letters, digits and underscores");
  }

  let output = match command {
    Command::List { table } => serde_json::to_value(accessor.table(table).list().await)?,

    Command::Insert { table, json } => {
      let fields = parse_fields(&json)?;
      let record = accessor.table(table.as_str()).insert(fields).await?;
      serde_json::to_value(record)?
    }

    Command::Update { table, id, json } => {
      let fields = parse_fields(&json)?;
      let handle = accessor.table(table.as_str());
      // Resolve fallback mode before writing.
      handle.list().await;
      let id = RecordId::from(id);
      let record = handle
        .update(&id, fields)
        .await?
        .with_context(|| format!("no record {id} in {table}"))?;
      serde_json::to_value(record)?
    }

    Command::Remove { table, id } => {
      let handle = accessor.table(table.as_str());
      handle.list().await;
      handle
        .remove(&RecordId::from(id.as_str()))
        .await
        .with_context(|| format!("failed to remove {id} from {table}"))?;
      Value::Null
    }

    Command::Status { table } => {
      let handle = accessor.table(table);
      handle.list().await;
      serde_json::to_value(handle.status())?
    }

    Command::Tables => anyhow::bail!("`tables` reads the on-device store directly"),
  };
  Ok(output)
}
