use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use nwa_table::prelude::TableState;

use super::{load_config, TableArgs};

#[derive(Subcommand)]
pub enum QueryCommands {
    /// Print the URL query string for a table state
    Encode {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Print the table state stored in a URL query string
    Decode {
        /// Query string, with or without the leading `?`
        #[arg(value_name = "SEARCH")]
        search: String,
    },
}

pub fn execute(command: QueryCommands, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let default_page_size = config.table.default_page_size;

    match command {
        QueryCommands::Encode { table } => {
            let state = table.to_state(default_page_size)?;
            println!("{}", encode(&state)?);
        }
        QueryCommands::Decode { search } => {
            let state = TableState::from_query_string(&search, default_page_size);
            let json = serde_json::to_string_pretty(&state).context("Failed to serialize table state")?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn encode(state: &TableState) -> Result<String> {
    state
        .to_query_string()
        .context("Table state cannot be written to a query string")
}
