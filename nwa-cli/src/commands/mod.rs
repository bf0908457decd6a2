use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use nwa_table::prelude::{Config, SortOrder, SortRule, TableAction, TableState};

pub mod fetch;
pub mod query;

/// Table state flags shared by `fetch` and `query encode`
#[derive(Debug, Clone, Args)]
pub struct TableArgs {
    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: u64,

    /// Rows per page (defaults to `table.default_page_size`)
    #[arg(long, value_name = "ROWS")]
    pub page_size: Option<u64>,

    /// Sort column, optionally suffixed with `:desc` or `:asc`
    #[arg(long, value_name = "COLUMN[:desc]")]
    pub sort: Vec<String>,

    /// Filter as `id=value1,value2`
    #[arg(long, value_name = "ID=VALUES")]
    pub filter: Vec<String>,
}

impl TableArgs {
    /// Build the table state these flags describe
    pub fn to_state(&self, default_page_size: u64) -> Result<TableState> {
        let mut state = TableState::new(self.page_size.unwrap_or(default_page_size));

        for raw in &self.filter {
            let (id, values) = parse_filter(raw)?;
            state.dispatch(TableAction::filter_replace(id, values));
        }

        state.sort = self
            .sort
            .iter()
            .map(|raw| parse_sort(raw))
            .collect::<Result<_>>()?;

        state.dispatch(TableAction::SetPageIndex { index: self.page });
        Ok(state)
    }
}

/// Load the configuration file given on the command line, or search the defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    Ok(config)
}

fn parse_sort(raw: &str) -> Result<SortRule> {
    let (id, order) = match raw.rsplit_once(':') {
        Some((id, "desc")) => (id, SortOrder::Desc),
        Some((id, "asc")) => (id, SortOrder::Asc),
        Some((_, other)) => bail!("Unknown sort direction '{}' in '{}'", other, raw),
        None => (raw, SortOrder::Asc),
    };
    if id.is_empty() {
        bail!("Sort column is empty in '{}'", raw);
    }
    Ok(SortRule::new(id, order))
}

fn parse_filter(raw: &str) -> Result<(String, Vec<String>)> {
    let Some((id, values)) = raw.split_once('=') else {
        bail!("Filter '{}' is not of the form id=value1,value2", raw);
    };
    if id.is_empty() {
        bail!("Filter id is empty in '{}'", raw);
    }
    let values = values
        .split(',')
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    Ok((id.to_string(), values))
}
