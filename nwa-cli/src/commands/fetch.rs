use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use nwa_table::prelude::{init_tracing, shutdown_tracing, CancelScope, CollectionClient, Page, PageBody, TracingNotifier};
use serde::Serialize;
use serde_json::Value;

use super::{load_config, TableArgs};

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Collection path, e.g. `subscriptions`
    #[arg(value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub table: TableArgs,

    /// ETag from a previous fetch, sent as If-None-Match
    #[arg(long, value_name = "ETAG")]
    pub etag: Option<String>,
}

#[derive(Debug, Serialize)]
struct FetchSummary {
    url: String,
    not_modified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    rows: Vec<Value>,
}

pub async fn execute(args: FetchArgs, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    init_tracing(&config)?;

    let state = args.table.to_state(config.table.default_page_size)?;
    let query = state.query();

    let client = CollectionClient::new(&config.api, Arc::new(TracingNotifier))
        .context("Failed to create collection client")?;
    let url = client.endpoint(&args.path)?;

    let scope = CancelScope::new();
    let request = client.fetch_page::<Value>(&args.path, &query, args.etag.as_deref(), &scope);

    let page = tokio::select! {
        page = request => page?,
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            tracing::info!(url = %url, "Fetch cancelled");
            eprintln!("{}", "Cancelled".yellow());
            return Ok(());
        }
    };

    tracing::debug!(url = %url, total = ?page.total, not_modified = page.is_not_modified(), "Fetch complete");
    if page.is_not_modified() {
        eprintln!("{} {}", "Not modified:".cyan().bold(), url);
    }

    let summary = summarize(url.to_string(), page);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    shutdown_tracing();
    Ok(())
}

fn summarize(url: String, page: Page<Value>) -> FetchSummary {
    let (not_modified, rows) = match page.body {
        PageBody::Rows(rows) => (false, rows),
        PageBody::NotModified => (true, Vec::new()),
    };
    FetchSummary {
        url,
        not_modified,
        total: page.total,
        etag: page.etag,
        rows,
    }
}
