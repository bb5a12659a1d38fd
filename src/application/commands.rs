//! Command runners behind the `pager` binary.
//!
//! Each runner drives a [`RemoteLoader`] and writes one JSON object per line
//! to the supplied writer: one line per fetch outcome, then a final state line.

use std::io::Write;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{FetchArgs, ScrollArgs, Settings};
use crate::domain::{LoaderState, PageResult};
use crate::loader::{FetchOutcome, LoaderOptions, PendingFetch, RemoteLoader, Target};

use super::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeLine<'a> {
    query: &'a str,
    requested_page: u32,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a PageResult<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> OutcomeLine<'a> {
    fn new(query: &'a str, requested_page: u32, outcome: &'a FetchOutcome<Value>) -> Self {
        let (status, result, error) = match outcome {
            FetchOutcome::Loaded(result) => ("loaded", Some(result), None),
            FetchOutcome::Failed(err) => ("failed", None, Some(err.to_string())),
            FetchOutcome::Cancelled => ("cancelled", None, None),
        };
        Self {
            query,
            requested_page,
            status,
            result,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
struct StateLine<'a> {
    state: &'a LoaderState,
}

/// Build a JSON loader for the configured URL template.
pub fn build_loader(settings: &Settings, client: Client) -> Result<RemoteLoader<Value>, AppError> {
    let url = settings.require_url()?;
    let options = LoaderOptions::from_settings(
        Target::template(url),
        settings.mapping.clone(),
        &settings.loader,
    )
    .with_client(client)
    .with_on_error(|err| warn!(error = %err, kind = err.kind().as_str(), "Loader reported error"));
    Ok(RemoteLoader::new(options))
}

/// Fetch each requested page in order.
///
/// Without `--debounced` every fetch runs immediately and is awaited before
/// the next one starts. With it, all fetches are issued back to back through
/// the debounce window, so only the last one reaches the network.
pub async fn run_fetch<W: Write>(
    loader: &RemoteLoader<Value>,
    args: &FetchArgs,
    out: &mut W,
) -> Result<(), AppError> {
    let pages = if args.pages.is_empty() {
        vec![loader.initial_page()]
    } else {
        args.pages.clone()
    };

    let mut outcomes = Vec::with_capacity(pages.len());
    if args.debounced {
        let pending: Vec<(u32, PendingFetch<Value>)> = pages
            .iter()
            .map(|&page| (page, loader.fetch(args.query.as_str(), page, false)))
            .collect();
        for (page, fetch) in pending {
            outcomes.push((page, fetch.await));
        }
    } else {
        for &page in &pages {
            let outcome = loader.fetch(args.query.as_str(), page, true).await;
            outcomes.push((page, outcome));
        }
    }

    let mut failed = 0;
    for (page, outcome) in &outcomes {
        if matches!(outcome, FetchOutcome::Failed(_)) {
            failed += 1;
        }
        write_line(out, &OutcomeLine::new(&args.query, *page, outcome))?;
    }
    write_line(
        out,
        &StateLine {
            state: &loader.state(),
        },
    )?;

    if failed > 0 {
        return Err(AppError::FetchesFailed {
            failed,
            requested: outcomes.len(),
        });
    }
    Ok(())
}

/// Load consecutive pages from the initial page until the result reports no
/// further pages or `max_pages` pages have been read.
///
/// With `auto_load_initial` disabled nothing triggers the first load, so only
/// the state line is written.
pub async fn run_scroll<W: Write>(
    loader: &RemoteLoader<Value>,
    args: &ScrollArgs,
    out: &mut W,
) -> Result<(), AppError> {
    let mut page = loader.initial_page();
    let mut loaded = 0_u32;
    let limit = if loader.auto_load_initial() {
        args.max_pages
    } else {
        info!(query = %args.query, "Initial load disabled; nothing to scroll");
        0
    };

    while loaded < limit {
        let outcome = loader.fetch(args.query.as_str(), page, true).await;
        write_line(out, &OutcomeLine::new(&args.query, page, &outcome))?;

        match outcome {
            FetchOutcome::Loaded(result) => {
                loaded += 1;
                if !result.has_next() {
                    break;
                }
                page = result.page.saturating_add(1);
            }
            FetchOutcome::Failed(err) => return Err(err.into()),
            FetchOutcome::Cancelled => break,
        }
    }

    let state = loader.state();
    info!(
        query = %args.query,
        pages = loaded,
        total_pages = state.total_pages,
        "Scroll finished"
    );
    write_line(out, &StateLine { state: &state })?;
    Ok(())
}

fn write_line<W: Write, S: Serialize>(out: &mut W, line: &S) -> Result<(), AppError> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    Ok(())
}
