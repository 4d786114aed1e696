// src/pipeline/scrape.rs

//! Postcode scraping pipeline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::catalog::PostcodeCatalog;
use crate::driver::SearchDriver;
use crate::error::Result;
use crate::models::{Config, FinalAggregate, RunOptions, SearchResult};
use crate::pipeline::checkpoint::{Checkpointer, compute_resume_index};
use crate::services::SearchWorkflow;
use crate::storage::CheckpointStorage;
use crate::utils::log;

/// Cooperative stop request, checked between postcodes.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Record an interrupt. Returns `true` if one was already pending.
    pub fn interrupt(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    /// Trigger on Ctrl-C. A second Ctrl-C exits the process immediately.
    pub fn listen_for_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if signal.interrupt() {
                    ::log::error!("Second interrupt received, exiting without saving");
                    std::process::exit(130);
                }
                ::log::warn!(
                    "Interrupt received, stopping after the current postcode (Ctrl-C again to quit)"
                );
            }
        });
    }
}

/// How a run ended. A run that loses its session returns `Err` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Completed,
    Interrupted,
}

/// Summary of a scrape run.
#[derive(Debug)]
pub struct RunOutcome {
    pub state: RunState,
    /// Units searched by this invocation
    pub processed: usize,
    /// Units carried forward from an earlier checkpoint
    pub carried_forward: usize,
    pub total: usize,
    pub results: Vec<SearchResult>,
    /// Written aggregate, for completed runs
    pub aggregate: Option<FinalAggregate>,
}

/// Everything a run borrows.
pub struct RunContext<'a> {
    pub driver: &'a dyn SearchDriver,
    pub config: &'a Config,
    pub storage: &'a dyn CheckpointStorage,
    pub catalog: &'a PostcodeCatalog,
    pub screenshot_dir: PathBuf,
    pub stop: StopSignal,
}

/// Search `units` in order, checkpointing as configured.
pub async fn run_scrape(
    ctx: &RunContext<'_>,
    units: &[String],
    options: &RunOptions,
) -> Result<RunOutcome> {
    let total = units.len();
    log::header(&format!("Scraping {total} postcodes"));

    let workflow = SearchWorkflow::new(ctx.driver, ctx.config, ctx.screenshot_dir.clone())?;
    let mut checkpointer = Checkpointer::new(ctx.storage, options);
    let start = compute_resume_index(units, options.resume_from.as_deref());

    let mut results = if start > 0 {
        carry_forward(&checkpointer, &units[..start]).await
    } else {
        Vec::new()
    };
    let carried_forward = results.len();

    let batch_size = options.batch_size.max(1);
    let delay = Duration::from_millis(options.delay_ms);
    let mut processed = 0;
    let mut state = RunState::Completed;

    for (index, postcode) in units.iter().enumerate().skip(start) {
        if ctx.stop.is_triggered() {
            state = RunState::Interrupted;
            break;
        }

        let region = ctx.catalog.region_of(postcode);
        ::log::info!(
            "[{}] Postcode {} ({})",
            log::progress_label(index + 1, total),
            postcode,
            region.map_or("?".to_string(), |r| r.to_string())
        );

        match workflow.process_unit(postcode, region).await {
            Ok(result) => results.push(result),
            Err(e) => {
                ::log::error!("Aborting run at postcode {postcode}: {e}");
                persist("partial results", checkpointer.write_partial(&results).await);
                return Err(e);
            }
        }
        processed += 1;

        if options.save_progress && processed % batch_size == 0 {
            persist(
                "progress",
                checkpointer.write_progress(&results, index + 1, total).await,
            );
        }

        if index + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    let aggregate = match state {
        RunState::Interrupted => {
            ::log::warn!("Run interrupted after {processed} postcodes");
            persist(
                "progress",
                checkpointer
                    .write_progress(&results, start + processed, total)
                    .await,
            );
            None
        }
        RunState::Completed => persist("results", checkpointer.write_final(&results).await),
    };

    if let Some(aggregate) = &aggregate {
        let summary = &aggregate.summary;
        log::summary(
            "Run complete",
            &[
                ("Postcodes", summary.total_postcodes_processed.to_string()),
                ("Successful", summary.successful_postcodes.to_string()),
                ("Failed", summary.failed_postcodes.to_string()),
                ("Members", summary.total_members_found.to_string()),
            ],
        );
    }

    Ok(RunOutcome {
        state,
        processed,
        carried_forward,
        total,
        results,
        aggregate,
    })
}

/// Search a single postcode and write it as a single-search file.
pub async fn run_single(
    ctx: &RunContext<'_>,
    postcode: &str,
    options: &RunOptions,
) -> Result<SearchResult> {
    let postcode = PostcodeCatalog::normalize(postcode);
    let region = ctx.catalog.region_of(&postcode);
    if region.is_none() {
        ::log::warn!("Postcode {postcode} is not in the catalog, searching anyway");
    }
    log::header(&format!("Searching postcode {postcode}"));

    let workflow = SearchWorkflow::new(ctx.driver, ctx.config, ctx.screenshot_dir.clone())?;
    let result = workflow.process_unit(&postcode, region).await?;

    let checkpointer = Checkpointer::new(ctx.storage, options);
    persist("results", checkpointer.write_single(&result).await);
    Ok(result)
}

/// Results of a previous checkpoint for units before the resume point, in
/// unit order and at most one per postcode.
async fn carry_forward(checkpointer: &Checkpointer<'_>, done: &[String]) -> Vec<SearchResult> {
    let snapshot = match checkpointer.load_progress().await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            ::log::warn!("No checkpoint found, earlier postcodes will be missing from the output");
            return Vec::new();
        }
        Err(e) => {
            ::log::warn!("Checkpoint unreadable ({e}), earlier postcodes will be missing");
            return Vec::new();
        }
    };

    let mut by_postcode: HashMap<String, SearchResult> = HashMap::new();
    for result in snapshot.results {
        by_postcode.entry(result.postcode.clone()).or_insert(result);
    }

    let carried: Vec<SearchResult> = done
        .iter()
        .filter_map(|postcode| by_postcode.remove(postcode))
        .collect();

    ::log::info!(
        "Carried forward {} of {} earlier postcodes from checkpoint",
        carried.len(),
        done.len()
    );
    carried
}

/// Log a persistence failure without stopping the run.
fn persist<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            ::log::error!("Failed to save {what}: {e}");
            None
        }
    }
}
