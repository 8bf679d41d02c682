// Moderation Pipeline
// Drives the batch loop end to end: prompt, classify, sanitize, merge, report

use crate::models::{ClassificationResult, CommentRecord, ModerationOutcome, ModerationReport};
use crate::services::comment_loader::{self, LoadError};
use crate::services::config_store::RunConfig;
use crate::services::moderation::output::{
    self, OutputError, OutputPaths, CHART_FILE, CSV_FILE, REPORT_FILE,
};
use crate::services::moderation::{batcher, merger, prompt, sanitizer};
use crate::services::providers::{ModerationClient, ProviderError};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub offensive: usize,
    pub unresolved: usize,
    pub outputs: OutputPaths,
}

/// Load the input, classify every batch and write the three output
/// files. Partial success (some batches unresolved) still completes;
/// fatal provider errors abort before anything is written.
pub async fn run_moderation(
    config: &RunConfig,
    input_path: &Path,
    output_dir: &Path,
) -> Result<RunSummary, PipelineError> {
    let records = comment_loader::load_comments(input_path)?;
    if let Some(first) = records.first() {
        let sample: String = first.comment_text.chars().take(80).collect();
        info!("[PIPELINE] Sample comment: {}", sample);
    }
    let client = ModerationClient::new(config);

    let outcomes =
        moderate_comments(&client, &records, config.batch_size, config.batch_pause).await?;
    let report = ModerationReport::build(&outcomes);

    fs::create_dir_all(output_dir).map_err(OutputError::Io)?;
    let csv_path = output_dir.join(CSV_FILE);
    let report_path = output_dir.join(REPORT_FILE);
    let chart_path = output_dir.join(CHART_FILE);

    output::write_moderated_csv(&outcomes, &csv_path)?;
    output::write_report(&report.render_text(), &report_path)?;
    let chart = output::write_pie_chart(&report.type_counts, &chart_path)?.then_some(chart_path);

    info!(
        "[PIPELINE] Run complete: {} comments, {} offensive, {} unresolved",
        report.total, report.offensive, report.unresolved
    );
    Ok(RunSummary {
        total: report.total,
        offensive: report.offensive,
        unresolved: report.unresolved,
        outputs: OutputPaths {
            csv: csv_path,
            report: report_path,
            chart,
        },
    })
}

/// Classify all records batch by batch, pausing between calls.
///
/// Transient call failures and unparseable responses leave the affected
/// batch unresolved and the loop continues. Auth and not-found errors
/// abort, since every later batch would fail the same way.
pub async fn moderate_comments(
    client: &ModerationClient,
    records: &[CommentRecord],
    batch_size: usize,
    batch_pause: Duration,
) -> Result<Vec<ModerationOutcome>, ProviderError> {
    let total_batches = batcher::batch_count(records.len(), batch_size);
    let mut outcomes = Vec::with_capacity(records.len());

    for (index, batch) in batcher::batches(records, batch_size).enumerate() {
        info!(
            "[PIPELINE] Processing batch {}/{} ({} comments)",
            index + 1,
            total_batches,
            batch.len()
        );

        let classifications = match classify_batch(client, batch).await {
            Ok(parsed) => parsed,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    "[PIPELINE] Batch {} failed, its records stay unresolved: {}",
                    index + 1,
                    e
                );
                Vec::new()
            }
        };
        outcomes.extend(merger::merge_batch(batch, classifications));

        if index + 1 < total_batches && !batch_pause.is_zero() {
            sleep(batch_pause).await;
        }
    }

    Ok(outcomes)
}

async fn classify_batch(
    client: &ModerationClient,
    batch: &[CommentRecord],
) -> Result<Vec<ClassificationResult>, ProviderError> {
    let built = prompt::build_prompt(batch);
    let completion = client.classify(&built).await?;
    match sanitizer::parse_classifications(&completion) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("[PIPELINE] Failed to parse batch response: {}", e);
            Ok(Vec::new())
        }
    }
}
