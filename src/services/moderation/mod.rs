// Moderation Module
// Batch comment classification core logic organized into specialized submodules:
// - batcher: Partitions comment records into fixed-size batches
// - prompt: Builds the per-batch classification prompt
// - sanitizer: Repairs common malformations in model completions
// - merger: Reconciles parsed classifications back onto batch records
// - report: Aggregates outcomes into the moderation report
// - output: Writes the moderated CSV, text report and pie chart
// - pipeline: Drives the batch loop end to end

pub mod batcher;
pub mod merger;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod sanitizer;

// Re-export commonly used functions
pub use batcher::{batch_count, batches};
pub use merger::merge_batch;
pub use output::{write_moderated_csv, write_pie_chart, write_report, OutputError, OutputPaths};
pub use pipeline::{run_moderation, RunSummary};
pub use prompt::build_prompt;
pub use report::{ModerationReport, OffensiveExcerpt};
pub use sanitizer::{parse_classifications, sanitize};
