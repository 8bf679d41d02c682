// Modbot Core Services
// Loader, configuration, provider client and the moderation pipeline

pub mod comment_loader;
pub mod config_store;
pub mod moderation;
pub mod providers;

pub use comment_loader::*;
pub use config_store::*;
pub use providers::*;

// Re-export moderation module functions
pub use moderation::{
    batch_count,
    batches,
    build_prompt,
    merge_batch,
    parse_classifications,
    run_moderation,
    sanitize,
    write_moderated_csv,
    write_pie_chart,
    write_report,
    ModerationReport,
    OffensiveExcerpt,
    OutputError,
    OutputPaths,
    RunSummary,
};
