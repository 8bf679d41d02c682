// Comment Loader Service
// Reads comment records from CSV or JSON input files

use crate::models::CommentRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported input format \"{extension}\" (expected .csv or .json)")]
    UnsupportedFormat { extension: String },
}

/// Load comment records from a CSV or JSON file, dispatching on the
/// file extension (case-insensitive).
///
/// CSV inputs must carry a `comment_id,username,comment_text` header row.
/// JSON inputs must be an array of objects with the same three fields.
pub fn load_comments(path: &Path) -> Result<Vec<CommentRecord>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match extension.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        _ => return Err(LoadError::UnsupportedFormat { extension }),
    };

    warn_on_duplicate_ids(&records);
    info!(
        "[LOADER] Loaded {} comments from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<CommentRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<CommentRecord>() {
        records.push(row?);
    }
    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<CommentRecord>, LoadError> {
    let file = File::open(path)?;
    let records: Vec<CommentRecord> = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}

/// Duplicate ids are tolerated; downstream merging keeps the first
/// classification per id, so later duplicates end up unresolved.
fn warn_on_duplicate_ids(records: &[CommentRecord]) {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.comment_id) {
            warn!(
                "[LOADER] Duplicate comment_id {} in input, keeping all occurrences",
                record.comment_id
            );
        }
    }
}
