// Result Merger
// Reconciles parsed classifications back onto the batch records by id

use crate::models::{ClassificationResult, CommentRecord, ModerationOutcome};
use std::collections::HashMap;
use tracing::warn;

/// Produce exactly one outcome per batch record, in batch order.
///
/// Classifications match records by exact id. Duplicate ids among the
/// classifications keep the first occurrence; ids with no record in
/// this batch are dropped with a warning. Records the model skipped
/// come back unresolved.
pub fn merge_batch(
    batch: &[CommentRecord],
    classifications: Vec<ClassificationResult>,
) -> Vec<ModerationOutcome> {
    let mut by_id: HashMap<i64, ClassificationResult> =
        HashMap::with_capacity(classifications.len());
    for classification in classifications {
        let id = classification.comment_id;
        if !batch.iter().any(|r| r.comment_id == id) {
            warn!("[MERGER] Skipping unknown comment_id: {}", id);
            continue;
        }
        if by_id.contains_key(&id) {
            warn!("[MERGER] Duplicate classification for comment_id {}, keeping first", id);
            continue;
        }
        by_id.insert(id, classification);
    }

    batch
        .iter()
        .map(|record| match by_id.remove(&record.comment_id) {
            Some(classification) => ModerationOutcome::resolved(record.clone(), classification),
            None => ModerationOutcome::unresolved(record.clone()),
        })
        .collect()
}
