// Batcher
// Partitions the loaded records into fixed-size batches

use crate::models::CommentRecord;

/// Split records into batches of at most `batch_size`, preserving input
/// order. The last batch may be smaller. A zero batch size is treated
/// as one.
pub fn batches(records: &[CommentRecord], batch_size: usize) -> impl Iterator<Item = &[CommentRecord]> {
    records.chunks(batch_size.max(1))
}

/// Number of batches `batches` will yield for `total` records.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    let size = batch_size.max(1);
    total.div_ceil(size)
}
