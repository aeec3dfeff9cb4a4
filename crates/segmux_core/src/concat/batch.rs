//! Batch merge planning for very large fragment sets.
//!
//! Merging tens of thousands of fragments in one pass would exceed
//! argument-length and file-handle limits downstream, so fragments are first
//! folded into numbered intermediate files. Each intermediate replaces its
//! batch on disk: once it is written the batch's fragments are deleted and
//! the intermediate becomes their unique successor.

use std::fs;
use std::path::{Path, PathBuf};

use super::combine::{combine_files, MergeError};

/// Fragment count above which the larger batch size is used.
const LARGE_SET_THRESHOLD: usize = 90_000;
const SMALL_BATCH: usize = 100;
const LARGE_BATCH: usize = 200;

/// Pick the batch size from the total fragment count.
///
/// Small sets use batches of 100; past 90 000 fragments the batch grows to
/// 200 so the number of intermediates stays manageable for the final
/// multi-input command.
pub fn batch_size(total_fragments: usize) -> usize {
    if total_fragments <= LARGE_SET_THRESHOLD {
        SMALL_BATCH
    } else {
        LARGE_BATCH
    }
}

/// Fold an ordered fragment list into numbered intermediate files.
///
/// Fragments are merged in consecutive batches, strictly in order. Each
/// batch's intermediate is named `T<index>.ts` (zero-padded) in the directory
/// of the first fragment; after it is written, every fragment of that batch
/// is deleted before the next batch starts. Returns the ordered intermediate
/// paths for the caller's final single-pass concatenation.
///
/// A failure in batch *k* aborts the run before any of batch *k*'s fragments
/// are deleted; earlier batches and their intermediates are not rolled back.
pub fn partial_merge(fragments: &[PathBuf]) -> Result<Vec<PathBuf>, MergeError> {
    if fragments.is_empty() {
        return Ok(Vec::new());
    }

    let size = batch_size(fragments.len());
    let dir = fragments[0].parent().unwrap_or_else(|| Path::new(""));

    tracing::info!(
        "Merging {} fragments in batches of {}",
        fragments.len(),
        size
    );

    let mut intermediates = Vec::with_capacity(fragments.len() / size + 1);
    for (index, batch) in fragments.chunks(size).enumerate() {
        let output = dir.join(format!("T{:04}.ts", index));
        combine_files(batch, &output)?;

        for fragment in batch {
            fs::remove_file(fragment)
                .map_err(|e| MergeError::io(format!("deleting {}", fragment.display()), e))?;
        }

        intermediates.push(output);
    }

    Ok(intermediates)
}
