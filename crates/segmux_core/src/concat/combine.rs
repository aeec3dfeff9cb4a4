//! Byte-exact concatenation of fragment files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error raised while concatenating fragment files.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A fragment does not exist at merge time.
    #[error("Fragment not found: {0}")]
    MissingInput(PathBuf),

    /// Read/write failure during a copy or delete.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl MergeError {
    /// Create an I/O error with context.
    pub(crate) fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Append the full contents of each input to `output`, in list order.
///
/// The writer is flushed but never closed; it stays owned by the caller, so
/// passing a locked stdout is fine. The first missing or unreadable fragment
/// aborts the whole operation and whatever was already written stays
/// written; a reported error means the destination is not trustworthy.
///
/// An empty `files` slice is a no-op.
pub fn combine_into<W: Write>(files: &[PathBuf], output: &mut W) -> Result<(), MergeError> {
    if files.is_empty() {
        return Ok(());
    }

    for path in files {
        let mut input = open_fragment(path)?;
        io::copy(&mut input, output)
            .map_err(|e| MergeError::io(format!("copying {}", path.display()), e))?;
    }

    output
        .flush()
        .map_err(|e| MergeError::io("flushing output", e))
}

/// Concatenate `files` into a new file at `output_path`.
///
/// Parent directories are created if absent. An empty `files` slice is a
/// no-op and creates nothing.
pub fn combine_files(files: &[PathBuf], output_path: &Path) -> Result<(), MergeError> {
    if files.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        "Concatenating {} fragments into {}",
        files.len(),
        output_path.display()
    );

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| MergeError::io(format!("creating {}", parent.display()), e))?;
        }
    }

    let file = File::create(output_path)
        .map_err(|e| MergeError::io(format!("creating {}", output_path.display()), e))?;
    let mut writer = BufWriter::new(file);

    combine_into(files, &mut writer)
}

fn open_fragment(path: &Path) -> Result<File, MergeError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MergeError::MissingInput(path.to_path_buf()),
        _ => MergeError::io(format!("opening {}", path.display()), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fragments(dir: &Path, contents: &[&[u8]]) -> Vec<PathBuf> {
        contents
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let path = dir.join(format!("seg{:03}.ts", i));
                fs::write(&path, bytes).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn concatenates_in_list_order() {
        let dir = tempfile::tempdir().unwrap();
        let fragments = write_fragments(dir.path(), &[b"alpha", b"beta", b"gamma"]);
        let output = dir.path().join("merged.ts");

        combine_files(&fragments, &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"alphabetagamma");
    }

    #[test]
    fn round_trips_split_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let original: Vec<u8> = (0u16..2048).map(|i| (i % 251) as u8).collect();
        let fragments = write_fragments(
            dir.path(),
            &original.chunks(100).collect::<Vec<_>>(),
        );
        let output = dir.path().join("merged.ts");

        combine_files(&fragments, &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), original);
    }

    #[test]
    fn writes_to_borrowed_sink() {
        let dir = tempfile::tempdir().unwrap();
        let fragments = write_fragments(dir.path(), &[b"left", b"right"]);

        let mut sink = Vec::new();
        combine_into(&fragments, &mut sink).unwrap();

        assert_eq!(sink, b"leftright");
    }

    #[test]
    fn empty_input_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("merged.ts");

        combine_files(&[], &output).unwrap();

        assert!(!output.exists());
    }

    #[test]
    fn missing_fragment_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut fragments = write_fragments(dir.path(), &[b"first"]);
        fragments.push(dir.path().join("nope.ts"));
        let output = dir.path().join("merged.ts");

        let err = combine_files(&fragments, &output).unwrap_err();

        assert!(matches!(err, MergeError::MissingInput(p) if p.ends_with("nope.ts")));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let fragments = write_fragments(dir.path(), &[b"data"]);
        let output = dir.path().join("nested/deep/merged.ts");

        combine_files(&fragments, &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"data");
    }
}
