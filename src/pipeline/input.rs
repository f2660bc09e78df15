//! Input resolution: turn caller-supplied paths or buffers into owned bytes.
//!
//! Paths are read exactly once, here, with `tokio::fs::read`; no file handle
//! survives past this stage. Every input is checked for the `%PDF` magic
//! before it reaches the codec so callers get a meaningful error rather than
//! an opaque pdfium failure.

use crate::error::ProcessError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A PDF supplied by the caller.
#[derive(Debug, Clone)]
pub enum PdfInput {
    /// A file on disk (e.g. an upload already spooled to a temp directory).
    Path(PathBuf),
    /// An in-memory buffer with a display name for error messages.
    Bytes { name: String, data: Vec<u8> },
}

impl PdfInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        PdfInput::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        PdfInput::Bytes {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> String {
        match self {
            PdfInput::Path(p) => p.display().to_string(),
            PdfInput::Bytes { name, .. } => name.clone(),
        }
    }

    /// Read the input into memory.
    pub async fn load(self) -> Result<LoadedInput, ProcessError> {
        match self {
            PdfInput::Path(path) => {
                let data = read_path(&path).await?;
                debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(LoadedInput::new(path.display().to_string(), data))
            }
            PdfInput::Bytes { name, data } => Ok(LoadedInput::new(name, data)),
        }
    }
}

impl From<PathBuf> for PdfInput {
    fn from(p: PathBuf) -> Self {
        PdfInput::Path(p)
    }
}

impl From<&Path> for PdfInput {
    fn from(p: &Path) -> Self {
        PdfInput::Path(p.to_path_buf())
    }
}

/// An input whose bytes are in memory.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub name: String,
    pub data: Vec<u8>,
}

impl LoadedInput {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

async fn read_path(path: &Path) -> Result<Vec<u8>, ProcessError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ProcessError::FileNotFound {
            path: path.to_path_buf(),
        },
    })
}

/// Read only the inputs the run will use: all of them when merging several,
/// otherwise just the first.
pub async fn load_inputs(
    inputs: Vec<PdfInput>,
    merge: bool,
) -> Result<Vec<LoadedInput>, ProcessError> {
    if inputs.is_empty() {
        return Err(ProcessError::NoInput);
    }
    let take = if merge { inputs.len() } else { 1 };
    let mut loaded = Vec::with_capacity(take);
    for input in inputs.into_iter().take(take) {
        loaded.push(input.load().await?);
    }
    Ok(loaded)
}

/// Verify the `%PDF` magic bytes. `index` is one-based for messages.
pub fn check_magic(index: usize, input: &LoadedInput) -> Result<(), ProcessError> {
    if input.data.starts_with(b"%PDF") {
        return Ok(());
    }
    Err(ProcessError::NotAPdf {
        input: index,
        source_name: input.name.clone(),
        magic: input.data.iter().take(4).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_accepts_pdf_header() {
        let input = LoadedInput::new("a.pdf", b"%PDF-1.7\n...".to_vec());
        assert!(check_magic(1, &input).is_ok());
    }

    #[test]
    fn magic_rejects_other_files() {
        let input = LoadedInput::new("a.png", b"\x89PNG\r\n".to_vec());
        match check_magic(2, &input) {
            Err(ProcessError::NotAPdf { input, magic, .. }) => {
                assert_eq!(input, 2);
                assert_eq!(magic, b"\x89PNG".to_vec());
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn magic_rejects_empty_buffer() {
        let input = LoadedInput::new("empty", Vec::new());
        assert!(check_magic(1, &input).is_err());
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let err = PdfInput::path("/definitely/not/a/real/file.pdf")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn only_first_input_read_without_merge() {
        let inputs = vec![
            PdfInput::bytes("one", b"%PDF-a".to_vec()),
            PdfInput::path("/not/read/because/unmerged.pdf"),
        ];
        let loaded = load_inputs(inputs, false).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "one");
    }

    #[tokio::test]
    async fn empty_input_list_is_rejected() {
        assert!(matches!(
            load_inputs(Vec::new(), true).await,
            Err(ProcessError::NoInput)
        ));
    }
}
