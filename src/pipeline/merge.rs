//! Load/Merge: produce the starting document.
//!
//! With merging enabled and more than one input, every page of every input
//! is copied into a fresh document in input order, each file keeping its own
//! page order. Otherwise only the first input is decoded. Source documents
//! are dropped as soon as their pages have been copied.

use super::input::{check_magic, LoadedInput};
use crate::backend::PdfBackend;
use crate::error::{BackendError, ProcessError, Stage};
use tracing::{debug, info};

/// The starting document plus the page count of each input that went into it.
pub struct Loaded<D> {
    pub document: D,
    pub input_pages: Vec<usize>,
}

pub fn load_document<B: PdfBackend>(
    backend: &B,
    inputs: Vec<LoadedInput>,
    merge: bool,
) -> Result<Loaded<B::Document<'_>>, ProcessError> {
    if inputs.is_empty() {
        return Err(ProcessError::NoInput);
    }

    if merge && inputs.len() > 1 {
        return merge_all(backend, inputs);
    }

    let first = inputs
        .into_iter()
        .next()
        .ok_or(ProcessError::NoInput)?;
    let document = decode(backend, 1, first)?;
    let pages = backend.page_count(&document);
    info!("Loaded single input: {} pages", pages);

    Ok(Loaded {
        document,
        input_pages: vec![pages],
    })
}

fn merge_all<B: PdfBackend>(
    backend: &B,
    inputs: Vec<LoadedInput>,
) -> Result<Loaded<B::Document<'_>>, ProcessError> {
    let mut merged = backend.create().map_err(|e| e.in_stage(Stage::Merge))?;
    let mut input_pages = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.into_iter().enumerate() {
        let source = decode(backend, i + 1, input)?;
        let count = backend.page_count(&source);
        let indices: Vec<usize> = (0..count).collect();
        backend
            .copy_pages_into(&source, &indices, &mut merged)
            .map_err(|e| e.in_stage(Stage::Merge))?;
        debug!("Merged input {}: {} pages", i + 1, count);
        input_pages.push(count);
    }

    info!(
        "Merged {} inputs into {} pages",
        input_pages.len(),
        backend.page_count(&merged)
    );

    Ok(Loaded {
        document: merged,
        input_pages,
    })
}

fn decode<B: PdfBackend>(
    backend: &B,
    index: usize,
    input: LoadedInput,
) -> Result<B::Document<'_>, ProcessError> {
    check_magic(index, &input)?;
    let LoadedInput { name, data } = input;
    backend.load(data).map_err(|e| match e {
        BackendError::Load(detail) => ProcessError::CorruptPdf {
            input: index,
            source_name: name,
            detail,
        },
        other => other.in_stage(Stage::Load),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryBackend, MemoryDocument, MemoryPage};

    fn input(name: &str, texts: &[&str]) -> LoadedInput {
        let doc = MemoryDocument::new(texts.iter().map(|t| MemoryPage::a4(*t)).collect());
        LoadedInput::new(name, doc.to_bytes())
    }

    fn texts(doc: &MemoryDocument) -> Vec<&str> {
        doc.pages.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn merge_keeps_file_then_page_order() {
        let inputs = vec![input("a", &["a1", "a2"]), input("b", &["b1"]), input("c", &["c1", "c2"])];
        let loaded = load_document(&MemoryBackend, inputs, true).unwrap();
        assert_eq!(texts(&loaded.document), ["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(loaded.input_pages, [2, 1, 2]);
    }

    #[test]
    fn no_merge_uses_first_input_only() {
        let inputs = vec![input("a", &["a1", "a2"]), input("b", &["b1"])];
        let loaded = load_document(&MemoryBackend, inputs, false).unwrap();
        assert_eq!(texts(&loaded.document), ["a1", "a2"]);
    }

    #[test]
    fn merge_with_single_input_just_loads_it() {
        let loaded = load_document(&MemoryBackend, vec![input("a", &["a1"])], true).unwrap();
        assert_eq!(loaded.input_pages, [1]);
    }

    #[test]
    fn corrupt_second_input_aborts_merge() {
        let bad = LoadedInput::new("bad.pdf", b"%PDF-memory\n{broken".to_vec());
        let err = load_document(&MemoryBackend, vec![input("a", &["a1"]), bad], true)
            .err()
            .unwrap();
        match err {
            ProcessError::CorruptPdf { input, source_name, .. } => {
                assert_eq!(input, 2);
                assert_eq!(source_name, "bad.pdf");
            }
            other => panic!("expected CorruptPdf, got {other:?}"),
        }
    }
}
