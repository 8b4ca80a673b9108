//! Native PDF handling: pass-through of already-PDF sources and structural
//! concatenation of intermediate PDFs into one merged patient document.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use super::ConvertError;

/// A PDF source needs no conversion, only a copy into the output tree.
pub fn copy_pdf(source: &Path, dest: &Path) -> Result<(), ConvertError> {
    std::fs::copy(source, dest)?;
    Ok(())
}

/// Concatenate `inputs` in order into a single PDF at `output`.
///
/// Every input must exist — the aggregator references intermediates by path
/// and a missing one means the scope's artifacts are inconsistent, which the
/// caller reports rather than papering over.
pub fn merge_files(inputs: &[impl AsRef<Path>], output: &Path) -> Result<(), ConvertError> {
    if inputs.is_empty() {
        return Err(ConvertError::Merge("nothing to merge".into()));
    }
    for input in inputs {
        if !input.as_ref().is_file() {
            return Err(ConvertError::MissingIntermediate(
                input.as_ref().to_path_buf(),
            ));
        }
    }

    let mut max_id = 1;
    let mut pages = BTreeMap::new();
    let mut objects = BTreeMap::new();
    let mut document = Document::with_version("1.5");

    for input in inputs {
        let mut doc = Document::load(input.as_ref())
            .map_err(|e| ConvertError::Merge(format!("{}: {e}", input.as_ref().display())))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        pages.extend(
            doc.get_pages()
                .into_values()
                .map(|object_id| {
                    (
                        object_id,
                        doc.get_object(object_id)
                            .map(Object::to_owned)
                            .unwrap_or(Object::Null),
                    )
                })
                .collect::<BTreeMap<ObjectId, Object>>(),
        );
        objects.extend(doc.objects);
    }

    // Fold all catalogs into one and all page trees into one; everything
    // else carries over renumbered.
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in objects.iter() {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {
                catalog_object = Some((
                    catalog_object.map(|(id, _)| id).unwrap_or(*object_id),
                    object.clone(),
                ));
            }
            b"Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(existing) = existing.as_dict() {
                            dictionary.extend(existing);
                        }
                    }
                    pages_object = Some((
                        pages_object.map(|(id, _)| id).unwrap_or(*object_id),
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                document.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_id, pages_dict) =
        pages_object.ok_or_else(|| ConvertError::Merge("no page tree found".into()))?;
    let (catalog_id, catalog_dict) =
        catalog_object.ok_or_else(|| ConvertError::Merge("no catalog found".into()))?;

    for (object_id, object) in pages.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            document
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_dict.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", pages.len() as u32);
        dictionary.set(
            "Kids",
            pages
                .keys()
                .map(|id| Object::Reference(*id))
                .collect::<Vec<_>>(),
        );
        document
            .objects
            .insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_dict.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        document
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    document.trailer.set("Root", catalog_id);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();
    document
        .save(output)
        .map_err(|e| ConvertError::Merge(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::text;

    fn sample_pdf(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        text::render_text(name, content, &path).unwrap();
        path
    }

    #[test]
    fn copy_pdf_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let src = sample_pdf(dir.path(), "a.pdf", "first document");
        let dest = dir.path().join("out.pdf");
        copy_pdf(&src, &dest).unwrap();
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dest).unwrap());
    }

    #[test]
    fn merge_concatenates_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        let a = sample_pdf(dir.path(), "a.pdf", "first document");
        let b = sample_pdf(dir.path(), "b.pdf", "second document");
        let merged = dir.path().join("merged.pdf");
        merge_files(&[&a, &b], &merged).unwrap();

        let doc = Document::load(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn merge_single_input_still_produces_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = sample_pdf(dir.path(), "a.pdf", "only document");
        let merged = dir.path().join("merged.pdf");
        merge_files(&[&a], &merged).unwrap();
        assert!(merged.is_file());
    }

    #[test]
    fn missing_intermediate_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("vanished.pdf");
        let merged = dir.path().join("merged.pdf");
        let err = merge_files(&[&gone], &merged).unwrap_err();
        assert!(matches!(err, ConvertError::MissingIntermediate(p) if p == gone));
    }

    #[test]
    fn merging_non_pdf_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.pdf");
        std::fs::write(&junk, b"not a pdf at all").unwrap();
        let merged = dir.path().join("merged.pdf");
        assert!(merge_files(&[&junk], &merged).is_err());
    }
}
