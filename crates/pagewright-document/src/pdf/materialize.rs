// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Materialization — turn a `PdfDocument` (pages pointing into shared sources)
// into a single self-contained lopdf document.
//
// Each page dictionary is deep-copied together with everything it references.
// Objects shared between pages of the same source (fonts, images, resource
// dictionaries) are copied once. References back into a page tree are cut,
// so a page never drags its siblings along.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, instrument, warn};

use super::document::{Page, PageAnnotation, PdfDocument, encode_text_string};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 3] = [b"Resources", b"MediaBox", b"CropBox"];

/// Build a standalone lopdf document holding every page in order.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn to_lopdf(doc: &PdfDocument) -> Result<Document> {
    let mut target = Document::with_version("1.5");
    let pages_id = target.new_object_id();

    let mut copier = ObjectCopier {
        target: &mut target,
        copied: HashMap::new(),
    };
    let mut kids = Vec::with_capacity(doc.page_count());
    for page in doc.pages() {
        let page_id = copier.copy_page(page, pages_id)?;
        kids.push(Object::Reference(page_id));
    }
    let shared_objects = copier.copied.len();

    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", catalog_id);

    if !doc.metadata().is_empty() {
        let info_id = target.add_object(doc.metadata().to_info_dictionary());
        target.trailer.set("Info", info_id);
    }

    debug!(shared_objects, objects = target.objects.len(), "Document materialized");
    Ok(target)
}

/// Serialize a document to PDF bytes.
pub fn to_bytes(doc: &PdfDocument) -> Result<Vec<u8>> {
    let mut target = to_lopdf(doc)?;
    let mut output = Vec::new();
    target.save_to(&mut output).map_err(|err| {
        PagewrightError::Materialization(format!("failed to serialise PDF: {err}"))
    })?;
    Ok(output)
}

// -- Object copying ------------------------------------------------------------

struct ObjectCopier<'a> {
    target: &'a mut Document,
    /// (source identity, source object id) → id in the target.
    copied: HashMap<(usize, ObjectId), ObjectId>,
}

impl ObjectCopier<'_> {
    /// Copy one page under `pages_id`. Every call produces a fresh page
    /// object, so a page may appear more than once in a document.
    fn copy_page(&mut self, page: &Page, pages_id: ObjectId) -> Result<ObjectId> {
        let source = &page.source.document;
        let key = page.source_key();
        let original = source.get_dictionary(page.object_id).map_err(|err| {
            PagewrightError::Materialization(format!(
                "cannot read page {}: {err}",
                page.source_number()
            ))
        })?;

        let mut dict = Dictionary::new();
        for (name, value) in original.iter() {
            if name == b"Parent" {
                continue;
            }
            if let Some(copy) = self.copy_value(source, key, value) {
                dict.set(name.clone(), copy);
            }
        }

        for name in INHERITABLE {
            if dict.has(name) {
                continue;
            }
            if let Some(value) = page.inherited(name).cloned() {
                if let Some(copy) = self.copy_value(source, key, &value) {
                    dict.set(name, copy);
                }
            }
        }

        let page_id = self.target.new_object_id();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(pages_id));
        dict.set("Rotate", Object::Integer(i64::from(page.rotation().degrees())));

        if !page.annotations().is_empty() {
            self.append_annotations(&mut dict, page.annotations(), page_id);
        }

        self.target.objects.insert(page_id, Object::Dictionary(dict));
        Ok(page_id)
    }

    /// Copy a value from `source`. Returns `None` for references that must
    /// not be followed (dangling, or pointing into the page tree).
    fn copy_value(&mut self, source: &Document, key: usize, value: &Object) -> Option<Object> {
        match value {
            Object::Reference(id) => self.copy_reference(source, key, *id),
            Object::Dictionary(dict) => Some(Object::Dictionary(self.copy_dictionary(source, key, dict))),
            Object::Array(items) => Some(Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_value(source, key, item).unwrap_or(Object::Null))
                    .collect(),
            )),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(source, key, &stream.dict);
                Some(Object::Stream(copy))
            }
            other => Some(other.clone()),
        }
    }

    fn copy_dictionary(&mut self, source: &Document, key: usize, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (name, value) in dict.iter() {
            if let Some(value) = self.copy_value(source, key, value) {
                copy.set(name.clone(), value);
            }
        }
        copy
    }

    fn copy_reference(&mut self, source: &Document, key: usize, id: ObjectId) -> Option<Object> {
        if let Some(&copied) = self.copied.get(&(key, id)) {
            return Some(Object::Reference(copied));
        }

        let referenced = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, dropping it");
                return None;
            }
        };
        if is_page_tree_node(referenced) {
            return None;
        }

        // Reserve the id first so cycles resolve to it.
        let new_id = self.target.new_object_id();
        self.copied.insert((key, id), new_id);
        let copy = self.copy_value(source, key, referenced).unwrap_or(Object::Null);
        self.target.objects.insert(new_id, copy);
        Some(Object::Reference(new_id))
    }

    fn append_annotations(
        &mut self,
        page: &mut Dictionary,
        annotations: &[PageAnnotation],
        page_id: ObjectId,
    ) {
        let mut annots = match page.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match self.target.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        for annotation in annotations {
            let mut dict = annotation_dictionary(annotation);
            dict.set("P", Object::Reference(page_id));
            annots.push(Object::Reference(self.target.add_object(dict)));
        }
        page.set("Annots", annots);
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let Ok(dict) = object.as_dict() else {
        return false;
    };
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Page" || name == b"Pages")
}

fn annotation_dictionary(annotation: &PageAnnotation) -> Dictionary {
    match annotation {
        PageAnnotation::Note { text, x, y } => dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Contents" => encode_text_string(text),
            "Rect" => vec![
                Object::Real(*x),
                Object::Real(*y),
                Object::Real(x + 20.0),
                Object::Real(y + 20.0),
            ],
            "Open" => true,
        },
        PageAnnotation::Link { url, rect } => dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "A" => dictionary! {
                "S" => "URI",
                "URI" => Object::string_literal(url.as_str()),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{labels, sample_document, sample_pdf_with};
    use crate::pdf::compose;
    use pagewright_core::Rotation;
    use pagewright_core::selector::RotationTargets;

    /// A materialized document reloads with the same page count, order and
    /// rotation.
    #[test]
    fn output_reloads_with_same_pages() {
        let doc = sample_document(&["one", "two", "three"]);
        let rotated = compose::rotate(&doc, Rotation::QUARTER, &RotationTargets::All);
        let bytes = rotated.to_bytes().expect("materialize");

        let reloaded = PdfDocument::from_bytes(&bytes).expect("reload");
        assert_eq!(labels(&reloaded), vec!["one", "two", "three"]);
        assert!(reloaded.pages().iter().all(|p| p.rotation() == Rotation::QUARTER));
    }

    #[test]
    fn inherited_attributes_are_copied_onto_pages() {
        let doc = sample_document(&["only"]);
        let lopdf = to_lopdf(&doc).expect("materialize");
        let (_, page_id) = lopdf.get_pages().into_iter().next().expect("one page");
        let page = lopdf.get_dictionary(page_id).expect("page dict");
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn shared_resources_are_copied_once() {
        let doc = sample_document(&["a", "b", "c", "d"]);
        let lopdf = to_lopdf(&doc).expect("materialize");
        let fonts = lopdf
            .objects
            .values()
            .filter(|o| {
                o.as_dict()
                    .map(|d| matches!(d.get(b"Type"), Ok(Object::Name(n)) if n == b"Font"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(fonts, 1);
    }

    #[test]
    fn repeated_page_gets_distinct_objects() {
        let doc = sample_document(&["x"]);
        let twice = PdfDocument::from_pages(
            vec![doc.pages()[0].clone(), doc.pages()[0].rotated(Rotation::HALF)],
            Default::default(),
        );
        let reloaded = PdfDocument::from_bytes(&twice.to_bytes().expect("bytes")).expect("reload");
        assert_eq!(reloaded.page_count(), 2);
        assert_eq!(reloaded.pages()[0].rotation(), Rotation::NONE);
        assert_eq!(reloaded.pages()[1].rotation(), Rotation::HALF);
    }

    #[test]
    fn references_into_the_page_tree_are_cut() {
        // A page carrying an annotation whose /P points back at the page.
        let bytes = sample_pdf_with(&["a", "b"], |doc, _, page_ids| {
            let annot = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Text",
                "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                "P" => page_ids[0],
            });
            if let Ok(page) = doc.get_dictionary_mut(page_ids[0]) {
                page.set("Annots", vec![Object::Reference(annot)]);
            }
        });
        let doc = PdfDocument::from_bytes(&bytes).expect("load");
        let first_only = PdfDocument::from_pages(vec![doc.pages()[0].clone()], Default::default());

        let lopdf = to_lopdf(&first_only).expect("materialize");
        assert_eq!(lopdf.get_pages().len(), 1);
        let page_dicts = lopdf
            .objects
            .values()
            .filter(|o| is_page_tree_node(o))
            .count();
        // One page plus the pages root; the sibling was not dragged along.
        assert_eq!(page_dicts, 2);
    }

    #[test]
    fn metadata_is_written_to_info() {
        let doc = sample_document(&["a"]).with_metadata(crate::DocumentMetadata {
            title: Some("Quarterly".into()),
            ..Default::default()
        });
        let reloaded = PdfDocument::from_bytes(&doc.to_bytes().expect("bytes")).expect("reload");
        assert_eq!(reloaded.metadata().title.as_deref(), Some("Quarterly"));
    }
}
