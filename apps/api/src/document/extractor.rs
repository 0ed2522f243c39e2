//! PDF text extraction.
//!
//! Pages are read in ascending page number starting at 1. Each page's text
//! fragments are joined with single spaces and every page is terminated by
//! a newline. Fonts, positions and other layout metadata are dropped.
//!
//! Fragment order is whatever order the content stream draws text in. For
//! multi-column layouts that is not always reading order; accepted.

use std::io::Read;

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use lopdf::{Document, ObjectId};
use serde::Serialize;
use tracing::{debug, info};

use crate::document::{ensure_pdf, DocumentError};

/// Linear text of an uploaded document plus the page count it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    pub text: String,
    pub page_count: usize,
}

/// Validates the declared type, then extracts all pages.
///
/// Returns an empty `text` (not an error) for zero-page or blank documents;
/// emptiness is a request-level validation concern. Any unreadable page
/// aborts the whole extraction and no partial text is returned.
pub fn extract_document_text(
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<ExtractedDocument, DocumentError> {
    ensure_pdf(content_type)?;

    let pages = read_page_fragments(bytes)?;
    let page_count = pages.len();
    let text = join_pages(&pages);

    info!(
        "Extracted {} chars from {} page(s)",
        text.chars().count(),
        page_count
    );

    Ok(ExtractedDocument { text, page_count })
}

/// Runs `extract_document_text` on the blocking pool so PDF parsing never
/// stalls the async executor.
pub async fn extract_document_text_blocking(
    content_type: Option<String>,
    bytes: Bytes,
) -> Result<ExtractedDocument, DocumentError> {
    tokio::task::spawn_blocking(move || extract_document_text(content_type.as_deref(), &bytes))
        .await
        .map_err(|e| DocumentError::Extraction(format!("extraction task failed: {e}")))?
}

/// Loads the PDF and returns, per page, its non-empty text fragments.
fn read_page_fragments(bytes: &[u8]) -> Result<Vec<Vec<String>>, DocumentError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| DocumentError::Extraction(format!("failed to load PDF: {e}")))?;

    if doc.is_encrypted() {
        return Err(DocumentError::Extraction(
            "encrypted PDFs are not supported".to_string(),
        ));
    }

    // get_pages() is keyed by 1-based page number, so iteration is in page order.
    let mut pages = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        check_page_contents(&doc, page_num, page_id)?;
        let raw = doc.extract_text(&[page_num]).map_err(|e| {
            DocumentError::Extraction(format!("failed to read page {page_num}: {e}"))
        })?;
        let fragments = split_fragments(&raw);
        debug!("Page {page_num}: {} fragment(s)", fragments.len());
        pages.push(fragments);
    }

    Ok(pages)
}

/// `extract_text` skips content streams it cannot resolve and keeps raw bytes
/// when decoding fails, which would turn a broken page into a blank one.
/// Every content stream must resolve and decode before the page is read.
fn check_page_contents(
    doc: &Document,
    page_num: u32,
    page_id: ObjectId,
) -> Result<(), DocumentError> {
    let unreadable = |reason: String| {
        DocumentError::Extraction(format!("failed to read page {page_num}: {reason}"))
    };

    for content_id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(content_id)
            .and_then(|object| object.as_stream())
            .map_err(|e| unreadable(format!("content stream {content_id:?}: {e}")))?;

        if !stream.dict.has(b"Filter") {
            continue;
        }
        let filters = stream
            .filters()
            .map_err(|e| unreadable(format!("bad filter on {content_id:?}: {e}")))?;

        // lopdf logs and discards zlib errors, so the first FlateDecode pass
        // over the raw bytes is checked here.
        if filters.first().map(String::as_str) == Some("FlateDecode") {
            let mut sink = Vec::new();
            ZlibDecoder::new(stream.content.as_slice())
                .read_to_end(&mut sink)
                .map_err(|e| unreadable(format!("corrupt stream {content_id:?}: {e}")))?;
        }
        stream
            .decompressed_content()
            .map_err(|e| unreadable(format!("cannot decode {content_id:?}: {e}")))?;
    }
    Ok(())
}

fn split_fragments(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Space-joins fragments within a page and newline-terminates each page.
pub fn join_pages<S: AsRef<str>>(pages: &[Vec<S>]) -> String {
    let mut text = String::new();
    for page in pages {
        let line = page
            .iter()
            .map(|fragment| fragment.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        text.push_str(&line);
        text.push('\n');
    }
    if pages.iter().all(|page| page.is_empty()) {
        // Blank documents produce no text at all rather than bare newlines.
        text.clear();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Builds a PDF where every inner slice is one page and every string is
    /// drawn in its own text object.
    fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let (mut doc, _) = build_document(pages);
        save(&mut doc)
    }

    /// Same as `build_pdf` but returns the document and its page ids so a
    /// test can damage a page before saving.
    fn build_document(pages: &[&[&str]]) -> (Document, Vec<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        let mut page_ids = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Integer(72), Object::Integer(720 - 20 * i as i64)],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
            page_ids.push(page_id);
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_ids)
    }

    fn save(doc: &mut Document) -> Vec<u8> {
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn set_page_contents(doc: &mut Document, page_id: ObjectId, contents: Object) {
        doc.get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("Contents", contents);
    }

    #[test]
    fn test_join_pages_spaces_fragments_and_newlines_pages() {
        let pages = vec![vec!["a", "b", "c"], vec!["d", "e", "f"]];
        assert_eq!(join_pages(&pages), "a b c\nd e f\n");
    }

    #[test]
    fn test_join_pages_preserves_segment_count_and_order() {
        let pages: Vec<Vec<String>> = (1..=4)
            .map(|p| (1..=3).map(|f| format!("p{p}f{f}")).collect())
            .collect();
        let text = join_pages(&pages);
        let segments: Vec<&str> = text.lines().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], "p1f1 p1f2 p1f3");
        assert_eq!(segments[3], "p4f1 p4f2 p4f3");
    }

    #[test]
    fn test_join_pages_blank_document_is_empty() {
        let none: Vec<Vec<&str>> = vec![];
        assert_eq!(join_pages(&none), "");
        assert_eq!(join_pages(&[Vec::<&str>::new(), Vec::new()]), "");
    }

    #[test]
    fn test_join_pages_keeps_blank_page_between_text_pages() {
        let pages = vec![vec!["first"], vec![], vec!["third"]];
        assert_eq!(join_pages(&pages), "first\n\nthird\n");
    }

    #[test]
    fn test_split_fragments_drops_blank_lines() {
        assert_eq!(
            split_fragments("  Built dashboards \n\n 3 years Node.js\n"),
            vec!["Built dashboards", "3 years Node.js"]
        );
    }

    #[test]
    fn test_rejects_non_pdf_before_parsing() {
        // Valid PDF bytes still fail when the declared type is wrong.
        let bytes = build_pdf(&[&["Hello"]]);
        let err = extract_document_text(Some("text/plain"), &bytes).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_pdf_is_an_extraction_error() {
        let err =
            extract_document_text(Some("application/pdf"), b"%PDF-1.5 not really").unwrap_err();
        assert!(matches!(err, DocumentError::Extraction(_)));
    }

    #[test]
    fn test_dangling_content_reference_aborts_extraction() {
        let (mut doc, page_ids) = build_document(&[&["GoodPage"], &["Lost page"]]);
        set_page_contents(&mut doc, page_ids[1], Object::Reference((9999, 0)));
        let bytes = save(&mut doc);

        let err = extract_document_text(Some("application/pdf"), &bytes).unwrap_err();
        assert!(matches!(err, DocumentError::Extraction(ref m) if m.contains("page 2")));
    }

    #[test]
    fn test_corrupt_flate_stream_aborts_extraction() {
        let (mut doc, page_ids) = build_document(&[&["GoodPage"], &["Lost page"]]);
        let broken = doc.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            b"definitely not zlib data".to_vec(),
        ));
        set_page_contents(&mut doc, page_ids[1], Object::Reference(broken));
        let bytes = save(&mut doc);

        let err = extract_document_text(Some("application/pdf"), &bytes).unwrap_err();
        assert!(matches!(err, DocumentError::Extraction(ref m) if m.contains("page 2")));
    }

    #[test]
    fn test_valid_flate_stream_still_extracts() {
        // Repeated lines so the content stream is worth compressing.
        let lines = ["Compressed page"; 20];
        let mut doc = Document::load_mem(&build_pdf(&[&lines])).unwrap();
        doc.compress();
        let bytes = save(&mut doc);

        let extracted = extract_document_text(Some("application/pdf"), &bytes).unwrap();
        assert!(extracted.text.contains("Compressed page"));
    }

    #[test]
    fn test_extracts_pages_in_order() {
        let bytes = build_pdf(&[
            &["Built React dashboards", "3 years Node"],
            &["Second page"],
        ]);
        let extracted = extract_document_text(Some("application/pdf"), &bytes).unwrap();

        assert_eq!(extracted.page_count, 2);
        let segments: Vec<&str> = extracted.text.lines().collect();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].contains("Built React dashboards"));
        assert!(segments[0].contains("3 years Node"));
        assert!(
            segments[0].find("Built").unwrap() < segments[0].find("3 years").unwrap()
        );
        assert!(segments[1].contains("Second page"));
    }

    #[tokio::test]
    async fn test_blocking_wrapper_matches_sync_extraction() {
        let bytes = build_pdf(&[&["Only page"]]);
        let extracted = extract_document_text_blocking(
            Some("application/pdf".to_string()),
            Bytes::from(bytes),
        )
        .await
        .unwrap();
        assert_eq!(extracted.page_count, 1);
        assert!(extracted.text.contains("Only page"));
    }
}
