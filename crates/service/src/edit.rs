//! Workspace edit construction.

use std::str::FromStr;

use lsp_types::{
	DocumentChanges, OneOf, OptionalVersionedTextDocumentIdentifier, Range, TextDocumentEdit, TextEdit, Uri,
	WorkspaceEdit,
};
use xmlls_dom::{Document, Url};

use crate::{Error, Result};

/// Converts a document URL to an LSP URI.
pub(crate) fn lsp_uri(url: &Url) -> Result<Uri> {
	Uri::from_str(url.as_str()).map_err(|_| Error::InvalidUri(url.to_string()))
}

/// A single edit replacing `range` in the snapshot's version of `document`.
pub(crate) fn replace_edit(document: &Document, range: Range, new_text: String) -> Result<WorkspaceEdit> {
	let text_document = OptionalVersionedTextDocumentIdentifier {
		uri: lsp_uri(document.url())?,
		version: Some(document.version()),
	};
	Ok(WorkspaceEdit {
		document_changes: Some(DocumentChanges::Edits(vec![TextDocumentEdit {
			text_document,
			edits: vec![OneOf::Left(TextEdit { range, new_text })],
		}])),
		..Default::default()
	})
}

/// Text edits of `edit` that target `document`.
pub fn text_edits_for(edit: &WorkspaceEdit, document: &Document) -> Vec<TextEdit> {
	let Some(DocumentChanges::Edits(edits)) = &edit.document_changes else {
		return Vec::new();
	};
	edits
		.iter()
		.filter(|e| e.text_document.uri.as_str() == document.url().as_str())
		.flat_map(|e| e.edits.iter())
		.map(|e| match e {
			OneOf::Left(edit) => edit.clone(),
			OneOf::Right(annotated) => annotated.text_edit.clone(),
		})
		.collect()
}

/// Applies text edits to the snapshot text, returning the new text.
///
/// Edits are applied from the end of the document backwards so earlier ranges
/// stay valid. Edits at the same offset keep their relative order. Fails with
/// [`Error::OverlappingEdits`] when two ranges overlap.
pub fn apply_text_edits(document: &Document, edits: &[TextEdit]) -> Result<String> {
	let mut spans = Vec::with_capacity(edits.len());
	for edit in edits {
		let start = document.offset_at(edit.range.start)?;
		let end = document.offset_at(edit.range.end)?;
		spans.push((start, end.max(start), edit.new_text.as_str()));
	}
	spans.sort_by_key(|&(start, end, _)| (start, end));
	if let Some(pair) = spans.windows(2).find(|pair| pair[0].1 > pair[1].0) {
		return Err(Error::OverlappingEdits {
			first: (pair[0].0, pair[0].1),
			second: (pair[1].0, pair[1].1),
		});
	}

	let mut text = document.text().clone();
	for (start, end, new_text) in spans.into_iter().rev() {
		text.remove(start..end);
		text.insert(start, new_text);
	}
	Ok(text.to_string())
}

#[cfg(test)]
mod tests {
	use lsp_types::Position;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_replace_and_apply() {
		let document = Document::parse(Url::parse("file:///a.xml").unwrap(), 7, "<root><a/></root>");
		let range = Range::new(Position::new(0, 6), Position::new(0, 10));
		let edit = replace_edit(&document, range, "<b></b>".into()).unwrap();
		let Some(DocumentChanges::Edits(changes)) = &edit.document_changes else {
			panic!("expected text document edits");
		};
		assert_eq!(changes[0].text_document.version, Some(7));
		let edits = text_edits_for(&edit, &document);
		assert_eq!(apply_text_edits(&document, &edits).unwrap(), "<root><b></b></root>");
	}

	#[test]
	fn test_overlapping_edits_are_rejected() {
		let document = Document::parse(Url::parse("file:///a.xml").unwrap(), 1, "<r></r>x");
		let edits = [
			TextEdit::new(Range::new(Position::new(0, 0), Position::new(0, 8)), String::new()),
			TextEdit::new(Range::new(Position::new(0, 2), Position::new(0, 8)), String::new()),
		];
		let error = apply_text_edits(&document, &edits).unwrap_err();
		assert!(matches!(error, Error::OverlappingEdits { first: (0, 8), second: (2, 8) }));
	}

	#[test]
	fn test_adjacent_and_coincident_edits() {
		let document = Document::parse(Url::parse("file:///a.xml").unwrap(), 1, "<r></r>");
		let edits = [
			TextEdit::new(Range::new(Position::new(0, 3), Position::new(0, 3)), "a".into()),
			TextEdit::new(Range::new(Position::new(0, 1), Position::new(0, 2)), "s".into()),
			TextEdit::new(Range::new(Position::new(0, 3), Position::new(0, 3)), "b".into()),
			TextEdit::new(Range::new(Position::new(0, 2), Position::new(0, 3)), " x=\"\">".into()),
		];
		assert_eq!(apply_text_edits(&document, &edits).unwrap(), "<s x=\"\">ab</r>");
	}
}
