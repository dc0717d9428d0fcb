//! Batch application of quick fixes.

use lsp_types::{CodeAction, Diagnostic, TextEdit};
use tracing::{debug, info};
use xmlls_contentmodel::CancelChecker;
use xmlls_dom::Document;
use xmlls_service::{ActionData, XmlLanguageService, apply_text_edits, text_edits_for};

/// Resolves one action per diagnostic and applies the non-overlapping edits.
///
/// Returns `None` when nothing could be fixed.
pub fn fix_document(
	service: &XmlLanguageService,
	document: &Document,
	element: Option<&str>,
	cancel: &CancelChecker,
) -> xmlls_service::Result<Option<String>> {
	let diagnostics = service.diagnostics(document, cancel)?;
	let actions = service.code_actions(document, &diagnostics, cancel)?;

	let mut edits = Vec::new();
	for diagnostic in &diagnostics {
		let Some(action) = choose(&actions, diagnostic, element) else {
			continue;
		};
		let resolved = service.resolve_code_action(action.clone(), document, cancel)?;
		match &resolved.edit {
			Some(edit) => {
				info!(title = %resolved.title, "applying fix");
				edits.extend(text_edits_for(edit, document));
			}
			None => debug!(title = %resolved.title, "fix produced no edit"),
		}
	}

	let edits = without_overlaps(edits);
	if edits.is_empty() {
		return Ok(None);
	}
	apply_text_edits(document, &edits).map(Some)
}

/// Picks the action fixing `diagnostic`: the one inserting `element` if
/// given, else the preferred one, else the first.
fn choose<'a>(actions: &'a [CodeAction], diagnostic: &Diagnostic, element: Option<&str>) -> Option<&'a CodeAction> {
	let candidates: Vec<&CodeAction> = actions
		.iter()
		.filter(|a| a.diagnostics.as_ref().and_then(|d| d.first()) == Some(diagnostic))
		.collect();
	if let Some(element) = element
		&& let Some(found) = candidates.iter().copied().find(|a| {
			ActionData::from_action(a).is_ok_and(|data| data.element_local_name == element)
		}) {
		return Some(found);
	}
	candidates
		.iter()
		.copied()
		.find(|a| a.is_preferred == Some(true))
		.or_else(|| candidates.first().copied())
}

/// Drops every edit that overlaps an earlier one in document order.
fn without_overlaps(mut edits: Vec<TextEdit>) -> Vec<TextEdit> {
	edits.sort_by_key(|e| (e.range.start, e.range.end));
	let mut kept: Vec<TextEdit> = Vec::with_capacity(edits.len());
	for edit in edits {
		if kept.last().is_some_and(|last| last.range.end > edit.range.start) {
			debug!(range = ?edit.range, "overlapping fix skipped");
			continue;
		}
		kept.push(edit);
	}
	kept
}

#[cfg(test)]
mod tests {
	use lsp_types::{Position, Range};
	use pretty_assertions::assert_eq;

	use super::*;

	fn edit(start: u32, end: u32, text: &str) -> TextEdit {
		TextEdit {
			range: Range::new(Position::new(0, start), Position::new(0, end)),
			new_text: text.into(),
		}
	}

	#[test]
	fn test_overlapping_edits_are_dropped() {
		let kept = without_overlaps(vec![edit(6, 10, "<c/>"), edit(2, 2, " a=\"\""), edit(6, 10, "<b/>"), edit(2, 2, " b=\"\"")]);
		let texts: Vec<_> = kept.iter().map(|e| e.new_text.as_str()).collect();
		assert_eq!(texts, vec![" a=\"\"", " b=\"\"", "<c/>"]);
	}
}
