//! Quick fixes for content missing a required child element.
//!
//! Listing offers one action per alternative of the grammar that reported
//! the diagnostic. Resolution re-locates the
//! incomplete element in the current snapshot, asks the grammars again for
//! its alternatives and replaces the element's content with the generated
//! element.

use lsp_types::{CodeAction, CodeActionKind, Diagnostic, WorkspaceEdit};
use tracing::debug;
use xmlls_contentmodel::{ElementDecl, ErrorCode};

use super::{ActionContext, ActionData, CodeActionParticipant, data_str, element_at_diagnostic};
use crate::edit::replace_edit;
use crate::resolver::CodeActionResolver;
use crate::settings::DuplicateAlternativePolicy;
use crate::{Error, Result};

const CODES: &[ErrorCode] = &[ErrorCode::RequiredElementsMissing, ErrorCode::RequiredElementMissing];

/// Lists one unresolved action per expected element.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredElementsParticipant;

impl CodeActionParticipant for RequiredElementsParticipant {
	fn codes(&self) -> &'static [ErrorCode] {
		CODES
	}

	fn list(&self, diagnostic: &Diagnostic, cx: &ActionContext<'_>, out: &mut Vec<CodeAction>) -> Result<()> {
		let Some(code) = ErrorCode::from_diagnostic(diagnostic) else {
			return Ok(());
		};
		let Some(parent) = data_str(diagnostic, "parentLocalName") else {
			debug!(%code, "diagnostic without parentLocalName");
			return Ok(());
		};

		let names = match data_str(diagnostic, "elementLocalName") {
			Some(name) => vec![name.to_string()],
			None => alternative_names(diagnostic, parent, cx)?,
		};
		let preferred = names.len() == 1;
		for name in names {
			let data = ActionData {
				code: code.to_string(),
				uri: cx.document.url().to_string(),
				parent_local_name: parent.to_string(),
				element_local_name: name.clone(),
			};
			out.push(CodeAction {
				title: format!("Insert expected element '{name}'"),
				kind: Some(CodeActionKind::QUICKFIX),
				diagnostics: Some(vec![diagnostic.clone()]),
				is_preferred: preferred.then_some(true),
				data: Some(data.to_value()),
				..Default::default()
			});
		}
		Ok(())
	}
}

fn alternative_names(diagnostic: &Diagnostic, parent: &str, cx: &ActionContext<'_>) -> Result<Vec<String>> {
	let Some(element) = element_at_diagnostic(cx.document, diagnostic)? else {
		return Ok(Vec::new());
	};
	if element.local_name() != parent {
		return Ok(Vec::new());
	}
	let reported_by = data_str(diagnostic, "grammarUri");
	let mut names: Vec<String> = Vec::new();
	for grammar in cx.manager.find_applicable_grammars(cx.document, cx.cancel)? {
		cx.cancel.check()?;
		if reported_by.is_some_and(|uri| uri != grammar.uri().as_str()) {
			continue;
		}
		let Some(decl) = cx.manager.find_declaration(grammar.as_ref(), &element) else {
			continue;
		};
		for alternative in decl.possible_required_elements(&element) {
			if !names.iter().any(|n| n == alternative.local_name()) {
				names.push(alternative.local_name().to_string());
			}
		}
	}
	Ok(names)
}

/// Computes the insertion edit for a listed action.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredElementsResolver;

impl CodeActionResolver for RequiredElementsResolver {
	fn resolve(&self, action: &CodeAction, cx: &ActionContext<'_>) -> Result<Option<WorkspaceEdit>> {
		let data = ActionData::from_action(action)?;
		let diagnostic = action
			.diagnostics
			.as_ref()
			.and_then(|d| d.first())
			.ok_or_else(|| Error::MalformedPayload("code action has no diagnostic".into()))?;
		if data.uri != cx.document.url().as_str() {
			debug!(uri = %data.uri, document = %cx.document.url(), "code action belongs to another document");
			return Ok(None);
		}

		let Some(element) = element_at_diagnostic(cx.document, diagnostic)? else {
			debug!(range = ?diagnostic.range, "no element at diagnostic");
			return Ok(None);
		};
		if element.local_name() != data.parent_local_name {
			debug!(
				expected = %data.parent_local_name,
				found = element.local_name(),
				"element at diagnostic changed"
			);
			return Ok(None);
		}
		let Some((start, end)) = element.element().content_span() else {
			debug!(element = element.local_name(), "element has no start/end tag pair");
			return Ok(None);
		};
		let range = cx.document.range_at(start, end)?;

		let policy = cx.settings.code_action.duplicate_alternative;
		let mut chosen: Option<ElementDecl> = None;
		'grammars: for grammar in cx.manager.find_applicable_grammars(cx.document, cx.cancel)? {
			cx.cancel.check()?;
			let Some(decl) = cx.manager.find_declaration(grammar.as_ref(), &element) else {
				continue;
			};
			for alternative in decl.possible_required_elements(&element) {
				if alternative.local_name() == data.element_local_name {
					chosen = Some(alternative);
					match policy {
						DuplicateAlternativePolicy::FirstMatch => break 'grammars,
						DuplicateAlternativePolicy::LastMatch => continue 'grammars,
					}
				}
			}
		}
		let Some(decl) = chosen else {
			debug!(element = %data.element_local_name, "alternative no longer expected");
			return Ok(None);
		};

		cx.cancel.check()?;
		let text = cx
			.generator
			.generate(decl.as_ref(), None, true, false, 1, cx.settings.code_action.snippet_edits);
		replace_edit(cx.document, range, text).map(Some)
	}
}
