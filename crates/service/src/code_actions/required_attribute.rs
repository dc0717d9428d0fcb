//! Quick fix inserting a missing required attribute.
//!
//! The edit is cheap, so the action is listed already resolved.

use lsp_types::{CodeAction, CodeActionKind, Diagnostic, Range};
use tracing::debug;
use xmlls_contentmodel::ErrorCode;

use super::{ActionContext, CodeActionParticipant, data_str, element_at_diagnostic};
use crate::Result;
use crate::edit::replace_edit;

/// Inserts `name=""` after the element name.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredAttributeParticipant;

impl CodeActionParticipant for RequiredAttributeParticipant {
	fn codes(&self) -> &'static [ErrorCode] {
		&[ErrorCode::RequiredAttributeMissing]
	}

	fn list(&self, diagnostic: &Diagnostic, cx: &ActionContext<'_>, out: &mut Vec<CodeAction>) -> Result<()> {
		let Some(name) = data_str(diagnostic, "attributeName") else {
			return Ok(());
		};
		let Some(element) = element_at_diagnostic(cx.document, diagnostic)? else {
			debug!(attribute = name, "no element at diagnostic");
			return Ok(());
		};
		if element.element().attribute(name).is_some() {
			return Ok(());
		}

		let (_, name_end) = element.start_tag_name_span();
		let position = cx.document.position_at(name_end)?;
		let range = Range::new(position, position);
		let edit = replace_edit(cx.document, range, format!(" {name}=\"\""))?;
		out.push(CodeAction {
			title: format!("Insert required attribute '{name}'"),
			kind: Some(CodeActionKind::QUICKFIX),
			diagnostics: Some(vec![diagnostic.clone()]),
			edit: Some(edit),
			is_preferred: Some(true),
			..Default::default()
		});
		Ok(())
	}
}
