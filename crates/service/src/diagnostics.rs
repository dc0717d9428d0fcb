//! Document diagnostics: syntax errors, the missing-grammar hint and
//! content-model validation.

use lsp_types::{Diagnostic, DiagnosticSeverity, Range};
use tracing::{debug, trace};
use xmlls_contentmodel::{CancelChecker, ContentModelManager, DIAGNOSTIC_SOURCE, ErrorCode, Validator};
use xmlls_dom::Document;

use crate::Result;
use crate::settings::XmlSettings;

/// Computes every diagnostic of `document`.
pub(crate) fn diagnostics(
	document: &Document,
	manager: &ContentModelManager,
	settings: &XmlSettings,
	cancel: &CancelChecker,
) -> Result<Vec<Diagnostic>> {
	if !settings.validation.enabled {
		return Ok(Vec::new());
	}

	let mut out = Vec::new();
	for error in document.errors() {
		let Ok(position) = document.position_at(error.offset) else {
			trace!(offset = error.offset, "syntax error outside document");
			continue;
		};
		out.push(diagnostic(
			Range::new(position, position),
			DiagnosticSeverity::ERROR,
			ErrorCode::XmlSyntaxError,
			error.message.clone(),
		));
	}

	let grammars = manager.find_applicable_grammars(document, cancel)?;
	if grammars.is_empty() {
		if let (Some(severity), Some(root)) = (settings.validation.no_grammar.to_lsp(), document.root_element()) {
			let (start, end) = root.start_tag_name_span();
			out.push(diagnostic(
				document.range_at(start, end)?,
				severity,
				ErrorCode::NoGrammar,
				"No grammar constraints (DTD or RELAX NG) are bound to this document.".to_string(),
			));
		}
		return Ok(out);
	}

	let validator = Validator::new(manager, cancel);
	for grammar in &grammars {
		validator.validate_with(document, grammar.as_ref(), &mut out)?;
	}
	debug!(uri = %document.url(), count = out.len(), "validated");
	Ok(out)
}

fn diagnostic(range: Range, severity: DiagnosticSeverity, code: ErrorCode, message: String) -> Diagnostic {
	Diagnostic {
		range,
		severity: Some(severity),
		code: Some(code.into()),
		source: Some(DIAGNOSTIC_SOURCE.to_string()),
		message,
		..Default::default()
	}
}
