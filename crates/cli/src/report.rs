//! Diagnostic output.

use std::path::Path;

use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

/// Severity label used in text output.
pub fn severity_label(severity: Option<DiagnosticSeverity>) -> &'static str {
	match severity {
		Some(s) if s == DiagnosticSeverity::WARNING => "warning",
		Some(s) if s == DiagnosticSeverity::INFORMATION => "info",
		Some(s) if s == DiagnosticSeverity::HINT => "hint",
		_ => "error",
	}
}

/// `path:line:column: severity [code] message`, with one-based line and column.
pub fn text_line(path: &Path, diagnostic: &Diagnostic) -> String {
	let start = diagnostic.range.start;
	let code = match &diagnostic.code {
		Some(NumberOrString::String(code)) => format!(" [{code}]"),
		Some(NumberOrString::Number(code)) => format!(" [{code}]"),
		None => String::new(),
	};
	format!(
		"{}:{}:{}: {}{code} {}",
		path.display(),
		start.line + 1,
		start.character + 1,
		severity_label(diagnostic.severity),
		diagnostic.message
	)
}

/// One JSON object per diagnostic.
pub fn json_line(path: &Path, diagnostic: &Diagnostic) -> serde_json::Result<String> {
	serde_json::to_string(&serde_json::json!({
		"path": path.display().to_string(),
		"diagnostic": diagnostic,
	}))
}

/// Whether any diagnostic is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
	diagnostics
		.iter()
		.any(|d| d.severity.is_none_or(|s| s == DiagnosticSeverity::ERROR))
}

#[cfg(test)]
mod tests {
	use lsp_types::{Position, Range};
	use pretty_assertions::assert_eq;

	use super::*;

	fn diagnostic(severity: DiagnosticSeverity) -> Diagnostic {
		Diagnostic {
			range: Range::new(Position::new(2, 4), Position::new(2, 9)),
			severity: Some(severity),
			code: Some(NumberOrString::String("required-elements-missing".into())),
			message: "Element 'root' is missing a required child element.".into(),
			..Default::default()
		}
	}

	#[test]
	fn test_text_line_is_one_based() {
		let line = text_line(Path::new("doc.xml"), &diagnostic(DiagnosticSeverity::ERROR));
		assert_eq!(
			line,
			"doc.xml:3:5: error [required-elements-missing] Element 'root' is missing a required child element."
		);
	}

	#[test]
	fn test_only_errors_fail() {
		assert!(!has_errors(&[diagnostic(DiagnosticSeverity::HINT)]));
		assert!(has_errors(&[
			diagnostic(DiagnosticSeverity::HINT),
			diagnostic(DiagnosticSeverity::ERROR)
		]));
	}

	#[test]
	fn test_json_line() {
		let line = json_line(Path::new("doc.xml"), &diagnostic(DiagnosticSeverity::WARNING)).unwrap();
		let value: serde_json::Value = serde_json::from_str(&line).unwrap();
		assert_eq!(value["path"], "doc.xml");
		assert_eq!(value["diagnostic"]["code"], "required-elements-missing");
		assert_eq!(value["diagnostic"]["severity"], 2);
	}
}
