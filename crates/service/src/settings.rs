//! Client-facing configuration.
//!
//! The JSON shape matches LSP initialization options: camelCase keys, every
//! field optional.

use lsp_types::DiagnosticSeverity;
use serde::{Deserialize, Serialize};
use xmlls_contentmodel::{FileAssociation, GeneratorSettings};

use crate::Result;

/// Root settings object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XmlSettings {
	/// Validation switches.
	pub validation: ValidationSettings,
	/// Glob-to-grammar bindings.
	pub file_associations: Vec<FileAssociation>,
	/// Code-action behavior.
	pub code_action: CodeActionSettings,
	/// Completion behavior.
	pub completion: CompletionSettings,
	/// Indentation used for generated text.
	pub format: FormatSettings,
}

impl XmlSettings {
	/// Parses settings from a JSON value.
	pub fn from_value(value: serde_json::Value) -> Result<Self> {
		Ok(serde_json::from_value(value)?)
	}

	/// Parses settings from JSON text.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}
}

/// Validation switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationSettings {
	/// Report diagnostics at all.
	pub enabled: bool,
	/// Severity of the hint for documents without a grammar.
	pub no_grammar: NoGrammarSeverity,
}

impl Default for ValidationSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			no_grammar: NoGrammarSeverity::Hint,
		}
	}
}

/// Severity of the `no-grammar` diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoGrammarSeverity {
	/// Do not report.
	Ignore,
	/// Hint.
	#[default]
	Hint,
	/// Information.
	Info,
	/// Warning.
	Warning,
	/// Error.
	Error,
}

impl NoGrammarSeverity {
	/// LSP severity, `None` when the diagnostic is disabled.
	pub fn to_lsp(self) -> Option<DiagnosticSeverity> {
		match self {
			NoGrammarSeverity::Ignore => None,
			NoGrammarSeverity::Hint => Some(DiagnosticSeverity::HINT),
			NoGrammarSeverity::Info => Some(DiagnosticSeverity::INFORMATION),
			NoGrammarSeverity::Warning => Some(DiagnosticSeverity::WARNING),
			NoGrammarSeverity::Error => Some(DiagnosticSeverity::ERROR),
		}
	}
}

/// Code-action behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeActionSettings {
	/// The client supports `codeAction/resolve` for the `edit` property.
	/// When unset, listed actions are resolved before they are returned.
	pub resolve_support: bool,
	/// Generated element text uses snippet syntax.
	pub snippet_edits: bool,
	/// Which grammar wins when several offer the same alternative.
	pub duplicate_alternative: DuplicateAlternativePolicy,
}

impl Default for CodeActionSettings {
	fn default() -> Self {
		Self {
			resolve_support: true,
			snippet_edits: false,
			duplicate_alternative: DuplicateAlternativePolicy::FirstMatch,
		}
	}
}

/// Tie-break when more than one grammar offers an alternative with the same
/// local name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicateAlternativePolicy {
	/// The first grammar in binding order wins.
	#[default]
	FirstMatch,
	/// The last grammar in binding order wins.
	LastMatch,
}

/// Completion behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionSettings {
	/// The client accepts snippet insert text.
	pub snippet_support: bool,
}

impl Default for CompletionSettings {
	fn default() -> Self {
		Self { snippet_support: true }
	}
}

/// Indentation for generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatSettings {
	/// Spaces per level.
	pub tab_size: u32,
	/// Indent with spaces.
	pub insert_spaces: bool,
}

impl Default for FormatSettings {
	fn default() -> Self {
		Self {
			tab_size: 2,
			insert_spaces: true,
		}
	}
}

impl FormatSettings {
	/// Generator configuration for these settings.
	pub fn generator_settings(&self) -> GeneratorSettings {
		GeneratorSettings {
			tab_size: self.tab_size,
			insert_spaces: self.insert_spaces,
			..GeneratorSettings::default()
		}
	}
}
