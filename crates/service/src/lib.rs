//! XML language features driven by the content model.
//!
//! [`XmlLanguageService`] is the entry point. It owns the shared
//! [`ContentModelManager`](xmlls_contentmodel::ContentModelManager) and the
//! [`CodeActionResolverRegistry`], and answers requests against the document
//! snapshot passed with each call. Code actions are two-phase: listing returns
//! cheap actions without edits, and [`XmlLanguageService::resolve_code_action`]
//! computes the edit later against the then-current snapshot.

pub mod code_actions;
mod completion;
mod diagnostics;
mod edit;
mod hover;
pub mod resolver;
mod service;
pub mod settings;

pub use code_actions::{ActionContext, ActionData, CodeActionParticipant};
pub use edit::{apply_text_edits, text_edits_for};
pub use resolver::{CodeActionResolver, CodeActionResolverRegistry};
pub use service::XmlLanguageService;
pub use settings::{
	CodeActionSettings, CompletionSettings, DuplicateAlternativePolicy, FormatSettings, NoGrammarSeverity,
	ValidationSettings, XmlSettings,
};
use xmlls_contentmodel::Cancelled;
use xmlls_dom::DomError;

/// A convenient type alias for `Result` with `E` = [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Request failures.
///
/// Only [`Error::Cancelled`] leaves the code-action resolution path; every
/// other variant degrades to "no fix".
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The client cancelled the request.
	#[error(transparent)]
	Cancelled(#[from] Cancelled),
	/// A position or offset does not exist in the snapshot.
	#[error("bad location: {0}")]
	BadLocation(#[from] DomError),
	/// A code action's `data` lacks required fields.
	#[error("malformed code action payload: {0}")]
	MalformedPayload(String),
	/// A document URL cannot be expressed as an LSP URI.
	#[error("invalid document URI: {0}")]
	InvalidUri(String),
	/// Two text edits touch the same characters.
	#[error("overlapping text edits at {first:?} and {second:?}")]
	OverlappingEdits { first: (usize, usize), second: (usize, usize) },
	/// JSON (de)serialization failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Whether this is a cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Error::Cancelled(_))
	}
}
