//! Lazy code-action resolution.
//!
//! Listed actions carry a JSON payload and no edit. Resolution dispatches on
//! the code of the action's diagnostic to a [`CodeActionResolver`], which
//! re-locates its target in the snapshot passed to [`CodeActionResolverRegistry::resolve`].

use std::sync::Arc;

use lsp_types::{CodeAction, WorkspaceEdit};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use xmlls_contentmodel::ErrorCode;

use crate::code_actions::{ActionContext, ActionData};
use crate::code_actions::required_elements::RequiredElementsResolver;
use crate::{Error, Result};

/// Computes the edit of one family of code actions.
pub trait CodeActionResolver: Send + Sync {
	/// Returns the edit for `action`, or `None` when the action no longer
	/// applies to the snapshot in `cx`.
	fn resolve(&self, action: &CodeAction, cx: &ActionContext<'_>) -> Result<Option<WorkspaceEdit>>;
}

/// Resolvers keyed by diagnostic code.
#[derive(Default, Clone)]
pub struct CodeActionResolverRegistry {
	resolvers: FxHashMap<ErrorCode, Arc<dyn CodeActionResolver>>,
}

impl std::fmt::Debug for CodeActionResolverRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CodeActionResolverRegistry")
			.field("codes", &self.resolvers.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl CodeActionResolverRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with the built-in resolvers.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		let required: Arc<dyn CodeActionResolver> = Arc::new(RequiredElementsResolver);
		registry.register(ErrorCode::RequiredElementsMissing, Arc::clone(&required));
		registry.register(ErrorCode::RequiredElementMissing, required);
		registry
	}

	/// Registers `resolver` for `code`, replacing any previous one.
	pub fn register(&mut self, code: ErrorCode, resolver: Arc<dyn CodeActionResolver>) {
		self.resolvers.insert(code, resolver);
	}

	/// Whether a resolver is registered for `code`.
	pub fn contains(&self, code: ErrorCode) -> bool {
		self.resolvers.contains_key(&code)
	}

	/// Resolves `action` against the snapshot in `cx`.
	///
	/// The action is returned unchanged when no resolver is registered for its
	/// code or when the resolver cannot apply it. Only cancellation is an error.
	pub fn resolve(&self, mut action: CodeAction, cx: &ActionContext<'_>) -> Result<CodeAction> {
		let Some(code) = dispatch_code(&action) else {
			trace!(title = %action.title, "code action without a known code");
			return Ok(action);
		};
		let Some(resolver) = self.resolvers.get(&code) else {
			trace!(%code, "no resolver registered");
			return Ok(action);
		};
		match resolver.resolve(&action, cx) {
			Ok(Some(edit)) => action.edit = Some(edit),
			Ok(None) => debug!(%code, title = %action.title, "code action no longer applies"),
			Err(Error::Cancelled(cancelled)) => return Err(cancelled.into()),
			Err(error) => debug!(%code, %error, "code action resolution failed"),
		}
		Ok(action)
	}
}

/// Code of the first diagnostic carried by `action`, falling back to the payload.
fn dispatch_code(action: &CodeAction) -> Option<ErrorCode> {
	if let Some(diagnostic) = action.diagnostics.as_ref().and_then(|d| d.first()) {
		return ErrorCode::from_diagnostic(diagnostic);
	}
	let data = ActionData::from_action(action).ok()?;
	data.code.parse().ok()
}

#[cfg(test)]
mod tests;
