use lsp_types::{Diagnostic, NumberOrString, Range};
use pretty_assertions::assert_eq;
use xmlls_contentmodel::{CancelChecker, Cancelled, ContentModelManager, MemoryLoader, XmlGenerator};
use xmlls_dom::{Document, Url};

use super::*;
use crate::settings::XmlSettings;

struct Fixed(Result<Option<WorkspaceEdit>, fn() -> Error>);

impl CodeActionResolver for Fixed {
	fn resolve(&self, _action: &CodeAction, _cx: &ActionContext<'_>) -> Result<Option<WorkspaceEdit>> {
		match &self.0 {
			Ok(edit) => Ok(edit.clone()),
			Err(make) => Err(make()),
		}
	}
}

struct Fixture {
	document: Document,
	manager: ContentModelManager,
	settings: XmlSettings,
	generator: XmlGenerator,
	cancel: CancelChecker,
}

impl Fixture {
	fn new() -> Self {
		Self {
			document: Document::parse(Url::parse("file:///doc.xml").unwrap(), 1, "<root/>"),
			manager: ContentModelManager::new(Arc::new(MemoryLoader::new())),
			settings: XmlSettings::default(),
			generator: XmlGenerator::default(),
			cancel: CancelChecker::never(),
		}
	}

	fn cx(&self) -> ActionContext<'_> {
		ActionContext {
			document: &self.document,
			manager: &self.manager,
			settings: &self.settings,
			generator: &self.generator,
			cancel: &self.cancel,
		}
	}
}

fn action(code: &str) -> CodeAction {
	CodeAction {
		title: "fix".into(),
		diagnostics: Some(vec![Diagnostic {
			range: Range::default(),
			code: Some(NumberOrString::String(code.into())),
			message: "m".into(),
			..Default::default()
		}]),
		..Default::default()
	}
}

#[test]
fn test_defaults_cover_required_element_codes() {
	let registry = CodeActionResolverRegistry::with_defaults();
	assert!(registry.contains(ErrorCode::RequiredElementsMissing));
	assert!(registry.contains(ErrorCode::RequiredElementMissing));
	assert!(!registry.contains(ErrorCode::ElementNotAllowed));
}

#[test]
fn test_unknown_code_is_returned_unchanged() {
	let fixture = Fixture::new();
	let registry = CodeActionResolverRegistry::with_defaults();
	let original = action("not-a-code");
	let resolved = registry.resolve(original.clone(), &fixture.cx()).unwrap();
	assert_eq!(resolved, original);

	let unregistered = action("element-not-allowed");
	let resolved = registry.resolve(unregistered.clone(), &fixture.cx()).unwrap();
	assert_eq!(resolved, unregistered);
}

#[test]
fn test_edit_is_attached() {
	let fixture = Fixture::new();
	let mut registry = CodeActionResolverRegistry::new();
	let edit = WorkspaceEdit::default();
	registry.register(ErrorCode::IncompleteContent, Arc::new(Fixed(Ok(Some(edit.clone())))));
	let resolved = registry.resolve(action("incomplete-content"), &fixture.cx()).unwrap();
	assert_eq!(resolved.edit, Some(edit));
}

#[test]
fn test_failures_leave_action_unchanged() {
	let fixture = Fixture::new();
	let mut registry = CodeActionResolverRegistry::new();
	registry.register(ErrorCode::IncompleteContent, Arc::new(Fixed(Ok(None))));
	registry.register(
		ErrorCode::ElementNotAllowed,
		Arc::new(Fixed(Err(|| Error::MalformedPayload("missing".into())))),
	);
	for code in ["incomplete-content", "element-not-allowed"] {
		let original = action(code);
		let resolved = registry.resolve(original.clone(), &fixture.cx()).unwrap();
		assert_eq!(resolved, original);
	}
}

#[test]
fn test_cancellation_propagates() {
	let fixture = Fixture::new();
	let mut registry = CodeActionResolverRegistry::new();
	registry.register(ErrorCode::IncompleteContent, Arc::new(Fixed(Err(|| Error::Cancelled(Cancelled)))));
	let err = registry.resolve(action("incomplete-content"), &fixture.cx()).unwrap_err();
	assert!(err.is_cancelled());
}

#[test]
fn test_dispatch_falls_back_to_payload() {
	let data = ActionData {
		code: "required-elements-missing".into(),
		uri: "file:///doc.xml".into(),
		parent_local_name: "root".into(),
		element_local_name: "b".into(),
	};
	let action = CodeAction {
		title: "fix".into(),
		data: Some(data.to_value()),
		..Default::default()
	};
	assert_eq!(dispatch_code(&action), Some(ErrorCode::RequiredElementsMissing));
}
