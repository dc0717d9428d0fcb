//! The language-service facade.

use std::sync::Arc;

use lsp_types::{CodeAction, CompletionList, Diagnostic, Hover, Position};
use parking_lot::RwLock;
use tracing::{debug, info};
use xmlls_contentmodel::{CancelChecker, ContentModelManager, ErrorCode, GrammarError, XmlGenerator};
use xmlls_dom::{Document, Url};

use crate::Result;
use crate::code_actions::{ActionContext, CodeActionParticipant, default_participants};
use crate::completion::{CompletionContext, completion};
use crate::resolver::{CodeActionResolver, CodeActionResolverRegistry};
use crate::settings::XmlSettings;

/// Answers XML language requests against caller-provided snapshots.
///
/// The service holds no document state. Every request receives the
/// [`Document`] it runs against and a [`CancelChecker`]; the only shared
/// mutable state is the grammar cache inside the [`ContentModelManager`] and
/// the current settings.
pub struct XmlLanguageService {
	manager: Arc<ContentModelManager>,
	registry: CodeActionResolverRegistry,
	participants: Vec<Arc<dyn CodeActionParticipant>>,
	settings: RwLock<Arc<XmlSettings>>,
}

impl std::fmt::Debug for XmlLanguageService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("XmlLanguageService")
			.field("manager", &self.manager)
			.field("registry", &self.registry)
			.field("participants", &self.participants.len())
			.finish_non_exhaustive()
	}
}

impl XmlLanguageService {
	/// Creates a service with the built-in participants and resolvers.
	///
	/// Fails when a file association pattern is not a valid glob.
	pub fn new(manager: Arc<ContentModelManager>, settings: XmlSettings) -> Result<Self, GrammarError> {
		manager.set_file_associations(settings.file_associations.clone())?;
		Ok(Self {
			manager,
			registry: CodeActionResolverRegistry::with_defaults(),
			participants: default_participants(),
			settings: RwLock::new(Arc::new(settings)),
		})
	}

	/// Shared content model.
	pub fn manager(&self) -> &Arc<ContentModelManager> {
		&self.manager
	}

	/// Settings in effect.
	pub fn settings(&self) -> Arc<XmlSettings> {
		Arc::clone(&self.settings.read())
	}

	/// Replaces the settings. File associations take effect immediately.
	pub fn update_settings(&self, settings: XmlSettings) -> Result<(), GrammarError> {
		self.manager.set_file_associations(settings.file_associations.clone())?;
		*self.settings.write() = Arc::new(settings);
		info!("settings updated");
		Ok(())
	}

	/// Registers an additional resolver, replacing any previous one for `code`.
	pub fn register_resolver(&mut self, code: ErrorCode, resolver: Arc<dyn CodeActionResolver>) {
		self.registry.register(code, resolver);
	}

	/// Adds a code-action participant.
	pub fn add_participant(&mut self, participant: Arc<dyn CodeActionParticipant>) {
		self.participants.push(participant);
	}

	/// Diagnostics of `document`.
	pub fn diagnostics(&self, document: &Document, cancel: &CancelChecker) -> Result<Vec<Diagnostic>> {
		let settings = self.settings();
		crate::diagnostics::diagnostics(document, &self.manager, &settings, cancel)
	}

	/// Code actions for `diagnostics` of `document`.
	///
	/// Actions of the required-element family are listed without an edit
	/// unless the client lacks resolve support, in which case they are
	/// resolved before returning.
	pub fn code_actions(
		&self,
		document: &Document,
		diagnostics: &[Diagnostic],
		cancel: &CancelChecker,
	) -> Result<Vec<CodeAction>> {
		let settings = self.settings();
		let generator = XmlGenerator::new(&settings.format.generator_settings());
		let cx = ActionContext {
			document,
			manager: &self.manager,
			settings: &settings,
			generator: &generator,
			cancel,
		};

		let mut actions = Vec::new();
		for diagnostic in diagnostics {
			cancel.check()?;
			let Some(code) = ErrorCode::from_diagnostic(diagnostic) else {
				continue;
			};
			for participant in self.participants.iter().filter(|p| p.codes().contains(&code)) {
				if let Err(error) = participant.list(diagnostic, &cx, &mut actions) {
					if error.is_cancelled() {
						return Err(error);
					}
					debug!(%code, %error, "code action listing failed");
				}
			}
		}

		if !settings.code_action.resolve_support {
			actions = actions
				.into_iter()
				.map(|action| self.registry.resolve(action, &cx))
				.collect::<Result<_>>()?;
		}
		Ok(actions)
	}

	/// Resolves a listed action against the current snapshot.
	///
	/// The action comes back unchanged when it no longer applies. Only
	/// cancellation is an error.
	pub fn resolve_code_action(
		&self,
		action: CodeAction,
		document: &Document,
		cancel: &CancelChecker,
	) -> Result<CodeAction> {
		let settings = self.settings();
		let generator = XmlGenerator::new(&settings.format.generator_settings());
		let cx = ActionContext {
			document,
			manager: &self.manager,
			settings: &settings,
			generator: &generator,
			cancel,
		};
		self.registry.resolve(action, &cx)
	}

	/// Forgets per-document state once `url` is closed.
	pub fn document_closed(&self, url: &Url) {
		self.manager.evict_document(url);
	}

	/// Hover at `position`.
	pub fn hover(&self, document: &Document, position: Position, cancel: &CancelChecker) -> Result<Option<Hover>> {
		crate::hover::hover(document, position, &self.manager, cancel)
	}

	/// Completion at `position`.
	pub fn completion(
		&self,
		document: &Document,
		position: Position,
		cancel: &CancelChecker,
	) -> Result<CompletionList> {
		let settings = self.settings();
		let generator = XmlGenerator::new(&settings.format.generator_settings());
		let cx = CompletionContext {
			document,
			manager: &self.manager,
			settings: &settings,
			generator: &generator,
			cancel,
		};
		completion(&cx, position)
	}
}
