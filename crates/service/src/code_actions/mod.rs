//! Code-action listing.
//!
//! Each [`CodeActionParticipant`] turns diagnostics of the codes it handles
//! into actions. Participants for expensive edits list actions without an edit
//! and leave the work to a [`CodeActionResolver`](crate::CodeActionResolver).

pub(crate) mod required_attribute;
pub(crate) mod required_elements;

use std::sync::Arc;

use lsp_types::{CodeAction, Diagnostic};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use xmlls_contentmodel::{CancelChecker, ContentModelManager, ErrorCode, XmlGenerator};
use xmlls_dom::{Document, ElementRef};

pub use self::required_attribute::RequiredAttributeParticipant;
pub use self::required_elements::{RequiredElementsParticipant, RequiredElementsResolver};
use crate::settings::XmlSettings;
use crate::{Error, Result};

/// Everything a participant or resolver may consult for one request.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
	/// Snapshot the request runs against.
	pub document: &'a Document,
	/// Shared content model.
	pub manager: &'a ContentModelManager,
	/// Settings in effect for the request.
	pub settings: &'a XmlSettings,
	/// Generator configured from the format settings.
	pub generator: &'a XmlGenerator,
	/// Request cancellation.
	pub cancel: &'a CancelChecker,
}

/// Payload of a listed, unresolved action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
	/// Diagnostic code the action fixes.
	pub code: String,
	/// Document the action was listed for.
	pub uri: String,
	/// Local name of the element whose content is incomplete.
	pub parent_local_name: String,
	/// Alternative the action inserts.
	pub element_local_name: String,
}

impl ActionData {
	/// Reads the payload of `action`.
	pub fn from_action(action: &CodeAction) -> Result<Self> {
		let value = action
			.data
			.clone()
			.ok_or_else(|| Error::MalformedPayload("code action has no data".into()))?;
		Ok(serde_json::from_value(value)?)
	}

	/// JSON form stored in `CodeAction::data`.
	pub fn to_value(&self) -> Value {
		serde_json::json!({
			"code": self.code,
			"uri": self.uri,
			"parentLocalName": self.parent_local_name,
			"elementLocalName": self.element_local_name,
		})
	}
}

/// Lists code actions for diagnostics of the codes it handles.
pub trait CodeActionParticipant: Send + Sync {
	/// Diagnostic codes handled.
	fn codes(&self) -> &'static [ErrorCode];

	/// Appends actions for `diagnostic` to `out`.
	fn list(&self, diagnostic: &Diagnostic, cx: &ActionContext<'_>, out: &mut Vec<CodeAction>) -> Result<()>;
}

/// Built-in participants.
pub(crate) fn default_participants() -> Vec<Arc<dyn CodeActionParticipant>> {
	vec![Arc::new(RequiredElementsParticipant), Arc::new(RequiredAttributeParticipant)]
}

/// Re-locates the element a diagnostic was reported on.
///
/// Element diagnostics start at the `<` of the start tag; one char further is
/// strictly inside the element's span.
pub(crate) fn element_at_diagnostic<'d>(
	document: &'d Document,
	diagnostic: &Diagnostic,
) -> Result<Option<ElementRef<'d>>> {
	let offset = document.offset_at(diagnostic.range.start)? + 1;
	Ok(document.find_element_at(offset))
}

/// String field of a diagnostic's `data` object.
pub(crate) fn data_str<'a>(diagnostic: &'a Diagnostic, field: &str) -> Option<&'a str> {
	diagnostic.data.as_ref()?.get(field)?.as_str()
}
