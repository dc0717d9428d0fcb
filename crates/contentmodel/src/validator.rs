//! Content-model validation of a document snapshot.

use lsp_types::{Diagnostic, DiagnosticSeverity};
use serde_json::{Value, json};
use tracing::trace;
use xmlls_dom::{Document, ElementRef, Url};

use crate::cancel::{CancelChecker, Cancelled};
use crate::codes::ErrorCode;
use crate::manager::ContentModelManager;
use crate::model::{ElementDecl, ElementDeclaration, GrammarDocument};

/// `source` of every diagnostic produced by this crate.
pub const DIAGNOSTIC_SOURCE: &str = "xml";

/// Attribute prefixes that are never checked against a grammar.
const RESERVED_PREFIXES: &[&str] = &["xml", "xsi"];

/// Validates documents against the grammars bound to them.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
	manager: &'a ContentModelManager,
	cancel: &'a CancelChecker,
}

impl<'a> Validator<'a> {
	/// Creates a validator observing `cancel`.
	pub fn new(manager: &'a ContentModelManager, cancel: &'a CancelChecker) -> Self {
		Self { manager, cancel }
	}

	/// Validates `document` against every applicable grammar.
	///
	/// A document without grammars yields no diagnostics.
	pub fn validate(&self, document: &Document) -> Result<Vec<Diagnostic>, Cancelled> {
		let grammars = self.manager.find_applicable_grammars(document, self.cancel)?;
		let mut diagnostics = Vec::new();
		for grammar in &grammars {
			self.validate_with(document, grammar.as_ref(), &mut diagnostics)?;
		}
		Ok(diagnostics)
	}

	/// Validates `document` against one grammar, appending to `out`.
	pub fn validate_with(
		&self,
		document: &Document,
		grammar: &dyn GrammarDocument,
		out: &mut Vec<Diagnostic>,
	) -> Result<(), Cancelled> {
		let Some(root) = document.root_element() else {
			return Ok(());
		};
		let mut sink = Sink {
			document,
			grammar: grammar.uri(),
			out,
		};
		let Some(root_decl) = self.manager.find_declaration(grammar, &root) else {
			sink.push(
				root.start_tag_name_span(),
				ErrorCode::ElementUndeclared,
				format!("Element '{}' is not declared in {}.", root.tag_name(), grammar.uri()),
				None,
			);
			return Ok(());
		};

		let mut stack: Vec<(ElementRef<'_>, ElementDecl)> = vec![(root, root_decl)];
		while let Some((element, decl)) = stack.pop() {
			self.cancel.check()?;
			check_attributes(&mut sink, &element, decl.as_ref());
			check_children(&mut sink, &element, decl.as_ref());

			let children: Vec<_> = element.child_elements().collect();
			for child in children.into_iter().rev() {
				let child_decl = decl
					.find_child(&child)
					.or_else(|| self.manager.find_declaration(grammar, &child));
				if let Some(child_decl) = child_decl {
					stack.push((child, child_decl));
				}
			}
		}
		Ok(())
	}
}

struct Sink<'d, 'o> {
	document: &'d Document,
	/// Grammar the diagnostics are reported against.
	grammar: &'d Url,
	out: &'o mut Vec<Diagnostic>,
}

impl Sink<'_, '_> {
	fn push(&mut self, span: (usize, usize), code: ErrorCode, message: String, data: Option<Value>) {
		let range = match self.document.range_at(span.0, span.1) {
			Ok(range) => range,
			Err(error) => {
				trace!(%error, %code, "diagnostic span outside document");
				return;
			}
		};
		self.out.push(Diagnostic {
			range,
			severity: Some(DiagnosticSeverity::ERROR),
			code: Some(code.into()),
			source: Some(DIAGNOSTIC_SOURCE.to_string()),
			message,
			data,
			..Default::default()
		});
	}
}

fn check_attributes(sink: &mut Sink<'_, '_>, element: &ElementRef<'_>, decl: &dyn ElementDeclaration) {
	let attributes = element.element().attributes();
	for attr_decl in decl.attributes().iter().filter(|a| a.is_required()) {
		let present = attributes
			.values()
			.any(|attr| attr.name() == attr_decl.name() || attr.local_name() == attr_decl.name());
		if !present {
			sink.push(
				element.start_tag_name_span(),
				ErrorCode::RequiredAttributeMissing,
				format!(
					"Attribute '{}' is required on element '{}'.",
					attr_decl.name(),
					element.tag_name()
				),
				Some(json!({ "attributeName": attr_decl.name() })),
			);
		}
	}

	for attr in attributes.values() {
		if attr.is_xmlns() || attr.prefix().is_some_and(|p| RESERVED_PREFIXES.contains(&p)) {
			continue;
		}
		let Some(attr_decl) = decl
			.find_attribute(attr.name())
			.or_else(|| decl.find_attribute(attr.local_name()))
		else {
			if !decl.accepts_any_attribute() {
				sink.push(
					attr.name_span(),
					ErrorCode::AttributeNotAllowed,
					format!(
						"Attribute '{}' is not allowed on element '{}'.",
						attr.name(),
						element.tag_name()
					),
					None,
				);
			}
			continue;
		};
		let allowed = attr_decl.enumerated_values();
		let Some(value) = attr.value() else {
			continue;
		};
		if !allowed.is_empty() && !allowed.iter().any(|v| v == value.trim()) {
			sink.push(
				attr.value_span().unwrap_or(attr.name_span()),
				ErrorCode::AttributeValueInvalid,
				format!(
					"Value '{value}' is not valid for attribute '{}'. Expected one of: {}.",
					attr.name(),
					quote_list(&allowed)
				),
				None,
			);
		}
	}
}

fn check_children(sink: &mut Sink<'_, '_>, element: &ElementRef<'_>, decl: &dyn ElementDeclaration) {
	let check = decl.check_content(element);
	let document = element.document();
	for unexpected in &check.unexpected {
		let Some(child) = document.element(unexpected.node) else {
			continue;
		};
		let message = if unexpected.expected.is_empty() {
			format!(
				"Element '{}' is not allowed here: '{}' expects no more child elements.",
				child.tag_name(),
				element.tag_name()
			)
		} else {
			format!(
				"Element '{}' is not allowed here. Expected: {}.",
				child.tag_name(),
				quote_list(&unexpected.expected)
			)
		};
		sink.push(child.start_tag_name_span(), ErrorCode::ElementNotAllowed, message, None);
	}

	if !check.incomplete {
		return;
	}
	let parent = element.local_name();
	let grammar_uri = sink.grammar.as_str().to_string();
	let alternatives = decl.possible_required_elements(element);
	match alternatives.as_slice() {
		[] => sink.push(
			element.start_tag_name_span(),
			ErrorCode::IncompleteContent,
			if check.expected.is_empty() {
				format!("Content of element '{}' is incomplete.", element.tag_name())
			} else {
				format!(
					"Content of element '{}' is incomplete. Expected: {}.",
					element.tag_name(),
					quote_list(&check.expected)
				)
			},
			None,
		),
		[only] => sink.push(
			element.start_tag_name_span(),
			ErrorCode::RequiredElementMissing,
			format!(
				"Element '{}' is missing required child element '{}'.",
				element.tag_name(),
				only.local_name()
			),
			Some(json!({
				"parentLocalName": parent,
				"elementLocalName": only.local_name(),
				"grammarUri": grammar_uri,
			})),
		),
		many => {
			let names: Vec<String> = many.iter().map(|d| d.local_name().to_string()).collect();
			sink.push(
				element.start_tag_name_span(),
				ErrorCode::RequiredElementsMissing,
				format!(
					"Element '{}' is missing a required child element. Expected one of: {}.",
					element.tag_name(),
					quote_list(&names)
				),
				Some(json!({ "parentLocalName": parent, "grammarUri": grammar_uri })),
			);
		}
	}
}

fn quote_list(names: &[String]) -> String {
	names.iter().map(|n| format!("'{n}'")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests;
