//! Diagnostics, hover and settings through the service facade.

use std::sync::Arc;

use lsp_types::{DiagnosticSeverity, HoverContents, NumberOrString, Position};
use pretty_assertions::assert_eq;
use xmlls_contentmodel::{CancelChecker, ContentModelManager, MemoryLoader};
use xmlls_dom::{Document, Url};
use xmlls_service::{NoGrammarSeverity, XmlLanguageService, XmlSettings, apply_text_edits, text_edits_for};

const BOOK_RNG: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"
	xmlns:a="http://relaxng.org/ns/compatibility/annotations/1.0">
	<start>
		<element name="book">
			<a:documentation>A book.</a:documentation>
			<attribute name="id">
				<a:documentation>Unique key.</a:documentation>
			</attribute>
			<element name="title"><text/></element>
			<choice>
				<element name="chapter"><text/></element>
				<element name="appendix"><empty/></element>
			</choice>
		</element>
	</start>
</grammar>"#;

fn service_with(settings: XmlSettings) -> XmlLanguageService {
	let loader = Arc::new(MemoryLoader::new());
	loader.insert(Url::parse("file:///s/book.rng").unwrap(), BOOK_RNG);
	XmlLanguageService::new(Arc::new(ContentModelManager::new(loader)), settings).unwrap()
}

fn associated() -> XmlSettings {
	XmlSettings::from_json(r#"{ "fileAssociations": [{ "pattern": "**/*.book.xml", "systemId": "file:///s/book.rng" }] }"#)
		.unwrap()
}

fn doc(name: &str, text: &str) -> Document {
	Document::parse(Url::parse(&format!("file:///w/{name}")).unwrap(), 1, text)
}

fn codes(service: &XmlLanguageService, document: &Document) -> Vec<String> {
	service
		.diagnostics(document, &CancelChecker::never())
		.unwrap()
		.into_iter()
		.filter_map(|d| match d.code {
			Some(NumberOrString::String(code)) => Some(code),
			_ => None,
		})
		.collect()
}

#[test]
fn test_validation_through_file_association() {
	let service = service_with(associated());
	let document = doc("a.book.xml", r#"<book lang="en"><title/><chapter/><extra/></book>"#);
	assert_eq!(
		codes(&service, &document),
		vec!["required-attribute-missing", "attribute-not-allowed", "element-not-allowed"]
	);

	let unmatched = doc("a.xml", "<book/>");
	assert_eq!(codes(&service, &unmatched), vec!["no-grammar"]);
}

#[test]
fn test_no_grammar_severity() {
	let service = service_with(XmlSettings::default());
	let document = doc("a.xml", "<book/>");
	let diagnostics = service.diagnostics(&document, &CancelChecker::never()).unwrap();
	assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::HINT));

	let mut settings = XmlSettings::default();
	settings.validation.no_grammar = NoGrammarSeverity::Ignore;
	service.update_settings(settings).unwrap();
	assert!(codes(&service, &document).is_empty());

	let mut settings = XmlSettings::default();
	settings.validation.enabled = false;
	service.update_settings(settings).unwrap();
	assert!(codes(&service, &doc("b.xml", "<book><")).is_empty());
}

#[test]
fn test_syntax_errors_are_reported() {
	let service = service_with(XmlSettings::default());
	let document = doc("a.xml", "<book id=></book>");
	assert!(codes(&service, &document).iter().any(|c| c == "xml-syntax-error"));
}

#[test]
fn test_required_attribute_quick_fix() {
	let service = service_with(associated());
	let document = doc("a.book.xml", "<book><title/><appendix/></book>");
	let diagnostics = service.diagnostics(&document, &CancelChecker::never()).unwrap();
	assert_eq!(diagnostics.len(), 1);
	let actions = service
		.code_actions(&document, &diagnostics, &CancelChecker::never())
		.unwrap();
	assert_eq!(actions.len(), 1);
	assert_eq!(actions[0].title, "Insert required attribute 'id'");
	let edit = actions[0].edit.as_ref().unwrap();
	assert_eq!(
		apply_text_edits(&document, &text_edits_for(edit, &document)).unwrap(),
		r#"<book id=""><title/><appendix/></book>"#
	);
}

#[test]
fn test_single_alternative_is_preferred() {
	let service = service_with(associated());
	let document = doc("b.book.xml", r#"<book id="1"></book>"#);
	let diagnostics = service.diagnostics(&document, &CancelChecker::never()).unwrap();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(
		diagnostics[0].data,
		Some(serde_json::json!({
			"parentLocalName": "book",
			"elementLocalName": "title",
			"grammarUri": "file:///s/book.rng",
		}))
	);
	let actions = service
		.code_actions(&document, &diagnostics, &CancelChecker::never())
		.unwrap();
	assert_eq!(actions.len(), 1);
	assert_eq!(actions[0].is_preferred, Some(true));
	let resolved = service
		.resolve_code_action(actions[0].clone(), &document, &CancelChecker::never())
		.unwrap();
	let edits = text_edits_for(resolved.edit.as_ref().unwrap(), &document);
	assert_eq!(edits[0].new_text, "<title></title>");
}

#[test]
fn test_hover_shows_documentation() {
	let service = service_with(associated());
	let document = doc("a.book.xml", r#"<book id="1"><title/><appendix/></book>"#);

	let hover = service
		.hover(&document, Position::new(0, 2), &CancelChecker::never())
		.unwrap()
		.unwrap();
	let HoverContents::Markup(content) = hover.contents else {
		panic!("expected markup");
	};
	assert!(content.value.starts_with("**book**\n\nA book."));
	assert!(content.value.contains("file:///s/book.rng"));
	assert_eq!(hover.range.map(|r| (r.start.character, r.end.character)), Some((1, 5)));

	let hover = service
		.hover(&document, Position::new(0, 7), &CancelChecker::never())
		.unwrap()
		.unwrap();
	let HoverContents::Markup(content) = hover.contents else {
		panic!("expected markup");
	};
	assert!(content.value.starts_with("**id**\n\nUnique key."));

	let outside = service
		.hover(&document, Position::new(0, 10), &CancelChecker::never())
		.unwrap();
	assert!(outside.is_none());
}

#[test]
fn test_completion_through_service() {
	let service = service_with(associated());
	let document = doc("a.book.xml", r#"<book id="1"><title/></book>"#);
	let list = service
		.completion(&document, Position::new(0, 21), &CancelChecker::never())
		.unwrap();
	let mut labels: Vec<_> = list.items.iter().map(|i| i.label.as_str()).collect();
	labels.sort_unstable();
	assert_eq!(labels, vec!["appendix", "chapter", "title"]);
}

#[test]
fn test_closing_a_document_drops_its_inline_grammar() {
	let service = service_with(XmlSettings::default());
	let document = doc("inline.xml", "<!DOCTYPE note [<!ELEMENT note (#PCDATA)>]><note>hi</note>");
	service.diagnostics(&document, &CancelChecker::never()).unwrap();
	assert_eq!(service.manager().cached_count(), 1);

	service.document_closed(document.url());
	assert_eq!(service.manager().cached_count(), 0);
}
