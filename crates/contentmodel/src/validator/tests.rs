use std::sync::Arc;

use lsp_types::{NumberOrString, Position, Range};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use xmlls_dom::Url;

use super::*;
use crate::MemoryLoader;

const SCHEMA: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
	<start>
		<element name="root">
			<attribute name="version"/>
			<optional>
				<attribute name="mode">
					<choice><value>fast</value><value>safe</value></choice>
				</attribute>
			</optional>
			<zeroOrMore><element name="a"><empty/></element></zeroOrMore>
			<choice>
				<element name="b"><empty/></element>
				<element name="c"><empty/></element>
			</choice>
			<optional>
				<element name="tail"><element name="end"><empty/></element></element>
			</optional>
		</element>
	</start>
</grammar>"#;

fn manager() -> ContentModelManager {
	let loader = Arc::new(MemoryLoader::new());
	loader.insert(Url::parse("file:///schemas/root.rng").unwrap(), SCHEMA);
	ContentModelManager::new(loader)
}

fn validate(text: &str) -> Vec<Diagnostic> {
	let manager = manager();
	let document = Document::parse(
		Url::parse("file:///doc.xml").unwrap(),
		1,
		&format!(r#"<?xml-model href="/schemas/root.rng"?>{text}"#),
	);
	let cancel = CancelChecker::never();
	Validator::new(&manager, &cancel).validate(&document).unwrap()
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<String> {
	diagnostics
		.iter()
		.filter_map(|d| match &d.code {
			Some(NumberOrString::String(code)) => Some(code.clone()),
			_ => None,
		})
		.collect()
}

#[test]
fn test_missing_choice_yields_one_diagnostic() {
	let diagnostics = validate(r#"<root version="1"><a/></root>"#);
	assert_eq!(codes(&diagnostics), vec!["required-elements-missing"]);
	let diagnostic = &diagnostics[0];
	assert_eq!(
		diagnostic.data,
		Some(json!({ "parentLocalName": "root", "grammarUri": "file:///schemas/root.rng" }))
	);
	assert_eq!(diagnostic.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
	// `<root` right after the 38-char xml-model instruction.
	assert_eq!(diagnostic.range, Range::new(Position::new(0, 38), Position::new(0, 43)));
}

#[test]
fn test_single_missing_child() {
	let diagnostics = validate(r#"<root version="1"><b/><tail></tail></root>"#);
	assert_eq!(codes(&diagnostics), vec!["required-element-missing"]);
	assert_eq!(
		diagnostics[0].data,
		Some(json!({
			"parentLocalName": "tail",
			"elementLocalName": "end",
			"grammarUri": "file:///schemas/root.rng",
		}))
	);
}

#[test]
fn test_valid_document() {
	assert!(validate(r#"<root version="1" mode="safe"><a/><a/><c/><tail><end/></tail></root>"#).is_empty());
}

#[test]
fn test_attribute_problems() {
	let diagnostics = validate(r#"<root mode="slow" extra="x" xmlns:q="urn:q" xml:lang="en"><b/></root>"#);
	assert_eq!(
		codes(&diagnostics),
		vec!["required-attribute-missing", "attribute-value-invalid", "attribute-not-allowed"]
	);
	assert_eq!(diagnostics[0].data, Some(json!({ "attributeName": "version" })));
}

#[test]
fn test_unexpected_child() {
	let diagnostics = validate(r#"<root version="1"><b/><a/></root>"#);
	assert_eq!(codes(&diagnostics), vec!["element-not-allowed"]);
	assert!(diagnostics[0].message.contains("'a'"));
}

#[test]
fn test_undeclared_root() {
	let diagnostics = validate("<other/>");
	assert_eq!(codes(&diagnostics), vec!["element-undeclared"]);
}

#[test]
fn test_no_grammar_no_diagnostics() {
	let manager = manager();
	let document = Document::parse(Url::parse("file:///doc.xml").unwrap(), 1, "<root><a/></root>");
	let cancel = CancelChecker::never();
	assert!(Validator::new(&manager, &cancel).validate(&document).unwrap().is_empty());
}

#[test]
fn test_dtd_incomplete_content() {
	let manager = manager();
	let document = Document::parse(
		Url::parse("file:///doc.xml").unwrap(),
		1,
		"<!DOCTYPE note [<!ELEMENT note (to, body)><!ELEMENT to EMPTY><!ELEMENT body EMPTY>]><note><to/></note>",
	);
	let cancel = CancelChecker::never();
	let diagnostics = Validator::new(&manager, &cancel).validate(&document).unwrap();
	assert_eq!(codes(&diagnostics), vec!["incomplete-content"]);
	assert!(diagnostics[0].message.contains("'body'"));
}

#[test]
fn test_cancelled_validation() {
	let manager = manager();
	let document = Document::parse(Url::parse("file:///doc.xml").unwrap(), 1, "<root/>");
	let token = CancellationToken::new();
	token.cancel();
	let cancel = CancelChecker::new(token);
	assert_eq!(Validator::new(&manager, &cancel).validate(&document), Err(Cancelled));
}
