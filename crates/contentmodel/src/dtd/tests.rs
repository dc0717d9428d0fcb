use pretty_assertions::assert_eq;
use xmlls_dom::Document;

use super::*;

const NOTE_DTD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!ENTITY % common "id ID #IMPLIED">
<!-- A note. -->
<!ELEMENT note (to+, from?, (heading | title), body*)>
<!ATTLIST note
	priority (low | normal | high) "normal"
	version CDATA #FIXED "1.0"
	owner CDATA #REQUIRED>
<!ELEMENT to (#PCDATA)>
<!ELEMENT from (#PCDATA)>
<!ELEMENT heading (#PCDATA)>
<!ELEMENT title (#PCDATA | em)*>
<!ELEMENT em (#PCDATA)>
<!ELEMENT body ANY>
<!ELEMENT br EMPTY>
<!ATTLIST note %common;>
"#;

fn grammar() -> DtdGrammar {
	DtdGrammar::parse(Url::parse("file:///note.dtd").unwrap(), NOTE_DTD).unwrap()
}

fn doc(text: &str) -> Document {
	Document::parse(Url::parse("file:///note.xml").unwrap(), 1, text)
}

#[test]
fn test_parses_content_specs() {
	let g = grammar();
	let note = g.schema().element("note").unwrap();
	let ContentSpec::Children(particle) = &note.content else {
		panic!("expected children content, got {:?}", note.content);
	};
	assert_eq!(particle.occurrence, Occurrence::Once);
	let ParticleKind::Seq(members) = &particle.kind else {
		panic!("expected a sequence");
	};
	assert_eq!(members.len(), 4);
	assert_eq!(members[0].occurrence, Occurrence::OneOrMore);
	assert!(matches!(members[2].kind, ParticleKind::Choice(_)));

	assert_eq!(
		g.schema().element("title").unwrap().content,
		ContentSpec::Mixed(vec!["em".to_string()])
	);
	assert_eq!(g.schema().element("br").unwrap().content, ContentSpec::Empty);
	assert_eq!(g.schema().element("body").unwrap().content, ContentSpec::Any);
	assert_eq!(note.documentation.as_deref(), Some("A note."));
}

#[test]
fn test_attlist() {
	let g = grammar();
	let d = doc("<note/>");
	let note = g.find_element_declaration(&d.root_element().unwrap()).unwrap();
	let priority = note.find_attribute("priority").unwrap();
	assert_eq!(priority.enumerated_values(), vec!["low", "normal", "high"]);
	assert_eq!(priority.default_value(), Some("normal"));
	assert!(!priority.is_required());
	assert_eq!(note.find_attribute("version").unwrap().default_value(), Some("1.0"));
	assert!(note.find_attribute("owner").unwrap().is_required());
}

#[test]
fn test_check_content_reports_missing_and_undeclared() {
	let g = grammar();
	let d = doc("<note><from/><br/><body/></note>");
	let root = d.root_element().unwrap();
	let decl = g.find_element_declaration(&root).unwrap();
	let check = decl.check_content(&root);
	assert!(check.incomplete);
	assert_eq!(check.expected, vec!["to"]);
	assert_eq!(check.unexpected.len(), 1);
	let br = d.elements().find(|e| e.local_name() == "br").unwrap();
	assert_eq!(check.unexpected[0].node, br.id());
}

#[test]
fn test_no_choice_analysis() {
	let g = grammar();
	let d = doc("<note><to/></note>");
	let root = d.root_element().unwrap();
	let decl = g.find_element_declaration(&root).unwrap();
	assert!(decl.possible_required_elements(&root).is_empty());
	assert!(decl.check_content(&root).is_valid());
}

#[test]
fn test_required_children_and_root() {
	let g = grammar().with_root("note");
	let top = g.top_level_elements();
	assert_eq!(top.len(), 1);
	let required: Vec<_> = top[0].required_children().iter().map(|d| d.local_name().to_string()).collect();
	assert_eq!(required, vec!["to"]);
	assert!(g.schema().element("br").is_some());
}

#[test]
fn test_any_allows_declared_elements() {
	let g = grammar();
	let d = doc("<body><to/><unknown/></body>");
	let root = d.root_element().unwrap();
	let decl = g.find_element_declaration(&root).unwrap();
	let check = decl.check_content(&root);
	assert_eq!(check.unexpected.len(), 1);
	assert!(decl.find_child(&d.elements().find(|e| e.local_name() == "to").unwrap()).is_some());
}

#[test]
fn test_unterminated_comment_is_an_error() {
	let err = DtdGrammar::parse(Url::parse("file:///x.dtd").unwrap(), "<!-- never closed").unwrap_err();
	assert!(matches!(err, crate::GrammarError::Parse { .. }));
}
