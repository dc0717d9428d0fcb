use pretty_assertions::assert_eq;
use xmlls_dom::Url;

use super::*;
use crate::model::{ElementDecl, GrammarDocument};
use crate::relaxng::RelaxNgGrammar;

const SCHEMA: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"
	xmlns:a="http://relaxng.org/ns/compatibility/annotations/1.0">
	<start>
		<element name="root">
			<choice>
				<ref name="b"/>
				<element name="c"><empty/></element>
			</choice>
		</element>
	</start>
	<define name="b">
		<element name="b">
			<attribute name="id"/>
			<attribute name="kind" a:defaultValue="x$y"/>
			<optional><attribute name="note"/></optional>
			<element name="first"><empty/></element>
			<element name="second"><text/></element>
		</element>
	</define>
</grammar>"#;

fn decl(name: &str) -> ElementDecl {
	let grammar = RelaxNgGrammar::parse(Url::parse("file:///s.rng").unwrap(), SCHEMA).unwrap();
	let root = grammar.top_level_elements().remove(0);
	if name == "root" {
		return root;
	}
	root.child_declarations()
		.into_iter()
		.find(|d| d.local_name() == name)
		.unwrap()
}

#[test]
fn test_plain_element() {
	let generator = XmlGenerator::default();
	assert_eq!(generator.generate(decl("c").as_ref(), None, true, false, 1, false), "<c></c>");
	assert_eq!(generator.generate(decl("c").as_ref(), None, true, true, 1, false), "<c/>");
	assert_eq!(generator.generate(decl("c").as_ref(), None, false, false, 0, false), "<c>");
}

#[test]
fn test_required_attributes_and_children() {
	let generator = XmlGenerator::default();
	assert_eq!(
		generator.generate(decl("b").as_ref(), None, true, false, 1, false),
		"<b id=\"\" kind=\"x$y\">\n    <first></first>\n    <second></second>\n  </b>"
	);
}

#[test]
fn test_snippet_mode() {
	let generator = XmlGenerator::new(&GeneratorSettings {
		tab_size: 4,
		insert_spaces: false,
		line_delimiter: "\r\n".into(),
	});
	assert_eq!(
		generator.generate(decl("b").as_ref(), None, true, false, 0, true),
		"<b id=\"$1\" kind=\"${2:x\\$y}\">\r\n\t<first>$0</first>\r\n\t<second></second>\r\n</b>"
	);
	assert_eq!(generator.generate(decl("c").as_ref(), None, true, false, 0, true), "<c>$0</c>");
}

#[test]
fn test_existing_value_is_kept() {
	let generator = XmlGenerator::default();
	assert_eq!(
		generator.generate(decl("c").as_ref(), Some("body"), true, true, 0, false),
		"<c>body</c>"
	);
}

#[test]
fn test_deterministic() {
	let generator = XmlGenerator::default();
	let root = decl("root");
	let a = generator.generate(root.as_ref(), None, true, false, 0, true);
	let b = generator.generate(root.as_ref(), None, true, false, 0, true);
	assert_eq!(a, b);
	assert_eq!(a, "<root>$0</root>");
}
