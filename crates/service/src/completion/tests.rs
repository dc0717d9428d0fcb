use std::sync::Arc;

use pretty_assertions::assert_eq;
use xmlls_contentmodel::MemoryLoader;
use xmlls_dom::Url;

use super::*;

const SCHEMA: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"
	xmlns:a="http://relaxng.org/ns/compatibility/annotations/1.0">
	<start>
		<element name="book">
			<attribute name="id"/>
			<optional>
				<attribute name="lang">
					<choice><value>en</value><value>fr</value></choice>
				</attribute>
			</optional>
			<element name="title">
				<a:documentation>Book title.</a:documentation>
				<text/>
			</element>
			<zeroOrMore>
				<element name="note"><attribute name="by"/><text/></element>
			</zeroOrMore>
		</element>
	</start>
</grammar>"#;

const PI: &str = r#"<?xml-model href="/s/book.rng"?>"#;

fn manager() -> ContentModelManager {
	let loader = Arc::new(MemoryLoader::new());
	loader.insert(Url::parse("file:///s/book.rng").unwrap(), SCHEMA);
	ContentModelManager::new(loader)
}

/// Completes at the `|` marker.
fn complete(settings: &XmlSettings, marked: &str) -> CompletionList {
	let offset = marked.chars().position(|c| c == '|').unwrap();
	let text = marked.replacen('|', "", 1);
	let document = Document::parse(Url::parse("file:///w/book.xml").unwrap(), 1, &text);
	let manager = manager();
	let generator = XmlGenerator::new(&settings.format.generator_settings());
	let cancel = CancelChecker::never();
	let cx = CompletionContext {
		document: &document,
		manager: &manager,
		settings,
		generator: &generator,
		cancel: &cancel,
	};
	let position = document.position_at(offset).unwrap();
	completion(&cx, position).unwrap()
}

fn labels(list: &CompletionList) -> Vec<&str> {
	let mut labels: Vec<_> = list.items.iter().map(|i| i.label.as_str()).collect();
	labels.sort_unstable();
	labels
}

#[test]
fn test_children_in_content() {
	let list = complete(&XmlSettings::default(), &format!(r#"{PI}<book id="1"><title/>|</book>"#));
	assert_eq!(labels(&list), vec!["note", "title"]);

	let note = list.items.iter().find(|i| i.label == "note").unwrap();
	assert_eq!(note.insert_text.as_deref(), Some(r#"<note by="$1">$0</note>"#));
	assert_eq!(note.insert_text_format, Some(InsertTextFormat::SNIPPET));

	let title = list.items.iter().find(|i| i.label == "title").unwrap();
	assert!(matches!(
		&title.documentation,
		Some(Documentation::MarkupContent(MarkupContent { value, .. })) if value == "Book title."
	));
}

#[test]
fn test_plain_text_without_snippet_support() {
	let mut settings = XmlSettings::default();
	settings.completion.snippet_support = false;
	let list = complete(&settings, &format!(r#"{PI}<book id="1">|</book>"#));
	let note = list.items.iter().find(|i| i.label == "note").unwrap();
	assert_eq!(note.insert_text.as_deref(), Some(r#"<note by=""></note>"#));
	assert_eq!(note.insert_text_format, Some(InsertTextFormat::PLAIN_TEXT));
}

#[test]
fn test_attributes_not_yet_present() {
	let list = complete(&XmlSettings::default(), &format!(r#"{PI}<book id="1" |></book>"#));
	assert_eq!(labels(&list), vec!["lang"]);
	assert_eq!(list.items[0].insert_text.as_deref(), Some(r#"lang="${1|en,fr|}""#));
}

#[test]
fn test_enumerated_attribute_values() {
	let list = complete(&XmlSettings::default(), &format!(r#"{PI}<book id="1" lang="|"></book>"#));
	assert_eq!(labels(&list), vec!["en", "fr"]);
}

#[test]
fn test_unbound_document_proposes_nothing() {
	let list = complete(&XmlSettings::default(), "<book>|</book>");
	assert!(list.items.is_empty());
}

#[test]
fn test_typed_open_bracket_before_end_tag() {
	let list = complete(&XmlSettings::default(), &format!(r#"{PI}<book id="1"><title/><|</book>"#));
	assert_eq!(labels(&list), vec!["note", "title"]);
	let note = list.items.iter().find(|i| i.label == "note").unwrap();
	assert_eq!(note.insert_text.as_deref(), Some(r#"note by="$1">$0</note>"#));
}

#[test]
fn test_children_in_element_without_end_tag() {
	let list = complete(&XmlSettings::default(), &format!(r#"{PI}<book id="1"><title/>|"#));
	assert_eq!(labels(&list), vec!["note", "title"]);

	let list = complete(&XmlSettings::default(), &format!(r#"{PI}<book id="1">|"#));
	assert_eq!(labels(&list), vec!["note", "title"]);
}
