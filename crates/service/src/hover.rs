//! Hover on element and attribute names.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};
use xmlls_contentmodel::{CancelChecker, ContentModelManager};
use xmlls_dom::Document;

use crate::Result;

#[derive(Clone, Copy)]
enum Target<'a> {
	Element,
	Attribute(&'a str),
}

pub(crate) fn hover(
	document: &Document,
	position: Position,
	manager: &ContentModelManager,
	cancel: &CancelChecker,
) -> Result<Option<Hover>> {
	let offset = document.offset_at(position)?;
	let Some(element) = document.find_element_at(offset) else {
		return Ok(None);
	};

	let (tag_start, tag_end) = element.start_tag_name_span();
	let (target, span) = if (tag_start + 1..=tag_end).contains(&offset) {
		(Target::Element, (tag_start + 1, tag_end))
	} else if let Some(attr) = element
		.element()
		.attributes()
		.values()
		.find(|attr| (attr.name_span().0..=attr.name_span().1).contains(&offset))
	{
		(Target::Attribute(attr.name()), attr.name_span())
	} else {
		return Ok(None);
	};

	let mut sections = Vec::new();
	for grammar in manager.find_applicable_grammars(document, cancel)? {
		cancel.check()?;
		let Some(decl) = manager.find_declaration(grammar.as_ref(), &element) else {
			continue;
		};
		let (title, documentation) = match target {
			Target::Element => (decl.local_name().to_string(), decl.documentation().map(str::to_string)),
			Target::Attribute(name) => {
				let Some(attr) = decl.find_attribute(name).or_else(|| {
					let local = name.split_once(':').map_or(name, |(_, local)| local);
					decl.find_attribute(local)
				}) else {
					continue;
				};
				let mut doc = attr.documentation().map(str::to_string);
				let values = attr.enumerated_values();
				if !values.is_empty() {
					let listed = values.iter().map(|v| format!("`{v}`")).collect::<Vec<_>>().join(", ");
					let line = format!("Allowed values: {listed}");
					doc = Some(match doc {
						Some(doc) => format!("{doc}\n\n{line}"),
						None => line,
					});
				}
				(attr.name().to_string(), doc)
			}
		};
		let mut section = format!("**{title}**");
		if let Some(documentation) = documentation {
			section.push_str("\n\n");
			section.push_str(documentation.trim());
		}
		section.push_str(&format!("\n\nSource: [{}]({})", file_name(grammar.uri()), grammar.uri()));
		sections.push(section);
	}

	if sections.is_empty() {
		return Ok(None);
	}
	Ok(Some(Hover {
		contents: HoverContents::Markup(MarkupContent {
			kind: MarkupKind::Markdown,
			value: sections.join("\n\n___\n\n"),
		}),
		range: Some(document.range_at(span.0, span.1)?),
	}))
}

fn file_name(uri: &xmlls_dom::Url) -> &str {
	uri.path_segments()
		.and_then(|mut segments| segments.next_back())
		.filter(|name| !name.is_empty())
		.unwrap_or(uri.as_str())
}
