//! Grammar-driven completion.
//!
//! The cursor context decides what is proposed: attribute values inside a
//! quoted value, attributes inside a start tag, child elements inside content
//! and top-level elements in an empty document.

use lsp_types::{
	CompletionItem, CompletionItemKind, CompletionList, Documentation, InsertTextFormat, MarkupContent, MarkupKind,
	Position,
};
use rustc_hash::FxHashSet;
use xmlls_contentmodel::{CancelChecker, ContentModelManager, ElementDecl, XmlGenerator};
use xmlls_dom::{Document, ElementRef};

use crate::Result;
use crate::settings::XmlSettings;

pub(crate) struct CompletionContext<'a> {
	pub(crate) document: &'a Document,
	pub(crate) manager: &'a ContentModelManager,
	pub(crate) settings: &'a XmlSettings,
	pub(crate) generator: &'a XmlGenerator,
	pub(crate) cancel: &'a CancelChecker,
}

enum Site<'d> {
	TopLevel,
	Content(ElementRef<'d>),
	StartTag(ElementRef<'d>),
	AttributeValue(ElementRef<'d>, &'d str),
}

pub(crate) fn completion(cx: &CompletionContext<'_>, position: Position) -> Result<CompletionList> {
	let offset = cx.document.offset_at(position)?;
	let mut items = Items::default();
	match site(cx.document, offset) {
		Some(Site::TopLevel) => top_level(cx, offset, &mut items)?,
		Some(Site::Content(element)) => children(cx, &element, offset, &mut items)?,
		Some(Site::StartTag(element)) => attributes(cx, &element, &mut items)?,
		Some(Site::AttributeValue(element, name)) => values(cx, &element, name, &mut items)?,
		None => {}
	}
	Ok(CompletionList {
		is_incomplete: false,
		items: items.items,
	})
}

fn site(document: &Document, offset: usize) -> Option<Site<'_>> {
	let Some(root) = document.root_element() else {
		return Some(Site::TopLevel);
	};
	let Some(mut element) = document.find_enclosing_element(offset) else {
		return (offset <= root.start()).then_some(Site::TopLevel);
	};

	// The end offset of a child is also a content offset of its parent.
	loop {
		let payload = element.element();
		let (_, name_end) = element.start_tag_name_span();
		let tag_close = payload.start_tag_close_offset();
		if offset > name_end && tag_close.is_none_or(|close| offset <= close) {
			for attr in payload.attributes().values() {
				if let Some((start, end)) = attr.value_span()
					&& (start..=end).contains(&offset)
				{
					return Some(Site::AttributeValue(element, attr.name()));
				}
			}
			return Some(Site::StartTag(element));
		}
		if let Some((open, close)) = content_range(&element)
			&& (open..=close).contains(&offset)
		{
			return Some(Site::Content(element));
		}
		element = element.parent()?;
	}
}

/// Content offsets of `element`, running to its end when the end tag is missing.
fn content_range(element: &ElementRef<'_>) -> Option<(usize, usize)> {
	let payload = element.element();
	if let Some(span) = payload.content_span() {
		return Some(span);
	}
	if payload.is_self_closed() {
		return None;
	}
	payload.start_tag_close_offset().map(|close| (close + 1, element.end()))
}

#[derive(Default)]
struct Items {
	seen: FxHashSet<String>,
	items: Vec<CompletionItem>,
}

impl Items {
	fn push(&mut self, item: CompletionItem) {
		if self.seen.insert(item.label.clone()) {
			self.items.push(item);
		}
	}
}

fn top_level(cx: &CompletionContext<'_>, offset: usize, items: &mut Items) -> Result<()> {
	for grammar in cx.manager.find_applicable_grammars(cx.document, cx.cancel)? {
		cx.cancel.check()?;
		for decl in grammar.top_level_elements() {
			items.push(element_item(cx, &decl, offset));
		}
	}
	Ok(())
}

fn children(cx: &CompletionContext<'_>, element: &ElementRef<'_>, offset: usize, items: &mut Items) -> Result<()> {
	for grammar in cx.manager.find_applicable_grammars(cx.document, cx.cancel)? {
		cx.cancel.check()?;
		let Some(decl) = cx.manager.find_declaration(grammar.as_ref(), element) else {
			continue;
		};
		for child in decl.child_declarations() {
			items.push(element_item(cx, &child, offset));
		}
	}
	Ok(())
}

fn element_item(cx: &CompletionContext<'_>, decl: &ElementDecl, offset: usize) -> CompletionItem {
	let snippet = cx.settings.completion.snippet_support;
	let mut text = cx.generator.generate(decl.as_ref(), None, true, false, 0, snippet);
	if offset > 0 && cx.document.slice(offset - 1, offset).is_ok_and(|prev| prev == "<") {
		text.remove(0);
	}
	CompletionItem {
		label: decl.local_name().to_string(),
		kind: Some(CompletionItemKind::PROPERTY),
		documentation: decl.documentation().map(markdown),
		insert_text: Some(text),
		insert_text_format: Some(if snippet {
			InsertTextFormat::SNIPPET
		} else {
			InsertTextFormat::PLAIN_TEXT
		}),
		..Default::default()
	}
}

fn attributes(cx: &CompletionContext<'_>, element: &ElementRef<'_>, items: &mut Items) -> Result<()> {
	let present = element.element().attributes();
	let snippet = cx.settings.completion.snippet_support;
	for grammar in cx.manager.find_applicable_grammars(cx.document, cx.cancel)? {
		cx.cancel.check()?;
		let Some(decl) = cx.manager.find_declaration(grammar.as_ref(), element) else {
			continue;
		};
		for attr in decl.attributes() {
			if present.contains_key(attr.name()) {
				continue;
			}
			let values = attr.enumerated_values();
			let insert_text = match (snippet, values.is_empty()) {
				(true, false) => format!("{}=\"${{1|{}|}}\"", attr.name(), values.join(",")),
				(true, true) => format!("{}=\"$1\"", attr.name()),
				(false, _) => format!("{}=\"\"", attr.name()),
			};
			items.push(CompletionItem {
				label: attr.name().to_string(),
				kind: Some(CompletionItemKind::UNIT),
				detail: attr.is_required().then(|| "required".to_string()),
				documentation: attr.documentation().map(markdown),
				insert_text: Some(insert_text),
				insert_text_format: Some(if snippet {
					InsertTextFormat::SNIPPET
				} else {
					InsertTextFormat::PLAIN_TEXT
				}),
				..Default::default()
			});
		}
	}
	Ok(())
}

fn values(cx: &CompletionContext<'_>, element: &ElementRef<'_>, name: &str, items: &mut Items) -> Result<()> {
	for grammar in cx.manager.find_applicable_grammars(cx.document, cx.cancel)? {
		cx.cancel.check()?;
		let Some(attr) = cx
			.manager
			.find_declaration(grammar.as_ref(), element)
			.and_then(|decl| decl.find_attribute(name))
		else {
			continue;
		};
		for value in attr.enumerated_values() {
			items.push(CompletionItem {
				label: value,
				kind: Some(CompletionItemKind::VALUE),
				..Default::default()
			});
		}
	}
	Ok(())
}

fn markdown(text: &str) -> Documentation {
	Documentation::MarkupContent(MarkupContent {
		kind: MarkupKind::Markdown,
		value: text.trim().to_string(),
	})
}

#[cfg(test)]
mod tests;
